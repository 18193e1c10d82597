use crate::gateway::GatewayError;
use futures_signals::signal_vec::{MutableVec, SignalVec};
use shared::ConfigError;

/// Maximum number of toasts kept on screen; the oldest goes first.
pub const MAX_VISIBLE_ALERTS: usize = 5;

/// Notification variant for styling different types of toasts
#[derive(Debug, Clone, PartialEq, Copy, Default)]
pub enum NotificationVariant {
    /// Red styling for errors
    #[default]
    Error,
    /// Blue styling for informational messages
    Info,
}

impl NotificationVariant {
    /// Level the alert is logged at when it is raised.
    pub fn log_level(self) -> log::Level {
        match self {
            NotificationVariant::Error => log::Level::Error,
            NotificationVariant::Info => log::Level::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorAlert {
    pub id: String,
    pub title: String,
    pub message: String,
    pub technical_error: String, // Raw technical error for the log
    pub auto_dismiss_ms: u64,
    pub variant: NotificationVariant,
}

impl ErrorAlert {
    /// One alert per consumer; a newer failure replaces the older toast.
    pub fn new_fetch_error(consumer: &str, error: &GatewayError) -> Self {
        let technical = error.to_string();
        Self {
            id: format!("fetch_error_{consumer}"),
            title: "Data Loading Error".to_string(),
            message: make_error_user_friendly(&technical),
            technical_error: format!("Error loading {}: {}", consumer.replace('_', " "), technical),
            auto_dismiss_ms: 5000,
            variant: NotificationVariant::Error,
        }
    }

    pub fn new_config_error(error: &ConfigError) -> Self {
        Self {
            id: "config_error".to_string(),
            title: "Configuration Reset".to_string(),
            message: "Settings could not be read, defaults are used instead.".to_string(),
            technical_error: format!("Config error: {error}"),
            auto_dismiss_ms: 8000,
            variant: NotificationVariant::Info,
        }
    }
}

pub fn make_error_user_friendly(error: &str) -> String {
    let error_lower = error.to_lowercase();

    if error_lower.contains("api 404") || error_lower.contains("not found") {
        "The requested data was not found.".to_string()
    } else if error_lower.contains("connection") || error_lower.contains("network") {
        "Connection error. Please check your network connection.".to_string()
    } else if error_lower.contains("timeout") || error_lower.contains("timed out") {
        "Request timed out. Please try again.".to_string()
    } else if error_lower.starts_with("api 5") {
        "The server could not answer right now. Please try again.".to_string()
    } else if error_lower.contains("failed to decode") {
        "The server sent data in an unexpected format.".to_string()
    } else {
        error.trim().to_string()
    }
}

/// Toast list shown over the explorer. Clones share the same list.
#[derive(Clone)]
pub struct Notifications {
    active: MutableVec<ErrorAlert>,
}

impl Notifications {
    pub fn new() -> Self {
        Self {
            active: MutableVec::new(),
        }
    }

    pub fn push(&self, alert: ErrorAlert) {
        log::log!(alert.variant.log_level(), "{}", alert.technical_error);

        let mut active = self.active.lock_mut();
        active.retain(|existing| existing.id != alert.id);
        while active.len() >= MAX_VISIBLE_ALERTS {
            active.remove(0);
        }
        active.push_cloned(alert);
    }

    pub fn dismiss(&self, id: &str) {
        self.active.lock_mut().retain(|alert| alert.id != id);
    }

    pub fn alerts(&self) -> Vec<ErrorAlert> {
        self.active.lock_ref().to_vec()
    }

    pub fn signal_vec(&self) -> impl SignalVec<Item = ErrorAlert> + use<> {
        self.active.signal_vec_cloned()
    }
}

impl Default for Notifications {
    fn default() -> Self {
        Self::new()
    }
}
