//! Data access gateway seam
//!
//! The transport behind [`Gateway`] belongs to the host (browser fetch,
//! desktop IPC, test script). This module only fixes the request set and
//! how failures and deadlines are represented.

use futures::future::{self, Either, LocalBoxFuture};
use futures::FutureExt;
use shared::{
    ChatMessage, ChatRequest, FloatId, FloatLocation, FloatSummary, Measurement, ProfileId,
    ProfileSummary, TrajectoryPoint,
};
use std::rc::Rc;
use std::time::Duration;

pub type GatewayFuture<T> = LocalBoxFuture<'static, Result<T, GatewayError>>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("API {code}: {body}")]
    Status { code: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("request timeout after {after_ms} ms")]
    Timeout { after_ms: u64 },
}

impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        GatewayError::Decode(error.to_string())
    }
}

/// One request/response call per need.
pub trait Gateway {
    fn floats(&self) -> GatewayFuture<Vec<FloatSummary>>;

    fn float_detail(&self, float_id: &FloatId) -> GatewayFuture<FloatSummary>;

    /// `with_data_only` restricts the list to cycles that carry measurements.
    fn profiles(&self, float_id: &FloatId, with_data_only: bool) -> GatewayFuture<Vec<ProfileSummary>>;

    fn measurements(&self, profile_id: ProfileId) -> GatewayFuture<Vec<Measurement>>;

    fn locations(&self, active_only: bool) -> GatewayFuture<Vec<FloatLocation>>;

    fn trajectory(&self, float_id: &FloatId) -> GatewayFuture<Vec<TrajectoryPoint>>;

    fn chat(&self, request: ChatRequest) -> GatewayFuture<ChatMessage>;
}

// ===== TIMERS =====

pub trait Timer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserTimer;

#[cfg(target_arch = "wasm32")]
impl Timer for BrowserTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        gloo_timers::future::TimeoutFuture::new(millis).boxed_local()
    }
}

/// Upper bound on how long any single gateway call may keep a consumer
/// loading.
#[derive(Clone)]
pub struct RequestDeadline {
    timer: Rc<dyn Timer>,
    timeout: Duration,
}

impl RequestDeadline {
    /// `None` when `timeout_ms` is zero (deadline disabled).
    pub fn new(timer: Rc<dyn Timer>, timeout_ms: u64) -> Option<Self> {
        (timeout_ms > 0).then(|| Self {
            timer,
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    pub fn guard<T: 'static>(&self, request: GatewayFuture<T>) -> GatewayFuture<T> {
        let sleep = self.timer.sleep(self.timeout);
        let after_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        async move {
            match future::select(request, sleep).await {
                Either::Left((result, _)) => result,
                Either::Right(((), _)) => Err(GatewayError::Timeout { after_ms }),
            }
        }
        .boxed_local()
    }
}

/// Applies the optional deadline.
pub fn bounded<T: 'static>(
    deadline: Option<&RequestDeadline>,
    request: GatewayFuture<T>,
) -> GatewayFuture<T> {
    match deadline {
        Some(deadline) => deadline.guard(request),
        None => request,
    }
}

/// The session's gateway with its request deadline applied to every call.
#[derive(Clone)]
pub struct GatewayClient {
    gateway: Rc<dyn Gateway>,
    deadline: Option<RequestDeadline>,
}

impl GatewayClient {
    pub fn new(gateway: Rc<dyn Gateway>, deadline: Option<RequestDeadline>) -> Self {
        Self { gateway, deadline }
    }

    pub fn call<T, F>(&self, request: F) -> GatewayFuture<T>
    where
        T: 'static,
        F: FnOnce(&dyn Gateway) -> GatewayFuture<T>,
    {
        bounded(self.deadline.as_ref(), request(self.gateway.as_ref()))
    }
}
