//! Event streaming Relay
//!
//! A Relay carries events from the surface (views, store setters) into an
//! Actor's processing loop over an unbounded channel.

use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
#[cfg(debug_assertions)]
use std::sync::{Arc, OnceLock};

/// Typed event sender feeding an Actor.
///
/// Relays are named after the event source: `{source}_{event}_relay`, e.g.
/// `chat_turn_submitted_relay`.
///
/// ```rust,ignore
/// let (chat_turn_submitted_relay, mut turns) = relay::<ChatRequest>();
/// chat_turn_submitted_relay.send(request);
/// while let Some(request) = turns.next().await { /* ... */ }
/// ```
#[derive(Clone, Debug)]
pub struct Relay<T> {
    sender: UnboundedSender<T>,
    #[cfg(debug_assertions)]
    emit_location: Arc<OnceLock<&'static std::panic::Location<'static>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    #[error("relay receiver was dropped")]
    ChannelClosed,
    /// Debug builds only: the relay was sent from a second call-site.
    #[cfg(debug_assertions)]
    #[error("relay sent from {current} but already owned by {previous}")]
    MultipleEmitters {
        previous: &'static std::panic::Location<'static>,
        current: &'static std::panic::Location<'static>,
    },
}

impl<T> Relay<T> {
    pub fn new() -> (Self, UnboundedReceiver<T>) {
        let (sender, receiver) = unbounded();
        (
            Relay {
                sender,
                #[cfg(debug_assertions)]
                emit_location: Arc::new(OnceLock::new()),
            },
            receiver,
        )
    }

    /// Every relay has exactly one emitting call-site.
    #[cfg(debug_assertions)]
    #[track_caller]
    fn check_single_source(&self) -> Result<(), RelayError> {
        let caller = std::panic::Location::caller();
        let owner = *self.emit_location.get_or_init(|| caller);
        if owner == caller {
            Ok(())
        } else {
            Err(RelayError::MultipleEmitters {
                previous: owner,
                current: caller,
            })
        }
    }

    /// Send an event. Events sent after the receiver is gone are dropped.
    ///
    /// Panics in debug builds when called from a second call-site.
    #[track_caller]
    pub fn send(&self, value: T) {
        #[cfg(debug_assertions)]
        if let Err(error) = self.check_single_source() {
            panic!("{error}");
        }

        let _ = self.sender.unbounded_send(value);
    }

    #[track_caller]
    pub fn try_send(&self, value: T) -> Result<(), RelayError> {
        #[cfg(debug_assertions)]
        self.check_single_source()?;

        self.sender
            .unbounded_send(value)
            .map_err(|_| RelayError::ChannelClosed)
    }
}

impl<T> Default for Relay<T> {
    /// Disconnected relay, every event is discarded.
    fn default() -> Self {
        let (relay, _receiver) = Self::new();
        relay
    }
}

pub fn relay<T>() -> (Relay<T>, UnboundedReceiver<T>) {
    Relay::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn events_arrive_in_send_order() {
        let (float_clicked_relay, mut clicks) = relay::<String>();

        for id in ["2902746", "2902747"] {
            float_clicked_relay.send(id.to_string());
        }

        assert_eq!(clicks.next().await.as_deref(), Some("2902746"));
        assert_eq!(clicks.next().await.as_deref(), Some("2902747"));
    }

    #[tokio::test]
    async fn try_send_reports_dropped_receiver() {
        let (relay, receiver) = Relay::<u8>::new();
        drop(receiver);
        assert_eq!(relay.try_send(1), Err(RelayError::ChannelClosed));
    }

    #[test]
    fn default_relay_discards_events() {
        let relay = Relay::<u8>::default();
        relay.send(7);
    }

    #[cfg(debug_assertions)]
    #[test]
    fn second_call_site_is_rejected() {
        let (relay, _receiver) = relay::<u8>();
        assert!(relay.try_send(1).is_ok());
        let Err(RelayError::MultipleEmitters { previous, current }) = relay.try_send(2) else {
            panic!("second call-site must be rejected");
        };
        assert_ne!(previous, current);
        assert_eq!(previous.line() + 1, current.line());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn clones_share_the_owning_call_site() {
        let (relay, _receiver) = relay::<u8>();
        let emit = |relay: &Relay<u8>, value| relay.try_send(value);
        assert!(emit(&relay, 1).is_ok());
        assert!(emit(&relay.clone(), 2).is_ok());
        assert!(relay.clone().try_send(3).is_err());
    }
}
