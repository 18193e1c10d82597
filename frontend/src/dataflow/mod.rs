//! Dataflow primitives
//!
//! - [`Relay`] carries events into an Actor's processing loop
//! - [`Actor`] owns a piece of state and the single future that writes it
//!
//! Actors run on the session's local executor (`futures::task::LocalSpawn`),
//! so all processing is single-threaded and cooperative.

pub mod actor;
pub mod relay;

pub use actor::Actor;
pub use relay::{Relay, RelayError, relay};
