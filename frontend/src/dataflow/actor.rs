//! Single-value Actor
//!
//! An Actor owns a `Mutable<T>` and a processor future that is the only
//! writer of that state. The processor runs on the session's local executor
//! and is cancelled when the last Actor handle is dropped.

use futures::future::RemoteHandle;
use futures::task::{LocalSpawn, LocalSpawnExt, SpawnError};
use futures_signals::signal::{Mutable, Signal};
use std::future::Future;
use std::rc::Rc;

/// Reactive state container driven by a sequential processor.
///
/// ```rust,ignore
/// let (chat_turn_submitted_relay, mut turns) = relay();
/// let worker = Actor::new((), &spawner, move |_state| async move {
///     while let Some(request) = turns.next().await {
///         answer(request).await;
///     }
/// })?;
/// ```
#[derive(Clone, Debug)]
pub struct Actor<T>
where
    T: Clone + 'static,
{
    state: Mutable<T>,
    #[allow(dead_code)]
    task_handle: Rc<RemoteHandle<()>>,
    #[cfg(debug_assertions)]
    #[allow(dead_code)]
    creation_location: &'static std::panic::Location<'static>,
}

impl<T> Actor<T>
where
    T: Clone + 'static,
{
    /// Spawn the processor with a handle to the initial state.
    ///
    /// Fails only when the executor has been shut down.
    #[track_caller]
    pub fn new<S, F, Fut>(initial_state: T, spawner: &S, processor: F) -> Result<Self, SpawnError>
    where
        S: LocalSpawn + ?Sized,
        F: FnOnce(Mutable<T>) -> Fut,
        Fut: Future<Output = ()> + 'static,
    {
        let state = Mutable::new(initial_state);
        let task_handle = spawner.spawn_local_with_handle(processor(state.clone()))?;

        Ok(Self {
            state,
            task_handle: Rc::new(task_handle),
            #[cfg(debug_assertions)]
            creation_location: std::panic::Location::caller(),
        })
    }

    pub fn signal(&self) -> impl Signal<Item = T> + use<T> {
        self.state.signal_cloned()
    }

    /// Current value, for views rendering outside a signal chain.
    pub fn get_cloned(&self) -> T {
        self.state.get_cloned()
    }
}
