//! Generation-tagged fetch state for one consumer
//!
//! Each `begin` or `clear` starts a new generation. A completion is applied
//! only while its generation is still the current one, so under rapid
//! re-selection the last request wins regardless of arrival order.

use crate::gateway::GatewayError;
use futures_signals::signal::{Mutable, Signal};
use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Generation(u64);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceState<T> {
    pub data: T,
    pub is_loading: bool,
    pub error: Option<GatewayError>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Completion {
    Applied,
    Failed(GatewayError),
    /// Superseded by a newer generation, nothing was written.
    Stale,
}

#[derive(Clone, Debug)]
pub struct Resource<T>
where
    T: Clone + 'static,
{
    name: &'static str,
    state: Mutable<ResourceState<T>>,
    generation: Rc<Cell<u64>>,
}

impl<T> Resource<T>
where
    T: Clone + Default + 'static,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: Mutable::new(ResourceState::default()),
            generation: Rc::new(Cell::new(0)),
        }
    }

    fn next_generation(&self) -> Generation {
        let next = self.generation.get() + 1;
        self.generation.set(next);
        Generation(next)
    }

    pub fn current_generation(&self) -> Generation {
        Generation(self.generation.get())
    }

    /// Back to the empty state; anything in flight becomes stale.
    pub fn clear(&self) {
        self.next_generation();
        self.state.set(ResourceState::default());
    }

    /// Marks the consumer loading with its data cleared.
    pub fn begin(&self) -> Generation {
        let generation = self.next_generation();
        self.state.set(ResourceState {
            data: T::default(),
            is_loading: true,
            error: None,
        });
        generation
    }

    pub fn complete(&self, generation: Generation, result: Result<T, GatewayError>) -> Completion {
        if generation != self.current_generation() {
            log::debug!(
                "{}: discarding stale response (generation {} superseded by {})",
                self.name,
                generation.0,
                self.generation.get()
            );
            return Completion::Stale;
        }

        match result {
            Ok(data) => {
                self.state.set(ResourceState {
                    data,
                    is_loading: false,
                    error: None,
                });
                Completion::Applied
            }
            Err(error) => {
                self.state.set(ResourceState {
                    data: T::default(),
                    is_loading: false,
                    error: Some(error.clone()),
                });
                Completion::Failed(error)
            }
        }
    }

    /// Begins a generation right away and returns the future that applies
    /// the result when `request` settles.
    pub fn load<F>(&self, request: F) -> impl Future<Output = Completion> + 'static + use<T, F>
    where
        F: Future<Output = Result<T, GatewayError>> + 'static,
    {
        let generation = self.begin();
        let resource = self.clone();
        async move {
            let result = request.await;
            resource.complete(generation, result)
        }
    }

    pub fn state(&self) -> ResourceState<T> {
        self.state.get_cloned()
    }

    pub fn data(&self) -> T {
        self.state.lock_ref().data.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock_ref().is_loading
    }

    pub fn error(&self) -> Option<GatewayError> {
        self.state.lock_ref().error.clone()
    }

    pub fn signal(&self) -> impl Signal<Item = ResourceState<T>> + use<T> {
        self.state.signal_cloned()
    }
}
