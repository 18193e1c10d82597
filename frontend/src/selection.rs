//! Selection store: the float → profile → parameter hierarchy
//!
//! The whole selection is replaced on every event by [`Selection::apply`],
//! so the cascading reset can never be observed half-applied. Transition
//! hooks run inside the setter, before it returns.

use futures_signals::signal::{Mutable, Signal, SignalExt};
use shared::{FloatId, Parameter, ProfileId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type TransitionHook = Rc<dyn Fn(&Selection, &Selection)>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    pub float: Option<FloatId>,
    pub profile: Option<ProfileId>,
    pub parameter: Parameter,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SelectionEvent {
    FloatSelected(Option<FloatId>),
    ProfileSelected(Option<ProfileId>),
    ParameterSelected(Parameter),
}

impl Selection {
    pub fn new(default_parameter: Parameter) -> Self {
        Self {
            float: None,
            profile: None,
            parameter: default_parameter,
        }
    }

    /// Transition function. Selecting a float (or clearing it) always drops
    /// the profile; the parameter is only changed by its own event.
    #[must_use]
    pub fn apply(&self, event: SelectionEvent) -> Selection {
        match event {
            SelectionEvent::FloatSelected(float) => Selection {
                float,
                profile: None,
                parameter: self.parameter,
            },
            SelectionEvent::ProfileSelected(profile) => Selection {
                profile,
                ..self.clone()
            },
            SelectionEvent::ParameterSelected(parameter) => Selection {
                parameter,
                ..self.clone()
            },
        }
    }
}

/// Session-wide selection state. Clones share the same state and hooks.
#[derive(Clone)]
pub struct SelectionStore {
    state: Mutable<Selection>,
    transition_hooks: Rc<RefCell<Vec<TransitionHook>>>,
}

impl SelectionStore {
    pub fn new(default_parameter: Parameter) -> Self {
        Self {
            state: Mutable::new(Selection::new(default_parameter)),
            transition_hooks: Rc::default(),
        }
    }

    pub fn from_config(config: &shared::AppConfig) -> Self {
        Self::new(config.selection.default_parameter)
    }

    pub fn select_float(&self, float: Option<FloatId>) {
        self.dispatch(SelectionEvent::FloatSelected(float));
    }

    pub fn select_profile(&self, profile: Option<ProfileId>) {
        self.dispatch(SelectionEvent::ProfileSelected(profile));
    }

    /// No validation against loaded data: a parameter without values simply
    /// charts as "no data".
    pub fn select_parameter(&self, parameter: Parameter) {
        self.dispatch(SelectionEvent::ParameterSelected(parameter));
    }

    /// Registers `hook` to run synchronously with `(previous, next)` each
    /// time a setter changes the selection. The new selection is already
    /// stored when the hook runs.
    pub fn on_transition(&self, hook: impl Fn(&Selection, &Selection) + 'static) {
        self.transition_hooks.borrow_mut().push(Rc::new(hook));
    }

    fn dispatch(&self, event: SelectionEvent) {
        let previous = self.state.get_cloned();
        let next = previous.apply(event);
        if next == previous {
            return;
        }
        log::info!(
            "selection: float={:?} profile={:?} parameter={}",
            next.float,
            next.profile,
            next.parameter
        );
        self.state.set(next.clone());

        // Hooks may call back into the store.
        let hooks = self.transition_hooks.borrow().clone();
        for hook in hooks {
            hook(&previous, &next);
        }
    }

    pub fn selection(&self) -> Selection {
        self.state.get_cloned()
    }

    pub fn selected_float(&self) -> Option<FloatId> {
        self.state.lock_ref().float.clone()
    }

    pub fn selected_profile(&self) -> Option<ProfileId> {
        self.state.lock_ref().profile
    }

    pub fn selected_parameter(&self) -> Parameter {
        self.state.lock_ref().parameter
    }

    pub fn signal(&self) -> impl Signal<Item = Selection> + use<> {
        self.state.signal_cloned()
    }

    /// Fires once per distinct float value, starting with the current one.
    pub fn selected_float_signal(&self) -> impl Signal<Item = Option<FloatId>> + use<> {
        self.state
            .signal_ref(|selection| selection.float.clone())
            .dedupe_cloned()
    }

    pub fn selected_profile_signal(&self) -> impl Signal<Item = Option<ProfileId>> + use<> {
        self.state
            .signal_ref(|selection| selection.profile)
            .dedupe()
    }

    pub fn selected_parameter_signal(&self) -> impl Signal<Item = Parameter> + use<> {
        self.state
            .signal_ref(|selection| selection.parameter)
            .dedupe()
    }
}

impl fmt::Debug for SelectionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionStore")
            .field("state", &self.state)
            .field("transition_hooks", &self.transition_hooks.borrow().len())
            .finish()
    }
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new(Parameter::default())
    }
}
