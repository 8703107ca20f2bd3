//! Per-entity finite state machine
//!
//! A [`StateMachine`] owns named [`State`] objects for one entity. The
//! entity record (`E`) and the per-tick context (`C`) are passed into every
//! lifecycle call rather than stored in the states, so a state never holds
//! a reference back to its owner.
//!
//! Transitions requested from `update` are applied by the machine right
//! after the requesting state returns: `exit` on the old state, then
//! `enter` on the new one.

use std::collections::HashMap;

use crate::error::FsmError;

/// Name under which a state is registered
pub type StateName = &'static str;

/// What a state wants to happen after its update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stay,
    To(StateName),
}

/// A named behavior unit driven by a [`StateMachine`]
pub trait State<E, C> {
    /// Called once when the machine switches into this state
    fn enter(&mut self, _entity: &mut E, _ctx: &mut C) {}

    /// Called once when the machine switches away from this state
    fn exit(&mut self, _entity: &mut E, _ctx: &mut C) {}

    /// Called every tick while this state is current (or always, for the global state)
    fn update(&mut self, entity: &mut E, ctx: &mut C, dt: f32) -> Transition;
}

/// Record of one completed transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub from: Option<StateName>,
    pub to: StateName,
}

/// Named-state container with current/previous tracking and an optional global state
pub struct StateMachine<E, C> {
    states: HashMap<StateName, Box<dyn State<E, C>>>,
    global: Option<Box<dyn State<E, C>>>,
    current: Option<StateName>,
    previous: Option<StateName>,
    changes: Vec<StateChange>,
}

impl<E, C> Default for StateMachine<E, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, C> StateMachine<E, C> {
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
            global: None,
            current: None,
            previous: None,
            changes: Vec::new(),
        }
    }

    /// Bind a state to `name`. Registering an existing name replaces it.
    pub fn register_state(&mut self, name: StateName, state: impl State<E, C> + 'static) {
        if self.states.insert(name, Box::new(state)).is_some() {
            log::debug!("State '{}' re-registered", name);
        }
    }

    /// Install a state that updates every tick regardless of the current state
    pub fn set_global_state(&mut self, state: impl State<E, C> + 'static) {
        self.global = Some(Box::new(state));
    }

    /// Switch to `name`, logging and ignoring unknown names.
    ///
    /// Changing to the current state still runs exit then enter.
    pub fn change_state(&mut self, name: &str, entity: &mut E, ctx: &mut C) -> bool {
        match self.try_change_state(name, entity, ctx) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Transition skipped: {}", err);
                false
            }
        }
    }

    /// Switch to `name`, failing with [`FsmError::StateNotFound`] for unknown names
    pub fn try_change_state(&mut self, name: &str, entity: &mut E, ctx: &mut C) -> Result<(), FsmError> {
        let Some((&next, _)) = self.states.get_key_value(name) else {
            return Err(FsmError::StateNotFound(name.to_string()));
        };

        let from = self.current.take();
        if let Some(old) = from {
            if let Some(state) = self.states.get_mut(old) {
                state.exit(entity, ctx);
            }
            self.previous = Some(old);
        }

        self.current = Some(next);
        if let Some(state) = self.states.get_mut(next) {
            state.enter(entity, ctx);
        }
        self.changes.push(StateChange { from, to: next });
        Ok(())
    }

    /// Update the global state, then the current state
    pub fn update(&mut self, entity: &mut E, ctx: &mut C, dt: f32) {
        if let Some(global) = self.global.as_mut() {
            if let Transition::To(next) = global.update(entity, ctx, dt) {
                self.change_state(next, entity, ctx);
            }
        }

        let Some(name) = self.current else {
            return;
        };
        let transition = match self.states.get_mut(name) {
            Some(state) => state.update(entity, ctx, dt),
            None => Transition::Stay,
        };
        if let Transition::To(next) = transition {
            self.change_state(next, entity, ctx);
        }
    }

    /// Re-enter the previously exited state, if there is one
    pub fn revert_to_previous_state(&mut self, entity: &mut E, ctx: &mut C) -> bool {
        match self.previous {
            Some(prev) => self.change_state(prev, entity, ctx),
            None => false,
        }
    }

    pub fn is_in_state(&self, name: &str) -> bool {
        self.current == Some(name)
    }

    pub fn current_state(&self) -> Option<StateName> {
        self.current
    }

    pub fn previous_state(&self) -> Option<StateName> {
        self.previous
    }

    /// Take the log of transitions made since the last drain
    pub fn drain_transitions(&mut self) -> Vec<StateChange> {
        std::mem::take(&mut self.changes)
    }
}
