//! The firing engine: token flow, observer dispatch and the bridge between
//! structural enablement and the scheduler.
//!
//! A firing is atomic with respect to scheduling: `fire_next` selects a
//! transition, advances the virtual clock, runs every arc flow of the
//! transition in insertion order, and only then returns to selection.
//! Enable/disable crossings reach the scheduler immediately as the flows
//! trigger them, but no selection happens until the firing completes.

use tracing::{debug, trace};

use crate::arc::ArcKind;
use crate::error::{NetError, Result};
use crate::net::Net;
use crate::transition::TransitionKind;
use crate::types::{ArcId, PlaceId, TokenTypeId, TransitionId};

impl Net {
    /// Leave build mode and schedule every transition whose recorded
    /// enablement is true. Idempotent once started.
    pub fn start(&mut self) -> Result<()> {
        for transition in self.fire.start() {
            self.schedule_transition(transition)?;
        }
        Ok(())
    }

    /// Select the next transition by the stochastic firing rule, advance
    /// the clock to its firing time, and fire it. A timed transition that
    /// is still enabled afterwards is rescheduled with a fresh sample.
    pub fn fire_next(&mut self) -> Result<()> {
        let (new_time, transition) = self.fire.select_next(&mut self.rng)?;
        self.fire.advance_to(new_time);
        debug!(
            transition = %self.transitions[transition.0 as usize].name,
            time = new_time,
            "fire"
        );
        self.fire_transition(transition)?;
        let t = &self.transitions[transition.0 as usize];
        if t.is_timed() && t.is_enabled() {
            self.fire.cancel_timed(transition);
            self.schedule_transition(transition)?;
        }
        Ok(())
    }

    /// Run all arc flows of an enabled transition, bracketed by the
    /// before/after firing callbacks. A firing that has begun completes:
    /// every arc flow runs and `after_firing` is delivered even when a flow
    /// surfaces an error (a nested enable may fail with `BadSample` while a
    /// flow wakes another timed transition); the first such error is
    /// returned only after the firing has finished.
    pub(crate) fn fire_transition(&mut self, transition: TransitionId) -> Result<()> {
        let t = transition.0 as usize;
        debug_assert!(
            self.transitions[t].is_enabled(),
            "transition '{}' is disabled, it cannot be fired",
            self.transitions[t].name
        );
        self.notify_before_firing(transition);
        let mut deferred: Option<NetError> = None;
        for k in 0..self.transitions[t].arcs.len() {
            let arc = self.transitions[t].arcs[k];
            if let Err(e) = self.flow(arc) {
                deferred.get_or_insert(e);
            }
        }
        self.notify_after_firing(transition);
        match deferred {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    fn flow(&mut self, arc: ArcId) -> Result<()> {
        match self.arcs[arc.0 as usize].kind {
            ArcKind::Test { .. } | ArcKind::Inhibitor { .. } => Ok(()),
            ArcKind::Constructor { place } => {
                let token_type = self.places[place.0 as usize].token_type;
                let slot = self.create_token(token_type);
                self.push_token(place, slot)
            }
            ArcKind::Destructor { place } => {
                let slot = self.pop_token(place)?;
                self.destroy_token(slot);
                Ok(())
            }
            ArcKind::Transfer { input, output } => {
                let slot = self.pop_token(input)?;
                self.push_token(output, slot)
            }
        }
    }

    // ------------------------------------------------------------------
    // Token flow
    // ------------------------------------------------------------------

    /// Append a token at a place, then notify place observers, presence
    /// observers (on the empty→non-empty edge) and token observers.
    pub(crate) fn push_token(&mut self, place: PlaceId, slot: usize) -> Result<()> {
        let p = place.0 as usize;
        let token_type = self.tokens.get(slot).token_type;
        let place_type = self.places[p].token_type;
        if token_type != place_type {
            return Err(NetError::InvalidTokenType {
                place: self.places[p].name.clone(),
                expected: self.types[place_type.0 as usize].name.clone(),
                found: self.types[token_type.0 as usize].name.clone(),
            });
        }
        let token_id = self.tokens.get(slot).id;
        let was_empty = self.places[p].is_empty();
        self.places[p].enqueue(slot);
        trace!(token = token_id.0, place = %self.places[p].name, "push");

        let now = self.fire.now();
        for k in 0..self.places[p].observers.len() {
            let i = self.places[p].observers[k];
            self.plugins[i].report_arrival_of(place, token_id, now);
        }
        if was_empty {
            self.update_presence_for(place, false)?;
        }
        for k in 0..self.tokens.get(slot).observers.len() {
            let i = self.tokens.get(slot).observers[k];
            self.plugins[i].report_arrival_at(token_id, place, now);
        }
        Ok(())
    }

    /// Remove the next token per the place's policy, then notify place
    /// observers, token observers and (on the non-empty→empty edge) the
    /// presence observers.
    pub(crate) fn pop_token(&mut self, place: PlaceId) -> Result<usize> {
        let p = place.0 as usize;
        let slot = self.places[p]
            .dequeue()
            .expect("an enabled token consumer found its place empty");
        let token_id = self.tokens.get(slot).id;
        trace!(token = token_id.0, place = %self.places[p].name, "pop");

        let now = self.fire.now();
        for k in 0..self.places[p].observers.len() {
            let i = self.places[p].observers[k];
            self.plugins[i].report_departure_of(place, token_id, now);
        }
        for k in 0..self.tokens.get(slot).observers.len() {
            let i = self.tokens.get(slot).observers[k];
            self.plugins[i].report_departure_from(token_id, place, now);
        }
        if self.places[p].is_empty() {
            self.update_presence_for(place, true)?;
        }
        Ok(slot)
    }

    /// Allocate a token, attach the observers the plugins provide for it,
    /// and report its construction.
    fn create_token(&mut self, token_type: TokenTypeId) -> usize {
        let (slot, id) = self.tokens.create(token_type);
        for i in 0..self.plugins.len() {
            if self.plugins[i].observe_token(id, token_type) {
                self.tokens.get_mut(slot).observers.push(i);
            }
        }
        let now = self.fire.now();
        for k in 0..self.tokens.get(slot).observers.len() {
            let i = self.tokens.get(slot).observers[k];
            self.plugins[i].report_construction(id, now);
        }
        trace!(token = id.0, "token constructed");
        slot
    }

    /// Report destruction to the token's observers and release its slot.
    fn destroy_token(&mut self, slot: usize) {
        let now = self.fire.now();
        let token_id = self.tokens.get(slot).id;
        for k in 0..self.tokens.get(slot).observers.len() {
            let i = self.tokens.get(slot).observers[k];
            self.plugins[i].report_destruction(token_id, now);
        }
        self.tokens.remove(slot);
        trace!(token = token_id.0, "token destroyed");
    }

    // ------------------------------------------------------------------
    // Presence-observer protocol
    // ------------------------------------------------------------------

    fn update_presence_for(&mut self, place: PlaceId, place_empty: bool) -> Result<()> {
        let p = place.0 as usize;
        for k in 0..self.places[p].presence_observers.len() {
            let arc = self.places[p].presence_observers[k];
            self.evaluate_presence_arc(arc, place_empty)?;
        }
        Ok(())
    }

    /// Re-evaluate one presence arc's local condition; a false→true flip
    /// decrements the transition's disabled-arc count, a true→false flip
    /// increments it.
    pub(crate) fn evaluate_presence_arc(&mut self, arc: ArcId, place_empty: bool) -> Result<()> {
        let a = arc.0 as usize;
        let enabled = self.arcs[a].condition_holds(place_empty);
        if enabled == self.arcs[a].local_enabled {
            return Ok(());
        }
        self.arcs[a].local_enabled = enabled;
        let transition = self.arcs[a].transition;
        if enabled {
            self.decrement_disabled_arc_count(transition)
        } else {
            self.increment_disabled_arc_count(transition)
        }
    }

    fn increment_disabled_arc_count(&mut self, transition: TransitionId) -> Result<()> {
        let t = transition.0 as usize;
        self.transitions[t].disabled_arc_count += 1;
        if self.transitions[t].disabled_arc_count == 1 {
            self.transition_got_disabled(transition)?;
        }
        Ok(())
    }

    fn decrement_disabled_arc_count(&mut self, transition: TransitionId) -> Result<()> {
        let t = transition.0 as usize;
        debug_assert!(self.transitions[t].disabled_arc_count > 0);
        self.transitions[t].disabled_arc_count -= 1;
        if self.transitions[t].disabled_arc_count == 0 {
            self.transition_got_enabled(transition)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Enable/disable bridge into the scheduler
    // ------------------------------------------------------------------

    fn transition_got_enabled(&mut self, transition: TransitionId) -> Result<()> {
        self.autofire_enable(transition)?;
        let t = transition.0 as usize;
        for k in 0..self.transitions[t].observers.len() {
            let i = self.transitions[t].observers[k];
            self.plugins[i].got_enabled(transition);
        }
        Ok(())
    }

    fn transition_got_disabled(&mut self, transition: TransitionId) -> Result<()> {
        self.autofire_disable(transition);
        let t = transition.0 as usize;
        for k in 0..self.transitions[t].observers.len() {
            let i = self.transitions[t].observers[k];
            self.plugins[i].got_disabled(transition);
        }
        Ok(())
    }

    /// The sole bridge turning structural enablement into scheduler state:
    /// record while building, schedule once running.
    pub(crate) fn autofire_enable(&mut self, transition: TransitionId) -> Result<()> {
        if self.fire.is_building() {
            self.fire.record_initial(transition, true);
            return Ok(());
        }
        self.schedule_transition(transition)
    }

    fn autofire_disable(&mut self, transition: TransitionId) {
        if self.fire.is_building() {
            self.fire.record_initial(transition, false);
            return;
        }
        let t = transition.0 as usize;
        if self.transitions[t].is_timed() {
            self.fire.cancel_timed(transition);
        } else {
            let priority = self.transitions[t].priority();
            self.fire.disable_immediate(transition, priority);
        }
    }

    /// Hand an enabled transition to the scheduler. Timed transitions draw
    /// a duration sample here; the sample must be finite and non-negative.
    pub(crate) fn schedule_transition(&mut self, transition: TransitionId) -> Result<()> {
        let t = transition.0 as usize;
        if !self.transitions[t].is_timed() {
            let (priority, weight) = match &self.transitions[t].kind {
                TransitionKind::Immediate { priority, weight } => (*priority, *weight),
                TransitionKind::Timed { .. } => unreachable!(),
            };
            self.fire.enable_immediate(transition, priority, weight);
            return Ok(());
        }
        let sample = match &mut self.transitions[t].kind {
            TransitionKind::Timed { sampler } => sampler(&mut self.rng),
            TransitionKind::Immediate { .. } => unreachable!(),
        };
        if !sample.is_finite() || sample < 0.0 {
            return Err(NetError::BadSample {
                transition: self.transitions[t].name.clone(),
                sample,
            });
        }
        let deadline = self.fire.now() + sample;
        trace!(
            transition = %self.transitions[t].name,
            deadline,
            "timed transition scheduled"
        );
        self.fire.schedule_timed(transition, deadline);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Firing callbacks
    // ------------------------------------------------------------------

    fn notify_before_firing(&mut self, transition: TransitionId) {
        let now = self.fire.now();
        let t = transition.0 as usize;
        for k in 0..self.transitions[t].observers.len() {
            let i = self.transitions[t].observers[k];
            self.plugins[i].before_firing(transition, now);
        }
    }

    fn notify_after_firing(&mut self, transition: TransitionId) {
        let now = self.fire.now();
        let t = transition.0 as usize;
        for k in 0..self.transitions[t].observers.len() {
            let i = self.transitions[t].observers[k];
            self.plugins[i].after_firing(transition, now);
        }
    }
}
