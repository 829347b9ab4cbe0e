//! Net structure: entity arenas, name registries and construction ops.
//!
//! The net owns every entity of a simulation — token types, places,
//! transitions, arcs, live tokens — plus the registered plugins, the
//! scheduler state and the RNG. Entities reference each other through
//! ordinals, never through owning pointers, so the observer cycles of the
//! domain (place → arc → transition → arc) stay index-shaped.
//!
//! All validation of an `add_*` operation happens before any mutation: a
//! failed call leaves the net exactly as it was.

use std::collections::HashMap;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use tracing::debug;

use crate::arc::{Arc, ArcKind};
use crate::error::{Namespace, NetError, Result};
use crate::fire::FireControl;
use crate::observer::Plugin;
use crate::place::{Place, QueuePolicy};
use crate::token::{TokenArena, TokenType};
use crate::transition::{Transition, TransitionKind};
use crate::types::{ArcId, PlaceId, Time, TokenId, TokenTypeId, TransitionId};

/// PRNG seed used when no seed is specified.
pub const DEFAULT_SEED: u64 = 42;

/// A stochastic Petri net and its simulation state.
pub struct Net {
    name: String,
    pub(crate) types: Vec<TokenType>,
    pub(crate) places: Vec<Place>,
    pub(crate) transitions: Vec<Transition>,
    pub(crate) arcs: Vec<Arc>,
    pub(crate) tokens: TokenArena,
    type_index: HashMap<String, TokenTypeId>,
    place_index: HashMap<String, PlaceId>,
    transition_index: HashMap<String, TransitionId>,
    arc_index: HashMap<String, ArcId>,
    pub(crate) plugins: Vec<Box<dyn Plugin>>,
    pub(crate) fire: FireControl,
    pub(crate) rng: SmallRng,
}

impl Net {
    /// Create an empty net with the default seed.
    pub fn new(name: &str) -> Self {
        Net::with_seed(name, DEFAULT_SEED)
    }

    /// Create an empty net. The seed feeds the single RNG used for both the
    /// duration samplers and the weighted tie-break; identical seeds and
    /// build sequences give byte-identical runs.
    pub fn with_seed(name: &str, seed: u64) -> Self {
        Net {
            name: name.to_string(),
            types: Vec::new(),
            places: Vec::new(),
            transitions: Vec::new(),
            arcs: Vec::new(),
            tokens: TokenArena::new(),
            type_index: HashMap::new(),
            place_index: HashMap::new(),
            transition_index: HashMap::new(),
            arc_index: HashMap::new(),
            plugins: Vec::new(),
            fire: FireControl::new(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current virtual time of the scheduler.
    pub fn current_time(&self) -> Time {
        self.fire.now()
    }

    // ------------------------------------------------------------------
    // Name lookups
    // ------------------------------------------------------------------

    pub fn token_type_id(&self, name: &str) -> Result<TokenTypeId> {
        self.type_index
            .get(name)
            .copied()
            .ok_or_else(|| NetError::UnknownName {
                namespace: Namespace::TokenType,
                name: name.to_string(),
            })
    }

    pub fn place_id(&self, name: &str) -> Result<PlaceId> {
        self.place_index
            .get(name)
            .copied()
            .ok_or_else(|| NetError::UnknownName {
                namespace: Namespace::Place,
                name: name.to_string(),
            })
    }

    pub fn transition_id(&self, name: &str) -> Result<TransitionId> {
        self.transition_index
            .get(name)
            .copied()
            .ok_or_else(|| NetError::UnknownName {
                namespace: Namespace::Transition,
                name: name.to_string(),
            })
    }

    pub fn arc_id(&self, name: &str) -> Result<ArcId> {
        self.arc_index
            .get(name)
            .copied()
            .ok_or_else(|| NetError::UnknownName {
                namespace: Namespace::Arc,
                name: name.to_string(),
            })
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Define a token type.
    pub fn add_type(&mut self, name: &str) -> Result<TokenTypeId> {
        if self.type_index.contains_key(name) {
            return Err(NetError::DuplicateName {
                namespace: Namespace::TokenType,
                name: name.to_string(),
            });
        }
        let id = TokenTypeId(self.types.len() as u32);
        self.types.push(TokenType {
            name: name.to_string(),
        });
        self.type_index.insert(name.to_string(), id);
        Ok(id)
    }

    /// Add a place holding tokens of the given type.
    pub fn add_place(
        &mut self,
        name: &str,
        type_name: &str,
        policy: QueuePolicy,
    ) -> Result<PlaceId> {
        if self.place_index.contains_key(name) {
            return Err(NetError::DuplicateName {
                namespace: Namespace::Place,
                name: name.to_string(),
            });
        }
        let token_type = self.token_type_id(type_name)?;
        let id = PlaceId(self.places.len() as u32);
        self.places
            .push(Place::new(name.to_string(), id, token_type, policy));
        self.place_index.insert(name.to_string(), id);
        // Offer the new place to every registered plugin.
        for i in 0..self.plugins.len() {
            if self.plugins[i].observe_place(id) {
                self.places[id.0 as usize].observers.push(i);
            }
        }
        Ok(id)
    }

    /// Add an immediate transition. Enabled immediate transitions always
    /// fire before enabled timed ones; among equal priorities the weight
    /// decides the random tie-break.
    pub fn add_immediate_transition(
        &mut self,
        name: &str,
        priority: u32,
        weight: f64,
    ) -> Result<TransitionId> {
        if priority == 0 {
            return Err(NetError::InvalidPriority {
                transition: name.to_string(),
            });
        }
        if !(weight.is_finite() && weight > 0.0) {
            return Err(NetError::InvalidWeight {
                transition: name.to_string(),
                weight,
            });
        }
        self.insert_transition(name, TransitionKind::Immediate { priority, weight })
    }

    /// Add a timed transition with the given firing-duration sampler. The
    /// net-construction invariants guarantee that once a timed transition is
    /// enabled, the only way to disable it is to fire it.
    pub fn add_timed_transition(
        &mut self,
        name: &str,
        sampler: impl FnMut(&mut dyn RngCore) -> f64 + 'static,
    ) -> Result<TransitionId> {
        self.insert_transition(
            name,
            TransitionKind::Timed {
                sampler: Box::new(sampler),
            },
        )
    }

    fn insert_transition(&mut self, name: &str, kind: TransitionKind) -> Result<TransitionId> {
        if self.transition_index.contains_key(name) {
            return Err(NetError::DuplicateName {
                namespace: Namespace::Transition,
                name: name.to_string(),
            });
        }
        let id = TransitionId(self.transitions.len() as u32);
        self.transitions
            .push(Transition::new(name.to_string(), id, kind));
        self.transition_index.insert(name.to_string(), id);
        // Offer the new transition to every registered plugin, synchronising
        // the observer with the current enablement (no arcs yet: enabled).
        for i in 0..self.plugins.len() {
            if self.plugins[i].observe_transition(id) {
                self.transitions[id.0 as usize].observers.push(i);
                self.plugins[i].got_enabled(id);
            }
        }
        // With no arcs the transition is enabled; the bridge records it for
        // start() (or schedules it outright when the net is already running).
        self.autofire_enable(id)?;
        Ok(id)
    }

    /// Create a constructor arc: on firing, a new token of the output
    /// place's type is created and pushed there.
    pub fn add_constructor(&mut self, name: &str, transition: &str, place: &str) -> Result<ArcId> {
        let transition = self.transition_id(transition)?;
        let place = self.place_id(place)?;
        self.insert_arc(name, transition, ArcKind::Constructor { place })
    }

    /// Create a destructor arc: on firing, a token is popped from the input
    /// place and destroyed.
    pub fn add_destructor(&mut self, name: &str, transition: &str, place: &str) -> Result<ArcId> {
        let transition = self.transition_id(transition)?;
        let place = self.place_id(place)?;
        self.insert_arc(name, transition, ArcKind::Destructor { place })
    }

    /// Create a transfer arc: on firing, one token moves atomically from the
    /// input place to the output place. Both places must share a type.
    pub fn add_transfer(
        &mut self,
        name: &str,
        transition: &str,
        input_place: &str,
        output_place: &str,
    ) -> Result<ArcId> {
        let transition = self.transition_id(transition)?;
        let input = self.place_id(input_place)?;
        let output = self.place_id(output_place)?;
        let input_type = self.places[input.0 as usize].token_type;
        let output_type = self.places[output.0 as usize].token_type;
        if input_type != output_type {
            return Err(NetError::InvalidTokenType {
                place: output_place.to_string(),
                expected: self.types[output_type.0 as usize].name.clone(),
                found: self.types[input_type.0 as usize].name.clone(),
            });
        }
        self.insert_arc(name, transition, ArcKind::Transfer { input, output })
    }

    /// Create a test arc: the transition enables only while the place holds
    /// a token, but the arc never moves tokens.
    pub fn add_test(&mut self, name: &str, transition: &str, place: &str) -> Result<ArcId> {
        let transition = self.transition_id(transition)?;
        let place = self.place_id(place)?;
        self.insert_arc(name, transition, ArcKind::Test { place })
    }

    /// Create an inhibitor arc: the transition enables only while the place
    /// is empty.
    pub fn add_inhibitor(&mut self, name: &str, place: &str, transition: &str) -> Result<ArcId> {
        let transition = self.transition_id(transition)?;
        let place = self.place_id(place)?;
        self.insert_arc(name, transition, ArcKind::Inhibitor { place })
    }

    fn insert_arc(&mut self, name: &str, transition: TransitionId, kind: ArcKind) -> Result<ArcId> {
        if self.arc_index.contains_key(name) {
            return Err(NetError::DuplicateName {
                namespace: Namespace::Arc,
                name: name.to_string(),
            });
        }
        let id = ArcId(self.arcs.len() as u32);
        let arc = Arc::new(name.to_string(), id, transition, kind);
        let timed = self.transitions[transition.0 as usize].is_timed();

        // Presence observers go through the place-status state machine
        // before anything is mutated.
        if let Some(place) = arc.observed_place() {
            let consumer = arc.is_consumer();
            let p = &mut self.places[place.0 as usize];
            if !p.accept_arc(consumer, timed) {
                return Err(NetError::InvalidStructure {
                    place: p.name.clone(),
                    arc: name.to_string(),
                    transition: self.transitions[transition.0 as usize].name.clone(),
                    timed,
                    consumer,
                    status: p.status.as_str(),
                });
            }
        }

        let observed = arc.observed_place();
        self.arcs.push(arc);
        self.arc_index.insert(name.to_string(), id);
        self.transitions[transition.0 as usize].arcs.push(id);
        {
            let arc = &self.arcs[id.0 as usize];
            debug!(
                arc = %arc.name,
                ordinal = arc.id.0,
                kind = arc.kind_name(),
                "arc added"
            );
        }
        if let Some(place) = observed {
            self.places[place.0 as usize].presence_observers.push(id);
            // Evaluate the local condition once at attachment; this may
            // cross the transition's disabled-arc count through zero.
            let empty = self.places[place.0 as usize].is_empty();
            self.evaluate_presence_arc(id, empty)?;
        }
        Ok(id)
    }

    /// Register a plugin, offering it every existing place, transition and
    /// token. Returns the plugin's registration ordinal.
    pub fn register_plugin(&mut self, mut plugin: Box<dyn Plugin>) -> Result<usize> {
        if self.plugins.iter().any(|p| p.name() == plugin.name()) {
            return Err(NetError::DuplicateName {
                namespace: Namespace::Plugin,
                name: plugin.name().to_string(),
            });
        }
        let idx = self.plugins.len();
        for place in &mut self.places {
            if plugin.observe_place(place.id) {
                place.observers.push(idx);
            }
        }
        for transition in &mut self.transitions {
            if plugin.observe_transition(transition.id) {
                transition.observers.push(idx);
                // Synchronise the fresh observer with the current state.
                if transition.is_enabled() {
                    plugin.got_enabled(transition.id);
                } else {
                    plugin.got_disabled(transition.id);
                }
            }
        }
        for (_, token) in self.tokens.iter_mut() {
            if plugin.observe_token(token.id, token.token_type) {
                token.observers.push(idx);
            }
        }
        debug!(plugin = plugin.name(), ordinal = idx, "plugin registered");
        self.plugins.push(plugin);
        Ok(idx)
    }

    pub(crate) fn plugin(&self, idx: usize) -> &dyn Plugin {
        &*self.plugins[idx]
    }

    pub(crate) fn plugin_mut(&mut self, idx: usize) -> &mut dyn Plugin {
        &mut *self.plugins[idx]
    }

    // ------------------------------------------------------------------
    // Run control
    // ------------------------------------------------------------------

    /// Remove all tokens and return the net to its pre-start state: the
    /// empty marking, presence flags and disabled-arc counts recomputed,
    /// scheduler back in build mode with its recorded initial enablement,
    /// plugins' marking state reset. The RNG is deliberately left alone.
    pub fn reset(&mut self) {
        self.fire.reset();
        self.tokens.clear();
        for place in &mut self.places {
            place.clear();
        }
        for i in 0..self.arcs.len() {
            if !self.arcs[i].is_presence_observer() {
                continue;
            }
            let enabled = self.arcs[i].condition_holds(true);
            self.arcs[i].local_enabled = enabled;
        }
        for transition in &mut self.transitions {
            transition.disabled_arc_count = 0;
        }
        for i in 0..self.arcs.len() {
            if self.arcs[i].is_presence_observer() && !self.arcs[i].local_enabled {
                let t = self.arcs[i].transition.0 as usize;
                self.transitions[t].disabled_arc_count += 1;
            }
        }
        for plugin in &mut self.plugins {
            plugin.reset();
        }
        debug!(net = %self.name, "net reset");
    }

    // ------------------------------------------------------------------
    // Structural queries
    // ------------------------------------------------------------------

    /// Number of tokens currently at the named place.
    pub fn token_count(&self, place: &str) -> Result<usize> {
        let id = self.place_id(place)?;
        Ok(self.places[id.0 as usize].len())
    }

    /// Identity of the token that `pop` would take next from the named
    /// place, without side effects.
    pub fn peek(&self, place: &str) -> Result<Option<TokenId>> {
        let id = self.place_id(place)?;
        Ok(self.places[id.0 as usize]
            .peek()
            .map(|slot| self.tokens.get(slot).id))
    }

    /// Whether the named transition is currently scheduler-eligible.
    pub fn is_enabled(&self, transition: &str) -> Result<bool> {
        let id = self.transition_id(transition)?;
        Ok(self.transitions[id.0 as usize].is_enabled())
    }

    /// Token counts per place, indexed by place ordinal.
    pub fn marking(&self) -> Vec<usize> {
        self.places.iter().map(Place::len).collect()
    }

    /// Number of live tokens across all places.
    pub fn live_tokens(&self) -> usize {
        self.tokens.len()
    }
}
