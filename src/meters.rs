//! Meter plugins: bridge observer callbacks into columnar collectors.
//!
//! Three bundled streams are available. `token_visits` records one row per
//! completed stay of a token at a place, `place_population` one row per
//! constant-population interval of a place, `transition_firing` one row per
//! firing. Each stream carries an observation quota; the simulation driver
//! halts once every subscribed stream has met its quota.

use std::collections::{BTreeSet, HashMap};

use crate::collector::{FiringCollector, Observations, PlacePopulationCollector, TokenVisitCollector};
use crate::error::Result;
use crate::net::Net;
use crate::observer::Plugin;
use crate::types::{PlaceId, Time, TokenId, TokenTypeId, TransitionId};

/// The kinds of observation streams that can be subscribed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    TokenVisits,
    PlacePopulation,
    TransitionFiring,
}

impl StreamKind {
    /// Stream name; doubles as the plugin name, so each stream kind can be
    /// subscribed at most once per net.
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::TokenVisits => "token_visits",
            StreamKind::PlacePopulation => "place_population",
            StreamKind::TransitionFiring => "transition_firing",
        }
    }
}

/// Selects which entities a subscribed stream observes. An unset criterion
/// observes everything; criteria irrelevant to a stream kind are ignored.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    places: Option<Vec<String>>,
    token_types: Option<Vec<String>>,
    transitions: Option<Vec<String>>,
}

impl Filter {
    /// Observe everything.
    pub fn all() -> Self {
        Filter::default()
    }

    /// Restrict to the named places (`token_visits`, `place_population`).
    pub fn places(mut self, names: &[&str]) -> Self {
        self.places = Some(names.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Restrict to the named token types (`token_visits`).
    pub fn token_types(mut self, names: &[&str]) -> Self {
        self.token_types = Some(names.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Restrict to the named transitions (`transition_firing`).
    pub fn transitions(mut self, names: &[&str]) -> Self {
        self.transitions = Some(names.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Resolve the names against a net into ordinal sets.
    pub(crate) fn resolve(&self, net: &Net) -> Result<ResolvedFilter> {
        let places = match &self.places {
            None => None,
            Some(names) => Some(
                names
                    .iter()
                    .map(|n| net.place_id(n).map(|id| id.0))
                    .collect::<Result<BTreeSet<u32>>>()?,
            ),
        };
        let token_types = match &self.token_types {
            None => None,
            Some(names) => Some(
                names
                    .iter()
                    .map(|n| net.token_type_id(n).map(|id| id.0))
                    .collect::<Result<BTreeSet<u32>>>()?,
            ),
        };
        let transitions = match &self.transitions {
            None => None,
            Some(names) => Some(
                names
                    .iter()
                    .map(|n| net.transition_id(n).map(|id| id.0))
                    .collect::<Result<BTreeSet<u32>>>()?,
            ),
        };
        Ok(ResolvedFilter {
            places,
            token_types,
            transitions,
        })
    }
}

/// A filter with every name resolved to its ordinal.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResolvedFilter {
    pub places: Option<BTreeSet<u32>>,
    pub token_types: Option<BTreeSet<u32>>,
    pub transitions: Option<BTreeSet<u32>>,
}

fn passes(filter: &Option<BTreeSet<u32>>, ordinal: u32) -> bool {
    filter.as_ref().map_or(true, |set| set.contains(&ordinal))
}

// ----------------------------------------------------------------------
// token_visits
// ----------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct VisitState {
    token_type: u32,
    arrival_time: Time,
    visit_number: u64,
}

/// Per-token observer emitting one row per completed visit at a place.
#[derive(Debug)]
pub(crate) struct TokenVisitMeter {
    places: Option<BTreeSet<u32>>,
    token_types: Option<BTreeSet<u32>>,
    collector: TokenVisitCollector,
    visits: HashMap<TokenId, VisitState>,
}

impl TokenVisitMeter {
    pub fn new(filter: ResolvedFilter, required: usize) -> Self {
        TokenVisitMeter {
            places: filter.places,
            token_types: filter.token_types,
            collector: TokenVisitCollector::new(required),
            visits: HashMap::new(),
        }
    }
}

impl Plugin for TokenVisitMeter {
    fn name(&self) -> &str {
        StreamKind::TokenVisits.as_str()
    }

    fn observe_token(&mut self, token: TokenId, token_type: TokenTypeId) -> bool {
        if !passes(&self.token_types, token_type.0) {
            return false;
        }
        self.visits.insert(
            token,
            VisitState {
                token_type: token_type.0,
                arrival_time: 0.0,
                visit_number: 0,
            },
        );
        true
    }

    fn report_arrival_at(&mut self, token: TokenId, _place: PlaceId, now: Time) {
        if let Some(state) = self.visits.get_mut(&token) {
            state.arrival_time = now;
            state.visit_number += 1;
        }
    }

    fn report_departure_from(&mut self, token: TokenId, place: PlaceId, now: Time) {
        if !passes(&self.places, place.0) {
            return;
        }
        if let Some(state) = self.visits.get(&token) {
            self.collector.collect(
                token.0,
                state.token_type,
                state.arrival_time,
                state.visit_number,
                place.0,
                now - state.arrival_time,
            );
        }
    }

    fn report_destruction(&mut self, token: TokenId, _now: Time) {
        self.visits.remove(&token);
    }

    fn reset(&mut self) {
        self.visits.clear();
    }

    fn need_more_observations(&self) -> bool {
        self.collector.need_more()
    }

    fn take_observations(&mut self) -> Option<Observations> {
        Some(self.collector.take())
    }

    fn set_required_observations(&mut self, required: usize) {
        self.collector.set_required(required);
    }
}

// ----------------------------------------------------------------------
// place_population
// ----------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
struct PopulationState {
    num_tokens: u64,
    time_of_last_move: Time,
}

/// Per-place observer emitting one row per interval of constant population.
#[derive(Debug)]
pub(crate) struct PlacePopulationMeter {
    places: Option<BTreeSet<u32>>,
    collector: PlacePopulationCollector,
    counts: HashMap<u32, PopulationState>,
}

impl PlacePopulationMeter {
    pub fn new(filter: ResolvedFilter, required: usize) -> Self {
        PlacePopulationMeter {
            places: filter.places,
            collector: PlacePopulationCollector::new(required),
            counts: HashMap::new(),
        }
    }

    fn update(&mut self, place: PlaceId, delta: i64, now: Time) {
        let state = self.counts.entry(place.0).or_default();
        let duration = now - state.time_of_last_move;
        if duration > 0.0 {
            self.collector
                .collect(state.time_of_last_move, place.0, state.num_tokens, duration);
        }
        state.time_of_last_move = now;
        let next = state.num_tokens.checked_add_signed(delta);
        debug_assert!(next.is_some(), "place population cannot go negative");
        state.num_tokens = next.unwrap_or(0);
    }
}

impl Plugin for PlacePopulationMeter {
    fn name(&self) -> &str {
        StreamKind::PlacePopulation.as_str()
    }

    fn observe_place(&mut self, place: PlaceId) -> bool {
        if !passes(&self.places, place.0) {
            return false;
        }
        self.counts.insert(place.0, PopulationState::default());
        true
    }

    fn report_arrival_of(&mut self, place: PlaceId, _token: TokenId, now: Time) {
        self.update(place, 1, now);
    }

    fn report_departure_of(&mut self, place: PlaceId, _token: TokenId, now: Time) {
        self.update(place, -1, now);
    }

    fn reset(&mut self) {
        for state in self.counts.values_mut() {
            *state = PopulationState::default();
        }
    }

    fn need_more_observations(&self) -> bool {
        self.collector.need_more()
    }

    fn take_observations(&mut self) -> Option<Observations> {
        Some(self.collector.take())
    }

    fn set_required_observations(&mut self, required: usize) {
        self.collector.set_required(required);
    }
}

// ----------------------------------------------------------------------
// transition_firing
// ----------------------------------------------------------------------

/// Per-transition observer emitting one row per firing, with the interval
/// since the previous firing of the same transition.
#[derive(Debug)]
pub(crate) struct TransitionFiringMeter {
    transitions: Option<BTreeSet<u32>>,
    collector: FiringCollector,
    previous_firing: HashMap<u32, Time>,
}

impl TransitionFiringMeter {
    pub fn new(filter: ResolvedFilter, required: usize) -> Self {
        TransitionFiringMeter {
            transitions: filter.transitions,
            collector: FiringCollector::new(required),
            previous_firing: HashMap::new(),
        }
    }
}

impl Plugin for TransitionFiringMeter {
    fn name(&self) -> &str {
        StreamKind::TransitionFiring.as_str()
    }

    fn observe_transition(&mut self, transition: TransitionId) -> bool {
        if !passes(&self.transitions, transition.0) {
            return false;
        }
        // The first interval is measured from the simulation start time.
        self.previous_firing.insert(transition.0, 0.0);
        true
    }

    fn after_firing(&mut self, transition: TransitionId, now: Time) {
        let previous = self.previous_firing.entry(transition.0).or_insert(0.0);
        self.collector.collect(transition.0, now, now - *previous);
        *previous = now;
    }

    fn reset(&mut self) {
        for previous in self.previous_firing.values_mut() {
            *previous = 0.0;
        }
    }

    fn need_more_observations(&self) -> bool {
        self.collector.need_more()
    }

    fn take_observations(&mut self) -> Option<Observations> {
        Some(self.collector.take())
    }

    fn set_required_observations(&mut self, required: usize) {
        self.collector.set_required(required);
    }
}
