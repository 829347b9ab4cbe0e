//! The observer fabric: the hook set the net calls while tokens flow.
//!
//! A plugin is offered every place, transition and token of the net via the
//! `observe_*` factory methods; returning `true` attaches the plugin to that
//! entity. Each entity keeps the indices of its attached plugins in
//! registration order, and dispatch walks those lists in that order.
//!
//! Callbacks carry entity ordinals and the current virtual time instead of
//! references into the net, so an observer cannot mutate the emitting
//! entity. The default method bodies are no-ops, serving as the no-op
//! sentinel for callbacks a plugin does not care about.

use crate::collector::Observations;
use crate::types::{PlaceId, Time, TokenId, TokenTypeId, TransitionId};

/// The full observer surface. Implement only what the plugin needs; every
/// callback defaults to a no-op.
pub trait Plugin {
    /// Name of the plugin; unique within a net.
    fn name(&self) -> &str;

    /// Offered once per place; return `true` to receive its place events.
    fn observe_place(&mut self, _place: PlaceId) -> bool {
        false
    }

    /// Offered once per transition; return `true` to receive its events.
    fn observe_transition(&mut self, _transition: TransitionId) -> bool {
        false
    }

    /// Offered once per token at construction; return `true` to receive its
    /// events for the token's lifetime.
    fn observe_token(&mut self, _token: TokenId, _token_type: TokenTypeId) -> bool {
        false
    }

    // Place observer callbacks.

    fn report_arrival_of(&mut self, _place: PlaceId, _token: TokenId, _now: Time) {}

    fn report_departure_of(&mut self, _place: PlaceId, _token: TokenId, _now: Time) {}

    // Token observer callbacks.

    fn report_construction(&mut self, _token: TokenId, _now: Time) {}

    fn report_destruction(&mut self, _token: TokenId, _now: Time) {}

    fn report_arrival_at(&mut self, _token: TokenId, _place: PlaceId, _now: Time) {}

    fn report_departure_from(&mut self, _token: TokenId, _place: PlaceId, _now: Time) {}

    // Transition observer callbacks.

    fn before_firing(&mut self, _transition: TransitionId, _now: Time) {}

    fn after_firing(&mut self, _transition: TransitionId, _now: Time) {}

    /// All presence-observer arcs of the transition hold; it became
    /// scheduler-eligible.
    fn got_enabled(&mut self, _transition: TransitionId) {}

    /// Some presence-observer arc stopped holding. Emitted only for a
    /// transition that previously reported `got_enabled` and has not been
    /// disabled by its own firing.
    fn got_disabled(&mut self, _transition: TransitionId) {}

    /// Drop all marking-related state. Collected observation columns
    /// survive until they are taken.
    fn reset(&mut self) {}

    // Collector surface, implemented by meter plugins only.

    /// Whether this plugin still needs observations before its quota is met.
    /// Non-collector plugins never need more.
    fn need_more_observations(&self) -> bool {
        false
    }

    /// Hand out the accumulated observation columns, leaving the collector
    /// empty. `None` for non-collector plugins.
    fn take_observations(&mut self) -> Option<Observations> {
        None
    }

    /// Override the observation quota. Ignored by non-collector plugins.
    fn set_required_observations(&mut self, _required: usize) {}
}
