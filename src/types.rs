//! Newtype wrappers and type aliases for domain concepts.
//!
//! Newtypes for identifiers (token types, places, transitions, arcs, tokens)
//! prevent silent ordinal confusion between the entity kinds. Ordinals are
//! assigned densely from 0 in creation order; token identities come from a
//! per-net monotonic 64-bit counter and are never recycled within a run.

/// Token type ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenTypeId(pub u32);

/// Place ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlaceId(pub u32);

/// Transition ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionId(pub u32);

/// Arc ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArcId(pub u32);

/// Token identity: a monotonically increasing 64-bit counter assigned at
/// construction. Storage slots are reused after destruction, identities
/// are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub u64);

/// Virtual simulation time. Non-decreasing; advances only when a timed
/// transition fires.
pub type Time = f64;
