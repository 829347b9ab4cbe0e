//! Error types surfaced by the simulation core.
//!
//! Construction-time errors leave the net in its pre-call state. Runtime
//! errors raised in the middle of a firing are fatal for the run.

use crate::types::Time;

/// Result alias for fallible net operations.
pub type Result<T> = std::result::Result<T, NetError>;

/// The namespace a name lives in. Types, places, transitions, arcs and
/// plugins each have their own namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    TokenType,
    Place,
    Transition,
    Arc,
    Plugin,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::TokenType => "token type",
            Namespace::Place => "place",
            Namespace::Transition => "transition",
            Namespace::Arc => "arc",
            Namespace::Plugin => "plugin",
        }
    }
}

/// Errors raised by net construction and simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum NetError {
    /// A name collides with an existing entity in the same namespace.
    DuplicateName { namespace: Namespace, name: String },
    /// A lookup by name missed.
    UnknownName { namespace: Namespace, name: String },
    /// The place-status state machine rejected an arc. A place feeding a
    /// timed transition must keep exactly one token consumer so that an
    /// enabled timed transition can only be disabled by firing it.
    InvalidStructure {
        place: String,
        arc: String,
        transition: String,
        timed: bool,
        consumer: bool,
        status: &'static str,
    },
    /// A token of the wrong type was pushed at a place, or a transfer arc
    /// connects places of different types.
    InvalidTokenType {
        place: String,
        expected: String,
        found: String,
    },
    /// The priority of an immediate transition must be a positive integer.
    InvalidPriority { transition: String },
    /// The weight of an immediate transition must be a positive finite float.
    InvalidWeight { transition: String, weight: f64 },
    /// The scheduler has neither immediate nor timed work. The driver treats
    /// this as a normal halt, not a failure.
    NoEnabledTransition,
    /// A firing-time sampler returned a non-finite or negative duration.
    BadSample { transition: String, sample: Time },
}

impl std::fmt::Display for NetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetError::DuplicateName { namespace, name } => {
                write!(f, "{} '{name}' is already defined", namespace.as_str())
            }
            NetError::UnknownName { namespace, name } => {
                write!(f, "unknown {} '{name}'", namespace.as_str())
            }
            NetError::InvalidStructure {
                place,
                arc,
                transition,
                timed,
                consumer,
                status,
            } => {
                let transition_kind = if *timed { "timed" } else { "immediate" };
                let arc_kind = if *consumer {
                    "token-consumer"
                } else {
                    "presence-observer"
                };
                write!(
                    f,
                    "connecting place '{place}' to {transition_kind} transition \
                     '{transition}' with {arc_kind} arc '{arc}' is not allowed: \
                     the place is in {status} status"
                )
            }
            NetError::InvalidTokenType {
                place,
                expected,
                found,
            } => {
                write!(
                    f,
                    "place '{place}' holds tokens of type '{expected}', got '{found}'"
                )
            }
            NetError::InvalidPriority { transition } => {
                write!(
                    f,
                    "the priority of immediate transition '{transition}' must be a \
                     positive integer"
                )
            }
            NetError::InvalidWeight { transition, weight } => {
                write!(
                    f,
                    "the weight of immediate transition '{transition}' must be a \
                     positive finite float, found {weight}"
                )
            }
            NetError::NoEnabledTransition => write!(f, "no enabled transition to fire"),
            NetError::BadSample { transition, sample } => {
                write!(
                    f,
                    "sampler of timed transition '{transition}' returned {sample}; \
                     durations must be finite and non-negative"
                )
            }
        }
    }
}

impl std::error::Error for NetError {}
