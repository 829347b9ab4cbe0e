//! Transitions: immediate (priority + weight) or timed (duration sampler).

use rand::RngCore;

use crate::types::{ArcId, TransitionId};

/// A firing-duration sampler for a timed transition. The sampler draws from
/// the single engine RNG; deterministic samplers simply ignore it.
pub type Sampler = Box<dyn FnMut(&mut dyn RngCore) -> f64>;

/// The kind of a transition. Immediate transitions have priority > 0 and a
/// positive weight; timed transitions have priority 0 and a sampler.
pub(crate) enum TransitionKind {
    Immediate { priority: u32, weight: f64 },
    Timed { sampler: Sampler },
}

impl std::fmt::Debug for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionKind::Immediate { priority, weight } => f
                .debug_struct("Immediate")
                .field("priority", priority)
                .field("weight", weight)
                .finish(),
            TransitionKind::Timed { .. } => f.debug_struct("Timed").finish_non_exhaustive(),
        }
    }
}

/// A transition and its enablement bookkeeping. A transition is enabled iff
/// none of its presence-observer arcs report a false local condition.
#[derive(Debug)]
pub(crate) struct Transition {
    pub name: String,
    pub id: TransitionId,
    pub kind: TransitionKind,
    /// Arcs owned by this transition, in insertion order. `fire` runs their
    /// flows in exactly this order.
    pub arcs: Vec<ArcId>,
    /// Number of presence-observer arcs whose local condition is false.
    pub disabled_arc_count: u32,
    /// Indices of plugins observing this transition, in registration order.
    pub observers: Vec<usize>,
}

impl Transition {
    pub fn new(name: String, id: TransitionId, kind: TransitionKind) -> Self {
        Transition {
            name,
            id,
            kind,
            arcs: Vec::new(),
            disabled_arc_count: 0,
            observers: Vec::new(),
        }
    }

    pub fn is_timed(&self) -> bool {
        matches!(self.kind, TransitionKind::Timed { .. })
    }

    pub fn is_enabled(&self) -> bool {
        self.disabled_arc_count == 0
    }

    pub fn priority(&self) -> u32 {
        match self.kind {
            TransitionKind::Immediate { priority, .. } => priority,
            TransitionKind::Timed { .. } => 0,
        }
    }
}
