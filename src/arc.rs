//! Arcs: a tagged variant over the five arc shapes.
//!
//! Presence-observer arcs (test, inhibitor, destructor, transfer input)
//! gate their transition on the emptiness of their place and keep a local
//! enabledness flag; token-consumer arcs additionally pop a token when the
//! transition fires. Constructor arcs only place tokens.

use crate::types::{ArcId, PlaceId, TransitionId};

/// The five arc shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArcKind {
    /// Presence observer; flow is a no-op.
    Test { place: PlaceId },
    /// Inverse presence observer: requires the place to be empty.
    Inhibitor { place: PlaceId },
    /// Presence observer and token consumer: pops and destroys a token.
    Destructor { place: PlaceId },
    /// Token placer: creates a token of the place's type and pushes it.
    Constructor { place: PlaceId },
    /// Presence observer on the input, token placer on the output: moves
    /// one token atomically.
    Transfer { input: PlaceId, output: PlaceId },
}

/// An arc owned by exactly one transition.
#[derive(Debug)]
pub(crate) struct Arc {
    pub name: String,
    pub id: ArcId,
    pub transition: TransitionId,
    pub kind: ArcKind,
    /// Local enabledness against the observed place. Meaningful only for
    /// presence observers; starts true and is adjusted on attachment.
    pub local_enabled: bool,
}

impl Arc {
    pub fn new(name: String, id: ArcId, transition: TransitionId, kind: ArcKind) -> Self {
        Arc {
            name,
            id,
            transition,
            kind,
            local_enabled: true,
        }
    }

    pub fn is_presence_observer(&self) -> bool {
        !matches!(self.kind, ArcKind::Constructor { .. })
    }

    pub fn is_consumer(&self) -> bool {
        matches!(
            self.kind,
            ArcKind::Destructor { .. } | ArcKind::Transfer { .. }
        )
    }

    /// The place whose emptiness this arc observes, if any.
    pub fn observed_place(&self) -> Option<PlaceId> {
        match self.kind {
            ArcKind::Test { place }
            | ArcKind::Inhibitor { place }
            | ArcKind::Destructor { place } => Some(place),
            ArcKind::Transfer { input, .. } => Some(input),
            ArcKind::Constructor { .. } => None,
        }
    }

    /// Whether the local condition holds for the given emptiness of the
    /// observed place. Inhibitors invert the condition.
    pub fn condition_holds(&self, place_empty: bool) -> bool {
        match self.kind {
            ArcKind::Inhibitor { .. } => place_empty,
            _ => !place_empty,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ArcKind::Test { .. } => "test",
            ArcKind::Inhibitor { .. } => "inhibitor",
            ArcKind::Destructor { .. } => "destructor",
            ArcKind::Constructor { .. } => "constructor",
            ArcKind::Transfer { .. } => "transfer",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arc(kind: ArcKind) -> Arc {
        Arc::new("a".into(), ArcId(0), TransitionId(0), kind)
    }

    #[test]
    fn test_presence_and_consumer_predicates() {
        assert!(arc(ArcKind::Test { place: PlaceId(0) }).is_presence_observer());
        assert!(arc(ArcKind::Inhibitor { place: PlaceId(0) }).is_presence_observer());
        assert!(arc(ArcKind::Destructor { place: PlaceId(0) }).is_presence_observer());
        assert!(!arc(ArcKind::Constructor { place: PlaceId(0) }).is_presence_observer());

        assert!(arc(ArcKind::Destructor { place: PlaceId(0) }).is_consumer());
        assert!(arc(ArcKind::Transfer {
            input: PlaceId(0),
            output: PlaceId(1)
        })
        .is_consumer());
        assert!(!arc(ArcKind::Test { place: PlaceId(0) }).is_consumer());
    }

    #[test]
    fn test_inhibitor_inverts_condition() {
        let test = arc(ArcKind::Test { place: PlaceId(0) });
        assert!(test.condition_holds(false));
        assert!(!test.condition_holds(true));

        let inhibitor = arc(ArcKind::Inhibitor { place: PlaceId(0) });
        assert!(inhibitor.condition_holds(true));
        assert!(!inhibitor.condition_holds(false));
    }

    #[test]
    fn test_transfer_observes_input() {
        let transfer = arc(ArcKind::Transfer {
            input: PlaceId(3),
            output: PlaceId(4),
        });
        assert_eq!(transfer.observed_place(), Some(PlaceId(3)));
    }
}
