//! Fire control: the discrete-event scheduler.
//!
//! Enabled immediate transitions sit in per-priority buckets referenced by a
//! max-heap of priorities; enabled timed transitions sit on a deadline
//! min-heap. Selection always prefers the highest non-empty immediate
//! bucket, drawing one transition at random proportional to weight; timed
//! transitions fire only when no immediate is enabled, earliest deadline
//! first with insertion order breaking ties.
//!
//! Both heaps are cleaned lazily. A priority whose bucket has emptied stays
//! on the heap until selection skips past it, and a cancelled deadline entry
//! stays on the timed heap until a peek discards it: disabling is O(1) at
//! the cost of at most one extra iteration per selection.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::SmallRng;

use crate::error::{NetError, Result};
use crate::types::{Time, TransitionId};

/// An entry on the timed-transition deadline heap, ordered by deadline with
/// a strictly increasing sequence number as tiebreaker (insertion order
/// wins on equal deadlines).
#[derive(Debug, Clone)]
struct TimedEntry {
    deadline: Time,
    seq: u64,
    transition: TransitionId,
}

impl PartialEq for TimedEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for TimedEntry {}

impl PartialOrd for TimedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimedEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Deadlines are finite by the BadSample guard, so total_cmp agrees
        // with the numeric order.
        self.deadline
            .total_cmp(&other.deadline)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Scheduler state for one net.
#[derive(Debug, Default)]
pub(crate) struct FireControl {
    current_time: Time,
    building: bool,
    /// Enablement recorded while the net is being built, replayed by
    /// `start()`. Ordinal order makes the replay deterministic.
    initial_enable: BTreeMap<TransitionId, bool>,
    /// Priority level buckets, never removed once created. Buckets keep
    /// insertion order.
    levels: BTreeMap<u32, Vec<(TransitionId, f64)>>,
    /// Max-heap over the priorities currently considered active. May hold
    /// a priority whose bucket is momentarily empty.
    active_heap: BinaryHeap<u32>,
    /// The priorities present in `active_heap`.
    active_priorities: HashSet<u32>,
    timed_heap: BinaryHeap<Reverse<TimedEntry>>,
    /// Live heap entry (by sequence number) per scheduled timed transition.
    /// Entries missing from this map are dead and skipped at peek time.
    timed_live: HashMap<TransitionId, u64>,
    next_seq: u64,
}

impl FireControl {
    pub fn new() -> Self {
        FireControl {
            building: true,
            ..FireControl::default()
        }
    }

    pub fn now(&self) -> Time {
        self.current_time
    }

    pub fn is_building(&self) -> bool {
        self.building
    }

    /// Advance the virtual clock. Time never runs backwards.
    pub fn advance_to(&mut self, time: Time) {
        debug_assert!(time >= self.current_time, "virtual time must not decrease");
        self.current_time = time;
    }

    /// Record the enablement of a transition while the net is being built.
    pub fn record_initial(&mut self, transition: TransitionId, enabled: bool) {
        debug_assert!(self.building);
        self.initial_enable.insert(transition, enabled);
    }

    /// Leave build mode. Returns the transitions recorded as enabled, for
    /// the engine to schedule; empty when already started.
    pub fn start(&mut self) -> Vec<TransitionId> {
        if !self.building {
            return Vec::new();
        }
        self.building = false;
        self.initial_enable
            .iter()
            .filter(|(_, &enabled)| enabled)
            .map(|(&transition, _)| transition)
            .collect()
    }

    /// Drop all run-time scheduling state and return to build mode. The
    /// recorded initial enablement survives so `start()` can replay it.
    pub fn reset(&mut self) {
        self.current_time = 0.0;
        self.building = true;
        self.levels.clear();
        self.active_heap.clear();
        self.active_priorities.clear();
        self.timed_heap.clear();
        self.timed_live.clear();
        self.next_seq = 0;
    }

    /// Insert an enabled immediate transition into its priority bucket.
    pub fn enable_immediate(&mut self, transition: TransitionId, priority: u32, weight: f64) {
        let bucket = self.levels.entry(priority).or_default();
        debug_assert!(
            !bucket.iter().any(|(t, _)| *t == transition),
            "transition already enabled at this priority"
        );
        bucket.push((transition, weight));
        if self.active_priorities.insert(priority) {
            self.active_heap.push(priority);
        }
    }

    /// Remove an immediate transition from its bucket. The heap entry for
    /// the priority is cleaned lazily during selection.
    pub fn disable_immediate(&mut self, transition: TransitionId, priority: u32) {
        debug_assert!(self.active_priorities.contains(&priority));
        if let Some(bucket) = self.levels.get_mut(&priority) {
            if let Some(pos) = bucket.iter().position(|(t, _)| *t == transition) {
                bucket.remove(pos);
            }
        }
    }

    /// Put a timed transition on the deadline heap.
    pub fn schedule_timed(&mut self, transition: TransitionId, deadline: Time) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timed_live.insert(transition, seq);
        self.timed_heap.push(Reverse(TimedEntry {
            deadline,
            seq,
            transition,
        }));
    }

    /// Invalidate the live deadline entry of a timed transition. The dead
    /// entry is discarded once it reaches the heap head.
    pub fn cancel_timed(&mut self, transition: TransitionId) {
        let live = self.timed_live.remove(&transition);
        debug_assert!(live.is_some(), "cancelling an unscheduled timed transition");
    }

    /// Select the transition to fire next and the virtual time of that
    /// firing, without changing the schedule. A non-empty immediate bucket
    /// of any priority preempts every timed deadline.
    pub fn select_next(&mut self, rng: &mut SmallRng) -> Result<(Time, TransitionId)> {
        while let Some(&priority) = self.active_heap.peek() {
            let bucket = self
                .levels
                .get(&priority)
                .map(Vec::as_slice)
                .unwrap_or_default();
            if bucket.is_empty() {
                self.active_heap.pop();
                self.active_priorities.remove(&priority);
                continue;
            }
            let transition = if bucket.len() == 1 {
                bucket[0].0
            } else {
                let choice = WeightedIndex::new(bucket.iter().map(|(_, w)| *w))
                    .expect("immediate weights are positive");
                bucket[choice.sample(rng)].0
            };
            return Ok((self.current_time, transition));
        }

        loop {
            let head = match self.timed_heap.peek() {
                Some(Reverse(entry)) => (entry.deadline, entry.seq, entry.transition),
                None => return Err(NetError::NoEnabledTransition),
            };
            let (deadline, seq, transition) = head;
            if self.timed_live.get(&transition) == Some(&seq) {
                return Ok((deadline, transition));
            }
            self.timed_heap.pop();
        }
    }
}
