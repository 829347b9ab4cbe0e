//! The simulation driver and subscription facade.
//!
//! `Simulator` wraps a [`Net`], exposes the name-based construction API,
//! manages observation-stream subscriptions and drives the firing loop
//! until every subscribed collector is satisfied or the scheduler runs out
//! of enabled transitions.

use rand::RngCore;
use tracing::info;

use crate::collector::Observations;
use crate::error::{NetError, Result};
use crate::meters::{Filter, PlacePopulationMeter, StreamKind, TokenVisitMeter, TransitionFiringMeter};
use crate::net::{Net, DEFAULT_SEED};
use crate::observer::Plugin;
use crate::place::QueuePolicy;
use crate::types::{ArcId, PlaceId, Time, TokenTypeId, TransitionId};

/// Why a simulation run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// Every subscribed collector met its observation quota.
    Satisfied,
    /// The scheduler had neither immediate nor timed work left.
    Exhausted,
}

/// Handle to a subscribed observation stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHandle(pub(crate) usize);

/// The entry point for building and running a performance simulation.
pub struct Simulator {
    net: Net,
    subscriptions: Vec<usize>,
}

impl Simulator {
    pub fn new(name: &str) -> Self {
        Simulator::with_seed(name, DEFAULT_SEED)
    }

    pub fn with_seed(name: &str, seed: u64) -> Self {
        Simulator {
            net: Net::with_seed(name, seed),
            subscriptions: Vec::new(),
        }
    }

    /// The underlying net, for structural queries.
    pub fn net(&self) -> &Net {
        &self.net
    }

    pub fn net_mut(&mut self) -> &mut Net {
        &mut self.net
    }

    pub fn current_time(&self) -> Time {
        self.net.current_time()
    }

    // ------------------------------------------------------------------
    // Construction, delegated to the net
    // ------------------------------------------------------------------

    pub fn add_type(&mut self, name: &str) -> Result<TokenTypeId> {
        self.net.add_type(name)
    }

    pub fn add_place(&mut self, name: &str, ty: &str, policy: QueuePolicy) -> Result<PlaceId> {
        self.net.add_place(name, ty, policy)
    }

    pub fn add_immediate_transition(
        &mut self,
        name: &str,
        priority: u32,
        weight: f64,
    ) -> Result<TransitionId> {
        self.net.add_immediate_transition(name, priority, weight)
    }

    pub fn add_timed_transition(
        &mut self,
        name: &str,
        sampler: impl FnMut(&mut dyn RngCore) -> f64 + 'static,
    ) -> Result<TransitionId> {
        self.net.add_timed_transition(name, sampler)
    }

    pub fn add_constructor(&mut self, name: &str, transition: &str, place: &str) -> Result<ArcId> {
        self.net.add_constructor(name, transition, place)
    }

    pub fn add_destructor(&mut self, name: &str, transition: &str, place: &str) -> Result<ArcId> {
        self.net.add_destructor(name, transition, place)
    }

    pub fn add_transfer(
        &mut self,
        name: &str,
        transition: &str,
        input_place: &str,
        output_place: &str,
    ) -> Result<ArcId> {
        self.net.add_transfer(name, transition, input_place, output_place)
    }

    pub fn add_test(&mut self, name: &str, transition: &str, place: &str) -> Result<ArcId> {
        self.net.add_test(name, transition, place)
    }

    pub fn add_inhibitor(&mut self, name: &str, place: &str, transition: &str) -> Result<ArcId> {
        self.net.add_inhibitor(name, place, transition)
    }

    pub fn register_plugin(&mut self, plugin: Box<dyn Plugin>) -> Result<usize> {
        self.net.register_plugin(plugin)
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Subscribe to an observation stream. Each stream kind can be
    /// subscribed at most once; filter names are resolved immediately.
    pub fn subscribe(
        &mut self,
        kind: StreamKind,
        filter: Filter,
        required_observations: usize,
    ) -> Result<StreamHandle> {
        let resolved = filter.resolve(&self.net)?;
        let plugin: Box<dyn Plugin> = match kind {
            StreamKind::TokenVisits => {
                Box::new(TokenVisitMeter::new(resolved, required_observations))
            }
            StreamKind::PlacePopulation => {
                Box::new(PlacePopulationMeter::new(resolved, required_observations))
            }
            StreamKind::TransitionFiring => {
                Box::new(TransitionFiringMeter::new(resolved, required_observations))
            }
        };
        let idx = self.net.register_plugin(plugin)?;
        self.subscriptions.push(idx);
        Ok(StreamHandle(idx))
    }

    /// Override the observation quota of a subscribed stream.
    pub fn set_required_observations(&mut self, handle: StreamHandle, required: usize) {
        self.net
            .plugin_mut(handle.0)
            .set_required_observations(required);
    }

    /// Whether any subscribed stream still needs observations.
    pub fn need_more_observations(&self) -> bool {
        self.subscriptions
            .iter()
            .any(|&idx| self.net.plugin(idx).need_more_observations())
    }

    /// Hand out the columns a stream has accumulated, leaving it empty.
    pub fn observations(&mut self, handle: StreamHandle) -> Observations {
        self.net
            .plugin_mut(handle.0)
            .take_observations()
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Driving
    // ------------------------------------------------------------------

    /// Run a simulation: reset the net, replay the initial enablement, then
    /// keep firing until every subscribed stream has met its quota or no
    /// transition is enabled.
    pub fn simulate(&mut self) -> Result<HaltReason> {
        self.net.reset();
        self.net.start()?;
        let mut firings: u64 = 0;
        let reason = loop {
            if !self.need_more_observations() {
                break HaltReason::Satisfied;
            }
            match self.net.fire_next() {
                Ok(()) => firings += 1,
                Err(NetError::NoEnabledTransition) => break HaltReason::Exhausted,
                Err(e) => return Err(e),
            }
        };
        info!(
            firings,
            time = self.net.current_time(),
            ?reason,
            "simulation halted"
        );
        Ok(reason)
    }

    /// Reset and fire up to `count` transitions, ignoring observation
    /// quotas. Returns the number of firings performed, which is smaller
    /// than `count` if the enabled transitions ran out.
    pub fn fire_repeatedly(&mut self, count: u64) -> Result<u64> {
        self.net.reset();
        self.net.start()?;
        let mut fired = 0;
        while fired < count {
            match self.net.fire_next() {
                Ok(()) => fired += 1,
                Err(NetError::NoEnabledTransition) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(fired)
    }

    /// Keep firing until the virtual clock reaches or exceeds `end_time`,
    /// without resetting first. Returns the number of firings performed.
    pub fn fire_until(&mut self, end_time: Time) -> Result<u64> {
        self.net.start()?;
        let mut fired = 0;
        while self.net.current_time() < end_time {
            match self.net.fire_next() {
                Ok(()) => fired += 1,
                Err(NetError::NoEnabledTransition) => break,
                Err(e) => return Err(e),
            }
        }
        Ok(fired)
    }
}
