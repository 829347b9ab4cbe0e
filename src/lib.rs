//! spn_simulator - Deterministic discrete-event simulator for stochastic
//! Petri nets.
//!
//! The crate implements the simulation core of a Petri-net engine for
//! performance modelling: places, transitions and arcs with an
//! enabling/disabling protocol driven by token flow, a discrete-event
//! scheduler that picks the next transition by the stochastic firing rule,
//! and an observer fabric that materialises columnar measurement streams as
//! virtual time advances.
//!
//! # Architecture
//!
//! - **Net**: places, transitions, arcs, tokens, and the construction-time
//!   invariants (name registries, place-status state machine)
//! - **Engine**: the atomic firing protocol and observer dispatch
//! - **FireControl**: priority-ordered immediate transitions with weighted
//!   random tie-breaking, timed transitions on a deadline heap
//! - **Meters**: collectors turning observer callbacks into typed columns
//! - **Simulator**: subscription facade and the firing loop driver
//!
//! # Usage
//!
//! ```rust,no_run
//! use spn_simulator::{Filter, QueuePolicy, Simulator, StreamKind};
//!
//! fn main() -> Result<(), spn_simulator::NetError> {
//!     let mut sim = Simulator::with_seed("line", 7);
//!     sim.add_type("job")?;
//!     sim.add_place("pending", "job", QueuePolicy::Fifo)?;
//!     sim.add_place("done", "job", QueuePolicy::Fifo)?;
//!
//!     // A source that deposits a job every time unit, and a server that
//!     // completes one 0.8 time units after it became available.
//!     sim.add_timed_transition("arrive", |_| 1.0)?;
//!     sim.add_constructor("arrivals", "arrive", "pending")?;
//!     sim.add_timed_transition("serve", |_| 0.8)?;
//!     sim.add_transfer("service", "serve", "pending", "done")?;
//!
//!     let firings = sim.subscribe(StreamKind::TransitionFiring, Filter::all(), 100)?;
//!     sim.simulate()?;
//!
//!     let columns = sim.observations(firings);
//!     println!("observed {} firings", columns.rows());
//!     Ok(())
//! }
//! ```
//!
//! Runs are deterministic: the same build sequence, samplers and seed give
//! byte-identical observation columns. All state lives inside the net
//! instance, so any number of nets can coexist in one process.

mod arc;
pub mod collector;
mod engine;
pub mod error;
mod fire;
pub mod meters;
pub mod net;
pub mod observer;
pub mod place;
pub mod sim;
mod token;
pub mod transition;
pub mod types;

pub use collector::{Column, Observations};
pub use error::{Namespace, NetError, Result};
pub use meters::{Filter, StreamKind};
pub use net::{Net, DEFAULT_SEED};
pub use observer::Plugin;
pub use place::QueuePolicy;
pub use sim::{HaltReason, Simulator, StreamHandle};
pub use transition::Sampler;
pub use types::{ArcId, PlaceId, Time, TokenId, TokenTypeId, TransitionId};
