//! Agent-based simulation of how a communication campaign propagates
//! awareness, interest, knowledge, liking and purchase intent through a
//! population connected by a social network. Media exposure, word of mouth
//! and forgetting move each agent along an ordered funnel; many stochastic
//! repetitions are averaged into a reportable time series.

pub mod agent;
pub mod aggregate;
pub mod config;
pub mod error;
pub mod funnel;
pub mod media;
pub mod network;
pub mod output;
pub mod runner;
pub mod sim;
mod util;
pub mod wom;

pub use crate::aggregate::{DayMetricPoint, MetricSummary, RepetitionSeries, RunResult};
pub use crate::config::{AppConfig, ScenarioConfig};
pub use crate::error::EngineError;
pub use crate::funnel::{FunnelStage, Metric};
pub use crate::network::NetworkGraph;
pub use crate::runner::{RunOutcome, SimulationRunner};
pub use crate::sim::Simulation;
