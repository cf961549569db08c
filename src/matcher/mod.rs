//! Branch-and-bound matching of a [`Track`] onto a [`RoadNetwork`](crate::graph::RoadNetwork).
//!
//! A [`MatchOrchestrator`] seeds [`Branch`]es with the [`InitialSegmentLocator`],
//! extends them point by point with the [`DirectExpander`], falls back to the
//! [`AlternativeSearcher`] when every branch stalls, and prunes them with the
//! [`BranchFilter`] after each iteration.

pub mod alternative;
pub mod config;
pub mod context;
pub mod costing;
pub mod expand;
pub mod filter;
pub mod locate;
pub mod orchestrator;
pub mod points;
pub mod preprocess;
pub mod primitives;
pub mod track;

pub use alternative::AlternativeSearcher;
pub use config::MatchConfig;
pub use context::{MatchContext, MatchStatistics};
pub use costing::{DefaultWeighting, WeightingStrategy};
pub use expand::{DirectExpander, Expansion};
pub use filter::{BranchFilter, BranchSet};
pub use locate::InitialSegmentLocator;
pub use orchestrator::{EntryMode, MatchOrchestrator, MatchOutput};
pub use points::PointMatcher;
pub use preprocess::{SamplingProfile, TrackPreprocessor};
pub use primitives::*;
pub use track::{PointKey, Track, TrackMetadata, TrackPoint};
