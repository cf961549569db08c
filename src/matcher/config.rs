use serde::{Deserialize, Serialize};

/// Tunables of a [`MatchOrchestrator`](crate::matcher::MatchOrchestrator).
///
/// Distances are in meters and durations in seconds. Every field has a
/// default, so a partial document deserializes into a complete config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Search radius for start candidates.
    pub initial_radius: f64,
    /// Most start candidates considered per seed point.
    pub max_initial_candidates: usize,
    /// Largest distance at which a point is matched to a segment.
    pub matching_radius: f64,

    /// Tracks with fewer points are not matched.
    pub min_track_points: usize,
    /// Side length of the envelope used to skip clustered points.
    pub envelope_side_length: f64,
    /// Mean sampling interval above which a track is considered low-sampled.
    pub low_sampling_interval: f64,

    /// Most concurrently active branches.
    pub max_active_branches: usize,
    /// Active branches lagging more steps behind the leader are culled.
    pub max_step_lag: usize,
    /// Direct expansions attempted to bring a lagging branch to the leader.
    pub max_catch_up_steps: usize,
    /// Iterations without any frontier progress before a run is abandoned.
    pub max_stall_iterations: usize,

    /// Follow several adjacency hops when points are dense.
    pub extended_path_matching: bool,
    /// Point gap below which the multi-hop lookahead is used.
    pub extended_matching_distance: f64,
    /// Deepest lookahead, in hops.
    pub max_lookahead_depth: usize,
    /// Most network length passed through without matching any point.
    pub max_passthrough_length: f64,
    /// Longest unique-successor chain followed on motorways.
    pub max_motorway_chain: usize,

    /// Hop budget of shortest-path queries, doubled on low-sampled tracks.
    pub max_path_hops: usize,
    /// Gaps lasting longer are skipped instead of routed.
    pub max_routing_time: f64,
    /// Targets considered around the next unmatched point.
    pub alternative_candidates: usize,
    /// Additional points probed on low-sampled tracks.
    pub probe_ahead_points: usize,
    /// Probing ahead is limited to tracks sampled at most this sparsely.
    pub probe_ahead_max_interval: f64,
    /// Multiplier applied to the road speed limits by the feasibility check.
    pub speed_tolerance: f64,

    /// Look for higher-class routes around short lower-class detours.
    pub bypass_detection: bool,
    /// Longest detour, in segments, which is considered a bypass.
    pub bypass_max_detour_segments: usize,
    /// Most points matched on a detour considered a bypass.
    pub bypass_max_points: usize,

    /// Sections of a finished branch with fewer matched segments are removed.
    pub min_segments_per_section: usize,

    pub candidate_cache_capacity: usize,
    pub path_cache_capacity: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            initial_radius: 50.0,
            max_initial_candidates: 10,
            matching_radius: 25.0,

            min_track_points: 2,
            envelope_side_length: 10.0,
            low_sampling_interval: 20.0,

            max_active_branches: 10,
            max_step_lag: 3,
            max_catch_up_steps: 10,
            max_stall_iterations: 10,

            extended_path_matching: true,
            extended_matching_distance: 50.0,
            max_lookahead_depth: 5,
            max_passthrough_length: 100.0,
            max_motorway_chain: 10,

            max_path_hops: 20,
            max_routing_time: 300.0,
            alternative_candidates: 5,
            probe_ahead_points: 2,
            probe_ahead_max_interval: 60.0,
            speed_tolerance: 1.2,

            bypass_detection: true,
            bypass_max_detour_segments: 3,
            bypass_max_points: 2,

            min_segments_per_section: 1,

            candidate_cache_capacity: 1_024,
            path_cache_capacity: 4_096,
        }
    }
}
