use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FeatureId, Station};

/// How station values are pushed across the derived collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PropagationStrategy {
    /// Associate each feature with its single nearest source within tolerance
    NearestMatch,
    /// Walk the segments in ascending ID order, flooding values outward from
    /// each segment end point; the last writer wins
    #[default]
    Cascade,
}

impl std::fmt::Display for PropagationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropagationStrategy::NearestMatch => write!(f, "nearest-match"),
            PropagationStrategy::Cascade => write!(f, "cascade"),
        }
    }
}

/// Tallies from the projection stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectionTally {
    /// Points examined
    pub points_total: usize,

    /// Points projected within the threshold and carried forward
    pub points_projected: usize,

    /// Points whose projection distance exceeded the threshold
    pub points_out_of_threshold: usize,

    /// Points skipped because no projection could be resolved
    pub points_skipped: usize,
}

/// Tallies from the corridor filter stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorridorTally {
    /// Candidates evaluated against the corridor polygon
    pub candidates: usize,

    /// Candidates removed for not being strictly inside
    pub removed: usize,
}

/// Tallies from the linear referencing stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceTally {
    /// Start-to-point sub-paths cut from the route
    pub segments_cut: usize,

    /// Asset points that received a station label
    pub points_stationed: usize,
}

/// Tallies from the segment ordering stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderingTally {
    /// Segments ranked by length
    pub segments_ordered: usize,

    /// End point features derived from segment terminals
    pub end_points_created: usize,
}

/// Tallies from the propagation stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropagationTally {
    /// Connection lines that received values
    pub lines_updated: usize,

    /// Asset points that received values
    pub points_updated: usize,
}

/// Tallies from the cleanup stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupTally {
    /// Temporary collections deleted
    pub collections_deleted: usize,
}

/// Summary of a full pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Identifier of the owning route
    pub route_id: FeatureId,

    /// Arc length of the owning route
    pub route_length: f64,

    /// Station of the route's end vertex
    pub route_end_station: Station,

    /// Propagation strategy used
    pub strategy: PropagationStrategy,

    /// Projection stage tallies
    pub projection: ProjectionTally,

    /// Corridor filter tallies
    pub corridor: CorridorTally,

    /// Linear referencing tallies
    pub reference: ReferenceTally,

    /// Segment ordering tallies
    pub ordering: OrderingTally,

    /// Propagation tallies
    pub propagation: PropagationTally,

    /// Cleanup tallies
    pub cleanup: CleanupTally,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Wall-clock duration of the run in milliseconds
    pub elapsed_ms: u64,
}
