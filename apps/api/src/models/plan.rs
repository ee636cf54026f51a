use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single day of a generated itinerary. Extra keys (times, costs, ...) ride along in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: u32,
    #[serde(default)]
    pub plan: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DayPlan {
    pub fn new(day: u32, plan: impl Into<String>) -> Self {
        DayPlan {
            day,
            plan: plan.into(),
            extra: Map::new(),
        }
    }
}

/// The structured itinerary attached to a trip as `aiPlan`.
///
/// Missing fields decode to their defaults. Keys the provider added beyond
/// the three known ones are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPlan {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub itinerary: Vec<DayPlan>,
    #[serde(default)]
    pub packing: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GeneratedPlan {
    /// A plan carrying only a summary.
    pub fn summary_only(summary: impl Into<String>) -> Self {
        GeneratedPlan {
            summary: summary.into(),
            ..Default::default()
        }
    }
}
