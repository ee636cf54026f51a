//! Response normalization: turns whatever the provider returned into a
//! `GeneratedPlan`. Never fails.
//!
//! Lenient mode (default) accepts any JSON object and decodes it field by
//! field: missing, null or mistyped fields take defaults, numeric-string days
//! are accepted, and unknown keys are kept. `{"foo": 1}` becomes a plan with
//! an empty summary and `foo` kept alongside. Strict mode only accepts complete, well-typed plans
//! and otherwise degrades to the plain-text fallback.

use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::llm_client::RawCompletion;
use crate::models::plan::{DayPlan, GeneratedPlan};

/// Summary used when the provider returned nothing usable at all.
pub const UNPARSEABLE_PLACEHOLDER: &str = "Plan generated but could not be parsed.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NormalizeMode {
    #[default]
    Lenient,
    Strict,
}

impl FromStr for NormalizeMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(NormalizeMode::Lenient),
            "strict" => Ok(NormalizeMode::Strict),
            other => Err(anyhow::anyhow!(
                "PLAN_NORMALIZE_MODE must be 'lenient' or 'strict', got '{other}'"
            )),
        }
    }
}

/// Shape required in strict mode: every field present and typed.
#[derive(Debug, Deserialize)]
struct StrictPlan {
    summary: String,
    itinerary: Vec<StrictDay>,
    packing: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StrictDay {
    day: u32,
    plan: String,
}

/// Converts a raw completion into a plan.
pub fn normalize(raw: RawCompletion, mode: NormalizeMode) -> GeneratedPlan {
    match raw {
        RawCompletion::Structured(value) => decode_candidate(value, "", mode),
        RawCompletion::Text(text) => {
            let trimmed = text.trim();
            let candidate = match mode {
                NormalizeMode::Lenient => trimmed,
                NormalizeMode::Strict => strip_json_fences(trimmed),
            };
            match serde_json::from_str::<Value>(candidate) {
                Ok(value) => decode_candidate(value, trimmed, mode),
                Err(e) => {
                    debug!("Provider reply is not JSON ({e}); wrapping as text summary");
                    fallback_plan(trimmed)
                }
            }
        }
        RawCompletion::Empty => fallback_plan(""),
    }
}

/// Plain-text plan: the text itself as summary, or the placeholder when blank.
pub fn fallback_plan(text: &str) -> GeneratedPlan {
    let text = text.trim();
    if text.is_empty() {
        GeneratedPlan::summary_only(UNPARSEABLE_PLACEHOLDER)
    } else {
        GeneratedPlan::summary_only(text)
    }
}

fn decode_candidate(value: Value, raw_text: &str, mode: NormalizeMode) -> GeneratedPlan {
    match mode {
        NormalizeMode::Lenient => match value {
            Value::Object(fields) => {
                let plan = decode_lenient(fields);
                if plan.summary.is_empty() {
                    warn!(
                        "Accepted provider plan without a summary (extra keys: {:?})",
                        plan.extra.keys().collect::<Vec<_>>()
                    );
                }
                plan
            }
            _ => {
                warn!("Provider JSON is not an object; wrapping as text summary");
                fallback_plan(raw_text)
            }
        },
        NormalizeMode::Strict => match serde_json::from_value::<StrictPlan>(value) {
            Ok(plan) if is_well_formed(&plan) => GeneratedPlan {
                summary: plan.summary,
                itinerary: plan
                    .itinerary
                    .into_iter()
                    .map(|d| DayPlan::new(d.day, d.plan))
                    .collect(),
                packing: plan.packing,
                extra: Default::default(),
            },
            Ok(_) => {
                warn!("Provider plan rejected: empty summary or non-positive day");
                fallback_plan(raw_text)
            }
            Err(e) => {
                warn!("Provider plan rejected in strict mode: {e}");
                fallback_plan(raw_text)
            }
        },
    }
}

/// Field-by-field decode: null or mistyped fields take their defaults, the
/// rest of the object is kept.
fn decode_lenient(mut fields: Map<String, Value>) -> GeneratedPlan {
    let summary = match fields.remove("summary") {
        Some(Value::String(s)) => s,
        _ => String::new(),
    };

    let itinerary = match fields.remove("itinerary") {
        Some(Value::Array(days)) => days
            .into_iter()
            .filter_map(|day| match day {
                Value::Object(day) => Some(decode_lenient_day(day)),
                other => {
                    debug!("Skipping itinerary entry that is not an object: {other}");
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    };

    let packing = match fields.remove("packing") {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    GeneratedPlan {
        summary,
        itinerary,
        packing,
        extra: fields,
    }
}

fn decode_lenient_day(mut fields: Map<String, Value>) -> DayPlan {
    let day = match fields.remove("day") {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()).unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    };
    let plan = match fields.remove("plan") {
        Some(Value::String(s)) => s,
        _ => String::new(),
    };

    DayPlan {
        day,
        plan,
        extra: fields,
    }
}

fn is_well_formed(plan: &StrictPlan) -> bool {
    !plan.summary.trim().is_empty() && plan.itinerary.iter().all(|d| d.day >= 1)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
