use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::plan::GeneratedPlan;

/// One stop of a trip. Only the first destination feeds the generation prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "optional_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Accepts `null`, `""`, `YYYY-MM-DD` or an RFC 3339 timestamp (date part kept).
fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<String>::deserialize(deserializer)? {
        Some(raw) => raw,
        None => return Ok(None),
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map(Some)
        .map_err(|_| serde::de::Error::custom(format!("invalid date '{raw}'")))
}

/// Raw `trips` row. JSONB columns come back as `Value` and are decoded into
/// `Trip` by `TryFrom`.
#[derive(Debug, Clone, FromRow)]
pub struct TripRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub destinations: Value,
    pub preferences: Value,
    pub budget: Option<f64>,
    pub days: Option<i32>,
    pub ai_plan: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub owner_id: Uuid,
    pub title: String,
    pub destinations: Vec<Destination>,
    /// Free-form; `pace` and `type` are the keys the prompt reads.
    pub preferences: Map<String, Value>,
    pub budget: Option<f64>,
    pub days: Option<i32>,
    pub ai_plan: Option<GeneratedPlan>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    pub fn first_destination(&self) -> Option<&Destination> {
        self.destinations.first()
    }

    pub fn preference(&self, key: &str) -> Option<&Value> {
        self.preferences.get(key)
    }
}

impl TryFrom<TripRow> for Trip {
    type Error = anyhow::Error;

    fn try_from(row: TripRow) -> Result<Self, Self::Error> {
        let destinations = match row.destinations {
            Value::Null => Vec::new(),
            value => serde_json::from_value(value)
                .with_context(|| format!("trip {} has malformed destinations", row.id))?,
        };
        let preferences = match row.preferences {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let ai_plan = row
            .ai_plan
            .filter(|v| !v.is_null())
            .map(serde_json::from_value)
            .transpose()
            .with_context(|| format!("trip {} has malformed ai_plan", row.id))?;

        Ok(Trip {
            id: row.id,
            owner_id: row.user_id,
            title: row.title,
            destinations,
            preferences,
            budget: row.budget,
            days: row.days,
            ai_plan,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Request body for `POST /api/trips`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrip {
    pub title: String,
    #[serde(default)]
    pub destinations: Vec<Destination>,
    #[serde(default)]
    pub preferences: Map<String, Value>,
    pub budget: Option<f64>,
    pub days: Option<i32>,
}

/// Request body for `PUT /api/trips/:id`. Absent fields are left untouched;
/// `budget` and `days` can be cleared with an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripPatch {
    pub title: Option<String>,
    pub destinations: Option<Vec<Destination>>,
    pub preferences: Option<Map<String, Value>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub budget: Option<Option<f64>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub days: Option<Option<i32>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(destinations: Value, ai_plan: Option<Value>) -> TripRow {
        TripRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Goa Trip".to_string(),
            destinations,
            preferences: json!({"pace": "relaxed", "type": "beach"}),
            budget: Some(20000.0),
            days: None,
            ai_plan,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_decodes_destinations_and_preferences() {
        let trip = Trip::try_from(row(
            json!([{"name": "Goa", "startDate": "2025-01-01", "endDate": "2025-01-05"}]),
            None,
        ))
        .unwrap();

        let first = trip.first_destination().unwrap();
        assert_eq!(first.name.as_deref(), Some("Goa"));
        assert_eq!(first.start_date, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(trip.preference("pace"), Some(&json!("relaxed")));
        assert!(trip.ai_plan.is_none());
    }

    #[test]
    fn test_null_ai_plan_is_none() {
        let trip = Trip::try_from(row(json!([]), Some(Value::Null))).unwrap();
        assert!(trip.ai_plan.is_none());
    }

    #[test]
    fn test_malformed_destinations_is_an_error() {
        assert!(Trip::try_from(row(json!("Goa"), None)).is_err());
    }

    #[test]
    fn test_trip_serializes_with_wire_names() {
        let trip = Trip::try_from(row(json!([]), None)).unwrap();
        let value = serde_json::to_value(&trip).unwrap();
        assert!(value.get("userId").is_some());
        assert!(value.get("aiPlan").is_some());
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn test_blank_dates_decode_as_none() {
        let trip: NewTrip = serde_json::from_value(json!({
            "title": "Goa Trip",
            "destinations": [{"name": "Goa", "startDate": "", "endDate": "  "}]
        }))
        .unwrap();
        assert_eq!(trip.destinations[0].start_date, None);
        assert_eq!(trip.destinations[0].end_date, None);
    }

    #[test]
    fn test_timestamp_dates_keep_the_day() {
        let destination: Destination = serde_json::from_value(json!({
            "name": "Goa",
            "startDate": "2025-01-01T00:00:00.000Z",
            "endDate": null
        }))
        .unwrap();
        assert_eq!(destination.start_date, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(destination.end_date, None);
    }

    #[test]
    fn test_garbage_date_rejected() {
        let result = serde_json::from_value::<Destination>(json!({"startDate": "soon"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_explicit_null_clears() {
        let patch: TripPatch = serde_json::from_value(json!({"budget": null})).unwrap();
        assert_eq!(patch.budget, Some(None));
        assert_eq!(patch.days, None);

        let patch: TripPatch = serde_json::from_value(json!({"days": 4})).unwrap();
        assert_eq!(patch.days, Some(Some(4)));
        assert_eq!(patch.budget, None);
    }

    #[test]
    fn test_patch_leaves_absent_fields_none() {
        let patch: TripPatch = serde_json::from_value(json!({"title": "New"})).unwrap();
        assert_eq!(patch.title.as_deref(), Some("New"));
        assert!(patch.destinations.is_none());
        assert!(patch.budget.is_none());
    }
}
