//! Prompt construction for itinerary generation.

use serde_json::Value;

use crate::models::trip::Trip;

/// Opening instructions. The provider is asked for JSON only; the normalizer
/// still copes when it ignores that.
pub const PLANNER_PREAMBLE: &str = "You are an expert AI travel planner. \
    Create a detailed, personalized itinerary for this trip. \
    You MUST respond with strictly valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// The exact target shape, shown to the model by example.
pub const PLAN_SHAPE_EXAMPLE: &str = r#"{
  "summary": "Short summary",
  "itinerary": [
    {"day": 1, "plan": "Day plan"},
    {"day": 2, "plan": "Day plan"}
  ],
  "packing": ["item1", "item2"]
}"#;

/// Renders a trip and an optional free-text instruction into a single prompt.
///
/// Pure and total: missing destination fields render as empty strings.
pub fn build_trip_prompt(trip: &Trip, custom_instruction: Option<&str>) -> String {
    let destination = trip.first_destination();
    let name = destination
        .and_then(|d| d.name.as_deref())
        .unwrap_or_default();
    let start = destination
        .and_then(|d| d.start_date)
        .map(|d| d.to_string())
        .unwrap_or_default();
    let end = destination
        .and_then(|d| d.end_date)
        .map(|d| d.to_string())
        .unwrap_or_default();
    let budget = trip.budget.map(|b| b.to_string()).unwrap_or_default();
    let pace = preference_text(trip.preference("pace"));
    let style = preference_text(trip.preference("type"));

    let mut prompt = format!(
        "{PLANNER_PREAMBLE}\n\n\
         Trip details:\n\
         - Title: {title}\n\
         - Destination: {name}\n\
         - Dates: {start} to {end}\n\
         - Budget: {budget}\n\
         - Travel Style: {pace}, {style}\n\n\
         Return your response in this exact format:\n\
         {PLAN_SHAPE_EXAMPLE}\n",
        title = trip.title,
    );

    if let Some(instruction) = custom_instruction.filter(|s| !s.trim().is_empty()) {
        prompt.push_str("\nAdditional instructions from the traveller:\n");
        prompt.push_str(instruction);
        prompt.push('\n');
    }

    prompt
}

/// Strings render bare, anything else as JSON text, absent as empty.
fn preference_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
