//! Itinerary generation: orchestrates a single plan request.
//!
//! Flow: load trip (owner-scoped) → build prompt → provider call →
//!       normalize → replace `ai_plan` → return plan + trip.
//!
//! The store is only written after the provider call succeeds, so a failed
//! generation leaves any previous plan in place.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::TextGenerator;
use crate::models::plan::GeneratedPlan;
use crate::models::trip::Trip;
use crate::planner::normalizer::{normalize, NormalizeMode};
use crate::planner::prompts::build_trip_prompt;
use crate::trips::store::TripStore;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanOutcome {
    pub plan: GeneratedPlan,
    pub trip: Trip,
}

#[derive(Clone)]
pub struct ItineraryService {
    store: Arc<dyn TripStore>,
    generator: Arc<dyn TextGenerator>,
    mode: NormalizeMode,
}

impl ItineraryService {
    pub fn new(
        store: Arc<dyn TripStore>,
        generator: Arc<dyn TextGenerator>,
        mode: NormalizeMode,
    ) -> Self {
        Self {
            store,
            generator,
            mode,
        }
    }

    /// Generates a plan for `trip_id` on behalf of `caller_id` and stores it on the trip.
    ///
    /// Errors:
    /// - `NotFound` when the trip is missing or owned by someone else (no provider call).
    /// - `GenerationFailed` when the provider call fails (trip untouched).
    pub async fn generate_plan(
        &self,
        trip_id: Uuid,
        caller_id: Uuid,
        custom_instruction: Option<&str>,
    ) -> Result<PlanOutcome, AppError> {
        let trip = self
            .store
            .get(trip_id, caller_id)
            .await?
            .ok_or_else(AppError::trip_not_found)?;

        let prompt = build_trip_prompt(&trip, custom_instruction);

        info!("Requesting itinerary for trip {trip_id}");
        let raw = self
            .generator
            .complete(&prompt)
            .await
            .map_err(|e| AppError::GenerationFailed(e.to_string()))?;

        let plan = normalize(raw, self.mode);

        // The trip can vanish between load and write (concurrent delete).
        let trip = self
            .store
            .apply_plan(trip_id, caller_id, &plan)
            .await?
            .ok_or_else(|| {
                warn!("Trip {trip_id} disappeared before its plan was stored");
                AppError::trip_not_found()
            })?;

        info!(
            "Stored plan for trip {} ({} days, {} packing items)",
            trip_id,
            plan.itinerary.len(),
            plan.packing.len()
        );

        Ok(PlanOutcome { plan, trip })
    }
}
