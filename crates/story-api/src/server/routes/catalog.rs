use axum::extract::{Path, State};
use axum::Json;
use contracts::{Character, InsuranceOption, PlanComparison, Scenario, API_MESSAGE};
use serde::Serialize;
use story_core::compare_plans;

use crate::server::error::HttpApiError;
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    message: &'static str,
}

pub(crate) async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: API_MESSAGE,
    })
}

pub(crate) async fn list_insurance_options(
    State(state): State<AppState>,
) -> Json<Vec<InsuranceOption>> {
    Json(state.catalog.insurance_options().to_vec())
}

pub(crate) async fn list_characters(State(state): State<AppState>) -> Json<Vec<Character>> {
    Json(state.catalog.characters().to_vec())
}

pub(crate) async fn list_scenarios(State(state): State<AppState>) -> Json<Vec<Scenario>> {
    Json(state.catalog.scenarios().to_vec())
}

pub(crate) async fn random_scenarios(
    State(state): State<AppState>,
    Path(count): Path<i64>,
) -> Json<Vec<Scenario>> {
    Json(state.catalog.pick_random_scenarios(count))
}

pub(crate) async fn plan_comparison(
    State(state): State<AppState>,
) -> Result<Json<PlanComparison>, HttpApiError> {
    compare_plans(&state.catalog)
        .map(Json)
        .ok_or_else(|| HttpApiError::not_found("catalog lacks a basic or an enhanced plan"))
}
