use axum::extract::{Path, Query, State};
use axum::Json;
use contracts::{DecisionAck, DecisionRequest, GameState, OutcomeReport, StartGameRequest};
use serde::Deserialize;

use crate::server::error::HttpApiError;
use crate::server::state::AppState;

const DECISION_RECORDED: &str = "Decision recorded successfully";

#[derive(Debug, Deserialize)]
pub(crate) struct CalculateOutcomeQuery {
    pub(crate) session_id: String,
    pub(crate) scenario_id: String,
}

pub(crate) async fn start_game(
    State(state): State<AppState>,
    Json(request): Json<StartGameRequest>,
) -> Result<Json<GameState>, HttpApiError> {
    let mut api = state.api.lock().await;
    let game_state = api.start_session(&request.session_id)?;
    Ok(Json(game_state))
}

pub(crate) async fn get_game_state(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<GameState>, HttpApiError> {
    let api = state.api.lock().await;
    Ok(Json(api.get_session(&session_id)?))
}

/// Unknown characters still get a 200; `applied` reports whether anything changed.
pub(crate) async fn make_decision(
    State(state): State<AppState>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<DecisionAck>, HttpApiError> {
    let mut api = state.api.lock().await;
    let effect = api.record_decision(&request.session_id, &request.decision)?;

    Ok(Json(DecisionAck {
        message: DECISION_RECORDED.to_string(),
        applied: effect.is_applied(),
    }))
}

pub(crate) async fn calculate_outcome(
    State(state): State<AppState>,
    Query(query): Query<CalculateOutcomeQuery>,
) -> Result<Json<OutcomeReport>, HttpApiError> {
    let api = state.api.lock().await;
    let report = api.calculate_outcome(&query.session_id, &query.scenario_id)?;
    Ok(Json(report))
}
