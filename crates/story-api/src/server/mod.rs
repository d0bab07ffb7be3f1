use std::net::SocketAddr;

use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::{ServerConfig, StoryApi};

mod error;
mod routes;
mod state;
mod util;

pub use error::ServerError;

use state::AppState;

pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let api = config.open_api()?;
    let listener = TcpListener::bind(config.bind_addr).await?;
    serve_listener(listener, api).await
}

/// Serves on an already-bound listener; binding port 0 gives an ephemeral port.
pub async fn serve_listener(listener: TcpListener, api: StoryApi) -> Result<(), ServerError> {
    let local_addr: SocketAddr = listener.local_addr()?;
    info!(
        addr = %local_addr,
        store = api.store_backend(),
        "serving story api"
    );

    axum::serve(listener, router(api)).await?;
    Ok(())
}

pub fn router(api: StoryApi) -> Router {
    let state = AppState::new(api);

    Router::new()
        .route("/api/", get(routes::catalog::root))
        .route("/api/insurance-options", get(routes::catalog::list_insurance_options))
        .route("/api/characters", get(routes::catalog::list_characters))
        .route("/api/scenarios", get(routes::catalog::list_scenarios))
        .route(
            "/api/scenarios/random/{count}",
            get(routes::catalog::random_scenarios),
        )
        .route("/api/stats/comparison", get(routes::catalog::plan_comparison))
        .route("/api/game/start", post(routes::game::start_game))
        .route("/api/game/decision", post(routes::game::make_decision))
        .route(
            "/api/game/calculate-outcome",
            post(routes::game::calculate_outcome),
        )
        .route("/api/game/{session_id}", get(routes::game::get_game_state))
        .layer(middleware::from_fn(trace_middleware))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        util::apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    util::apply_cors_headers(response.headers_mut());
    response
}

async fn trace_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = std::time::Instant::now();

    let response = next.run(request).await;
    info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = elapsed_millis(started),
        "request"
    );
    response
}

fn elapsed_millis(started: std::time::Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
