use crate::config::{self, SolverConfig};
use crate::data::{OutputTimetable, RuleSet, TimetableInput, TimingConfig};
use crate::solver;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::Serialize;

/// Defaults a client can use to prefill its forms.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Defaults {
    pub timing: TimingConfig,
    pub working_days: usize,
    pub rules: RuleSet,
    pub options: SolverConfig,
}

async fn generate_handler(
    Json(input): Json<TimetableInput>,
) -> Result<Json<OutputTimetable>, (StatusCode, String)> {
    // the search is CPU bound; keep it off the async workers
    let outcome = tokio::task::spawn_blocking(move || solver::solve(&input))
        .await
        .map_err(|e| {
            error!("Timetable generation task failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Timetable generation failed".to_string(),
            )
        })?;

    match outcome {
        Ok(output) => Ok(Json(output)),
        Err(e) => Err((StatusCode::BAD_REQUEST, e)),
    }
}

async fn defaults_handler() -> Json<Defaults> {
    Json(Defaults {
        timing: TimingConfig::default(),
        working_days: 5,
        rules: RuleSet::default(),
        options: SolverConfig::default(),
    })
}

pub fn router() -> Router {
    Router::new()
        .route("/v1/timetable/generate", post(generate_handler))
        .route("/v1/timetable/defaults", get(defaults_handler))
}

pub async fn run_server() -> Result<(), String> {
    let addr = config::bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("failed to bind {addr}: {e}"))?;

    info!("Server running at http://{addr}");

    axum::serve(listener, router())
        .await
        .map_err(|e| format!("server error: {e}"))
}
