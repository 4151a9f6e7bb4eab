use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::http::server::AppState;
use crate::security::token::unix_now;
use crate::security::Claims;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub mode: &'static str,
    pub users: usize,
    pub rate_limit: Option<LimiterStatus>,
}

#[derive(Serialize)]
pub struct LimiterStatus {
    pub api_clients: usize,
    pub login_clients: usize,
}

#[derive(Serialize)]
pub struct ReportSummary {
    pub report: &'static str,
    pub generated_for: String,
    pub generated_at: u64,
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        mode: if state.mode.is_production() {
            "production"
        } else {
            "development"
        },
        users: state.users.len(),
        rate_limit: state.limiters.as_ref().map(|l| LimiterStatus {
            api_clients: l.api.len(),
            login_clients: l.login.len(),
        }),
    })
}

pub async fn get_report_summary(Extension(claims): Extension<Claims>) -> Json<ReportSummary> {
    Json(ReportSummary {
        report: "summary",
        generated_for: claims.name,
        generated_at: unix_now(),
    })
}
