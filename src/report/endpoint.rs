//! Route handlers for generating expense reports as JSON or PDF.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    AppState, Error, User, UserID,
    db::lock_connection,
    expense::{get_expenses_in_window, normalize_date},
    report::{Report, ReportPeriod, build_report, render_pdf},
};

/// The state needed for generating reports.
#[derive(Debug, Clone)]
pub struct ReportState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for a report request.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// "weekly" or "monthly", anything else is treated as "monthly".
    pub period: Option<String>,
}

/// Generate the report for the window of `period` ending at `now`.
pub fn generate_report(
    owner: UserID,
    period: ReportPeriod,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Report, Error> {
    let now = normalize_date(now);
    let window = period.window(now);
    let expenses = get_expenses_in_window(owner, window.start, window.end, connection)?;

    Ok(build_report(&expenses, period, window, now))
}

fn report_for_request(
    state: &ReportState,
    user: &User,
    query: &ReportQuery,
) -> Result<Report, Error> {
    let period = ReportPeriod::parse_lenient(query.period.as_deref());
    let connection = lock_connection(&state.db_connection)?;

    generate_report(user.id, period, OffsetDateTime::now_utc(), &connection)
}

/// Get the caller's report as JSON.
pub async fn get_report_endpoint(
    State(state): State<ReportState>,
    Extension(user): Extension<User>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Report>, Error> {
    report_for_request(&state, &user, &query).map(Json)
}

/// Get the caller's report as a downloadable PDF file.
pub async fn get_report_pdf_endpoint(
    State(state): State<ReportState>,
    Extension(user): Extension<User>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, Error> {
    let report = report_for_request(&state, &user, &query)?;
    let pdf = render_pdf(&report);

    tracing::debug!(
        "rendered {} report for user {} ({} bytes)",
        report.period.as_str(),
        user.id,
        pdf.len()
    );

    let disposition = format!(
        "attachment; filename=expense_report_{}.pdf",
        report.period.as_str()
    );

    Ok((
        [
            (CONTENT_TYPE, "application/pdf".to_owned()),
            (CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}
