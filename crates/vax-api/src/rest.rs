//! # REST Handlers
//!
//! File-oriented endpoints: CSV upload and attachment download.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use vax_domain::{CountryId, ObservationFilter};
use vax_interchange::{export_file_name, ExportFormat, ImportSummary};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Query parameters of `GET /api/export`
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub country: Option<String>,
    pub format: Option<String>,
}

/// Query parameters of `POST /api/import`
#[derive(Debug, Deserialize)]
pub struct ImportParams {
    pub country: String,
}

/// Download observations as an attachment, optionally for one country.
pub async fn export_observations(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> ApiResult<Response> {
    let format = params
        .format
        .as_deref()
        .map_or(Ok(ExportFormat::default()), str::parse)?;

    let filter = match params.country.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(country) => ObservationFilter::for_country(CountryId::parse(country)?),
        None => ObservationFilter::all(),
    };

    let rows = state.ctx.store.filter(&filter).await?;
    let exporter = format.exporter();
    let body = exporter.export(&rows)?;
    let file_name = export_file_name(format, Utc::now().naive_utc());

    tracing::info!(rows = rows.len(), %format, file = %file_name, "Exported observations");

    Ok((
        [
            (header::CONTENT_TYPE, exporter.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response())
}

/// Import the CSV request body under `country`.
pub async fn import_csv(
    State(state): State<AppState>,
    Query(params): Query<ImportParams>,
    body: String,
) -> ApiResult<Json<ImportSummary>> {
    let country = CountryId::parse(&params.country)?;
    if body.trim().is_empty() {
        return Err(ApiError::InvalidInput("request body is empty".to_string()));
    }

    let summary = state.ctx.importer.import(&country, body.as_bytes()).await?;
    Ok(Json(summary))
}
