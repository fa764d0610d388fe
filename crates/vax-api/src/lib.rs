//! # Vaccination Comparison API
//!
//! GraphQL and REST service over the observation store and the analytics
//! engine.
//!
//! ## Features
//!
//! - **Comparison Queries**: country totals, regional rankings, deaths
//!   comparison, time series and the full cross-country report
//! - **Upserts**: single and batch observation writes keyed by
//!   `(country, region, date)`
//! - **CSV Interchange**: upload through GraphQL or `POST /api/import`,
//!   download through `GET /api/export`
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Axum HTTP Server                         │
//! │      (GraphQL Endpoint + Playground, REST import/export)    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                async-graphql Schema                         │
//! │                 (QueryRoot, MutationRoot)                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ApiContext                               │
//! │        (AnalyticsEngine, CsvImporter, ObservationStore)     │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                   │
//!                    ▼                   ▼
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │   In-memory store       │   │          DuckDB              │
//! │  (no DATABASE_PATH)     │   │   (DATABASE_PATH set)        │
//! └─────────────────────────┘   └──────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod context;
pub mod error;
pub mod resolvers;
pub mod rest;
pub mod schema;

use async_graphql::{EmptySubscription, Schema};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    http::{HeaderValue, Method},
    response::{Html, IntoResponse},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::{Config, ConfigError};
pub use context::ApiContext;
pub use error::{ApiError, ApiResult};
pub use resolvers::{MutationRoot, QueryRoot};

/// GraphQL schema type
pub type ApiSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the GraphQL schema with context
#[must_use]
pub fn build_schema(ctx: ApiContext, config: &Config) -> ApiSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(ctx)
        .limit_depth(config.max_query_depth)
        .limit_complexity(config.max_query_complexity)
        .finish()
}

/// Application state for Axum handlers
#[derive(Clone)]
pub struct AppState {
    pub schema: ApiSchema,
    pub ctx: ApiContext,
}

/// GraphQL endpoint handler
pub async fn graphql_handler(
    State(state): State<AppState>,
    req: GraphQLRequest,
) -> GraphQLResponse {
    state.schema.execute(req.into_inner()).await.into()
}

/// GraphQL Playground HTML
pub async fn graphql_playground() -> impl IntoResponse {
    Html(async_graphql::http::playground_source(
        async_graphql::http::GraphQLPlaygroundConfig::new("/graphql"),
    ))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    "OK"
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    cors.allow_origin(AllowOrigin::list(allowed))
}

/// Build the Axum router
pub fn build_router(ctx: ApiContext, config: &Config) -> Router {
    let schema = build_schema(ctx.clone(), config);
    let state = AppState { schema, ctx };

    let graphql = if config.enable_playground {
        get(graphql_playground).post(graphql_handler)
    } else {
        post(graphql_handler)
    };

    Router::new()
        // GraphQL endpoint
        .route("/graphql", graphql)
        // File interchange
        .route("/api/export", get(rest::export_observations))
        .route("/api/import", post(rest::import_csv))
        // Health check
        .route("/health", get(health_check))
        .route("/", get(|| async { "Vaccination Comparison API" }))
        // State and middleware
        .with_state(state)
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use chrono::NaiveDate;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use vax_domain::{CountryId, Observation};
    use vax_persistence::InMemoryObservationStore;

    use super::*;

    fn seeded_context() -> ApiContext {
        let obs = |country: &str, region: Option<&str>, day: u32, v: u64, d: u64| {
            Observation::new(
                CountryId::parse(country).unwrap(),
                region,
                NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            )
            .with_counts(v, d, v * 2)
        };
        let store = InMemoryObservationStore::with_observations([
            obs("brasil", Some("Bahia"), 1, 1000, 10),
            obs("brasil", Some("São Paulo"), 1, 3000, 30),
            obs("brasil", Some("São Paulo"), 2, 4000, 40),
            obs("portugal", Some("Lisboa"), 1, 500, 10),
        ]);
        ApiContext::new(
            Arc::new(store),
            vec![
                CountryId::parse("brasil").unwrap(),
                CountryId::parse("portugal").unwrap(),
            ],
        )
    }

    async fn execute(ctx: ApiContext, query: &str) -> async_graphql::Response {
        build_schema(ctx, &Config::default()).execute(query).await
    }

    fn data(response: async_graphql::Response) -> Value {
        assert!(response.errors.is_empty(), "errors: {:?}", response.errors);
        response.data.into_json().unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_country_totals_defaults() {
        let value = data(execute(seeded_context(), "{ countryTotals { country vaccinated deaths } }").await);
        assert_eq!(
            value["countryTotals"],
            json!([
                {"country": "brasil", "vaccinated": 8000, "deaths": 80},
                {"country": "portugal", "vaccinated": 500, "deaths": 10},
            ])
        );
    }

    #[tokio::test]
    async fn test_region_ranking_and_summary() {
        let value = data(
            execute(
                seeded_context(),
                r#"{
                    regionRanking(country: "Brasil", topN: 1) { region vaccinated }
                    countrySummary(country: "brasil") { mortalityRate vaccinationRate topRegions { region } }
                }"#,
            )
            .await,
        );
        assert_eq!(value["regionRanking"], json!([{"region": "São Paulo", "vaccinated": 7000}]));
        assert_eq!(value["countrySummary"]["mortalityRate"], json!(1.0));
        assert_eq!(value["countrySummary"]["vaccinationRate"], json!(50.0));
        assert_eq!(value["countrySummary"]["topRegions"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_comparison_report() {
        let value = data(
            execute(
                seeded_context(),
                r#"{ comparisonReport(countries: ["portugal", "brasil"]) {
                    countries bestPerformer mortalityRates { country value }
                } }"#,
            )
            .await,
        );
        let report = &value["comparisonReport"];
        assert_eq!(report["bestPerformer"], json!("brasil"));
        assert_eq!(report["mortalityRates"][0], json!({"country": "portugal", "value": 2.0}));
    }

    #[tokio::test]
    async fn test_empty_comparison_is_invalid_argument() {
        let response = execute(
            seeded_context(),
            "{ comparisonReport(countries: []) { bestPerformer } }",
        )
        .await;
        assert_eq!(response.errors.len(), 1);
        let ext = response.errors[0].extensions.as_ref().unwrap();
        assert_eq!(ext.get("code"), Some(&async_graphql::Value::from("INVALID_ARGUMENT")));
    }

    #[tokio::test]
    async fn test_time_series_and_observations() {
        let value = data(
            execute(
                seeded_context(),
                r#"{
                    timeSeries(country: "brasil", from: "2024-03-02") { date vaccinated }
                    observations(filter: { country: "brasil" }, limit: 2) { region date }
                }"#,
            )
            .await,
        );
        assert_eq!(value["timeSeries"], json!([{"date": "2024-03-02", "vaccinated": 4000}]));
        assert_eq!(value["observations"].as_array().unwrap().len(), 2);
        assert_eq!(value["observations"][0]["date"], json!("2024-03-02"));
    }

    #[tokio::test]
    async fn test_upsert_mutations() {
        let ctx = seeded_context();
        let value = data(
            execute(
                ctx.clone(),
                r#"mutation {
                    first: upsertObservation(input: { country: "Italia", region: "Roma", date: "2024-03-01", vaccinated: 10 }) { outcome }
                    second: upsertObservation(input: { country: "italia", region: "Roma", date: "2024-03-01", vaccinated: 20 }) { outcome observation { vaccinated } }
                    upsertObservations(inputs: [
                        { country: "italia", date: "2024-03-01", vaccinated: 5 },
                        { country: "italia", region: "N/A", date: "2024-03-01", vaccinated: 6 }
                    ]) { written }
                }"#,
            )
            .await,
        );
        assert_eq!(value["first"]["outcome"], json!("INSERTED"));
        assert_eq!(value["second"]["outcome"], json!("REPLACED"));
        assert_eq!(value["upsertObservations"]["written"], json!(2));

        let value = data(execute(ctx, r#"{ countryTotals(countries: ["italia"]) { vaccinated } }"#).await);
        assert_eq!(value["countryTotals"][0]["vaccinated"], json!(26));
    }

    #[tokio::test]
    async fn test_import_csv_mutation() {
        let value = data(
            execute(
                seeded_context(),
                r#"mutation {
                    importCsv(country: "usa", content: "date,state,vaccinated,deaths,population\n2024-03-01,Texas,5,1,10\nbad,Texas,1,1,1\n") {
                        importedCount errorsCount errors
                    }
                }"#,
            )
            .await,
        );
        let summary = &value["importCsv"];
        assert_eq!(summary["importedCount"], json!(1));
        assert_eq!(summary["errorsCount"], json!(1));
        assert!(summary["errors"][0].as_str().unwrap().starts_with("line 3:"));
    }

    #[tokio::test]
    async fn test_health_route() {
        let app = build_router(seeded_context(), &Config::default());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_graphql_route() {
        let app = build_router(seeded_context(), &Config::default());
        let request = Request::builder()
            .method("POST")
            .uri("/graphql")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"query": "{ countries }"}).to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        assert_eq!(value["data"]["countries"], json!(["brasil", "portugal"]));
    }

    #[tokio::test]
    async fn test_export_route() {
        let app = build_router(seeded_context(), &Config::default());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/export?country=portugal&format=csv")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"vaccination_data_"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(
            text,
            "country,region_or_state,date,vaccinated,deaths,population\n\
             portugal,Lisboa,2024-03-01,500,10,1000\n"
        );
    }

    #[tokio::test]
    async fn test_export_unknown_format() {
        let app = build_router(seeded_context(), &Config::default());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/export?format=xlsx")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], json!("EXPORT_ERROR"));
    }

    #[tokio::test]
    async fn test_import_route() {
        let ctx = seeded_context();
        let app = build_router(ctx.clone(), &Config::default());
        let request = Request::builder()
            .method("POST")
            .uri("/api/import?country=Italia")
            .header(header::CONTENT_TYPE, "text/csv")
            .body(Body::from("date,region_or_state,vaccinated,deaths,population\n2024-03-05,Roma,7,0,9\n"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        assert_eq!(value["country"], json!("italia"));
        assert_eq!(value["imported_count"], json!(1));

        let countries = ctx.store.countries().await.unwrap();
        assert_eq!(countries.len(), 3);
    }
}
