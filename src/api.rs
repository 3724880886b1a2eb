//! # API Server Module
//!
//! ## Purpose
//! REST API server translating HTTP verbs, paths, and query strings into report
//! store calls and serializing the results to JSON. Wire shapes are kept
//! compatible with the existing game clients.
//!
//! ## Input/Output Specification
//! - **Input**: HTTP requests with sighting payloads and search filters
//! - **Output**: JSON responses with ranked matches, live dumps, statistics
//! - **Endpoints**: report, search, reports, stats, clear, landing page
//!
//! ## Key Features
//! - Boundary validation: malformed input is rejected with a 400 before the
//!   store is touched; `value` is accepted as a JSON number or a numeric string
//!   and rejected when non-finite
//! - Zero-match searches are a normal 200 response with `found: false`
//! - Permissive CORS so game clients can call from foreign origins
//! - Any unexpected failure maps to a generic 500; detail stays in the server log

use crate::errors::{Result, ScoutError};
use crate::store::{NewReport, DEFAULT_PLAYER_NAME};
use crate::AppState;
use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use serde::Deserialize;
use serde_json::json;

/// The HTTP server wrapping the shared application state
pub struct ApiServer {
    app_state: AppState,
}

/// Sighting report payload.
///
/// Required fields are `Option` so their absence surfaces as a structured 400
/// instead of a deserialization failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub job_id: Option<String>,
    pub pet_name: Option<String>,
    pub value: Option<serde_json::Value>,
    pub player_name: Option<String>,
    /// Sent by some clients; ignored — the store stamps its own clock
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
}

impl ReportRequest {
    /// Boundary validation: required fields present and non-empty, value finite
    fn into_new_report(self) -> Result<NewReport> {
        let job_id = match self.job_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => return Err(ScoutError::validation("jobId", "required")),
        };
        let pet_name = match self.pet_name {
            Some(name) if !name.trim().is_empty() => name,
            _ => return Err(ScoutError::validation("petName", "required")),
        };
        let value = self
            .value
            .as_ref()
            .and_then(parse_number)
            .ok_or_else(|| ScoutError::validation("value", "must be a finite number"))?;
        let player_name = self
            .player_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PLAYER_NAME.to_string());

        Ok(NewReport {
            job_id,
            pet_name,
            value,
            player_name,
        })
    }
}

/// Search filter query string
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub pet: Option<String>,
    pub min_value: Option<String>,
}

/// Accept a JSON number or a numeric string; reject NaN and infinities
fn parse_number(raw: &serde_json::Value) -> Option<f64> {
    let parsed = match raw {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

impl ApiServer {
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }

    /// Run the API server until the process shuts down
    pub async fn run(self) -> Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.app_state.config.server.host, self.app_state.config.server.port
        );
        let enable_cors = self.app_state.config.server.enable_cors;
        let app_state = self.app_state;

        tracing::info!("Starting API server on {}", bind_addr);

        HttpServer::new(move || {
            let cors = if enable_cors {
                Cors::permissive()
            } else {
                Cors::default()
            };
            App::new()
                .wrap(cors)
                .app_data(web::Data::new(app_state.clone()))
                .route("/", web::get().to(index_handler))
                .route("/api/report", web::post().to(report_handler))
                .route("/api/search", web::get().to(search_handler))
                .route("/api/reports", web::get().to(reports_handler))
                .route("/api/stats", web::get().to(stats_handler))
                .route("/api/clear", web::delete().to(clear_handler))
        })
        .bind(&bind_addr)
        .map_err(|e| ScoutError::Internal {
            message: format!("Failed to bind server to {}: {}", bind_addr, e),
        })?
        .run()
        .await
        .map_err(|e| ScoutError::Internal {
            message: format!("Server error: {}", e),
        })?;

        Ok(())
    }
}

/// Landing page: liveness signal plus a map of the endpoints
async fn index_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let stats = app_state.store.stats().await;

    Ok(HttpResponse::Ok().json(json!({
        "status": "online",
        "message": "pet-scout sighting board is running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "report": "POST /api/report",
            "search": "GET /api/search?pet=NAME&minValue=VALUE",
            "reports": "GET /api/reports",
            "stats": "GET /api/stats",
        },
        "stats": {
            "totalReports": stats.total_reports,
            "totalSearches": stats.total_searches,
            "uptime": stats.uptime,
        },
    })))
}

/// Record one sighting
async fn report_handler(
    app_state: web::Data<AppState>,
    request: web::Json<ReportRequest>,
) -> ActixResult<HttpResponse> {
    let new_report = match request.into_inner().into_new_report() {
        Ok(report) => report,
        Err(e) => {
            tracing::debug!("rejected report: {}", e);
            return Ok(HttpResponse::BadRequest().json(json!({
                "success": false,
                "error": e.to_string(),
            })));
        }
    };

    let total_reports = app_state.store.insert(new_report).await;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "totalReports": total_reports,
    })))
}

/// Find the best currently-known server instances for a pet filter
async fn search_handler(
    app_state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> ActixResult<HttpResponse> {
    let pet = match params.pet.as_deref().map(str::trim) {
        Some(pet) if !pet.is_empty() => pet.to_string(),
        _ => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "found": false,
                "error": "Missing required parameter 'pet'. Example: /api/search?pet=Huge&minValue=1000000",
            })));
        }
    };

    // permissive by design: absent or garbage thresholds fall back to 0
    let min_value = params
        .min_value
        .as_deref()
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0);

    let outcome = app_state.store.search(&pet, min_value).await;

    if !outcome.found() {
        return Ok(HttpResponse::Ok().json(json!({
            "found": false,
            "message": format!(
                "No live sightings of \"{}\" at or above value {}",
                pet, min_value
            ),
            "totalReportsChecked": outcome.reports_checked,
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "found": true,
        "totalMatches": outcome.total_matches,
        "bestServer": outcome.hits[0],
        "results": outcome.hits,
    })))
}

/// Full dump of the live set
async fn reports_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let reports = app_state.store.list_live().await;

    Ok(HttpResponse::Ok().json(json!({
        "totalReports": reports.len(),
        "reports": reports,
    })))
}

/// Aggregate statistics over the live set
async fn stats_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let stats = app_state.store.stats().await;
    Ok(HttpResponse::Ok().json(stats))
}

/// Unconditionally empty the board. Ungated, which is a known hardening gap,
/// so every invocation is surfaced in the log.
async fn clear_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let removed = app_state.store.clear_all().await;
    tracing::warn!("clear-all requested, removed {} reports", removed);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "reportsDeleted": removed,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ReportStore;
    use crate::Config;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use std::sync::Arc;

    fn test_state() -> AppState {
        AppState {
            config: Arc::new(Config::default()),
            store: Arc::new(ReportStore::new()),
        }
    }

    // the initialized service type is unnameable, so the setup lives in a macro
    macro_rules! test_app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .route("/", web::get().to(index_handler))
                    .route("/api/report", web::post().to(report_handler))
                    .route("/api/search", web::get().to(search_handler))
                    .route("/api/reports", web::get().to(reports_handler))
                    .route("/api/stats", web::get().to(stats_handler))
                    .route("/api/clear", web::delete().to(clear_handler)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn report_missing_job_id_is_a_400() {
        let app = test_app!(test_state());

        let req = test::TestRequest::post()
            .uri("/api/report")
            .set_json(json!({"petName": "X", "value": 5}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].as_str().unwrap().contains("jobId"));
    }

    #[actix_web::test]
    async fn report_rejects_non_numeric_value() {
        let app = test_app!(test_state());

        let req = test::TestRequest::post()
            .uri("/api/report")
            .set_json(json!({"jobId": "srv-1", "petName": "Cat", "value": "garbage"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn report_accepts_numeric_string_value_and_defaults_player() {
        let state = test_state();
        let app = test_app!(state.clone());

        let req = test::TestRequest::post()
            .uri("/api/report")
            .set_json(json!({"jobId": "srv-1", "petName": "Cat", "value": "123.5"}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["totalReports"], json!(1));

        let live = state.store.list_live().await;
        assert_eq!(live[0].report.value, 123.5);
        assert_eq!(live[0].report.player_name, DEFAULT_PLAYER_NAME);
    }

    #[actix_web::test]
    async fn report_then_search_round_trips_on_the_wire() {
        let app = test_app!(test_state());

        let req = test::TestRequest::post()
            .uri("/api/report")
            .set_json(json!({
                "jobId": "srv-best",
                "petName": "Giant Cat",
                "value": 1500000,
                "playerName": "scout",
            }))
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());

        let req = test::TestRequest::get()
            .uri("/api/search?pet=cat&minValue=1000")
            .to_request();
        let body: serde_json::Value =
            test::read_body_json(test::call_service(&app, req).await).await;

        assert_eq!(body["found"], json!(true));
        assert_eq!(body["totalMatches"], json!(1));
        assert_eq!(body["bestServer"]["jobId"], json!("srv-best"));
        assert_eq!(body["results"][0]["petName"], json!("Giant Cat"));
        assert_eq!(body["results"][0]["minutesAgo"], json!(0));
        assert!(body["results"][0]["timestamp"].is_i64());
    }

    #[actix_web::test]
    async fn search_without_pet_is_a_400() {
        let app = test_app!(test_state());

        let req = test::TestRequest::get().uri("/api/search").to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["found"], json!(false));
    }

    #[actix_web::test]
    async fn zero_match_search_is_a_normal_200() {
        let state = test_state();
        state
            .store
            .insert(NewReport {
                job_id: "srv-1".to_string(),
                pet_name: "Dog".to_string(),
                value: 5.0,
                player_name: DEFAULT_PLAYER_NAME.to_string(),
            })
            .await;
        let app = test_app!(state);

        let req = test::TestRequest::get()
            .uri("/api/search?pet=dragon")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["found"], json!(false));
        assert!(body.get("results").is_none());
        assert_eq!(body["totalReportsChecked"], json!(1));
        assert!(body["message"].as_str().unwrap().contains("dragon"));
    }

    #[actix_web::test]
    async fn garbage_min_value_defaults_to_zero() {
        let state = test_state();
        state
            .store
            .insert(NewReport {
                job_id: "srv-1".to_string(),
                pet_name: "Cat".to_string(),
                value: 5.0,
                player_name: DEFAULT_PLAYER_NAME.to_string(),
            })
            .await;
        let app = test_app!(state);

        let req = test::TestRequest::get()
            .uri("/api/search?pet=cat&minValue=notanumber")
            .to_request();
        let body: serde_json::Value =
            test::read_body_json(test::call_service(&app, req).await).await;

        assert_eq!(body["found"], json!(true));
    }

    #[actix_web::test]
    async fn reports_endpoint_dumps_the_live_set() {
        let state = test_state();
        state
            .store
            .insert(NewReport {
                job_id: "srv-1".to_string(),
                pet_name: "Cat".to_string(),
                value: 5.0,
                player_name: "alice".to_string(),
            })
            .await;
        let app = test_app!(state);

        let req = test::TestRequest::get().uri("/api/reports").to_request();
        let body: serde_json::Value =
            test::read_body_json(test::call_service(&app, req).await).await;

        assert_eq!(body["totalReports"], json!(1));
        assert_eq!(body["reports"][0]["playerName"], json!("alice"));
        assert!(body["reports"][0]["minutesAgo"].is_i64());
        assert!(body["reports"][0]["expiresInMinutes"].is_i64());
    }

    #[actix_web::test]
    async fn stats_endpoint_exposes_flat_aggregates() {
        let state = test_state();
        state
            .store
            .insert(NewReport {
                job_id: "srv-1".to_string(),
                pet_name: "Cat".to_string(),
                value: 10.0,
                player_name: "alice".to_string(),
            })
            .await;
        let app = test_app!(state);

        let req = test::TestRequest::get().uri("/api/stats").to_request();
        let body: serde_json::Value =
            test::read_body_json(test::call_service(&app, req).await).await;

        assert_eq!(body["totalReports"], json!(1));
        assert_eq!(body["uniqueServers"], json!(1));
        assert_eq!(body["uniquePlayers"], json!(1));
        assert_eq!(body["uniquePets"], json!(1));
        assert_eq!(body["averageValue"], json!(10));
        assert_eq!(body["maxValue"], json!(10.0));
        assert_eq!(body["totalSearches"], json!(0));
        assert!(body["uptime"].is_u64());
    }

    #[actix_web::test]
    async fn clear_resets_the_board_and_counters() {
        let state = test_state();
        let app = test_app!(state.clone());

        for i in 0..3 {
            state
                .store
                .insert(NewReport {
                    job_id: format!("srv-{}", i),
                    pet_name: "Cat".to_string(),
                    value: i as f64,
                    player_name: DEFAULT_PLAYER_NAME.to_string(),
                })
                .await;
        }
        state.store.search("cat", 0.0).await;

        let req = test::TestRequest::delete().uri("/api/clear").to_request();
        let body: serde_json::Value =
            test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["reportsDeleted"], json!(3));

        let stats = state.store.stats().await;
        assert_eq!(stats.total_reports, 0);
        assert_eq!(stats.total_searches, 0);

        // the next search counts from one again
        state.store.search("cat", 0.0).await;
        assert_eq!(state.store.stats().await.total_searches, 1);
    }

    #[actix_web::test]
    async fn index_reports_liveness_and_counts() {
        let app = test_app!(test_state());

        let req = test::TestRequest::get().uri("/").to_request();
        let body: serde_json::Value =
            test::read_body_json(test::call_service(&app, req).await).await;

        assert_eq!(body["status"], json!("online"));
        assert_eq!(body["stats"]["totalReports"], json!(0));
        assert_eq!(body["version"], json!(env!("CARGO_PKG_VERSION")));
    }
}
