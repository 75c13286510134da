//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::{debug, error, info, warn};

use crate::catalog::CatalogCounts;
use crate::inference::ModelError;
use crate::predict::{LegOutcome, LegRequestError};
use crate::resolve::ResolveError;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/journey/predict", post(predict_journey))
        .route("/get_journey_time.do", post(predict_journey))
        .route("/stops/by-line", get(stops_by_line))
        .route("/admin/catalog/refresh", post(refresh_catalog))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Annotate every transit step of a routing suggestion with a prediction.
///
/// Steps are handled one after another and independently: a leg that
/// cannot be predicted gets a status saying why, and the rest carry on.
/// A step on a line the service does not know is reported as unsupported
/// before its other fields are checked.
async fn predict_journey(
    State(state): State<AppState>,
    Json(mut document): Json<JourneyDocument>,
) -> Json<JourneyDocument> {
    debug!(routes = document.routes.len(), "prediction request");
    let catalog = state.predictor.catalog().snapshot().await;

    for (route_idx, route) in document.routes.iter_mut().enumerate() {
        for (step_idx, step) in route.steps.iter_mut().enumerate() {
            let outcome = match step.line() {
                None => continue,
                Some(Ok(line)) if !catalog.is_valid(&line) => {
                    info!(route = route_idx, step = step_idx, line = %line, "prediction requested for unknown line");
                    LegOutcome::Unsupported { line }
                }
                Some(_) => match step.leg_request(state.timezone) {
                    None => continue,
                    Some(Ok(request)) => state.predictor.predict(&request).await,
                    Some(Err(e)) => {
                        warn!(route = route_idx, step = step_idx, error = %e, "malformed transit step");
                        LegOutcome::invalid(&e)
                    }
                },
            };
            step.annotate(&outcome);
        }
    }

    document.set_response_banner();
    Json(document)
}

/// Resolve one leg's stop sequence without predicting.
async fn stops_by_line(
    State(state): State<AppState>,
    Query(query): Query<StopsByLineQuery>,
) -> Result<Json<StopsByLineResponse>, AppError> {
    let request = query.leg_request(state.timezone)?;

    let catalog = state.predictor.catalog().snapshot().await;
    if !catalog.is_valid(&request.line) {
        return Err(AppError::NotFound {
            message: format!("Unknown line: {}", request.line),
        });
    }

    let resolution = state.predictor.resolve(&request)?;
    Ok(Json(StopsByLineResponse::from_resolution(
        &request.line,
        &resolution,
    )))
}

/// Rebuild the line catalog from the schedule and the model directory.
async fn refresh_catalog(State(state): State<AppState>) -> Result<Json<CatalogCounts>, AppError> {
    let counts = state.predictor.catalog().refresh().await?;
    info!(
        valid_lines = counts.valid_lines,
        modelled_lines = counts.modelled_lines,
        "line catalog refreshed on request"
    );
    Ok(Json(counts))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<LegRequestError> for AppError {
    fn from(e: LegRequestError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<ResolveError> for AppError {
    fn from(e: ResolveError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl From<ModelError> for AppError {
    fn from(e: ModelError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            debug!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ROUTE_15_LONG_NAME, leg_predictor, model_root};
    use crate::inference::END_TO_END_DIR;
    use crate::predict::{STATUS_ATTEMPTED, STATUS_NO_STOP_DETAIL};
    use crate::weather::{FixedWeather, Weather};
    use serde_json::{Value, json};
    use std::fs;
    use tempfile::TempDir;

    fn state(root: &TempDir) -> AppState {
        let weather = Weather::Fixed(FixedWeather { temperature: 291.0 });
        AppState::new(leg_predictor(root, weather), chrono_tz::Europe::Dublin)
    }

    fn transit(short_name: &str, departure: Value) -> Value {
        json!({
            "duration": {"text": "10 mins", "value": 600},
            "travel_mode": "TRANSIT",
            "transit_details": {
                "arrival_stop": {
                    "location": {"lat": 53.3505441, "lng": -6.2507091},
                    "name": "Connolly"
                },
                "departure_stop": {
                    "location": {"lat": 53.3482354, "lng": -6.2561569},
                    "name": "Eden Quay, stop 299"
                },
                "departure_time": {"value": departure},
                "headsign": "Clongriffin",
                "line": {"name": ROUTE_15_LONG_NAME, "short_name": short_name}
            }
        })
    }

    async fn post(state: AppState, body: Value) -> Value {
        let document: JourneyDocument = serde_json::from_value(body).unwrap();
        let Json(out) = predict_journey(State(state), Json(document)).await;
        serde_json::to_value(out).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn each_step_gets_its_own_outcome() {
        let root = model_root(false);
        let mut broken = transit("15", json!(1657899843));
        broken["transit_details"]
            .as_object_mut()
            .unwrap()
            .remove("departure_stop");

        let body = json!({
            "title": "Journeyti.me Prediction Request",
            "status": "OK",
            "routes": [
                {"steps": [
                    {"travel_mode": "WALKING", "duration": {"value": 95}},
                    transit("15", json!(1657899843)),
                    transit("999", json!(1657899843)),
                ]},
                {"steps": [
                    transit("16", json!("2022-07-15T16:44:03.000GMT+0100")),
                    broken,
                ]}
            ]
        });

        let out = post(state(&root), body).await;
        assert_eq!(out["title"], RESPONSE_TITLE);
        assert_eq!(out["description"], RESPONSE_DESCRIPTION);
        assert_eq!(out["status"], "OK");

        let first = &out["routes"][0]["steps"];
        assert!(first[0].get("prediction_status").is_none());
        assert_eq!(first[0]["travel_mode"], "WALKING");

        assert_eq!(first[1]["prediction_status"], STATUS_ATTEMPTED);
        assert_eq!(first[1]["predicted_duration"]["value"], 600.0);
        assert_eq!(first[1]["predicted_duration"]["text"], "10mins");
        let stops = first[1]["stop_sequence"]["stops"].as_array().unwrap();
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0]["stop_id"], "8220DB000299");
        assert_eq!(stops[1]["stop_id"], "8220DB000497");
        assert_eq!(stops[1]["dist_from_first_stop_m"], 450.0);

        assert_eq!(
            first[2]["prediction_status"],
            "Prediction Service not available for route '999'."
        );
        assert!(first[2].get("predicted_duration").is_none());

        let second = &out["routes"][1]["steps"];
        assert_eq!(second[0]["prediction_status"], STATUS_NO_STOP_DETAIL);
        assert!(second[0].get("stop_sequence").is_none());
        assert_eq!(
            second[1]["prediction_status"],
            "Prediction not attempted - missing departure stop"
        );
    }

    #[tokio::test]
    async fn malformed_step_does_not_reject_its_siblings() {
        let root = model_root(false);
        let mut mistyped = transit("15", json!(1657899843));
        mistyped["transit_details"]["departure_stop"]["location"]["lat"] = json!("north");

        let body = json!({"routes": [{"steps": [
            transit("15", json!(1657899843.0)),
            mistyped,
            transit("15", json!(1657899843)),
        ]}]});

        let out = post(state(&root), body).await;
        let steps = &out["routes"][0]["steps"];
        assert_eq!(steps[0]["prediction_status"], STATUS_ATTEMPTED);
        assert_eq!(steps[0]["predicted_duration"]["value"], 600.0);
        assert!(
            steps[1]["prediction_status"]
                .as_str()
                .unwrap()
                .starts_with("Prediction not attempted - invalid departure_stop")
        );
        assert!(steps[1].get("predicted_duration").is_none());
        assert_eq!(steps[1]["transit_details"]["departure_stop"]["location"]["lat"], "north");
        assert_eq!(steps[2]["prediction_status"], STATUS_ATTEMPTED);
    }

    #[tokio::test]
    async fn unknown_line_wins_over_missing_fields() {
        let root = model_root(false);
        let mut step = transit("999", json!(1657899843));
        let details = step["transit_details"].as_object_mut().unwrap();
        details.remove("arrival_stop");
        details.remove("departure_time");

        let out = post(state(&root), json!({"routes": [{"steps": [step]}]})).await;
        assert_eq!(
            out["routes"][0]["steps"][0]["prediction_status"],
            "Prediction Service not available for route '999'."
        );
    }

    #[tokio::test]
    async fn line_model_is_picked_up_after_refresh() {
        let root = model_root(false);
        let state = state(&root);

        let body = json!({"routes": [{"steps": [transit("15", json!(1657899843))]}]});
        let before = post(state.clone(), body.clone()).await;
        assert_eq!(before["routes"][0]["steps"][0]["predicted_duration"]["value"], 600.0);

        let e2e = root.path().join(END_TO_END_DIR);
        fs::create_dir_all(&e2e).unwrap();
        fs::write(e2e.join("15.json"), crate::fixtures::FLAT_LINE_MODEL).unwrap();

        let Json(counts) = refresh_catalog(State(state.clone())).await.unwrap();
        assert_eq!(counts.modelled_lines, 1);

        let after = post(state, body).await;
        assert_eq!(after["routes"][0]["steps"][0]["predicted_duration"]["value"], 900.0);
        assert_eq!(
            after["routes"][0]["steps"][0]["predicted_duration"]["text"],
            "15mins"
        );
    }

    fn stops_query(line: &str) -> StopsByLineQuery {
        StopsByLineQuery {
            line: line.to_string(),
            name: Some(ROUTE_15_LONG_NAME.to_string()),
            headsign: Some("Clongriffin".to_string()),
            departure: "2022-07-15T16:44:03".to_string(),
            dep_lat: 53.3482354,
            dep_lon: -6.2561569,
            dep_name: "Eden Quay, stop 299".to_string(),
            arr_lat: 53.3505441,
            arr_lon: -6.2507091,
            arr_name: "Connolly".to_string(),
        }
    }

    #[tokio::test]
    async fn stops_by_line_returns_resolution() {
        let root = model_root(false);
        let Json(resp) = stops_by_line(State(state(&root)), Query(stops_query("15")))
            .await
            .unwrap();

        assert_eq!(resp.trip_id.as_deref(), Some("t15-out-1635"));
        assert_eq!(resp.departure_stop.stop_id, "8220DB000299");
        assert_eq!(resp.departure_stop.matched_by, "name");
        assert_eq!(resp.arrival_stop.stop_id, "8220DB000497");
        assert_eq!(resp.arrival_stop.matched_by, "proximity");
        assert_eq!(resp.stops.len(), 2);
        // Resolution alone makes no prediction.
        assert_eq!(resp.stops[1].predicted_time_from_first_stop_s, 0.0);
    }

    #[tokio::test]
    async fn stops_by_line_rejects_unknown_line() {
        let root = model_root(false);
        let err = stops_by_line(State(state(&root)), Query(stops_query("999")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn stops_by_line_rejects_bad_departure() {
        let root = model_root(false);
        let mut query = stops_query("15");
        query.departure = "half four".to_string();
        let err = stops_by_line(State(state(&root)), Query(query))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest { .. }));
    }

    #[test]
    fn error_status_codes() {
        let resp = AppError::BadRequest {
            message: "nope".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AppError::from(ModelError::NonFinite).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
