use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, Request, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use scada_common::{
    LocationId, Point, RunId, StorageLocation, Vehicle, VehicleId, VehicleStatus,
};
use scada_kernel::PlantEvent;
use scada_layout::{FIRST_VEHICLE, Layout, SECOND_VEHICLE};
use scada_tools::{PlantInspector, PlantSummary};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::state::AppState;

/// All dashboard routes, under `/api/scada`, with permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/scada/data", get(get_data))
        .route("/api/scada/summary", get(get_summary))
        .route("/api/scada/events", get(get_events))
        .route("/api/scada/locations", get(list_locations))
        .route("/api/scada/locations/{id}", get(get_location))
        .route("/api/scada/vehicles", get(list_vehicles))
        .route(
            "/api/scada/vehicles/{id}",
            get(get_vehicle).put(update_vehicle),
        )
        .route("/api/scada/vehicles/{id}/route", get(get_route))
        .route("/api/scada/agv1Path", get(agv1_path))
        .route("/api/scada/agv2Path", get(agv2_path))
        .route("/api/scada/agv1PathIndex", get(agv1_path_index))
        .route("/api/scada/agv2PathIndex", get(agv2_path_index))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn get_data(State(state): State<AppState>) -> Json<Layout> {
    let layout = state.layout.clone();
    Json(state.read(|plant| layout.with_live_state(plant)).await)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryView {
    run_id: RunId,
    layout_fingerprint: String,
    #[serde(flatten)]
    summary: PlantSummary,
}

async fn get_summary(State(state): State<AppState>) -> Json<SummaryView> {
    let summary = state.read(PlantInspector::summary).await;
    Json(SummaryView {
        run_id: state.run_id,
        layout_fingerprint: state.fingerprint.to_string(),
        summary,
    })
}

#[derive(Debug, Deserialize, Default)]
struct EventsQuery {
    since: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventsPage {
    run_id: RunId,
    last_seq: u64,
    events: Vec<PlantEvent>,
}

async fn get_events(
    State(state): State<AppState>,
    query: Result<Query<EventsQuery>, QueryRejection>,
) -> Result<Json<EventsPage>, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let since = query.since.unwrap_or(0);
    let (last_seq, events) = state
        .read(|plant| (plant.events().last_seq(), plant.events_since(since)))
        .await;
    Ok(Json(EventsPage {
        run_id: state.run_id,
        last_seq,
        events,
    }))
}

async fn list_locations(State(state): State<AppState>) -> Json<Vec<StorageLocation>> {
    Json(state.read(|plant| plant.locations().to_vec()).await)
}

async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StorageLocation>, ApiError> {
    let id = LocationId::new(id);
    state
        .read(|plant| plant.location(&id).cloned())
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("location {id} not found")))
}

async fn list_vehicles(State(state): State<AppState>) -> Json<Vec<Vehicle>> {
    let layout = state.layout.clone();
    Json(state.read(|plant| layout.live_vehicles(plant)).await)
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vehicle>, ApiError> {
    let id = VehicleId::new(id);
    state
        .read(|plant| plant.vehicle(&id).cloned())
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("vehicle {id} not found")))
}

/// Body of `PUT /vehicles/{id}`. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
struct VehicleUpdate {
    status: Option<VehicleStatus>,
    position: Option<Point>,
}

async fn update_vehicle(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<VehicleUpdate>, JsonRejection>,
) -> Result<Json<Vehicle>, ApiError> {
    let Json(update) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let id = VehicleId::new(id);
    let mut plant = state.plant.write().await;
    let vehicle = plant.update_vehicle(&id, update.status, update.position)?;
    Ok(Json(vehicle.clone()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RouteView {
    path: Vec<usize>,
    path_index: usize,
}

async fn route_view(state: &AppState, id: &VehicleId) -> Result<RouteView, ApiError> {
    state
        .read(|plant| {
            plant.route(id).map(|route| RouteView {
                path: route.waypoints().to_vec(),
                path_index: route.cursor(),
            })
        })
        .await
        .ok_or_else(|| ApiError::not_found(format!("vehicle {id} has no route")))
}

async fn get_route(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RouteView>, ApiError> {
    route_view(&state, &VehicleId::new(id)).await.map(Json)
}

async fn legacy_path(state: &AppState, id: &str) -> Result<Json<Value>, ApiError> {
    let view = route_view(state, &VehicleId::from(id)).await?;
    Ok(Json(json!({ "path": view.path })))
}

async fn legacy_path_index(state: &AppState, id: &str) -> Result<Json<Value>, ApiError> {
    let view = route_view(state, &VehicleId::from(id)).await?;
    Ok(Json(json!({ "pathIndex": view.path_index })))
}

async fn agv1_path(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    legacy_path(&state, FIRST_VEHICLE).await
}

async fn agv2_path(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    legacy_path(&state, SECOND_VEHICLE).await
}

async fn agv1_path_index(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    legacy_path_index(&state, FIRST_VEHICLE).await
}

async fn agv2_path_index(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    legacy_path_index(&state, SECOND_VEHICLE).await
}

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

fn apply_cors_headers(headers: &mut axum::http::HeaderMap) {
    headers.insert(
        HeaderName::from_static("access-control-allow-origin"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-methods"),
        HeaderValue::from_static("GET,PUT,OPTIONS"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-headers"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-max-age"),
        HeaderValue::from_static("3600"),
    );
}
