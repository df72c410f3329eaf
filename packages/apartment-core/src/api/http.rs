//! HTTP route handlers.
//!
//! All handlers are thin - they delegate to the registry for business logic.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, Method},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::api::response::{api_ok, api_success};
use crate::api::AppState;
use crate::error::ApartmentResult;
use crate::protocol_constants::SERVICE_ID;

#[derive(Deserialize)]
struct UpdateDeviceRequest {
    state: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Creates the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::PUT, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/devices", get(list_devices))
        .route("/api/devices/{name}", get(get_device).put(update_device))
        .route("/api/devices/{name}/toggle", post(toggle_device))
        .route("/api/refresh", post(handle_refresh))
        .with_state(state)
        .layer(cors)
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Liveness probe: "Is the process running?"
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    api_success(json!({
        "status": "ok",
        "service": SERVICE_ID,
        "version": env!("CARGO_PKG_VERSION"),
        "devices": state.registry.len()
    }))
}

/// Lists known devices without querying them.
async fn list_devices(State(state): State<AppState>) -> impl IntoResponse {
    api_success(json!({ "devices": state.registry.list() }))
}

async fn get_device(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> ApartmentResult<impl IntoResponse> {
    let view = state.registry.get_device_view(&name).await?;
    Ok(api_success(view))
}

async fn update_device(
    Path(name): Path<String>,
    State(state): State<AppState>,
    payload: Result<Json<UpdateDeviceRequest>, JsonRejection>,
) -> ApartmentResult<impl IntoResponse> {
    let Json(payload) = payload?;

    let view = state
        .registry
        .update_device_view(&name, payload.state)
        .await?;
    Ok(api_success(view))
}

async fn toggle_device(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> ApartmentResult<impl IntoResponse> {
    let view = state.registry.toggle_device_view(&name).await?;
    Ok(api_success(view))
}

/// Triggers a rescan in the background.
async fn handle_refresh(State(state): State<AppState>) -> impl IntoResponse {
    state.refresh_monitor.trigger_refresh();
    api_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::registry::DeviceRegistry;
    use crate::services::RefreshMonitor;
    use crate::state::Config;
    use crate::wemo::retry::BackoffPolicy;
    use crate::wemo::test_fixtures::{FakeDiscovery, FakeSwitch};
    use crate::wemo::types::Device;

    const CABINET_HOST: &str = "192.168.1.187:49153";

    async fn test_router() -> (Router, Arc<FakeSwitch>) {
        let discovery = Arc::new(FakeDiscovery::new(vec![Device::new(
            CABINET_HOST,
            "Cabinet Lights",
        )]));
        let switch = Arc::new(FakeSwitch::new(&[(CABINET_HOST, false)]));
        let registry = Arc::new(DeviceRegistry::new(
            discovery,
            switch.clone(),
            BackoffPolicy::default(),
            5,
        ));
        registry.refresh().await.unwrap();

        let state = AppState {
            refresh_monitor: Arc::new(RefreshMonitor::new(
                Arc::clone(&registry),
                Duration::from_secs(60),
            )),
            registry,
            config: Arc::new(Config::default()),
        };
        (create_router(state), switch)
    }

    async fn send(
        app: Router,
        method: &str,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let body = match body {
            Some(b) => Body::from(b.to_string()),
            None => Body::empty(),
        };
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_device_count() {
        let (app, _) = test_router().await;
        let (status, json) = send(app, "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "apartment");
        assert_eq!(json["devices"], 1);
    }

    #[tokio::test]
    async fn list_devices_uses_camel_case() {
        let (app, switch) = test_router().await;
        let (status, json) = send(app, "GET", "/api/devices", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["devices"][0]["name"], "cabinet lights");
        assert_eq!(json["devices"][0]["friendlyName"], "Cabinet Lights");
        assert_eq!(switch.gets(), 0);
    }

    #[tokio::test]
    async fn get_device_reads_state() {
        let (app, _) = test_router().await;
        let (status, json) = send(app, "GET", "/api/devices/Cabinet%20Lights", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["name"], "cabinet lights");
        assert_eq!(json["state"], false);
    }

    #[tokio::test]
    async fn update_device_sets_state() {
        let (app, switch) = test_router().await;
        let (status, json) = send(
            app,
            "PUT",
            "/api/devices/cabinet%20lights",
            Some(r#"{"state": true}"#),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["state"], true);
        assert_eq!(switch.state(CABINET_HOST), Some(true));
    }

    #[tokio::test]
    async fn unknown_device_is_404() {
        let (app, _) = test_router().await;
        let (status, json) = send(
            app,
            "PUT",
            "/api/devices/doesnotexist",
            Some(r#"{"state": true}"#),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "device_not_found");
        assert_eq!(json["status"], 404);
    }

    #[tokio::test]
    async fn malformed_body_is_400() {
        let (app, switch) = test_router().await;
        let (status, json) = send(
            app,
            "PUT",
            "/api/devices/cabinet%20lights",
            Some(r#"{"state": "on"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_request");
        assert_eq!(json["status"], 400);
        let message = json["message"].as_str().unwrap();
        assert!(message.starts_with("Invalid request: "));
        assert_eq!(switch.sets(), 0);
    }

    #[tokio::test]
    async fn toggle_flips_state() {
        let (app, _) = test_router().await;
        let (status, json) = send(app, "POST", "/api/devices/cabinet%20lights/toggle", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["state"], true);
    }

    #[tokio::test]
    async fn refresh_is_acknowledged() {
        let (app, _) = test_router().await;
        let (status, json) = send(app, "POST", "/api/refresh", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
    }
}
