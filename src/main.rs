use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use fhir::Bundle;
use phenofhir_core::config::{
    created_by_from_env_value, resolve_namespaces, subject_policy_from_env_value,
};
use phenofhir_core::{Converter, ConverterConfig};
use phenopackets::PhenoRecord;

/// Health check response body
#[derive(Serialize, ToSchema)]
struct HealthRes {
    status: String,
}

/// Application state shared across REST API handlers
///
/// Holds the converter only. It is read-only, so every request runs its own conversion.
#[derive(Clone)]
struct AppState {
    converter: Arc<Converter>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, convert, bundle),
    components(schemas(HealthRes))
)]
struct ApiDoc;

/// Main entry point for the phenofhir REST service
///
/// # Environment Variables
/// - `PHENOFHIR_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `PHENOFHIR_CREATED_BY`: provenance label (default: "FHIR converter")
/// - `PHENOFHIR_SUBJECT_POLICY`: `first` or `all` (default: `first`)
/// - `PHENOFHIR_NAMESPACES`: YAML file of extra namespace prefixes
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration is invalid or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("phenofhir=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("PHENOFHIR_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let config = config_from_env()?;

    tracing::info!(
        policy = %config.subject_policy(),
        namespaces = config.namespaces().len(),
        "++ Starting phenofhir REST on {}",
        rest_addr
    );

    let app = router(AppState {
        converter: Arc::new(Converter::new(config)),
    });

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Resolve converter configuration once, at startup.
fn config_from_env() -> anyhow::Result<ConverterConfig> {
    let created_by = created_by_from_env_value(std::env::var("PHENOFHIR_CREATED_BY").ok());
    let subject_policy =
        subject_policy_from_env_value(std::env::var("PHENOFHIR_SUBJECT_POLICY").ok())?;
    let namespaces_path = std::env::var_os("PHENOFHIR_NAMESPACES").map(std::path::PathBuf::from);
    let namespaces = resolve_namespaces(namespaces_path.as_deref())?;

    Ok(ConverterConfig::new(namespaces, created_by, subject_policy)?)
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/convert", post(convert))
        .route("/bundle", post(bundle))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        status: "ok".into(),
    })
}

#[utoipa::path(
    post,
    path = "/convert",
    request_body(
        content = String,
        description = "FHIR Bundle JSON",
        content_type = "application/json"
    ),
    responses(
        (
            status = 200,
            description = "Phenopacket record JSON",
            body = String,
            content_type = "application/json"
        ),
        (status = 400, description = "Body is not a FHIR Bundle")
    )
)]
/// Convert a FHIR bundle into a phenopacket record
///
/// The body is parsed by the `fhir` crate so that schema errors carry the failing path.
///
/// # Returns
/// * `200` - The phenopacket (or cohort) record as JSON
/// * `400` - The body is not a FHIR Bundle; the response text names the problem
async fn convert(State(state): State<AppState>, body: String) -> Response {
    let bundle = match Bundle::from_json(&body) {
        Ok(bundle) => bundle,
        Err(e) => {
            tracing::warn!("Convert request rejected: {}", e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let record = state.converter.to_phenopacket(&bundle);
    match record.to_json() {
        Ok(json) => json_response(json),
        Err(e) => {
            tracing::error!("Render phenopacket error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/bundle",
    request_body(
        content = String,
        description = "Phenopacket record JSON",
        content_type = "application/json"
    ),
    responses(
        (
            status = 200,
            description = "FHIR Bundle JSON",
            body = String,
            content_type = "application/json"
        ),
        (status = 400, description = "Body is not a phenopacket record")
    )
)]
/// Expand a phenopacket record into a FHIR bundle
async fn bundle(State(state): State<AppState>, body: String) -> Response {
    let record = match PhenoRecord::from_json(&body) {
        Ok(record) => record,
        Err(e) => {
            tracing::warn!("Bundle request rejected: {}", e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let bundle = state.converter.to_bundle(&record);
    match bundle.to_json() {
        Ok(json) => json_response(json),
        Err(e) => {
            tracing::error!("Render bundle error: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}

fn json_response(json: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], json).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState {
            converter: Arc::new(Converter::default()),
        })
    }

    async fn send(method: &str, uri: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request");

        let response = app().oneshot(request).await.expect("infallible service");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, body) = send("GET", "/health", "").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn convert_returns_phenopacket_json() {
        let bundle = r#"{
            "resourceType": "Bundle",
            "type": "collection",
            "entry": [
                {"resource": {"resourceType": "Patient", "id": "P1", "gender": "male"}}
            ]
        }"#;

        let (status, body) = send("POST", "/convert", bundle).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(json["phenopacket"]["subject"]["id"], "P1");
        assert_eq!(json["phenopacket"]["subject"]["sex"], "MALE");
    }

    #[tokio::test]
    async fn convert_rejects_non_bundle() {
        let (status, body) = send("POST", "/convert", r#"{"resourceType":"Patient"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.is_empty());
    }

    #[tokio::test]
    async fn bundle_expands_record() {
        let record = r#"{"phenopacket": {"subject": {"id": "P1", "sex": "FEMALE"}}}"#;

        let (status, body) = send("POST", "/bundle", record).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(json["resourceType"], "Bundle");
        assert_eq!(json["entry"][0]["resource"]["resourceType"], "Patient");
        assert_eq!(json["entry"][0]["resource"]["gender"], "female");
    }
}
