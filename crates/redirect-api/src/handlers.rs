//! Route handlers.
//!
//! Each handler pulls its parameters, calls into the `Registry`, and shapes
//! the result. Empty query values are treated the same as absent ones.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ApiState;
use crate::error::ApiError;

/// Query parameters accepted on `/`.
#[derive(Debug, Default, Deserialize)]
pub struct RootParams {
    pub foundry_id: Option<String>,
    pub external_address: Option<String>,
    pub internal_address: Option<String>,
}

/// Query parameters accepted on `/api/customize`.
#[derive(Debug, Default, Deserialize)]
pub struct CustomizeParams {
    pub public_id: Option<String>,
    pub foundry_id: Option<String>,
}

/// Body returned by the mutating endpoints.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UpdateResponse {
    pub message: String,
    pub public_id: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, ApiError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::MissingParameter(name)),
    }
}

// ── Root ───────────────────────────────────────────────────────

/// GET /?foundry_id=
pub async fn address_summary(
    State(state): State<ApiState>,
    Query(params): Query<RootParams>,
) -> Result<String, ApiError> {
    let foundry_id = required(&params.foundry_id, "foundry_id")?;
    Ok(state.registry.lookup_address_summary(foundry_id)?)
}

/// POST /?foundry_id=&external_address=&internal_address=
pub async fn register(
    State(state): State<ApiState>,
    Query(params): Query<RootParams>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let foundry_id = required(&params.foundry_id, "foundry_id")?;
    let external = required(&params.external_address, "external_address")?;
    let local = required(&params.internal_address, "internal_address")?;

    let registration = state.registry.register(foundry_id, external, local)?;
    let entry = registration.entry;
    Ok(Json(UpdateResponse {
        message: format!(
            "Successful update {} {} {} {}",
            entry.foundry_id, entry.external_address, entry.local_address, entry.public_id
        ),
        public_id: entry.public_id,
    }))
}

// ── Customize ──────────────────────────────────────────────────

/// GET /api/customize?public_id=
pub async fn check_alias(
    State(state): State<ApiState>,
    Query(params): Query<CustomizeParams>,
) -> Result<Json<MessageResponse>, ApiError> {
    let public_id = required(&params.public_id, "public_id")?;
    state.registry.check_alias(public_id)?;
    Ok(Json(MessageResponse {
        message: format!("Custom address {public_id} is available"),
    }))
}

/// POST /api/customize?public_id=&foundry_id=
pub async fn customize_alias(
    State(state): State<ApiState>,
    Query(params): Query<CustomizeParams>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let public_id = required(&params.public_id, "public_id")?;
    let foundry_id = required(&params.foundry_id, "foundry_id")?;

    let entry = state.registry.customize_alias(foundry_id, public_id)?;
    Ok(Json(UpdateResponse {
        message: format!(
            "Successful update {} {} {} {}",
            entry.foundry_id, entry.external_address, entry.local_address, entry.public_id
        ),
        public_id: entry.public_id,
    }))
}

// ── Redirects ──────────────────────────────────────────────────

fn redirect(state: &ApiState, public_id: &str, want_local: bool) -> Result<Response, ApiError> {
    let location = state.registry.resolve(public_id, want_local)?;
    let value = HeaderValue::try_from(location.as_str())
        .map_err(|_| ApiError::InvalidLocation(public_id.to_string()))?;
    debug!(%public_id, want_local, %location, "redirecting");
    Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, value)]).into_response())
}

/// GET /{public_id}
pub async fn redirect_external(
    State(state): State<ApiState>,
    Path(public_id): Path<String>,
) -> Result<Response, ApiError> {
    redirect(&state, &public_id, false)
}

/// GET /{public_id}/local
pub async fn redirect_local(
    State(state): State<ApiState>,
    Path(public_id): Path<String>,
) -> Result<Response, ApiError> {
    redirect(&state, &public_id, true)
}

// ── Misc ───────────────────────────────────────────────────────

/// OPTIONS on any route. The CORS layer supplies the headers.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn unknown_resource(uri: Uri) -> ApiError {
    ApiError::UnknownResource(uri.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use redirect_core::RedirectEntry;
    use redirect_core::config::RegistryConfig;
    use redirect_registry::Registry;
    use redirect_state::{RedirectStore, StateStore, WriteCondition};

    fn test_state() -> (StateStore, ApiState) {
        let store = StateStore::open_in_memory("FoundryRedirects").unwrap();
        let registry = Registry::new(Arc::new(store.clone()), &RegistryConfig::default()).unwrap();
        let state = ApiState {
            registry: Arc::new(registry),
        };
        (store, state)
    }

    fn root_params(foundry_id: &str, external: &str, internal: &str) -> RootParams {
        RootParams {
            foundry_id: Some(foundry_id.to_string()),
            external_address: Some(external.to_string()),
            internal_address: Some(internal.to_string()),
        }
    }

    #[tokio::test]
    async fn register_then_summarize() {
        let (_, state) = test_state();
        let resp = register(
            State(state.clone()),
            Query(root_params("host-42", "203.0.113.5:30000", "10.0.0.5:30000")),
        )
        .await
        .unwrap();
        assert!(resp.message.starts_with("Successful update host-42 203.0.113.5:30000"));

        let summary = address_summary(
            State(state),
            Query(RootParams {
                foundry_id: Some("host-42".to_string()),
                ..RootParams::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(summary, resp.public_id);
    }

    #[tokio::test]
    async fn register_reports_first_missing_parameter() {
        let (_, state) = test_state();
        let err = register(State(state.clone()), Query(RootParams::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingParameter("foundry_id")));

        let err = register(State(state), Query(root_params("f", "e", "")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingParameter("internal_address")));
    }

    #[tokio::test]
    async fn summary_for_unknown_foundry_is_404() {
        let (_, state) = test_state();
        let err = address_summary(
            State(state),
            Query(RootParams {
                foundry_id: Some("ghost".to_string()),
                ..RootParams::default()
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn redirect_sets_location() {
        let (store, state) = test_state();
        let entry = RedirectEntry::new("pid", "host-42", "203.0.113.5:30000", "10.0.0.5:30000");
        store.upsert(&entry, WriteCondition::Absent).unwrap();

        let resp = redirect_external(State(state.clone()), Path("pid".to_string()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()[header::LOCATION], "http://203.0.113.5:30000");

        let resp = redirect_local(State(state), Path("pid".to_string()))
            .await
            .unwrap();
        assert_eq!(resp.headers()[header::LOCATION], "http://10.0.0.5:30000");
    }

    #[tokio::test]
    async fn unsendable_stored_address_is_500() {
        let (store, state) = test_state();
        let entry = RedirectEntry::new("pid", "host-42", "1.2.3.4\r\nSet-Cookie:x", "10.0.0.5:1");
        store.upsert(&entry, WriteCondition::Unconditional).unwrap();

        let err = redirect_external(State(state), Path("pid".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(&err, ApiError::InvalidLocation(id) if id == "pid"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn check_alias_statuses() {
        let (store, state) = test_state();
        store
            .upsert(
                &RedirectEntry::new("taken", "host-1", "e", "l"),
                WriteCondition::Absent,
            )
            .unwrap();

        let params = |id: &str| CustomizeParams {
            public_id: Some(id.to_string()),
            foundry_id: None,
        };

        let ok = check_alias(State(state.clone()), Query(params("free")))
            .await
            .unwrap();
        assert_eq!(ok.message, "Custom address free is available");

        let err = check_alias(State(state.clone()), Query(params("taken")))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_ACCEPTABLE);

        let err = check_alias(State(state.clone()), Query(params("api-west")))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = check_alias(State(state), Query(CustomizeParams::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingParameter("public_id")));
    }

    #[tokio::test]
    async fn customize_requires_foundry_id() {
        let (_, state) = test_state();
        let err = customize_alias(
            State(state),
            Query(CustomizeParams {
                public_id: Some("myalias".to_string()),
                foundry_id: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::MissingParameter("foundry_id")));
    }

    #[tokio::test]
    async fn unknown_resource_names_path() {
        let err = unknown_resource(Uri::from_static("/a/b/c")).await;
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.public_message(), "Resource /a/b/c not found");
    }
}
