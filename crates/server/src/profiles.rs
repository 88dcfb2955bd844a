//! Configuration-profile CRUD handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use store::Store;

use crate::routes::{error, ApiError};
use crate::state::AppState;

fn require_store(state: &AppState) -> Result<&Store, ApiError> {
    state
        .store
        .as_ref()
        .ok_or_else(|| error(StatusCode::SERVICE_UNAVAILABLE, "database not configured"))
}

#[derive(Debug, Deserialize)]
pub struct CreateProfile {
    pub name: String,
    #[serde(default)]
    pub config: Value,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub config: Value,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let store = require_store(&state)?;
    let profiles = store
        .list_profiles()
        .await
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(json!({"profiles": profiles})))
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateProfile>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "profile name is required"));
    }

    let store = require_store(&state)?;
    let profile = store
        .create_profile(request.name.trim(), request.config)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create profile");
            error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok((StatusCode::CREATED, Json(json!(profile))))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let store = require_store(&state)?;
    let profile = store
        .get_profile(id)
        .await
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or_else(|| error(StatusCode::NOT_FOUND, format!("profile {id} not found")))?;
    Ok(Json(json!(profile)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProfile>,
) -> Result<Json<Value>, ApiError> {
    let store = require_store(&state)?;
    let profile = store
        .update_profile(id, request.name.as_deref(), request.config)
        .await
        .map_err(|e| match e {
            store::StoreError::NotFound(_) => {
                error(StatusCode::NOT_FOUND, format!("profile {id} not found"))
            }
            other => error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        })?;
    Ok(Json(json!(profile)))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let store = require_store(&state)?;
    let removed = store
        .delete_profile(id)
        .await
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(error(StatusCode::NOT_FOUND, format!("profile {id} not found")))
    }
}
