//! Profile endpoints backing the profile collaborator.

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::collab::ProfileContext;

/// GET /profiles/{user_id}
///
/// A user without a stored profile gets an empty context, not a 404,
/// matching how the chat path treats profile absence.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ProfileContext>, ApiError> {
    let context = state.profiles.context_for(&user_id).await?;
    Ok(Json(context))
}

/// PUT /profiles/{user_id}
///
/// Upserts the supplied fields into the user's profile and returns the
/// merged context. Creation and update share this path.
pub async fn put_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(fields): Json<HashMap<String, Value>>,
) -> Result<Json<ProfileContext>, ApiError> {
    if fields.is_empty() {
        return Err(ApiError::BadRequest(
            "profile update must carry at least one field".into(),
        ));
    }
    for (key, value) in fields {
        state.profiles.upsert(&user_id, &key, value).await?;
    }
    let context = state.profiles.context_for(&user_id).await?;
    Ok(Json(context))
}
