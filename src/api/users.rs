//! User management endpoints

use axum::{extract::State, Json};

use crate::{error::AppResult, models::user::User, AppState};

use super::AuthenticatedUser;

/// List all accounts
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All accounts", body = Vec<User>),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> AppResult<Json<Vec<User>>> {
    let users = state.services.auth.list_users(&principal).await?;
    Ok(Json(users))
}
