//! User handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use common::{AppResult, OptionExt};
use domain::{parse_user_id, UserResponse};

use crate::http::extractors::JsonBody;
use crate::http::state::AppState;

/// Account creation request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    /// Display name
    #[serde(default)]
    #[schema(example = "Jane Doe")]
    pub name: String,
    /// Email address
    #[serde(default)]
    #[schema(example = "jane@example.com")]
    pub email: String,
    /// Plaintext password, hashed before storage
    #[serde(default)]
    #[schema(example = "correct horse battery staple")]
    pub password: String,
}

/// Partial update request. Omitted fields are left unchanged.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    #[schema(example = "Jane Roe")]
    pub name: Option<String>,
    #[schema(example = "jane.roe@example.com")]
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Create user routes (mounted under `/v1`)
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/user", post(create_user))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

/// List all users
#[utoipa::path(
    get,
    path = "/v1/users",
    tag = "Users",
    responses(
        (status = 200, description = "All users ordered by name", body = Vec<UserResponse>),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = state.user_service.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/v1/users/{id}",
    tag = "Users",
    params(
        ("id" = String, Path, description = "User ID (UUID)")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 400, description = "Malformed user ID"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<UserResponse>> {
    parse_user_id(&id)?;

    let user = state.user_service.find_user(&id).await?.ok_or_not_found()?;
    Ok(Json(UserResponse::from(user)))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/v1/user",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Malformed body or missing field"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state
        .user_service
        .create_user(payload.name, payload.email, payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Update any subset of name, email and password
#[utoipa::path(
    patch,
    path = "/v1/users/{id}",
    tag = "Users",
    params(
        ("id" = String, Path, description = "User ID (UUID)")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Malformed body or ID, or nothing to update"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    parse_user_id(&id)?;

    let user = state
        .user_service
        .update_user(&id, payload.name, payload.email, payload.password)
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Delete a user permanently
#[utoipa::path(
    delete,
    path = "/v1/users/{id}",
    tag = "Users",
    params(
        ("id" = String, Path, description = "User ID (UUID)")
    ),
    responses(
        (status = 200, description = "User deleted; empty object body"),
        (status = 400, description = "Malformed user ID"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Storage failure")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    parse_user_id(&id)?;

    state.user_service.remove_user(&id).await?;
    Ok(Json(json!({})))
}
