//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::http::handlers::user_handler::{CreateUserRequest, UpdateUserRequest};
use domain::UserResponse;

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::http::handlers::user_handler::list_users,
        crate::http::handlers::user_handler::get_user,
        crate::http::handlers::user_handler::create_user,
        crate::http::handlers::user_handler::update_user,
        crate::http::handlers::user_handler::delete_user,
    ),
    components(
        schemas(
            UserResponse,
            CreateUserRequest,
            UpdateUserRequest,
        )
    ),
    tags(
        (name = "Users", description = "User account management"),
    )
)]
pub struct ApiDoc;
