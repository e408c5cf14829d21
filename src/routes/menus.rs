use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{post, put},
};
use uuid::Uuid;

use crate::{
    dto::menus::MenuForm,
    error::AppResult,
    middleware::auth::AuthUser,
    middleware::upload::read_form,
    models::MenuItem,
    response::ApiResponse,
    services::menu_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_menu))
        .route("/{id}", put(edit_menu))
}

#[utoipa::path(
    post,
    path = "/api/v1/menu",
    request_body(content = MenuForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Menu added", body = ApiResponse<MenuItem>),
        (status = 400, description = "Missing image or invalid fields")
    ),
    security(("cookie_auth" = [])),
    tag = "Menu"
)]
pub async fn add_menu(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<MenuItem>>)> {
    let (fields, image) = read_form(multipart).await?;
    let resp = menu_service::add_menu(&state, &user, fields, image).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/v1/menu/{id}",
    params(("id" = Uuid, Path, description = "Menu ID")),
    request_body(content = MenuForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Menu updated", body = ApiResponse<MenuItem>),
        (status = 404, description = "Menu not found")
    ),
    security(("cookie_auth" = [])),
    tag = "Menu"
)]
pub async fn edit_menu(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let (fields, image) = read_form(multipart).await?;
    let resp = menu_service::edit_menu(&state, &user, id, fields, image).await?;
    Ok(Json(resp))
}
