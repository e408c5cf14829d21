use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::{
    dto::orders::OrderList,
    dto::restaurants::{RestaurantForm, RestaurantWithMenus, SearchFilters, UpdateOrderStatusRequest},
    error::AppResult,
    middleware::auth::{AuthUser, auth_cookie},
    middleware::upload::read_form,
    models::{Order, Restaurant},
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::restaurant_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_restaurant))
        .route("/", get(get_restaurant))
        .route("/", put(update_restaurant))
        .route("/order", get(list_restaurant_orders))
        .route("/order/{orderId}/status", put(update_order_status))
        .route("/search/{searchText}", get(search_restaurants))
        .route("/{id}", get(get_single_restaurant))
}

#[utoipa::path(
    post,
    path = "/api/v1/resturant",
    request_body(content = RestaurantForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Restaurant added", body = ApiResponse<Restaurant>),
        (status = 400, description = "Duplicate restaurant or missing image")
    ),
    security(("cookie_auth" = [])),
    tag = "Restaurant"
)]
pub async fn create_restaurant(
    State(state): State<AppState>,
    user: AuthUser,
    jar: CookieJar,
    multipart: Multipart,
) -> AppResult<(StatusCode, CookieJar, Json<ApiResponse<Restaurant>>)> {
    let (fields, image) = read_form(multipart).await?;
    let (resp, token) = restaurant_service::create_restaurant(&state, &user, fields, image).await?;
    let jar = jar.add(auth_cookie(token));
    Ok((StatusCode::CREATED, jar, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/v1/resturant",
    responses(
        (status = 200, description = "Caller's restaurant", body = ApiResponse<Restaurant>),
        (status = 404, description = "No restaurant for this user")
    ),
    security(("cookie_auth" = [])),
    tag = "Restaurant"
)]
pub async fn get_restaurant(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Restaurant>>> {
    let resp = restaurant_service::get_own_restaurant(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/v1/resturant",
    request_body(content = RestaurantForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Restaurant updated", body = ApiResponse<Restaurant>),
        (status = 404, description = "No restaurant for this user")
    ),
    security(("cookie_auth" = [])),
    tag = "Restaurant"
)]
pub async fn update_restaurant(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Restaurant>>> {
    let (fields, image) = read_form(multipart).await?;
    let resp = restaurant_service::update_restaurant(&state, &user, fields, image).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/resturant/order",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "Orders for the caller's restaurant", body = ApiResponse<OrderList>),
        (status = 403, description = "Caller is not an operator"),
        (status = 404, description = "No restaurant for this user")
    ),
    security(("cookie_auth" = [])),
    tag = "Restaurant"
)]
pub async fn list_restaurant_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = restaurant_service::list_restaurant_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/v1/resturant/order/{orderId}/status",
    params(("orderId" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<Order>),
        (status = 400, description = "Invalid order status"),
        (status = 403, description = "Caller does not operate this order's restaurant"),
        (status = 404, description = "Order not found")
    ),
    security(("cookie_auth" = [])),
    tag = "Restaurant"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = restaurant_service::update_order_status(&state, &user, order_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/resturant/search/{searchText}",
    params(
        ("searchText" = String, Path, description = "Substring matched against name or city"),
        ("searchQuery" = Option<String>, Query, description = "Substring matched against name or cuisines"),
        ("selectedCuisines" = Option<String>, Query, description = "Comma-separated cuisine filter")
    ),
    responses(
        (status = 200, description = "Matching restaurants", body = ApiResponse<Vec<Restaurant>>)
    ),
    security(("cookie_auth" = [])),
    tag = "Restaurant"
)]
pub async fn search_restaurants(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(search_text): Path<String>,
    Query(filters): Query<SearchFilters>,
) -> AppResult<Json<ApiResponse<Vec<Restaurant>>>> {
    let resp = restaurant_service::search_restaurants(&state, &search_text, filters).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/resturant/{id}",
    params(("id" = Uuid, Path, description = "Restaurant ID")),
    responses(
        (status = 200, description = "Restaurant with its menu", body = ApiResponse<RestaurantWithMenus>),
        (status = 404, description = "Restaurant not found")
    ),
    security(("cookie_auth" = [])),
    tag = "Restaurant"
)]
pub async fn get_single_restaurant(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RestaurantWithMenus>>> {
    let resp = restaurant_service::get_single_restaurant(&state, id).await?;
    Ok(Json(resp))
}
