use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};

use crate::{
    dto::orders::{CheckoutSessionRequest, CheckoutSessionResponse, OrderList},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/checkout/create-checkout-session", post(create_checkout_session))
}

#[utoipa::path(
    get,
    path = "/api/v1/order",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "Caller's orders", body = ApiResponse<OrderList>)
    ),
    security(("cookie_auth" = [])),
    tag = "Order"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/order/checkout/create-checkout-session",
    request_body = CheckoutSessionRequest,
    responses(
        (status = 200, description = "Hosted session created", body = ApiResponse<CheckoutSessionResponse>),
        (status = 400, description = "Cart mismatch or session creation failure"),
        (status = 404, description = "Restaurant not found")
    ),
    security(("cookie_auth" = [])),
    tag = "Order"
)]
pub async fn create_checkout_session(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CheckoutSessionRequest>,
) -> AppResult<Json<ApiResponse<CheckoutSessionResponse>>> {
    let resp = order_service::create_checkout_session(&state, &user, payload).await?;
    Ok(Json(resp))
}
