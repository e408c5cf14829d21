use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod doc;
pub mod health;
pub mod menus;
pub mod orders;
pub mod params;
pub mod restaurants;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/user", auth::router())
        .nest("/resturant", restaurants::router())
        .nest("/menu", menus::router())
        .nest("/order", orders::router())
}
