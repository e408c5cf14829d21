use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{ApiKey, ApiKeyValue, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth as auth_dto,
        menus::MenuForm,
        orders::{CheckoutSessionRequest, CheckoutSessionResponse, OrderList},
        restaurants::{RestaurantForm, RestaurantWithMenus, SearchFilters, UpdateOrderStatusRequest},
    },
    models::{CartLine, DeliveryDetails, MenuItem, Order, Restaurant, User},
    response::{ApiResponse, Meta},
    routes::{auth, health, menus, orders, params, restaurants},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "cookie_auth",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("token"))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::signup,
        auth::login,
        auth::logout,
        auth::verify_email,
        auth::forgot_password,
        auth::reset_password,
        auth::check_auth,
        auth::update_profile,
        restaurants::create_restaurant,
        restaurants::get_restaurant,
        restaurants::update_restaurant,
        restaurants::list_restaurant_orders,
        restaurants::update_order_status,
        restaurants::search_restaurants,
        restaurants::get_single_restaurant,
        menus::add_menu,
        menus::edit_menu,
        orders::list_orders,
        orders::create_checkout_session
    ),
    components(
        schemas(
            User,
            Restaurant,
            MenuItem,
            Order,
            CartLine,
            DeliveryDetails,
            auth_dto::SignupRequest,
            auth_dto::LoginRequest,
            auth_dto::VerifyEmailRequest,
            auth_dto::ForgotPasswordRequest,
            auth_dto::ResetPasswordRequest,
            auth_dto::UpdateProfileRequest,
            RestaurantForm,
            RestaurantWithMenus,
            SearchFilters,
            UpdateOrderStatusRequest,
            MenuForm,
            CheckoutSessionRequest,
            CheckoutSessionResponse,
            OrderList,
            params::Pagination,
            params::OrderListQuery,
            Meta,
            ApiResponse<User>,
            ApiResponse<Restaurant>,
            ApiResponse<RestaurantWithMenus>,
            ApiResponse<MenuItem>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<CheckoutSessionResponse>
        )
    ),
    security(
        ("cookie_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "User", description = "Account and session endpoints"),
        (name = "Restaurant", description = "Restaurant and order-management endpoints"),
        (name = "Menu", description = "Menu item endpoints"),
        (name = "Order", description = "Ordering and checkout endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
