use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// The fixed order status progression. Operators may set any of these values;
/// anything else is rejected.
pub const ORDER_STATUSES: [&str; 5] = [
    "pending",
    "confirmed",
    "preparing",
    "outForDelivery",
    "delivered",
];

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub contact: i64,
    pub address: String,
    pub city: String,
    pub profile_picture: String,
    pub role: String,
    pub is_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: Uuid,
    pub user_id: Uuid,
    // Wire name kept from the original API surface.
    #[serde(rename = "resturantName")]
    pub name: String,
    pub city: String,
    pub delivery_time: i32,
    pub cuisines: Vec<String>,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where the order goes; captured once at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDetails {
    pub name: String,
    pub email: String,
    pub address: String,
    pub city: String,
}

/// One line of the frozen cart snapshot recorded on an order. The `price`
/// here is whatever the client submitted; payment line items are priced from
/// the catalog instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub menu_id: Uuid,
    pub name: String,
    pub image: String,
    pub price: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub restaurant_id: Uuid,
    pub delivery_details: DeliveryDetails,
    pub cart_items: Vec<CartLine>,
    pub total_amount: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
