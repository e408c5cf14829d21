use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{CartLine, DeliveryDetails, Order};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionRequest {
    pub cart_items: Vec<CartLine>,
    pub delivery_details: DeliveryDetails,
    #[serde(rename = "resturantId")]
    pub restaurant_id: uuid::Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
