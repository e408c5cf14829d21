use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{MenuItem, Restaurant};

/// Multipart form for creating/updating a restaurant. Field names match the
/// original API surface; `cuisines` is a JSON-encoded string array.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantForm {
    #[serde(rename = "resturantName")]
    pub resturant_name: String,
    pub city: String,
    pub delivery_time: String,
    pub cuisines: String,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image_file: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    pub search_query: Option<String>,
    /// Comma-separated cuisine names.
    pub selected_cuisines: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantWithMenus {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    pub menus: Vec<MenuItem>,
}
