use serde::Deserialize;
use utoipa::ToSchema;

/// Multipart form for adding or editing a menu item. On edit every field is
/// optional; absent fields keep their current value.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MenuForm {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Price in the smallest currency unit.
    pub price: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<String>,
}
