use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    entity::{
        menus::{ActiveModel as MenuActive, Entity as Menus, Model as MenuModel},
        restaurant_menus::ActiveModel as RestaurantMenuActive,
        restaurants::{Column as RestaurantCol, Entity as Restaurants},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    middleware::upload::{UploadedImage, require_field},
    models::MenuItem,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn add_menu(
    state: &AppState,
    user: &AuthUser,
    fields: HashMap<String, String>,
    image: Option<UploadedImage>,
) -> AppResult<ApiResponse<MenuItem>> {
    let name = require_field(&fields, "name")?.to_string();
    let description = require_field(&fields, "description")?.to_string();
    let price = parse_price(require_field(&fields, "price")?)?;

    let image = image.ok_or_else(|| AppError::BadRequest("Image is required".to_string()))?;
    let image_url = state
        .images
        .upload_image(&image.filename, image.bytes)
        .await?;

    let menu = MenuActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(description),
        price: Set(price),
        image_url: Set(image_url),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    // Menu items are created standalone; the reference list only grows when
    // the caller actually owns a restaurant.
    let restaurant = Restaurants::find()
        .filter(RestaurantCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;
    if let Some(restaurant) = restaurant {
        RestaurantMenuActive {
            restaurant_id: Set(restaurant.id),
            menu_id: Set(menu.id),
            ..Default::default()
        }
        .insert(&state.orm)
        .await?;
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "menu_add",
        Some("menus"),
        Some(serde_json::json!({ "menu_id": menu.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Menu added successfully",
        menu_from_entity(menu),
        Some(Meta::empty()),
    ))
}

pub async fn edit_menu(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    fields: HashMap<String, String>,
    image: Option<UploadedImage>,
) -> AppResult<ApiResponse<MenuItem>> {
    let menu = Menus::find_by_id(id).one(&state.orm).await?;
    let menu = match menu {
        Some(m) => m,
        None => return Err(AppError::NotFound),
    };

    let mut active: MenuActive = menu.into();
    if let Some(name) = fields.get("name").filter(|v| !v.is_empty()) {
        active.name = Set(name.clone());
    }
    if let Some(description) = fields.get("description").filter(|v| !v.is_empty()) {
        active.description = Set(description.clone());
    }
    if let Some(price) = fields.get("price").filter(|v| !v.is_empty()) {
        active.price = Set(parse_price(price)?);
    }
    if let Some(image) = image {
        let image_url = state
            .images
            .upload_image(&image.filename, image.bytes)
            .await?;
        active.image_url = Set(image_url);
    }
    active.updated_at = Set(Utc::now().into());
    let menu = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "menu_edit",
        Some("menus"),
        Some(serde_json::json!({ "menu_id": menu.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Menu Updated",
        menu_from_entity(menu),
        Some(Meta::empty()),
    ))
}

fn parse_price(raw: &str) -> AppResult<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|price| *price >= 0)
        .ok_or_else(|| AppError::BadRequest("price must be a non-negative number".to_string()))
}

pub(crate) fn menu_from_entity(model: MenuModel) -> MenuItem {
    MenuItem {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        image: model.image_url,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_parses_smallest_currency_unit() {
        assert_eq!(parse_price("150").unwrap(), 150);
        assert_eq!(parse_price("0").unwrap(), 0);
    }

    #[test]
    fn price_rejects_garbage_and_negatives() {
        assert!(parse_price("-5").is_err());
        assert!(parse_price("1.50").is_err());
        assert!(parse_price("free").is_err());
    }
}
