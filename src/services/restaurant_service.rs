use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::OrderList,
    dto::restaurants::{RestaurantWithMenus, SearchFilters, UpdateOrderStatusRequest},
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        restaurants::{
            ActiveModel as RestaurantActive, Column as RestaurantCol, Entity as Restaurants,
            Model as RestaurantModel,
        },
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ROLE_OPERATOR, ensure_operator},
    middleware::upload::{UploadedImage, require_field},
    models::{ORDER_STATUSES, Order, Restaurant},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{auth_service, menu_service, order_service},
    state::AppState,
};

pub async fn create_restaurant(
    state: &AppState,
    user: &AuthUser,
    fields: HashMap<String, String>,
    image: Option<UploadedImage>,
) -> AppResult<(ApiResponse<Restaurant>, String)> {
    let existing = Restaurants::find()
        .filter(RestaurantCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "Restaurant already exists for this user".to_string(),
        ));
    }

    let name = require_field(&fields, "resturantName")?.to_string();
    let city = require_field(&fields, "city")?.to_string();
    let delivery_time = parse_delivery_time(require_field(&fields, "deliveryTime")?)?;
    let cuisines = parse_cuisines(require_field(&fields, "cuisines")?)?;

    let image = image.ok_or_else(|| AppError::BadRequest("Image is required".to_string()))?;
    let image_url = state
        .images
        .upload_image(&image.filename, image.bytes)
        .await?;

    let restaurant = RestaurantActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        name: Set(name),
        city: Set(city),
        delivery_time: Set(delivery_time),
        cuisines: Set(cuisines),
        image_url: Set(image_url),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    // Creating a restaurant makes the caller an operator; the route re-issues
    // the auth cookie so the new claim takes effect immediately.
    promote_to_operator(state, user.user_id).await?;
    let token = auth_service::issue_token(user.user_id, ROLE_OPERATOR, &auth_service::jwt_secret()?)?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "restaurant_create",
        Some("restaurants"),
        Some(serde_json::json!({ "restaurant_id": restaurant.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok((
        ApiResponse::success(
            "Restaurant added",
            restaurant_from_entity(restaurant),
            Some(Meta::empty()),
        ),
        token,
    ))
}

pub async fn get_own_restaurant(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Restaurant>> {
    let restaurant = Restaurants::find()
        .filter(RestaurantCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;
    let restaurant = match restaurant {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    Ok(ApiResponse::success(
        "Restaurant found",
        restaurant_from_entity(restaurant),
        None,
    ))
}

pub async fn update_restaurant(
    state: &AppState,
    user: &AuthUser,
    fields: HashMap<String, String>,
    image: Option<UploadedImage>,
) -> AppResult<ApiResponse<Restaurant>> {
    let restaurant = Restaurants::find()
        .filter(RestaurantCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;
    let restaurant = match restaurant {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    let mut active: RestaurantActive = restaurant.into();
    if let Some(name) = fields.get("resturantName").filter(|v| !v.is_empty()) {
        active.name = Set(name.clone());
    }
    if let Some(city) = fields.get("city").filter(|v| !v.is_empty()) {
        active.city = Set(city.clone());
    }
    if let Some(delivery_time) = fields.get("deliveryTime").filter(|v| !v.is_empty()) {
        active.delivery_time = Set(parse_delivery_time(delivery_time)?);
    }
    if let Some(cuisines) = fields.get("cuisines").filter(|v| !v.is_empty()) {
        active.cuisines = Set(parse_cuisines(cuisines)?);
    }
    if let Some(image) = image {
        let image_url = state
            .images
            .upload_image(&image.filename, image.bytes)
            .await?;
        active.image_url = Set(image_url);
    }
    active.updated_at = Set(Utc::now().into());
    let restaurant = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "restaurant_update",
        Some("restaurants"),
        Some(serde_json::json!({ "restaurant_id": restaurant.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Restaurant updated",
        restaurant_from_entity(restaurant),
        Some(Meta::empty()),
    ))
}

pub async fn list_restaurant_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_operator(user)?;
    let restaurant = Restaurants::find()
        .filter(RestaurantCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;
    let restaurant = match restaurant {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::RestaurantId.eq(restaurant.id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_service::order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Restricted to the operator of the restaurant the order belongs to; the
/// ownership check is a hard contract, not a courtesy.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_operator(user)?;
    validate_order_status(&payload.status)?;

    let order = Orders::find_by_id(order_id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let restaurant = Restaurants::find_by_id(order.restaurant_id)
        .one(&state.orm)
        .await?;
    let restaurant = match restaurant {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };
    if restaurant.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    let mut active: OrderActive = order.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Status updated",
        order_service::order_from_entity(order),
        Some(Meta::empty()),
    ))
}

/// Text filters union together; the cuisine filter then narrows the result.
/// No match is an empty list, never an error.
pub async fn search_restaurants(
    state: &AppState,
    search_text: &str,
    filters: SearchFilters,
) -> AppResult<ApiResponse<Vec<Restaurant>>> {
    let mut condition = Condition::all();

    let mut text_filters = Condition::any();
    let mut has_text_filter = false;
    if !search_text.trim().is_empty() {
        let pattern = format!("%{}%", search_text.trim());
        text_filters = text_filters
            .add(Expr::col(RestaurantCol::Name).ilike(pattern.clone()))
            .add(Expr::col(RestaurantCol::City).ilike(pattern));
        has_text_filter = true;
    }
    if let Some(query) = filters.search_query.as_ref().filter(|q| !q.trim().is_empty()) {
        let pattern = format!("%{}%", query.trim());
        text_filters = text_filters
            .add(Expr::col(RestaurantCol::Name).ilike(pattern.clone()))
            .add(Expr::cust_with_values(
                "array_to_string(cuisines, ',') ILIKE ?",
                [pattern],
            ));
        has_text_filter = true;
    }
    if has_text_filter {
        condition = condition.add(text_filters);
    }

    let selected: Vec<String> = filters
        .selected_cuisines
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    if !selected.is_empty() {
        let mut membership = Condition::any();
        for cuisine in selected {
            membership = membership.add(Expr::cust_with_values("? = ANY(cuisines)", [cuisine]));
        }
        condition = condition.add(membership);
    }

    let restaurants = Restaurants::find()
        .filter(condition)
        .order_by_desc(RestaurantCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(restaurant_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Restaurants",
        restaurants,
        Some(Meta::empty()),
    ))
}

pub async fn get_single_restaurant(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<RestaurantWithMenus>> {
    let restaurant = Restaurants::find_by_id(id).one(&state.orm).await?;
    let restaurant = match restaurant {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    let menus = order_service::live_menus(state, restaurant.id)
        .await?
        .into_iter()
        .map(menu_service::menu_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Restaurant found",
        RestaurantWithMenus {
            restaurant: restaurant_from_entity(restaurant),
            menus,
        },
        None,
    ))
}

async fn promote_to_operator(state: &AppState, user_id: Uuid) -> AppResult<()> {
    let user = Users::find_by_id(user_id).one(&state.orm).await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };
    if user.role == ROLE_OPERATOR {
        return Ok(());
    }

    let mut active: UserActive = user.into();
    active.role = Set(ROLE_OPERATOR.to_string());
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;
    Ok(())
}

fn validate_order_status(status: &str) -> Result<(), AppError> {
    if ORDER_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid order status".into()))
    }
}

fn parse_delivery_time(raw: &str) -> AppResult<i32> {
    raw.parse::<i32>()
        .map_err(|_| AppError::BadRequest("deliveryTime must be a number".to_string()))
}

fn parse_cuisines(raw: &str) -> AppResult<Vec<String>> {
    serde_json::from_str::<Vec<String>>(raw)
        .map_err(|_| AppError::BadRequest("cuisines must be a JSON array of strings".to_string()))
}

pub(crate) fn restaurant_from_entity(model: RestaurantModel) -> Restaurant {
    Restaurant {
        id: model.id,
        user_id: model.user_id,
        name: model.name,
        city: model.city,
        delivery_time: model.delivery_time,
        cuisines: model.cuisines,
        image_url: model.image_url,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_five_statuses_pass_validation() {
        for status in ORDER_STATUSES {
            assert!(validate_order_status(status).is_ok());
        }
        for status in ["paid", "shipped", "Pending", "outfordelivery", ""] {
            assert!(
                validate_order_status(status).is_err(),
                "{status:?} should be rejected"
            );
        }
    }

    #[test]
    fn cuisines_field_must_be_json_array() {
        assert_eq!(
            parse_cuisines(r#"["thai","italian"]"#).unwrap(),
            vec!["thai".to_string(), "italian".to_string()]
        );
        assert!(parse_cuisines("thai,italian").is_err());
    }

    #[test]
    fn delivery_time_must_be_numeric() {
        assert_eq!(parse_delivery_time("30").unwrap(), 30);
        assert!(parse_delivery_time("half an hour").is_err());
    }
}
