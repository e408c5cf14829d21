use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{CheckoutSessionRequest, CheckoutSessionResponse, OrderList},
    entity::{
        menus::{Column as MenuCol, Entity as Menus, Model as MenuModel},
        orders::{ActiveModel as OrderActive, CartLines, Column as OrderCol, Entity as Orders, Model as OrderModel},
        restaurant_menus::{Column as RestaurantMenuCol, Entity as RestaurantMenus},
        restaurants::Entity as Restaurants,
    },
    error::{AppError, AppResult},
    gateways::{CheckoutSessionParams, PaymentLineItem},
    middleware::auth::AuthUser,
    models::{CartLine, DeliveryDetails, Order},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
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
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Checkout orchestration. Prices come exclusively from the live catalog,
/// and the order row is written only after the payment provider has handed
/// back a usable redirect URL; a provider failure leaves no trace locally.
pub async fn create_checkout_session(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutSessionRequest,
) -> AppResult<ApiResponse<CheckoutSessionResponse>> {
    validate_delivery_details(&payload.delivery_details)?;
    if payload.cart_items.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let restaurant = Restaurants::find_by_id(payload.restaurant_id)
        .one(&state.orm)
        .await?;
    let restaurant = match restaurant {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };

    let menus = live_menus(state, restaurant.id).await?;
    let line_items = build_line_items(&payload.cart_items, &menus)?;
    let total_amount: i64 = line_items
        .iter()
        .map(|item| item.unit_amount * i64::from(item.quantity))
        .sum();

    // The pending order exists only in memory until the session is created.
    let order_id = Uuid::new_v4();
    let params = CheckoutSessionParams {
        order_id,
        item_images: line_items.iter().map(|item| item.image.clone()).collect(),
        line_items,
        success_url: format!("{}/order/status", state.config.frontend_url),
        cancel_url: format!("{}/cart", state.config.frontend_url),
    };

    let session = state.payments.create_checkout_session(params).await?;
    let url = match session.url {
        Some(url) => url,
        None => {
            return Err(AppError::BadRequest(
                "Error while creating session.".to_string(),
            ));
        }
    };

    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        restaurant_id: Set(restaurant.id),
        delivery_name: Set(payload.delivery_details.name),
        delivery_email: Set(payload.delivery_details.email),
        delivery_address: Set(payload.delivery_details.address),
        delivery_city: Set(payload.delivery_details.city),
        cart_items: Set(CartLines(payload.cart_items)),
        total_amount: Set(total_amount),
        status: Set("pending".to_string()),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "session_id": session.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Checkout session created",
        CheckoutSessionResponse {
            session_id: session.id,
            url,
        },
        Some(Meta::empty()),
    ))
}

/// Expand a restaurant's reference list into live menu records.
pub(crate) async fn live_menus(
    state: &AppState,
    restaurant_id: Uuid,
) -> AppResult<Vec<MenuModel>> {
    let menu_ids: Vec<Uuid> = RestaurantMenus::find()
        .filter(RestaurantMenuCol::RestaurantId.eq(restaurant_id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|row| row.menu_id)
        .collect();

    if menu_ids.is_empty() {
        return Ok(Vec::new());
    }

    let menus = Menus::find()
        .filter(MenuCol::Id.is_in(menu_ids))
        .order_by_desc(MenuCol::CreatedAt)
        .all(&state.orm)
        .await?;
    Ok(menus)
}

/// Pair every cart entry with its live catalog record. Unit prices are taken
/// from the catalog, never from the client-supplied cart line; a cart entry
/// with no catalog match aborts the whole checkout.
fn build_line_items(
    cart_items: &[CartLine],
    menus: &[MenuModel],
) -> AppResult<Vec<PaymentLineItem>> {
    cart_items
        .iter()
        .map(|line| {
            if line.quantity <= 0 {
                return Err(AppError::BadRequest("Cart has invalid quantity".into()));
            }
            let menu = menus
                .iter()
                .find(|menu| menu.id == line.menu_id)
                .ok_or_else(|| {
                    AppError::BadRequest(format!("Menu item {} not found", line.menu_id))
                })?;
            Ok(PaymentLineItem {
                name: menu.name.clone(),
                image: menu.image_url.clone(),
                unit_amount: menu.price,
                quantity: line.quantity,
            })
        })
        .collect()
}

fn validate_delivery_details(details: &DeliveryDetails) -> AppResult<()> {
    for (field, value) in [
        ("deliveryDetails.name", &details.name),
        ("deliveryDetails.email", &details.email),
        ("deliveryDetails.address", &details.address),
        ("deliveryDetails.city", &details.city),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("{field} is required")));
        }
    }
    Ok(())
}

pub(crate) fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        restaurant_id: model.restaurant_id,
        delivery_details: DeliveryDetails {
            name: model.delivery_name,
            email: model.delivery_email,
            address: model.delivery_address,
            city: model.delivery_city,
        },
        cart_items: model.cart_items.0,
        total_amount: model.total_amount,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::prelude::DateTimeWithTimeZone;

    fn menu(id: Uuid, name: &str, price: i64) -> MenuModel {
        let now: DateTimeWithTimeZone = Utc::now().into();
        MenuModel {
            id,
            name: name.to_string(),
            description: "test".to_string(),
            price,
            image_url: format!("https://img.example/{name}.png"),
            created_at: now,
            updated_at: now,
        }
    }

    fn cart_line(menu_id: Uuid, price: i64, quantity: i32) -> CartLine {
        CartLine {
            menu_id,
            name: "client says anything".to_string(),
            image: "client-image".to_string(),
            price,
            quantity,
        }
    }

    #[test]
    fn line_items_price_from_catalog_not_client() {
        let menu_id = Uuid::new_v4();
        let menus = vec![menu(menu_id, "pad-thai", 150)];
        // Client claims the item costs 1.
        let cart = vec![cart_line(menu_id, 1, 2)];

        let items = build_line_items(&cart, &menus).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_amount, 150);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].name, "pad-thai");
    }

    #[test]
    fn unmatched_cart_entry_aborts_everything() {
        let menus = vec![menu(Uuid::new_v4(), "pad-thai", 150)];
        let cart = vec![
            cart_line(menus[0].id, 150, 1),
            cart_line(Uuid::new_v4(), 999, 1),
        ];

        let result = build_line_items(&cart, &menus);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let menu_id = Uuid::new_v4();
        let menus = vec![menu(menu_id, "rolls", 450)];

        for quantity in [0, -1] {
            let result = build_line_items(&[cart_line(menu_id, 450, quantity)], &menus);
            assert!(matches!(result, Err(AppError::BadRequest(_))));
        }
    }

    #[test]
    fn delivery_details_require_every_field() {
        let complete = DeliveryDetails {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            address: "1 Example Way".into(),
            city: "London".into(),
        };
        assert!(validate_delivery_details(&complete).is_ok());

        let mut missing_city = complete.clone();
        missing_city.city = "  ".into();
        assert!(matches!(
            validate_delivery_details(&missing_city),
            Err(AppError::BadRequest(_))
        ));
    }
}
