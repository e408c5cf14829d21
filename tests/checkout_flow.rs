mod support;

use std::sync::Arc;

use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

use axum_food_delivery_api::{
    dto::orders::CheckoutSessionRequest,
    dto::restaurants::UpdateOrderStatusRequest,
    entity::orders::Entity as Orders,
    error::AppError,
    middleware::auth::AuthUser,
    models::{CartLine, DeliveryDetails},
    services::{order_service, restaurant_service},
};

use support::{FAKE_SESSION_URL, FakePayments};

fn delivery_details() -> DeliveryDetails {
    DeliveryDetails {
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        address: "1 Analytical Way".to_string(),
        city: "London".to_string(),
    }
}

fn cart_line(menu_id: Uuid, price: i64, quantity: i32) -> CartLine {
    CartLine {
        menu_id,
        name: "client label".to_string(),
        image: "client-image".to_string(),
        price,
        quantity,
    }
}

// End-to-end checkout lifecycle: session gating, catalog pricing, snapshot
// persistence, and the operator-only status transition.
#[tokio::test]
async fn checkout_and_status_lifecycle() -> anyhow::Result<()> {
    let Some(database_url) = support::database_url() else {
        eprintln!(
            "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
        );
        return Ok(());
    };

    let payments = Arc::new(FakePayments::default());
    let state = support::setup_state(&database_url, payments.clone()).await?;

    let owner_id = support::create_user(&state, "operator", "owner@example.com").await?;
    let diner_id = support::create_user(&state, "customer", "diner@example.com").await?;
    let rival_id = support::create_user(&state, "operator", "rival@example.com").await?;

    let restaurant_id =
        support::create_restaurant(&state, owner_id, "Bangkok Corner", "London", &["thai"]).await?;
    support::create_restaurant(&state, rival_id, "Rival Diner", "Leeds", &["burgers"]).await?;

    let pad_thai = support::create_menu(&state, restaurant_id, "Pad Thai", 150).await?;
    let rolls = support::create_menu(&state, restaurant_id, "Spring Rolls", 450).await?;

    let diner = AuthUser {
        user_id: diner_id,
        role: "customer".to_string(),
    };
    let owner = AuthUser {
        user_id: owner_id,
        role: "operator".to_string(),
    };
    let rival = AuthUser {
        user_id: rival_id,
        role: "operator".to_string(),
    };

    // Client-supplied prices lie on purpose; the catalog must win.
    let submitted_cart = vec![cart_line(pad_thai, 1, 2), cart_line(rolls, 9_999, 1)];
    let resp = order_service::create_checkout_session(
        &state,
        &diner,
        CheckoutSessionRequest {
            cart_items: submitted_cart.clone(),
            delivery_details: delivery_details(),
            restaurant_id,
        },
    )
    .await?;

    let session = resp.data.expect("session payload");
    assert_eq!(session.url, FAKE_SESSION_URL);

    {
        let calls = payments.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let params = &calls[0];
        assert_eq!(params.line_items.len(), 2);
        assert_eq!(params.line_items[0].unit_amount, 150);
        assert_eq!(params.line_items[0].quantity, 2);
        assert_eq!(params.line_items[1].unit_amount, 450);
        assert_eq!(params.line_items[1].quantity, 1);
        // Metadata images come from the catalog records of the ordered items.
        assert_eq!(params.item_images.len(), 2);
        assert!(params.item_images[0].contains("Pad Thai"));
    }

    assert_eq!(Orders::find().count(&state.orm).await?, 1);
    let order = Orders::find()
        .one(&state.orm)
        .await?
        .expect("persisted order");
    assert_eq!(order.status, "pending");
    assert_eq!(order.user_id, diner_id);
    assert_eq!(order.restaurant_id, restaurant_id);
    assert_eq!(order.total_amount, 150 * 2 + 450);
    // The snapshot records the cart exactly as submitted, lies included.
    assert_eq!(order.cart_items.0, submitted_cart);
    assert_eq!(order.delivery_city, "London");

    // A single unmatched cart entry aborts before any side effect.
    let result = order_service::create_checkout_session(
        &state,
        &diner,
        CheckoutSessionRequest {
            cart_items: vec![cart_line(pad_thai, 150, 1), cart_line(Uuid::new_v4(), 1, 1)],
            delivery_details: delivery_details(),
            restaurant_id,
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
    assert_eq!(Orders::find().count(&state.orm).await?, 1);
    assert_eq!(payments.calls.lock().unwrap().len(), 1);

    // Unknown restaurant is a 404 before the provider is involved.
    let result = order_service::create_checkout_session(
        &state,
        &diner,
        CheckoutSessionRequest {
            cart_items: vec![cart_line(pad_thai, 150, 1)],
            delivery_details: delivery_details(),
            restaurant_id: Uuid::new_v4(),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::NotFound)));
    assert_eq!(payments.calls.lock().unwrap().len(), 1);

    // No redirect URL from the provider means no order row.
    let failing = Arc::new(FakePayments {
        fail: true,
        ..Default::default()
    });
    let mut failing_state = state.clone();
    failing_state.payments = failing.clone();
    let result = order_service::create_checkout_session(
        &failing_state,
        &diner,
        CheckoutSessionRequest {
            cart_items: vec![cart_line(pad_thai, 150, 1)],
            delivery_details: delivery_details(),
            restaurant_id,
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
    assert_eq!(failing.calls.lock().unwrap().len(), 1);
    assert_eq!(Orders::find().count(&state.orm).await?, 1);

    // Status transitions: fixed value set, owner-only.
    let updated = restaurant_service::update_order_status(
        &state,
        &owner,
        order.id,
        UpdateOrderStatusRequest {
            status: "preparing".to_string(),
        },
    )
    .await?;
    let updated = updated.data.expect("updated order");
    assert_eq!(updated.status, "preparing");
    assert_eq!(updated.cart_items, submitted_cart);
    assert_eq!(updated.delivery_details, delivery_details());
    assert_eq!(updated.total_amount, 150 * 2 + 450);

    let result = restaurant_service::update_order_status(
        &state,
        &owner,
        order.id,
        UpdateOrderStatusRequest {
            status: "shipped".to_string(),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let result = restaurant_service::update_order_status(
        &state,
        &rival,
        order.id,
        UpdateOrderStatusRequest {
            status: "delivered".to_string(),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::Forbidden)));

    let result = restaurant_service::update_order_status(
        &state,
        &diner,
        order.id,
        UpdateOrderStatusRequest {
            status: "delivered".to_string(),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::Forbidden)));

    let result = restaurant_service::update_order_status(
        &state,
        &owner,
        Uuid::new_v4(),
        UpdateOrderStatusRequest {
            status: "delivered".to_string(),
        },
    )
    .await;
    assert!(matches!(result, Err(AppError::NotFound)));

    Ok(())
}
