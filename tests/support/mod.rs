use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Statement};
use uuid::Uuid;

use axum_food_delivery_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    entity::{menus, restaurant_menus, restaurants, users},
    gateways::{
        CheckoutSession, CheckoutSessionParams, GatewayError, ImageStore, Mailer, PaymentGateway,
    },
    state::AppState,
};

pub const FAKE_SESSION_URL: &str = "https://pay.example/c/cs_test_123";

/// Records every session request; returns a url-less session when `fail` is set.
#[derive(Default)]
pub struct FakePayments {
    pub fail: bool,
    pub calls: Mutex<Vec<CheckoutSessionParams>>,
}

#[async_trait]
impl PaymentGateway for FakePayments {
    async fn create_checkout_session(
        &self,
        params: CheckoutSessionParams,
    ) -> Result<CheckoutSession, GatewayError> {
        self.calls.lock().unwrap().push(params);
        if self.fail {
            Ok(CheckoutSession {
                id: "cs_test_failed".to_string(),
                url: None,
            })
        } else {
            Ok(CheckoutSession {
                id: "cs_test_123".to_string(),
                url: Some(FAKE_SESSION_URL.to_string()),
            })
        }
    }
}

pub struct FakeMailer;

#[async_trait]
impl Mailer for FakeMailer {
    async fn send_verification_email(&self, _to: &str, _code: &str) -> Result<(), GatewayError> {
        Ok(())
    }
    async fn send_welcome_email(&self, _to: &str, _name: &str) -> Result<(), GatewayError> {
        Ok(())
    }
    async fn send_password_reset_email(
        &self,
        _to: &str,
        _reset_url: &str,
    ) -> Result<(), GatewayError> {
        Ok(())
    }
    async fn send_reset_success_email(&self, _to: &str) -> Result<(), GatewayError> {
        Ok(())
    }
}

pub struct FakeImages;

#[async_trait]
impl ImageStore for FakeImages {
    async fn upload_image(&self, _filename: &str, _bytes: Vec<u8>) -> Result<String, GatewayError> {
        Ok("https://img.example/upload.png".to_string())
    }
}

pub fn test_config(database_url: &str) -> AppConfig {
    AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        frontend_url: "http://front.example".to_string(),
        cors_origin: "http://front.example".to_string(),
        stripe_secret_key: "sk_test_dummy".to_string(),
        mailtrap_api_token: "mt_dummy".to_string(),
        mailtrap_sender_email: "no-reply@cdyeats.example".to_string(),
        cloudinary_cloud_name: "test-cloud".to_string(),
        cloudinary_upload_preset: "unsigned".to_string(),
    }
}

/// Connect, migrate, and wipe the tables so each flow starts clean.
pub async fn setup_state(
    database_url: &str,
    payments: Arc<FakePayments>,
) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE orders, restaurant_menus, menus, restaurants, audit_logs, users CASCADE",
    ))
    .await?;

    Ok(AppState {
        pool,
        orm,
        config: Arc::new(test_config(database_url)),
        payments,
        mailer: Arc::new(FakeMailer),
        images: Arc::new(FakeImages),
    })
}

pub async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<Uuid> {
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        fullname: Set(email.split('@').next().unwrap_or("user").to_string()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".to_string()),
        contact: Set(0),
        role: Set(role.to_string()),
        is_verified: Set(true),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;
    Ok(user.id)
}

pub async fn create_restaurant(
    state: &AppState,
    user_id: Uuid,
    name: &str,
    city: &str,
    cuisines: &[&str],
) -> anyhow::Result<Uuid> {
    let restaurant = restaurants::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        name: Set(name.to_string()),
        city: Set(city.to_string()),
        delivery_time: Set(30),
        cuisines: Set(cuisines.iter().map(|c| c.to_string()).collect()),
        image_url: Set(format!("https://img.example/{name}.png")),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;
    Ok(restaurant.id)
}

pub async fn create_menu(
    state: &AppState,
    restaurant_id: Uuid,
    name: &str,
    price: i64,
) -> anyhow::Result<Uuid> {
    let menu = menus::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(format!("{name} for testing")),
        price: Set(price),
        image_url: Set(format!("https://img.example/{name}.png")),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    restaurant_menus::ActiveModel {
        restaurant_id: Set(restaurant_id),
        menu_id: Set(menu.id),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    Ok(menu.id)
}

/// Skip DB-backed tests when no database is configured in the environment.
pub fn database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
}
