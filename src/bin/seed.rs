use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_food_delivery_api::db::create_pool;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")?;

    let pool = create_pool(&database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let operator_id = ensure_user(&pool, "owner@example.com", "owner123", "operator").await?;
    let diner_id = ensure_user(&pool, "diner@example.com", "diner123", "customer").await?;
    let restaurant_id = ensure_restaurant(&pool, operator_id).await?;
    seed_menus(&pool, restaurant_id).await?;

    println!("Seed completed. Operator ID: {operator_id}, Diner ID: {diner_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, fullname, email, password_hash, role, is_verified)
        VALUES ($1, $2, $3, $4, $5, TRUE)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email.split('@').next().unwrap_or("Seed User"))
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If the user already exists, fetch the id.
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn ensure_restaurant(pool: &sqlx::PgPool, user_id: Uuid) -> anyhow::Result<Uuid> {
    let cuisines: Vec<String> = vec!["thai".into(), "noodles".into()];
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO restaurants (id, user_id, name, city, delivery_time, cuisines, image_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (user_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind("Bangkok Corner")
    .bind("London")
    .bind(35)
    .bind(&cuisines)
    .bind("https://img.example/bangkok-corner.png")
    .fetch_optional(pool)
    .await?;

    let restaurant_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) =
                sqlx::query_as("SELECT id FROM restaurants WHERE user_id = $1")
                    .bind(user_id)
                    .fetch_one(pool)
                    .await?;
            existing.0
        }
    };

    println!("Ensured restaurant Bangkok Corner");
    Ok(restaurant_id)
}

async fn seed_menus(pool: &sqlx::PgPool, restaurant_id: Uuid) -> anyhow::Result<()> {
    let menus = vec![
        ("Pad Thai", "Rice noodles with tamarind and peanuts", 1250_i64),
        ("Green Curry", "Coconut curry with thai basil", 1450),
        ("Spring Rolls", "Crispy vegetable rolls", 550),
    ];

    for (name, description, price) in menus {
        let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM menus WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await?;
        if existing.is_some() {
            continue;
        }

        let menu_id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO menus (id, name, description, price, image_url)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(menu_id)
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(format!(
            "https://img.example/{}.png",
            name.to_lowercase().replace(' ', "-")
        ))
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO restaurant_menus (restaurant_id, menu_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(restaurant_id)
        .bind(menu_id)
        .execute(pool)
        .await?;
    }

    println!("Seeded menus");
    Ok(())
}
