mod support;

use std::sync::Arc;

use axum_food_delivery_api::{
    dto::restaurants::SearchFilters, services::restaurant_service,
};

use support::FakePayments;

fn filters(query: Option<&str>, cuisines: Option<&str>) -> SearchFilters {
    SearchFilters {
        search_query: query.map(str::to_string),
        selected_cuisines: cuisines.map(str::to_string),
    }
}

fn names(restaurants: &[axum_food_delivery_api::models::Restaurant]) -> Vec<&str> {
    restaurants.iter().map(|r| r.name.as_str()).collect()
}

// Filter composition: text filters union, cuisine membership intersects.
#[tokio::test]
async fn search_filter_composition() -> anyhow::Result<()> {
    let Some(database_url) = support::database_url() else {
        eprintln!(
            "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
        );
        return Ok(());
    };

    let state = support::setup_state(&database_url, Arc::new(FakePayments::default())).await?;

    let owner_a = support::create_user(&state, "operator", "a@example.com").await?;
    let owner_b = support::create_user(&state, "operator", "b@example.com").await?;
    let owner_c = support::create_user(&state, "operator", "c@example.com").await?;

    support::create_restaurant(&state, owner_a, "Bangkok Corner", "London", &["thai", "noodles"])
        .await?;
    support::create_restaurant(&state, owner_b, "Taco Town", "Leeds", &["mexican"]).await?;
    support::create_restaurant(&state, owner_c, "Thai Garden", "Manchester", &["thai"]).await?;

    // No filters at all returns everything.
    let all = restaurant_service::search_restaurants(&state, "", filters(None, None))
        .await?
        .data
        .unwrap();
    assert_eq!(all.len(), 3);

    // Path text matches name or city, case-insensitively.
    let by_city = restaurant_service::search_restaurants(&state, "london", filters(None, None))
        .await?
        .data
        .unwrap();
    assert_eq!(names(&by_city), vec!["Bangkok Corner"]);

    // The free query also matches cuisine tags.
    let by_cuisine_text =
        restaurant_service::search_restaurants(&state, "", filters(Some("thai"), None))
            .await?
            .data
            .unwrap();
    let mut found = names(&by_cuisine_text);
    found.sort_unstable();
    assert_eq!(found, vec!["Bangkok Corner", "Thai Garden"]);

    // Exact cuisine membership narrows the result set.
    let by_membership =
        restaurant_service::search_restaurants(&state, "", filters(None, Some("mexican")))
            .await?
            .data
            .unwrap();
    assert_eq!(names(&by_membership), vec!["Taco Town"]);

    // Text union then cuisine intersection: "thai" matches two restaurants,
    // the membership filter keeps only the one serving noodles.
    let composed = restaurant_service::search_restaurants(
        &state,
        "",
        filters(Some("thai"), Some("noodles")),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(names(&composed), vec!["Bangkok Corner"]);

    // Nothing matching is an empty list, not an error.
    let empty = restaurant_service::search_restaurants(&state, "nowhere", filters(None, None))
        .await?
        .data
        .unwrap();
    assert!(empty.is_empty());

    Ok(())
}
