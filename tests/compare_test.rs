//! Comparison list: session scoping, the size cap, method gating and the
//! property diff table.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::Value;

use common::*;

const SID: &str = "compare-session";

async fn add(app: &TestApp, slug: &str) -> (StatusCode, Value) {
    app.request_json(
        Method::POST,
        &format!("/api/v1/compare/add/{slug}"),
        None,
        Some(SID),
        None,
    )
    .await
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn compare_requires_a_session_header() {
    let app = TestApp::spawn().await;
    let (status, _) = app.get("/api/v1/compare").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn wrong_verbs_on_mutating_routes_get_a_plain_denial() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .request(Method::GET, "/api/v1/compare/add/phone", None, Some(SID), None)
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, b"access denied");

    let (status, body) = app
        .request(Method::POST, "/api/v1/compare/delete_all", None, Some(SID), None)
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, b"access denied");
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn list_grows_dedupes_and_stops_at_the_cap() {
    let app = TestApp::spawn().await;
    let cat = seed_category(&app.db, "Phones", "phones").await;
    for i in 1..=5 {
        seed_offered_product(&app.db, cat.id, &format!("Phone {i}"), &format!("phone-{i}"), "100.00")
            .await;
    }

    for (i, expected) in (1..=4).zip(1..=4) {
        let (status, body) = add(&app, &format!("phone-{i}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["amt"], expected);
    }

    // Re-adding is a no-op, not an error.
    let (status, body) = add(&app, "phone-1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amt"], 4);

    // The fifth distinct product does not fit.
    let (status, _) = add(&app, "phone-5").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, amt) = app.get_with_session("/api/v1/compare/amt", SID).await;
    assert_eq!(amt["amt"], 4);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn unknown_products_cannot_be_compared() {
    let app = TestApp::spawn().await;
    let (status, _) = add(&app, "no-such-product").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn diff_table_folds_case_and_flags_missing_properties() {
    let app = TestApp::spawn().await;
    let cat = seed_category(&app.db, "Laptops", "laptops").await;
    let (left, _) = seed_offered_product(&app.db, cat.id, "Book Air", "book-air", "999.00").await;
    let (right, _) = seed_offered_product(&app.db, cat.id, "Book Pro", "book-pro", "1999.00").await;

    let color = seed_property(&app.db, cat.id, "Color").await;
    let ram = seed_property(&app.db, cat.id, "RAM").await;
    let ports = seed_property(&app.db, cat.id, "Ports").await;

    // Color matches up to casing, RAM differs, Ports exists on one side only.
    set_property_value(&app.db, left.id, color.id, "Silver").await;
    set_property_value(&app.db, right.id, color.id, "silver").await;
    set_property_value(&app.db, left.id, ram.id, "8 GB").await;
    set_property_value(&app.db, right.id, ram.id, "16 GB").await;
    set_property_value(&app.db, right.id, ports.id, "2x USB-C").await;

    add(&app, "book-air").await;
    add(&app, "book-pro").await;

    let (status, table) = app.get_with_session("/api/v1/compare", SID).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(table["all_different"], false);
    assert_eq!(table["mixed_categories"], false);

    let products = table["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    // Insertion order, not alphabetical.
    assert_eq!(products[0]["slug"], "book-air");
    assert_eq!(products[1]["slug"], "book-pro");

    let common_names: Vec<&str> = products[0]["common"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(common_names, vec!["Color"]);

    let mut different_names: Vec<&str> = products[1]["different"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    different_names.sort_unstable();
    assert_eq!(different_names, vec!["Ports", "RAM"]);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn single_product_tables_are_not_all_different() {
    let app = TestApp::spawn().await;
    let cat = seed_category(&app.db, "Solo", "solo").await;
    seed_offered_product(&app.db, cat.id, "Only One", "only-one", "10.00").await;

    add(&app, "only-one").await;
    let (status, table) = app.get_with_session("/api/v1/compare", SID).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(table["all_different"], false);
    assert_eq!(table["products"].as_array().unwrap().len(), 1);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn cross_category_tables_are_flagged() {
    let app = TestApp::spawn().await;
    let phones = seed_category(&app.db, "Phones", "phones").await;
    let fridges = seed_category(&app.db, "Fridges", "fridges").await;
    seed_offered_product(&app.db, phones.id, "Phone", "phone", "100.00").await;
    seed_offered_product(&app.db, fridges.id, "Fridge", "fridge", "700.00").await;

    add(&app, "phone").await;
    add(&app, "fridge").await;

    let (_, table) = app.get_with_session("/api/v1/compare", SID).await;
    assert_eq!(table["mixed_categories"], true);
    // Nothing shared across categories without properties in common.
    assert_eq!(table["all_different"], true);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn remove_and_clear_shrink_the_list() {
    let app = TestApp::spawn().await;
    let cat = seed_category(&app.db, "Stuff", "stuff").await;
    seed_offered_product(&app.db, cat.id, "A", "a", "1.00").await;
    seed_offered_product(&app.db, cat.id, "B", "b", "2.00").await;

    add(&app, "a").await;
    add(&app, "b").await;

    let (status, body) = app
        .request_json(Method::DELETE, "/api/v1/compare/delete/a", None, Some(SID), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amt"], 1);

    let (status, body) = app
        .request_json(Method::DELETE, "/api/v1/compare/delete_all", None, Some(SID), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amt"], 0);

    let (_, table) = app.get_with_session("/api/v1/compare", SID).await;
    assert!(table["products"].as_array().unwrap().is_empty());
}
