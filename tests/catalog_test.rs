//! Catalog listing: visibility, pagination, sorting and session-persisted
//! search and filters.

mod common;

use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

use bazaar_api::entities::DiscountKind;
use common::*;

fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("expected a decimal, got {other}"),
    }
}

fn item_slugs(listing: &Value) -> Vec<&str> {
    listing["items"]
        .as_array()
        .expect("items array")
        .iter()
        .map(|i| i["slug"].as_str().expect("slug"))
        .collect()
}

/// Five purchasable products across two pages, plus an archived one and an
/// offerless one that must never show up.
async fn seed_storefront(app: &TestApp) -> Uuid {
    let cat = seed_category(&app.db, "Electronics", "electronics").await;
    for (name, slug, price) in [
        ("Phone", "phone", "100.00"),
        ("Laptop", "laptop", "500.00"),
        ("Tablet", "tablet", "250.00"),
        ("Watch", "watch", "50.00"),
        ("Camera", "camera", "300.00"),
    ] {
        seed_offered_product(&app.db, cat.id, name, slug, price).await;
    }

    let archived = seed_product_full(&app.db, cat.id, "Old Phone", "old-phone", 0, true).await;
    let seller = seed_seller(&app.db, "Clearance", "clearance").await;
    seed_offer(&app.db, archived.id, seller.id, price("10.00"), 5).await;

    seed_product(&app.db, cat.id, "Ghost", "ghost").await;

    cat.id
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn listing_hides_archived_and_offerless_products() {
    let app = TestApp::spawn().await;
    seed_storefront(&app).await;

    let (status, listing) = app.get("/api/v1/catalog").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["pagination"]["total_items"], 5);
    assert_eq!(listing["pagination"]["total_pages"], 2);
    assert_eq!(listing["items"].as_array().unwrap().len(), TEST_PAGE_SIZE as usize);

    let slugs = item_slugs(&listing);
    assert!(!slugs.contains(&"old-phone"));
    assert!(!slugs.contains(&"ghost"));
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn bad_page_numbers_clamp_instead_of_failing() {
    let app = TestApp::spawn().await;
    seed_storefront(&app).await;

    let (status, listing) = app.get("/api/v1/catalog?p=abc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["pagination"]["page"], 1);

    let (status, listing) = app.get("/api/v1/catalog?p=0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["pagination"]["page"], 1);

    let (status, listing) = app.get("/api/v1/catalog?p=999").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["pagination"]["page"], 2);
    assert_eq!(listing["items"].as_array().unwrap().len(), 1);
    assert_eq!(listing["pagination"]["has_next"], false);
    assert_eq!(listing["pagination"]["has_prev"], true);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn sort_sticks_to_the_session_until_cleared() {
    let app = TestApp::spawn().await;
    seed_storefront(&app).await;
    let sid = "catalog-sort-session";

    // Bare pri sorts by cheapest offer, ascending.
    let (status, listing) = app
        .get_with_session("/api/v1/catalog?sort=pri", sid)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["sort"], "pri");
    assert_eq!(item_slugs(&listing), vec!["watch", "phone", "tablet", "camera"]);

    // A follow-up visit without a sort parameter keeps the stored one.
    let (status, listing) = app.get_with_session("/api/v1/catalog", sid).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["sort"], "pri");
    assert_eq!(item_slugs(&listing), vec!["watch", "phone", "tablet", "camera"]);

    // An unknown code changes nothing.
    let (_, listing) = app
        .get_with_session("/api/v1/catalog?sort=bogus", sid)
        .await;
    assert_eq!(listing["sort"], "pri");

    // `none` clears the stored sort.
    let (_, listing) = app
        .get_with_session("/api/v1/catalog?sort=none", sid)
        .await;
    assert_eq!(listing["sort"], Value::Null);
    let (_, listing) = app.get_with_session("/api/v1/catalog", sid).await;
    assert_eq!(listing["sort"], Value::Null);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn minus_prefixed_sort_codes_run_descending() {
    let app = TestApp::spawn().await;
    seed_storefront(&app).await;

    let (status, listing) = app
        .get_with_session("/api/v1/catalog?sort=-pri", "catalog-sort-desc")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["sort"], "-pri");
    assert_eq!(
        item_slugs(&listing),
        vec!["laptop", "camera", "tablet", "phone"]
    );
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn search_persists_until_a_plain_visit() {
    let app = TestApp::spawn().await;
    seed_storefront(&app).await;
    let sid = "catalog-search-session";

    let (status, listing) = app
        .request_json(
            Method::POST,
            "/api/v1/catalog",
            Some(json!({ "search": "phone" })),
            Some(sid),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["search"], "phone");
    assert_eq!(item_slugs(&listing), vec!["phone"]);

    // A paged visit is not a plain one; the search survives.
    let (_, listing) = app.get_with_session("/api/v1/catalog?p=1", sid).await;
    assert_eq!(listing["search"], "phone");
    assert_eq!(item_slugs(&listing), vec!["phone"]);

    // A plain visit resets search and filters.
    let (_, listing) = app.get_with_session("/api/v1/catalog", sid).await;
    assert_eq!(listing["search"], Value::Null);
    assert_eq!(listing["pagination"]["total_items"], 5);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn a_sorted_visit_without_paging_also_resets_the_search() {
    let app = TestApp::spawn().await;
    seed_storefront(&app).await;
    let sid = "catalog-sorted-reset";

    let (_, listing) = app
        .request_json(
            Method::POST,
            "/api/v1/catalog",
            Some(json!({ "search": "phone" })),
            Some(sid),
            None,
        )
        .await;
    assert_eq!(item_slugs(&listing), vec!["phone"]);

    // Only a `p` parameter carries the stored search forward; changing the
    // sort does not.
    let (_, listing) = app.get_with_session("/api/v1/catalog?sort=pri", sid).await;
    assert_eq!(listing["search"], Value::Null);
    assert_eq!(listing["pagination"]["total_items"], 5);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn price_and_stock_filters_narrow_the_listing() {
    let app = TestApp::spawn().await;
    let cat_id = seed_storefront(&app).await;

    let sold_out = seed_product(&app.db, cat_id, "Sold Out", "sold-out").await;
    let seller = seed_seller(&app.db, "Empty Shelf", "empty-shelf").await;
    seed_offer(&app.db, sold_out.id, seller.id, price("120.00"), 0).await;

    let (status, listing) = app
        .request_json(
            Method::POST,
            "/api/v1/catalog",
            Some(json!({ "price": "100;300" })),
            Some("filter-session"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let mut slugs = item_slugs(&listing);
    slugs.sort_unstable();
    assert_eq!(slugs, vec!["camera", "phone", "sold-out", "tablet"]);

    let (status, listing) = app
        .request_json(
            Method::POST,
            "/api/v1/catalog",
            Some(json!({ "price": "100;300", "in_stock": true })),
            Some("filter-session-2"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let mut slugs = item_slugs(&listing);
    slugs.sort_unstable();
    assert_eq!(slugs, vec!["camera", "phone", "tablet"]);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn tag_scope_limits_the_listing() {
    let app = TestApp::spawn().await;
    let cat = seed_category(&app.db, "Audio", "audio").await;
    let (tagged, _) = seed_offered_product(&app.db, cat.id, "Headphones", "headphones", "80.00").await;
    seed_offered_product(&app.db, cat.id, "Speaker", "speaker", "60.00").await;

    let tag = seed_tag(&app.db, "Wireless", "wireless").await;
    attach_tag(&app.db, tagged.id, tag.id).await;

    let (status, listing) = app.get("/api/v1/catalog/t/wireless").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item_slugs(&listing), vec!["headphones"]);
    let tags = listing["items"][0]["tags"].as_array().unwrap();
    assert_eq!(tags, &[Value::String("Wireless".into())]);

    // Unknown tags simply match nothing.
    let (status, listing) = app.get("/api/v1/catalog/t/no-such-tag").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["pagination"]["total_items"], 0);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn category_scope_covers_direct_subcategories() {
    let app = TestApp::spawn().await;
    let parent = seed_category(&app.db, "Computers", "computers").await;
    let child = seed_subcategory(&app.db, "Laptops", "laptops", Some(parent.id)).await;
    let other = seed_category(&app.db, "Garden", "garden").await;

    seed_offered_product(&app.db, parent.id, "Desktop", "desktop", "900.00").await;
    seed_offered_product(&app.db, child.id, "Ultrabook", "ultrabook", "1200.00").await;
    seed_offered_product(&app.db, other.id, "Shovel", "shovel", "25.00").await;

    let (status, listing) = app.get("/api/v1/catalog/category/computers").await;
    assert_eq!(status, StatusCode::OK);
    let mut slugs = item_slugs(&listing);
    slugs.sort_unstable();
    assert_eq!(slugs, vec!["desktop", "ultrabook"]);

    let (status, _) = app.get("/api/v1/catalog/category/no-such-category").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn sale_scope_lists_discounted_products_with_cut_prices() {
    let app = TestApp::spawn().await;
    let cat = seed_category(&app.db, "Kitchen", "kitchen").await;
    let (on_sale, _) = seed_offered_product(&app.db, cat.id, "Kettle", "kettle", "100.00").await;
    seed_offered_product(&app.db, cat.id, "Toaster", "toaster", "70.00").await;

    let sale = seed_discount(
        &app.db,
        "Spring Sale",
        "spring-sale",
        DiscountKind::Percent,
        price("10"),
        1,
    )
    .await;
    attach_discount_to_product(&app.db, sale.id, on_sale.id).await;

    let (status, listing) = app.get("/api/v1/catalog/sale/spring-sale").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item_slugs(&listing), vec!["kettle"]);

    let item = &listing["items"][0];
    assert_eq!(dec(&item["price"]), price("100.00"));
    assert_eq!(dec(&item["discounted_price"]), price("90.00"));

    let (status, _) = app.get("/api/v1/catalog/sale/no-such-sale").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[cfg_attr(not(feature = "mock-tests"), ignore)]
async fn expired_sales_do_not_scope_the_catalog() {
    let app = TestApp::spawn().await;
    let cat = seed_category(&app.db, "Outdoor", "outdoor").await;
    let (product, _) = seed_offered_product(&app.db, cat.id, "Grill", "grill", "200.00").await;

    let sale = seed_expired_discount(&app.db, "Summer Sale", "summer-sale").await;
    attach_discount_to_product(&app.db, sale.id, product.id).await;

    let (status, _) = app.get("/api/v1/catalog/sale/summer-sale").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
