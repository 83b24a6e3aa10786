use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::DiscountKind;
use crate::errors::ErrorResponse;
use crate::handlers;
use crate::services::cart::{CartAmount, CartChange, CartLine, CartSummary};
use crate::services::catalog::{CatalogItem, CatalogListing, CatalogSubmission, PageInfo};
use crate::services::categories::{CategoryChild, CategoryNode, CreateCategoryInput};
use crate::services::compare::{CompareAmount, ComparedProduct, ComparedProperty, CompareTable};
use crate::services::discounts::SaleSummary;
use crate::services::history::HistoryEntry;
use crate::services::pricing::PriceStats;
use crate::services::products::{OfferView, ProductDetail, PropertyView};
use crate::services::sellers::{SellerCard, SellerProduct};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bazaar API",
        version = "0.1.0",
        description = r#"
Marketplace backend: catalog browsing with filters and sorting, product
comparison, per-user shopping carts, seller offers and discount pricing.

Visitor state (sort, search, filters, comparison list) is keyed by the
`x-session-id` header; user-scoped operations (cart, reviews, history)
take the user's UUID from `x-user-id`.
"#
    ),
    paths(
        handlers::catalog::list_catalog,
        handlers::catalog::list_by_tag,
        handlers::catalog::list_by_category,
        handlers::catalog::list_by_sale,
        handlers::catalog::submit_filters,
        handlers::products::get_product,
        handlers::products::create_review,
        handlers::compare::compare_table,
        handlers::compare::compare_amount,
        handlers::compare::add_to_compare,
        handlers::compare::remove_from_compare,
        handlers::compare::clear_compare,
        handlers::cart::cart_summary,
        handlers::cart::cart_amount,
        handlers::cart::cart_total,
        handlers::cart::add_to_cart,
        handlers::cart::change_quantity,
        handlers::cart::remove_from_cart,
        handlers::sellers::get_seller,
        handlers::history::list_history,
        handlers::sales::list_sales,
        handlers::categories::list_categories,
        handlers::categories::create_category,
        handlers::health::health,
        handlers::health::liveness,
    ),
    components(schemas(
        ErrorResponse,
        CatalogListing,
        CatalogItem,
        CatalogSubmission,
        PageInfo,
        ProductDetail,
        OfferView,
        PropertyView,
        PriceStats,
        handlers::products::CreateReviewRequest,
        CompareTable,
        ComparedProduct,
        ComparedProperty,
        CompareAmount,
        CartSummary,
        CartLine,
        CartAmount,
        CartChange,
        SellerCard,
        SellerProduct,
        HistoryEntry,
        SaleSummary,
        DiscountKind,
        CategoryNode,
        CategoryChild,
        CreateCategoryInput,
        handlers::health::HealthResponse,
        handlers::health::ComponentStatus,
    )),
    tags(
        (name = "Catalog", description = "Filtered, sorted, paginated product listings"),
        (name = "Products", description = "Product detail pages and reviews"),
        (name = "Compare", description = "Session-scoped product comparison"),
        (name = "Cart", description = "Per-user shopping cart"),
        (name = "Sales", description = "Current discounts"),
        (name = "Sellers", description = "Seller cards"),
        (name = "History", description = "Browsing history"),
        (name = "Categories", description = "Catalog navigation"),
        (name = "Health", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Swagger UI serving the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_builds_and_covers_the_surface() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().expect("serializable document");
        assert!(json.contains("/api/v1/catalog"));
        assert!(json.contains("/api/v1/compare/add/{slug}"));
        assert!(json.contains("/api/v1/cart/change/{slug}/{delta}/{offer_id}"));
    }
}
