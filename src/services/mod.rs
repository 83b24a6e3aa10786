pub mod cart;
pub mod catalog;
pub mod categories;
pub mod compare;
pub mod discounts;
pub mod history;
pub mod pricing;
pub mod products;
pub mod sellers;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use categories::CategoryService;
pub use compare::CompareService;
pub use discounts::{DiscountEngine, DiscountService};
pub use history::HistoryService;
pub use pricing::PricingService;
pub use products::ProductDetailService;
pub use sellers::SellerService;
