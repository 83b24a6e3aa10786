pub mod browsing_history;
pub mod cart_item;
pub mod category;
pub mod discount;
pub mod discount_category;
pub mod discount_product;
pub mod product;
pub mod product_tag;
pub mod property;
pub mod property_value;
pub mod review;
pub mod seller;
pub mod seller_offer;
pub mod tag;

// Re-export entities
pub use browsing_history::{Entity as BrowsingHistory, Model as BrowsingHistoryModel};
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use category::{Entity as Category, Model as CategoryModel};
pub use discount::{DiscountKind, Entity as Discount, Model as DiscountModel};
pub use discount_category::{Entity as DiscountCategory, Model as DiscountCategoryModel};
pub use discount_product::{Entity as DiscountProduct, Model as DiscountProductModel};
pub use product::{Entity as Product, Model as ProductModel};
pub use product_tag::{Entity as ProductTag, Model as ProductTagModel};
pub use property::{Entity as Property, Model as PropertyModel};
pub use property_value::{Entity as PropertyValue, Model as PropertyValueModel};
pub use review::{Entity as Review, Model as ReviewModel};
pub use seller::{Entity as Seller, Model as SellerModel};
pub use seller_offer::{Entity as SellerOffer, Model as SellerOfferModel};
pub use tag::{Entity as Tag, Model as TagModel};
