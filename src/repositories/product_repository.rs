use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func, Query, SimpleExpr, SubQueryStatement};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult, JoinType, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
};
use serde::{Deserialize, Serialize};
use strum::EnumIter;
use uuid::Uuid;

use crate::entities::{
    category, discount, discount_category, discount_product, product, product_tag, review,
    seller_offer, tag, Category, Discount, ProductTag, Tag, TagModel,
};
use crate::errors::ServiceError;

use super::{BaseRepository, Repository};

/// Catalog orderings, one per wire code.
///
/// Codes come in pairs: a bare code sorts ascending, the `-` prefixed
/// variant descending. Creation date is the odd one out, bare `cre` means
/// newest first. Price sorts work on the cheapest offer of a product,
/// review sorts on its review count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
pub enum SortKey {
    PopularityDesc,
    PopularityAsc,
    PriceDesc,
    PriceAsc,
    ReviewsDesc,
    ReviewsAsc,
    NewestFirst,
    OldestFirst,
}

impl SortKey {
    /// Parses a sort code from the wire. Unknown codes yield `None`.
    pub fn parse(code: &str) -> Option<SortKey> {
        match code {
            "pop" => Some(SortKey::PopularityAsc),
            "-pop" => Some(SortKey::PopularityDesc),
            "pri" => Some(SortKey::PriceAsc),
            "-pri" => Some(SortKey::PriceDesc),
            "rev" => Some(SortKey::ReviewsAsc),
            "-rev" => Some(SortKey::ReviewsDesc),
            "cre" => Some(SortKey::NewestFirst),
            "-cre" => Some(SortKey::OldestFirst),
            _ => None,
        }
    }

    /// The wire code for this ordering.
    pub fn code(&self) -> &'static str {
        match self {
            SortKey::PopularityAsc => "pop",
            SortKey::PopularityDesc => "-pop",
            SortKey::PriceAsc => "pri",
            SortKey::PriceDesc => "-pri",
            SortKey::ReviewsAsc => "rev",
            SortKey::ReviewsDesc => "-rev",
            SortKey::NewestFirst => "cre",
            SortKey::OldestFirst => "-cre",
        }
    }
}

/// Filter panel state for the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogFilter {
    /// Lowest acceptable price, inclusive.
    pub price_min: Option<Decimal>,
    /// Highest acceptable price, inclusive.
    pub price_max: Option<Decimal>,
    /// Case-insensitive substring of the product name.
    pub title: Option<String>,
    /// Only products with units in stock.
    pub in_stock: bool,
}

impl CatalogFilter {
    pub fn is_empty(&self) -> bool {
        self.price_min.is_none()
            && self.price_max.is_none()
            && self.title.is_none()
            && !self.in_stock
    }
}

/// One fully resolved catalog request.
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    /// Requested page, 1-based. Out-of-range values are clamped.
    pub page: u64,
    /// Products per page.
    pub page_size: u64,
    /// Ordering; `None` falls back to the shelf order (sort_index, name).
    pub sort: Option<SortKey>,
    /// Case-insensitive substring match on the product name.
    pub search: Option<String>,
    /// Restrict to products carrying this tag slug.
    pub tag: Option<String>,
    /// Restrict to this category slug and its direct subcategories.
    pub category: Option<String>,
    /// Restrict to products covered by this sale slug.
    pub sale: Option<String>,
    /// Filter panel state.
    pub filter: Option<CatalogFilter>,
}

/// One product row of a catalog page, with its aggregates.
#[derive(Debug, Clone, FromQueryResult)]
pub struct CatalogRow {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub slug: String,
    pub count_sells: i32,
    pub created_at: DateTime<Utc>,
    /// Cheapest offer price across sellers.
    pub price: Decimal,
    /// Units in stock summed across sellers.
    pub amount: i64,
    /// Number of sellers offering the product.
    pub offer_count: i64,
    pub review_count: i64,
}

/// A catalog page after pagination clamping.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub items: Vec<CatalogRow>,
    /// The page actually served, after clamping.
    pub page: u64,
    pub last_page: u64,
    pub total: u64,
}

/// Read access to the sellable catalog.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Runs a catalog query over products that are not archived and have at
    /// least one seller offer. Pagination is clamped, never rejected.
    async fn find_active(&self, query: &CatalogQuery) -> Result<CatalogPage, ServiceError>;

    /// Tags of the given products, keyed by product ID.
    async fn tags_for_products(
        &self,
        product_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<TagModel>>, ServiceError>;
}

/// Number of pages needed for `total` items, at least one.
pub(crate) fn last_page(total: u64, page_size: u64) -> u64 {
    total.div_ceil(page_size.max(1)).max(1)
}

/// Correlated subquery counting reviews of the outer product row.
fn review_count_expr() -> SimpleExpr {
    let sub = Query::select()
        .expr(Func::count(Expr::col((
            review::Entity,
            review::Column::Id,
        ))))
        .from(review::Entity)
        .and_where(
            Expr::col((review::Entity, review::Column::ProductId))
                .equals((product::Entity, product::Column::Id)),
        )
        .to_owned();
    SimpleExpr::SubQuery(None, Box::new(SubQueryStatement::SelectStatement(sub)))
}

fn apply_sort(select: Select<product::Entity>, sort: Option<SortKey>) -> Select<product::Entity> {
    match sort {
        None => select
            .order_by_asc(product::Column::SortIndex)
            .order_by_asc(product::Column::Name),
        Some(SortKey::PopularityDesc) => select.order_by_desc(product::Column::CountSells),
        Some(SortKey::PopularityAsc) => select.order_by_asc(product::Column::CountSells),
        Some(SortKey::PriceDesc) => select.order_by(seller_offer::Column::Price.min(), Order::Desc),
        Some(SortKey::PriceAsc) => select.order_by(seller_offer::Column::Price.min(), Order::Asc),
        Some(SortKey::ReviewsDesc) => select.order_by(review_count_expr(), Order::Desc),
        Some(SortKey::ReviewsAsc) => select.order_by(review_count_expr(), Order::Asc),
        Some(SortKey::NewestFirst) => select.order_by_desc(product::Column::CreatedAt),
        Some(SortKey::OldestFirst) => select.order_by_asc(product::Column::CreatedAt),
    }
}

/// Catalog repository over sea-orm.
#[derive(Debug)]
pub struct SeaOrmProductRepository {
    base: BaseRepository,
}

impl SeaOrmProductRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }

    /// Resolves a category slug to the IDs of the category and its direct
    /// subcategories.
    async fn category_ids(&self, slug: &str) -> Result<Vec<Uuid>, ServiceError> {
        let cat = Category::find()
            .filter(category::Column::Slug.eq(slug))
            .one(self.db())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category '{}' not found", slug)))?;

        let children = Category::find()
            .filter(category::Column::ParentId.eq(cat.id))
            .all(self.db())
            .await?;

        let mut ids = vec![cat.id];
        ids.extend(children.into_iter().map(|c| c.id));
        Ok(ids)
    }

    /// Products covered by a sale: attached directly or through a category.
    /// Only currently live discounts count, an expired or disabled slug is
    /// as good as unknown.
    async fn sale_condition(&self, slug: &str) -> Result<Condition, ServiceError> {
        let sale = Discount::find()
            .filter(discount::Column::Slug.eq(slug))
            .filter(Discount::currently_live())
            .one(self.db())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Sale '{}' not found", slug)))?;

        let direct = Query::select()
            .column((discount_product::Entity, discount_product::Column::ProductId))
            .from(discount_product::Entity)
            .and_where(
                Expr::col((
                    discount_product::Entity,
                    discount_product::Column::DiscountId,
                ))
                .eq(sale.id),
            )
            .to_owned();

        let by_category = Query::select()
            .column((
                discount_category::Entity,
                discount_category::Column::CategoryId,
            ))
            .from(discount_category::Entity)
            .and_where(
                Expr::col((
                    discount_category::Entity,
                    discount_category::Column::DiscountId,
                ))
                .eq(sale.id),
            )
            .to_owned();

        Ok(Condition::any()
            .add(product::Column::Id.in_subquery(direct))
            .add(product::Column::CategoryId.in_subquery(by_category)))
    }

    fn tag_condition(slug: &str) -> SimpleExpr {
        let sub = Query::select()
            .column((product_tag::Entity, product_tag::Column::ProductId))
            .from(product_tag::Entity)
            .inner_join(
                tag::Entity,
                Expr::col((tag::Entity, tag::Column::Id))
                    .equals((product_tag::Entity, product_tag::Column::TagId)),
            )
            .and_where(Expr::col((tag::Entity, tag::Column::Slug)).eq(slug))
            .to_owned();
        product::Column::Id.in_subquery(sub)
    }

    fn name_contains(term: &str) -> SimpleExpr {
        Expr::expr(Func::lower(Expr::col((
            product::Entity,
            product::Column::Name,
        ))))
        .like(format!("%{}%", term.to_lowercase()))
    }
}

#[async_trait]
impl ProductRepository for SeaOrmProductRepository {
    async fn find_active(&self, query: &CatalogQuery) -> Result<CatalogPage, ServiceError> {
        let db = self.db();
        let page_size = query.page_size.max(1);

        // Base relation: live products with at least one offer, annotated
        // with their price, stock and review aggregates.
        let mut select = product::Entity::find()
            .select_only()
            .column(product::Column::Id)
            .column(product::Column::CategoryId)
            .column(product::Column::Name)
            .column(product::Column::Slug)
            .column(product::Column::CountSells)
            .column(product::Column::CreatedAt)
            .column_as(seller_offer::Column::Price.min(), "price")
            .column_as(seller_offer::Column::Count.sum(), "amount")
            .column_as(seller_offer::Column::Id.count(), "offer_count")
            .column_as(review_count_expr(), "review_count")
            .join(JoinType::InnerJoin, product::Relation::SellerOffers.def())
            .filter(product::Column::Archived.eq(false))
            .group_by(product::Column::Id);

        if let Some(slug) = &query.category {
            let ids = self.category_ids(slug).await?;
            select = select.filter(product::Column::CategoryId.is_in(ids));
        }

        if let Some(slug) = &query.tag {
            select = select.filter(Self::tag_condition(slug));
        }

        if let Some(slug) = &query.sale {
            select = select.filter(self.sale_condition(slug).await?);
        }

        if let Some(term) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            select = select.filter(Self::name_contains(term.trim()));
        }

        if let Some(filter) = &query.filter {
            if let Some(term) = filter.title.as_deref().filter(|s| !s.trim().is_empty()) {
                select = select.filter(Self::name_contains(term.trim()));
            }
            if let Some(min) = filter.price_min {
                select = select.having(Expr::expr(seller_offer::Column::Price.min()).gte(min));
            }
            if let Some(max) = filter.price_max {
                select = select.having(Expr::expr(seller_offer::Column::Price.min()).lte(max));
            }
            if filter.in_stock {
                select = select.having(Expr::expr(seller_offer::Column::Count.sum()).gt(0));
            }
        }

        let total = select.clone().count(db).await?;
        let last_page = last_page(total, page_size);
        let page = query.page.clamp(1, last_page);

        let rows = apply_sort(select, query.sort)
            .limit(page_size)
            .offset((page - 1) * page_size)
            .into_model::<CatalogRow>()
            .all(db)
            .await?;

        Ok(CatalogPage {
            items: rows,
            page,
            last_page,
            total,
        })
    }

    async fn tags_for_products(
        &self,
        product_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<TagModel>>, ServiceError> {
        if product_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = ProductTag::find()
            .find_also_related(Tag)
            .filter(product_tag::Column::ProductId.is_in(product_ids.iter().copied()))
            .all(self.db())
            .await?;

        let mut map: HashMap<Uuid, Vec<TagModel>> = HashMap::new();
        for (link, tag) in rows {
            if let Some(tag) = tag {
                map.entry(link.product_id).or_default().push(tag);
            }
        }
        Ok(map)
    }
}
