use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::repositories::{CatalogFilter, CatalogPage, CatalogQuery, ProductRepository, SortKey};
use crate::services::discounts::{apply_discount, DiscountEngine};
use crate::session::{SessionData, SessionStore};

/// What part of the catalog a request looks at: everything, one tag, one
/// category subtree, or one sale.
#[derive(Debug, Clone, Default)]
pub struct CatalogScope {
    pub tag: Option<String>,
    pub category: Option<String>,
    pub sale: Option<String>,
}

impl CatalogScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn tag(slug: impl Into<String>) -> Self {
        Self {
            tag: Some(slug.into()),
            ..Self::default()
        }
    }

    pub fn category(slug: impl Into<String>) -> Self {
        Self {
            category: Some(slug.into()),
            ..Self::default()
        }
    }

    pub fn sale(slug: impl Into<String>) -> Self {
        Self {
            sale: Some(slug.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tag.is_none() && self.category.is_none() && self.sale.is_none()
    }
}

/// The filter panel as submitted by the storefront.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CatalogSubmission {
    /// Free-text search on the product name.
    pub search: Option<String>,
    /// Price range in the UI's `"min;max"` form.
    #[schema(example = "100;500")]
    pub price: Option<String>,
    /// Case-insensitive substring on the product name (filter panel field).
    pub title: Option<String>,
    /// Only products with stock.
    pub in_stock: Option<bool>,
}

/// One row of a catalog listing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogItem {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    #[schema(value_type = String, example = "199.00")]
    pub price: Decimal,
    #[schema(value_type = String, example = "149.25")]
    pub discounted_price: Decimal,
    pub seller_count: i64,
    pub review_count: i64,
    pub in_stock: bool,
    pub tags: Vec<String>,
}

/// Pagination block returned with every listing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PageInfo {
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// A catalog page ready for rendering.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogListing {
    pub items: Vec<CatalogItem>,
    pub pagination: PageInfo,
    /// The sort in effect, as its wire code.
    pub sort: Option<String>,
    /// The search in effect, session-persisted or just submitted.
    pub search: Option<String>,
}

/// Total page-number parsing: anything unusable becomes page 1. The upper
/// clamp happens in the repository, where the total is known.
pub(crate) fn parse_page(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

/// Parses the UI's `"min;max"` price range. Either side may be empty;
/// unparseable sides are dropped rather than rejected.
pub(crate) fn parse_price_range(raw: &str) -> (Option<Decimal>, Option<Decimal>) {
    let mut parts = raw.splitn(2, ';');
    let min = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| Decimal::from_str(s).ok());
    let max = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| Decimal::from_str(s).ok());
    (min, max)
}

/// The filtered, sorted, paginated product listing.
///
/// Each request is compiled into an immutable [`CatalogQuery`]; the only
/// state that survives a request is the explicit [`SessionData`] value,
/// updated here under the storefront's persistence rules.
#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn ProductRepository>,
    sessions: SessionStore,
    discounts: Arc<dyn DiscountEngine>,
    page_size: u64,
}

impl CatalogService {
    pub fn new(
        repo: Arc<dyn ProductRepository>,
        sessions: SessionStore,
        discounts: Arc<dyn DiscountEngine>,
        page_size: u64,
    ) -> Self {
        Self {
            repo,
            sessions,
            discounts,
            page_size,
        }
    }

    /// Serves a catalog GET.
    ///
    /// Session rules: a sort code on the request replaces the stored one
    /// and `none` deletes it. Any GET without a page parameter resets the
    /// stored search and filter; only paging requests carry them forward.
    #[instrument(skip(self))]
    pub async fn browse(
        &self,
        session_id: Option<&str>,
        scope: CatalogScope,
        page: Option<String>,
        sort: Option<String>,
    ) -> Result<CatalogListing, ServiceError> {
        let mut session = match session_id {
            Some(sid) => self.load_session(sid).await,
            None => SessionData::default(),
        };
        let mut dirty = false;

        match sort.as_deref().map(str::trim) {
            Some("none") => {
                if session.sort.take().is_some() {
                    dirty = true;
                }
            }
            Some(code) => match SortKey::parse(code) {
                Some(key) => {
                    if session.sort != Some(key) {
                        session.sort = Some(key);
                        dirty = true;
                    }
                }
                None => debug!(code, "Ignoring unknown sort code"),
            },
            None => {}
        }

        let plain_visit = page.is_none();
        if plain_visit && (session.search_query.is_some() || session.filter.is_some()) {
            session.search_query = None;
            session.filter = None;
            dirty = true;
        }

        let query = CatalogQuery {
            page: parse_page(page.as_deref()),
            page_size: self.page_size,
            sort: session.sort,
            search: session.search_query.clone(),
            tag: scope.tag,
            category: scope.category,
            sale: scope.sale,
            filter: session.filter.clone(),
        };

        let listing = self.run(&query).await?;

        if dirty {
            self.store_session(session_id, &session).await;
        }
        Ok(listing)
    }

    /// Serves the catalog POST: stores the submitted search and filter panel
    /// in the session and returns the first page of the result.
    #[instrument(skip(self))]
    pub async fn submit(
        &self,
        session_id: Option<&str>,
        submission: CatalogSubmission,
    ) -> Result<CatalogListing, ServiceError> {
        let mut session = match session_id {
            Some(sid) => self.load_session(sid).await,
            None => SessionData::default(),
        };

        if let Some(search) = submission
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            session.search_query = Some(search.to_string());
        }

        let (price_min, price_max) = submission
            .price
            .as_deref()
            .map(parse_price_range)
            .unwrap_or((None, None));
        let filter = CatalogFilter {
            price_min,
            price_max,
            title: submission
                .title
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            in_stock: submission.in_stock.unwrap_or(false),
        };
        if !filter.is_empty() {
            session.filter = Some(filter);
        }

        let query = CatalogQuery {
            page: 1,
            page_size: self.page_size,
            sort: session.sort,
            search: session.search_query.clone(),
            tag: None,
            category: None,
            sale: None,
            filter: session.filter.clone(),
        };

        let listing = self.run(&query).await?;
        self.store_session(session_id, &session).await;
        Ok(listing)
    }

    async fn run(&self, query: &CatalogQuery) -> Result<CatalogListing, ServiceError> {
        let page = self.repo.find_active(query).await?;
        let tags = self
            .repo
            .tags_for_products(&page.items.iter().map(|r| r.id).collect::<Vec<_>>())
            .await?;

        let mut items = Vec::with_capacity(page.items.len());
        for row in &page.items {
            let discounted_price = match self.discounts.best_for(row.id, row.category_id).await? {
                Some(d) => apply_discount(d.kind, d.value, row.price),
                None => row.price,
            };
            items.push(CatalogItem {
                id: row.id,
                slug: row.slug.clone(),
                name: row.name.clone(),
                price: row.price,
                discounted_price,
                seller_count: row.offer_count,
                review_count: row.review_count,
                in_stock: row.amount > 0,
                tags: tags
                    .get(&row.id)
                    .map(|ts| ts.iter().map(|t| t.name.clone()).collect())
                    .unwrap_or_default(),
            });
        }

        Ok(CatalogListing {
            items,
            pagination: page_info(&page, self.page_size),
            sort: query.sort.map(|s| s.code().to_string()),
            search: query.search.clone(),
        })
    }

    /// Session loads are best effort: a broken cache serves the catalog with
    /// a fresh session rather than failing the request.
    async fn load_session(&self, session_id: &str) -> SessionData {
        match self.sessions.load(session_id).await {
            Ok(data) => data,
            Err(e) => {
                warn!(session_id, "Session load failed, using empty state: {}", e);
                SessionData::default()
            }
        }
    }

    async fn store_session(&self, session_id: Option<&str>, data: &SessionData) {
        if let Some(sid) = session_id {
            if let Err(e) = self.sessions.save(sid, data).await {
                warn!(session_id = sid, "Session save failed: {}", e);
            }
        }
    }
}

fn page_info(page: &CatalogPage, per_page: u64) -> PageInfo {
    PageInfo {
        page: page.page,
        per_page,
        total_items: page.total,
        total_pages: page.last_page,
        has_next: page.page < page.last_page,
        has_prev: page.page > 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn page_parsing_is_total() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("3")), 3);
        assert_eq!(parse_page(Some(" 7 ")), 7);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("-2")), 1);
        assert_eq!(parse_page(Some("abc")), 1);
        assert_eq!(parse_page(Some("")), 1);
        assert_eq!(parse_page(Some("2.5")), 1);
    }

    #[test]
    fn price_range_parses_both_bounds() {
        assert_eq!(
            parse_price_range("100;500"),
            (Some(dec!(100)), Some(dec!(500)))
        );
    }

    #[test]
    fn price_range_sides_are_optional() {
        assert_eq!(parse_price_range(";500"), (None, Some(dec!(500))));
        assert_eq!(parse_price_range("100;"), (Some(dec!(100)), None));
        assert_eq!(parse_price_range(";"), (None, None));
        assert_eq!(parse_price_range(""), (None, None));
    }

    #[test]
    fn garbage_price_bounds_are_dropped() {
        assert_eq!(parse_price_range("cheap;500"), (None, Some(dec!(500))));
        assert_eq!(parse_price_range("100;many"), (Some(dec!(100)), None));
        assert_eq!(parse_price_range("nonsense"), (None, None));
    }

    #[test]
    fn scope_constructors_set_one_axis() {
        assert!(CatalogScope::all().is_empty());
        assert!(!CatalogScope::tag("new").is_empty());
        assert_eq!(CatalogScope::category("laptops").category.as_deref(), Some("laptops"));
        assert_eq!(CatalogScope::sale("spring").sale.as_deref(), Some("spring"));
    }
}
