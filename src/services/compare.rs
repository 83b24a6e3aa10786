use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{
    product, property_value, Product, ProductModel, Property, PropertyValue, SellerOffer,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::session::SessionStore;

/// One property row of the comparison table, original casing preserved.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ComparedProperty {
    pub name: String,
    pub value: String,
}

/// One column of the comparison table.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ComparedProduct {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    #[schema(value_type = String, example = "499.00")]
    pub min_price: Decimal,
    /// Properties valued identically (case-insensitively) on every compared
    /// product.
    pub common: Vec<ComparedProperty>,
    /// This product's properties that differ somewhere in the set.
    pub different: Vec<ComparedProperty>,
}

/// The comparison table in list insertion order.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompareTable {
    pub products: Vec<ComparedProduct>,
    /// True when nothing is shared across ≥2 compared products; the UI
    /// hides its "show only differences" toggle then.
    pub all_different: bool,
    /// True when the compared products span more than one category, which
    /// makes a property-by-property diff mostly meaningless.
    pub mixed_categories: bool,
}

/// Size of the comparison list.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompareAmount {
    pub amt: usize,
}

/// Property names whose value is identical, case-insensitively, on every
/// compared product. With fewer than two products nothing qualifies; a
/// product missing the property altogether makes it differentiating.
pub(crate) fn non_differentiating_names(products: &[Vec<(String, String)>]) -> BTreeSet<String> {
    if products.len() < 2 {
        return BTreeSet::new();
    }

    let mut names: BTreeSet<&str> = BTreeSet::new();
    for props in products {
        names.extend(props.iter().map(|(name, _)| name.as_str()));
    }

    names
        .into_iter()
        .filter(|name| {
            let mut seen: Option<String> = None;
            for props in products {
                match props.iter().find(|(n, _)| n == name) {
                    None => return false,
                    Some((_, value)) => {
                        let folded = value.to_lowercase();
                        match &seen {
                            None => seen = Some(folded),
                            Some(first) if *first != folded => return false,
                            Some(_) => {}
                        }
                    }
                }
            }
            true
        })
        .map(str::to_owned)
        .collect()
}

/// Session-scoped comparison list and its diff table.
#[derive(Clone)]
pub struct CompareService {
    db: Arc<DbPool>,
    sessions: SessionStore,
    event_sender: Arc<EventSender>,
    limit: usize,
}

impl CompareService {
    pub fn new(
        db: Arc<DbPool>,
        sessions: SessionStore,
        event_sender: Arc<EventSender>,
        limit: usize,
    ) -> Self {
        Self {
            db,
            sessions,
            event_sender,
            limit,
        }
    }

    async fn visible_product(&self, slug: &str) -> Result<ProductModel, ServiceError> {
        Product::find()
            .filter(product::Column::Slug.eq(slug))
            .filter(product::Column::Archived.eq(false))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product '{}' not found", slug)))
    }

    /// Appends a product to the session's comparison list. Re-adding a listed
    /// product is a no-op; exceeding the cap is a conflict.
    #[instrument(skip(self))]
    pub async fn add(&self, session_id: &str, slug: &str) -> Result<CompareAmount, ServiceError> {
        let product = self.visible_product(slug).await?;
        let mut session = self.sessions.load(session_id).await?;

        if !session.compare.contains(&product.id) {
            if session.compare.len() >= self.limit {
                return Err(ServiceError::Conflict(format!(
                    "Comparison list is full ({} products)",
                    self.limit
                )));
            }
            session.compare.push(product.id);
            self.sessions.save(session_id, &session).await?;

            self.event_sender
                .send_or_log(Event::CompareListChanged {
                    session_id: session_id.to_string(),
                    size: session.compare.len(),
                })
                .await;
            info!(session_id, slug, "Added product to comparison");
        }

        Ok(CompareAmount {
            amt: session.compare.len(),
        })
    }

    /// Removes a product from the list. Removing an absent product is fine.
    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        session_id: &str,
        slug: &str,
    ) -> Result<CompareAmount, ServiceError> {
        let product = self.visible_product(slug).await?;
        let mut session = self.sessions.load(session_id).await?;

        let before = session.compare.len();
        session.compare.retain(|id| *id != product.id);
        if session.compare.len() != before {
            self.sessions.save(session_id, &session).await?;
            self.event_sender
                .send_or_log(Event::CompareListChanged {
                    session_id: session_id.to_string(),
                    size: session.compare.len(),
                })
                .await;
        }

        Ok(CompareAmount {
            amt: session.compare.len(),
        })
    }

    /// Empties the comparison list.
    #[instrument(skip(self))]
    pub async fn clear(&self, session_id: &str) -> Result<CompareAmount, ServiceError> {
        let mut session = self.sessions.load(session_id).await?;
        if !session.compare.is_empty() {
            session.compare.clear();
            self.sessions.save(session_id, &session).await?;
            self.event_sender
                .send_or_log(Event::CompareListChanged {
                    session_id: session_id.to_string(),
                    size: 0,
                })
                .await;
        }
        Ok(CompareAmount { amt: 0 })
    }

    #[instrument(skip(self))]
    pub async fn count(&self, session_id: &str) -> Result<CompareAmount, ServiceError> {
        let session = self.sessions.load(session_id).await?;
        Ok(CompareAmount {
            amt: session.compare.len(),
        })
    }

    /// Builds the comparison table for the session's list.
    #[instrument(skip(self))]
    pub async fn table(&self, session_id: &str) -> Result<CompareTable, ServiceError> {
        let session = self.sessions.load(session_id).await?;
        let ids = session.compare;

        if ids.is_empty() {
            return Ok(CompareTable {
                products: Vec::new(),
                all_different: false,
                mixed_categories: false,
            });
        }

        let fetched = Product::find()
            .filter(product::Column::Id.is_in(ids.iter().copied()))
            .filter(product::Column::Archived.eq(false))
            .all(&*self.db)
            .await?;
        let by_id: HashMap<Uuid, ProductModel> =
            fetched.into_iter().map(|p| (p.id, p)).collect();
        // Insertion order; products archived since being listed drop out.
        let products: Vec<ProductModel> = ids
            .iter()
            .filter_map(|id| by_id.get(id).cloned())
            .collect();

        let value_rows = PropertyValue::find()
            .filter(property_value::Column::ProductId.is_in(products.iter().map(|p| p.id)))
            .find_also_related(Property)
            .all(&*self.db)
            .await?;

        let mut props_by_product: HashMap<Uuid, Vec<(String, String)>> = HashMap::new();
        for (value, property) in value_rows {
            if let Some(property) = property {
                props_by_product
                    .entry(value.product_id)
                    .or_default()
                    .push((property.name, value.value));
            }
        }

        let offers = SellerOffer::find()
            .filter(
                crate::entities::seller_offer::Column::ProductId
                    .is_in(products.iter().map(|p| p.id)),
            )
            .all(&*self.db)
            .await?;
        let mut min_prices: HashMap<Uuid, Decimal> = HashMap::new();
        for offer in offers {
            min_prices
                .entry(offer.product_id)
                .and_modify(|m| *m = (*m).min(offer.price))
                .or_insert(offer.price);
        }

        let prop_lists: Vec<Vec<(String, String)>> = products
            .iter()
            .map(|p| props_by_product.get(&p.id).cloned().unwrap_or_default())
            .collect();
        let common_names = non_differentiating_names(&prop_lists);

        let mixed_categories = products
            .iter()
            .map(|p| p.category_id)
            .collect::<BTreeSet<_>>()
            .len()
            > 1;
        let all_different = products.len() > 1 && common_names.is_empty();

        let columns = products
            .into_iter()
            .zip(prop_lists)
            .map(|(p, props)| {
                let (common, different): (Vec<_>, Vec<_>) = props
                    .into_iter()
                    .map(|(name, value)| ComparedProperty { name, value })
                    .partition(|row| common_names.contains(&row.name));
                ComparedProduct {
                    min_price: min_prices.get(&p.id).copied().unwrap_or(Decimal::ZERO),
                    id: p.id,
                    slug: p.slug,
                    name: p.name,
                    common,
                    different,
                }
            })
            .collect();

        Ok(CompareTable {
            products: columns,
            all_different,
            mixed_categories,
        })
    }
}


#[cfg(test)]
mod proptests {
    use super::non_differentiating_names;
    use proptest::prelude::*;

    fn property_sets() -> impl Strategy<Value = Vec<Vec<(String, String)>>> {
        let pair = ("[a-d]{1,4}", "[a-dA-D]{1,4}").prop_map(|(n, v)| (n, v));
        proptest::collection::vec(proptest::collection::vec(pair, 0..5), 0..4)
    }

    proptest! {
        #[test]
        fn value_casing_never_changes_the_diff(products in property_sets()) {
            let shouted: Vec<Vec<(String, String)>> = products
                .iter()
                .map(|props| {
                    props
                        .iter()
                        .map(|(n, v)| (n.clone(), v.to_uppercase()))
                        .collect()
                })
                .collect();
            prop_assert_eq!(
                non_differentiating_names(&products),
                non_differentiating_names(&shouted)
            );
        }

        #[test]
        fn common_names_exist_on_every_product(products in property_sets()) {
            let common = non_differentiating_names(&products);
            for name in &common {
                for props in &products {
                    prop_assert!(props.iter().any(|(n, _)| n == name));
                }
            }
        }
    }
}
