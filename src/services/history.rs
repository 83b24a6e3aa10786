use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{browsing_history, product, BrowsingHistory, Product};
use crate::errors::ServiceError;

/// One previously viewed product.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryEntry {
    pub product_id: Uuid,
    pub slug: String,
    pub name: String,
    pub viewed_at: DateTime<Utc>,
}

/// A user's recently viewed products.
#[derive(Clone)]
pub struct HistoryService {
    db: Arc<DbPool>,
    limit: u64,
}

impl HistoryService {
    pub fn new(db: Arc<DbPool>, limit: u64) -> Self {
        Self { db, limit }
    }

    /// The user's latest views, most recent first. Products archived since
    /// the visit drop out of the list.
    #[instrument(skip(self))]
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<HistoryEntry>, ServiceError> {
        let rows = BrowsingHistory::find()
            .filter(browsing_history::Column::UserId.eq(user_id))
            .find_also_related(Product)
            .filter(product::Column::Archived.eq(false))
            .order_by_desc(browsing_history::Column::ViewedAt)
            .limit(self.limit)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(entry, product)| {
                product.map(|p| HistoryEntry {
                    product_id: p.id,
                    slug: p.slug,
                    name: p.name,
                    viewed_at: entry.viewed_at,
                })
            })
            .collect())
    }
}
