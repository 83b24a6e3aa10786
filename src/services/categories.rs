use std::sync::Arc;

use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{category, Category, CategoryModel};
use crate::errors::ServiceError;

/// A category with its direct subcategories, for the catalog navigation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryNode {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub children: Vec<CategoryChild>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryChild {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
}

/// Input for creating a category.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub slug: String,
    /// Parent category; must itself be top-level.
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub sort_index: i32,
}

/// Category navigation and maintenance.
///
/// The tree is exactly two levels deep: a category either is top-level or
/// hangs under a top-level parent. That invariant is enforced here, before
/// anything is persisted.
#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DbPool>,
}

impl CategoryService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Active categories as a two-level tree, in sort order.
    #[instrument(skip(self))]
    pub async fn tree(&self) -> Result<Vec<CategoryNode>, ServiceError> {
        let all = Category::find()
            .filter(category::Column::IsActive.eq(true))
            .order_by_asc(category::Column::SortIndex)
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?;

        let (roots, children): (Vec<_>, Vec<_>) =
            all.into_iter().partition(|c| c.parent_id.is_none());

        Ok(roots
            .into_iter()
            .map(|root| CategoryNode {
                children: children
                    .iter()
                    .filter(|c| c.parent_id == Some(root.id))
                    .map(|c| CategoryChild {
                        id: c.id,
                        slug: c.slug.clone(),
                        name: c.name.clone(),
                    })
                    .collect(),
                id: root.id,
                slug: root.slug,
                name: root.name,
            })
            .collect())
    }

    /// Creates a category, rejecting any nesting deeper than one level.
    #[instrument(skip(self))]
    pub async fn create(&self, input: CreateCategoryInput) -> Result<CategoryModel, ServiceError> {
        input.validate()?;

        if let Some(parent_id) = input.parent_id {
            let parent = Category::find_by_id(parent_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Parent category {} not found", parent_id))
                })?;

            if parent.parent_id.is_some() {
                return Err(ServiceError::ValidationError(
                    "A subcategory cannot be used as a parent: categories nest only one level"
                        .to_string(),
                ));
            }
        }

        let taken = Category::find()
            .filter(category::Column::Slug.eq(input.slug.as_str()))
            .one(&*self.db)
            .await?;
        if taken.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Category slug '{}' is already in use",
                input.slug
            )));
        }

        let created = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            slug: Set(input.slug),
            is_active: Set(true),
            sort_index: Set(input.sort_index),
            parent_id: Set(input.parent_id),
        }
        .insert(&*self.db)
        .await?;

        info!(%created.id, slug = %created.slug, "Category created");
        Ok(created)
    }
}
