//! Gallery models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db::{Entity, Order, SqliteQuery};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GalleryItem {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub category: Option<String>,
    /// Mission the photo was taken on; not enforced as a foreign key
    pub mission_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GalleryItemInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub image_url: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub mission_id: Option<i64>,
}

impl Entity for GalleryItem {
    const TABLE: &'static str = "gallery";
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "description",
        "image_url",
        "category",
        "mission_id",
        "created_at",
        "updated_at",
    ];
    const ORDER: Order = Order::desc("created_at");

    type Input = GalleryItemInput;

    fn id(&self) -> i64 {
        self.id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn build(id: i64, input: GalleryItemInput, created_at: &str, updated_at: &str) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            image_url: input.image_url,
            category: input.category,
            mission_id: input.mission_id,
            created_at: created_at.to_string(),
            updated_at: updated_at.to_string(),
        }
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.title)
            .bind(&self.description)
            .bind(&self.image_url)
            .bind(&self.category)
            .bind(self.mission_id)
            .bind(&self.created_at)
            .bind(&self.updated_at)
    }
}
