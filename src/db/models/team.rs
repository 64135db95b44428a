//! Team member models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db::{Entity, Order, SqliteQuery};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeamMember {
    pub id: i64,
    pub name: String,
    pub role: String,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub display_order: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamMemberInput {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub display_order: i64,
}

impl Entity for TeamMember {
    const TABLE: &'static str = "team";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "role",
        "bio",
        "image_url",
        "display_order",
        "created_at",
        "updated_at",
    ];
    const ORDER: Order = Order::asc("display_order");

    type Input = TeamMemberInput;

    fn id(&self) -> i64 {
        self.id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn build(id: i64, input: TeamMemberInput, created_at: &str, updated_at: &str) -> Self {
        Self {
            id,
            name: input.name,
            role: input.role,
            bio: input.bio,
            image_url: input.image_url,
            display_order: input.display_order,
            created_at: created_at.to_string(),
            updated_at: updated_at.to_string(),
        }
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.name)
            .bind(&self.role)
            .bind(&self.bio)
            .bind(&self.image_url)
            .bind(self.display_order)
            .bind(&self.created_at)
            .bind(&self.updated_at)
    }
}
