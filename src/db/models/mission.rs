//! Mission models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::db::{Entity, Order, SqliteQuery};

/// Accepted values for `Mission::status`
pub const MISSION_STATUSES: &[&str] = &["upcoming", "ongoing", "completed"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Mission {
    pub id: i64,
    pub title: String,
    pub location: String,
    pub country: Option<String>,
    pub description: String,
    pub image_url: Option<String>,
    pub status: String,
    /// ISO date (YYYY-MM-DD)
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub animals_treated: i64,
    pub volunteers: i64,
    /// JSON array of short highlight strings
    pub highlights: Json<Vec<String>>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MissionInput {
    pub title: String,
    pub location: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub animals_treated: i64,
    #[serde(default)]
    pub volunteers: i64,
    #[serde(default)]
    pub highlights: Vec<String>,
}

fn default_status() -> String {
    "upcoming".to_string()
}

impl Entity for Mission {
    const TABLE: &'static str = "missions";
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "location",
        "country",
        "description",
        "image_url",
        "status",
        "start_date",
        "end_date",
        "animals_treated",
        "volunteers",
        "highlights",
        "created_at",
        "updated_at",
    ];
    const ORDER: Order = Order::desc("created_at");

    type Input = MissionInput;

    fn id(&self) -> i64 {
        self.id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn build(id: i64, input: MissionInput, created_at: &str, updated_at: &str) -> Self {
        Self {
            id,
            title: input.title,
            location: input.location,
            country: input.country,
            description: input.description,
            image_url: input.image_url,
            status: input.status,
            start_date: input.start_date,
            end_date: input.end_date,
            animals_treated: input.animals_treated,
            volunteers: input.volunteers,
            highlights: Json(input.highlights),
            created_at: created_at.to_string(),
            updated_at: updated_at.to_string(),
        }
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.title)
            .bind(&self.location)
            .bind(&self.country)
            .bind(&self.description)
            .bind(&self.image_url)
            .bind(&self.status)
            .bind(&self.start_date)
            .bind(&self.end_date)
            .bind(self.animals_treated)
            .bind(self.volunteers)
            .bind(&self.highlights)
            .bind(&self.created_at)
            .bind(&self.updated_at)
    }
}
