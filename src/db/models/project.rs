//! Fundraising project models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db::{Entity, Order, SqliteQuery};

/// Accepted values for `Project::status`
pub const PROJECT_STATUSES: &[&str] = &["active", "funded", "completed", "paused"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub status: String,
    pub goal_amount: f64,
    pub raised_amount: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// Funding progress in percent, rounded to two decimals and capped at 100
fn progress_percent(goal: f64, raised: f64) -> f64 {
    if goal <= 0.0 {
        return 0.0;
    }
    let percent = raised * 100.0 / goal;
    ((percent * 100.0).round() / 100.0).min(100.0)
}

/// Totals shown on the donate page
#[derive(Debug, Clone, Serialize)]
pub struct FundingSummary {
    pub project_count: usize,
    pub active_count: usize,
    pub goal_total: f64,
    pub raised_total: f64,
    pub progress_percent: f64,
}

impl FundingSummary {
    pub fn from_projects(projects: &[Project]) -> Self {
        let goal_total: f64 = projects.iter().map(|p| p.goal_amount).sum();
        let raised_total: f64 = projects.iter().map(|p| p.raised_amount).sum();
        Self {
            project_count: projects.len(),
            active_count: projects.iter().filter(|p| p.status == "active").count(),
            goal_total,
            raised_total,
            progress_percent: progress_percent(goal_total, raised_total),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub goal_amount: f64,
    #[serde(default)]
    pub raised_amount: f64,
}

fn default_status() -> String {
    "active".to_string()
}

impl Entity for Project {
    const TABLE: &'static str = "projects";
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "description",
        "image_url",
        "status",
        "goal_amount",
        "raised_amount",
        "created_at",
        "updated_at",
    ];
    const ORDER: Order = Order::desc("created_at");

    type Input = ProjectInput;

    fn id(&self) -> i64 {
        self.id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn build(id: i64, input: ProjectInput, created_at: &str, updated_at: &str) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            image_url: input.image_url,
            status: input.status,
            goal_amount: input.goal_amount,
            raised_amount: input.raised_amount,
            created_at: created_at.to_string(),
            updated_at: updated_at.to_string(),
        }
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.title)
            .bind(&self.description)
            .bind(&self.image_url)
            .bind(&self.status)
            .bind(self.goal_amount)
            .bind(self.raised_amount)
            .bind(&self.created_at)
            .bind(&self.updated_at)
    }
}
