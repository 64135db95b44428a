//! News article models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::db::{Entity, Order, SqliteQuery};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NewsArticle {
    pub id: i64,
    pub title: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub author: Option<String>,
    /// Drafts are only visible to admins
    pub published: bool,
    pub published_at: Option<String>,
    pub tags: Json<Vec<String>>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsArticleInput {
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Entity for NewsArticle {
    const TABLE: &'static str = "news";
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "excerpt",
        "content",
        "image_url",
        "author",
        "published",
        "published_at",
        "tags",
        "created_at",
        "updated_at",
    ];
    const ORDER: Order = Order::desc("created_at");

    type Input = NewsArticleInput;

    fn id(&self) -> i64 {
        self.id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn build(id: i64, input: NewsArticleInput, created_at: &str, updated_at: &str) -> Self {
        // Publishing without an explicit date stamps the article with the update time
        let published_at = match (input.published, input.published_at) {
            (true, None) => Some(updated_at.to_string()),
            (_, published_at) => published_at,
        };

        Self {
            id,
            title: input.title,
            excerpt: input.excerpt,
            content: input.content,
            image_url: input.image_url,
            author: input.author,
            published: input.published,
            published_at,
            tags: Json(input.tags),
            created_at: created_at.to_string(),
            updated_at: updated_at.to_string(),
        }
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.title)
            .bind(&self.excerpt)
            .bind(&self.content)
            .bind(&self.image_url)
            .bind(&self.author)
            .bind(self.published)
            .bind(&self.published_at)
            .bind(&self.tags)
            .bind(&self.created_at)
            .bind(&self.updated_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(published: bool, published_at: Option<&str>) -> NewsArticleInput {
        NewsArticleInput {
            title: "Clinic day".to_string(),
            excerpt: None,
            content: "We vaccinated 200 dogs.".to_string(),
            image_url: None,
            author: None,
            published,
            published_at: published_at.map(str::to_string),
            tags: vec!["clinic".to_string()],
        }
    }

    #[test]
    fn test_publishing_stamps_published_at() {
        let article = NewsArticle::build(1, input(true, None), "t0", "t1");
        assert_eq!(article.published_at.as_deref(), Some("t1"));
    }

    #[test]
    fn test_explicit_published_at_is_kept() {
        let article = NewsArticle::build(1, input(true, Some("2024-05-01")), "t0", "t1");
        assert_eq!(article.published_at.as_deref(), Some("2024-05-01"));
    }

    #[test]
    fn test_draft_has_no_published_at() {
        let article = NewsArticle::build(1, input(false, None), "t0", "t1");
        assert!(article.published_at.is_none());
        assert_eq!(article.tags.0, vec!["clinic".to_string()]);
    }
}
