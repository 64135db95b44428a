//! Homepage content: hero slides and testimonials.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db::{Entity, Order, SqliteQuery};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HeroSlide {
    pub id: i64,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub cta_text: Option<String>,
    pub cta_link: Option<String>,
    pub display_order: i64,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeroSlideInput {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub image_url: String,
    #[serde(default)]
    pub cta_text: Option<String>,
    #[serde(default)]
    pub cta_link: Option<String>,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Testimonial {
    pub id: i64,
    pub name: String,
    pub role: Option<String>,
    pub quote: String,
    pub image_url: Option<String>,
    pub display_order: i64,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestimonialInput {
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    pub quote: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Everything the home page renders in one response
#[derive(Debug, Clone, Serialize)]
pub struct HomepageContent {
    pub slides: Vec<HeroSlide>,
    pub testimonials: Vec<Testimonial>,
}

impl Entity for HeroSlide {
    const TABLE: &'static str = "hero_slides";
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "subtitle",
        "image_url",
        "cta_text",
        "cta_link",
        "display_order",
        "active",
        "created_at",
        "updated_at",
    ];
    const ORDER: Order = Order::asc("display_order");

    type Input = HeroSlideInput;

    fn id(&self) -> i64 {
        self.id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn build(id: i64, input: HeroSlideInput, created_at: &str, updated_at: &str) -> Self {
        Self {
            id,
            title: input.title,
            subtitle: input.subtitle,
            image_url: input.image_url,
            cta_text: input.cta_text,
            cta_link: input.cta_link,
            display_order: input.display_order,
            active: input.active,
            created_at: created_at.to_string(),
            updated_at: updated_at.to_string(),
        }
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.title)
            .bind(&self.subtitle)
            .bind(&self.image_url)
            .bind(&self.cta_text)
            .bind(&self.cta_link)
            .bind(self.display_order)
            .bind(self.active)
            .bind(&self.created_at)
            .bind(&self.updated_at)
    }
}

impl Entity for Testimonial {
    const TABLE: &'static str = "testimonials";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "role",
        "quote",
        "image_url",
        "display_order",
        "active",
        "created_at",
        "updated_at",
    ];
    const ORDER: Order = Order::asc("display_order");

    type Input = TestimonialInput;

    fn id(&self) -> i64 {
        self.id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn build(id: i64, input: TestimonialInput, created_at: &str, updated_at: &str) -> Self {
        Self {
            id,
            name: input.name,
            role: input.role,
            quote: input.quote,
            image_url: input.image_url,
            display_order: input.display_order,
            active: input.active,
            created_at: created_at.to_string(),
            updated_at: updated_at.to_string(),
        }
    }

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.name)
            .bind(&self.role)
            .bind(&self.quote)
            .bind(&self.image_url)
            .bind(self.display_order)
            .bind(self.active)
            .bind(&self.created_at)
            .bind(&self.updated_at)
    }
}
