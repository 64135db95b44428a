//! Starter content for a fresh installation
//!
//! Seeds a hero slide, a testimonial and the default site settings so the
//! public pages render something before an admin has logged in.

use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::info;

use super::{HeroSlide, HeroSlideInput, Store, StoreResult, Testimonial, TestimonialInput};

/// Settings every page expects to find
pub fn default_settings() -> BTreeMap<String, Value> {
    let mut settings = BTreeMap::new();
    settings.insert("site_name".to_string(), json!("Veterinary Mission"));
    settings.insert(
        "tagline".to_string(),
        json!("Bringing veterinary care to communities that need it most"),
    );
    settings.insert("contact_email".to_string(), json!("info@example.org"));
    settings.insert("contact_phone".to_string(), json!(""));
    settings.insert("donate_url".to_string(), json!(""));
    settings.insert(
        "social_links".to_string(),
        json!({ "facebook": "", "instagram": "", "youtube": "" }),
    );
    settings
}

/// Seed starter content. Does nothing (and returns `false`) if the store
/// already holds content.
pub async fn seed_defaults(store: &Store) -> StoreResult<bool> {
    if !store.is_empty().await? {
        info!("Store already has content, skipping seed");
        return Ok(false);
    }

    info!("Seeding starter content...");

    store
        .create::<HeroSlide>(HeroSlideInput {
            title: "Healing animals, supporting communities".to_string(),
            subtitle: Some("Volunteer veterinary teams on the ground since day one".to_string()),
            image_url: "/images/hero-default.jpg".to_string(),
            cta_text: Some("Support a mission".to_string()),
            cta_link: Some("/donate".to_string()),
            display_order: 0,
            active: true,
        })
        .await?;

    store
        .create::<Testimonial>(TestimonialInput {
            name: "Mission volunteer".to_string(),
            role: Some("Veterinary technician".to_string()),
            quote: "The most rewarding two weeks of my career.".to_string(),
            image_url: None,
            display_order: 0,
            active: true,
        })
        .await?;

    // Existing keys win; only fill what is missing
    let existing = store.settings().await?;
    let missing: BTreeMap<String, Value> = default_settings()
        .into_iter()
        .filter(|(key, _)| !existing.contains_key(key))
        .collect();
    store.save_settings(missing).await?;

    info!("Starter content seeded");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::JsonStore;

    #[tokio::test]
    async fn test_seed_only_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::Json(JsonStore::open(&dir.path().join("s.json")).await.unwrap());

        assert!(seed_defaults(&store).await.unwrap());
        assert!(!seed_defaults(&store).await.unwrap());

        let slides: Vec<HeroSlide> = store.list(None).await.unwrap();
        assert_eq!(slides.len(), 1);
    }

    #[tokio::test]
    async fn test_seed_keeps_existing_settings() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::Json(JsonStore::open(&dir.path().join("s.json")).await.unwrap());

        let mut custom = BTreeMap::new();
        custom.insert("site_name".to_string(), json!("Paws Abroad"));
        store.save_settings(custom).await.unwrap();

        seed_defaults(&store).await.unwrap();

        let settings = store.settings().await.unwrap();
        assert_eq!(settings["site_name"], json!("Paws Abroad"));
        assert!(settings.contains_key("tagline"));
    }
}
