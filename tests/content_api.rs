//! CRUD behaviour of the content collections.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, build_test_app, TestApp};
use serde_json::{json, Value};

fn mission(title: &str) -> Value {
    json!({
        "title": title,
        "location": "Kisumu",
        "country": "Kenya",
        "description": "Village clinics and vaccination drives.",
        "status": "upcoming",
        "start_date": "2025-03-01",
        "end_date": "2025-03-14",
        "volunteers": 12,
        "highlights": ["Rabies vaccinations", "Spay and neuter clinic"]
    })
}

async fn create(app: &TestApp, token: &str, uri: &str, body: Value) -> Value {
    let response = app
        .request(Method::POST, uri, Some(token), Some(body))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[tokio::test]
async fn writes_require_authentication() {
    let app = build_test_app(false).await;

    let response = app
        .request(Method::POST, "/api/missions", None, Some(mission("Kisumu 2025")))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(Method::DELETE, "/api/missions/1", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn mission_lifecycle() {
    let app = build_test_app(false).await;
    let token = app.login().await;

    let created = create(&app, &token, "/api/missions", mission("Kisumu 2025")).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["highlights"][1], "Spay and neuter clinic");
    assert_eq!(created["animals_treated"], 0);

    // Public read
    let response = app.get(&format!("/api/missions/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["title"], "Kisumu 2025");

    // Full replacement
    let mut update = mission("Kisumu 2025");
    update["status"] = json!("completed");
    update["animals_treated"] = json!(1450);
    let response = app
        .request(
            Method::PUT,
            &format!("/api/missions/{id}"),
            Some(&token),
            Some(update),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["status"], "completed");
    assert_eq!(updated["animals_treated"], 1450);
    assert_eq!(updated["created_at"], created["created_at"]);

    let response = app
        .request(Method::DELETE, &format!("/api/missions/{id}"), Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.get(&format!("/api/missions/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(Method::DELETE, &format!("/api/missions/{id}"), Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missions_are_listed_newest_first() {
    let app = build_test_app(false).await;
    let token = app.login().await;

    create(&app, &token, "/api/missions", mission("First")).await;
    create(&app, &token, "/api/missions", mission("Second")).await;

    let list = body_json(app.get("/api/missions").await).await;
    let titles: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Second", "First"]);
}

#[tokio::test]
async fn invalid_input_returns_field_errors() {
    let app = build_test_app(false).await;
    let token = app.login().await;

    let mut bad = mission("");
    bad["status"] = json!("cancelled");
    let response = app
        .request(Method::POST, "/api/missions", Some(&token), Some(bad))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
    assert!(json["error"]["details"]["title"].is_array());
    assert!(json["error"]["details"]["status"].is_array());
}

#[tokio::test]
async fn malformed_ids_are_rejected() {
    let app = build_test_app(false).await;

    let response = app.get("/api/missions/abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.get("/api/team/999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn news_drafts_are_hidden_from_the_public() {
    let app = build_test_app(false).await;
    let token = app.login().await;

    let published = create(
        &app,
        &token,
        "/api/news",
        json!({ "title": "Back from Kisumu", "content": "1,450 animals treated.", "published": true }),
    )
    .await;
    assert!(published["published_at"].is_string());

    let draft = create(
        &app,
        &token,
        "/api/news",
        json!({ "title": "Next trip", "content": "TBD", "published": false }),
    )
    .await;
    let draft_id = draft["id"].as_i64().unwrap();

    let public = body_json(app.get("/api/news").await).await;
    assert_eq!(public.as_array().unwrap().len(), 1);
    assert_eq!(public[0]["title"], "Back from Kisumu");

    let response = app.get(&format!("/api/news/{draft_id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(Method::GET, "/api/news", Some(&token), None)
        .await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

    let response = app
        .request(Method::GET, &format!("/api/news/{draft_id}"), Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn gallery_can_be_filtered_by_mission() {
    let app = build_test_app(false).await;
    let token = app.login().await;

    for (title, mission_id) in [("Clinic", Some(1)), ("Village", Some(2)), ("Team", None)] {
        create(
            &app,
            &token,
            "/api/gallery",
            json!({ "title": title, "image_url": "/uploads/a.jpg", "mission_id": mission_id }),
        )
        .await;
    }

    let items = body_json(app.get("/api/gallery/mission/2").await).await;
    assert_eq!(items.as_array().unwrap().len(), 1);
    assert_eq!(items[0]["title"], "Village");

    let all = body_json(app.get("/api/gallery").await).await;
    assert_eq!(all.as_array().unwrap().len(), 3);

    let response = app.get("/api/gallery/mission/zero").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn team_is_ordered_by_display_order() {
    let app = build_test_app(false).await;
    let token = app.login().await;

    create(&app, &token, "/api/team", json!({ "name": "Bea", "role": "Vet", "display_order": 2 })).await;
    create(&app, &token, "/api/team", json!({ "name": "Ali", "role": "Director", "display_order": 1 })).await;

    let team = body_json(app.get("/api/team").await).await;
    assert_eq!(team[0]["name"], "Ali");
    assert_eq!(team[1]["name"], "Bea");
}

#[tokio::test]
async fn homepage_only_shows_active_items() {
    let app = build_test_app(false).await;
    let token = app.login().await;

    create(
        &app,
        &token,
        "/api/homepage/slides",
        json!({ "title": "Live", "image_url": "/images/a.jpg" }),
    )
    .await;
    create(
        &app,
        &token,
        "/api/homepage/slides",
        json!({ "title": "Retired", "image_url": "/images/b.jpg", "active": false }),
    )
    .await;
    create(
        &app,
        &token,
        "/api/homepage/testimonials",
        json!({ "name": "Sam", "quote": "Life changing." }),
    )
    .await;

    let homepage = body_json(app.get("/api/homepage").await).await;
    assert_eq!(homepage["slides"].as_array().unwrap().len(), 1);
    assert_eq!(homepage["slides"][0]["title"], "Live");
    assert_eq!(homepage["testimonials"][0]["name"], "Sam");

    let response = app
        .request(Method::GET, "/api/homepage/slides", Some(&token), None)
        .await;
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn project_summary_totals_funding() {
    let app = build_test_app(false).await;
    let token = app.login().await;

    create(
        &app,
        &token,
        "/api/projects",
        json!({ "title": "Clinic van", "goal_amount": 30000.0, "raised_amount": 12000.0 }),
    )
    .await;
    create(
        &app,
        &token,
        "/api/projects",
        json!({ "title": "Kennels", "status": "funded", "goal_amount": 10000.0, "raised_amount": 10000.0 }),
    )
    .await;

    let summary = body_json(app.get("/api/projects/summary").await).await;
    assert_eq!(summary["project_count"], 2);
    assert_eq!(summary["active_count"], 1);
    assert_eq!(summary["goal_total"], 40000.0);
    assert_eq!(summary["raised_total"], 22000.0);
    assert_eq!(summary["progress_percent"], 55.0);
}
