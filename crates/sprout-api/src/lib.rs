//! JSON REST API for Sprout.
//!
//! Exposes an axum [`Router`] backed by any
//! [`sprout_core::store::AssessmentStore`]. Paths and status codes follow
//! the original deployment: trailing slashes, 400 for validation, 401 for
//! anything credential-shaped, 403 for non-staff writes, 405 from the
//! method router for unsupported verbs.

pub mod assessment;
pub mod auth;
pub mod children;
pub mod error;
pub mod user;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, patch, post},
};
use serde::Deserialize;
use sprout_core::store::AssessmentStore;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// `SPROUT_*` environment.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: AssessmentStore> {
  pub store: Arc<S>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full Sprout [`Router`] for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Identity
    .route("/user/create/", post(user::create::<S>))
    .route("/user/token/", post(user::token::<S>))
    .route(
      "/user/profile/",
      get(user::profile::<S>).patch(user::update_profile::<S>),
    )
    // Children
    .route("/user/child/", post(children::create::<S>))
    .route(
      "/user/child/{id}/",
      get(children::get_one::<S>)
        .patch(children::update::<S>)
        .delete(children::delete::<S>),
    )
    .route(
      "/user/child/{id}/comments/",
      get(children::list_comments::<S>).post(children::add_comment::<S>),
    )
    .route("/user/child/{id}/tests/", post(children::assign_test::<S>))
    .route("/user/child/{id}/records/", get(children::list_records::<S>))
    .route(
      "/user/child/{id}/records/{record_id}/",
      patch(children::update_record::<S>),
    )
    // Catalog
    .route(
      "/assessment/view/",
      get(assessment::list::<S>).post(assessment::create::<S>),
    )
    .route(
      "/assessment/view/{id}/",
      get(assessment::detail::<S>)
        .patch(assessment::update::<S>)
        .delete(assessment::delete::<S>),
    )
    .route("/assessment/category/", post(assessment::create_category::<S>))
    .route("/assessment/item/", post(assessment::create_item::<S>))
    .route("/assessment/item/{id}/", get(assessment::item_detail::<S>))
    .route(
      "/assessment/item/{id}/percentiles/",
      post(assessment::add_percentile::<S>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use serde_json::{Value, json};
  use sprout_core::{
    account::{NewAccount, Role},
    store::AssessmentStore as _,
  };
  use sprout_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState { store: Arc::new(store) }
  }

  async fn oneshot(
    state: &AppState<SqliteStore>,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
      builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
    }
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    router(state.clone()).oneshot(req).await.unwrap()
  }

  async fn body_json(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  /// Register through the public endpoint and return an issued token.
  async fn signup(
    state: &AppState<SqliteStore>,
    email: &str,
    password: &str,
    role: &str,
  ) -> String {
    let resp = oneshot(
      state,
      "POST",
      "/user/create/",
      None,
      Some(json!({
        "email": email,
        "name": "Test User",
        "password": password,
        "role": role,
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    login(state, email, password).await
  }

  async fn login(
    state: &AppState<SqliteStore>,
    email: &str,
    password: &str,
  ) -> String {
    let resp = oneshot(
      state,
      "POST",
      "/user/token/",
      None,
      Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await["token"].as_str().unwrap().to_string()
  }

  /// Create a staff account directly in the store (registration never grants
  /// the staff flag) and log in through the API.
  async fn staff_token(state: &AppState<SqliteStore>) -> String {
    state
      .store
      .create_account(NewAccount {
        email:         "staff@example.com".to_string(),
        name:          "Admin".to_string(),
        password_hash: auth::hash_password("staffpass").unwrap(),
        role:          Role::Staff,
        is_staff:      true,
      })
      .await
      .unwrap();
    login(state, "staff@example.com", "staffpass").await
  }

  /// Seed a catalog through the staff endpoints: one test, two categories,
  /// three items. Returns (test_id, item_ids).
  async fn seed_catalog(
    state: &AppState<SqliteStore>,
    staff: &str,
  ) -> (i64, Vec<i64>) {
    let resp = oneshot(
      state,
      "POST",
      "/assessment/view/",
      Some(staff),
      Some(json!({ "name": "Denver II" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let test_id = body_json(resp).await["test_id"].as_i64().unwrap();

    let mut category_ids = Vec::new();
    for name in ["Motor Development", "Language"] {
      let resp = oneshot(
        state,
        "POST",
        "/assessment/category/",
        Some(staff),
        Some(json!({ "test_id": test_id, "name": name })),
      )
      .await;
      assert_eq!(resp.status(), StatusCode::CREATED);
      category_ids.push(body_json(resp).await["category_id"].as_i64().unwrap());
    }

    let mut item_ids = Vec::new();
    for (category_id, step, instruction) in [
      (category_ids[0], 1, "testing item1"),
      (category_ids[0], 2, "testing item2"),
      (category_ids[1], 3, "testing item3"),
    ] {
      let resp = oneshot(
        state,
        "POST",
        "/assessment/item/",
        Some(staff),
        Some(json!({
          "test_id": test_id,
          "category_id": category_id,
          "step": step,
          "instruction": instruction,
        })),
      )
      .await;
      assert_eq!(resp.status(), StatusCode::CREATED);
      item_ids.push(body_json(resp).await["item_id"].as_i64().unwrap());
    }

    (test_id, item_ids)
  }

  // ── Registration ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn register_returns_201_without_password() {
    let state = make_state().await;
    let resp = oneshot(
      &state,
      "POST",
      "/user/create/",
      None,
      Some(json!({
        "email": "Test@Example.com",
        "name": "newuser",
        "password": "testpass",
        "role": "Parent",
      })),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = body_json(resp).await;
    assert_eq!(body["email"], "test@example.com");
    assert_eq!(body["role"], "Parent");
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());
  }

  #[tokio::test]
  async fn register_duplicate_email_is_400() {
    let state = make_state().await;
    signup(&state, "dup@example.com", "testpass", "Parent").await;

    let resp = oneshot(
      &state,
      "POST",
      "/user/create/",
      None,
      Some(json!({
        "email": "dup@example.com",
        "name": "other",
        "password": "qwewer2123",
        "role": "Parent",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn register_short_password_is_400_and_nothing_persisted() {
    let state = make_state().await;
    let resp = oneshot(
      &state,
      "POST",
      "/user/create/",
      None,
      Some(json!({
        "email": "short@example.com",
        "name": "testuser",
        "password": "pwd",
        "role": "Tester",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let stored = state
      .store
      .account_by_email("short@example.com".to_string())
      .await
      .unwrap();
    assert!(stored.is_none());
  }

  #[tokio::test]
  async fn register_invalid_role_is_400_and_nothing_persisted() {
    let state = make_state().await;
    for role in ["SuperAd", ""] {
      let resp = oneshot(
        &state,
        "POST",
        "/user/create/",
        None,
        Some(json!({
          "email": "role@example.com",
          "name": "testuser",
          "password": "pwdqwerty1",
          "role": role,
        })),
      )
      .await;
      assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    let stored = state
      .store
      .account_by_email("role@example.com".to_string())
      .await
      .unwrap();
    assert!(stored.is_none());
  }

  // ── Token issuance ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn token_issued_for_valid_credentials() {
    let state = make_state().await;
    // signup() already asserts a token comes back.
    let token = signup(&state, "bob@example.com", "pwdqwerty1", "Tester").await;
    assert_eq!(token.len(), 64);
  }

  #[tokio::test]
  async fn token_bad_credentials_is_401() {
    let state = make_state().await;
    signup(&state, "bob@example.com", "Validpass", "Tester").await;

    for password in ["Invalidpass", ""] {
      let resp = oneshot(
        &state,
        "POST",
        "/user/token/",
        None,
        Some(json!({ "email": "bob@example.com", "password": password })),
      )
      .await;
      assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
      let body = body_json(resp).await;
      assert!(body.get("token").is_none());
    }
  }

  #[tokio::test]
  async fn token_unknown_email_is_401() {
    let state = make_state().await;
    let resp = oneshot(
      &state,
      "POST",
      "/user/token/",
      None,
      Some(json!({ "email": "ghost@example.com", "password": "whatever" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  // ── Profile ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn profile_requires_token() {
    let state = make_state().await;
    let resp = oneshot(&state, "GET", "/user/profile/", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn profile_returns_email_name_role() {
    let state = make_state().await;
    let token = signup(&state, "alice@example.com", "testpass", "Parent").await;

    let resp =
      oneshot(&state, "GET", "/user/profile/", Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(
      body,
      json!({ "email": "alice@example.com", "name": "Test User", "role": "Parent" })
    );
  }

  #[tokio::test]
  async fn profile_post_is_405() {
    let state = make_state().await;
    let token = signup(&state, "alice@example.com", "testpass", "Parent").await;

    let resp = oneshot(
      &state,
      "POST",
      "/user/profile/",
      Some(&token),
      Some(json!({})),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
  }

  #[tokio::test]
  async fn profile_patch_rehashes_password() {
    let state = make_state().await;
    let token = signup(&state, "alice@example.com", "testpass", "Parent").await;

    let resp = oneshot(
      &state,
      "PATCH",
      "/user/profile/",
      Some(&token),
      Some(json!({ "password": "NewPassword" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Old credential is dead, new one works.
    let resp = oneshot(
      &state,
      "POST",
      "/user/token/",
      None,
      Some(json!({ "email": "alice@example.com", "password": "testpass" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    login(&state, "alice@example.com", "NewPassword").await;
  }

  #[tokio::test]
  async fn profile_patch_never_changes_role() {
    let state = make_state().await;
    let token = signup(&state, "alice@example.com", "testpass", "Parent").await;

    let resp = oneshot(
      &state,
      "PATCH",
      "/user/profile/",
      Some(&token),
      Some(json!({
        "name": "NewUserName",
        "password": "NewPassword134",
        "email": "newemail@example.com",
        "role": "Tester",
      })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["name"], "NewUserName");
    assert_eq!(body["email"], "newemail@example.com");
    // The role field was silently dropped.
    assert_eq!(body["role"], "Parent");
  }

  // ── Catalog access control ────────────────────────────────────────────────

  #[tokio::test]
  async fn assessment_list_is_public() {
    let state = make_state().await;
    let staff = staff_token(&state).await;
    seed_catalog(&state, &staff).await;

    let resp = oneshot(&state, "GET", "/assessment/view/", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn assessment_detail_requires_auth() {
    let state = make_state().await;
    let staff = staff_token(&state).await;
    let (test_id, _) = seed_catalog(&state, &staff).await;

    let uri = format!("/assessment/view/{test_id}/");
    let resp = oneshot(&state, "GET", &uri, None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = oneshot(&state, "GET", &uri, Some(&staff), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn assessment_detail_orders_items_by_category_and_step() {
    let state = make_state().await;
    let staff = staff_token(&state).await;
    let (test_id, _) = seed_catalog(&state, &staff).await;

    let resp = oneshot(
      &state,
      "GET",
      &format!("/assessment/view/{test_id}/"),
      Some(&staff),
      None,
    )
    .await;
    let body = body_json(resp).await;

    let categories = body["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 2);
    let steps: Vec<i64> = categories
      .iter()
      .flat_map(|c| c["items"].as_array().unwrap())
      .map(|i| i["step"].as_i64().unwrap())
      .collect();
    assert_eq!(steps, vec![1, 2, 3]);
    // Nested items carry no linkage ids.
    assert!(categories[0]["items"][0].get("test_id").is_none());
  }

  #[tokio::test]
  async fn assessment_mutation_is_staff_only() {
    let state = make_state().await;
    let staff = staff_token(&state).await;
    let (test_id, _) = seed_catalog(&state, &staff).await;
    let parent = signup(&state, "parent@example.com", "testpass", "Parent").await;

    let uri = format!("/assessment/view/{test_id}/");
    let patch_body = json!({ "name": "Renamed" });

    // Unauthenticated → 401.
    let resp =
      oneshot(&state, "PATCH", &uri, None, Some(patch_body.clone())).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // Authenticated non-staff → 403, on PATCH and DELETE alike.
    let resp =
      oneshot(&state, "PATCH", &uri, Some(&parent), Some(patch_body.clone()))
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let resp = oneshot(&state, "DELETE", &uri, Some(&parent), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Staff PATCH is reflected on immediate re-read.
    let resp =
      oneshot(&state, "PATCH", &uri, Some(&staff), Some(patch_body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = oneshot(&state, "GET", &uri, Some(&staff), None).await;
    assert_eq!(body_json(resp).await["name"], "Renamed");
  }

  #[tokio::test]
  async fn assessment_staff_delete_cascades() {
    let state = make_state().await;
    let staff = staff_token(&state).await;
    let (test_id, item_ids) = seed_catalog(&state, &staff).await;

    let resp = oneshot(
      &state,
      "DELETE",
      &format!("/assessment/view/{test_id}/"),
      Some(&staff),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = oneshot(
      &state,
      "GET",
      &format!("/assessment/view/{test_id}/"),
      Some(&staff),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = oneshot(
      &state,
      "GET",
      &format!("/assessment/item/{}/", item_ids[0]),
      Some(&staff),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Item percentiles ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn item_percentiles_round_trip_and_sentinel() {
    let state = make_state().await;
    let staff = staff_token(&state).await;
    let (_, item_ids) = seed_catalog(&state, &staff).await;
    let item = item_ids[0];

    // No entries yet: explicit null, not an empty object.
    let uri = format!("/assessment/item/{item}/");
    let resp = oneshot(&state, "GET", &uri, Some(&staff), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await["percentiles"].is_null());

    for (month, percent) in [(12, 25), (13, 50)] {
      let resp = oneshot(
        &state,
        "POST",
        &format!("/assessment/item/{item}/percentiles/"),
        Some(&staff),
        Some(json!({ "month": month, "percent": percent })),
      )
      .await;
      assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = oneshot(&state, "GET", &uri, Some(&staff), None).await;
    let body = body_json(resp).await;
    assert_eq!(body["percentiles"], json!({ "12": 25, "13": 50 }));
  }

  // ── Children ──────────────────────────────────────────────────────────────

  async fn make_child(
    state: &AppState<SqliteStore>,
    token: &str,
    birthday: &str,
  ) -> i64 {
    let resp = oneshot(
      state,
      "POST",
      "/user/child/",
      Some(token),
      Some(json!({ "name": "Robin", "birthday": birthday })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    body_json(resp).await["child_id"].as_i64().unwrap()
  }

  #[tokio::test]
  async fn child_create_and_detail_with_age() {
    let state = make_state().await;
    let token = signup(&state, "parent@example.com", "testpass", "Parent").await;

    let birthday = (chrono::Utc::now().date_naive()
      - chrono::Days::new(360))
    .format("%Y-%m-%d")
    .to_string();
    let child_id = make_child(&state, &token, &birthday).await;

    let resp = oneshot(
      &state,
      "GET",
      &format!("/user/child/{child_id}/"),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["name"], "Robin");
    assert_eq!(body["age_in_months"], 12);
    assert!(body["slug"].is_string());
    assert_eq!(body["comments"], json!([]));
  }

  #[tokio::test]
  async fn child_of_another_account_is_401_on_every_verb() {
    let state = make_state().await;
    let owner = signup(&state, "owner@example.com", "testpass", "Parent").await;
    let other = signup(&state, "other@example.com", "testpass", "Tester").await;
    let child_id = make_child(&state, &owner, "2022-03-14").await;

    let uri = format!("/user/child/{child_id}/");
    let resp = oneshot(&state, "GET", &uri, Some(&other), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = oneshot(
      &state,
      "PATCH",
      &uri,
      Some(&other),
      Some(json!({ "name": "Stolen" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let resp = oneshot(&state, "DELETE", &uri, Some(&other), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn child_update_and_delete() {
    let state = make_state().await;
    let token = signup(&state, "parent@example.com", "testpass", "Parent").await;
    let child_id = make_child(&state, &token, "2022-03-14").await;

    let uri = format!("/user/child/{child_id}/");
    let resp = oneshot(
      &state,
      "PATCH",
      &uri,
      Some(&token),
      Some(json!({ "name": "Robyn" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["name"], "Robyn");

    let resp = oneshot(&state, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // Gone means unlinked, which reads as 401 here.
    let resp = oneshot(&state, "GET", &uri, Some(&token), None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn child_comments_round_trip() {
    let state = make_state().await;
    let token = signup(&state, "parent@example.com", "testpass", "Parent").await;
    let child_id = make_child(&state, &token, "2022-03-14").await;

    let uri = format!("/user/child/{child_id}/comments/");
    let resp = oneshot(
      &state,
      "POST",
      &uri,
      Some(&token),
      Some(json!({ "comment": "NewComment" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = oneshot(&state, "GET", &uri, Some(&token), None).await;
    let body = body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["comment"], "NewComment");

    let resp = oneshot(
      &state,
      "POST",
      &uri,
      Some(&token),
      Some(json!({ "comment": "   " })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Progress ledger ───────────────────────────────────────────────────────

  #[tokio::test]
  async fn assign_test_creates_records_and_rejects_repeat() {
    let state = make_state().await;
    let staff = staff_token(&state).await;
    let (test_id, item_ids) = seed_catalog(&state, &staff).await;
    let token = signup(&state, "parent@example.com", "testpass", "Parent").await;
    let child_id = make_child(&state, &token, "2022-03-14").await;

    let uri = format!("/user/child/{child_id}/tests/");
    let resp = oneshot(
      &state,
      "POST",
      &uri,
      Some(&token),
      Some(json!({ "test_id": test_id })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let records = body_json(resp).await;
    assert_eq!(records.as_array().unwrap().len(), item_ids.len());
    assert!(
      records
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["is_complete"] == json!(false))
    );

    // Second assignment of the same test is rejected.
    let resp = oneshot(
      &state,
      "POST",
      &uri,
      Some(&token),
      Some(json!({ "test_id": test_id })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // An unknown test is a 404.
    let resp = oneshot(
      &state,
      "POST",
      &uri,
      Some(&token),
      Some(json!({ "test_id": 999 })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn record_completion_flow() {
    let state = make_state().await;
    let staff = staff_token(&state).await;
    let (test_id, _) = seed_catalog(&state, &staff).await;
    let token = signup(&state, "parent@example.com", "testpass", "Parent").await;
    let child_id = make_child(&state, &token, "2022-03-14").await;

    let resp = oneshot(
      &state,
      "POST",
      &format!("/user/child/{child_id}/tests/"),
      Some(&token),
      Some(json!({ "test_id": test_id })),
    )
    .await;
    let record_id = body_json(resp).await[0]["record_id"].as_i64().unwrap();

    let resp = oneshot(
      &state,
      "PATCH",
      &format!("/user/child/{child_id}/records/{record_id}/"),
      Some(&token),
      Some(json!({ "is_complete": true })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["is_complete"], json!(true));

    let resp = oneshot(
      &state,
      "GET",
      &format!("/user/child/{child_id}/records/"),
      Some(&token),
      None,
    )
    .await;
    let records = body_json(resp).await;
    let completed: Vec<bool> = records
      .as_array()
      .unwrap()
      .iter()
      .map(|r| r["is_complete"].as_bool().unwrap())
      .collect();
    assert_eq!(completed.iter().filter(|c| **c).count(), 1);
  }
}
