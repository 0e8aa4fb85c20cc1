//! Handlers for the `/assessment/` endpoints: catalog browsing and staff
//! authoring.
//!
//! The test list is public. Detail reads require a token. Every mutating
//! verb additionally requires the staff flag — 403 for an authenticated
//! non-staff caller, 401 for an anonymous one.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use sprout_core::{
  catalog::{Category, Item, NewItem, PercentileTable, Test, TestDetail},
  store::AssessmentStore,
};

use crate::{
  AppState,
  auth::{CurrentAccount, require_staff},
  error::ApiError,
};

// ─── Tests ───────────────────────────────────────────────────────────────────

/// `GET /assessment/view/` — all tests, no auth required.
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Test>>, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let tests = state.store.list_tests().await.map_err(ApiError::store)?;
  Ok(Json(tests))
}

#[derive(Debug, Deserialize)]
pub struct TestBody {
  pub name: String,
}

/// `POST /assessment/view/` — create a test (staff only).
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentAccount(account): CurrentAccount,
  Json(body): Json<TestBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_staff(&account)?;

  let test = state
    .store
    .create_test(body.name)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(test)))
}

/// `GET /assessment/view/{id}/` — nested detail: categories with their items
/// ordered by (category, step).
pub async fn detail<S>(
  State(state): State<AppState<S>>,
  CurrentAccount(_account): CurrentAccount,
  Path(test_id): Path<i64>,
) -> Result<Json<TestDetail>, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let detail = state
    .store
    .test_detail(test_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("test {test_id} not found")))?;
  Ok(Json(detail))
}

/// `PATCH /assessment/view/{id}/` — rename (staff only).
pub async fn update<S>(
  State(state): State<AppState<S>>,
  CurrentAccount(account): CurrentAccount,
  Path(test_id): Path<i64>,
  Json(body): Json<TestBody>,
) -> Result<Json<Test>, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_staff(&account)?;

  let test = state
    .store
    .rename_test(test_id, body.name)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("test {test_id} not found")))?;
  Ok(Json(test))
}

/// `DELETE /assessment/view/{id}/` — delete with cascade (staff only).
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  CurrentAccount(account): CurrentAccount,
  Path(test_id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_staff(&account)?;

  if !state
    .store
    .delete_test(test_id)
    .await
    .map_err(ApiError::store)?
  {
    return Err(ApiError::NotFound(format!("test {test_id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}

// ─── Categories and items ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CategoryBody {
  pub test_id: i64,
  pub name:    String,
}

/// `POST /assessment/category/` — create a category under a test (staff only).
pub async fn create_category<S>(
  State(state): State<AppState<S>>,
  CurrentAccount(account): CurrentAccount,
  Json(body): Json<CategoryBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_staff(&account)?;

  let category: Category = state
    .store
    .create_category(body.test_id, body.name)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("test {} not found", body.test_id))
    })?;
  Ok((StatusCode::CREATED, Json(category)))
}

/// `POST /assessment/item/` — create an item (staff only). The category must
/// belong to the named test.
pub async fn create_item<S>(
  State(state): State<AppState<S>>,
  CurrentAccount(account): CurrentAccount,
  Json(body): Json<NewItem>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_staff(&account)?;

  let item: Item = state
    .store
    .create_item(body)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::Validation(
        "category does not exist or does not belong to the test".to_string(),
      )
    })?;
  Ok((StatusCode::CREATED, Json(item)))
}

// ─── Item detail and percentiles ─────────────────────────────────────────────

/// An item with its percentile lookup table. `percentiles` is `null` when no
/// entries exist — the explicit "no data" sentinel, never an empty object.
#[derive(Debug, Serialize, Deserialize)]
pub struct ItemDetailBody {
  #[serde(flatten)]
  pub item:        Item,
  pub percentiles: Option<PercentileTable>,
}

/// `GET /assessment/item/{id}/`
pub async fn item_detail<S>(
  State(state): State<AppState<S>>,
  CurrentAccount(_account): CurrentAccount,
  Path(item_id): Path<i64>,
) -> Result<Json<ItemDetailBody>, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let item = state
    .store
    .get_item(item_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("item {item_id} not found")))?;

  let percentiles = state
    .store
    .item_percentiles(item_id)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(ItemDetailBody { item, percentiles }))
}

#[derive(Debug, Deserialize)]
pub struct PercentileBody {
  pub month:   i64,
  pub percent: i64,
}

/// `POST /assessment/item/{id}/percentiles/` — record one (month, percent)
/// entry (staff only). Repeating a month replaces its percent.
pub async fn add_percentile<S>(
  State(state): State<AppState<S>>,
  CurrentAccount(account): CurrentAccount,
  Path(item_id): Path<i64>,
  Json(body): Json<PercentileBody>,
) -> Result<StatusCode, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  require_staff(&account)?;

  if !state
    .store
    .add_percentile(item_id, body.month, body.percent)
    .await
    .map_err(ApiError::store)?
  {
    return Err(ApiError::NotFound(format!("item {item_id} not found")));
  }
  Ok(StatusCode::CREATED)
}
