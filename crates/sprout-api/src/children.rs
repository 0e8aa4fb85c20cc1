//! Handlers for the `/user/child/` endpoints: child management, comments,
//! test assignment, and progress records.
//!
//! A child is fully private: every verb against a child that is not linked
//! to the caller's account is rejected with 401, staff or not.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sprout_core::{
  child::{Child, ChildUpdate, ChildView, Comment, NewChild},
  progress::{AssignOutcome, ProgressRecord},
  store::AssessmentStore,
};

use crate::{AppState, auth::CurrentAccount, error::ApiError};

/// Resolve a child the caller is allowed to touch. Unlinked children —
/// including nonexistent ids — are indistinguishable from a missing token.
async fn linked_child<S>(
  state: &AppState<S>,
  account_id: i64,
  child_id: i64,
) -> Result<Child, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if !state
    .store
    .child_linked(account_id, child_id)
    .await
    .map_err(ApiError::store)?
  {
    return Err(ApiError::Unauthorized);
  }

  state
    .store
    .get_child(child_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("child {child_id} not found")))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /user/child/` — create a child linked to the caller.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentAccount(account): CurrentAccount,
  Json(body): Json<NewChild>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let child = state
    .store
    .create_child(account.account_id, body)
    .await
    .map_err(ApiError::store)?;

  Ok((StatusCode::CREATED, Json(child.view(Utc::now().date_naive()))))
}

// ─── Detail / update / delete ────────────────────────────────────────────────

/// A child with its comments, as returned by the detail endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChildDetailBody {
  #[serde(flatten)]
  pub child:    ChildView,
  pub comments: Vec<Comment>,
}

/// `GET /user/child/{id}/`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  CurrentAccount(account): CurrentAccount,
  Path(child_id): Path<i64>,
) -> Result<Json<ChildDetailBody>, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let child = linked_child(&state, account.account_id, child_id).await?;
  let comments = state
    .store
    .comments_for_child(child_id)
    .await
    .map_err(ApiError::store)?;

  Ok(Json(ChildDetailBody {
    child: child.view(Utc::now().date_naive()),
    comments,
  }))
}

/// `PATCH /user/child/{id}/`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  CurrentAccount(account): CurrentAccount,
  Path(child_id): Path<i64>,
  Json(body): Json<ChildUpdate>,
) -> Result<Json<ChildView>, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  linked_child(&state, account.account_id, child_id).await?;

  let updated = state
    .store
    .update_child(child_id, body)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("child {child_id} not found")))?;

  Ok(Json(updated.view(Utc::now().date_naive())))
}

/// `DELETE /user/child/{id}/`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  CurrentAccount(account): CurrentAccount,
  Path(child_id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  linked_child(&state, account.account_id, child_id).await?;

  state
    .store
    .delete_child(child_id)
    .await
    .map_err(ApiError::store)?;

  Ok(StatusCode::NO_CONTENT)
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub comment: String,
}

/// `GET /user/child/{id}/comments/`
pub async fn list_comments<S>(
  State(state): State<AppState<S>>,
  CurrentAccount(account): CurrentAccount,
  Path(child_id): Path<i64>,
) -> Result<Json<Vec<Comment>>, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  linked_child(&state, account.account_id, child_id).await?;

  let comments = state
    .store
    .comments_for_child(child_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(comments))
}

/// `POST /user/child/{id}/comments/`
pub async fn add_comment<S>(
  State(state): State<AppState<S>>,
  CurrentAccount(account): CurrentAccount,
  Path(child_id): Path<i64>,
  Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  linked_child(&state, account.account_id, child_id).await?;

  if body.comment.trim().is_empty() {
    return Err(ApiError::Validation("comment must not be empty".to_string()));
  }

  let comment = state
    .store
    .add_comment(child_id, body.comment)
    .await
    .map_err(ApiError::store)?;

  Ok((StatusCode::CREATED, Json(comment)))
}

// ─── Test assignment ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AssignBody {
  pub test_id: i64,
}

/// `POST /user/child/{id}/tests/` — assign a test: one incomplete progress
/// record per item of the test. Assigning the same test again is a 400.
pub async fn assign_test<S>(
  State(state): State<AppState<S>>,
  CurrentAccount(account): CurrentAccount,
  Path(child_id): Path<i64>,
  Json(body): Json<AssignBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  linked_child(&state, account.account_id, child_id).await?;

  let outcome = state
    .store
    .assign_test(child_id, body.test_id)
    .await
    .map_err(ApiError::store)?;

  match outcome {
    AssignOutcome::Assigned(records) => {
      tracing::info!(
        child_id,
        test_id = body.test_id,
        records = records.len(),
        "test assigned"
      );
      Ok((StatusCode::CREATED, Json(records)))
    }
    AssignOutcome::AlreadyAssigned => Err(ApiError::Validation(
      "test already assigned to this child".to_string(),
    )),
    AssignOutcome::NoSuchTest => Err(ApiError::NotFound(format!(
      "test {} not found",
      body.test_id
    ))),
  }
}

/// `GET /user/child/{id}/records/`
pub async fn list_records<S>(
  State(state): State<AppState<S>>,
  CurrentAccount(account): CurrentAccount,
  Path(child_id): Path<i64>,
) -> Result<Json<Vec<ProgressRecord>>, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  linked_child(&state, account.account_id, child_id).await?;

  let records = state
    .store
    .records_for_child(child_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

#[derive(Debug, Deserialize)]
pub struct RecordBody {
  pub is_complete: bool,
}

/// `PATCH /user/child/{id}/records/{record_id}/`
pub async fn update_record<S>(
  State(state): State<AppState<S>>,
  CurrentAccount(account): CurrentAccount,
  Path((child_id, record_id)): Path<(i64, i64)>,
  Json(body): Json<RecordBody>,
) -> Result<Json<ProgressRecord>, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  linked_child(&state, account.account_id, child_id).await?;

  let record = state
    .store
    .set_record_complete(child_id, record_id, body.is_complete)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("record {record_id} not found"))
    })?;

  Ok(Json(record))
}
