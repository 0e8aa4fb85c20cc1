//! Handlers for the `/user/` endpoints: registration, token issuance, and
//! profile management.
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | `POST` | `/user/create/` | none |
//! | `POST` | `/user/token/` | credentials in body |
//! | `GET` `PATCH` | `/user/profile/` | token |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use sprout_core::{
  account::{
    NewAccount, ProfileUpdate, ProfileView, Role, check_password_policy,
    normalize_email,
  },
  store::AssessmentStore,
};

use crate::{AppState, auth, error::ApiError};

// ─── Registration ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email:    String,
  pub name:     String,
  pub password: String,
  pub role:     String,
}

/// `POST /user/create/` — register a new account.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let email = normalize_email(&body.email).map_err(ApiError::validation)?;
  let role: Role = body.role.parse().map_err(ApiError::validation)?;
  check_password_policy(&body.password).map_err(ApiError::validation)?;

  if state
    .store
    .account_by_email(email.clone())
    .await
    .map_err(ApiError::store)?
    .is_some()
  {
    return Err(ApiError::Validation("email already registered".to_string()));
  }

  let account = state
    .store
    .create_account(NewAccount {
      email,
      name: body.name,
      password_hash: auth::hash_password(&body.password)?,
      role,
      is_staff: false,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(account_id = account.account_id, "account registered");
  Ok((StatusCode::CREATED, Json(account.profile())))
}

// ─── Token issuance ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TokenBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
  pub token: String,
}

/// `POST /user/token/` — exchange credentials for an opaque token.
///
/// Every failure path is the same 401; the response never says which
/// field was wrong.
pub async fn token<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<TokenBody>,
) -> Result<Json<TokenResponse>, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let email = normalize_email(&body.email).map_err(|_| ApiError::Unauthorized)?;

  let account = state
    .store
    .account_by_email(email)
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::Unauthorized)?;

  if !account.is_active
    || !auth::verify_password(&body.password, &account.password_hash)
  {
    return Err(ApiError::Unauthorized);
  }

  let token = auth::generate_token();
  state
    .store
    .insert_token(account.account_id, auth::token_hash(&token))
    .await
    .map_err(ApiError::store)?;

  Ok(Json(TokenResponse { token }))
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// `GET /user/profile/`
pub async fn profile<S>(
  auth::CurrentAccount(account): auth::CurrentAccount,
) -> Json<ProfileView>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Json(account.profile())
}

/// Partial profile update. A `role` key in the payload is not an error; it
/// simply is not a field here, so serde drops it and the stored role stands.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileBody {
  pub email:    Option<String>,
  pub name:     Option<String>,
  pub password: Option<String>,
}

/// `PATCH /user/profile/`
pub async fn update_profile<S>(
  State(state): State<AppState<S>>,
  auth::CurrentAccount(account): auth::CurrentAccount,
  Json(body): Json<ProfileBody>,
) -> Result<Json<ProfileView>, ApiError>
where
  S: AssessmentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let mut update = ProfileUpdate::default();

  if let Some(raw) = body.email {
    let email = normalize_email(&raw).map_err(ApiError::validation)?;
    if email != account.email
      && state
        .store
        .account_by_email(email.clone())
        .await
        .map_err(ApiError::store)?
        .is_some()
    {
      return Err(ApiError::Validation("email already registered".to_string()));
    }
    update.email = Some(email);
  }

  update.name = body.name;

  if let Some(password) = body.password {
    check_password_policy(&password).map_err(ApiError::validation)?;
    update.password_hash = Some(auth::hash_password(&password)?);
  }

  let updated = state
    .store
    .update_profile(account.account_id, update)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("account not found".to_string()))?;

  Ok(Json(updated.profile()))
}
