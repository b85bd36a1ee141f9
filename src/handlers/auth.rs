// src/handlers/auth.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::open_session;
use crate::{
    error::AppError,
    models::account::{Account, LoginRequest, NewAccount, SessionResponse, SignupRequest},
    progress::{
        merge::MergeReport,
        registry::SessionRegistry,
        store::{AccountKey, ProgressSeed},
    },
    state::AppState,
    storage::StoreError,
    utils::{
        hash::{hash_password, verify_password},
        html::clean_display_name,
        jwt::{Claims, SessionKind, sign_jwt, verify_jwt},
    },
};

/// Starts an anonymous session.
///
/// Progress is kept in local storage until the session signs up or logs in
/// with `anonymousToken`, at which point it is merged into the account.
pub async fn anonymous_sign_in(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let id = Uuid::new_v4().to_string();
    let token = sign_jwt(
        &id,
        SessionKind::Anonymous,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    state
        .sessions
        .open(AccountKey::Anonymous(id), ProgressSeed::anonymous())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            token,
            token_type: "Bearer",
            anonymous: true,
            account: None,
            merge: None,
        }),
    ))
}

/// Registers a new account with email and password.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created, a session token and the merge result if an anonymous token was sent.
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let username = clean_display_name(&payload.username);
    if username.chars().count() < 3 {
        return Err(AppError::BadRequest(
            "Username must be at least 3 characters.".to_string(),
        ));
    }

    let password_hash = hash_password(&payload.password)?;

    let account = state
        .accounts
        .create(NewAccount {
            username,
            email: payload.email.trim().to_lowercase(),
            password_hash,
        })
        .await
        .map_err(|e| {
            if !matches!(e, StoreError::Conflict(_)) {
                tracing::error!("Failed to create account: {:?}", e);
            }
            AppError::from(e)
        })?;

    tracing::info!("Account {} created", account.id);

    let (token, merge) = start_account_session(&state, &account, payload.anonymous_token.as_deref()).await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            token,
            token_type: "Bearer",
            anonymous: false,
            account: Some(account),
            merge,
        }),
    ))
}

/// Authenticates an account and returns a JWT token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let invalid = || AppError::AuthError("Invalid email or password".to_string());

    let account = state
        .accounts
        .find_by_email(&payload.email.trim().to_lowercase())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&payload.password, &account.password_hash)? {
        return Err(invalid());
    }

    let (token, merge) = start_account_session(&state, &account, payload.anonymous_token.as_deref()).await?;

    Ok(Json(SessionResponse {
        token,
        token_type: "Bearer",
        anonymous: false,
        account: Some(account),
        merge,
    }))
}

/// Opens the account's session and folds in the anonymous session, if one was named.
async fn start_account_session(
    state: &AppState,
    account: &Account,
    anonymous_token: Option<&str>,
) -> Result<(String, Option<MergeReport>), AppError> {
    let anonymous = match anonymous_token {
        Some(token) => {
            let claims = verify_jwt(token, &state.config.jwt_secret)
                .map_err(|_| AppError::AuthError("Invalid anonymous session token".to_string()))?;
            if claims.kind != SessionKind::Anonymous {
                return Err(AppError::BadRequest(
                    "anonymousToken must belong to an anonymous session".to_string(),
                ));
            }
            Some(claims.account_key())
        }
        None => None,
    };

    let account_id = account.id.to_string();
    let handle = state
        .sessions
        .open(
            AccountKey::Account(account_id.clone()),
            ProgressSeed {
                username: account.username.clone(),
                email: Some(account.email.clone()),
            },
        )
        .await?;

    let merge = match anonymous {
        Some(anonymous) => state.sessions.absorb_anonymous(&handle, &anonymous).await?,
        None => None,
    };

    let token = sign_jwt(
        &account_id,
        SessionKind::Account,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    Ok((token, merge))
}

/// Signs out: flushes pending progress and drops the session.
pub async fn logout(
    State(sessions): State<Arc<SessionRegistry>>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    let persisted = sessions.close(&claims.account_key()).await;
    Json(json!({
        "signedOut": true,
        "persisted": persisted,
    }))
}

/// Current identity and stats.
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let handle = open_session(&state, &claims).await?;
    let session = handle.lock().await;
    let progress = session.store.progress();

    Ok(Json(json!({
        "id": progress.id,
        "username": progress.username,
        "email": progress.email,
        "anonymous": claims.kind == SessionKind::Anonymous,
        "stats": progress.stats,
    })))
}
