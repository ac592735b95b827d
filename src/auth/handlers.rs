use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MeResponse, PublicUser, RegisterRequest},
        extractors::AuthUser,
        jwt::JwtKeys,
        repo_types::{DuplicateUser, NewUser, UniqueField},
        services::{hash_password, normalize_registration, verify_password},
    },
    error::{AppError, AppResult},
    extract::{ApiResponse, AppJson},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(get_me))
}

fn duplicate_message(field: UniqueField) -> &'static str {
    match field {
        UniqueField::Email => "Email already used",
        UniqueField::Username => "Username already taken",
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AuthResponse>>)> {
    normalize_registration(&mut payload)?;

    if let Some(existing) = state
        .users
        .find_by_email_or_username(&payload.email, &payload.username)
        .await?
    {
        let field = if existing.email == payload.email {
            UniqueField::Email
        } else {
            UniqueField::Username
        };
        warn!(email = %payload.email, username = %payload.username, ?field, "registration collides");
        return Err(AppError::Conflict(duplicate_message(field).into()));
    }

    let password_hash = hash_password(&payload.password)?;

    let user = match state
        .users
        .create(NewUser {
            username: payload.username,
            email: payload.email,
            password_hash,
        })
        .await
    {
        Ok(u) => u,
        Err(e) => {
            if let Some(DuplicateUser(field)) = e.downcast_ref::<DuplicateUser>() {
                warn!(?field, "registration lost a unique race");
                return Err(AppError::Conflict(duplicate_message(*field).into()));
            }
            return Err(e.into());
        }
    };

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(AuthResponse {
            token,
            user: PublicUser::from(&user),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(mut payload): AppJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthResponse>>> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(AppError::validation("Please provide email and password"));
    }

    let Some(user) = state.users.find_by_email(&payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(ApiResponse::ok(AuthResponse {
        token,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<ApiResponse<MeResponse>> {
    ApiResponse::ok(MeResponse { user: user.into() })
}
