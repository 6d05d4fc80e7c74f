use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::{cookie::CookieJar, WithRejection};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use super::{
    dto::{LoginRequest, MessageResponse, PublicUser, RegisterRequest, UserResponse},
    extractors::AuthUser,
    jwt::{clear_session_cookie, JwtKeys},
    password::{hash_password, verify_password},
    repo::{is_unique_violation, User},
};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, jar, payload))]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> ApiResult<(StatusCode, CookieJar, Json<UserResponse>)> {
    let name = payload.name.trim().to_string();
    let email = payload.email.trim().to_lowercase();

    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("All fields are required"));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "rejected invalid email");
        return Err(ApiError::validation("Invalid email"));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::validation(
            "Password must be at least 8 characters",
        ));
    }

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::validation("Email already registered"));
    }

    let hash = hash_password(&payload.password)?;
    let user = match User::create(&state.db, &name, &email, &hash).await {
        Ok(user) => user,
        // A concurrent registration can win the race between the pre-check
        // and the insert; the unique index on email is the real guard.
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %email, "email already registered");
            return Err(ApiError::validation("Email already registered"));
        }
        Err(e) => return Err(e.into()),
    };

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign_session(user.id, &user.email)?;
    let cookie = keys.session_cookie(token, state.config.is_production());

    info!(user_id = %user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        jar.add(cookie),
        Json(UserResponse { user: user.into() }),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> ApiResult<(CookieJar, Json<UserResponse>)> {
    let email = payload.email.trim().to_lowercase();

    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    // Unknown email and wrong password share one message so the endpoint
    // does not leak which accounts exist.
    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!(email = %email, "login with unknown email");
        return Err(ApiError::validation("Invalid email or password"));
    };
    if !verify_password(&payload.password, &user.password_hash) {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(ApiError::validation("Invalid email or password"));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign_session(user.id, &user.email)?;
    let cookie = keys.session_cookie(token, state.config.is_production());

    info!(user_id = %user.id, "user logged in");
    Ok((jar.add(cookie), Json(UserResponse { user: user.into() })))
}

#[instrument(skip(jar))]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.remove(clear_session_cookie()),
        Json(MessageResponse {
            message: "Logged out",
        }),
    )
}

#[instrument(skip(state))]
pub async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<UserResponse>> {
    // The account may have been deleted while the cookie was still live.
    let user = User::find_by_id(&state.db, user.id)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(UserResponse {
        user: PublicUser::from(user),
    }))
}
