use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    dto::auth::{
        ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest,
        UpdateProfileRequest, VerifyEmailRequest,
    },
    error::AppResult,
    middleware::auth::{AuthUser, auth_cookie, removal_cookie},
    models::User,
    response::{ApiResponse, Meta},
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/verify-email", post(verify_email))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password/{token}", post(reset_password))
        .route("/check-auth", get(check_auth))
        .route("/profile/update", put(update_profile))
}

#[utoipa::path(
    post,
    path = "/api/v1/user/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<User>),
        (status = 400, description = "Email already taken")
    ),
    tag = "User"
)]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<SignupRequest>,
) -> AppResult<(StatusCode, CookieJar, Json<ApiResponse<User>>)> {
    let (resp, token) = auth_service::signup(&state, payload).await?;
    let jar = jar.add(auth_cookie(token));
    Ok((StatusCode::CREATED, jar, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/v1/user/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<User>),
        (status = 400, description = "Invalid credentials")
    ),
    tag = "User"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<ApiResponse<User>>)> {
    let (resp, token) = auth_service::login(&state, payload).await?;
    let jar = jar.add(auth_cookie(token));
    Ok((jar, Json(resp)))
}

#[utoipa::path(post, path = "/api/v1/user/logout", tag = "User")]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<ApiResponse<serde_json::Value>>) {
    let jar = jar.remove(removal_cookie());
    (
        jar,
        Json(ApiResponse::success(
            "Logged out successfully",
            serde_json::json!({}),
            Some(Meta::empty()),
        )),
    )
}

#[utoipa::path(
    post,
    path = "/api/v1/user/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = ApiResponse<User>),
        (status = 400, description = "Invalid or expired verification token")
    ),
    tag = "User"
)]
pub async fn verify_email(
    State(state): State<AppState>,
    Json(payload): Json<VerifyEmailRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::verify_email(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/user/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset link sent"),
        (status = 400, description = "Unknown user")
    ),
    tag = "User"
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = auth_service::forgot_password(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/v1/user/reset-password/{token}",
    params(("token" = String, Path, description = "Password reset token")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset"),
        (status = 400, description = "Invalid or expired reset token")
    ),
    tag = "User"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = auth_service::reset_password(&state, token, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/v1/user/check-auth",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<User>),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "User no longer exists")
    ),
    security(("cookie_auth" = [])),
    tag = "User"
)]
pub async fn check_auth(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::check_auth(&state, user.user_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/v1/user/profile/update",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<User>),
        (status = 401, description = "Not authenticated")
    ),
    security(("cookie_auth" = [])),
    tag = "User"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = auth_service::update_profile(&state, user.user_id, payload).await?;
    Ok(Json(resp))
}
