use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use rand::Rng;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::auth::{
        Claims, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest,
        UpdateProfileRequest, VerifyEmailRequest,
    },
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::ROLE_CUSTOMER,
    models::User,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn signup(
    state: &AppState,
    payload: SignupRequest,
) -> AppResult<(ApiResponse<User>, String)> {
    let existing = Users::find()
        .filter(UserCol::Email.eq(payload.email.as_str()))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "User already exists with this email".to_string(),
        ));
    }

    let password_hash = hash_password(&payload.password)?;
    let verification_code = generate_verification_code();
    let contact = payload.contact.parse::<i64>().unwrap_or(0);

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        fullname: Set(payload.fullname),
        email: Set(payload.email),
        password_hash: Set(password_hash),
        contact: Set(contact),
        role: Set(ROLE_CUSTOMER.to_string()),
        is_verified: Set(false),
        verification_token: Set(Some(verification_code.clone())),
        verification_token_expires_at: Set(Some((Utc::now() + Duration::hours(24)).into())),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    let token = issue_token(user.id, &user.role, &jwt_secret()?)?;

    state
        .mailer
        .send_verification_email(&user.email, &verification_code)
        .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "user_signup",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok((
        ApiResponse::success("Account created successfully", user_from_entity(user), None),
        token,
    ))
}

pub async fn login(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<(ApiResponse<User>, String)> {
    let user = Users::find()
        .filter(UserCol::Email.eq(payload.email.as_str()))
        .one(&state.orm)
        .await?;
    let user = match user {
        Some(u) => u,
        None => {
            return Err(AppError::BadRequest(
                "Incorrect email or password".to_string(),
            ));
        }
    };

    verify_password(&payload.password, &user.password_hash)?;

    let mut active: UserActive = user.into();
    active.last_login = Set(Some(Utc::now().into()));
    active.updated_at = Set(Utc::now().into());
    let user = active.update(&state.orm).await?;

    let token = issue_token(user.id, &user.role, &jwt_secret()?)?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.id),
        "user_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": user.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let message = format!("Welcome back {}", user.fullname);
    Ok((
        ApiResponse::success(message, user_from_entity(user), Some(Meta::empty())),
        token,
    ))
}

pub async fn verify_email(
    state: &AppState,
    payload: VerifyEmailRequest,
) -> AppResult<ApiResponse<User>> {
    let user = Users::find()
        .filter(
            Condition::all()
                .add(UserCol::VerificationToken.eq(payload.verification_code.as_str()))
                .add(UserCol::VerificationTokenExpiresAt.gt(Utc::now())),
        )
        .one(&state.orm)
        .await?;
    let user = match user {
        Some(u) => u,
        None => {
            return Err(AppError::BadRequest(
                "Invalid or expired verification token".to_string(),
            ));
        }
    };

    let mut active: UserActive = user.into();
    active.is_verified = Set(true);
    active.verification_token = Set(None);
    active.verification_token_expires_at = Set(None);
    active.updated_at = Set(Utc::now().into());
    let user = active.update(&state.orm).await?;

    if let Err(err) = state
        .mailer
        .send_welcome_email(&user.email, &user.fullname)
        .await
    {
        tracing::warn!(error = %err, "welcome email failed");
    }

    Ok(ApiResponse::success(
        "Email verified successfully",
        user_from_entity(user),
        None,
    ))
}

pub async fn forgot_password(
    state: &AppState,
    payload: ForgotPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let user = Users::find()
        .filter(UserCol::Email.eq(payload.email.as_str()))
        .one(&state.orm)
        .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::BadRequest("User doesn't exist".to_string())),
    };

    let reset_token = generate_reset_token();
    let email = user.email.clone();

    let mut active: UserActive = user.into();
    active.reset_password_token = Set(Some(reset_token.clone()));
    active.reset_password_token_expires_at = Set(Some((Utc::now() + Duration::hours(1)).into()));
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    let reset_url = format!("{}/resetpassword/{}", state.config.frontend_url, reset_token);
    state
        .mailer
        .send_password_reset_email(&email, &reset_url)
        .await?;

    Ok(ApiResponse::success(
        "Password reset link sent to your email.",
        serde_json::json!({}),
        None,
    ))
}

pub async fn reset_password(
    state: &AppState,
    token: String,
    payload: ResetPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let user = Users::find()
        .filter(
            Condition::all()
                .add(UserCol::ResetPasswordToken.eq(token.as_str()))
                .add(UserCol::ResetPasswordTokenExpiresAt.gt(Utc::now())),
        )
        .one(&state.orm)
        .await?;
    let user = match user {
        Some(u) => u,
        None => {
            return Err(AppError::BadRequest(
                "Invalid or expired reset token".to_string(),
            ));
        }
    };

    let password_hash = hash_password(&payload.new_password)?;
    let email = user.email.clone();

    let mut active: UserActive = user.into();
    active.password_hash = Set(password_hash);
    active.reset_password_token = Set(None);
    active.reset_password_token_expires_at = Set(None);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    if let Err(err) = state.mailer.send_reset_success_email(&email).await {
        tracing::warn!(error = %err, "reset success email failed");
    }

    Ok(ApiResponse::success(
        "Password reset successfully.",
        serde_json::json!({}),
        None,
    ))
}

pub async fn check_auth(state: &AppState, user_id: Uuid) -> AppResult<ApiResponse<User>> {
    let user = Users::find_by_id(user_id).one(&state.orm).await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("OK", user_from_entity(user), None))
}

pub async fn update_profile(
    state: &AppState,
    user_id: Uuid,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let user = Users::find_by_id(user_id).one(&state.orm).await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };

    let profile_picture = match payload.profile_picture.as_deref() {
        Some(data_uri) if !data_uri.is_empty() => {
            let bytes = decode_data_uri(data_uri)?;
            Some(state.images.upload_image("profile-picture", bytes).await?)
        }
        _ => None,
    };

    let mut active: UserActive = user.into();
    active.fullname = Set(payload.fullname);
    active.email = Set(payload.email);
    active.address = Set(payload.address);
    active.city = Set(payload.city);
    if let Some(url) = profile_picture {
        active.profile_picture = Set(url);
    }
    active.updated_at = Set(Utc::now().into());
    let user = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Profile updated successfully.",
        user_from_entity(user),
        None,
    ))
}

pub fn issue_token(user_id: Uuid, role: &str, secret: &str) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn jwt_secret() -> AppResult<String> {
    std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    Ok(argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string())
}

fn verify_password(password: &str, stored_hash: &str) -> AppResult<()> {
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest(
            "Incorrect email or password".to_string(),
        ));
    }
    Ok(())
}

fn generate_verification_code() -> String {
    rand::rng().random_range(100_000..1_000_000).to_string()
}

fn generate_reset_token() -> String {
    let mut bytes = [0u8; 40];
    rand::rng().fill(&mut bytes[..]);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Strip the `data:<mime>;base64,` prefix if present and decode the payload.
fn decode_data_uri(data_uri: &str) -> AppResult<Vec<u8>> {
    let payload = data_uri
        .split_once("base64,")
        .map_or(data_uri, |(_, rest)| rest);
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| AppError::BadRequest("profilePicture is not valid base64".to_string()))
}

pub(crate) fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        fullname: model.fullname,
        email: model.email,
        contact: model.contact,
        address: model.address,
        city: model.city,
        profile_picture: model.profile_picture,
        role: model.role,
        is_verified: model.is_verified,
        last_login: model.last_login.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    #[test]
    fn issued_token_round_trips_claims() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, "operator", "test-secret").unwrap();

        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .unwrap();

        assert_eq!(decoded.claims.sub, user_id.to_string());
        assert_eq!(decoded.claims.role, "operator");
    }

    #[test]
    fn issued_token_rejects_wrong_secret() {
        let token = issue_token(Uuid::new_v4(), "customer", "right-secret").unwrap();

        let result = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"wrong-secret"),
            &Validation::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn password_hash_verifies_and_rejects() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn verification_code_is_six_digits() {
        for _ in 0..50 {
            let code = generate_verification_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn reset_token_is_eighty_hex_chars() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 80);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn data_uri_prefix_is_stripped_before_decoding() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"png-bytes");
        let uri = format!("data:image/png;base64,{encoded}");
        assert_eq!(decode_data_uri(&uri).unwrap(), b"png-bytes");
        assert_eq!(decode_data_uri(&encoded).unwrap(), b"png-bytes");
    }
}
