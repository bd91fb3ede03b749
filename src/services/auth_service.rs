use std::collections::HashSet;

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtSettings;
use crate::database::{Store, StoreError};
use crate::models::{ProfileCompletion, User, UserInfo, UserType};
use crate::services::profile_service;
use crate::utils::validation::{is_valid_email, new_id};
use crate::utils::AppError;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenUse {
    Access,
    Refresh,
}

// JWT Claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id
    pub email: String,
    #[serde(rename = "userType")]
    pub user_type: UserType,
    pub token_use: TokenUse,
    pub iat: usize,  // issued at
    pub exp: usize,  // expiration
    pub jti: String, // JWT ID
    pub aud: String, // audience
    pub iss: String, // issuer
}

// Request/Response structures
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "userType")]
    pub user_type: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub refresh_token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    pub user: UserInfo,
    /// None for admins
    pub profile_completion: Option<ProfileCompletion>,
}

fn issue_token(
    jwt: &JwtSettings,
    user: &User,
    token_use: TokenUse,
    ttl: Duration,
) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        user_type: user.user_type,
        token_use,
        iat: now.timestamp() as usize,
        exp: (now + ttl).timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
        aud: jwt.audience.clone(),
        iss: jwt.issuer.clone(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

// Generate JWT token
pub fn generate_access_token(jwt: &JwtSettings, user: &User) -> Result<String, AppError> {
    issue_token(jwt, user, TokenUse::Access, Duration::hours(jwt.ttl_hours))
}

// Generate refresh token (longer expiry)
pub fn generate_refresh_token(jwt: &JwtSettings, user: &User) -> Result<String, AppError> {
    issue_token(jwt, user, TokenUse::Refresh, Duration::days(jwt.refresh_ttl_days))
}

// Verify JWT token
pub fn verify_token(jwt: &JwtSettings, token: &str, expected: TokenUse) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[jwt.audience.as_str()]);

    let mut issuers = HashSet::new();
    issuers.insert(jwt.issuer.clone());
    validation.iss = Some(issuers);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::unauthorized("INVALID_TOKEN", format!("Invalid token: {}", e)))?;

    if claims.token_use != expected {
        return Err(AppError::unauthorized("INVALID_TOKEN", "Wrong token type"));
    }

    Ok(claims)
}

/// Rejects callers whose token says they are not `expected`.
pub fn require_user_type(claims: &Claims, expected: UserType) -> Result<(), AppError> {
    if claims.user_type != expected {
        return Err(AppError::forbidden(
            "INVALID_USER_TYPE",
            format!("Only {} accounts can perform this action", expected.as_str()),
        ));
    }
    Ok(())
}

pub fn require_admin(claims: &Claims) -> Result<(), AppError> {
    if claims.user_type != UserType::Admin {
        return Err(AppError::forbidden("ADMIN_ONLY", "Admin access required"));
    }
    Ok(())
}

/// Loads the caller and checks the account is still usable.
pub async fn load_active_user(store: &dyn Store, user_id: &str) -> Result<User, AppError> {
    let user = store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("USER_NOT_FOUND", "User not found"))?;

    if !user.is_active {
        return Err(AppError::forbidden("ACCOUNT_INACTIVE", "Account is inactive"));
    }
    Ok(user)
}

fn auth_response(jwt: &JwtSettings, user: &User) -> Result<AuthResponse, AppError> {
    Ok(AuthResponse {
        token: generate_access_token(jwt, user)?,
        refresh_token: generate_refresh_token(jwt, user)?,
        user: UserInfo::from(user),
    })
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost).map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

// User registration
pub async fn register(
    store: &dyn Store,
    jwt: &JwtSettings,
    bcrypt_cost: u32,
    request: &RegisterRequest,
) -> Result<AuthResponse, AppError> {
    let email = request
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::bad_request("MISSING_EMAIL", "Email is required"))?;
    if !is_valid_email(&email) {
        return Err(AppError::bad_request("INVALID_EMAIL", "Email address is not valid"));
    }

    let password = request
        .password
        .as_deref()
        .ok_or_else(|| AppError::bad_request("MISSING_PASSWORD", "Password is required"))?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(
            "WEAK_PASSWORD",
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }

    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::bad_request("MISSING_NAME", "Name is required"))?
        .to_string();

    // Admins only come from the startup seed
    let user_type = request
        .user_type
        .as_deref()
        .and_then(UserType::parse)
        .filter(|kind| *kind != UserType::Admin)
        .ok_or_else(|| {
            AppError::bad_request("INVALID_USER_TYPE", "userType must be 'teacher' or 'institution'")
        })?;

    if store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::conflict("EMAIL_EXISTS", "An account with this email already exists"));
    }

    let now = Utc::now().timestamp();
    let user = User {
        id: new_id(),
        email,
        password_hash: hash_password(password, bcrypt_cost)?,
        name,
        user_type,
        is_active: true,
        last_login: None,
        created_at: now,
        updated_at: now,
    };

    match store.insert_user(&user).await {
        Ok(()) => {}
        // Lost a race against a concurrent registration
        Err(StoreError::Duplicate(_)) => {
            return Err(AppError::conflict("EMAIL_EXISTS", "An account with this email already exists"))
        }
        Err(e) => return Err(e.into()),
    }

    auth_response(jwt, &user)
}

// User login
pub async fn login(
    store: &dyn Store,
    jwt: &JwtSettings,
    request: &LoginRequest,
) -> Result<AuthResponse, AppError> {
    let email = request.email.trim().to_lowercase();
    let invalid = || AppError::unauthorized("INVALID_CREDENTIALS", "Invalid credentials");

    let user = store.find_user_by_email(&email).await?.ok_or_else(invalid)?;

    let valid = verify(&request.password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("Password verification error: {}", e)))?;
    if !valid {
        return Err(invalid());
    }

    if !user.is_active {
        return Err(AppError::forbidden("ACCOUNT_INACTIVE", "Account is inactive"));
    }

    let now = Utc::now().timestamp();
    store.record_login(&user.id, now).await?;

    let mut user = user;
    user.last_login = Some(now);
    auth_response(jwt, &user)
}

pub async fn refresh_token(
    store: &dyn Store,
    jwt: &JwtSettings,
    request: &RefreshTokenRequest,
) -> Result<AuthResponse, AppError> {
    let claims = verify_token(jwt, &request.refresh_token, TokenUse::Refresh)?;

    let user = store
        .find_user(&claims.sub)
        .await?
        .ok_or_else(|| AppError::unauthorized("INVALID_TOKEN", "User no longer exists"))?;
    if !user.is_active {
        return Err(AppError::forbidden("ACCOUNT_INACTIVE", "Account is inactive"));
    }

    auth_response(jwt, &user)
}

pub async fn me(store: &dyn Store, claims: &Claims) -> Result<MeResponse, AppError> {
    let user = load_active_user(store, &claims.sub).await?;
    let profile_completion = match user.user_type {
        UserType::Teacher => Some(profile_service::teacher_completion(store, &user.id).await?),
        UserType::Institution => {
            Some(profile_service::institution_completion(store, &user.id).await?)
        }
        UserType::Admin => None,
    };

    Ok(MeResponse {
        user: UserInfo::from(&user),
        profile_completion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::testing::{jwt_settings, TEST_BCRYPT_COST};

    fn register_request(email: &str, user_type: &str) -> RegisterRequest {
        RegisterRequest {
            email: Some(email.to_string()),
            password: Some("correct horse".to_string()),
            name: Some("Ravi Kumar".to_string()),
            user_type: Some(user_type.to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryStore::new();
        let jwt = jwt_settings();

        let registered = register(&store, &jwt, TEST_BCRYPT_COST, &register_request(" Ravi@Example.COM ", "teacher"))
            .await
            .unwrap();
        assert_eq!(registered.user.email, "ravi@example.com");
        assert_eq!(registered.user.user_type, UserType::Teacher);

        let claims = verify_token(&jwt, &registered.token, TokenUse::Access).unwrap();
        assert_eq!(claims.sub, registered.user.id);

        let logged_in = login(
            &store,
            &jwt,
            &LoginRequest {
                email: "ravi@example.com".into(),
                password: "correct horse".into(),
            },
        )
        .await
        .unwrap();
        assert!(logged_in.user.last_login.is_some());
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let store = MemoryStore::new();
        let jwt = jwt_settings();

        let err = register(&store, &jwt, TEST_BCRYPT_COST, &register_request("nope", "teacher"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_EMAIL");

        let err = register(&store, &jwt, TEST_BCRYPT_COST, &register_request("a@b.com", "admin"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_USER_TYPE");

        let mut short = register_request("a@b.com", "institution");
        short.password = Some("short".into());
        let err = register(&store, &jwt, TEST_BCRYPT_COST, &short).await.unwrap_err();
        assert_eq!(err.code(), "WEAK_PASSWORD");

        register(&store, &jwt, TEST_BCRYPT_COST, &register_request("a@b.com", "institution"))
            .await
            .unwrap();
        let err = register(&store, &jwt, TEST_BCRYPT_COST, &register_request("A@B.com", "teacher"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "EMAIL_EXISTS");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let store = MemoryStore::new();
        let jwt = jwt_settings();
        register(&store, &jwt, TEST_BCRYPT_COST, &register_request("a@b.com", "teacher"))
            .await
            .unwrap();

        let err = login(
            &store,
            &jwt,
            &LoginRequest {
                email: "a@b.com".into(),
                password: "incorrect horse".into(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_refresh_requires_refresh_token() {
        let store = MemoryStore::new();
        let jwt = jwt_settings();
        let registered = register(&store, &jwt, TEST_BCRYPT_COST, &register_request("a@b.com", "teacher"))
            .await
            .unwrap();

        let err = refresh_token(
            &store,
            &jwt,
            &RefreshTokenRequest {
                refresh_token: registered.token.clone(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "INVALID_TOKEN");

        let refreshed = refresh_token(
            &store,
            &jwt,
            &RefreshTokenRequest {
                refresh_token: registered.refresh_token,
            },
        )
        .await
        .unwrap();
        assert_eq!(refreshed.user.id, registered.user.id);
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let jwt = jwt_settings();
        let mut other = jwt_settings();
        other.secret = "another-secret".into();

        let user = crate::testing::user("u1", UserType::Institution);
        let token = generate_access_token(&other, &user).unwrap();
        assert_eq!(
            verify_token(&jwt, &token, TokenUse::Access).unwrap_err().code(),
            "INVALID_TOKEN"
        );
    }
}
