use serde::{Deserialize, Serialize};

/// Account kind; drives every authorization decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Teacher,
    Institution,
    Admin,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Teacher => "teacher",
            UserType::Institution => "institution",
            UserType::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "teacher" => Some(UserType::Teacher),
            "institution" => Some(UserType::Institution),
            "admin" => Some(UserType::Admin),
            _ => None,
        }
    }
}

/// Documento da collection "users"
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    #[serde(rename = "userType")]
    pub user_type: UserType,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    #[serde(default)]
    pub last_login: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

fn default_is_active() -> bool {
    true
}

/// Public view of a user (never carries the password hash).
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(rename = "userType")]
    pub user_type: UserType,
    pub is_active: bool,
    pub last_login: Option<i64>,
    pub created_at: i64,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        UserInfo {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            user_type: user.user_type,
            is_active: user.is_active,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}
