use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::web::{UserRole, error::FieldError, validate::Validator};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RegisterBody {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    /// `student` (default) or `instructor`.
    pub role: Option<String>,
}

impl RegisterBody {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        Validator::new()
            .email("email", &self.email)
            .password("password", &self.password)
            .full_name("full_name", &self.full_name)
            .phone("phone", self.phone.as_deref())
            .finish()
    }

    /// Role requested at sign-up. Admin accounts can't be self-registered.
    pub fn requested_role(&self) -> Option<UserRole> {
        match self.role.as_deref() {
            None | Some("student") => Some(UserRole::Student),
            Some("instructor") => Some(UserRole::Instructor),
            Some(_) => None,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

impl LoginBody {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        Validator::new()
            .email("email", &self.email)
            .not_blank("password", &self.password)
            .finish()
    }
}

/// Returned by register, login and refresh.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AuthPayload {
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub token: String,
}
