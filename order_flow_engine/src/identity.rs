//! The caller identity consumed by every engine operation.
//!
//! Credential verification happens at the platform edge; by the time a request reaches this engine it carries an
//! already-validated `{user_id, role, email}` triple. The engine trusts the triple verbatim and passes it around as
//! an explicit parameter. It is never stored in ambient or task-local state.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer,
    RestaurantOwner,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Customer => write!(f, "CUSTOMER"),
            Role::RestaurantOwner => write!(f, "RESTAURANT_OWNER"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid role: {0}")]
pub struct InvalidRole(String);

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CUSTOMER" => Ok(Self::Customer),
            "RESTAURANT_OWNER" => Ok(Self::RestaurantOwner),
            "ADMIN" => Ok(Self::Admin),
            s => Err(InvalidRole(s.to_string())),
        }
    }
}

/// A trusted, already-authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub user_id: i64,
    pub role: Role,
    pub email: String,
}

impl UserIdentity {
    pub fn new(user_id: i64, role: Role, email: impl Into<String>) -> Self {
        Self { user_id, role, email: email.into() }
    }
}

impl Display for UserIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} #{}", self.role, self.user_id)
    }
}
