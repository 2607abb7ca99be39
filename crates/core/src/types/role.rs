//! User roles.

use serde::{Deserialize, Deserializer, Serialize};

/// Role of a directory account.
///
/// Serialized in `snake_case` to match the backend's `role` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular visitor account.
    #[default]
    User,
    /// Full access to shop and user management.
    Admin,
    /// Owner of one or more listed shops.
    ShopOwner,
}

impl Role {
    /// Interpret a role string from the backend.
    ///
    /// The spreadsheet is edited by hand, so anything that is not a known role
    /// (including legacy values like `customer`) is treated as a regular user.
    #[must_use]
    pub fn from_remote(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    /// Page a user with this role lands on after login or a failed role gate.
    #[must_use]
    pub const fn landing_path(self) -> &'static str {
        match self {
            Self::Admin => "/admin/dashboard",
            Self::ShopOwner => "/shops",
            Self::User => "/",
        }
    }

    /// Returns the wire name of this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::ShopOwner => "shop_owner",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "shop_owner" => Ok(Self::ShopOwner),
            other => Err(format!("invalid role: {other}")),
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::from_remote).unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_landing_paths() {
        assert_eq!(Role::Admin.landing_path(), "/admin/dashboard");
        assert_eq!(Role::ShopOwner.landing_path(), "/shops");
        assert_eq!(Role::User.landing_path(), "/");
    }

    #[test]
    fn test_from_remote_is_lenient() {
        assert_eq!(Role::from_remote("Admin"), Role::Admin);
        assert_eq!(Role::from_remote(" shop_owner "), Role::ShopOwner);
        assert_eq!(Role::from_remote("customer"), Role::User);
        assert_eq!(Role::from_remote(""), Role::User);
    }

    #[test]
    fn test_strict_parse_rejects_unknown() {
        assert!("customer".parse::<Role>().is_err());
    }

    #[test]
    fn test_serde_round_trip_names() {
        assert_eq!(
            serde_json::to_string(&Role::ShopOwner).unwrap(),
            "\"shop_owner\""
        );
        let role: Role = serde_json::from_str("\"customer\"").unwrap();
        assert_eq!(role, Role::User);
        let role: Role = serde_json::from_str("null").unwrap();
        assert_eq!(role, Role::User);
    }
}
