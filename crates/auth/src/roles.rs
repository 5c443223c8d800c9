use serde::{Deserialize, Serialize};

/// Role of a panel user.
///
/// Roles form a strict total order by privilege: `SuperAdmin` (0) outranks
/// `Admin` (1), which outranks `User` (2). A lower ordinal means more power.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Super Admin")]
    SuperAdmin,
    #[serde(rename = "Admin")]
    Admin,
    #[serde(rename = "User")]
    User,
}

impl Role {
    /// All roles, most privileged first.
    pub const ALL: [Role; 3] = [Role::SuperAdmin, Role::Admin, Role::User];

    pub fn ordinal(self) -> u8 {
        match self {
            Role::SuperAdmin => 0,
            Role::Admin => 1,
            Role::User => 2,
        }
    }

    /// Parse a stored role name, ignoring case.
    ///
    /// Anything outside the fixed table yields `None`, which the gate treats
    /// as "no role".
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "super admin" => Some(Role::SuperAdmin),
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    /// Canonical name, as persisted on the user row.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "Super Admin",
            Role::Admin => "Admin",
            Role::User => "User",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|r| r.as_str()).collect()
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Role::parse("SUPER ADMIN"), Some(Role::SuperAdmin));
        assert_eq!(Role::parse("super admin"), Some(Role::SuperAdmin));
        assert_eq!(Role::parse("aDmIn"), Some(Role::Admin));
        assert_eq!(Role::parse("User"), Some(Role::User));
    }

    #[test]
    fn unknown_names_are_no_role() {
        assert_eq!(Role::parse(""), None);
        assert_eq!(Role::parse("superadmin"), None);
        assert_eq!(Role::parse(" admin"), None);
        assert_eq!(Role::parse("owner"), None);
    }

    #[test]
    fn canonical_names_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn ordinals_follow_privilege() {
        assert!(Role::SuperAdmin.ordinal() < Role::Admin.ordinal());
        assert!(Role::Admin.ordinal() < Role::User.ordinal());
    }
}
