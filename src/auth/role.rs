//! Role value type
//!
//! Three canonical roles exist. Any other raw value is kept as `UNKNOWN`
//! with the raw string carried in `description`, so unrecognized roles pass
//! through serialization untouched.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RoleTag {
    User,
    Admin,
    Unknown,
}

impl RoleTag {
    fn name(self) -> &'static str {
        match self {
            RoleTag::User => "ROLE_USER",
            RoleTag::Admin => "ROLE_ADMIN",
            RoleTag::Unknown => "UNKNOWN",
        }
    }
}

/// A role granted to a principal
///
/// Equality and hashing only look at the canonical tag; two unknown roles
/// with different descriptions compare equal.
#[derive(Debug, Clone)]
pub struct Role {
    tag: RoleTag,
    description: String,
}

impl Role {
    pub const USER: Role = Role {
        tag: RoleTag::User,
        description: String::new(),
    };

    pub const ADMIN: Role = Role {
        tag: RoleTag::Admin,
        description: String::new(),
    };

    pub const UNKNOWN: Role = Role {
        tag: RoleTag::Unknown,
        description: String::new(),
    };

    /// Parse a raw role value
    ///
    /// `None` and `"UNKNOWN"` give a bare `UNKNOWN`; `ROLE_USER`/`ROLE_ADMIN`
    /// match case-insensitively; anything else becomes `UNKNOWN` carrying
    /// the raw value.
    pub fn deserialize(value: Option<&str>) -> Role {
        let Some(value) = value else {
            return Role::UNKNOWN;
        };

        for canonical in [Role::UNKNOWN, Role::USER, Role::ADMIN] {
            if value.eq_ignore_ascii_case(canonical.tag.name()) {
                return canonical;
            }
        }

        Role {
            tag: RoleTag::Unknown,
            description: value.to_string(),
        }
    }

    /// Serialized form of the role
    pub fn serialize(&self) -> String {
        match self.tag {
            RoleTag::Unknown if !self.description.trim().is_empty() => self.description.clone(),
            tag => tag.name().to_string(),
        }
    }

    /// Canonical name, ignoring any description
    pub fn name(&self) -> &'static str {
        self.tag.name()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_unknown(&self) -> bool {
        self.tag == RoleTag::Unknown
    }
}

impl PartialEq for Role {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
    }
}

impl Eq for Role {}

impl Hash for Role {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag.hash(state);
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl FromStr for Role {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Role::deserialize(Some(s)))
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&Role::serialize(self))
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(Role::deserialize(value.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_canonical_roles_round_trip() {
        let admin = Role::deserialize(Some(&Role::ADMIN.serialize()));
        assert_eq!(admin, Role::ADMIN);
        assert_eq!(admin.serialize(), "ROLE_ADMIN");

        assert_eq!(Role::deserialize(Some("role_user")), Role::USER);
        assert_eq!(Role::USER.serialize(), "ROLE_USER");
    }

    #[test]
    fn test_unknown_value_passes_through() {
        let role = Role::deserialize(Some("ROLE_WHATEVER"));
        assert_eq!(role, Role::UNKNOWN);
        assert_eq!(role.description(), "ROLE_WHATEVER");
        assert_eq!(role.serialize(), "ROLE_WHATEVER");
    }

    #[test]
    fn test_missing_value_is_bare_unknown() {
        let role = Role::deserialize(None);
        assert_eq!(role, Role::UNKNOWN);
        assert_eq!(role.serialize(), "UNKNOWN");
        assert_eq!(Role::deserialize(Some("unknown")).serialize(), "UNKNOWN");
    }

    #[test]
    fn test_blank_description_serializes_as_unknown() {
        let role = Role::deserialize(Some("   "));
        assert!(role.is_unknown());
        assert_eq!(role.serialize(), "UNKNOWN");
    }

    #[test]
    fn test_equality_ignores_description() {
        let mut set = HashSet::new();
        set.insert(Role::deserialize(Some("ROLE_A")));
        set.insert(Role::deserialize(Some("ROLE_B")));
        set.insert(Role::USER);

        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_json_representation() {
        let roles = vec![Role::ADMIN, Role::deserialize(Some("ROLE_AUDITOR"))];
        let json = serde_json::to_string(&roles).unwrap();
        assert_eq!(json, r#"["ROLE_ADMIN","ROLE_AUDITOR"]"#);

        let parsed: Vec<Role> = serde_json::from_str(r#"["role_admin",null]"#).unwrap();
        assert_eq!(parsed, vec![Role::ADMIN, Role::UNKNOWN]);
    }
}
