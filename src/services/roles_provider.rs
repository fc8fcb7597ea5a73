//! Roles granted to newly registered users

use crate::auth::Role;

pub trait RolesProvider: Send + Sync {
    fn default_roles(&self) -> Vec<Role>;
}

/// Serves the roles listed in configuration
pub struct ConfiguredRolesProvider {
    roles: Vec<Role>,
}

impl ConfiguredRolesProvider {
    /// Blank entries are skipped; an empty list falls back to `ROLE_USER`
    pub fn new<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut roles: Vec<Role> = Vec::new();
        for value in raw {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            let role = Role::deserialize(Some(value));
            // Role equality ignores the description, so compare serialized forms
            if !roles.iter().any(|r| r.serialize() == role.serialize()) {
                roles.push(role);
            }
        }

        if roles.is_empty() {
            roles.push(Role::USER);
        }

        Self { roles }
    }
}

impl Default for ConfiguredRolesProvider {
    fn default() -> Self {
        Self { roles: vec![Role::USER] }
    }
}

impl RolesProvider for ConfiguredRolesProvider {
    fn default_roles(&self) -> Vec<Role> {
        self.roles.clone()
    }
}
