use std::collections::HashSet;

use crate::identity::errors::AuthError;
use crate::identity::models::Identity;
use crate::identity::models::Role;

/// Role-based admission check for a resolved identity.
///
/// Pure membership test with no side effects. Runs after identity
/// resolution, so it only ever sees a resolved identity; a missing identity
/// is an upstream `Unauthorized`, never this gate's concern.
#[derive(Debug, Clone)]
pub struct RoleGate {
    allowed: HashSet<Role>,
}

impl RoleGate {
    /// Build a gate admitting exactly the given roles.
    pub fn new(allowed: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    /// Admit or reject the identity by role.
    ///
    /// # Errors
    /// * `Forbidden` - Identity's role is not in the allowed set
    pub fn check(&self, identity: &Identity) -> Result<(), AuthError> {
        if self.allowed.contains(&identity.role) {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::identity::models::EmailAddress;
    use crate::identity::models::IdentityId;
    use crate::identity::models::Username;

    fn identity_with_role(role: Role) -> Identity {
        Identity {
            id: IdentityId::new(),
            email: EmailAddress::new("alice@example.com".to_string()).unwrap(),
            username: Username::new("alice".to_string()).unwrap(),
            avatar_url: None,
            role,
            confirmed: true,
            refresh_token: None,
            password_hash: "$argon2id$hash".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_allow_deny_matrix() {
        let roles = [Role::Admin, Role::Moderator, Role::User];

        // Every non-empty allowed set against every role
        for allowed_mask in 1u8..8 {
            let allowed: Vec<Role> = roles
                .iter()
                .enumerate()
                .filter(|(i, _)| allowed_mask & (1 << i) != 0)
                .map(|(_, r)| *r)
                .collect();
            let gate = RoleGate::new(allowed.clone());

            for role in roles {
                let result = gate.check(&identity_with_role(role));
                if allowed.contains(&role) {
                    assert!(result.is_ok(), "{role} should pass {allowed:?}");
                } else {
                    assert!(
                        matches!(result, Err(AuthError::Forbidden)),
                        "{role} should be denied by {allowed:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_empty_gate_denies_everyone() {
        let gate = RoleGate::new([]);
        for role in [Role::Admin, Role::Moderator, Role::User] {
            assert!(matches!(
                gate.check(&identity_with_role(role)),
                Err(AuthError::Forbidden)
            ));
        }
    }
}
