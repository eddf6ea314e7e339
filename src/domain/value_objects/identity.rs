//! The acting user of a request.

use crate::domain::entities::User;

/// Outcome of identity resolution.
///
/// Cookie sessions resolve to the full profile. Bearer tokens resolve to the
/// id only, so code that needs profile fields must load them explicitly.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Identity {
    Resolved(User),
    ResolvedMinimal(i64),
    #[default]
    Anonymous,
}

impl Identity {
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Self::Resolved(user) => Some(user.id),
            Self::ResolvedMinimal(id) => Some(*id),
            Self::Anonymous => None,
        }
    }

    /// The full profile, when the cookie path produced one.
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Resolved(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::Anonymous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_identity_has_id_but_no_profile() {
        let identity = Identity::ResolvedMinimal(42);
        assert_eq!(identity.user_id(), Some(42));
        assert!(identity.user().is_none());
        assert!(identity.is_authenticated());
    }

    #[test]
    fn test_anonymous_has_nothing() {
        let identity = Identity::default();
        assert_eq!(identity.user_id(), None);
        assert!(!identity.is_authenticated());
    }
}
