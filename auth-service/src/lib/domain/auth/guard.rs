use crate::auth::models::Principal;
use crate::auth::models::Role;

/// Request-time authorization decision.
///
/// - No roles required: allow unconditionally, authenticated or not.
///   Whether a principal must be present at all is the authentication
///   middleware's concern, not the guard's.
/// - Roles required but no principal: deny.
/// - Otherwise: allow iff the principal holds ANY one of the required roles.
pub fn is_allowed(principal: Option<&Principal>, required: &[Role]) -> bool {
    if required.is_empty() {
        return true;
    }

    match principal {
        Some(principal) => required.iter().any(|role| principal.roles.contains(role)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::UserId;

    fn principal_with(roles: Vec<Role>) -> Principal {
        Principal {
            user_id: UserId::new(),
            email: "user@example.com".to_string(),
            roles,
        }
    }

    #[test]
    fn test_no_requirement_allows_unauthenticated() {
        assert!(is_allowed(None, &[]));
    }

    #[test]
    fn test_no_requirement_allows_any_principal() {
        let principal = principal_with(vec![Role::Patient]);
        assert!(is_allowed(Some(&principal), &[]));
    }

    #[test]
    fn test_requirement_denies_unauthenticated() {
        assert!(!is_allowed(None, &[Role::Admin]));
    }

    #[test]
    fn test_any_of_semantics() {
        let principal = principal_with(vec![Role::Clinician]);
        assert!(is_allowed(Some(&principal), &[Role::Admin, Role::Clinician]));
        assert!(!is_allowed(
            Some(&principal),
            &[Role::Admin, Role::Receptionist]
        ));
    }

    #[test]
    fn test_granted_iff_intersection_nonempty() {
        // Exhaustive over single-role principals and single-role requirements.
        for held in Role::ALL {
            let principal = principal_with(vec![held]);
            for required in Role::ALL {
                assert_eq!(
                    is_allowed(Some(&principal), &[required]),
                    held == required
                );
            }
        }
    }

    #[test]
    fn test_empty_role_set_on_principal_denied() {
        // Role sets are non-empty by invariant, but the guard must still
        // fail closed if one slips through.
        let principal = principal_with(vec![]);
        assert!(!is_allowed(Some(&principal), &[Role::Patient]));
    }
}
