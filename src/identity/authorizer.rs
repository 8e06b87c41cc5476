use super::role::{Audience, Role};
use super::session::Session;

/// True iff the session is authenticated and its role is in `roles`.
/// An empty role list authorizes nobody.
pub fn is_authorized(session: &Session, roles: &[Role]) -> bool {
    match session.role() {
        Some(role) => roles.contains(&role),
        None => false,
    }
}

/// Whether a session may see something shown to `audiences`.
pub fn is_visible_to(session: &Session, audiences: &[Audience]) -> bool { audiences.contains(&session.audience()) }

/// Roles that share the auditor dashboard and audit menu.
pub const AUDITOR_ROLES: &[Role] = &[Role::Auditor, Role::FieldAuditor];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::provider::demo_identities;

    #[test]
    fn authorized_iff_authenticated_and_member() {
        for identity in demo_identities() {
            let s = Session::authenticated(identity.clone());
            for role in Role::ALL {
                assert_eq!(is_authorized(&s, &[role]), role == identity.role);
            }
            assert!(is_authorized(&s, &Role::ALL));
            assert!(!is_authorized(&s, &[]));
        }
    }

    #[test]
    fn empty_and_loading_sessions_are_never_authorized() {
        for s in [Session::empty(), Session::loading()] {
            assert!(!is_authorized(&s, &Role::ALL));
            assert!(!is_authorized(&s, &[]));
        }
    }

    #[test]
    fn guests_see_only_guest_marked_audiences() {
        let guest = Session::empty();
        assert!(is_visible_to(&guest, &[Audience::Guest]));
        assert!(!is_visible_to(&guest, &Audience::signed_in()));
        let admin = Session::authenticated(demo_identities().remove(0));
        assert!(!is_visible_to(&admin, &[Audience::Guest]));
        assert!(is_visible_to(&admin, &[Audience::Role(Role::Admin)]));
    }
}
