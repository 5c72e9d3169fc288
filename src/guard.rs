//! Navigation guard
//!
//! A pure decision function over the session state and the requested
//! route: anonymous sessions are redirected to login (remembering where
//! they were headed), sessions with a pending second factor are redirected
//! to MFA setup unless that is where they are going. Re-evaluated per
//! navigation; no timers, no background re-checks.

use crate::session::SessionState;

pub const LOGIN_ROUTE: &str = "/login";
pub const MFA_SETUP_ROUTE: &str = "/mfa-setup";

/// Outcome of evaluating a protected route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Proceed,
    /// Not authenticated; `from` is the intended destination to return to
    RedirectToLogin { from: String },
    RedirectToMfaSetup { from: String },
}

/// Decide whether the session may enter `route`.
pub fn evaluate(state: SessionState, route: &str) -> RouteDecision {
    match state {
        SessionState::Anonymous => RouteDecision::RedirectToLogin { from: route.to_string() },
        SessionState::MfaPending if !route.contains("/mfa") => {
            RouteDecision::RedirectToMfaSetup { from: route.to_string() }
        }
        _ => RouteDecision::Proceed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_is_sent_to_login_with_destination() {
        let decision = evaluate(SessionState::Anonymous, "/files");
        assert_eq!(
            decision,
            RouteDecision::RedirectToLogin { from: "/files".to_string() }
        );
    }

    #[test]
    fn pending_mfa_is_sent_to_setup_unless_already_there() {
        assert_eq!(
            evaluate(SessionState::MfaPending, "/files"),
            RouteDecision::RedirectToMfaSetup { from: "/files".to_string() }
        );
        assert_eq!(
            evaluate(SessionState::MfaPending, MFA_SETUP_ROUTE),
            RouteDecision::Proceed
        );
    }

    #[test]
    fn authenticated_proceeds() {
        assert_eq!(evaluate(SessionState::Authenticated, "/files"), RouteDecision::Proceed);
        assert_eq!(evaluate(SessionState::Authenticated, "/shared"), RouteDecision::Proceed);
    }
}
