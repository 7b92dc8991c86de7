use common_auth::Role;

use crate::session::Session;

pub const LOGIN_ROUTE: &str = "/login";
pub const ADMIN_LOGIN_ROUTE: &str = "/admin/login";

/// Condition a protected view requires before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRequirement {
    Authenticated,
    Admin,
}

/// What the gate knows about the session at decision time. `Restoring`
/// models the window before [`SessionManager::restore`] has been applied to
/// the UI, during which nothing should render.
///
/// [`SessionManager::restore`]: crate::session::SessionManager::restore
#[derive(Debug, Clone, Copy)]
pub enum SessionState<'a> {
    Restoring,
    Ready(Option<&'a Session>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Restoration still in flight: render nothing rather than guess.
    Pending,
    Allow,
    /// Condition failed: navigate to the fallback route instead.
    Redirect(&'static str),
}

impl GateRequirement {
    pub fn fallback_route(&self) -> &'static str {
        match self {
            GateRequirement::Authenticated => LOGIN_ROUTE,
            GateRequirement::Admin => ADMIN_LOGIN_ROUTE,
        }
    }

    /// Advisory navigation check mirroring the server-side guard. The access
    /// guard remains the authority; this only spares the user a round trip.
    pub fn decide(&self, state: SessionState<'_>) -> GateDecision {
        match state {
            SessionState::Restoring => GateDecision::Pending,
            SessionState::Ready(None) => GateDecision::Redirect(self.fallback_route()),
            SessionState::Ready(Some(session)) => match self {
                GateRequirement::Authenticated => GateDecision::Allow,
                GateRequirement::Admin if session.identity.role == Role::Admin => {
                    GateDecision::Allow
                }
                GateRequirement::Admin => GateDecision::Redirect(ADMIN_LOGIN_ROUTE),
            },
        }
    }
}
