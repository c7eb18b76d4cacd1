//! Deciding whether a visitor may see a page that requires a role.

use crate::{auth::session::SessionState, endpoints};

/// The two kinds of users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Staff manage users and accounts from the admin panel.
    Staff,
    /// Regular users manage their own accounts and transactions.
    Member,
}

/// The page a user of `role` is sent to after logging in or when they visit a page meant for
/// the other role.
pub fn landing_page(role: Role) -> &'static str {
    match role {
        Role::Staff => endpoints::ADMIN_VIEW,
        Role::Member => endpoints::ACCOUNTS_VIEW,
    }
}

/// The outcome of checking a visitor against a route's required role.
#[derive(Debug, Clone, PartialEq)]
pub enum Authorization {
    Granted,
    /// The session is still being resolved, show a loading indicator.
    Pending,
    /// The visitor must log in first.
    LogIn,
    /// The visitor is logged in but has the wrong role, send them to this page instead.
    Redirect(&'static str),
}

/// Check `state` against `required`. Any authenticated user passes when `required` is `None`.
pub fn authorize(state: &SessionState, required: Option<Role>) -> Authorization {
    match state {
        SessionState::Loading => Authorization::Pending,
        SessionState::Anonymous => Authorization::LogIn,
        SessionState::Authenticated(user) => match required {
            Some(role) if role != user.role() => Authorization::Redirect(landing_page(user.role())),
            _ => Authorization::Granted,
        },
    }
}
