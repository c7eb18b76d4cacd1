//! Sessions, log-in, registration and the guards that protect routes by role.

mod api;
mod cookie;
mod guard;
mod log_in;
mod log_out;
mod middleware;
mod redirect;
mod refresh_session;
mod register;
mod session;
mod token;

pub use api::{get_me, post_login, post_logout, post_refresh};
pub use cookie::{
    clear_selected_account_cookie, get_selected_account_id, set_selected_account_cookie,
};
pub use guard::Role;
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{
    AuthState, api_guard, member_guard, member_guard_hx, redirect_authenticated, staff_guard,
    staff_guard_hx,
};
pub use refresh_session::{create_refresh_session_table, revoke_user_refresh_sessions};
pub use register::{get_register_page, register_user};
pub use session::CurrentUser;
pub use token::{JwtKeys, TokenConfig};

#[cfg(test)]
pub(crate) use cookie::{ACCESS_COOKIE, REFRESH_COOKIE, SELECTED_ACCOUNT_COOKIE};
#[cfg(test)]
pub(crate) use refresh_session::insert_refresh_session;
#[cfg(test)]
pub(crate) use token::{TokenPair, create_token_pair};
