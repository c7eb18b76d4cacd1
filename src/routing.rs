//! Application router configuration with the routes grouped by the guard that protects them.

use axum::{
    Router,
    extract::FromRef,
    middleware,
    response::Redirect,
    routing::{delete, get, post, put},
};

use crate::{
    AppState,
    account::{
        create_account_endpoint, delete_account_endpoint, edit_account_endpoint,
        get_accounts_page, get_create_account_page, get_edit_account_page,
        select_account_endpoint,
    },
    admin::{
        delete_account_as_staff_endpoint, delete_user_endpoint, get_admin_page,
        toggle_staff_endpoint,
    },
    auth::{
        AuthState, api_guard, get_log_in_page, get_log_out, get_me, get_register_page,
        member_guard, member_guard_hx, post_log_in, post_login, post_logout, post_refresh,
        redirect_authenticated, register_user, staff_guard, staff_guard_hx,
    },
    dashboard::get_dashboard_page,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    transaction::{create_transaction_endpoint, delete_transaction_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let auth_state = AuthState::from_ref(&state);

    // Logged in users are sent on to their landing page.
    let public_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route_layer(middleware::from_fn_with_state(
            auth_state.clone(),
            redirect_authenticated,
        ));

    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::USERS, post(register_user))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::AUTH_LOG_IN, post(post_login))
        .route(endpoints::AUTH_REFRESH, post(post_refresh))
        .route(endpoints::AUTH_LOG_OUT, post(post_logout))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let member_pages = Router::new()
        .route(endpoints::ACCOUNTS_VIEW, get(get_accounts_page))
        .route(endpoints::NEW_ACCOUNT_VIEW, get(get_create_account_page))
        .route(endpoints::EDIT_ACCOUNT_VIEW, get(get_edit_account_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route_layer(middleware::from_fn_with_state(
            auth_state.clone(),
            member_guard,
        ));

    // These routes need to use the HX-REDIRECT header for auth redirects to work properly for
    // HTMX requests.
    let member_api = Router::new()
        .route(endpoints::ACCOUNTS_API, post(create_account_endpoint))
        .route(
            endpoints::ACCOUNT,
            put(edit_account_endpoint).delete(delete_account_endpoint),
        )
        .route(endpoints::SELECT_ACCOUNT, post(select_account_endpoint))
        .route(
            endpoints::TRANSACTIONS_API,
            post(create_transaction_endpoint),
        )
        .route(endpoints::TRANSACTION, delete(delete_transaction_endpoint))
        .route_layer(middleware::from_fn_with_state(
            auth_state.clone(),
            member_guard_hx,
        ));

    let staff_pages = Router::new()
        .route(endpoints::ADMIN_VIEW, get(get_admin_page))
        .route_layer(middleware::from_fn_with_state(
            auth_state.clone(),
            staff_guard,
        ));

    let staff_api = Router::new()
        .route(endpoints::ADMIN_USER, delete(delete_user_endpoint))
        .route(endpoints::ADMIN_USER_STAFF, put(toggle_staff_endpoint))
        .route(
            endpoints::ADMIN_ACCOUNT,
            delete(delete_account_as_staff_endpoint),
        )
        .route_layer(middleware::from_fn_with_state(
            auth_state.clone(),
            staff_guard_hx,
        ));

    let json_api = Router::new()
        .route(endpoints::AUTH_ME, get(get_me))
        .route_layer(middleware::from_fn_with_state(auth_state, api_guard));

    Router::new()
        .merge(public_routes)
        .merge(unprotected_routes)
        .merge(member_pages)
        .merge(member_api)
        .merge(staff_pages)
        .merge(staff_api)
        .merge(json_api)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the log-in page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::LOG_IN_VIEW)
}
