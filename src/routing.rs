//! Application router configuration with protected and unprotected route definitions.

use std::any::Any;

use axum::{
    Router,
    http::{Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::catch_panic::CatchPanicLayer;

use crate::{
    AppState, Error,
    auth::{auth_guard, post_token, post_token_refresh, register_user},
    category::{
        create_category_endpoint, delete_category_endpoint, get_category_endpoint,
        list_categories_endpoint, partial_update_category_endpoint, update_category_endpoint,
    },
    endpoints,
    error::{detail_response, server_error_response},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_transaction_endpoint,
        list_transaction_months_endpoint, list_transactions_endpoint,
        partial_update_transaction_endpoint, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::TOKEN, post(post_token))
        .route(endpoints::TOKEN_REFRESH, post(post_token_refresh));

    let protected_routes = Router::new()
        .route(
            endpoints::CATEGORIES,
            get(list_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY,
            get(get_category_endpoint)
                .put(update_category_endpoint)
                .patch(partial_update_category_endpoint)
                .delete(delete_category_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION_MONTHS,
            get(list_transaction_months_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(update_transaction_endpoint)
                .patch(partial_update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .method_not_allowed_fallback(get_405_method_not_allowed)
        .fallback(get_404_not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    detail_response(StatusCode::IM_A_TEAPOT, "I'm a teapot")
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}

async fn get_405_method_not_allowed(method: Method) -> Error {
    Error::MethodNotAllowed(method.to_string())
}

fn handle_panic(error: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(message) = error.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = error.downcast_ref::<&str>() {
        message
    } else {
        "unknown panic message"
    };

    tracing::error!("a request handler panicked: {message}");

    server_error_response().into_response()
}
