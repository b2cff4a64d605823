use axum::{middleware, routing::get, Router};
use crate::handlers;
use crate::middleware::{
    accessible_tabs_middleware, restricted_admin_middleware, restricted_role_middleware,
    root_admin_middleware, service_audit_middleware,
};
use crate::state::AppState;

/// Wrap the host's API router with the compliance hooks.
///
/// Request order, outermost first: restricted role deletion, restricted admin sync, service
/// audit, root admin annotation, accessible tabs decoration.
pub fn with_compliance(router: Router, state: AppState) -> Router {
    router
        .layer(middleware::from_fn_with_state(state.clone(), accessible_tabs_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), root_admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), service_audit_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), restricted_admin_middleware))
        .layer(middleware::from_fn_with_state(state, restricted_role_middleware))
}

/// The service report resource under the system service
pub fn service_report_routes(state: AppState) -> Router {
    let path = format!("/api/:version/{}/service_report", state.settings.system_service);

    Router::new()
        .route(
            &path,
            get(handlers::report_list)
                .delete(handlers::report_delete)
                .post(handlers::report_unsupported)
                .put(handlers::report_unsupported)
                .patch(handlers::report_unsupported),
        )
        .with_state(state)
}

/// Compliance routes plus `host`, all behind the compliance hooks
pub fn app(host: Router, state: AppState) -> Router {
    let routes = Router::new()
        .route("/health", get(handlers::health))
        .with_state(state.clone())
        .merge(service_report_routes(state.clone()))
        .merge(host);

    with_compliance(routes, state)
}
