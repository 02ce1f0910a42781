use axum::routing::get;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::LimitsConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(limits: &LimitsConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/registrations", registration_routes(limits))
        .merge(submission_routes(limits))
        .routes(routes!(handlers::events::receive_event))
        // Wildcard keys span several segments; documented in `ApiDoc` under the full path.
        .route("/files/{*key}", get(handlers::files::get_file))
}

fn registration_routes(limits: &LimitsConfig) -> OpenApiRouter<AppState> {
    let lifecycle = OpenApiRouter::new()
        .routes(routes!(handlers::registration::save_draft))
        .routes(routes!(handlers::registration::get_registration))
        .routes(routes!(handlers::registration::abandon_registration))
        .routes(routes!(handlers::registration::sweep_abandoned));

    let submit = OpenApiRouter::new()
        .routes(routes!(handlers::registration::submit_registration))
        .layer(handlers::registration::submit_body_limit(limits));

    lifecycle.merge(submit)
}

fn submission_routes(limits: &LimitsConfig) -> OpenApiRouter<AppState> {
    let gate = OpenApiRouter::new()
        .routes(routes!(handlers::redemption::get_window))
        .routes(routes!(handlers::redemption::verify_code));

    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::redemption::create_submission))
        .layer(handlers::redemption::submission_body_limit(limits));

    gate.merge(upload)
}
