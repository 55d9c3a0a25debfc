//! Entity and association routes.
//! Path parameter names (`user_id`, `workspace_id`, `template_id`) drive the id-check middleware.

use crate::config::{Templates, Users, Workspaces};
use crate::handlers::entity;
use crate::handlers::{
    create_user_workspace, create_workspace, delete_user_template, delete_user_workspace, get_user_template,
    link_template, list_user_templates, list_user_workspaces, list_workspace_templates, patch_user_template,
    unlink_template, update_workspace,
};
use crate::middleware::{validate_json_body, validate_path_ids};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/template", get(entity::list::<Templates>).post(entity::create::<Templates>))
        .route(
            "/template/:template_id",
            get(entity::read::<Templates>)
                .patch(entity::update::<Templates>)
                .delete(entity::delete::<Templates>),
        )
        .route("/workspace", get(entity::list::<Workspaces>).post(create_workspace))
        .route(
            "/workspace/:workspace_id",
            get(entity::read::<Workspaces>)
                .patch(update_workspace)
                .delete(entity::delete::<Workspaces>),
        )
        .route("/workspace/:workspace_id/link_template", post(link_template))
        .route("/workspace/:workspace_id/template", get(list_workspace_templates))
        .route("/workspace/:workspace_id/template/:template_id", delete(unlink_template))
        .route("/user", get(entity::list::<Users>).post(entity::create::<Users>))
        .route(
            "/user/:user_id",
            get(entity::read::<Users>)
                .patch(entity::update::<Users>)
                .delete(entity::delete::<Users>),
        )
        .route(
            "/user/:user_id/workspace",
            get(list_user_workspaces).post(create_user_workspace),
        )
        .route("/user/:user_id/workspace/:workspace_id", delete(delete_user_workspace))
        .route("/user/:user_id/workspace/:workspace_id/template", get(list_user_templates))
        .route(
            "/user/:user_id/workspace/:workspace_id/template/:template_id",
            get(get_user_template)
                .patch(patch_user_template)
                .delete(delete_user_template),
        )
        .route_layer(middleware::from_fn(validate_json_body))
        .route_layer(middleware::from_fn(validate_path_ids))
        .with_state(state)
}
