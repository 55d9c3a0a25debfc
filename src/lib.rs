//! Workspace registry: REST backend for users, workspaces, templates and their associations.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{EntitySchema, Resource, Settings, Templates, Users, Workspaces};
pub use error::{AppError, ConfigError};
pub use response::{error_body, success_many, success_one};
pub use routes::{api_routes, app, common_routes};
pub use service::{AssociationService, CrudService};
pub use state::AppState;
pub use store::{drop_tables, ensure_database_exists, ensure_tables, seed_sample_data};
