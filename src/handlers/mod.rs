//! HTTP handlers: generic entity CRUD plus workspace and user association endpoints.

pub mod entity;
pub mod user;
pub mod workspace;
pub use user::*;
pub use workspace::*;
