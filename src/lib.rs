pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod schema;
pub mod store;

pub use error::{ConfigError, StoreError};
pub use models::{NewPost, NewUser, Post, User};
pub use schema::{Column, ColumnType, Model, Registry, TableDef};
pub use store::Store;
