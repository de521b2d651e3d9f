//! Repository layer (component C): CRUD, listings, and set algebra over
//! the record model, backed by Postgres via `sqlx`.

pub mod datasets;
pub mod files;
pub mod fileset;
pub mod membership;
pub mod namespaces;
pub mod params;
pub mod queries;
pub mod roles;
pub mod users;
