//! Typed record model (component B). Each type is a plain struct built by
//! the repository layer from query rows; see `repo` for persistence and
//! lazy-load behavior.

pub mod dataset;
pub mod file;
pub mod namespace;
pub mod param;
pub mod query;
pub mod user;

pub use dataset::Dataset;
pub use file::File;
pub use namespace::{Namespace, Owner};
pub use param::{ParamCategory, ParamDefinition, ParamType};
pub use query::NamedQuery;
pub use user::{Authenticator, AuthenticatorType, Role, Secret, User};
