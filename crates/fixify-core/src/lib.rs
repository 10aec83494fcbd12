pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod formatter;
pub mod location;
pub mod matcher;
pub mod parser;
pub mod schema;
pub mod session;
pub mod speech;

pub use catalog::Catalog;
pub use config::AppConfig;
pub use error::{CoreError, Result};
pub use session::{generate_solution, Reply, Session};
