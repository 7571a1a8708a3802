//! SQLite as a scoped resource for `tower-query`.
//!
//! - [`SqliteConnector`] is a [`ResourceManager`](tower_query_scope::ResourceManager):
//!   each scope opens its own connection and closes it on release.
//! - [`FetchAll`] is a base operation taking `Scoped<SqliteHandle, String>`:
//!   it runs the SQL verbatim and returns all rows.
//!
//! # Examples
//!
//! ```no_run
//! use tower::{ServiceBuilder, ServiceExt};
//! use tower_query_scope::ScopeLayer;
//! use tower_query_sqlite::{FetchAll, SqliteConnector};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = ServiceBuilder::new()
//!     .layer(ScopeLayer::new(SqliteConnector::new("users.db")))
//!     .service(FetchAll);
//!
//! let users = service.oneshot("SELECT * FROM users".to_string()).await?;
//! println!("{:?}", users);
//! # Ok(())
//! # }
//! ```

mod connector;
mod error;
mod fetch;

pub use connector::{SqliteConnector, SqliteHandle};
pub use error::SqliteError;
pub use fetch::FetchAll;

/// Rows returned by a query, each row as its column values.
pub type Rows = std::sync::Arc<Vec<Vec<rusqlite::types::Value>>>;
