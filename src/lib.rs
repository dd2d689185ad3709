//! hrana-link: a client protocol layer for remote SQLite-compatible
//! databases reached over stateless HTTP.
//!
//! The service executes each HTTP exchange independently; this crate layers
//! stateful SQL semantics on top — prepared statements, multi-statement
//! batches, streaming cursors, and explicit transactions whose
//! BEGIN/COMMIT/ROLLBACK stay bound to one server-side execution context
//! across round trips.
//!
//! # Examples
//!
//! ```rust,no_run
//! use hrana_link::{Config, TransactionMode};
//!
//! # async fn example() -> hrana_link::Result<()> {
//! let conn = hrana_link::connect(
//!     &Config::new("http://localhost:8080").with_auth_token("eyJhbGc..."),
//! )?;
//!
//! conn.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)", vec![]).await?;
//!
//! let stmt = conn.prepare("INSERT INTO users (name) VALUES (?)");
//! let run = stmt.run(vec!["alice".into()]).await?;
//! assert_eq!(run.rows_affected, 1);
//!
//! let mut txn = conn.transaction(TransactionMode::Write).await?;
//! txn.execute("UPDATE users SET name = ? WHERE id = ?", vec!["bob".into(), 1.into()]).await?;
//! txn.commit().await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod connection;
pub mod cursor;
pub mod error;
pub mod proto;
pub mod rows;
pub mod session;
pub mod statement;
pub mod transaction;
pub mod transport;
pub mod value;

pub use auth::AuthProvider;
pub use config::Config;
pub use connection::{connect, Connection, ConnectionBuilder};
pub use cursor::Rows;
pub use error::{DatabaseError, Result};
pub use rows::{ResultSet, Row};
pub use session::Session;
pub use statement::{RunResult, Statement};
pub use transaction::{Transaction, TransactionMode};
pub use transport::{HttpTransport, Transport};
pub use value::Value;
