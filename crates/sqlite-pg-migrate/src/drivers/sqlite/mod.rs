//! SQLite driver.
//!
//! - [`SqliteDialect`]: SQL syntax strategy for SQLite
//! - [`SqliteReader`]: Source reader for the data file
//! - [`SqliteWriter`]: Target writer, used when the target descriptor is a
//!   `sqlite:` URL

mod dialect;
mod reader;
mod writer;

pub use dialect::SqliteDialect;
pub use reader::SqliteReader;
pub use writer::SqliteWriter;
