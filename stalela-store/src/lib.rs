//! SQLite-backed record store for the Stalela data layer.
//!
//! Responsibilities:
//! - Open and bootstrap the database file.
//! - Build filtered statements with bound parameters.
//! - Map rows to typed records through per-table facades.
//!
//! Boundaries:
//! - Distance maths lives in `stalela-core`; [`Companies`] only answers
//!   bounding-box candidate queries for it.
//! - Existing tables are never migrated.
//!
//! Invariants:
//! - Column names reaching SQL text are compile-time identifiers.
//! - Timestamps are stored as RFC 3339 UTC text, so text order is
//!   chronological.
//!
//! # Examples
//!
//! ```
//! use geo::Coord;
//! use stalela_store::{Companies, CompanySource, Database, NewCompany};
//!
//! let db = Database::open_in_memory().expect("open database");
//! db.bootstrap().expect("create tables");
//! let companies = Companies::new(&db);
//! companies
//!     .create(&NewCompany::new(CompanySource::Yep, "y-1", "Acme").at(-26.2041, 28.0473))
//!     .expect("create company");
//!
//! let johannesburg = Coord { x: 28.0473, y: -26.2041 };
//! let nearby = companies.nearby(johannesburg, 5.0, None).expect("search");
//! assert_eq!(nearby[0].record.name, "Acme");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod database;
mod error;
mod query;
mod row;
mod schema;
mod value;
mod tables;

pub use database::{DEFAULT_BUSY_TIMEOUT, Database, DatabaseConfig};
pub use error::StoreError;
pub use query::{Changes, Direction, Filter, Page, Select};
pub use row::{FromRow, RowReader};
pub use tables::*;
pub use value::{SqlParam, UnknownVariant};
