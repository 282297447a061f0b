//! gamedb core -- schema-driven decoding of spreadsheet tables into typed
//! records.
//!
//! The pipeline for one sheet is:
//!
//! 1. **Resolve** -- [`schema::resolve_columns`] binds header cells to the
//!    fields a [`schema::RecordShape`] declares.
//! 2. **Read** -- [`sheet::read_sheet`] decodes every data row, delegating
//!    each cell to a primitive rule or a [`decode::CellDecode`] grammar.
//! 3. **Install** -- [`install`] moves the rows into a sequence or keyed
//!    table, enforcing key uniqueness.
//!
//! [`install::SheetLoader`] bundles all three behind one object per sheet so
//! a database crate can declare its tables as data.

pub mod decode;
pub mod error;
pub mod install;
pub mod schema;
pub mod sheet;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::SheetError;
