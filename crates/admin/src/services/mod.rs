//! Business logic services for admin.
//!
//! # Services
//!
//! - `import` - CSV bulk import with per-row rejection and an atomic apply

pub mod import;

pub use import::{ImportError, ImportService, ParsedImport, parse_csv};
