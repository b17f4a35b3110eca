//! Domain models and types for phi-scan.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Records** ([`Record`], [`RecordId`]) assembled from the input stream
//! - **Spans** ([`MatchSpan`]) in note-relative character coordinates
//! - **Categories** ([`PhiCategory`]) naming each detector and report file
//! - **Error types** ([`ScanError`]) and the [`Result`] alias
//!
//! # Error Handling
//!
//! All fallible library operations return [`Result<T, ScanError>`]:
//!
//! ```rust
//! use phi_scan::domain::{PhiCategory, Result};
//!
//! fn example() -> Result<PhiCategory> {
//!     let category: PhiCategory = "phone"
//!         .parse()
//!         .map_err(phi_scan::domain::ScanError::Configuration)?;
//!     Ok(category)
//! }
//! ```

pub mod category;
pub mod errors;
pub mod record;
pub mod result;

pub use category::PhiCategory;
pub use errors::ScanError;
pub use record::{MatchSpan, Record, RecordId};
pub use result::Result;
