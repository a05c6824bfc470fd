//! Network Monitor Filter Core
//!
//! This crate provides the request data model and the predicate evaluator
//! behind the network monitor's filter box.
//!
//! # Architecture
//!
//! Request records arrive from an external request-tracking collaborator
//! (usually as JSON). A search string is parsed elsewhere (see `nf-query`)
//! into a [`ParsedQuery`]; the [`Matcher`] compiles that query once and then
//! decides, record by record, whether it belongs in the filtered view.
//! Nothing here performs I/O or keeps global state.
//!
//! # Modules
//!
//! - `types`: Flag names, parsed query types, request-type masks
//! - `record`: Request records and JSON loading
//! - `url`: Fast URL slicing helpers
//! - `format`: Display formatting shared by matching and autocomplete
//! - `prefs`: Injected filter preferences snapshot
//! - `matcher`: Predicate evaluation

pub mod format;
pub mod matcher;
pub mod prefs;
pub mod record;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use matcher::{is_flag_match, is_text_match, matches, Matcher};
pub use prefs::FilterPrefs;
pub use record::{load_records, LoadError, RequestRecord};
pub use types::{FilterFlag, FlagFilter, FlagValue, ParsedQuery, RequestFilterTypes};
