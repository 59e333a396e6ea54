//! Host Content Settings Preferences
//!
//! This crate loads and writes the JSON preference document backing a
//! content settings store, and imports extension-provided rules.

pub mod extension;
pub mod parser;
pub mod writer;

pub use extension::{parse_extension_rules, ExtensionRule};
pub use parser::{parse_prefs, LoadStats, Prefs, PrefsDocument, PrefsError, SettingValue};
pub use writer::{to_document, write_prefs};
