//! Host Content Settings Core Library
//!
//! This crate provides the pattern engine and the settings store for
//! host-scoped content permissions (cookies, images, popups, ...).
//!
//! # Architecture
//!
//! Match patterns written by users or extensions are parsed into a canonical
//! `ContentSettingsPattern`. The store keeps one default per content type and
//! a map from pattern to per-type overrides. Lookups pick the most specific
//! matching pattern per type and fall back to the default.
//!
//! # Modules
//!
//! - `types`: Content types, setting values and the static defaults table
//! - `host`: Hostname normalization and suffix walking
//! - `url`: Allocation-light URL slicing and the lookup key
//! - `pattern`: Pattern parsing, canonical form, matching and specificity
//! - `store`: The thread-safe settings store and change notifications

pub mod host;
pub mod pattern;
pub mod store;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use pattern::{parse_extension_pattern, ContentSettingsPattern, HostPart, PatternError};
pub use store::{
    ContentSettingsDetails, ContentSettingsObserver, HostContentSettingsMap, ObserverId,
    SettingRecord, SettingsForOneType,
};
pub use types::{ContentSetting, ContentSettings, ContentSettingsType, NUM_TYPES};
pub use url::HostQuery;
