//! Preference document parsing
//!
//! The document is a JSON dictionary of global defaults, per-pattern
//! overrides keyed by canonical pattern and nested by type name, and the
//! third-party cookie flag. Entries the store cannot hold are skipped and
//! counted rather than failing the whole load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use hcs_core::{
    ContentSetting, ContentSettings, ContentSettingsPattern, ContentSettingsType,
    HostContentSettingsMap, PatternError, SettingRecord,
};

/// Error type for preference and rule loading.
#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: PatternError,
    },
    #[error("Unknown content type: {0}")]
    UnknownContentType(String),
    #[error("Invalid {content_type} setting: {setting}")]
    InvalidSetting {
        content_type: ContentSettingsType,
        setting: String,
    },
}

/// A setting value as stored: a name (`"block"`) or an integer code (`2`).
/// Anything else is kept as `Other` so the loader can skip it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Code(u8),
    Name(String),
    Other(serde_json::Value),
}

impl SettingValue {
    pub fn to_setting(&self) -> Option<ContentSetting> {
        match self {
            Self::Code(code) => ContentSetting::try_from(*code).ok(),
            Self::Name(name) => ContentSetting::from_name(name),
            Self::Other(_) => None,
        }
    }
}

impl From<ContentSetting> for SettingValue {
    fn from(setting: ContentSetting) -> Self {
        Self::Name(setting.name().to_string())
    }
}

impl std::fmt::Display for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{code}"),
            Self::Name(name) => f.write_str(name),
            Self::Other(value) => write!(f, "{value}"),
        }
    }
}

/// On-disk shape of the preference document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefsDocument {
    #[serde(default)]
    pub default_content_settings: BTreeMap<String, SettingValue>,
    #[serde(default)]
    pub content_settings: BTreeMap<String, BTreeMap<String, SettingValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_third_party_cookies: Option<bool>,
}

/// Counters for a preference load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub patterns: usize,
    pub settings: usize,
    pub skipped: usize,
}

/// Validated preferences, ready to feed into a store.
#[derive(Debug, Clone, Default)]
pub struct Prefs {
    /// `Default` entries mean "not set in the document"
    pub defaults: ContentSettings,
    pub records: Vec<SettingRecord>,
    /// `None` when the document does not mention the flag
    pub block_third_party_cookies: Option<bool>,
    pub stats: LoadStats,
}

/// Parse a preference document. Only malformed JSON is an error.
pub fn parse_prefs(text: &str) -> Result<Prefs, PrefsError> {
    let document: PrefsDocument = serde_json::from_str(text)?;
    Ok(Prefs::from_document(&document))
}

impl Prefs {
    pub fn from_document(document: &PrefsDocument) -> Self {
        let mut prefs = Prefs {
            block_third_party_cookies: document.block_third_party_cookies,
            ..Prefs::default()
        };

        for (type_name, value) in &document.default_content_settings {
            match convert_entry(type_name, value) {
                Some((content_type, setting)) if setting != ContentSetting::Default => {
                    prefs.defaults.set(content_type, setting);
                }
                _ => {
                    log::warn!("skipping default {type_name}={value}");
                    prefs.stats.skipped += 1;
                }
            }
        }

        for (pattern_text, settings) in &document.content_settings {
            let pattern: ContentSettingsPattern = match pattern_text.parse() {
                Ok(pattern) => pattern,
                Err(e) => {
                    log::warn!("skipping pattern '{pattern_text}': {e}");
                    prefs.stats.skipped += settings.len();
                    continue;
                }
            };

            let before = prefs.records.len();
            for (type_name, value) in settings {
                match convert_entry(type_name, value) {
                    Some((content_type, setting)) => prefs.records.push(SettingRecord {
                        pattern: pattern.clone(),
                        content_type,
                        setting,
                    }),
                    None => {
                        log::warn!("skipping {pattern_text} setting {type_name}={value}");
                        prefs.stats.skipped += 1;
                    }
                }
            }

            if prefs.records.len() > before {
                prefs.stats.patterns += 1;
            }
        }

        prefs.stats.settings = prefs.records.len();
        prefs
    }

    /// Build a new store holding these preferences.
    pub fn build_store(&self) -> HostContentSettingsMap {
        let map = HostContentSettingsMap::with_defaults(self.defaults);
        self.apply_overrides(&map);
        map
    }

    /// Apply these preferences on top of an existing store.
    /// Returns the number of overrides that changed the store.
    pub fn apply_to(&self, map: &HostContentSettingsMap) -> usize {
        for (content_type, setting) in self.defaults.iter() {
            if setting != ContentSetting::Default {
                map.set_default_content_setting(content_type, setting);
            }
        }
        self.apply_overrides(map)
    }

    fn apply_overrides(&self, map: &HostContentSettingsMap) -> usize {
        if let Some(block) = self.block_third_party_cookies {
            map.set_block_third_party_cookies(block);
        }
        let changed = map.apply(self.records.iter().cloned());
        log::debug!(
            "loaded {} settings for {} patterns ({} skipped)",
            self.stats.settings,
            self.stats.patterns,
            self.stats.skipped
        );
        changed
    }
}

/// Resolve a type name and value, dropping values the type does not support.
fn convert_entry(type_name: &str, value: &SettingValue) -> Option<(ContentSettingsType, ContentSetting)> {
    let content_type = ContentSettingsType::from_name(type_name)?;
    let setting = value.to_setting()?;
    if !content_type.supports(setting) {
        return None;
    }
    Some((content_type, setting))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "default_content_settings": { "popups": "allow", "cookies": 2, "images": "default" },
        "content_settings": {
            "[*.]example.com": { "images": "block", "cookies": "session_only" },
            "http://www.example.com:8080": { "plugins": 3 },
            "example.org/path": { "images": "block" },
            "example.net": { "bogus": "block", "popups": "ask" }
        },
        "block_third_party_cookies": true
    }"#;

    #[test]
    fn test_parse_prefs() {
        let prefs = parse_prefs(SAMPLE).unwrap();
        assert_eq!(prefs.defaults.get(ContentSettingsType::Popups), ContentSetting::Allow);
        assert_eq!(prefs.defaults.get(ContentSettingsType::Cookies), ContentSetting::Block);
        assert_eq!(prefs.defaults.get(ContentSettingsType::Images), ContentSetting::Default);
        assert_eq!(prefs.block_third_party_cookies, Some(true));
        assert_eq!(
            prefs.stats,
            LoadStats {
                patterns: 2,
                settings: 3,
                skipped: 4,
            }
        );
    }

    #[test]
    fn test_build_store() {
        let map = parse_prefs(SAMPLE).unwrap().build_store();
        assert_eq!(map.default_content_setting(ContentSettingsType::Popups), ContentSetting::Allow);
        assert_eq!(map.default_content_setting(ContentSettingsType::Images), ContentSetting::Allow);
        assert_eq!(map.content_setting("www.example.com", ContentSettingsType::Images), ContentSetting::Block);
        assert_eq!(
            map.content_setting("http://www.example.com:8080/", ContentSettingsType::Plugins),
            ContentSetting::Ask
        );
        assert!(map.block_third_party_cookies());
        assert_eq!(map.pattern_count(), 2);
    }

    #[test]
    fn test_apply_to_existing_store() {
        let map = HostContentSettingsMap::new();
        let changed = parse_prefs(SAMPLE).unwrap().apply_to(&map);
        assert_eq!(changed, 3);
        assert_eq!(map.default_content_setting(ContentSettingsType::Cookies), ContentSetting::Block);
        assert_eq!(map.content_setting("a.example.com", ContentSettingsType::Cookies), ContentSetting::SessionOnly);
    }

    #[test]
    fn test_empty_document() {
        let prefs = parse_prefs("{}").unwrap();
        assert!(prefs.records.is_empty());
        assert!(prefs.defaults.is_all_default());
        assert_eq!(prefs.block_third_party_cookies, None);
    }

    #[test]
    fn test_unexpected_values_are_skipped() {
        let text = r#"{
            "default_content_settings": { "popups": null },
            "content_settings": {
                "a.com": { "images": 300, "cookies": -1, "plugins": null, "popups": [1] },
                "b.com": { "images": "block" }
            }
        }"#;
        let prefs = parse_prefs(text).unwrap();
        assert!(prefs.defaults.is_all_default());
        assert_eq!(
            prefs.stats,
            LoadStats {
                patterns: 1,
                settings: 1,
                skipped: 5,
            }
        );

        let map = prefs.build_store();
        assert_eq!(map.content_setting("b.com", ContentSettingsType::Images), ContentSetting::Block);
        assert_eq!(map.content_setting("a.com", ContentSettingsType::Images), ContentSetting::Allow);
    }

    #[test]
    fn test_apply_to_keeps_unmentioned_cookie_flag() {
        let map = HostContentSettingsMap::new();
        map.set_block_third_party_cookies(true);

        let prefs = parse_prefs(r#"{"content_settings":{"a.com":{"images":"block"}}}"#).unwrap();
        assert_eq!(prefs.apply_to(&map), 1);
        assert!(map.block_third_party_cookies());

        parse_prefs(r#"{"block_third_party_cookies":false}"#).unwrap().apply_to(&map);
        assert!(!map.block_third_party_cookies());
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_prefs("{ not json").unwrap_err();
        assert!(matches!(err, PrefsError::Json(_)));
        assert!(err.to_string().starts_with("Invalid JSON"));
    }
}
