//! Extension-provided content setting rules
//!
//! A JSON array of `{ "pattern", "content_type", "setting" }` objects where
//! `pattern` uses extension match pattern syntax. Unlike preference
//! documents, any bad rule rejects the whole list, so the extension author
//! sees the exact reason.

use serde::Deserialize;

use hcs_core::{
    parse_extension_pattern, ContentSetting, ContentSettingsPattern, ContentSettingsType,
    SettingRecord,
};

use crate::parser::PrefsError;

#[derive(Debug, Deserialize)]
struct RawRule {
    pattern: String,
    content_type: String,
    setting: String,
}

/// A validated extension rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionRule {
    /// Pattern as the extension wrote it
    pub source: String,
    pub pattern: ContentSettingsPattern,
    pub content_type: ContentSettingsType,
    pub setting: ContentSetting,
}

impl From<ExtensionRule> for SettingRecord {
    fn from(rule: ExtensionRule) -> Self {
        SettingRecord {
            pattern: rule.pattern,
            content_type: rule.content_type,
            setting: rule.setting,
        }
    }
}

pub fn parse_extension_rules(text: &str) -> Result<Vec<ExtensionRule>, PrefsError> {
    let raw: Vec<RawRule> = serde_json::from_str(text)?;
    raw.into_iter().map(convert_rule).collect()
}

fn convert_rule(raw: RawRule) -> Result<ExtensionRule, PrefsError> {
    let pattern = parse_extension_pattern(&raw.pattern).map_err(|source| PrefsError::InvalidPattern {
        pattern: raw.pattern.clone(),
        source,
    })?;

    let content_type = ContentSettingsType::from_name(&raw.content_type)
        .ok_or_else(|| PrefsError::UnknownContentType(raw.content_type.clone()))?;

    let setting = ContentSetting::from_name(&raw.setting)
        .filter(|&s| content_type.supports(s))
        .ok_or_else(|| PrefsError::InvalidSetting {
            content_type,
            setting: raw.setting.clone(),
        })?;

    Ok(ExtensionRule {
        source: raw.pattern,
        pattern,
        content_type,
        setting,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcs_core::{HostContentSettingsMap, PatternError};

    #[test]
    fn test_parse_rules() {
        let rules = parse_extension_rules(
            r#"[
                { "pattern": "*://*.google.com/*", "content_type": "images", "setting": "block" },
                { "pattern": "<all_urls>", "content_type": "cookies", "setting": "session_only" }
            ]"#,
        )
        .unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].pattern.to_string(), "[*.]google.com");
        assert_eq!(rules[0].source, "*://*.google.com/*");
        assert!(rules[1].pattern.is_wildcard());

        let map = HostContentSettingsMap::new();
        map.apply(rules.into_iter().map(SettingRecord::from));
        assert_eq!(map.content_setting("maps.google.com", ContentSettingsType::Images), ContentSetting::Block);
        assert_eq!(map.content_setting("example.com", ContentSettingsType::Cookies), ContentSetting::SessionOnly);
    }

    #[test]
    fn test_invalid_pattern_keeps_message() {
        let err = parse_extension_rules(
            r#"[{ "pattern": "http://www.example.com/path", "content_type": "images", "setting": "block" }]"#,
        )
        .unwrap_err();
        match &err {
            PrefsError::InvalidPattern { pattern, source } => {
                assert_eq!(pattern, "http://www.example.com/path");
                assert_eq!(*source, PatternError::SpecificPath);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            err.to_string(),
            "Invalid pattern 'http://www.example.com/path': Specific paths are not allowed."
        );
    }

    #[test]
    fn test_unknown_type_and_setting() {
        let err = parse_extension_rules(
            r#"[{ "pattern": "<all_urls>", "content_type": "fonts", "setting": "block" }]"#,
        )
        .unwrap_err();
        assert!(matches!(err, PrefsError::UnknownContentType(ref t) if t == "fonts"));

        let err = parse_extension_rules(
            r#"[{ "pattern": "<all_urls>", "content_type": "popups", "setting": "ask" }]"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid popups setting: ask");
    }
}
