//! Preference document writer
//!
//! Enumerates a store into the same document shape `parse_prefs` reads.
//! Output order is deterministic.

use hcs_core::{ContentSettingsType, HostContentSettingsMap};

use crate::parser::{PrefsDocument, PrefsError, SettingValue};

/// Snapshot a store as a preference document.
pub fn to_document(map: &HostContentSettingsMap) -> PrefsDocument {
    let mut document = PrefsDocument {
        block_third_party_cookies: Some(map.block_third_party_cookies()),
        ..PrefsDocument::default()
    };

    for content_type in ContentSettingsType::ALL {
        document.default_content_settings.insert(
            content_type.name().to_string(),
            SettingValue::from(map.default_content_setting(content_type)),
        );

        for (pattern, setting) in map.settings_for_one_type(content_type) {
            document
                .content_settings
                .entry(pattern.to_string())
                .or_default()
                .insert(content_type.name().to_string(), SettingValue::from(setting));
        }
    }

    document
}

/// Serialize a store as pretty-printed JSON.
pub fn write_prefs(map: &HostContentSettingsMap) -> Result<String, PrefsError> {
    let document = to_document(map);
    Ok(serde_json::to_string_pretty(&document)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_prefs;
    use hcs_core::ContentSetting;

    #[test]
    fn test_write_then_parse_round_trip() {
        let map = HostContentSettingsMap::new();
        map.set_default_content_setting(ContentSettingsType::Javascript, ContentSetting::Block);
        map.set_content_setting_for_host("[*.]example.com", ContentSettingsType::Images, ContentSetting::Block)
            .unwrap();
        map.set_content_setting_for_host("[*.]example.com", ContentSettingsType::Cookies, ContentSetting::SessionOnly)
            .unwrap();
        map.set_content_setting_for_host("file:///home/user/index.html", ContentSettingsType::Javascript, ContentSetting::Allow)
            .unwrap();
        map.set_block_third_party_cookies(true);

        let json = write_prefs(&map).unwrap();
        let restored = parse_prefs(&json).unwrap().build_store();

        for content_type in ContentSettingsType::ALL {
            assert_eq!(
                restored.default_content_setting(content_type),
                map.default_content_setting(content_type)
            );
            assert_eq!(
                restored.settings_for_one_type(content_type),
                map.settings_for_one_type(content_type)
            );
        }
        assert!(restored.block_third_party_cookies());
        assert_eq!(write_prefs(&restored).unwrap(), json);
    }

    #[test]
    fn test_document_shape() {
        let map = HostContentSettingsMap::new();
        map.set_content_setting_for_host("www.example.com", ContentSettingsType::Popups, ContentSetting::Allow)
            .unwrap();

        let document = to_document(&map);
        assert_eq!(document.default_content_settings.len(), ContentSettingsType::ALL.len());
        assert_eq!(
            document.default_content_settings["popups"],
            SettingValue::Name("block".to_string())
        );
        assert_eq!(
            document.content_settings["www.example.com"]["popups"],
            SettingValue::Name("allow".to_string())
        );
        assert_eq!(document.block_third_party_cookies, Some(false));
    }
}
