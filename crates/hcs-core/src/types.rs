//! Core type definitions for host content settings
//!
//! Content types, setting values and the static per-type table of
//! preference names and built-in defaults.

use std::fmt;

// =============================================================================
// Content Setting Values
// =============================================================================

/// Value of a content setting, either as a global default or a per-host override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum ContentSetting {
    /// Defer to the global default for the content type
    #[default]
    Default = 0,
    Allow = 1,
    Block = 2,
    /// Prompt the user
    Ask = 3,
    /// Allow for the current session only (cookies)
    SessionOnly = 4,
}

impl ContentSetting {
    /// All values, in code order.
    pub const ALL: [ContentSetting; 5] = [
        Self::Default,
        Self::Allow,
        Self::Block,
        Self::Ask,
        Self::SessionOnly,
    ];

    /// Preference name of this value.
    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Allow => "allow",
            Self::Block => "block",
            Self::Ask => "ask",
            Self::SessionOnly => "session_only",
        }
    }

    /// Parse from a preference name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.name() == name)
    }
}

impl TryFrom<u8> for ContentSetting {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Default),
            1 => Ok(Self::Allow),
            2 => Ok(Self::Block),
            3 => Ok(Self::Ask),
            4 => Ok(Self::SessionOnly),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ContentSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Content Types
// =============================================================================

/// Number of content types.
pub const NUM_TYPES: usize = 7;

/// Kind of content permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ContentSettingsType {
    Cookies = 0,
    Images = 1,
    Javascript = 2,
    Plugins = 3,
    Popups = 4,
    Geolocation = 5,
    Notifications = 6,
}

/// Per-type preference name and built-in default.
struct TypeInfo {
    name: &'static str,
    default: ContentSetting,
}

/// Indexed by `ContentSettingsType as usize`. Never holds `ContentSetting::Default`.
static TYPE_TABLE: [TypeInfo; NUM_TYPES] = [
    TypeInfo { name: "cookies", default: ContentSetting::Allow },
    TypeInfo { name: "images", default: ContentSetting::Allow },
    TypeInfo { name: "javascript", default: ContentSetting::Allow },
    TypeInfo { name: "plugins", default: ContentSetting::Allow },
    TypeInfo { name: "popups", default: ContentSetting::Block },
    TypeInfo { name: "geolocation", default: ContentSetting::Ask },
    TypeInfo { name: "notifications", default: ContentSetting::Ask },
];

impl ContentSettingsType {
    /// All content types, in index order.
    pub const ALL: [ContentSettingsType; NUM_TYPES] = [
        Self::Cookies,
        Self::Images,
        Self::Javascript,
        Self::Plugins,
        Self::Popups,
        Self::Geolocation,
        Self::Notifications,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Preference name, e.g. `"cookies"`.
    pub fn name(self) -> &'static str {
        TYPE_TABLE[self.index()].name
    }

    /// Parse from a preference name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    /// Built-in default setting for this type.
    pub fn builtin_default(self) -> ContentSetting {
        TYPE_TABLE[self.index()].default
    }

    /// Whether `setting` is a meaningful value for this type.
    ///
    /// `SessionOnly` only applies to cookies, `Ask` only to types that can
    /// prompt. `Default` is accepted here; callers that need an explicit value
    /// reject it themselves.
    pub fn supports(self, setting: ContentSetting) -> bool {
        match setting {
            ContentSetting::Default | ContentSetting::Allow | ContentSetting::Block => true,
            ContentSetting::SessionOnly => self == Self::Cookies,
            ContentSetting::Ask => matches!(
                self,
                Self::Plugins | Self::Geolocation | Self::Notifications
            ),
        }
    }
}

impl TryFrom<u8> for ContentSettingsType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL.get(value as usize).copied().ok_or(())
    }
}

impl fmt::Display for ContentSettingsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Content Settings Record
// =============================================================================

/// One setting per content type.
///
/// Used as the per-host override record (where `Default` means "no override")
/// and as the resolved snapshot returned to readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContentSettings {
    settings: [ContentSetting; NUM_TYPES],
}

impl ContentSettings {
    /// Record with every entry set to `Default`.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in defaults for every type.
    pub fn builtin_defaults() -> Self {
        let mut settings = [ContentSetting::Default; NUM_TYPES];
        for t in ContentSettingsType::ALL {
            settings[t.index()] = t.builtin_default();
        }
        Self { settings }
    }

    #[inline]
    pub fn get(&self, content_type: ContentSettingsType) -> ContentSetting {
        self.settings[content_type.index()]
    }

    #[inline]
    pub fn set(&mut self, content_type: ContentSettingsType, setting: ContentSetting) {
        self.settings[content_type.index()] = setting;
    }

    /// True if every entry is `Default`.
    pub fn is_all_default(&self) -> bool {
        self.settings.iter().all(|&s| s == ContentSetting::Default)
    }

    /// Iterate `(type, setting)` pairs in type order.
    pub fn iter(&self) -> impl Iterator<Item = (ContentSettingsType, ContentSetting)> + '_ {
        ContentSettingsType::ALL
            .iter()
            .map(move |&t| (t, self.settings[t.index()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_defaults_are_explicit() {
        for t in ContentSettingsType::ALL {
            assert_ne!(t.builtin_default(), ContentSetting::Default, "{t}");
            assert!(t.supports(t.builtin_default()));
        }
        assert_eq!(ContentSettingsType::Popups.builtin_default(), ContentSetting::Block);
        assert_eq!(ContentSettingsType::Geolocation.builtin_default(), ContentSetting::Ask);
    }

    #[test]
    fn test_type_names() {
        for t in ContentSettingsType::ALL {
            assert_eq!(ContentSettingsType::from_name(t.name()), Some(t));
            assert_eq!(ContentSettingsType::try_from(t as u8), Ok(t));
        }
        assert_eq!(ContentSettingsType::from_name("cookie"), None);
        assert_eq!(ContentSettingsType::try_from(7), Err(()));
    }

    #[test]
    fn test_setting_codes() {
        assert_eq!(ContentSetting::try_from(4), Ok(ContentSetting::SessionOnly));
        assert_eq!(ContentSetting::try_from(5), Err(()));
        assert_eq!(ContentSetting::from_name("session_only"), Some(ContentSetting::SessionOnly));
        assert_eq!(ContentSetting::Block.to_string(), "block");
    }

    #[test]
    fn test_supports() {
        assert!(ContentSettingsType::Cookies.supports(ContentSetting::SessionOnly));
        assert!(!ContentSettingsType::Images.supports(ContentSetting::SessionOnly));
        assert!(ContentSettingsType::Plugins.supports(ContentSetting::Ask));
        assert!(!ContentSettingsType::Popups.supports(ContentSetting::Ask));
    }

    #[test]
    fn test_record_all_default() {
        let mut record = ContentSettings::new();
        assert!(record.is_all_default());
        record.set(ContentSettingsType::Images, ContentSetting::Block);
        assert!(!record.is_all_default());
        assert_eq!(record.get(ContentSettingsType::Images), ContentSetting::Block);
        record.set(ContentSettingsType::Images, ContentSetting::Default);
        assert!(record.is_all_default());
    }
}
