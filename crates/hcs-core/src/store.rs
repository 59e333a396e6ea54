//! Host content settings store
//!
//! Maps patterns to per-type overrides on top of one global default per type.
//! Written on a single controlling thread, read on any thread. One instance
//! per profile; share it with `Arc`.
//!
//! Every mutator follows the same shape: take the write lock, mutate, release
//! the lock, then notify observers. Observers usually call back into the read
//! accessors, so the lock must never be held across a notification.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::thread::{self, ThreadId};

use crate::pattern::{ContentSettingsPattern, PatternError};
use crate::types::{ContentSetting, ContentSettings, ContentSettingsType};
use crate::url::HostQuery;

// =============================================================================
// Notifications
// =============================================================================

/// Details of a change notification.
///
/// Sent when settings change for at least one host. Changes touching many
/// hosts at once (defaults, clears, batch loads) send a single notification
/// with an empty host instead of one per host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSettingsDetails {
    host: String,
    content_type: Option<ContentSettingsType>,
}

impl ContentSettingsDetails {
    /// Change affecting one pattern.
    pub fn for_pattern(
        pattern: &ContentSettingsPattern,
        content_type: Option<ContentSettingsType>,
    ) -> Self {
        Self {
            host: pattern.to_string(),
            content_type,
        }
    }

    /// Change affecting an unbounded set of hosts.
    pub fn all_hosts(content_type: Option<ContentSettingsType>) -> Self {
        Self {
            host: String::new(),
            content_type,
        }
    }

    /// Canonical pattern whose settings changed. Empty if many hosts are affected.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn is_all_hosts(&self) -> bool {
        self.host.is_empty()
    }

    /// The changed type, or `None` if several types changed.
    pub fn content_type(&self) -> Option<ContentSettingsType> {
        self.content_type
    }
}

/// Receives change notifications on the controlling thread.
///
/// Implementations may call any read accessor of the store.
pub trait ContentSettingsObserver: Send + Sync {
    fn on_content_settings_changed(&self, details: &ContentSettingsDetails);
}

/// Handle returned by [`HostContentSettingsMap::add_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

// =============================================================================
// Store
// =============================================================================

/// One override to apply in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingRecord {
    pub pattern: ContentSettingsPattern,
    pub content_type: ContentSettingsType,
    pub setting: ContentSetting,
}

/// All overrides of one type, sorted by canonical pattern string.
pub type SettingsForOneType = Vec<(ContentSettingsPattern, ContentSetting)>;

#[derive(Debug)]
struct State {
    /// Never holds `ContentSetting::Default`
    defaults: ContentSettings,
    /// Never holds an all-default record
    hosts: BTreeMap<ContentSettingsPattern, ContentSettings>,
    block_third_party_cookies: bool,
}

impl State {
    /// Set one override, pruning the record if it becomes all-default.
    /// Returns whether anything changed.
    fn set_override(
        &mut self,
        pattern: &ContentSettingsPattern,
        content_type: ContentSettingsType,
        setting: ContentSetting,
    ) -> bool {
        let prune = match self.hosts.get_mut(pattern) {
            Some(record) => {
                if record.get(content_type) == setting {
                    return false;
                }
                record.set(content_type, setting);
                record.is_all_default()
            }
            None => {
                if setting == ContentSetting::Default {
                    return false;
                }
                let mut record = ContentSettings::new();
                record.set(content_type, setting);
                self.hosts.insert(pattern.clone(), record);
                false
            }
        };

        if prune {
            self.hosts.remove(pattern);
        }
        true
    }

    /// Resolve every type for a query: the most specific matching record
    /// with a non-default entry wins, otherwise the global default.
    fn resolve(&self, query: &HostQuery) -> ContentSettings {
        let mut matching: Vec<(&ContentSettingsPattern, &ContentSettings)> = self
            .hosts
            .iter()
            .filter(|(pattern, _)| pattern.matches(query))
            .collect();
        matching.sort_by(|a, b| (b.0.specificity(), b.0).cmp(&(a.0.specificity(), a.0)));

        let mut resolved = self.defaults;
        for content_type in ContentSettingsType::ALL {
            let winner = matching
                .iter()
                .map(|(_, record)| record.get(content_type))
                .find(|&setting| setting != ContentSetting::Default);
            if let Some(setting) = winner {
                resolved.set(content_type, setting);
            }
        }
        resolved
    }
}

/// Thread-safe map from patterns to content settings.
pub struct HostContentSettingsMap {
    state: RwLock<State>,
    observers: Mutex<Vec<(ObserverId, Weak<dyn ContentSettingsObserver>)>>,
    next_observer_id: AtomicU64,
    controlling_thread: ThreadId,
}

impl HostContentSettingsMap {
    /// Create a store with the built-in defaults, controlled by the calling thread.
    pub fn new() -> Self {
        Self::with_defaults(ContentSettings::builtin_defaults())
    }

    /// Create a store with the given defaults.
    ///
    /// Entries that are `Default` or unsupported for their type fall back to
    /// the built-in default, so every type always has an explicit default.
    pub fn with_defaults(defaults: ContentSettings) -> Self {
        let mut explicit = defaults;
        for content_type in ContentSettingsType::ALL {
            let setting = defaults.get(content_type);
            if setting == ContentSetting::Default || !content_type.supports(setting) {
                explicit.set(content_type, content_type.builtin_default());
            }
        }

        Self {
            state: RwLock::new(State {
                defaults: explicit,
                hosts: BTreeMap::new(),
                block_third_party_cookies: false,
            }),
            observers: Mutex::new(Vec::new()),
            next_observer_id: AtomicU64::new(0),
            controlling_thread: thread::current().id(),
        }
    }

    /// Make the calling thread the controlling thread.
    ///
    /// For owners that build the store on one thread and run it on another.
    pub fn bind_to_current_thread(&mut self) {
        self.controlling_thread = thread::current().id();
    }

    // -------------------------------------------------------------------------
    // Readers (any thread)
    // -------------------------------------------------------------------------

    /// Returns the default setting for a content type.
    pub fn default_content_setting(&self, content_type: ContentSettingsType) -> ContentSetting {
        self.read_state().defaults.get(content_type)
    }

    /// Returns the setting that applies to a host or URL for one content type.
    pub fn content_setting(&self, host: &str, content_type: ContentSettingsType) -> ContentSetting {
        self.content_settings(host).get(content_type)
    }

    /// Returns all settings that apply to a host or URL, as a snapshot.
    pub fn content_settings(&self, host: &str) -> ContentSettings {
        let query = HostQuery::parse(host);
        self.read_state().resolve(&query)
    }

    /// For a content type, returns every pattern with a non-default setting,
    /// in lexicographical order of the canonical pattern string.
    pub fn settings_for_one_type(&self, content_type: ContentSettingsType) -> SettingsForOneType {
        let mut settings: SettingsForOneType = {
            let state = self.read_state();
            let settings = state
                .hosts
                .iter()
                .map(|(pattern, record)| (pattern, record.get(content_type)))
                .filter(|(_, setting)| *setting != ContentSetting::Default)
                .map(|(pattern, setting)| (pattern.clone(), setting))
                .collect();
            settings
        };
        settings.sort_by_cached_key(|(pattern, _)| pattern.to_string());
        settings
    }

    /// This setting trumps any host-specific settings.
    pub fn block_third_party_cookies(&self) -> bool {
        self.read_state().block_third_party_cookies
    }

    /// Number of patterns with at least one override.
    pub fn pattern_count(&self) -> usize {
        self.read_state().hosts.len()
    }

    // -------------------------------------------------------------------------
    // Mutators (controlling thread only)
    // -------------------------------------------------------------------------

    /// Sets the default setting for a content type.
    ///
    /// `Default` and values the type does not support are rejected.
    pub fn set_default_content_setting(
        &self,
        content_type: ContentSettingsType,
        setting: ContentSetting,
    ) {
        if !self.on_controlling_thread() {
            return;
        }
        if !check_setting(
            content_type,
            setting,
            setting != ContentSetting::Default,
        ) {
            return;
        }

        let changed = {
            let mut state = self.write_state();
            let changed = state.defaults.get(content_type) != setting;
            state.defaults.set(content_type, setting);
            changed
        };

        if changed {
            log::debug!("default {content_type} setting is now {setting}");
            self.notify(ContentSettingsDetails::all_hosts(Some(content_type)));
        }
    }

    /// Sets the setting for a pattern and content type. `Default` removes the
    /// override, so the type's default applies to hosts matching `pattern`.
    pub fn set_content_setting(
        &self,
        pattern: &ContentSettingsPattern,
        content_type: ContentSettingsType,
        setting: ContentSetting,
    ) {
        if !self.on_controlling_thread() {
            return;
        }
        if !check_setting(content_type, setting, true) {
            return;
        }

        let changed = self.write_state().set_override(pattern, content_type, setting);

        if changed {
            log::debug!("{content_type} setting for {pattern} is now {setting}");
            self.notify(ContentSettingsDetails::for_pattern(pattern, Some(content_type)));
        }
    }

    /// Like [`set_content_setting`](Self::set_content_setting), parsing a
    /// canonical pattern or bare host first.
    pub fn set_content_setting_for_host(
        &self,
        host: &str,
        content_type: ContentSettingsType,
        setting: ContentSetting,
    ) -> Result<(), PatternError> {
        let pattern: ContentSettingsPattern = host.parse()?;
        self.set_content_setting(&pattern, content_type, setting);
        Ok(())
    }

    /// Applies many overrides atomically with a single notification.
    ///
    /// Records with a value unsupported by their type are skipped.
    /// Returns the number of records that changed the store.
    pub fn apply<I>(&self, records: I) -> usize
    where
        I: IntoIterator<Item = SettingRecord>,
    {
        if !self.on_controlling_thread() {
            return 0;
        }

        let changed = {
            let mut state = self.write_state();
            let mut changed = 0;
            for record in records {
                if !record.content_type.supports(record.setting) {
                    log::warn!(
                        "skipping {} setting {} for {}: unsupported value",
                        record.content_type,
                        record.setting,
                        record.pattern
                    );
                    continue;
                }
                if state.set_override(&record.pattern, record.content_type, record.setting) {
                    changed += 1;
                }
            }
            changed
        };

        if changed > 0 {
            log::debug!("applied {changed} content setting overrides");
            self.notify(ContentSettingsDetails::all_hosts(None));
        }
        changed
    }

    /// Clears all host-specific settings for one content type.
    pub fn clear_settings_for_one_type(&self, content_type: ContentSettingsType) {
        if !self.on_controlling_thread() {
            return;
        }

        let changed = {
            let mut state = self.write_state();
            let mut changed = false;
            for record in state.hosts.values_mut() {
                if record.get(content_type) != ContentSetting::Default {
                    record.set(content_type, ContentSetting::Default);
                    changed = true;
                }
            }
            state.hosts.retain(|_, record| !record.is_all_default());
            changed
        };

        if changed {
            log::debug!("cleared {content_type} overrides");
            self.notify(ContentSettingsDetails::all_hosts(Some(content_type)));
        }
    }

    /// Sets whether all third-party cookies are blocked.
    pub fn set_block_third_party_cookies(&self, block: bool) {
        if !self.on_controlling_thread() {
            return;
        }

        let changed = {
            let mut state = self.write_state();
            let changed = state.block_third_party_cookies != block;
            state.block_third_party_cookies = block;
            changed
        };

        if changed {
            log::debug!("block third-party cookies: {block}");
            self.notify(ContentSettingsDetails::all_hosts(Some(ContentSettingsType::Cookies)));
        }
    }

    /// Resets defaults, overrides and the third-party cookie flag.
    pub fn reset_to_defaults(&self) {
        if !self.on_controlling_thread() {
            return;
        }

        {
            let mut state = self.write_state();
            state.defaults = ContentSettings::builtin_defaults();
            state.hosts.clear();
            state.block_third_party_cookies = false;
        }

        log::debug!("content settings reset to defaults");
        self.notify(ContentSettingsDetails::all_hosts(None));
    }

    // -------------------------------------------------------------------------
    // Observers
    // -------------------------------------------------------------------------

    /// Registers an observer. The store only keeps a weak reference; an
    /// observer that has been dropped is forgotten on the next notification.
    pub fn add_observer<O>(&self, observer: &Arc<O>) -> ObserverId
    where
        O: ContentSettingsObserver + 'static,
    {
        let id = ObserverId(self.next_observer_id.fetch_add(1, Ordering::Relaxed));
        let weak = Arc::downgrade(observer);
        let weak: Weak<dyn ContentSettingsObserver> = weak;
        self.lock_observers().push((id, weak));
        id
    }

    pub fn remove_observer(&self, id: ObserverId) {
        self.lock_observers().retain(|(observer_id, _)| *observer_id != id);
    }

    /// Must not be called with `state` locked.
    fn notify(&self, details: ContentSettingsDetails) {
        let observers: Vec<Arc<dyn ContentSettingsObserver>> = {
            let mut list = self.lock_observers();
            list.retain(|(_, weak)| weak.strong_count() > 0);
            list.iter().filter_map(|(_, weak)| weak.upgrade()).collect()
        };

        for observer in observers {
            observer.on_content_settings_changed(&details);
        }
    }

    // -------------------------------------------------------------------------
    // Locking and contracts
    // -------------------------------------------------------------------------

    fn read_state(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_observers(&self) -> MutexGuard<'_, Vec<(ObserverId, Weak<dyn ContentSettingsObserver>)>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Panics in debug builds when called off the controlling thread; in
    /// release builds logs and reports `false` so the mutator does nothing.
    fn on_controlling_thread(&self) -> bool {
        let current = thread::current().id();
        debug_assert_eq!(
            current, self.controlling_thread,
            "content settings may only be changed on the controlling thread"
        );
        if current != self.controlling_thread {
            log::error!("ignoring content settings change off the controlling thread");
            return false;
        }
        true
    }
}

impl Default for HostContentSettingsMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Contract check for setting values. Panics in debug builds on violation.
fn check_setting(content_type: ContentSettingsType, setting: ContentSetting, explicit_ok: bool) -> bool {
    let valid = explicit_ok && content_type.supports(setting);
    debug_assert!(valid, "{setting} is not a valid {content_type} setting here");
    if !valid {
        log::error!("ignoring invalid {content_type} setting {setting}");
    }
    valid
}
