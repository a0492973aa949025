//! Settings schema migrations for the `alarm` namespace.
//!
//! Migrations are versioned and applied when the alarm manager loads its
//! configuration. The `schema_version` key tracks the current version; a
//! store without it is version 0.
//!
//! Version 0 used long key names (`wake_up_hour`, `sleep_minute`, ...).
//! Version 1 renamed them to the short keys in [`keys`].

use crate::error::StoreError;

use super::SettingsStore;

/// Namespace holding alarm configuration.
pub const ALARM_NAMESPACE: &str = "alarm";

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const ALARM_SCHEMA_VERSION: i64 = 1;

/// Current key names.
pub mod keys {
    pub const SCHEMA_VERSION: &str = "schema_version";
    pub const WAKE_HOUR: &str = "wake_hour";
    pub const WAKE_MINUTE: &str = "wake_min";
    pub const WAKE_INTENSITY: &str = "wake_intensity";
    pub const WAKE_STATE: &str = "wake_state";
    pub const WAKE_SNOOZE_UNTIL: &str = "wake_snooze_until";
    pub const SLEEP_HOUR: &str = "sleep_hour";
    pub const SLEEP_MINUTE: &str = "sleep_min";
    pub const SLEEP_STATE: &str = "sleep_state";
    pub const SLEEP_SNOOZE_UNTIL: &str = "sleep_snooze_until";
}

/// `(legacy, current)` key renames introduced by version 1.
const V1_RENAMES: [(&str, &str); 5] = [
    ("wake_up_hour", keys::WAKE_HOUR),
    ("wake_up_minute", keys::WAKE_MINUTE),
    ("wake_up_intensity", keys::WAKE_INTENSITY),
    ("wake_up_state", keys::WAKE_STATE),
    ("sleep_minute", keys::SLEEP_MINUTE),
];

/// Apply all pending migrations to the alarm namespace.
///
/// Returns the version the store was at before migrating.
///
/// # Errors
/// Returns an error if the store cannot be read or written.
pub fn migrate(store: &mut dyn SettingsStore) -> Result<i64, StoreError> {
    let current_version = get_schema_version(store)?;

    if current_version < 1 {
        migrate_v1(store)?;
    }

    Ok(current_version)
}

/// Get the current schema version. Returns 0 if no version is set.
fn get_schema_version(store: &dyn SettingsStore) -> Result<i64, StoreError> {
    Ok(store
        .get_int(ALARM_NAMESPACE, keys::SCHEMA_VERSION)?
        .unwrap_or(0))
}

/// Migration v1: move legacy long key names to the short ones.
///
/// A legacy value is copied only when the current key is missing or holds a
/// negative (unset) value; legacy keys are removed afterwards either way.
fn migrate_v1(store: &mut dyn SettingsStore) -> Result<(), StoreError> {
    for (legacy, current) in V1_RENAMES {
        let Some(old) = store.get_int(ALARM_NAMESPACE, legacy)? else {
            continue;
        };
        let keep_current = matches!(store.get_int(ALARM_NAMESPACE, current)?, Some(v) if v >= 0);
        if !keep_current {
            store.set_int(ALARM_NAMESPACE, current, old)?;
        }
        store.remove(ALARM_NAMESPACE, legacy)?;
    }

    store.set_int(ALARM_NAMESPACE, keys::SCHEMA_VERSION, 1)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn fresh_store_is_stamped() {
        let mut store = MemoryStore::new();
        assert_eq!(migrate(&mut store).unwrap(), 0);
        assert_eq!(
            store.get_int(ALARM_NAMESPACE, keys::SCHEMA_VERSION).unwrap(),
            Some(ALARM_SCHEMA_VERSION)
        );
    }

    #[test]
    fn legacy_keys_are_renamed() {
        let mut store = MemoryStore::new()
            .with(ALARM_NAMESPACE, "wake_up_hour", 6)
            .with(ALARM_NAMESPACE, "wake_up_minute", 30)
            .with(ALARM_NAMESPACE, "wake_up_intensity", 1)
            .with(ALARM_NAMESPACE, "sleep_minute", 15);

        migrate(&mut store).unwrap();

        assert_eq!(store.get_int(ALARM_NAMESPACE, keys::WAKE_HOUR).unwrap(), Some(6));
        assert_eq!(store.get_int(ALARM_NAMESPACE, keys::WAKE_MINUTE).unwrap(), Some(30));
        assert_eq!(store.get_int(ALARM_NAMESPACE, keys::WAKE_INTENSITY).unwrap(), Some(1));
        assert_eq!(store.get_int(ALARM_NAMESPACE, keys::SLEEP_MINUTE).unwrap(), Some(15));
        assert_eq!(store.get_int(ALARM_NAMESPACE, "wake_up_hour").unwrap(), None);
    }

    #[test]
    fn valid_current_key_beats_legacy() {
        let mut store = MemoryStore::new()
            .with(ALARM_NAMESPACE, keys::WAKE_HOUR, 8)
            .with(ALARM_NAMESPACE, "wake_up_hour", 6)
            .with(ALARM_NAMESPACE, keys::WAKE_MINUTE, -1)
            .with(ALARM_NAMESPACE, "wake_up_minute", 20);

        migrate(&mut store).unwrap();

        assert_eq!(store.get_int(ALARM_NAMESPACE, keys::WAKE_HOUR).unwrap(), Some(8));
        assert_eq!(store.get_int(ALARM_NAMESPACE, keys::WAKE_MINUTE).unwrap(), Some(20));
    }

    #[test]
    fn migrated_store_is_left_alone() {
        let mut store = MemoryStore::new()
            .with(ALARM_NAMESPACE, keys::SCHEMA_VERSION, 1)
            .with(ALARM_NAMESPACE, "wake_up_hour", 6);
        assert_eq!(migrate(&mut store).unwrap(), 1);
        assert_eq!(store.get_int(ALARM_NAMESPACE, keys::WAKE_HOUR).unwrap(), None);
    }
}
