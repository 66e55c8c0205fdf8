//! Persisted user settings (`{prefix}-settings`).

use std::rc::Rc;

use anyhow::Result;
use log::{info, warn};
use shared::{normalize_time_input, to_minutes, Settings, SlotStep, TimeFormat};
use thiserror::Error;

use super::observable::{Store, SubscriptionId};
use super::STORE_SCHEMA_VERSION;
use crate::storage::{KeyValueStore, Persisted};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("Некорректное время: {0}")]
    InvalidTime(String),
    #[error("Начало рабочего дня должно быть раньше конца")]
    EmptyWorkday,
    #[error("Некорректный день недели: {0}")]
    InvalidWeekday(u8),
    #[error("Не удалось сохранить настройки: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for SettingsError {
    fn from(e: anyhow::Error) -> Self {
        SettingsError::Storage(format!("{:#}", e))
    }
}

/// Parse one workday bound typed as `10:00`, `10.00`, `10-00`, `10/00` or `10`.
///
/// Out-of-range hours or minutes are rejected rather than clamped.
fn parse_bound(raw: &str) -> Result<String, SettingsError> {
    let mut value: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if matches!(c, '.' | '-' | '/') { ':' } else { c })
        .collect();
    if !value.contains(':') {
        value.push_str(":00");
    }
    match to_minutes(&value) {
        Some(_) => Ok(normalize_time_input(raw)),
        None => Err(SettingsError::InvalidTime(raw.trim().to_string())),
    }
}

#[derive(Clone)]
pub struct SettingsStore {
    state: Store<Settings>,
    persisted: Persisted<Settings>,
}

impl SettingsStore {
    pub fn new(storage: Rc<dyn KeyValueStore>, namespace: &str) -> Self {
        let persisted = Persisted::new(storage, namespace, STORE_SCHEMA_VERSION);
        let settings = persisted.load();
        Self {
            state: Store::new(settings),
            persisted,
        }
    }

    pub fn get(&self) -> Settings {
        self.state.get()
    }

    /// Apply a change and persist it. The in-memory value changes even when
    /// persisting fails.
    pub fn update(&self, f: impl FnOnce(&mut Settings)) -> Result<()> {
        let next = self.state.update(|settings| {
            f(settings);
            settings.clone()
        });
        if let Err(e) = self.persisted.save(&next) {
            warn!("Settings changed but not persisted: {:#}", e);
            return Err(e);
        }
        Ok(())
    }

    /// Set workday bounds; both must be valid times with `start < end`
    pub fn set_workday(&self, start: &str, end: &str) -> Result<(), SettingsError> {
        let start = parse_bound(start)?;
        let end = parse_bound(end)?;
        if to_minutes(&start) >= to_minutes(&end) {
            return Err(SettingsError::EmptyWorkday);
        }

        info!("Workday set to {}-{}", start, end);
        self.update(|s| {
            s.workday_start = start;
            s.workday_end = end;
        })?;
        Ok(())
    }

    pub fn set_slot_step(&self, step: SlotStep) -> Result<(), SettingsError> {
        self.update(|s| s.slot_step = step)?;
        Ok(())
    }

    pub fn set_time_format(&self, format: TimeFormat) -> Result<(), SettingsError> {
        self.update(|s| s.time_format = format)?;
        Ok(())
    }

    /// Flip a weekday (Monday = 0) in or out of the weekend set
    pub fn toggle_weekend(&self, weekday: u8) -> Result<(), SettingsError> {
        if weekday > 6 {
            return Err(SettingsError::InvalidWeekday(weekday));
        }
        self.update(|s| {
            if !s.weekend_days.remove(&weekday) {
                s.weekend_days.insert(weekday);
            }
        })?;
        Ok(())
    }

    pub fn reset(&self) -> Result<(), SettingsError> {
        self.update(|s| *s = Settings::default())?;
        Ok(())
    }

    pub fn subscribe(&self, listener: impl Fn(&Settings) + 'static) -> SubscriptionId {
        self.state.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn storage() -> Rc<dyn KeyValueStore> {
        Rc::new(MemoryStore::new())
    }

    #[test]
    fn test_defaults_when_nothing_stored() {
        let store = SettingsStore::new(storage(), "manik-settings");
        assert_eq!(store.get(), Settings::default());
    }

    #[test]
    fn test_changes_persist_across_instances() {
        let backing = storage();
        let store = SettingsStore::new(backing.clone(), "manik-settings");

        store.set_workday("9", "18.30").unwrap();
        store.set_slot_step(SlotStep::Fifteen).unwrap();
        store.set_time_format(TimeFormat::H12).unwrap();
        store.toggle_weekend(5).unwrap();
        store.toggle_weekend(6).unwrap();

        let reloaded = SettingsStore::new(backing, "manik-settings").get();
        assert_eq!(reloaded.workday_start, "09:00");
        assert_eq!(reloaded.workday_end, "18:30");
        assert_eq!(reloaded.slot_step, SlotStep::Fifteen);
        assert_eq!(reloaded.time_format, TimeFormat::H12);
        assert!(reloaded.is_weekend(5));
        assert!(!reloaded.is_weekend(6));
    }

    #[test]
    fn test_invalid_workday_rejected() {
        let store = SettingsStore::new(storage(), "manik-settings");
        assert_eq!(store.set_workday("18:00", "09:00"), Err(SettingsError::EmptyWorkday));
        assert!(matches!(store.set_workday("abc", "09:00"), Err(SettingsError::InvalidTime(_))));
        assert_eq!(store.get().workday_start, "10:00");
        assert_eq!(store.toggle_weekend(7), Err(SettingsError::InvalidWeekday(7)));
    }

    #[test]
    fn test_out_of_range_workday_rejected() {
        let store = SettingsStore::new(storage(), "manik-settings");
        assert_eq!(
            store.set_workday("09:00", "25:00"),
            Err(SettingsError::InvalidTime("25:00".to_string()))
        );
        assert_eq!(
            store.set_workday("9.75", "18"),
            Err(SettingsError::InvalidTime("9.75".to_string()))
        );
        assert_eq!(store.get().workday_end, "20:00");

        store.set_workday("9", "23").unwrap();
        assert_eq!(store.get().workday_end, "23:00");
    }

    /// Storage that refuses every write, like a full `localStorage`
    struct FullStore;

    impl KeyValueStore for FullStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(anyhow::anyhow!("QuotaExceededError"))
        }

        fn remove(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failures_are_reported() {
        let store = SettingsStore::new(Rc::new(FullStore), "manik-settings");

        let storage_error = |result: Result<(), SettingsError>| {
            matches!(result, Err(SettingsError::Storage(message)) if message.contains("QuotaExceededError"))
        };
        assert!(storage_error(store.set_workday("09:00", "18:00")));
        assert!(storage_error(store.set_slot_step(SlotStep::Sixty)));
        assert!(storage_error(store.set_time_format(TimeFormat::H12)));
        assert!(storage_error(store.toggle_weekend(5)));
        assert!(storage_error(store.reset()));
    }

    #[test]
    fn test_subscribers_see_updates() {
        let store = SettingsStore::new(storage(), "manik-settings");
        let seen = Rc::new(std::cell::Cell::new(0u32));
        let seen_clone = seen.clone();
        store.subscribe(move |s| seen_clone.set(s.slot_step.minutes()));

        store.set_slot_step(SlotStep::Sixty).unwrap();
        assert_eq!(seen.get(), 60);

        store.reset().unwrap();
        assert_eq!(seen.get(), 30);
    }
}
