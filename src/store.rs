//! The alarm collection and the lock that guards it.

use std::{
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use serde::{Deserialize, Serialize};

use crate::{
    alarm::Alarm,
    error::{PersistError, StoreError},
};

/// Alarms in insertion order.
///
/// Indices are positions, not identifiers: removing an alarm shifts every
/// later alarm down by one. Use [`Alarm::id`] to find an alarm again after
/// the store may have changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmStore {
    #[serde(default)]
    alarms: Vec<Alarm>,
}

impl AlarmStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `alarm` and returns its index.
    pub fn add(&mut self, alarm: Alarm) -> usize {
        self.alarms.push(alarm);
        self.alarms.len() - 1
    }

    /// # Errors
    /// [`StoreError::NotFound`] when `index` is past the end.
    pub fn get(&self, index: usize) -> Result<&Alarm, StoreError> {
        self.alarms.get(index).ok_or_else(|| self.not_found(index))
    }

    /// Changes the alarm at `index` in place.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] when `index` is past the end.
    pub fn update<T>(
        &mut self,
        index: usize,
        mutator: impl FnOnce(&mut Alarm) -> T,
    ) -> Result<T, StoreError> {
        let not_found = self.not_found(index);
        self.alarms.get_mut(index).map(mutator).ok_or(not_found)
    }

    /// # Errors
    /// [`StoreError::NotFound`] when `index` is past the end.
    pub fn remove(&mut self, index: usize) -> Result<Alarm, StoreError> {
        if index < self.alarms.len() {
            Ok(self.alarms.remove(index))
        } else {
            Err(self.not_found(index))
        }
    }

    pub fn all(&self) -> impl Iterator<Item = (usize, &Alarm)> {
        self.alarms.iter().enumerate()
    }

    pub(crate) fn all_mut(&mut self) -> impl Iterator<Item = (usize, &mut Alarm)> {
        self.alarms.iter_mut().enumerate()
    }

    #[must_use]
    pub fn position_of(&self, id: u64) -> Option<usize> {
        self.alarms.iter().position(|alarm| alarm.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }

    fn not_found(&self, index: usize) -> StoreError {
        StoreError::NotFound {
            index,
            len: self.alarms.len(),
        }
    }

    /// Reads the alarms file. A missing or unreadable file is treated as
    /// "no alarms yet".
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(store) => {
                log::info!("loaded {} alarms from {}", store.len(), path.display());
                store
            }
            Err(PersistError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                log::info!("no alarms file at {}, starting empty", path.display());
                Self::new()
            }
            Err(e) => {
                log::warn!("{e}, starting with no alarms");
                Self::new()
            }
        }
    }

    /// # Errors
    /// Fails when the file can't be read or isn't a valid alarms file.
    pub fn try_load(path: &Path) -> Result<Self, PersistError> {
        let text = std::fs::read_to_string(path).map_err(|source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| PersistError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes every alarm to `path`, creating parent directories.
    ///
    /// # Errors
    /// Fails on serialization or filesystem errors.
    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        let text = toml::to_string(self)?;
        let io_err = |source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, text).map_err(io_err)?;
        log::info!("saved {} alarms to {}", self.len(), path.display());
        Ok(())
    }
}

/// The store shared between the menu and the monitor.
///
/// Every method takes the lock for just that one operation, so a caller
/// never holds it across a prompt.
#[derive(Debug, Clone, Default)]
pub struct SharedStore(Arc<Mutex<AlarmStore>>);

impl SharedStore {
    #[must_use]
    pub fn new(store: AlarmStore) -> Self {
        Self(Arc::new(Mutex::new(store)))
    }

    /// Locks the store. A panic on another thread doesn't make the alarms
    /// unusable, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, AlarmStore> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add(&self, alarm: Alarm) -> usize {
        self.lock().add(alarm)
    }

    /// # Errors
    /// [`StoreError::NotFound`] when `index` is past the end.
    pub fn get(&self, index: usize) -> Result<Alarm, StoreError> {
        self.lock().get(index).cloned()
    }

    /// # Errors
    /// [`StoreError::NotFound`] when `index` is past the end.
    pub fn update<T>(
        &self,
        index: usize,
        mutator: impl FnOnce(&mut Alarm) -> T,
    ) -> Result<T, StoreError> {
        self.lock().update(index, mutator)
    }

    /// # Errors
    /// [`StoreError::NotFound`] when `index` is past the end.
    pub fn remove(&self, index: usize) -> Result<Alarm, StoreError> {
        self.lock().remove(index)
    }

    /// A consistent copy of the whole store.
    #[must_use]
    pub fn snapshot(&self) -> AlarmStore {
        self.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{
        alarm::{Repeat, Status},
        time_codec::TimeOfDay,
    };

    fn alarm(hour: u32, message: &str) -> Alarm {
        Alarm::new(TimeOfDay::new(hour, 0).unwrap(), message, Repeat::Daily)
    }

    fn messages(store: &AlarmStore) -> Vec<&str> {
        store.all().map(|(_, a)| a.message.as_str()).collect()
    }

    #[test]
    fn add_returns_positions() {
        let mut store = AlarmStore::new();
        assert_eq!(store.add(alarm(7, "a")), 0);
        assert_eq!(store.add(alarm(8, "b")), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1).unwrap().message, "b");
        assert_eq!(
            store.get(2),
            Err(StoreError::NotFound { index: 2, len: 2 })
        );
    }

    #[test]
    fn remove_shifts_later_alarms_down() {
        let mut store = AlarmStore::new();
        store.add(alarm(7, "a"));
        store.add(alarm(8, "b"));
        let c = alarm(9, "c");
        let c_id = c.id;
        store.add(c);

        assert_eq!(store.remove(1).unwrap().message, "b");
        assert_eq!(messages(&store), ["a", "c"]);
        assert_eq!(store.get(1).unwrap().id, c_id);
        assert_eq!(store.position_of(c_id), Some(1));
        assert!(store.remove(2).is_err());
    }

    #[test]
    fn update_in_place() {
        let mut store = AlarmStore::new();
        store.add(alarm(7, "a"));
        store
            .update(0, |a| a.status = Status::Inactive)
            .unwrap();
        assert_eq!(store.get(0).unwrap().status, Status::Inactive);
        assert_eq!(
            store.update(3, |_| ()),
            Err(StoreError::NotFound { index: 3, len: 1 })
        );
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("alarms.toml");
        let mut store = AlarmStore::new();
        store.add(alarm(7, "a"));
        store.add(Alarm::new(
            TimeOfDay::new(9, 0).unwrap(),
            "b",
            Repeat::IntervalMinutes(15),
        ));
        store.save(&path).unwrap();

        let loaded = AlarmStore::load(&path);
        assert_eq!(messages(&loaded), ["a", "b"]);
        assert_eq!(loaded.get(1).unwrap().repeat, Repeat::IntervalMinutes(15));
    }

    #[test]
    fn missing_or_corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(AlarmStore::load(&missing).is_empty());

        let corrupt = dir.path().join("corrupt.toml");
        std::fs::write(&corrupt, "[[alarms]]\ntime = \"25:99\"\nmessage = 3").unwrap();
        assert!(AlarmStore::load(&corrupt).is_empty());
        assert!(matches!(
            AlarmStore::try_load(&corrupt),
            Err(PersistError::Decode { .. })
        ));
    }

    #[test]
    fn shared_store_hands_out_copies() {
        let shared = SharedStore::new(AlarmStore::new());
        let other = shared.clone();
        shared.add(alarm(7, "a"));
        let mut copy = other.get(0).unwrap();
        copy.message = "changed".to_string();
        assert_eq!(shared.get(0).unwrap().message, "a");
        assert_eq!(other.len(), 1);
    }
}
