// src/store.rs
use crate::codec::{leading_id, Record};
use crate::error::{StoreError, StoreResult};
use log;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Flat-file store for one record kind.
///
/// Every call reads or rewrites the whole file. Nothing is cached between
/// calls and nothing is locked, so callers must serialize their own
/// load, mutate, save sequences.
#[derive(Debug, Clone)]
pub struct RecordStore<R> {
    path: PathBuf,
    _kind: PhantomData<R>,
}

impl<R: Record> RecordStore<R> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        RecordStore {
            path: path.into(),
            _kind: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the file contents, or `None` if the file does not exist yet.
    fn read_contents(&self) -> StoreResult<Option<String>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("{} file {:?} does not exist, treating as empty", R::KIND, self.path);
                Ok(None)
            }
            Err(e) => {
                log::error!("Failed to read {} file {:?}: {}", R::KIND, self.path, e);
                Err(StoreError::io(&self.path, e))
            }
        }
    }

    /// Loads every decodable record in file order. Blank and malformed lines are skipped.
    pub fn load_all(&self) -> StoreResult<Vec<R>> {
        let Some(contents) = self.read_contents()? else {
            return Ok(Vec::new());
        };

        let mut records = Vec::new();
        for (index, line) in non_blank_lines(&contents) {
            match R::decode(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    log::debug!("Skipping {} line {} in {:?}: {}", R::KIND, index + 1, self.path, e);
                }
            }
        }
        log::debug!("Loaded {} {} record(s) from {:?}", records.len(), R::KIND, self.path);
        Ok(records)
    }

    /// Rewrites the file with `records`.
    ///
    /// When ids repeat, the first record in input order is kept and later ones
    /// are dropped. Surviving records are written sorted by ascending id.
    pub fn save_all(&self, records: &[R]) -> StoreResult<()> {
        let mut seen = HashSet::new();
        let mut unique: Vec<&R> = records.iter().filter(|r| seen.insert(r.id())).collect();
        if unique.len() < records.len() {
            log::debug!(
                "Dropped {} duplicate {} id(s) while saving",
                records.len() - unique.len(),
                R::KIND
            );
        }
        // Stable sort; ids are unique at this point anyway.
        unique.sort_by_key(|r| r.id());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                log::error!("Failed to create directory {:?}: {}", parent, e);
                StoreError::io(parent, e)
            })?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| {
                log::error!("Failed to open {:?} for writing: {}", self.path, e);
                StoreError::io(&self.path, e)
            })?;

        let mut writer = BufWriter::new(file);
        for record in &unique {
            writeln!(writer, "{}", record.encode()).map_err(|e| StoreError::io(&self.path, e))?;
        }
        writer.flush().map_err(|e| {
            log::error!("Failed to flush {:?}: {}", self.path, e);
            StoreError::io(&self.path, e)
        })?;

        log::info!("Saved {} {} record(s) to {:?}", unique.len(), R::KIND, self.path);
        Ok(())
    }

    /// One past the largest id currently in the file, or 1 if there is none.
    ///
    /// Reads the file itself, so records appended in memory but not yet saved
    /// are not taken into account. Fails if the largest id is `i64::MAX`.
    pub fn next_id(&self) -> StoreResult<i64> {
        let max = self
            .read_contents()?
            .as_deref()
            .and_then(|contents| {
                non_blank_lines(contents)
                    .filter_map(|(_, line)| leading_id(line))
                    .max()
            });
        match max {
            None => Ok(1),
            Some(max) => max.checked_add(1).ok_or_else(|| {
                log::error!("{} ids exhausted in {:?}", R::KIND, self.path);
                StoreError::IdsExhausted { path: self.path.clone(), max }
            }),
        }
    }
}

fn non_blank_lines(contents: &str) -> impl Iterator<Item = (usize, &str)> {
    contents
        .lines()
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .enumerate()
        .filter(|(_, line)| !line.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Customer, Discount, HistoryEntry, HistoryStatus, ServiceItem, Vehicle};
    use tempfile::tempdir;

    fn customer(id: i64, name: &str) -> Customer {
        Customer {
            id,
            name: name.to_string(),
            phone: format!("555-000{}", id),
            email: format!("{}@example.com", name.to_lowercase()),
        }
    }

    fn history(history_id: i64, service_ids: Vec<i64>) -> HistoryEntry {
        HistoryEntry {
            history_id,
            customer_id: 1,
            vehicle_id: 1,
            service_ids,
            date_time: "2024-05-06 07:08:09".to_string(),
            subtotal: 1700.0,
            discount_id: -1,
            discount_percent: 0.0,
            total: 1700.0,
            status: HistoryStatus::Pending,
        }
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store: RecordStore<Customer> = RecordStore::new(dir.path().join("customers.txt"));
        assert!(store.load_all().unwrap().is_empty());
        assert_eq!(store.next_id().unwrap(), 1);
    }

    fn assert_truncated_file_is_empty<R: Record>(dir: &Path, file_name: &str) {
        let path = dir.join(file_name);
        fs::write(&path, "").unwrap();
        let store: RecordStore<R> = RecordStore::new(&path);
        assert!(store.load_all().unwrap().is_empty(), "{} store should be empty", R::KIND);
        assert_eq!(store.next_id().unwrap(), 1, "{} next id should be 1", R::KIND);
    }

    #[test]
    fn test_truncated_file_is_empty_for_every_kind() {
        let dir = tempdir().unwrap();
        assert_truncated_file_is_empty::<Customer>(dir.path(), "customers.txt");
        assert_truncated_file_is_empty::<Vehicle>(dir.path(), "vehicles.txt");
        assert_truncated_file_is_empty::<ServiceItem>(dir.path(), "services.txt");
        assert_truncated_file_is_empty::<Discount>(dir.path(), "discounts.txt");
        assert_truncated_file_is_empty::<HistoryEntry>(dir.path(), "service_history.txt");
    }

    #[test]
    fn test_next_id_refuses_to_overflow() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("customers.txt");
        fs::write(&path, format!("{}|x|y|z\n", i64::MAX)).unwrap();
        let store: RecordStore<Customer> = RecordStore::new(&path);

        match store.next_id() {
            Err(StoreError::IdsExhausted { max, .. }) => assert_eq!(max, i64::MAX),
            other => panic!("Expected IdsExhausted, got {:?}", other),
        }
        // The record itself still loads.
        assert_eq!(store.load_all().unwrap().len(), 1);
    }

    #[test]
    fn test_history_line_without_status_is_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("service_history.txt");
        fs::write(
            &path,
            "1|1|1|1|2024-01-01 00:00:00|100|-1|0|100\n2|1|1|2|2024-01-02 00:00:00|800|-1|0|800|Pending\n",
        )
        .unwrap();
        let store: RecordStore<HistoryEntry> = RecordStore::new(&path);

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].status, HistoryStatus::Other(String::new()));
        assert_eq!(loaded[0].total, 100.0);
        assert_eq!(loaded[1].status, HistoryStatus::Pending);

        store.save_all(&loaded).unwrap();
        assert_eq!(store.load_all().unwrap(), loaded);
    }

    #[test]
    fn test_load_valid_data_in_file_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("customers.txt");
        fs::write(&path, "2|Jane|0987654321|jane@example.com\n1|John|1234567890|john@example.com\n").unwrap();
        let store: RecordStore<Customer> = RecordStore::new(&path);

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, 2);
        assert_eq!(loaded[0].name, "Jane");
        assert_eq!(loaded[1].id, 1);
        assert_eq!(loaded[1].email, "john@example.com");
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("customers.txt");
        fs::write(
            &path,
            "1|John|1234567890|john@example.com\n2||0987654321|jane@example.com\ninvalid|data\n",
        )
        .unwrap();
        let store: RecordStore<Customer> = RecordStore::new(&path);

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, 1);
        assert_eq!(loaded[1].id, 2);
        assert_eq!(loaded[1].name, "");
    }

    #[test]
    fn test_blank_and_crlf_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("customers.txt");
        fs::write(&path, "\n1|John|1|j@x\r\n\r\n3|Ann|3|a@x\r\n").unwrap();
        let store: RecordStore<Customer> = RecordStore::new(&path);

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].email, "j@x");
        assert_eq!(store.next_id().unwrap(), 4);
    }

    #[test]
    fn test_save_keeps_first_duplicate() {
        let dir = tempdir().unwrap();
        let store: RecordStore<Customer> = RecordStore::new(dir.path().join("customers.txt"));
        store.save_all(&[customer(1, "John"), customer(1, "Jane")]).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "John");
    }

    #[test]
    fn test_save_sorts_by_id() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("customers.txt");
        let store: RecordStore<Customer> = RecordStore::new(&path);
        store
            .save_all(&[customer(5, "Eve"), customer(2, "Bob"), customer(9, "Zed"), customer(2, "Dup")])
            .unwrap();

        let ids: Vec<i64> = store.load_all().unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("2|Bob|"));
        assert!(raw.ends_with('\n'));
        assert_eq!(raw.lines().count(), 3);
    }

    #[test]
    fn test_save_of_load_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("customers.txt");
        fs::write(&path, "3|C|3|c@x\n1|A|1|a@x\nbad|line\n2|B|2|b@x\n").unwrap();
        let store: RecordStore<Customer> = RecordStore::new(&path);

        store.save_all(&store.load_all().unwrap()).unwrap();
        let first = store.load_all().unwrap();
        store.save_all(&first).unwrap();
        let second = store.load_all().unwrap();

        assert_eq!(first, second);
        assert_eq!(first.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_next_id_ignores_in_memory_state() {
        let dir = tempdir().unwrap();
        let store: RecordStore<Customer> = RecordStore::new(dir.path().join("customers.txt"));
        let mut list = vec![customer(1, "John"), customer(7, "Jane")];
        store.save_all(&list).unwrap();
        assert_eq!(store.next_id().unwrap(), 8);

        list.push(customer(20, "Unsaved"));
        assert_eq!(store.next_id().unwrap(), 8);
    }

    #[test]
    fn test_next_id_skips_unparseable_ids() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("customers.txt");
        fs::write(&path, "x|nope\n4|A\n\n2|B\n").unwrap();
        let store: RecordStore<Customer> = RecordStore::new(&path);
        assert_eq!(store.next_id().unwrap(), 5);
    }

    #[test]
    fn test_delete_by_filter() {
        let dir = tempdir().unwrap();
        let store: RecordStore<Customer> = RecordStore::new(dir.path().join("customers.txt"));
        store
            .save_all(&[customer(1, "John"), customer(2, "Jane"), customer(3, "Jim")])
            .unwrap();

        let remaining: Vec<Customer> = store.load_all().unwrap().into_iter().filter(|c| c.id != 2).collect();
        store.save_all(&remaining).unwrap();

        let loaded = store.load_all().unwrap();
        assert!(loaded.iter().all(|c| c.id != 2));
        assert_eq!(loaded, vec![customer(1, "John"), customer(3, "Jim")]);
    }

    #[test]
    fn test_history_service_list_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("service_history.txt");
        let store: RecordStore<HistoryEntry> = RecordStore::new(&path);
        store.save_all(&[history(1, vec![1, 2]), history(2, vec![])]).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert!(lines[0].contains("|1,2|"));
        assert!(lines[1].starts_with("2|1|1||"));

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded[0].service_ids, vec![1, 2]);
        assert!(loaded[1].service_ids.is_empty());
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("data").join("customers.txt");
        let store: RecordStore<Customer> = RecordStore::new(&path);
        store.save_all(&[customer(1, "John")]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_io_failure_propagates() {
        let dir = tempdir().unwrap();
        // A directory where a file is expected cannot be opened for writing or read as a file.
        let store: RecordStore<Customer> = RecordStore::new(dir.path());
        assert!(matches!(store.save_all(&[customer(1, "John")]), Err(StoreError::Io { .. })));
        assert!(matches!(store.load_all(), Err(StoreError::Io { .. })));
    }
}
