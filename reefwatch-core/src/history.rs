//! CSV-backed water-test history, one file per tank.

use crate::error::ReefwatchError;
use csv::{ReaderBuilder, WriterBuilder};
use reefwatch_schemas::parameters::WaterParameters;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Number of tests the recent cache keeps for each tank.
pub const RECENT_TESTS_PER_TANK: usize = 5;

pub struct WaterTestLog {
    path: PathBuf,
}

impl WaterTestLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    /// Reads every test in the file. A missing file is an empty history.
    pub fn read_all(&self) -> Result<Vec<WaterParameters>, ReefwatchError> {
        if !self.path.exists() {
            warn!(path = %self.path.display(), "no water-test history yet");
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .map_err(|e| ReefwatchError::CsvError(self.display_path(), e))?;

        let mut tests = Vec::new();
        for result in reader.deserialize() {
            let test: WaterParameters = result.map_err(|e| ReefwatchError::CsvError(self.display_path(), e))?;
            tests.push(test);
        }
        debug!(path = %self.path.display(), count = tests.len(), "read water-test history");
        Ok(tests)
    }

    /// Appends one test, writing the header row first when the file is new.
    pub fn append(&self, test: &WaterParameters) -> Result<(), ReefwatchError> {
        let is_new = !self.path.exists() || fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ReefwatchError::FileIO(parent.display().to_string(), e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ReefwatchError::FileIO(self.display_path(), e))?;
        let mut writer = WriterBuilder::new().has_headers(is_new).from_writer(file);

        writer
            .serialize(test)
            .map_err(|e| ReefwatchError::CsvError(self.display_path(), e))?;
        writer
            .flush()
            .map_err(|e| ReefwatchError::FileIO(self.display_path(), e))?;
        Ok(())
    }
}

/// Keeps the newest few tests per tank, evicting older ones on insert.
#[derive(Debug)]
pub struct RecentTestCache {
    capacity: usize,
    tanks: HashMap<String, Vec<WaterParameters>>,
}

impl Default for RecentTestCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RecentTestCache {
    pub fn new() -> Self {
        Self::with_capacity(RECENT_TESTS_PER_TANK)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            tanks: HashMap::new(),
        }
    }

    pub fn insert(&mut self, test: WaterParameters) {
        let entries = self.tanks.entry(test.tank_id.clone()).or_default();
        entries.retain(|t| t.id != test.id);
        entries.push(test);
        entries.sort_by(|a, b| b.test_date.cmp(&a.test_date));
        entries.truncate(self.capacity);
    }

    pub fn extend(&mut self, tests: impl IntoIterator<Item = WaterParameters>) {
        for test in tests {
            self.insert(test);
        }
    }

    /// Cached tests for `tank_id`, newest first.
    pub fn recent(&self, tank_id: &str) -> &[WaterParameters] {
        self.tanks.get(tank_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn latest(&self, tank_id: &str) -> Option<&WaterParameters> {
        self.recent(tank_id).first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use reefwatch_schemas::parameters::Parameter;

    fn test_on(id: &str, tank: &str, day: u32) -> WaterParameters {
        WaterParameters::new(id, tank, NaiveDate::from_ymd_opt(2024, 3, day).unwrap())
    }

    #[test]
    fn missing_file_reads_as_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let log = WaterTestLog::new(dir.path().join("none.csv"));
        assert!(log.read_all().unwrap().is_empty());
    }

    #[test]
    fn appended_tests_read_back_with_absent_fields() {
        let dir = tempfile::tempdir().unwrap();
        let log = WaterTestLog::new(dir.path().join("tests").join("TANK-01.csv"));

        let first = test_on("a", "TANK-01", 1).with(Parameter::Ph, 8.1).with(Parameter::Nitrate, 12.5);
        let mut second = test_on("b", "TANK-01", 8).with(Parameter::Calcium, 420.0);
        second.ai_insights = Some("Calcium looks good, keep dosing".to_string());
        log.append(&first).unwrap();
        log.append(&second).unwrap();

        let tests = log.read_all().unwrap();
        assert_eq!(tests, vec![first, second]);
        assert_eq!(tests[0].value(Parameter::Calcium), None);
    }

    #[test]
    fn malformed_rows_report_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "id,tank_id,test_date\nx,TANK-01,not-a-date\n").unwrap();

        let err = WaterTestLog::new(&path).read_all().unwrap_err();
        assert!(matches!(err, ReefwatchError::CsvError(ref p, _) if p.ends_with("bad.csv")));
    }

    #[test]
    fn cache_keeps_the_five_newest_per_tank() {
        let mut cache = RecentTestCache::new();
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        cache.extend((0..8).map(|i| WaterParameters::new(format!("t{}", i), "A", start + Duration::days(i))));
        cache.insert(test_on("other", "B", 2));

        let recent = cache.recent("A");
        assert_eq!(recent.len(), RECENT_TESTS_PER_TANK);
        assert_eq!(recent[0].id, "t7");
        assert_eq!(recent[4].id, "t3");
        assert_eq!(cache.recent("B").len(), 1);
        assert!(cache.recent("C").is_empty());
    }

    #[test]
    fn reinserting_a_test_replaces_it() {
        let mut cache = RecentTestCache::new();
        cache.insert(test_on("a", "A", 1).with(Parameter::Ph, 8.0));
        cache.insert(test_on("a", "A", 1).with(Parameter::Ph, 8.3));
        assert_eq!(cache.recent("A").len(), 1);
        assert_eq!(cache.latest("A").unwrap().value(Parameter::Ph), Some(8.3));
    }
}
