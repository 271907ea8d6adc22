//! Error-code record database: JSON file backed, keyed by the decimal
//! string form of the generator error code.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default database path, relative to the working directory.
pub const DEFAULT_STORE_PATH: &str = "errorCodes.json";

/// Largest value a 4-bit frame field can carry.
pub const MAX_NIBBLE: u8 = 0x0F;

/// Field values encoded into a notify-status frame for one error code.
///
/// Fields are typed to their wire width, so a database entry with an
/// out-of-range value fails record parsing instead of being silently
/// truncated later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub generator_status: u8,
    pub simplified_code: u8,
    pub display_bitmap: u8,
    pub phase_nibble: u8,
    pub class_nibble: u8,
    pub generator_error_code: u16,
    pub aux_data: u16,
    pub description: String,
}

impl ErrorRecord {
    /// Database key for this record.
    pub fn key(&self) -> String {
        self.generator_error_code.to_string()
    }

    /// Reject records whose nibble fields cannot fit their 4-bit frame
    /// slots. The wider fields self-limit through their types.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.phase_nibble > MAX_NIBBLE || self.class_nibble > MAX_NIBBLE {
            return Err(StoreError::NibbleOutOfRange {
                code: self.generator_error_code,
            });
        }
        Ok(())
    }
}

/// Store failure diagnostics. The resolver folds every one of these into a
/// not-found outcome; they are logged there, not propagated further.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("error code database {path} could not be read: {source}")]
    Unreadable { path: String, source: io::Error },
    #[error("error code database {path} is malformed: {source}")]
    Malformed {
        path: String,
        source: serde_json::Error,
    },
    #[error("Error code {0} already exists in the database")]
    DuplicateCode(u16),
    #[error("error code {code}: phase and class nibbles must fit in 4 bits")]
    NibbleOutOfRange { code: u16 },
    #[error("error code database {path} could not be written: {source}")]
    Persist { path: String, source: io::Error },
}

/// Read seam between the resolver and whatever holds the records.
pub trait RecordStore {
    /// Fetch the record for a numeric error code. `Ok(None)` means the code
    /// is absent; `Err` carries the store's own diagnostics.
    fn record_by_code(&self, code: i64) -> Result<Option<ErrorRecord>, StoreError>;
}

/// Full database surface: resolver reads plus the maintenance operations
/// the operator console uses.
pub trait RecordDatabase: RecordStore {
    /// Add a record keyed by its own generator error code. Duplicate keys
    /// are rejected.
    fn add(&mut self, record: ErrorRecord) -> Result<(), StoreError>;

    /// All records in key order.
    fn list(&self) -> Result<Vec<ErrorRecord>, StoreError>;
}

/// Records every deployment starts with, used to seed a fresh database.
pub fn builtin_records() -> Vec<ErrorRecord> {
    vec![
        ErrorRecord {
            generator_status: 6,
            simplified_code: 30,
            display_bitmap: 0x00,
            phase_nibble: 2,
            class_nibble: 2,
            generator_error_code: 804,
            aux_data: 0x0005,
            description: "Tube spit (all kV drop/regul errors)".to_string(),
        },
        ErrorRecord {
            generator_status: 6,
            simplified_code: 90,
            display_bitmap: 0x00,
            phase_nibble: 2,
            class_nibble: 5,
            generator_error_code: 134,
            aux_data: 0x0005,
            description: "This error is usually caused by a HW issue.".to_string(),
        },
    ]
}

/// JSON-file database. The file is re-read per lookup so out-of-band edits
/// are picked up without a restart; writes go through a temp file and an
/// atomic rename so a concurrent read never sees a torn document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn path_label(&self) -> String {
        self.path.display().to_string()
    }

    fn temp_path(&self) -> PathBuf {
        let mut os = self.path.clone().into_os_string();
        os.push(".tmp");
        PathBuf::from(os)
    }

    /// Load the whole database. A missing or unparseable file is an error;
    /// use [`JsonFileStore::add`] to create the file on first write.
    pub fn load_all(&self) -> Result<BTreeMap<String, ErrorRecord>, StoreError> {
        let body = fs::read_to_string(&self.path).map_err(|source| StoreError::Unreadable {
            path: self.path_label(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|source| StoreError::Malformed {
            path: self.path_label(),
            source,
        })
    }

    fn load_or_empty(&self) -> Result<BTreeMap<String, ErrorRecord>, StoreError> {
        match self.load_all() {
            Ok(map) => Ok(map),
            Err(StoreError::Unreadable { ref source, .. })
                if source.kind() == io::ErrorKind::NotFound =>
            {
                Ok(BTreeMap::new())
            }
            Err(err) => Err(err),
        }
    }

    fn persist(&self, map: &BTreeMap<String, ErrorRecord>) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(map).map_err(|source| StoreError::Persist {
            path: self.path_label(),
            source: io::Error::new(io::ErrorKind::InvalidData, source),
        })?;
        let temp = self.temp_path();
        fs::write(&temp, body).map_err(|source| StoreError::Persist {
            path: self.path_label(),
            source,
        })?;
        fs::rename(&temp, &self.path).map_err(|source| StoreError::Persist {
            path: self.path_label(),
            source,
        })
    }

    /// Write the given records only if the database file does not exist
    /// yet. Returns whether seeding happened.
    pub fn seed_if_missing(&self, records: &[ErrorRecord]) -> Result<bool, StoreError> {
        if self.path.exists() {
            return Ok(false);
        }
        let mut map = BTreeMap::new();
        for record in records {
            record.validate()?;
            map.insert(record.key(), record.clone());
        }
        self.persist(&map)?;
        Ok(true)
    }
}

impl RecordStore for JsonFileStore {
    fn record_by_code(&self, code: i64) -> Result<Option<ErrorRecord>, StoreError> {
        let map = self.load_all()?;
        let found = map.get(&code.to_string()).cloned();
        if found.is_some() {
            debug!("Loaded error record for code {}", code);
        } else {
            debug!("Error code {} not found in database", code);
        }
        Ok(found)
    }
}

impl RecordDatabase for JsonFileStore {
    /// A missing file starts from an empty database on first add.
    fn add(&mut self, record: ErrorRecord) -> Result<(), StoreError> {
        record.validate()?;
        let mut map = self.load_or_empty()?;
        if map.contains_key(&record.key()) {
            return Err(StoreError::DuplicateCode(record.generator_error_code));
        }
        debug!(
            "Adding error record for code {}",
            record.generator_error_code
        );
        map.insert(record.key(), record);
        self.persist(&map)
    }

    fn list(&self) -> Result<Vec<ErrorRecord>, StoreError> {
        Ok(self.load_all()?.into_values().collect())
    }
}

/// In-memory database for tests and embedded defaults.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, ErrorRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the built-in records.
    pub fn builtin() -> Self {
        Self::with_records(&builtin_records())
    }

    pub fn with_records(records: &[ErrorRecord]) -> Self {
        let mut store = Self::new();
        for record in records {
            store.insert(record.clone());
        }
        store
    }

    pub fn insert(&mut self, record: ErrorRecord) {
        self.records.insert(record.key(), record);
    }
}

impl RecordStore for MemoryStore {
    fn record_by_code(&self, code: i64) -> Result<Option<ErrorRecord>, StoreError> {
        Ok(self.records.get(&code.to_string()).cloned())
    }
}

impl RecordDatabase for MemoryStore {
    fn add(&mut self, record: ErrorRecord) -> Result<(), StoreError> {
        record.validate()?;
        if self.records.contains_key(&record.key()) {
            return Err(StoreError::DuplicateCode(record.generator_error_code));
        }
        self.records.insert(record.key(), record);
        Ok(())
    }

    fn list(&self) -> Result<Vec<ErrorRecord>, StoreError> {
        Ok(self.records.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_records_pass_validation() {
        for record in builtin_records() {
            assert!(record.validate().is_ok());
        }
    }

    #[test]
    fn test_record_rejects_wide_nibbles() {
        let mut record = builtin_records().remove(0);
        record.phase_nibble = 16;
        assert!(matches!(
            record.validate(),
            Err(StoreError::NibbleOutOfRange { code: 804 })
        ));
    }

    #[test]
    fn test_memory_store_lookup_by_decimal_key() {
        let store = MemoryStore::builtin();
        let record = store.record_by_code(804).unwrap().unwrap();
        assert_eq!(record.simplified_code, 30);
        assert!(store.record_by_code(805).unwrap().is_none());
        assert!(store.record_by_code(-804).unwrap().is_none());
    }

    #[test]
    fn test_memory_store_rejects_duplicate_add() {
        let mut store = MemoryStore::builtin();
        let result = store.add(builtin_records().remove(0));
        assert!(matches!(result, Err(StoreError::DuplicateCode(804))));
    }

    #[test]
    fn test_record_json_field_names() {
        let record = builtin_records().remove(0);
        let json = serde_json::to_value(&record).unwrap();
        let object = json.as_object().unwrap();
        for field in [
            "generatorStatus",
            "simplifiedCode",
            "displayBitmap",
            "phaseNibble",
            "classNibble",
            "generatorErrorCode",
            "auxData",
            "description",
        ] {
            assert!(object.contains_key(field), "missing field {}", field);
        }
    }
}
