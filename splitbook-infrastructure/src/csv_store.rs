use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use splitbook_application::{
    LoadedRecords, RecordDecodeError, RecordStore, StoreError, StoreVersion,
};
use splitbook_domain::ExpenseRecord;

use crate::record_codec::{self, HEADER};

/// Expense ledger kept in a single CSV file with a
/// `date,description,total,payer,shares` header.
///
/// Appends rewrite the file through a temporary sibling and a rename, after
/// re-checking that the content still matches the caller's version.
pub struct CsvRecordStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_bytes(&self) -> Result<Vec<u8>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn reader(bytes: &[u8]) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes)
    }

    fn version_of(bytes: &[u8], rows: usize) -> StoreVersion {
        if bytes.is_empty() {
            return StoreVersion::EMPTY;
        }
        StoreVersion {
            rows: rows as u64,
            digest: fxhash::hash64(bytes),
        }
    }

    fn count_rows(bytes: &[u8]) -> usize {
        Self::reader(bytes).records().count()
    }

    fn encode_line(fields: &[String]) -> Result<Vec<u8>, StoreError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer
            .write_record(fields)
            .map_err(|err| StoreError::Encode(err.to_string()))?;
        writer
            .into_inner()
            .map_err(|err| StoreError::Encode(err.to_string()))
    }

    fn replace_contents(&self, contents: &[u8]) -> Result<(), StoreError> {
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, contents)?;
        if let Err(err) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(err.into());
        }
        Ok(())
    }
}

impl RecordStore for CsvRecordStore {
    fn load_records(&self) -> Result<LoadedRecords, StoreError> {
        let bytes = self.read_bytes()?;
        if bytes.is_empty() {
            tracing::debug!(path = %self.path.display(), "ledger file absent or empty");
            return Ok(LoadedRecords::default());
        }

        let mut reader = Self::reader(&bytes);
        if let Ok(headers) = reader.headers()
            && !headers.iter().map(str::trim).eq(HEADER)
        {
            tracing::warn!(
                path = %self.path.display(),
                found = ?headers,
                "unexpected ledger header, reading columns by position"
            );
        }

        let rows: Vec<Result<ExpenseRecord, RecordDecodeError>> = reader
            .records()
            .enumerate()
            .map(|(index, result)| {
                let row = index + 1;
                match result {
                    Ok(fields) => record_codec::decode_row(row, &fields),
                    Err(err) => Err(RecordDecodeError {
                        row,
                        reason: err.to_string(),
                    }),
                }
            })
            .collect();

        let version = Self::version_of(&bytes, rows.len());
        tracing::debug!(path = %self.path.display(), rows = rows.len(), %version, "loaded ledger");
        Ok(LoadedRecords { version, rows })
    }

    fn append_record(
        &self,
        record: &ExpenseRecord,
        expected: StoreVersion,
    ) -> Result<StoreVersion, StoreError> {
        let fields = record_codec::encode_row(record)
            .map_err(|err| StoreError::Encode(err.to_string()))?;
        let line = Self::encode_line(&fields)?;

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut contents = self.read_bytes()?;
        let rows = Self::count_rows(&contents);
        let actual = Self::version_of(&contents, rows);
        if actual != expected {
            tracing::debug!(%expected, %actual, "refusing append to a changed ledger");
            return Err(StoreError::Conflict { expected, actual });
        }

        if contents.is_empty() {
            let header = HEADER.map(str::to_owned);
            contents = Self::encode_line(&header)?;
        } else if !contents.ends_with(b"\n") {
            contents.push(b'\n');
        }
        contents.extend_from_slice(&line);

        self.replace_contents(&contents)?;
        Ok(Self::version_of(&contents, rows + 1))
    }

    fn version(&self) -> Result<StoreVersion, StoreError> {
        let bytes = self.read_bytes()?;
        Ok(Self::version_of(&bytes, Self::count_rows(&bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::{fixture, rstest};
    use splitbook_application::LedgerService;
    use splitbook_domain::{AggregationIssue, Member, MemberRoster, Money, Shares};
    use tempfile::TempDir;

    #[fixture]
    fn dir() -> TempDir {
        tempfile::tempdir().expect("temp dir")
    }

    fn member(name: &str) -> Member {
        Member::new(name).expect("valid name")
    }

    fn record(description: &str, total: i64, payer: &str, shares: &[(&str, i64)]) -> ExpenseRecord {
        ExpenseRecord {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date"),
            description: description.to_owned(),
            total: Money::from_i64(total),
            payer: member(payer),
            shares: shares
                .iter()
                .map(|(name, amount)| (member(name), Money::from_i64(*amount)))
                .collect::<Shares>(),
        }
    }

    #[rstest]
    fn missing_file_reads_as_empty(dir: TempDir) {
        let store = CsvRecordStore::new(dir.path().join("ledger.csv"));

        let loaded = store.load_records().expect("load succeeds");

        assert!(loaded.rows.is_empty());
        assert_eq!(loaded.version, StoreVersion::EMPTY);
        assert_eq!(store.version().expect("version"), StoreVersion::EMPTY);
    }

    #[rstest]
    fn appended_records_are_read_back_in_order(dir: TempDir) {
        let store = CsvRecordStore::new(dir.path().join("ledger.csv"));
        let first = record("dinner, downtown", 90, "A", &[("A", 30), ("B", 30), ("C", 30)]);
        let second = record("taxi", 12, "B", &[("C", 12)]);

        let v1 = store
            .append_record(&first, StoreVersion::EMPTY)
            .expect("first append");
        let v2 = store.append_record(&second, v1).expect("second append");

        let loaded = store.load_records().expect("load succeeds");
        let rows: Vec<ExpenseRecord> = loaded
            .rows
            .into_iter()
            .map(|row| row.expect("row decodes"))
            .collect();
        assert_eq!(rows, vec![first, second]);
        assert_eq!(loaded.version, v2);
        assert_eq!(v2.rows, 2);

        let text = fs::read_to_string(store.path()).expect("file exists");
        assert!(text.starts_with("date,description,total,payer,shares\n"));
    }

    #[rstest]
    fn stale_version_is_rejected_without_writing(dir: TempDir) {
        let store = CsvRecordStore::new(dir.path().join("ledger.csv"));
        let seen = store
            .append_record(&record("first", 10, "A", &[("A", 10)]), StoreVersion::EMPTY)
            .expect("first append");
        let other_writer = CsvRecordStore::new(store.path());
        other_writer
            .append_record(&record("sneaky", 4, "B", &[("B", 4)]), seen)
            .expect("concurrent append");
        let before = fs::read(store.path()).expect("file exists");

        let err = store
            .append_record(&record("late", 8, "A", &[("A", 8)]), seen)
            .expect_err("stale version must conflict");

        assert!(matches!(err, StoreError::Conflict { expected, .. } if expected == seen));
        assert_eq!(fs::read(store.path()).expect("file exists"), before);
    }

    #[rstest]
    fn external_edit_changes_version(dir: TempDir) {
        let path = dir.path().join("ledger.csv");
        let store = CsvRecordStore::new(&path);
        let seen = store
            .append_record(&record("first", 10, "A", &[("A", 10)]), StoreVersion::EMPTY)
            .expect("append");
        let edited = fs::read_to_string(&path)
            .expect("file exists")
            .replace("first", "edited");
        fs::write(&path, edited).expect("rewrite");

        let now = store.version().expect("version");

        assert_eq!(now.rows, seen.rows);
        assert_ne!(now, seen);
    }

    #[rstest]
    fn corrupt_rows_are_reported_without_hiding_others(dir: TempDir) {
        let path = dir.path().join("ledger.csv");
        fs::write(
            &path,
            "date,description,total,payer,shares\n\
             2024-01-01,lunch,20.0,A,\"{'A': 10.0, 'B': 10.0}\"\n\
             2024-01-02,broken,abc,A,\"{'A': 1.0}\"\n\
             2024-01-03,coffee,4,B,\"{\"\"v\"\":1,\"\"shares\"\":[{\"\"member\"\":\"\"A\"\",\"\"amount\"\":\"\"4\"\"}]}\"\n",
        )
        .expect("seed ledger");
        let store = CsvRecordStore::new(&path);

        let loaded = store.load_records().expect("load succeeds");

        assert_eq!(loaded.rows.len(), 3);
        assert!(loaded.rows[0].is_ok());
        let err = loaded.rows[1].as_ref().expect_err("second row is corrupt");
        assert_eq!(err.row, 2);
        let coffee = loaded.rows[2].as_ref().expect("third row decodes");
        assert_eq!(coffee.shares.get("A"), Some(Money::from_i64(4)));
    }

    #[rstest]
    fn append_after_file_without_trailing_newline(dir: TempDir) {
        let path = dir.path().join("ledger.csv");
        fs::write(
            &path,
            "date,description,total,payer,shares\n2024-01-01,lunch,10,A,\"{'A': 10.0}\"",
        )
        .expect("seed ledger");
        let store = CsvRecordStore::new(&path);
        let seen = store.version().expect("version");

        store
            .append_record(&record("taxi", 5, "A", &[("A", 5)]), seen)
            .expect("append");

        let loaded = store.load_records().expect("load succeeds");
        assert_eq!(loaded.rows.len(), 2);
        assert!(loaded.rows.iter().all(Result::is_ok));
    }

    #[rstest]
    fn report_skips_rows_whose_totals_overflow(dir: TempDir) {
        let path = dir.path().join("ledger.csv");
        let huge_row = "2024-01-01,yacht,79228162514264337593543950335,A,\
             \"{\"\"v\"\":1,\"\"shares\"\":[{\"\"member\"\":\"\"B\"\",\
             \"\"amount\"\":\"\"79228162514264337593543950335\"\"}]}\"\n";
        fs::write(
            &path,
            format!(
                "date,description,total,payer,shares\n{huge_row}{huge_row}\
                 2024-01-03,coffee,4,B,\"{{'A': 2.0, 'B': 2.0}}\"\n"
            ),
        )
        .expect("seed ledger");
        let store = CsvRecordStore::new(&path);
        let roster = MemberRoster::try_from_names(["A", "B"]).expect("valid roster");

        let report = LedgerService::new(&store)
            .build_report(&roster)
            .expect("report builds");

        assert_eq!(report.history.len(), 3);
        assert_eq!(
            report.issues,
            vec![AggregationIssue::Overflow {
                index: 1,
                total: Money::from_decimal(rust_decimal::Decimal::MAX),
            }]
        );
        assert_eq!(
            report.balances.get("B"),
            Some(&(Money::from_i64(2) - Money::from_decimal(rust_decimal::Decimal::MAX)))
        );
    }
}
