//! Tabular normalization of downloaded bodies.
//!
//! The fetch engine hands every downloaded body to a [`Normalizer`], which
//! writes the normalized table to its destination and reports its shape.
//! [`CsvNormalizer`] renames the header row to snake_case and leaves data
//! rows byte-for-byte intact.

mod snake;

pub use snake::to_snake_case;

use std::io::Write;
use std::path::Path;

use crate::storage::StagedFile;

/// Shape of a normalized table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableStats {
    /// Data rows (header excluded).
    pub row_count: u64,
    pub column_count: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("body has no header row")]
    Empty,
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("write {}: {source}", .path.display())]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Turns a raw body into the normalized table at `destination`.
///
/// Implementations must write atomically: on error nothing at `destination` changes.
pub trait Normalizer: Send + Sync + 'static {
    fn normalize(&self, body: &[u8], destination: &Path) -> Result<TableStats, NormalizeError>;
}

/// CSV header normalizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvNormalizer;

impl Normalizer for CsvNormalizer {
    fn normalize(&self, body: &[u8], destination: &Path) -> Result<TableStats, NormalizeError> {
        let write_err = |source: std::io::Error| NormalizeError::Write {
            path: destination.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(body);
        let headers = reader.byte_headers()?.clone();
        if headers.is_empty() {
            return Err(NormalizeError::Empty);
        }
        let renamed: Vec<String> = headers
            .iter()
            .map(|h| to_snake_case(&String::from_utf8_lossy(h)))
            .collect();

        let mut staged = StagedFile::create(destination).map_err(write_err)?;
        let mut row_count = 0u64;
        {
            let mut writer = csv::Writer::from_writer(&mut staged);
            writer.write_record(&renamed)?;
            let mut record = csv::ByteRecord::new();
            while reader.read_byte_record(&mut record)? {
                writer.write_byte_record(&record)?;
                row_count += 1;
            }
            writer.flush().map_err(write_err)?;
        }
        staged.flush().map_err(write_err)?;
        staged.commit().map_err(write_err)?;

        Ok(TableStats {
            row_count,
            column_count: renamed.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renames_headers_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("ds").join("general.csv");
        let body = b"Facility ID,Facility Name,HospitalType\n010001,SOUTHEAST HEALTH,Acute Care\n010005,MARSHALL MEDICAL,Acute Care\n";

        let stats = CsvNormalizer.normalize(body, &dest).unwrap();

        assert_eq!(
            stats,
            TableStats {
                row_count: 2,
                column_count: 3
            }
        );
        let written = std::fs::read_to_string(&dest).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("facility_id,facility_name,hospital_type"));
        assert_eq!(lines.next(), Some("010001,SOUTHEAST HEALTH,Acute Care"));
    }

    #[test]
    fn quoted_fields_survive() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("q.csv");
        let body = b"\"City/Town\",Address\n\"DOTHAN, AL\",\"1108 ROSS \"\"CLARK\"\" CIRCLE\"\n";
        let stats = CsvNormalizer.normalize(body, &dest).unwrap();
        assert_eq!(stats.row_count, 1);
        let mut rdr = csv::Reader::from_path(&dest).unwrap();
        let headers: Vec<&str> = rdr.headers().unwrap().iter().collect();
        assert_eq!(headers, ["city_town", "address"]);
        let row = rdr.records().next().unwrap().unwrap();
        assert_eq!(&row[0], "DOTHAN, AL");
        assert_eq!(&row[1], "1108 ROSS \"CLARK\" CIRCLE");
    }

    #[test]
    fn header_only_body_has_zero_rows() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("h.csv");
        let stats = CsvNormalizer.normalize(b"A,B\n", &dest).unwrap();
        assert_eq!(stats.row_count, 0);
        assert_eq!(stats.column_count, 2);
    }

    #[test]
    fn empty_body_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("e.csv");
        assert!(matches!(
            CsvNormalizer.normalize(b"", &dest),
            Err(NormalizeError::Empty)
        ));
        assert!(!dest.exists());
    }

    #[test]
    fn ragged_rows_leave_previous_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("r.csv");
        std::fs::write(&dest, b"a,b\n1,2\n").unwrap();

        let err = CsvNormalizer
            .normalize(b"A,B\n1,2\n3\n", &dest)
            .unwrap_err();

        assert!(matches!(err, NormalizeError::Csv(_)));
        assert_eq!(std::fs::read(&dest).unwrap(), b"a,b\n1,2\n");
        assert!(crate::storage::staging_files(&dest).is_empty());
    }
}
