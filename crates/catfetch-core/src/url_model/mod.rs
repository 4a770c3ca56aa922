//! URL modeling and filename derivation.
//!
//! Derives safe local names for catalog resources: the dataset directory and
//! the CSV filename inside it.

mod path;
mod sanitize;

pub use path::filename_from_url_path;
pub use sanitize::{sanitize_dataset_id, sanitize_filename_for_linux};

/// Default filename when neither a suggestion nor the URL path yields anything usable.
const DEFAULT_FILENAME: &str = "distribution.csv";

/// Derives a safe `.csv` filename for a distribution.
///
/// Prefers `suggested` (a filename from the catalog entry), otherwise uses the
/// last path segment of `url`. The result is sanitized for Linux and always
/// ends in `.csv`.
///
/// # Examples
///
/// - `derive_csv_filename("https://example.com/a/beds.csv?x=1", None)` → `"beds.csv"`
/// - `derive_csv_filename("https://example.com/a/b", Some("Hospital General"))` → `"Hospital_General.csv"`
pub fn derive_csv_filename(url: &str, suggested: Option<&str>) -> String {
    let candidate = suggested
        .map(sanitize_filename_for_linux)
        .filter(|s| !s.is_empty() && s != "." && s != "..")
        .or_else(|| filename_from_url_path(url).map(|s| sanitize_filename_for_linux(&s)))
        .filter(|s| !s.is_empty() && s != "." && s != "..");

    let name = match candidate {
        Some(c) => c,
        None => return DEFAULT_FILENAME.to_string(),
    };
    if name.to_ascii_lowercase().ends_with(".csv") {
        name
    } else {
        format!("{}.csv", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_from_url_path() {
        assert_eq!(
            derive_csv_filename("https://example.com/files/Hospital_General.csv", None),
            "Hospital_General.csv"
        );
        assert_eq!(
            derive_csv_filename("https://example.com/a/beds.csv?x=1", None),
            "beds.csv"
        );
    }

    #[test]
    fn suggestion_wins_and_gets_extension() {
        assert_eq!(
            derive_csv_filename("https://example.com/a/b.csv", Some("Hospital General")),
            "Hospital_General.csv"
        );
        assert_eq!(
            derive_csv_filename("https://example.com/a/b.csv", Some("report.CSV")),
            "report.CSV"
        );
    }

    #[test]
    fn empty_suggestion_falls_back_to_url() {
        assert_eq!(
            derive_csv_filename("https://example.com/x/data.csv", Some(" .. ")),
            "data.csv"
        );
    }

    #[test]
    fn nothing_usable_uses_default() {
        assert_eq!(derive_csv_filename("https://example.com/", None), DEFAULT_FILENAME);
        assert_eq!(derive_csv_filename("not a url", None), DEFAULT_FILENAME);
    }
}
