//! # Reference Module
//!
//! WHO LMS reference tables and the loader that materializes them.
//!
//! A `ReferenceSet` holds one `ReferenceTable` per (standard, sex), twelve in
//! total. It is built once at startup, either from the embedded WHO assets or
//! from a directory of CSV files, and is read-only afterwards.
//!
//! ## Load-time Guarantees
//!
//! Every table is checked before a `ReferenceSet` can exist:
//! - All values finite, `M > 0`, `S > 0`
//! - Keys strictly ascending with the standard's uniform step
//! - First and last key match the standard's published domain
//!
//! A violation is a `GrowthError` (fatal). Request-time code never sees a
//! missing or malformed table.

pub mod embedded;

use crate::primitives::KEY_TOLERANCE;
use crate::types::{Axis, GrowthError, Sex, Standard};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// =============================================================================
// LMS ROWS
// =============================================================================

/// The three LMS parameters of a reference distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LmsParams {
    /// Box-Cox power (skewness).
    pub l: f64,
    /// Median.
    pub m: f64,
    /// Coefficient of variation.
    pub s: f64,
}

impl LmsParams {
    #[must_use]
    pub const fn new(l: f64, m: f64, s: f64) -> Self {
        Self { l, m, s }
    }
}

/// One row of a WHO table: the LMS parameters at one age or length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LmsRow {
    /// Age in months or length/height in cm, depending on the standard.
    pub key: f64,
    pub l: f64,
    pub m: f64,
    pub s: f64,
}

impl LmsRow {
    #[must_use]
    pub const fn new(key: f64, l: f64, m: f64, s: f64) -> Self {
        Self { key, l, m, s }
    }

    #[must_use]
    pub const fn params(&self) -> LmsParams {
        LmsParams::new(self.l, self.m, self.s)
    }
}

// =============================================================================
// REFERENCE TABLE
// =============================================================================

/// A validated WHO table for one standard and one sex.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    standard: Standard,
    sex: Sex,
    rows: Vec<LmsRow>,
}

impl ReferenceTable {
    /// Build a table, enforcing the reference-data invariants.
    pub fn new(standard: Standard, sex: Sex, rows: Vec<LmsRow>) -> Result<Self, GrowthError> {
        let malformed = |reason: String| GrowthError::MalformedTable {
            standard,
            sex,
            reason,
        };

        let (first, last) = match (rows.first(), rows.last()) {
            (Some(first), Some(last)) => (first.key, last.key),
            _ => return Err(malformed("table has no rows".to_string())),
        };

        for row in &rows {
            if !(row.key.is_finite() && row.l.is_finite() && row.m.is_finite() && row.s.is_finite())
            {
                return Err(malformed(format!("non-finite value at key {}", row.key)));
            }
            if row.m <= 0.0 {
                return Err(malformed(format!("M must be positive at key {}", row.key)));
            }
            if row.s <= 0.0 {
                return Err(malformed(format!("S must be positive at key {}", row.key)));
            }
        }

        let step = standard.step();
        for pair in rows.windows(2) {
            let gap = pair[1].key - pair[0].key;
            if gap <= 0.0 {
                return Err(malformed(format!(
                    "keys not strictly ascending at {}",
                    pair[1].key
                )));
            }
            if (gap - step).abs() > KEY_TOLERANCE {
                return Err(malformed(format!(
                    "gap between {} and {} (expected step {})",
                    pair[0].key, pair[1].key, step
                )));
            }
        }

        let (domain_first, domain_last) = standard.domain();
        if (first - domain_first).abs() > KEY_TOLERANCE || (last - domain_last).abs() > KEY_TOLERANCE
        {
            return Err(malformed(format!(
                "covers {}..={} but {} requires {}..={}",
                first, last, standard, domain_first, domain_last
            )));
        }

        Ok(Self {
            standard,
            sex,
            rows,
        })
    }

    /// Parse a `key,l,m,s` CSV source and validate it.
    pub fn from_csv(
        standard: Standard,
        sex: Sex,
        source_name: &str,
        data: &[u8],
    ) -> Result<Self, GrowthError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(data);

        let mut rows = Vec::new();
        for record in reader.deserialize::<LmsRow>() {
            let row = record.map_err(|e| GrowthError::Csv {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;
            rows.push(row);
        }

        Self::new(standard, sex, rows)
    }

    #[must_use]
    pub fn standard(&self) -> Standard {
        self.standard
    }

    #[must_use]
    pub fn sex(&self) -> Sex {
        self.sex
    }

    #[must_use]
    pub fn rows(&self) -> &[LmsRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Exact row at a key, if the key is a table key.
    #[must_use]
    pub fn row_at(&self, key: f64) -> Option<&LmsRow> {
        self.rows
            .iter()
            .find(|row| (row.key - key).abs() <= KEY_TOLERANCE)
    }

    /// Summary for status output.
    #[must_use]
    pub fn summary(&self) -> TableSummary {
        let (min, max) = self.standard.domain();
        TableSummary {
            standard: self.standard,
            sex: self.sex,
            axis: self.standard.axis(),
            min,
            max,
            step: self.standard.step(),
            rows: self.rows.len(),
        }
    }

    /// Shortest round-trip form of every value, so the text is lossless.
    fn write_canonical(&self, out: &mut String) {
        out.push_str(&format!("{},{}\n", self.standard.code(), self.sex.file_suffix()));
        for row in &self.rows {
            out.push_str(&format!("{},{},{},{}\n", row.key, row.l, row.m, row.s));
        }
    }
}

/// Shape of one loaded table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub standard: Standard,
    pub sex: Sex,
    pub axis: Axis,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub rows: usize,
}

// =============================================================================
// REFERENCE SET
// =============================================================================

/// Where a `ReferenceSet` was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferenceSource {
    /// Compiled-in WHO assets.
    Embedded { dataset: String },
    /// CSV files in an operator-supplied directory.
    Directory { path: PathBuf },
    /// Tables supplied programmatically.
    Custom,
}

/// The complete, validated set of reference tables.
///
/// `Send + Sync` and immutable: share it with `Arc` across threads.
#[derive(Debug, Clone)]
pub struct ReferenceSet {
    /// Indexed by `standard.index() * 2 + sex.index()`.
    tables: Vec<ReferenceTable>,
    source: ReferenceSource,
}

impl ReferenceSet {
    /// Load the embedded WHO Child Growth Standards.
    pub fn embedded() -> Result<Self, GrowthError> {
        let mut tables = Vec::with_capacity(Standard::ALL.len() * Sex::ALL.len());
        for standard in Standard::ALL {
            for sex in Sex::ALL {
                let name = embedded::file_name(standard, sex);
                let data = embedded::csv_for(standard, sex);
                tables.push(ReferenceTable::from_csv(standard, sex, &name, data.as_bytes())?);
            }
        }
        let set = Self::from_tables(
            tables,
            ReferenceSource::Embedded {
                dataset: embedded::EMBEDDED_DATASET.to_string(),
            },
        )?;
        tracing::info!(
            tables = set.tables.len(),
            dataset = embedded::EMBEDDED_DATASET,
            "Loaded embedded reference tables"
        );
        Ok(set)
    }

    /// Load all twelve tables from `<dir>/<code>_<boys|girls>.csv`.
    ///
    /// A missing file is a `GrowthError::MissingTable`.
    pub fn from_dir(dir: &Path) -> Result<Self, GrowthError> {
        let mut tables = Vec::with_capacity(Standard::ALL.len() * Sex::ALL.len());
        for standard in Standard::ALL {
            for sex in Sex::ALL {
                let path = dir.join(embedded::file_name(standard, sex));
                if !path.is_file() {
                    return Err(GrowthError::MissingTable { standard, sex });
                }
                let data = std::fs::read(&path).map_err(|e| {
                    GrowthError::IoError(format!("Cannot read {}: {}", path.display(), e))
                })?;
                tables.push(ReferenceTable::from_csv(
                    standard,
                    sex,
                    &path.display().to_string(),
                    &data,
                )?);
            }
        }
        let set = Self::from_tables(
            tables,
            ReferenceSource::Directory {
                path: dir.to_path_buf(),
            },
        )?;
        tracing::info!(
            tables = set.tables.len(),
            dir = %dir.display(),
            "Loaded reference tables from directory"
        );
        Ok(set)
    }

    /// Assemble a set from already-validated tables.
    ///
    /// Every (standard, sex) pair must appear exactly once.
    pub fn from_tables(
        tables: Vec<ReferenceTable>,
        source: ReferenceSource,
    ) -> Result<Self, GrowthError> {
        let mut by_key: BTreeMap<(Standard, Sex), ReferenceTable> = BTreeMap::new();
        for table in tables {
            let key = (table.standard, table.sex);
            if by_key.insert(key, table).is_some() {
                return Err(GrowthError::MalformedTable {
                    standard: key.0,
                    sex: key.1,
                    reason: "table supplied more than once".to_string(),
                });
            }
        }

        let mut ordered = Vec::with_capacity(Standard::ALL.len() * Sex::ALL.len());
        for standard in Standard::ALL {
            for sex in Sex::ALL {
                let table = by_key
                    .remove(&(standard, sex))
                    .ok_or(GrowthError::MissingTable { standard, sex })?;
                ordered.push(table);
            }
        }

        Ok(Self {
            tables: ordered,
            source,
        })
    }

    /// The table for one standard and sex.
    #[must_use]
    pub fn table(&self, standard: Standard, sex: Sex) -> &ReferenceTable {
        &self.tables[standard.index() * Sex::ALL.len() + sex.index()]
    }

    /// All tables in canonical order.
    pub fn tables(&self) -> impl Iterator<Item = &ReferenceTable> {
        self.tables.iter()
    }

    #[must_use]
    pub fn source(&self) -> &ReferenceSource {
        &self.source
    }

    #[must_use]
    pub fn summaries(&self) -> Vec<TableSummary> {
        self.tables.iter().map(ReferenceTable::summary).collect()
    }

    /// Canonical text form of every table, used for fingerprinting.
    #[must_use]
    pub fn canonical_text(&self) -> String {
        let mut out = String::new();
        for table in &self.tables {
            table.write_canonical(&mut out);
        }
        out
    }

    /// BLAKE3 hex digest of the canonical text (64 characters).
    ///
    /// Two sets with the same fingerprint produce identical z-scores.
    #[cfg(feature = "crypto-hash")]
    #[must_use]
    pub fn fingerprint(&self) -> String {
        blake3::hash(self.canonical_text().as_bytes())
            .to_hex()
            .to_string()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn rows_for(standard: Standard, m: f64) -> Vec<LmsRow> {
        let (first, _) = standard.domain();
        (0..standard.expected_rows())
            .map(|i| LmsRow::new(first + i as f64 * standard.step(), 1.0, m, 0.1))
            .collect()
    }

    #[test]
    fn embedded_set_loads_all_tables() {
        let set = ReferenceSet::embedded().unwrap();
        assert_eq!(set.tables().count(), 12);
        for standard in Standard::ALL {
            for sex in Sex::ALL {
                let table = set.table(standard, sex);
                assert_eq!(table.standard(), standard);
                assert_eq!(table.sex(), sex);
                assert_eq!(table.len(), standard.expected_rows());
            }
        }
    }

    #[test]
    fn embedded_source_is_reported() {
        let set = ReferenceSet::embedded().unwrap();
        assert!(matches!(set.source(), ReferenceSource::Embedded { .. }));
    }

    #[test]
    fn empty_table_rejected() {
        let result = ReferenceTable::new(Standard::WeightForAge, Sex::Male, vec![]);
        assert!(matches!(result, Err(GrowthError::MalformedTable { .. })));
    }

    #[test]
    fn non_positive_median_rejected() {
        let mut rows = rows_for(Standard::WeightForAge, 5.0);
        rows[10].m = 0.0;
        let result = ReferenceTable::new(Standard::WeightForAge, Sex::Male, rows);
        assert!(matches!(result, Err(GrowthError::MalformedTable { .. })));
    }

    #[test]
    fn non_positive_cv_rejected() {
        let mut rows = rows_for(Standard::WeightForAge, 5.0);
        rows[3].s = -0.1;
        let result = ReferenceTable::new(Standard::WeightForAge, Sex::Female, rows);
        assert!(matches!(result, Err(GrowthError::MalformedTable { .. })));
    }

    #[test]
    fn gap_in_keys_rejected() {
        let mut rows = rows_for(Standard::HeadCircumferenceForAge, 40.0);
        rows.remove(30);
        let result = ReferenceTable::new(Standard::HeadCircumferenceForAge, Sex::Male, rows);
        assert!(matches!(result, Err(GrowthError::MalformedTable { .. })));
    }

    #[test]
    fn short_domain_rejected() {
        let mut rows = rows_for(Standard::WeightForHeight, 12.0);
        rows.pop();
        let result = ReferenceTable::new(Standard::WeightForHeight, Sex::Male, rows);
        assert!(matches!(result, Err(GrowthError::MalformedTable { .. })));
    }

    #[test]
    fn unsorted_keys_rejected() {
        let mut rows = rows_for(Standard::LengthForAge, 60.0);
        rows.swap(4, 5);
        let result = ReferenceTable::new(Standard::LengthForAge, Sex::Female, rows);
        assert!(matches!(result, Err(GrowthError::MalformedTable { .. })));
    }

    #[test]
    fn csv_with_bad_number_is_csv_error() {
        let data = b"key,l,m,s\n0,1,abc,0.1\n";
        let result = ReferenceTable::from_csv(Standard::WeightForAge, Sex::Male, "bad.csv", data);
        assert!(matches!(result, Err(GrowthError::Csv { .. })));
    }

    #[test]
    fn incomplete_set_reports_missing_table() {
        let tables = vec![
            ReferenceTable::new(
                Standard::WeightForAge,
                Sex::Male,
                rows_for(Standard::WeightForAge, 5.0),
            )
            .unwrap(),
        ];
        let result = ReferenceSet::from_tables(tables, ReferenceSource::Custom);
        assert!(matches!(
            result,
            Err(GrowthError::MissingTable {
                standard: Standard::WeightForAge,
                sex: Sex::Female
            })
        ));
    }

    #[test]
    fn duplicate_table_rejected() {
        let table = ReferenceTable::new(
            Standard::WeightForAge,
            Sex::Male,
            rows_for(Standard::WeightForAge, 5.0),
        )
        .unwrap();
        let result =
            ReferenceSet::from_tables(vec![table.clone(), table], ReferenceSource::Custom);
        assert!(matches!(result, Err(GrowthError::MalformedTable { .. })));
    }

    #[test]
    fn row_at_finds_exact_keys() {
        let set = ReferenceSet::embedded().unwrap();
        let table = set.table(Standard::WeightForAge, Sex::Male);
        let row = table.row_at(6.0).unwrap();
        assert!((row.m - 7.934).abs() < 1e-9);
        assert!(table.row_at(6.5).is_none());
    }

    #[test]
    fn canonical_text_is_stable() {
        let a = ReferenceSet::embedded().unwrap();
        let b = ReferenceSet::embedded().unwrap();
        assert_eq!(a.canonical_text(), b.canonical_text());
        assert!(a.canonical_text().starts_with("wfa,boys\n"));
    }

    fn with_perturbed_median(set: &ReferenceSet, delta: f64) -> ReferenceSet {
        let tables = set
            .tables()
            .map(|table| {
                let mut rows = table.rows().to_vec();
                if table.standard() == Standard::WeightForAge && table.sex() == Sex::Male {
                    rows[6].m += delta;
                }
                ReferenceTable::new(table.standard(), table.sex(), rows).unwrap()
            })
            .collect();
        ReferenceSet::from_tables(tables, ReferenceSource::Custom).unwrap()
    }

    #[test]
    fn canonical_text_keeps_every_digit() {
        let set = ReferenceSet::embedded().unwrap();
        let nudged = with_perturbed_median(&set, 4e-7);
        assert_ne!(set.canonical_text(), nudged.canonical_text());
        assert!(set.canonical_text().contains("\n6,0.1257,7.934,0.10958\n"));
    }

    #[cfg(feature = "crypto-hash")]
    #[test]
    fn fingerprint_tracks_small_changes() {
        let set = ReferenceSet::embedded().unwrap();
        let nudged = with_perturbed_median(&set, 4e-7);
        assert_ne!(set.fingerprint(), nudged.fingerprint());
    }

    #[cfg(feature = "crypto-hash")]
    #[test]
    fn fingerprint_is_hex_digest() {
        let set = ReferenceSet::embedded().unwrap();
        let fp = set.fingerprint();
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
