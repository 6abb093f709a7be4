//! CSV panel loader.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, info, warn};

use hyrank_common::ranking_config::DataConfig;
use hyrank_common::{HyrankError, Result};

/// A loaded, fully numeric panel. Columns are kept in file order.
#[derive(Debug, Clone)]
pub struct Panel {
    row_labels: Vec<String>,
    dates: Option<Vec<NaiveDate>>,
    columns: Vec<String>,
    /// Column-major values: `data[j][i]` is row i of column j
    data: Vec<Vec<f64>>,
}

impl Panel {
    /// Build a panel from in-memory columns.
    pub fn from_columns(row_labels: Vec<String>, columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let n = row_labels.len();
        let mut seen = HashSet::new();
        for (name, col) in &columns {
            if col.len() != n {
                return Err(HyrankError::InputContract(format!(
                    "column '{name}' has {} rows, expected {n}",
                    col.len()
                )));
            }
            if !seen.insert(name.clone()) {
                return Err(HyrankError::InputContract(format!("duplicate column '{name}'")));
            }
        }
        let (names, data) = columns.into_iter().unzip();
        Ok(Self { row_labels, dates: None, columns: names, data })
    }

    pub fn n_rows(&self) -> usize {
        self.row_labels.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn dates(&self) -> Option<&[NaiveDate]> {
        self.dates.as_deref()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|j| self.data[j].as_slice())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Column names paired with their values, in file order.
    pub fn iter_columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.data.iter().map(Vec::as_slice))
    }

    /// Parse row labels as dates. All-or-nothing: a single unparsable label
    /// leaves the panel without a date index.
    fn index_dates(&mut self, format: &str) {
        let parsed: std::result::Result<Vec<NaiveDate>, _> = self
            .row_labels
            .iter()
            .map(|l| NaiveDate::parse_from_str(l.trim(), format))
            .collect();
        match parsed {
            Ok(dates) => self.dates = Some(dates),
            Err(e) => debug!("Row labels are not '{format}' dates ({e}); panel has no date index"),
        }
    }
}

/// Reads feature panels written by the upstream feature-engineering scripts.
pub struct PanelLoader {
    date_column: String,
    date_format: String,
    optional_columns: Vec<String>,
}

impl PanelLoader {
    pub fn new(config: &DataConfig) -> Self {
        Self {
            date_column: config.date_column.clone(),
            date_format: config.date_format.clone(),
            optional_columns: config.optional_columns.clone(),
        }
    }

    /// Load a panel from a CSV file.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Panel> {
        let path = path.as_ref();
        debug!("Loading panel from {:?}", path);
        let file = std::fs::File::open(path)?;
        let panel = self.from_reader(file)?;
        info!(
            "Loaded panel {:?}: {} rows, {} columns",
            path,
            panel.n_rows(),
            panel.columns.len()
        );
        Ok(panel)
    }

    /// Load a panel from any CSV source. The row-label column is the one named
    /// `date_column`, or the first column when no header matches.
    pub fn from_reader<R: Read>(&self, reader: R) -> Result<Panel> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        if headers.len() < 2 {
            return Err(HyrankError::InputContract(
                "panel needs a row-label column and at least one value column".into(),
            ));
        }

        let label_idx = headers.iter().position(|h| *h == self.date_column).unwrap_or(0);
        let value_cols: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != label_idx)
            .map(|(j, h)| (j, h.clone()))
            .collect();

        let mut seen = HashSet::new();
        for (_, name) in &value_cols {
            if !seen.insert(name.as_str()) {
                return Err(HyrankError::InputContract(format!("duplicate column '{name}'")));
            }
        }

        let mut row_labels = Vec::new();
        let mut data: Vec<Vec<f64>> = vec![Vec::new(); value_cols.len()];

        for (row, result) in reader.records().enumerate() {
            let record = result?;
            let label = record.get(label_idx).unwrap_or_default().trim().to_string();

            for (k, (j, name)) in value_cols.iter().enumerate() {
                let cell = record.get(*j).unwrap_or_default().trim();
                if cell.is_empty() {
                    return Err(HyrankError::InputContract(format!(
                        "missing value at row {row} ('{label}'), column '{name}'"
                    )));
                }
                let value: f64 = cell.parse().map_err(|_| {
                    HyrankError::InputContract(format!(
                        "non-numeric value '{cell}' at row {row} ('{label}'), column '{name}'"
                    ))
                })?;
                if !value.is_finite() {
                    return Err(HyrankError::InputContract(format!(
                        "non-finite value '{cell}' at row {row} ('{label}'), column '{name}'"
                    )));
                }
                data[k].push(value);
            }
            row_labels.push(label);
        }

        let mut panel = Panel {
            row_labels,
            dates: None,
            columns: value_cols.into_iter().map(|(_, n)| n).collect(),
            data,
        };
        self.fill_optional(&mut panel);
        panel.index_dates(&self.date_format);
        Ok(panel)
    }

    /// Zero-fill declared optional columns that the file does not carry.
    fn fill_optional(&self, panel: &mut Panel) {
        for name in &self.optional_columns {
            if !panel.has_column(name) {
                warn!(
                    column = name.as_str(),
                    rows = panel.n_rows(),
                    "Optional column absent from panel; filling with 0.0"
                );
                panel.columns.push(name.clone());
                panel.data.push(vec![0.0; panel.n_rows()]);
            }
        }
    }
}

/// Compile `exclude_columns` patterns.
pub fn compile_excludes(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p)
                .map_err(|e| HyrankError::Config(format!("invalid exclude pattern '{p}': {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
date,XLY_mom_20,VIX_z,HYG_ret
2024-01-02,0.5,1.2,0.001
2024-01-03,-0.1,0.8,-0.002
2024-01-04,0.2,0.3,0.003
";

    fn loader() -> PanelLoader {
        PanelLoader::new(&DataConfig::default())
    }

    #[test]
    fn test_loads_columns_and_dates() {
        let panel = loader().from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(panel.n_rows(), 3);
        assert_eq!(panel.columns(), &["XLY_mom_20", "VIX_z", "HYG_ret"]);
        assert_eq!(panel.column("VIX_z").unwrap(), &[1.2, 0.8, 0.3]);
        assert_eq!(
            panel.dates().unwrap()[0],
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
    }

    #[test]
    fn test_missing_cell_names_row_and_column() {
        let csv = "date,a,b\n2024-01-02,1.0,\n";
        let err = loader().from_reader(csv.as_bytes()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("row 0"), "{msg}");
        assert!(msg.contains("'b'"), "{msg}");
    }

    #[test]
    fn test_non_numeric_rejected() {
        let csv = "date,a\n2024-01-02,abc\n";
        assert!(matches!(
            loader().from_reader(csv.as_bytes()),
            Err(HyrankError::InputContract(_))
        ));
    }

    #[test]
    fn test_non_date_labels_leave_no_index() {
        let csv = "obs,a\nfirst,1.0\nsecond,2.0\n";
        let panel = loader().from_reader(csv.as_bytes()).unwrap();
        assert!(panel.dates().is_none());
        assert_eq!(panel.row_labels(), &["first", "second"]);
    }

    #[test]
    fn test_optional_column_zero_filled() {
        let cfg = DataConfig { optional_columns: vec!["MGK_mom_5".into()], ..Default::default() };
        let panel = PanelLoader::new(&cfg).from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(panel.column("MGK_mom_5").unwrap(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_bad_exclude_pattern() {
        assert!(compile_excludes(&["(".to_string()]).is_err());
        assert_eq!(compile_excludes(&["^raw_".to_string()]).unwrap().len(), 1);
    }
}
