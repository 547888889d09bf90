use std::fmt::Display;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use ndarray::Array1;
use regex::Regex;
use tracing::debug;

use crate::align::select;
use crate::error::{Error, Result};

pub const TIME_COLUMN: &str = "times";
pub const VALUE_COLUMN: &str = "vals";

lazy_static! {
    static ref MSID_FILE_RE: Regex =
        Regex::new(r"^(?P<msid>.+?)_(?P<cadence>5min|daily|full)(?:_(?P<span>.+))?$").unwrap();
}

/// Sampling of an exported MSID file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// 5 minute statistics: `times`, `vals`, `mins`, `maxes`, `means`, ...
    FiveMin,
    Daily,
    /// Full resolution: `times`, `vals`
    Full,
}

/// Components of an MSID export file name, e.g., `2CE00ATM_5min_lifetime.csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsidFile {
    pub msid: String,
    pub cadence: Cadence,
    pub span: Option<String>,
}

impl MsidFile {
    pub fn parse<P: AsRef<Path>>(path: P) -> Option<Self> {
        let stem = path.as_ref().file_stem()?.to_str()?;
        let caps = MSID_FILE_RE.captures(stem)?;
        let cadence = match &caps["cadence"] {
            "5min" => Cadence::FiveMin,
            "daily" => Cadence::Daily,
            _ => Cadence::Full,
        };
        Some(Self {
            msid: caps["msid"].to_string(),
            cadence,
            span: caps.name("span").map(|m| m.as_str().to_string()),
        })
    }
}

/// Best guess at the MSID for a file; the parsed name or the file stem.
pub fn msid_from_path<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();
    match MsidFile::parse(path) {
        Some(file) => file.msid,
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default(),
    }
}

/// A telemetry channel: sample times in mission seconds and one value column.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub msid: String,
    pub times: Array1<f64>,
    pub values: Array1<f64>,
}

impl Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Channel{{msid={} samples={}}}", self.msid, self.len())
    }
}

impl Channel {
    /// # Errors
    /// If `times` and `values` differ in length or are empty.
    pub fn new(msid: &str, times: Array1<f64>, values: Array1<f64>) -> Result<Self> {
        if times.len() != values.len() {
            return Err(Error::LengthMismatch {
                what: "channel values",
                expected: times.len(),
                actual: values.len(),
            });
        }
        if times.is_empty() {
            return Err(Error::EmptyChannel(msid.to_string()));
        }
        Ok(Self {
            msid: msid.to_string(),
            times,
            values,
        })
    }

    /// Read a channel from a CSV with a header row naming its columns.
    ///
    /// Times must be finite. Values may be `nan`.
    pub fn from_csv<P: AsRef<Path>>(
        msid: &str,
        path: P,
        time_column: &str,
        value_column: &str,
    ) -> Result<Self> {
        let path = path.as_ref();
        let mut columns = read_columns(path, &[time_column, value_column])?;
        let values = columns.pop().unwrap_or_default();
        let times = columns.pop().unwrap_or_default();
        check_finite(path, time_column, &times)?;

        let channel = Self::new(msid, Array1::from(times), Array1::from(values))?;
        match MsidFile::parse(path) {
            Some(file) => debug!(
                "loaded {channel} from {path:?}, {:?} cadence, span {}",
                file.cadence,
                file.span.as_deref().unwrap_or("unknown")
            ),
            None => debug!("loaded {channel} from {path:?}"),
        }
        Ok(channel)
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Keep only the samples where `mask` is true.
    pub fn select(&self, mask: &[bool]) -> Result<Self> {
        Ok(Self {
            msid: self.msid.clone(),
            times: select(self.times.view(), mask)?,
            values: select(self.values.view(), mask)?,
        })
    }

    /// Multiply values by `factor`, e.g., 0.001 for meters to kilometers.
    #[must_use]
    pub fn scaled(mut self, factor: f64) -> Self {
        if factor != 1.0 {
            self.values.mapv_inplace(|v| v * factor);
        }
        self
    }
}

/// Read the named float columns from a CSV file, in the order requested.
///
/// Row numbers in errors count data rows starting at 1.
pub fn read_columns(path: &Path, names: &[&str]) -> Result<Vec<Vec<f64>>> {
    let csv_err = |source| Error::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let headers = reader.headers().map_err(csv_err)?.clone();
    let mut indexes = Vec::with_capacity(names.len());
    for name in names {
        let Some(idx) = headers.iter().position(|h| h == *name) else {
            return Err(Error::MissingColumn {
                path: path.to_path_buf(),
                column: (*name).to_string(),
            });
        };
        indexes.push(idx);
    }

    let mut columns: Vec<Vec<f64>> = vec![Vec::default(); names.len()];
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        for (col, idx) in indexes.iter().enumerate() {
            let raw = record.get(*idx).unwrap_or_default();
            let value: f64 = raw.parse().map_err(|_| Error::InvalidValue {
                path: path.to_path_buf(),
                row: row + 1,
                column: names[col].to_string(),
                value: raw.to_string(),
            })?;
            columns[col].push(value);
        }
    }

    Ok(columns)
}

/// Read a column of mission times from a CSV file.
///
/// # Errors
/// [Error::InvalidValue] for the first time that is not finite, in addition to the errors of
/// [read_columns].
pub fn read_times(path: &Path, column: &str) -> Result<Vec<f64>> {
    let mut columns = read_columns(path, &[column])?;
    let times = columns.pop().unwrap_or_default();
    check_finite(path, column, &times)?;
    Ok(times)
}

fn check_finite(path: &Path, column: &str, times: &[f64]) -> Result<()> {
    match times.iter().position(|t| !t.is_finite()) {
        Some(row) => Err(Error::InvalidValue {
            path: path.to_path_buf(),
            row: row + 1,
            column: column.to_string(),
            value: times[row].to_string(),
        }),
        None => Ok(()),
    }
}

pub(crate) fn resolve(dir: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        dir.join(file)
    }
}
