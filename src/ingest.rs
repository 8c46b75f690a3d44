use std::{fs::File, io::Read, path::Path};

use csv::{Reader, StringRecord};
use log::{debug, warn};
use rayon::prelude::*;

use crate::error::IngestError;
use crate::sample::{Dataset, Sample};

/// Header names of the two columns to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    pub x: String,
    pub y: String,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            x: "weight".to_string(),
            y: "mpg".to_string(),
        }
    }
}

pub fn read_dataset(path: impl AsRef<Path>, columns: &Columns) -> Result<Dataset, IngestError> {
    let reader = read_csv(path.as_ref())?;
    parse_rows(reader, columns)
}

pub fn from_reader<R: Read>(rdr: R, columns: &Columns) -> Result<Dataset, IngestError> {
    parse_rows(csv::Reader::from_reader(rdr), columns)
}

fn read_csv(file: &Path) -> Result<Reader<File>, IngestError> {
    Ok(csv::Reader::from_path(file)?)
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize, IngestError> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| IngestError::MissingColumn(name.to_string()))
}

/// Parses a cell as a finite number; anything else counts as missing.
fn parse_value(cell: Option<&str>) -> Option<f64> {
    cell?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_rows<R: Read>(mut reader: Reader<R>, columns: &Columns) -> Result<Dataset, IngestError> {
    let headers = reader.headers()?.clone();
    let x_idx = column_index(&headers, &columns.x)?;
    let y_idx = column_index(&headers, &columns.y)?;

    let records = reader
        .into_records()
        .collect::<Result<Vec<StringRecord>, csv::Error>>()?;
    let total = records.len();

    let samples: Vec<Sample> = records
        .par_iter()
        .filter_map(|record| {
            let x = parse_value(record.get(x_idx))?;
            let y = parse_value(record.get(y_idx))?;
            Some(Sample::new(x, y))
        })
        .collect();

    let dropped = total - samples.len();
    if dropped > 0 {
        warn!("dropped {dropped} of {total} rows with missing or non-numeric values");
    }
    debug!("read {} samples from columns {} and {}", samples.len(), columns.x, columns.y);

    Ok(Dataset::new(samples))
}
