use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use serde::Serialize;

use crate::estimator::ModelParams;
use crate::sample::Dataset;

/// One scatter point and the fitted line evaluated at its `x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitRow {
    pub x: f64,
    pub y: f64,
    pub fitted: f64,
}

/// Points sorted by `x`, ready to draw as a scatter with the regression line.
pub fn fit_rows(dataset: &Dataset, params: ModelParams) -> Vec<FitRow> {
    let mut rows: Vec<FitRow> = dataset
        .iter()
        .map(|s| FitRow {
            x: s.x,
            y: s.y,
            fitted: params.predict(s.x),
        })
        .collect();
    rows.sort_by(|a, b| a.x.total_cmp(&b.x));
    rows
}

pub fn write_fit<W: Write>(writer: W, dataset: &Dataset, params: ModelParams) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in fit_rows(dataset, params) {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_fit_file(
    path: impl AsRef<Path>,
    dataset: &Dataset,
    params: ModelParams,
) -> Result<(), csv::Error> {
    let file = File::create(path)?;
    write_fit(BufWriter::new(file), dataset, params)
}
