//! Ingestion of the obstacle map ("colliders") text source: a geodetic home
//! header, one column-name line, then comma-separated rows of six doubles
//! per obstacle.

use std::fs;
use std::path::Path;

use log::info;
use thiserror::Error;

use crate::ObstacleRecord;

#[derive(Debug, Error)]
pub enum ColliderError {
    #[error("missing geodetic home header line")]
    MissingHomeHeader,
    #[error("malformed home header {0:?}")]
    MalformedHomeHeader(String),
    #[error("line {line}: expected 6 comma-separated values, found {found}")]
    WrongFieldCount { line: usize, found: usize },
    #[error("line {line}: {value:?} is not a number")]
    BadNumber { line: usize, value: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Geodetic reference parsed from the home header. Consumed by the external
/// coordinate-conversion layer, not by the planner itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HomePosition {
    pub lat: f64,
    pub lon: f64,
}

/// A parsed obstacle source: the home reference plus every obstacle record.
#[derive(Clone, Debug)]
pub struct ColliderMap {
    pub home: HomePosition,
    pub obstacles: Vec<ObstacleRecord>,
}

/// Parses a colliders source. The first line must look like
/// `lat0 37.792480, lon0 -122.397450`, the second line is a column header
/// and is skipped, every following non-empty line is one obstacle record.
pub fn parse_colliders(input: &str) -> Result<ColliderMap, ColliderError> {
    let mut lines = input.lines();
    let header = lines.next().ok_or(ColliderError::MissingHomeHeader)?;
    let home = parse_home(header)?;
    // Column header line.
    lines.next();

    let mut obstacles = Vec::new();
    for (index, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        // Lines are 1-based and two header lines precede the records.
        obstacles.push(parse_record(line, index + 3)?);
    }
    info!("parsed {} obstacle records", obstacles.len());
    Ok(ColliderMap { home, obstacles })
}

/// Reads and parses a colliders file.
pub fn load_colliders<P: AsRef<Path>>(path: P) -> Result<ColliderMap, ColliderError> {
    parse_colliders(&fs::read_to_string(path)?)
}

fn parse_home(header: &str) -> Result<HomePosition, ColliderError> {
    let mut fields = header.split(',');
    let lat = home_value(fields.next(), header)?;
    let lon = home_value(fields.next(), header)?;
    Ok(HomePosition { lat, lon })
}

/// A home field is a label and a value, e.g. `lat0 37.792480`.
fn home_value(field: Option<&str>, header: &str) -> Result<f64, ColliderError> {
    field
        .and_then(|f| f.split_whitespace().nth(1))
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| ColliderError::MalformedHomeHeader(header.to_string()))
}

fn parse_record(line: &str, line_number: usize) -> Result<ObstacleRecord, ColliderError> {
    let fields = line.split(',').map(str::trim).collect::<Vec<&str>>();
    if fields.len() != 6 {
        return Err(ColliderError::WrongFieldCount {
            line: line_number,
            found: fields.len(),
        });
    }
    let mut values = [0.0f64; 6];
    for (value, field) in values.iter_mut().zip(&fields) {
        *value = field.parse().map_err(|_| ColliderError::BadNumber {
            line: line_number,
            value: (*field).to_string(),
        })?;
    }
    Ok(ObstacleRecord::new(
        values[0], values[1], values[2], values[3], values[4], values[5],
    ))
}
