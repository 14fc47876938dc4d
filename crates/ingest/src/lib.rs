use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracksym_core::{Point2, TrackId, TrackSet, Trajectory, TrajectoryError};
use tracksym_trackspec::{ScenarioSpec, SpecError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngestError {
    Io {
        path: PathBuf,
        message: String,
    },
    Layout(SpecError),
    Csv {
        line: Option<u64>,
        message: String,
    },
    ColumnCount {
        line: u64,
        found: usize,
    },
    InvalidTrackId {
        line: u64,
        value: String,
    },
    InvalidNumber {
        line: u64,
        column: &'static str,
        value: String,
    },
    NonFiniteNumber {
        line: u64,
        column: &'static str,
        value: String,
    },
    Trajectory(TrajectoryError),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => {
                write!(f, "failed to read {}: {}", path.display(), message)
            }
            Self::Layout(err) => write!(f, "invalid input layout: {}", err),
            Self::Csv { line, message } => match line {
                Some(line) => write!(f, "malformed record at line {}: {}", line, message),
                None => write!(f, "malformed input: {}", message),
            },
            Self::ColumnCount { line, found } => write!(
                f,
                "line {} has {} columns; expected track;x;y or track;time;x;y",
                line, found
            ),
            Self::InvalidTrackId { line, value } => {
                write!(f, "line {}: track id {:?} is not a whole number", line, value)
            }
            Self::InvalidNumber {
                line,
                column,
                value,
            } => write!(
                f,
                "line {}: {} value {:?} is not a number",
                line, column, value
            ),
            Self::NonFiniteNumber {
                line,
                column,
                value,
            } => write!(
                f,
                "line {}: {} value {:?} is not finite",
                line, column, value
            ),
            Self::Trajectory(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<SpecError> for IngestError {
    fn from(value: SpecError) -> Self {
        IngestError::Layout(value)
    }
}

impl From<TrajectoryError> for IngestError {
    fn from(value: TrajectoryError) -> Self {
        IngestError::Trajectory(value)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct IngestReport {
    pub tracks: TrackSet,
    pub rows_read: usize,
    pub rows_skipped: usize,
}

#[derive(Clone, Copy)]
struct ColumnMap {
    track: usize,
    x: usize,
    y: usize,
}

impl ColumnMap {
    fn for_width(width: usize) -> Option<Self> {
        match width {
            3 => Some(Self {
                track: 0,
                x: 1,
                y: 2,
            }),
            // Time column is ignored.
            4 => Some(Self {
                track: 0,
                x: 2,
                y: 3,
            }),
            _ => None,
        }
    }
}

pub fn read_tracks(path: &Path, spec: &ScenarioSpec) -> Result<IngestReport, IngestError> {
    let file = File::open(path).map_err(|err| IngestError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    let report = read_tracks_from_reader(file, spec)?;
    debug!(
        path = %path.display(),
        tracks = report.tracks.len(),
        rows = report.rows_read,
        skipped = report.rows_skipped,
        "loaded track file"
    );
    Ok(report)
}

pub fn read_tracks_from_reader<R: Read>(
    reader: R,
    spec: &ScenarioSpec,
) -> Result<IngestReport, IngestError> {
    let delimiter = spec.delimiter_byte()?;
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(spec.has_header)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut samples: BTreeMap<TrackId, Vec<Point2>> = BTreeMap::new();
    let mut rows_read = 0usize;
    let mut rows_skipped = 0usize;

    for result in csv_reader.records() {
        let record = result.map_err(|err| IngestError::Csv {
            line: err.position().map(|p| p.line()),
            message: err.to_string(),
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        rows_read += 1;

        let columns = ColumnMap::for_width(record.len()).ok_or(IngestError::ColumnCount {
            line,
            found: record.len(),
        })?;
        let raw_track = record.get(columns.track).unwrap_or("");
        let raw_x = record.get(columns.x).unwrap_or("");
        let raw_y = record.get(columns.y).unwrap_or("");

        if raw_track.is_empty() || raw_x.is_empty() || raw_y.is_empty() {
            warn!(line, "skipping row with a missing value");
            rows_skipped += 1;
            continue;
        }

        let track = parse_track_id(raw_track).ok_or_else(|| IngestError::InvalidTrackId {
            line,
            value: raw_track.to_string(),
        })?;
        let x = parse_coordinate(raw_x).map_err(|err| err.at(line, "x", raw_x))?;
        let y = parse_coordinate(raw_y).map_err(|err| err.at(line, "y", raw_y))?;
        let (Some(x), Some(y)) = (x, y) else {
            warn!(line, track, "skipping row with a NaN coordinate");
            rows_skipped += 1;
            continue;
        };

        samples.entry(track).or_default().push([x, y]);
    }

    let mut tracks = TrackSet::new();
    for (id, points) in samples {
        tracks.insert(Trajectory::new(id, points)?);
    }

    Ok(IngestReport {
        tracks,
        rows_read,
        rows_skipped,
    })
}

fn parse_track_id(raw: &str) -> Option<TrackId> {
    if let Ok(id) = raw.parse::<TrackId>() {
        return Some(id);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.fract() == 0.0 && value >= 0.0 && value <= TrackId::MAX as f64 {
        Some(value as TrackId)
    } else {
        None
    }
}

enum NumberError {
    Invalid,
    NonFinite,
}

impl NumberError {
    fn at(self, line: u64, column: &'static str, raw: &str) -> IngestError {
        let value = raw.to_string();
        match self {
            Self::Invalid => IngestError::InvalidNumber {
                line,
                column,
                value,
            },
            Self::NonFinite => IngestError::NonFiniteNumber {
                line,
                column,
                value,
            },
        }
    }
}

// `Ok(None)` marks a NaN cell.
fn parse_coordinate(raw: &str) -> Result<Option<f64>, NumberError> {
    let value = match raw.parse::<f64>() {
        Ok(value) => value,
        Err(_) if raw.contains(',') && !raw.contains('.') => raw
            .replace(',', ".")
            .parse::<f64>()
            .map_err(|_| NumberError::Invalid)?,
        Err(_) => return Err(NumberError::Invalid),
    };
    if value.is_nan() {
        Ok(None)
    } else if value.is_finite() {
        Ok(Some(value))
    } else {
        Err(NumberError::NonFinite)
    }
}
