use serde::{Deserialize, Serialize};
use std::fmt;

pub type TrackId = u32;

pub const REFERENCE_TRACK_IDS: [TrackId; 4] = [1, 2, 3, 4];
pub const THREE_TRACK_IDS: [TrackId; 3] = [1, 2, 3];
pub const DEFAULT_DELIMITER: char = ';';

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackPair {
    pub first: TrackId,
    pub second: TrackId,
}

impl TrackPair {
    pub fn new(first: TrackId, second: TrackId) -> Self {
        Self { first, second }
    }
}

impl fmt::Display for TrackPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpecError {
    TooFewTracks { count: usize },
    DuplicateTrack { id: TrackId },
    NonAsciiDelimiter { delimiter: char },
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewTracks { count } => {
                write!(f, "scenario needs at least 2 track ids, got {}", count)
            }
            Self::DuplicateTrack { id } => write!(f, "track id {} listed more than once", id),
            Self::NonAsciiDelimiter { delimiter } => {
                write!(f, "delimiter {:?} must be a single ASCII character", delimiter)
            }
        }
    }
}

impl std::error::Error for SpecError {}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScenarioSpec {
    pub track_ids: Vec<TrackId>,
    pub delimiter: char,
    pub has_header: bool,
}

impl Default for ScenarioSpec {
    fn default() -> Self {
        Self::reference()
    }
}

impl ScenarioSpec {
    pub fn reference() -> Self {
        Self {
            track_ids: REFERENCE_TRACK_IDS.to_vec(),
            delimiter: DEFAULT_DELIMITER,
            has_header: true,
        }
    }

    pub fn three_track() -> Self {
        Self {
            track_ids: THREE_TRACK_IDS.to_vec(),
            ..Self::reference()
        }
    }

    // Every unordered pair, in listing order: (a, b) with a listed before b.
    pub fn pairs(&self) -> Vec<TrackPair> {
        let ids = &self.track_ids;
        let mut out = Vec::with_capacity(ids.len() * ids.len().saturating_sub(1) / 2);
        for (i, &first) in ids.iter().enumerate() {
            for &second in &ids[i + 1..] {
                out.push(TrackPair::new(first, second));
            }
        }
        out
    }

    pub fn delimiter_byte(&self) -> Result<u8, SpecError> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(SpecError::NonAsciiDelimiter {
                delimiter: self.delimiter,
            })
        }
    }

    pub fn validate(&self) -> Result<(), SpecError> {
        if self.track_ids.len() < 2 {
            return Err(SpecError::TooFewTracks {
                count: self.track_ids.len(),
            });
        }
        for (i, id) in self.track_ids.iter().enumerate() {
            if self.track_ids[..i].contains(id) {
                return Err(SpecError::DuplicateTrack { id: *id });
            }
        }
        self.delimiter_byte()?;
        Ok(())
    }
}
