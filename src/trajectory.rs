use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracksym_metrics::Point2;
use tracksym_trackspec::TrackId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrajectoryError {
    NonFiniteCoordinate { track: TrackId, index: usize },
}

impl fmt::Display for TrajectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteCoordinate { track, index } => write!(
                f,
                "track {} sample {} has a non-finite coordinate",
                track, index
            ),
        }
    }
}

impl std::error::Error for TrajectoryError {}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Trajectory {
    id: TrackId,
    points: Vec<Point2>,
}

impl Trajectory {
    pub fn new(id: TrackId, points: Vec<Point2>) -> Result<Self, TrajectoryError> {
        if let Some(index) = points
            .iter()
            .position(|p| !p[0].is_finite() || !p[1].is_finite())
        {
            return Err(TrajectoryError::NonFiniteCoordinate { track: id, index });
        }
        Ok(Self { id, points })
    }

    pub fn empty(id: TrackId) -> Self {
        Self {
            id,
            points: Vec::new(),
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TrackSet {
    tracks: BTreeMap<TrackId, Trajectory>,
}

impl TrackSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, trajectory: Trajectory) {
        self.tracks.insert(trajectory.id(), trajectory);
    }

    pub fn get(&self, id: TrackId) -> Option<&Trajectory> {
        self.tracks.get(&id)
    }

    pub fn get_or_empty(&self, id: TrackId) -> Trajectory {
        self.get(id).cloned().unwrap_or_else(|| Trajectory::empty(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.tracks.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trajectory> {
        self.tracks.values()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl FromIterator<Trajectory> for TrackSet {
    fn from_iter<I: IntoIterator<Item = Trajectory>>(iter: I) -> Self {
        let mut set = Self::new();
        for trajectory in iter {
            set.insert(trajectory);
        }
        set
    }
}
