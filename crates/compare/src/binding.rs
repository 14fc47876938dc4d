use crate::{blake3_hex, jcs_bytes};
use serde::Serialize;
use tracksym_core::{Point2, TrackId, TrackSet};

#[derive(Serialize)]
struct CanonicalTrack<'a> {
    id: TrackId,
    points: &'a [Point2],
}

#[derive(Serialize)]
struct CanonicalInputs<'a> {
    v: u8,
    tracks: Vec<CanonicalTrack<'a>>,
}

pub fn compute_inputs_hash(tracks: &TrackSet) -> Result<String, serde_json::Error> {
    let canonical = CanonicalInputs {
        v: 1,
        tracks: tracks
            .iter()
            .map(|t| CanonicalTrack {
                id: t.id(),
                points: t.points(),
            })
            .collect(),
    };
    Ok(blake3_hex(&jcs_bytes(&canonical)?))
}
