//! Artist-derived audio features.
//!
//! When no provider has features for a track, an approximation is built
//! from the artist's top tracks that already have features stored locally:
//! numeric fields are averaged, categorical fields take the most common value.

use std::collections::BTreeMap;

use super::domain::AudioFeatures;

/// Overlapping tracks needed before an average is trusted
pub const MIN_SAMPLE_SIZE: usize = 3;

/// Outcome of deriving features from a set of samples
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedFeatures {
    Derived {
        features: AudioFeatures,
        sample_size: usize,
    },
    InsufficientData {
        available: usize,
    },
}

/// Average `samples` if there are at least [`MIN_SAMPLE_SIZE`] of them.
pub fn derive_features(samples: &[AudioFeatures]) -> DerivedFeatures {
    if samples.len() < MIN_SAMPLE_SIZE {
        return DerivedFeatures::InsufficientData {
            available: samples.len(),
        };
    }
    DerivedFeatures::Derived {
        features: average_features(samples),
        sample_size: samples.len(),
    }
}

/// Mean of every numeric field and mode of key, mode and time signature.
///
/// # Panics
///
/// Panics if `samples` is empty.
pub fn average_features(samples: &[AudioFeatures]) -> AudioFeatures {
    assert!(!samples.is_empty(), "cannot average an empty feature set");

    let mean = |field: fn(&AudioFeatures) -> f64| {
        samples.iter().map(field).sum::<f64>() / samples.len() as f64
    };

    AudioFeatures {
        acousticness: mean(|f| f.acousticness),
        danceability: mean(|f| f.danceability),
        energy: mean(|f| f.energy),
        instrumentalness: mean(|f| f.instrumentalness),
        liveness: mean(|f| f.liveness),
        loudness: mean(|f| f.loudness),
        speechiness: mean(|f| f.speechiness),
        tempo: mean(|f| f.tempo),
        valence: mean(|f| f.valence),
        key: most_common(samples.iter().filter_map(|f| f.key)),
        mode: most_common(samples.iter().filter_map(|f| f.mode)),
        time_signature: most_common(samples.iter().filter_map(|f| f.time_signature)),
    }
}

/// Most frequent value; ties go to the smallest.
fn most_common(values: impl Iterator<Item = i32>) -> Option<i32> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_default() += 1;
    }
    // BTreeMap iterates ascending, so the first max wins ties
    let mut best: Option<(i32, usize)> = None;
    for (value, count) in counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}
