//! The 18-feature kinematic summary of a pointer path.
//!
//! Per consecutive coordinate pair: euclidean distance, velocity (floored at
//! 0.1 so downstream ratios never divide by zero), pause flag (velocity < 2),
//! acceleration (velocity delta, from the second velocity on), and direction
//! change (angle between consecutive displacement vectors, wrapped into
//! [0, pi]). Summary statistics over those series make up the vector.

use super::{FeatureVector, FEATURE_DIM};
use thiserror::Error;

/// Velocity floor; keeps velocities strictly positive.
const VELOCITY_FLOOR: f64 = 0.1;
/// Steps slower than this count as pauses.
const PAUSE_THRESHOLD: f64 = 2.0;
/// Extraction refuses to run below this many coordinates.
pub const MIN_COORDINATES: usize = 3;

#[derive(Debug, Error, PartialEq)]
pub enum ExtractionError {
    #[error("insufficient movement data: {0} coordinates, need {MIN_COORDINATES}")]
    TooFewCoordinates(usize),
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

/// Sample variance (n-1 denominator); 0 for fewer than 2 samples.
fn variance(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return 0.0;
    }
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (xs.len() - 1) as f64
}

fn std_dev(xs: &[f64]) -> f64 {
    variance(xs).sqrt()
}

fn median(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let mut sorted = xs.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn span(xs: impl Iterator<Item = f64> + Clone) -> f64 {
    let max = xs.clone().fold(f64::NEG_INFINITY, f64::max);
    let min = xs.fold(f64::INFINITY, f64::min);
    if max.is_finite() && min.is_finite() {
        max - min
    } else {
        0.0
    }
}

/// Derive the 18-dimensional feature vector from an ordered coordinate
/// sequence and a click count. Deterministic, pure; fails only when the
/// sequence is too short. Non-finite intermediate results are normalized to
/// 0.0 rather than surfaced.
pub fn extract_features(
    coords: &[(f64, f64)],
    click_count: u32,
) -> Result<FeatureVector, ExtractionError> {
    let n = coords.len();
    if n < MIN_COORDINATES {
        return Err(ExtractionError::TooFewCoordinates(n));
    }

    let mut distances = Vec::with_capacity(n - 1);
    let mut velocities = Vec::with_capacity(n - 1);
    let mut accelerations = Vec::with_capacity(n.saturating_sub(2));
    let mut direction_changes = Vec::new();
    let mut pause_count = 0u32;

    for i in 1..n {
        let (x, y) = coords[i];
        let (px, py) = coords[i - 1];
        let dx = x - px;
        let dy = y - py;
        let distance = dx.hypot(dy);
        distances.push(distance);

        let velocity = distance.max(VELOCITY_FLOOR);
        if velocity < PAUSE_THRESHOLD {
            pause_count += 1;
        }
        if let Some(&prev) = velocities.last() {
            accelerations.push(velocity - prev);
        }
        velocities.push(velocity);

        if i > 1 && distance > 0.0 {
            let (ppx, ppy) = coords[i - 2];
            let prev_dx = px - ppx;
            let prev_dy = py - ppy;
            // Direction is undefined when the previous step didn't move.
            if prev_dx != 0.0 || prev_dy != 0.0 {
                let mut angle = (dy.atan2(dx) - prev_dy.atan2(prev_dx)).abs();
                if angle > std::f64::consts::PI {
                    angle = 2.0 * std::f64::consts::PI - angle;
                }
                direction_changes.push(angle);
            }
        }
    }

    let total_distance: f64 = distances.iter().sum();
    let max_velocity = velocities.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_velocity = velocities.iter().copied().fold(f64::INFINITY, f64::min);

    let values: [f64; FEATURE_DIM] = [
        mean(&velocities),
        std_dev(&velocities),
        max_velocity,
        min_velocity,
        median(&velocities),
        mean(&accelerations),
        std_dev(&accelerations),
        mean(&direction_changes),
        std_dev(&direction_changes),
        n as f64,
        total_distance,
        f64::from(click_count),
        f64::from(pause_count),
        span(coords.iter().map(|c| c.0)),
        span(coords.iter().map(|c| c.1)),
        n as f64 / (total_distance + 1.0),
        variance(&velocities),
        total_distance / n as f64,
    ];

    Ok(FeatureVector::new(values))
}
