//! Inverse cumulative density functions and duration sampling.
//!
//! The chance-constrained LP evaluates normal quantiles many times per solve
//! (two per contingent constraint per binary-search step). Quantiles are
//! served from a memoised table per distribution: `resolution` evenly spaced
//! probabilities spanning `[0.003, 0.997]`, filled with the exact quantile
//! function and interpolated linearly on lookup. Probabilities outside the
//! tabulated span clamp to its endpoints, so the 0.3%/99.7% truncation limits
//! used by the solvers fall out of the representation itself.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use rand::Rng;
use rand_distr::{Distribution, Normal};
use statrs::distribution::ContinuousCDF;

/// Attempts at drawing a non-negative sample before clamping to zero.
pub const MAX_RESAMPLE: usize = 10;

/// Lowest tabulated probability.
pub const QUANTILE_FLOOR: f64 = 0.003;

/// Highest tabulated probability.
pub const QUANTILE_CEILING: f64 = 0.997;

/// Default number of points in a quantile table.
pub const DEFAULT_RESOLUTION: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TableKey {
    mean_bits: u64,
    std_dev_bits: u64,
    resolution: usize,
    allow_negative: bool,
}

#[derive(Debug)]
struct QuantileTable {
    values: Vec<f64>,
}

impl QuantileTable {
    fn build(mean: f64, std_dev: f64, resolution: usize, allow_negative: bool) -> Self {
        let normal = statrs::distribution::Normal::new(mean, std_dev)
            .expect("standard deviation checked positive before table construction");
        let steps = resolution.max(2);
        let span = QUANTILE_CEILING - QUANTILE_FLOOR;
        let values = (0..steps)
            .map(|k| {
                let p = QUANTILE_FLOOR + span * k as f64 / (steps - 1) as f64;
                let quantile = normal.inverse_cdf(p);
                if allow_negative {
                    quantile
                } else {
                    quantile.max(0.0)
                }
            })
            .collect();
        Self { values }
    }

    fn lookup(&self, probability: f64) -> f64 {
        let clamped = probability.clamp(QUANTILE_FLOOR, QUANTILE_CEILING);
        let span = QUANTILE_CEILING - QUANTILE_FLOOR;
        let position = (clamped - QUANTILE_FLOOR) / span * (self.values.len() - 1) as f64;
        let below = position.floor() as usize;
        let above = position.ceil() as usize;
        if below == above {
            return self.values[below];
        }
        let fraction = position - below as f64;
        self.values[below] * (1.0 - fraction) + self.values[above] * fraction
    }
}

fn tables() -> &'static Mutex<HashMap<TableKey, Arc<QuantileTable>>> {
    static TABLES: OnceLock<Mutex<HashMap<TableKey, Arc<QuantileTable>>>> = OnceLock::new();
    TABLES.get_or_init(|| Mutex::new(HashMap::new()))
}

fn table_for(mean: f64, std_dev: f64, resolution: usize, allow_negative: bool) -> Arc<QuantileTable> {
    let key = TableKey {
        mean_bits: mean.to_bits(),
        std_dev_bits: std_dev.to_bits(),
        resolution,
        allow_negative,
    };
    let mut cache = tables().lock().expect("quantile table lock poisoned");
    cache
        .entry(key)
        .or_insert_with(|| Arc::new(QuantileTable::build(mean, std_dev, resolution, allow_negative)))
        .clone()
}

/// Inverse CDF of `N(mean, std_dev)` at `probability`.
///
/// Probabilities outside `[0.003, 0.997]` clamp to the tabulated span. When
/// `allow_negative` is false the curve is clamped to `[0, inf)`, matching
/// non-negative durations. A degenerate distribution (`std_dev <= 0`)
/// collapses to its mean.
pub fn inverse_cdf_normal(
    probability: f64,
    mean: f64,
    std_dev: f64,
    resolution: usize,
    allow_negative: bool,
) -> f64 {
    if std_dev <= 0.0 {
        return if allow_negative { mean } else { mean.max(0.0) };
    }
    table_for(mean, std_dev, resolution, allow_negative).lookup(probability)
}

/// Inverse CDF of `U(lower, upper)` at `probability`.
///
/// Out-of-range probabilities saturate to the corresponding infinity.
pub fn inverse_cdf_uniform(probability: f64, lower: f64, upper: f64) -> f64 {
    if probability < 0.0 {
        f64::NEG_INFINITY
    } else if probability > 1.0 {
        f64::INFINITY
    } else {
        lower + probability * (upper - lower)
    }
}

/// Draws a duration from `N(mean, std_dev)`.
///
/// Resamples up to [`MAX_RESAMPLE`] times to obtain a non-negative value,
/// then clamps to zero.
pub fn sample_normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return mean.max(0.0);
    }
    let normal = Normal::new(mean, std_dev).expect("standard deviation checked positive");
    for _ in 0..=MAX_RESAMPLE {
        let sample = normal.sample(rng);
        if sample >= 0.0 {
            return sample;
        }
    }
    0.0
}

/// Draws a duration from `U(lower, upper)`.
pub fn sample_uniform<R: Rng + ?Sized>(rng: &mut R, lower: f64, upper: f64) -> f64 {
    if lower >= upper {
        return lower;
    }
    rng.gen_range(lower..upper)
}
