//! Simulated uncertainty intervals.
//!
//! Each sample path extends the fitted trend with random future rate changes
//! (drawn at the historical changepoint frequency, Laplace-distributed with
//! the historical mean magnitude) and adds Gaussian observation noise. Bounds
//! are empirical quantiles over the paths, row by row.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal, Poisson};

use ferrocast_core::ModelError;

/// Scaled model outputs the simulation perturbs.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SimulationInput<'a> {
    /// Scaled time of every row; history spans `[0, 1]`.
    pub t: &'a [f64],
    pub trend: &'a [f64],
    pub yhat: &'a [f64],
    /// Fitted changepoints per unit of scaled time.
    pub changepoint_rate: f64,
    pub mean_abs_delta: f64,
    pub noise_sd: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Bounds {
    pub trend_lower: Vec<f64>,
    pub trend_upper: Vec<f64>,
    pub yhat_lower: Vec<f64>,
    pub yhat_upper: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
struct TrendChange {
    at: f64,
    delta: f64,
}

/// One path's trend changes sorted by position, with running sums of `delta`
/// and `delta * at` so the deviation at any `t` is one binary search away.
#[derive(Debug, Clone, Default)]
struct TrendPath {
    at: Vec<f64>,
    rate: Vec<f64>,
    offset: Vec<f64>,
}

impl TrendPath {
    fn new(mut changes: Vec<TrendChange>) -> Self {
        changes.sort_by(|a, b| a.at.total_cmp(&b.at));
        let mut path = Self {
            at: Vec::with_capacity(changes.len()),
            rate: Vec::with_capacity(changes.len()),
            offset: Vec::with_capacity(changes.len()),
        };
        let (mut rate, mut offset) = (0.0, 0.0);
        for change in changes {
            rate += change.delta;
            offset += change.delta * change.at;
            path.at.push(change.at);
            path.rate.push(rate);
            path.offset.push(offset);
        }
        path
    }

    /// `Σ delta * max(t - at, 0)` over every change.
    fn deviation(&self, t: f64) -> f64 {
        match self.at.partition_point(|&at| at < t) {
            0 => 0.0,
            active => t * self.rate[active - 1] - self.offset[active - 1],
        }
    }
}

/// Quantile bounds enclosing `width` of `samples` simulated paths. The same
/// seed always yields the same bounds. Bounds never cross the point values.
pub(crate) fn simulate_bounds(
    input: SimulationInput<'_>,
    samples: usize,
    width: f64,
    seed: u64,
) -> Result<Bounds, ModelError> {
    if samples == 0 {
        return Ok(Bounds {
            trend_lower: input.trend.to_vec(),
            trend_upper: input.trend.to_vec(),
            yhat_lower: input.yhat.to_vec(),
            yhat_upper: input.yhat.to_vec(),
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let paths = sample_trend_changes(&input, samples, &mut rng)?;
    let noise = Normal::new(0.0, input.noise_sd.max(0.0))
        .map_err(|error| ModelError::DegenerateInput(error.to_string()))?;

    let lower_q = (1.0 - width) / 2.0;
    let upper_q = (1.0 + width) / 2.0;
    let rows = input.t.len();
    let mut bounds = Bounds {
        trend_lower: Vec::with_capacity(rows),
        trend_upper: Vec::with_capacity(rows),
        yhat_lower: Vec::with_capacity(rows),
        yhat_upper: Vec::with_capacity(rows),
    };

    let mut trend_samples = Vec::with_capacity(samples);
    let mut yhat_samples = Vec::with_capacity(samples);
    for row in 0..rows {
        let t = input.t[row];
        trend_samples.clear();
        yhat_samples.clear();

        for path in &paths {
            let deviation = path.deviation(t);
            trend_samples.push(input.trend[row] + deviation);
            yhat_samples.push(input.yhat[row] + deviation + noise.sample(&mut rng));
        }

        let trend = input.trend[row];
        let yhat = input.yhat[row];
        bounds
            .trend_lower
            .push(quantile(&mut trend_samples, lower_q).min(trend));
        bounds
            .trend_upper
            .push(quantile(&mut trend_samples, upper_q).max(trend));
        bounds
            .yhat_lower
            .push(quantile(&mut yhat_samples, lower_q).min(yhat));
        bounds
            .yhat_upper
            .push(quantile(&mut yhat_samples, upper_q).max(yhat));
    }

    Ok(bounds)
}

fn sample_trend_changes(
    input: &SimulationInput<'_>,
    samples: usize,
    rng: &mut StdRng,
) -> Result<Vec<TrendPath>, ModelError> {
    let horizon_end = input.t.iter().copied().fold(1.0_f64, f64::max);
    let future_span = horizon_end - 1.0;
    let expected = input.changepoint_rate * future_span;

    if !(expected > 0.0 && input.mean_abs_delta > 0.0) {
        return Ok(vec![TrendPath::default(); samples]);
    }

    let count = Poisson::new(expected)
        .map_err(|error| ModelError::DegenerateInput(error.to_string()))?;
    let magnitude = Exp::new(1.0 / input.mean_abs_delta)
        .map_err(|error| ModelError::DegenerateInput(error.to_string()))?;

    Ok((0..samples)
        .map(|_| {
            let draws: f64 = count.sample(rng);
            let changes = (0..draws as usize)
                .map(|_| {
                    let at = 1.0 + rng.gen::<f64>() * future_span;
                    let size: f64 = magnitude.sample(rng);
                    let delta = if rng.gen_bool(0.5) { size } else { -size };
                    TrendChange { at, delta }
                })
                .collect();
            TrendPath::new(changes)
        })
        .collect())
}

/// Linearly interpolated quantile; sorts `values` in place.
fn quantile(values: &mut [f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(f64::total_cmp);

    let position = q.clamp(0.0, 1.0) * (values.len() - 1) as f64;
    let below = position.floor() as usize;
    let above = position.ceil() as usize;
    if below == above {
        return values[below];
    }
    let weight = position - below as f64;
    values[below] + (values[above] - values[below]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input<'a>(t: &'a [f64], level: &'a [f64]) -> SimulationInput<'a> {
        SimulationInput {
            t,
            trend: level,
            yhat: level,
            changepoint_rate: 25.0,
            mean_abs_delta: 0.05,
            noise_sd: 0.02,
        }
    }

    #[test]
    fn quantile_interpolates_between_neighbors() {
        let mut values = vec![4.0, 1.0, 3.0, 2.0];
        assert_eq!(quantile(&mut values, 0.0), 1.0);
        assert_eq!(quantile(&mut values, 1.0), 4.0);
        assert!((quantile(&mut values, 0.5) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn zero_samples_collapse_bounds() {
        let t = [0.0, 0.5, 1.0, 1.5];
        let level = [1.0, 1.1, 1.2, 1.3];
        let bounds = simulate_bounds(input(&t, &level), 0, 0.8, 0).expect("runs");
        assert_eq!(bounds.yhat_lower, level.to_vec());
        assert_eq!(bounds.trend_upper, level.to_vec());
    }

    #[test]
    fn bounds_enclose_point_and_widen_into_future() {
        let t = [0.0, 0.5, 1.0, 1.25, 1.5];
        let level = [1.0, 1.0, 1.0, 1.0, 1.0];
        let bounds = simulate_bounds(input(&t, &level), 500, 0.8, 42).expect("runs");

        for row in 0..t.len() {
            assert!(bounds.yhat_lower[row] <= level[row]);
            assert!(level[row] <= bounds.yhat_upper[row]);
        }
        // No simulated trend change inside the history.
        assert_eq!(bounds.trend_lower[1], 1.0);
        assert_eq!(bounds.trend_upper[1], 1.0);

        let spread = |row: usize| bounds.trend_upper[row] - bounds.trend_lower[row];
        assert!(spread(4) > spread(3));
    }

    #[test]
    fn same_seed_same_bounds() {
        let t = [0.0, 1.0, 2.0];
        let level = [1.0, 2.0, 3.0];
        let first = simulate_bounds(input(&t, &level), 200, 0.95, 9).expect("runs");
        let second = simulate_bounds(input(&t, &level), 200, 0.95, 9).expect("runs");
        assert_eq!(first, second);
    }

    #[test]
    fn path_deviation_matches_direct_sum() {
        let changes = vec![
            TrendChange { at: 1.6, delta: -0.3 },
            TrendChange { at: 1.1, delta: 0.2 },
            TrendChange { at: 1.4, delta: 0.5 },
        ];
        let direct = |t: f64| -> f64 {
            changes
                .iter()
                .map(|change| change.delta * (t - change.at).max(0.0))
                .sum()
        };
        let path = TrendPath::new(changes.clone());

        for t in [0.0, 1.0, 1.1, 1.25, 1.4, 1.5, 1.6, 2.0, 3.5] {
            assert!((path.deviation(t) - direct(t)).abs() < 1e-12, "t = {t}");
        }
        assert_eq!(TrendPath::default().deviation(2.0), 0.0);
    }

    #[test]
    fn short_history_with_long_horizon_stays_bounded() {
        // 30 scaled history points then five years of daily rows: the
        // future spans ~63 history lengths, ~1500 changes per path.
        let history = 30;
        let rows = history + 5 * 365;
        let t: Vec<f64> = (0..rows)
            .map(|row| row as f64 / (history - 1) as f64)
            .collect();
        let level = vec![1.0; rows];

        let bounds = simulate_bounds(input(&t, &level), 200, 0.8, 3).expect("runs");

        assert_eq!(bounds.yhat_upper.len(), rows);
        assert!(bounds.trend_upper[rows - 1] > bounds.trend_upper[history]);
        assert!(bounds.yhat_lower.iter().all(|value| value.is_finite()));
    }
}
