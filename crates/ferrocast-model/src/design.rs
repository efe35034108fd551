//! Feature construction: trend hinges and Fourier seasonality terms.

use std::f64::consts::PI;

use ferrocast_core::CalendarDate;

/// A periodic component expressed as `order` sine/cosine pairs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seasonality {
    pub name: &'static str,
    pub period_days: f64,
    pub order: usize,
}

impl Seasonality {
    pub const YEARLY: Self = Self {
        name: "yearly",
        period_days: 365.25,
        order: 10,
    };

    pub const WEEKLY: Self = Self {
        name: "weekly",
        period_days: 7.0,
        order: 3,
    };

    pub const fn width(&self) -> usize {
        2 * self.order
    }

    /// Appends `sin(2πkt/P), cos(2πkt/P)` for `k = 1..=order`.
    pub fn extend_row(&self, epoch_days: f64, row: &mut Vec<f64>) {
        for k in 1..=self.order {
            let angle = 2.0 * PI * k as f64 * epoch_days / self.period_days;
            row.push(angle.sin());
            row.push(angle.cos());
        }
    }
}

/// Days since 1970-01-01, the phase origin of every seasonality.
pub fn epoch_days(date: CalendarDate) -> f64 {
    date.unix_timestamp() as f64 / 86_400.0
}

/// Row indices of the potential changepoints: `count` points spread evenly
/// over the first `range` share of `rows` history rows, never the first row.
pub fn changepoint_indices(rows: usize, count: usize, range: f64) -> Vec<usize> {
    let eligible = (rows as f64 * range).floor() as usize;
    let count = count.min(eligible.saturating_sub(1));
    if count == 0 {
        return Vec::new();
    }

    let last = (eligible - 1) as f64;
    (1..=count)
        .map(|i| (last * i as f64 / count as f64).round() as usize)
        .collect()
}

/// `max(t - s, 0)` for every changepoint `s`.
pub fn extend_hinges(t: f64, changepoints: &[f64], row: &mut Vec<f64>) {
    row.extend(changepoints.iter().map(|s| (t - s).max(0.0)));
}
