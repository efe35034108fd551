//! Forecast horizon construction.

use crate::{CalendarDate, HorizonRow, PipelineError, TrainingRow, ValidationError};

/// Fewest training rows that can anchor a horizon or fit a model.
pub const MIN_TRAINING_ROWS: usize = 2;

/// Days appended per forecast year.
pub const DAYS_PER_YEAR: u32 = 365;

/// Accepted range of the user-facing "years of prediction" setting.
pub const YEARS_RANGE: std::ops::RangeInclusive<u32> = 1..=5;

/// `years × 365`.
pub const fn period_days_for_years(years: u32) -> u32 {
    years.saturating_mul(DAYS_PER_YEAR)
}

/// Checks `years` against [`YEARS_RANGE`].
pub fn validate_years(years: u32) -> Result<u32, ValidationError> {
    if YEARS_RANGE.contains(&years) {
        Ok(years)
    } else {
        Err(ValidationError::YearsOutOfRange {
            value: years,
            min: *YEARS_RANGE.start(),
            max: *YEARS_RANGE.end(),
        })
    }
}

/// Every training timestamp followed by `period_days` consecutive days
/// starting the day after the last one.
///
/// # Errors
///
/// [`PipelineError::InsufficientData`] with fewer than [`MIN_TRAINING_ROWS`]
/// rows; [`ValidationError::DateOutOfRange`] if the range runs off the
/// calendar.
pub fn build_horizon(
    training: &[TrainingRow],
    period_days: u32,
) -> Result<Vec<HorizonRow>, PipelineError> {
    if training.len() < MIN_TRAINING_ROWS {
        return Err(PipelineError::InsufficientData {
            required: MIN_TRAINING_ROWS,
            actual: training.len(),
        });
    }

    let mut horizon: Vec<HorizonRow> = Vec::with_capacity(training.len() + period_days as usize);
    horizon.extend(training.iter().map(|row| HorizonRow::new(row.timestamp)));

    let mut current: CalendarDate = training[training.len() - 1].timestamp;
    for _ in 0..period_days {
        current = current
            .next_day()
            .ok_or_else(|| ValidationError::DateOutOfRange {
                value: current.to_string(),
            })?;
        horizon.push(HorizonRow::new(current));
    }

    Ok(horizon)
}

/// [`build_horizon`] with `period_days = years × 365`.
pub fn build_horizon_for_years(
    training: &[TrainingRow],
    years: u32,
) -> Result<Vec<HorizonRow>, PipelineError> {
    build_horizon(training, period_days_for_years(years))
}
