//! Projection of raw observations into the `(timestamp, value)` training schema.

use crate::{PipelineError, RawObservation, TrainingRow};

/// Maps `date → timestamp` and `close → value`, preserving order.
///
/// Empty input yields empty output; callers that need data must check the
/// length themselves (the horizon builder does).
///
/// # Errors
///
/// [`PipelineError::SchemaMismatch`] when dates are duplicated or out of
/// order, or a close is not finite.
pub fn to_training_rows(
    observations: &[RawObservation],
) -> Result<Vec<TrainingRow>, PipelineError> {
    let mut rows: Vec<TrainingRow> = Vec::with_capacity(observations.len());

    for (index, observation) in observations.iter().enumerate() {
        if !observation.close.is_finite() {
            return Err(PipelineError::schema_mismatch(format!(
                "close at row {index} ({}) is not finite",
                observation.date
            )));
        }

        if let Some(previous) = rows.last() {
            if observation.date == previous.timestamp {
                return Err(PipelineError::schema_mismatch(format!(
                    "duplicate date {} at row {index}",
                    observation.date
                )));
            }
            if observation.date < previous.timestamp {
                return Err(PipelineError::schema_mismatch(format!(
                    "date {} at row {index} precedes {}",
                    observation.date, previous.timestamp
                )));
            }
        }

        rows.push(TrainingRow::new(observation.date, observation.close));
    }

    Ok(rows)
}
