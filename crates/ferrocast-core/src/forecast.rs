//! Forecast result selection: projects a model's wide output onto the
//! display rows.

use serde::{Deserialize, Serialize};

use crate::model::{columns, ForecastTable};
use crate::{tail, ComponentRow, ForecastRow, PipelineError};

/// Names of the columns holding the point estimate and its bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastSelector {
    pub point_field: String,
    pub lower_field: String,
    pub upper_field: String,
}

impl Default for ForecastSelector {
    fn default() -> Self {
        Self::new(columns::YHAT, columns::YHAT_LOWER, columns::YHAT_UPPER)
    }
}

impl ForecastSelector {
    pub fn new(
        point_field: impl Into<String>,
        lower_field: impl Into<String>,
        upper_field: impl Into<String>,
    ) -> Self {
        Self {
            point_field: point_field.into(),
            lower_field: lower_field.into(),
            upper_field: upper_field.into(),
        }
    }

    /// Projects every table row into a [`ForecastRow`], keeping order and
    /// row count.
    ///
    /// # Errors
    ///
    /// [`PipelineError::SchemaMismatch`] when a field is missing, a value is
    /// not finite, or a row breaks `lower <= point <= upper`.
    pub fn select(&self, table: &ForecastTable) -> Result<ForecastFrame, PipelineError> {
        let point = required_column(table, &self.point_field)?;
        let lower = required_column(table, &self.lower_field)?;
        let upper = required_column(table, &self.upper_field)?;

        let mut rows = Vec::with_capacity(table.len());
        for (index, timestamp) in table.timestamps().iter().enumerate() {
            let row = ForecastRow {
                timestamp: *timestamp,
                point_estimate: point[index],
                lower_bound: lower[index],
                upper_bound: upper[index],
            };

            if !(row.point_estimate.is_finite()
                && row.lower_bound.is_finite()
                && row.upper_bound.is_finite())
            {
                return Err(PipelineError::schema_mismatch(format!(
                    "non-finite forecast value on {timestamp}"
                )));
            }
            if !(row.lower_bound <= row.point_estimate && row.point_estimate <= row.upper_bound) {
                return Err(PipelineError::schema_mismatch(format!(
                    "bounds out of order on {timestamp}: {} <= {} <= {} does not hold",
                    row.lower_bound, row.point_estimate, row.upper_bound
                )));
            }
            rows.push(row);
        }

        Ok(ForecastFrame { rows })
    }
}

/// Selected forecast rows in horizon order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForecastFrame {
    rows: Vec<ForecastRow>,
}

impl ForecastFrame {
    pub fn rows(&self) -> &[ForecastRow] {
        &self.rows
    }

    /// The last `n` rows.
    pub fn tail(&self, n: usize) -> &[ForecastRow] {
        tail(&self.rows, n)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Trend plus whichever seasonal columns the model produced.
pub fn select_components(table: &ForecastTable) -> Result<Vec<ComponentRow>, PipelineError> {
    let trend = required_column(table, columns::TREND)?;
    let weekly = table.column(columns::WEEKLY);
    let yearly = table.column(columns::YEARLY);

    Ok(table
        .timestamps()
        .iter()
        .enumerate()
        .map(|(index, timestamp)| ComponentRow {
            timestamp: *timestamp,
            trend: trend[index],
            weekly: weekly.map(|values| values[index]),
            yearly: yearly.map(|values| values[index]),
        })
        .collect())
}

fn required_column<'a>(table: &'a ForecastTable, name: &str) -> Result<&'a [f64], PipelineError> {
    table.column(name).ok_or_else(|| {
        PipelineError::schema_mismatch(format!(
            "forecast output has no '{name}' column (available: {})",
            table.column_names().join(", ")
        ))
    })
}
