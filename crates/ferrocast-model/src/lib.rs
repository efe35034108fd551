//! Additive forecasting model for ferrocast.
//!
//! [`AdditiveModel`] implements [`ferrocast_core::ForecastModel`]:
//! - piecewise-linear trend with evenly placed potential changepoints
//! - Fourier seasonality (weekly, yearly), switched on by history length
//!   unless configured explicitly
//! - penalized least-squares fit solved by Cholesky factorization
//! - seeded simulation for the `trend` and `yhat` uncertainty intervals

mod additive;
mod design;
mod linalg;
mod uncertainty;

pub use additive::{AdditiveModel, DEFAULT_CHANGEPOINT_THRESHOLD};
pub use design::Seasonality;
