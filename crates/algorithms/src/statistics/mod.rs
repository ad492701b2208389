//! Statistical analysis of grids
//!
//! - **reduce**: statistics over a selection of values
//! - **window**: neighbourhood extraction and focal reducers
//! - **focal**: moving window (focal) statistics
//! - **zonal**: statistics by zones

pub mod focal;
pub mod reduce;
pub mod window;
pub mod zonal;

pub use focal::{
    fill_missing, fill_missing_with, focal, focal_count, focal_max, focal_mean, focal_median,
    focal_min, focal_pass, focal_percentile, focal_quantile, focal_range, focal_statistic,
    focal_std, focal_sum, focal_var, FocalParams, MAX_FILL_EXPONENT,
};
pub use reduce::{MissingPolicy, Statistic};
pub use window::{
    reducer_fn, FnReducer, FocalReducer, MultiStatisticReducer, Neighborhoods, StatisticReducer,
};
pub use zonal::{zonal, zonal_table};
