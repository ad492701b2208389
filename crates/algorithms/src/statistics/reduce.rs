//! Statistics over a selection of cell values
//!
//! Shared by the focal, zonal and local operations. NaN marks a missing
//! value; [`MissingPolicy`] decides whether missing values are skipped or
//! poison the whole selection.

use gridcalc_core::error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Available statistics
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Statistic {
    /// Number of values
    Count,
    /// Number of values equal to the given one
    CountEqual(f64),
    /// Arithmetic mean
    Mean,
    /// Standard deviation (population)
    StdDev,
    /// Variance (population)
    Variance,
    Min,
    Max,
    Sum,
    Median,
    /// Percentile (0-100), linear interpolation between ranks
    Percentile(f64),
    /// Quantile (0-1), linear interpolation between ranks
    Quantile(f64),
    /// Max - min
    Range,
}

/// How missing values inside a selection are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPolicy {
    /// Skip missing values
    #[default]
    Ignore,
    /// Any missing value makes the statistic missing
    Propagate,
}

impl Statistic {
    /// Check the statistic's parameter
    pub fn validate(&self) -> Result<()> {
        match *self {
            Statistic::Percentile(p) if !(0.0..=100.0).contains(&p) => Err(Error::InvalidParameter {
                name: "percentile",
                value: p.to_string(),
                reason: "must be between 0 and 100".into(),
            }),
            Statistic::Quantile(q) if !(0.0..=1.0).contains(&q) => Err(Error::InvalidParameter {
                name: "quantile",
                value: q.to_string(),
                reason: "must be between 0 and 1".into(),
            }),
            _ => Ok(()),
        }
    }

    /// Compute the statistic over `values`.
    ///
    /// `scratch` is reused between calls to avoid allocating per cell. With
    /// [`MissingPolicy::Ignore`] an empty selection gives 0 for `Sum`,
    /// `Count` and `CountEqual`, and NaN otherwise.
    pub fn compute(&self, values: &[f64], policy: MissingPolicy, scratch: &mut Vec<f64>) -> f64 {
        scratch.clear();
        match policy {
            MissingPolicy::Propagate => {
                if values.iter().any(|v| v.is_nan()) {
                    return f64::NAN;
                }
                scratch.extend_from_slice(values);
            }
            MissingPolicy::Ignore => scratch.extend(values.iter().copied().filter(|v| !v.is_nan())),
        }

        if scratch.is_empty() {
            return match self {
                Statistic::Sum | Statistic::Count | Statistic::CountEqual(_) => 0.0,
                _ => f64::NAN,
            };
        }

        let n = scratch.len() as f64;
        match *self {
            Statistic::Count => n,
            Statistic::CountEqual(target) => scratch.iter().filter(|&&v| v == target).count() as f64,
            Statistic::Mean => scratch.iter().sum::<f64>() / n,
            Statistic::StdDev => variance(scratch).sqrt(),
            Statistic::Variance => variance(scratch),
            Statistic::Min => scratch.iter().copied().fold(f64::INFINITY, f64::min),
            Statistic::Max => scratch.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Statistic::Sum => scratch.iter().sum(),
            Statistic::Median => percentile(scratch, 0.5),
            Statistic::Percentile(p) => percentile(scratch, p / 100.0),
            Statistic::Quantile(q) => percentile(scratch, q),
            Statistic::Range => {
                let min = scratch.iter().copied().fold(f64::INFINITY, f64::min);
                let max = scratch.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                max - min
            }
        }
    }

    /// Convenience form of [`Statistic::compute`] that allocates its own scratch
    pub fn of(&self, values: &[f64], policy: MissingPolicy) -> f64 {
        self.compute(values, policy, &mut Vec::with_capacity(values.len()))
    }
}

fn variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
}

/// Linear interpolation between closest ranks; `values` gets sorted.
///
/// `q` outside 0..=1 is clamped to the nearest end, NaN gives NaN.
fn percentile(values: &mut [f64], q: f64) -> f64 {
    if q.is_nan() {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let last = values.len() - 1;
    let pos = q.clamp(0.0, 1.0) * last as f64;
    let lo = (pos.floor() as usize).min(last);
    let hi = (pos.ceil() as usize).min(last);
    values[lo] + (values[hi] - values[lo]) * (pos - lo as f64)
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statistic::Count => write!(f, "count"),
            Statistic::CountEqual(v) => write!(f, "count-equal:{}", v),
            Statistic::Mean => write!(f, "mean"),
            Statistic::StdDev => write!(f, "std"),
            Statistic::Variance => write!(f, "var"),
            Statistic::Min => write!(f, "min"),
            Statistic::Max => write!(f, "max"),
            Statistic::Sum => write!(f, "sum"),
            Statistic::Median => write!(f, "median"),
            Statistic::Percentile(p) => write!(f, "percentile:{}", p),
            Statistic::Quantile(q) => write!(f, "quantile:{}", q),
            Statistic::Range => write!(f, "range"),
        }
    }
}

impl FromStr for Statistic {
    type Err = Error;

    /// Parse names such as `mean`, `std`, `percentile:90` or `count-equal:3`
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let (name, arg) = match lower.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (lower.as_str(), None),
        };
        let invalid = |reason: &str| Error::InvalidParameter {
            name: "statistic",
            value: s.to_string(),
            reason: reason.to_string(),
        };
        let number = || -> Result<f64> {
            arg.ok_or_else(|| invalid("missing argument"))?
                .parse()
                .map_err(|_| invalid("argument is not a number"))
        };

        let statistic = match name {
            "count" => Statistic::Count,
            "count-equal" | "count_equal" => Statistic::CountEqual(number()?),
            "mean" => Statistic::Mean,
            "std" | "stddev" => Statistic::StdDev,
            "var" | "variance" => Statistic::Variance,
            "min" => Statistic::Min,
            "max" => Statistic::Max,
            "sum" => Statistic::Sum,
            "median" => Statistic::Median,
            "percentile" => Statistic::Percentile(number()?),
            "quantile" => Statistic::Quantile(number()?),
            "range" | "ptp" => Statistic::Range,
            _ => return Err(invalid("unknown statistic")),
        };
        statistic.validate()?;
        Ok(statistic)
    }
}

impl FromStr for MissingPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ignore" => Ok(MissingPolicy::Ignore),
            "propagate" => Ok(MissingPolicy::Propagate),
            other => Err(Error::InvalidParameter {
                name: "policy",
                value: other.to_string(),
                reason: "expected ignore or propagate".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const NAN: f64 = f64::NAN;
    use MissingPolicy::*;

    #[test]
    fn test_basic_statistics() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(Statistic::Count.of(&v, Ignore), 8.0);
        assert_eq!(Statistic::CountEqual(4.0).of(&v, Ignore), 3.0);
        assert_eq!(Statistic::Mean.of(&v, Ignore), 5.0);
        assert_eq!(Statistic::StdDev.of(&v, Ignore), 2.0);
        assert_eq!(Statistic::Variance.of(&v, Ignore), 4.0);
        assert_eq!(Statistic::Min.of(&v, Ignore), 2.0);
        assert_eq!(Statistic::Max.of(&v, Ignore), 9.0);
        assert_eq!(Statistic::Sum.of(&v, Ignore), 40.0);
        assert_eq!(Statistic::Median.of(&v, Ignore), 4.5);
        assert_eq!(Statistic::Range.of(&v, Ignore), 7.0);
    }

    #[test]
    fn test_percentile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(Statistic::Percentile(50.0).of(&v, Ignore), 2.5);
        assert_relative_eq!(Statistic::Percentile(25.0).of(&v, Ignore), 1.75);
        assert_relative_eq!(Statistic::Quantile(1.0).of(&v, Ignore), 4.0);
        assert_relative_eq!(Statistic::Quantile(0.0).of(&v, Ignore), 1.0);
    }

    #[test]
    fn test_out_of_range_rank_is_clamped() {
        let v = [3.0, 1.0, 4.0, 2.0];
        assert_eq!(Statistic::Quantile(1.5).of(&v, Ignore), 4.0);
        assert_eq!(Statistic::Percentile(-20.0).of(&v, Ignore), 1.0);
        assert!(Statistic::Quantile(NAN).of(&v, Ignore).is_nan());
    }

    #[test]
    fn test_missing_policies() {
        let v = [1.0, NAN, 3.0];
        assert_eq!(Statistic::Mean.of(&v, Ignore), 2.0);
        assert!(Statistic::Mean.of(&v, Propagate).is_nan());
        assert!(Statistic::Count.of(&v, Propagate).is_nan());

        let empty = [NAN, NAN];
        assert_eq!(Statistic::Sum.of(&empty, Ignore), 0.0);
        assert_eq!(Statistic::Count.of(&empty, Ignore), 0.0);
        assert!(Statistic::Mean.of(&empty, Ignore).is_nan());
        assert!(Statistic::Max.of(&empty, Ignore).is_nan());
    }

    #[test]
    fn test_parse_and_validate() {
        assert_eq!("Mean".parse::<Statistic>().unwrap(), Statistic::Mean);
        assert_eq!("percentile:90".parse::<Statistic>().unwrap(), Statistic::Percentile(90.0));
        assert_eq!("count-equal:3".parse::<Statistic>().unwrap(), Statistic::CountEqual(3.0));
        assert!("percentile:120".parse::<Statistic>().is_err());
        assert!("quantile".parse::<Statistic>().is_err());
        assert!("mode".parse::<Statistic>().is_err());
        assert!(Statistic::Quantile(1.5).validate().is_err());
        assert_eq!("propagate".parse::<MissingPolicy>().unwrap(), Propagate);
        assert_eq!(Statistic::Percentile(90.0).to_string(), "percentile:90");
    }
}
