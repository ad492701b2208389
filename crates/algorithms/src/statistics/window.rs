//! Neighbourhood extraction and reduction
//!
//! Each grid is padded with missing cells by the neighbourhood buffer, so a
//! window centred on any cell stays inside the padded array. A
//! [`FocalReducer`] then sees, for every cell, the masked window values of
//! each grid and writes one value per output channel.

use super::reduce::{MissingPolicy, Statistic};
use gridcalc_core::error::{Error, Result};
use gridcalc_core::raster::{ElementKind, Grid, Neighborhood};
use ndarray::{s, Array2};

/// Turns the window values around one cell into output values.
pub trait FocalReducer {
    /// Number of output channels
    fn outputs(&self) -> usize;

    /// `inputs[g]` holds the masked window values of grid `g`, row-major,
    /// NaN for missing or out-of-grid cells. Write one value per channel.
    fn reduce(&mut self, inputs: &[Vec<f64>], out: &mut [f64]);
}

/// One statistic of the first grid's window
#[derive(Debug, Clone)]
pub struct StatisticReducer {
    statistic: Statistic,
    policy: MissingPolicy,
    scratch: Vec<f64>,
}

impl StatisticReducer {
    pub fn new(statistic: Statistic, policy: MissingPolicy) -> Self {
        Self {
            statistic,
            policy,
            scratch: Vec::new(),
        }
    }
}

impl FocalReducer for StatisticReducer {
    fn outputs(&self) -> usize {
        1
    }

    fn reduce(&mut self, inputs: &[Vec<f64>], out: &mut [f64]) {
        out[0] = self.statistic.compute(&inputs[0], self.policy, &mut self.scratch);
    }
}

/// Several statistics of the first grid's window, one channel each
#[derive(Debug, Clone)]
pub struct MultiStatisticReducer {
    statistics: Vec<Statistic>,
    policy: MissingPolicy,
    scratch: Vec<f64>,
}

impl MultiStatisticReducer {
    pub fn new(statistics: Vec<Statistic>, policy: MissingPolicy) -> Self {
        Self {
            statistics,
            policy,
            scratch: Vec::new(),
        }
    }
}

impl FocalReducer for MultiStatisticReducer {
    fn outputs(&self) -> usize {
        self.statistics.len()
    }

    fn reduce(&mut self, inputs: &[Vec<f64>], out: &mut [f64]) {
        for (slot, statistic) in out.iter_mut().zip(&self.statistics) {
            *slot = statistic.compute(&inputs[0], self.policy, &mut self.scratch);
        }
    }
}

/// Reducer backed by a closure
pub struct FnReducer<F> {
    outputs: usize,
    f: F,
}

/// Wrap a closure `f(inputs, out)` producing `outputs` channels
pub fn reducer_fn<F>(outputs: usize, f: F) -> FnReducer<F>
where
    F: FnMut(&[Vec<f64>], &mut [f64]),
{
    FnReducer { outputs, f }
}

impl<F> FocalReducer for FnReducer<F>
where
    F: FnMut(&[Vec<f64>], &mut [f64]),
{
    fn outputs(&self) -> usize {
        self.outputs
    }

    fn reduce(&mut self, inputs: &[Vec<f64>], out: &mut [f64]) {
        (self.f)(inputs, out)
    }
}

/// Padded windows over a set of aligned grids
pub struct Neighborhoods {
    template: Grid,
    padded: Vec<Array2<f64>>,
    offsets: Vec<(usize, usize)>,
}

impl Neighborhoods {
    /// Pad every grid for `neighborhood`.
    ///
    /// All grids must share the first grid's geometry.
    pub fn extract(grids: &[Grid], neighborhood: Neighborhood) -> Result<Self> {
        let first = grids.first().ok_or_else(|| Error::InvalidParameter {
            name: "grids",
            value: "0".into(),
            reason: "at least one grid is required".into(),
        })?;
        let geometry = first.geometry();
        if let Some(other) = grids.iter().find(|g| !g.geometry().matches(&geometry)) {
            return Err(Error::SizeMismatch {
                er: first.rows(),
                ec: first.cols(),
                ar: other.rows(),
                ac: other.cols(),
            });
        }

        let b = neighborhood.buffer();
        let (rows, cols) = first.shape();
        let padded = grids
            .iter()
            .map(|g| {
                let mut a = Array2::from_elem((rows + 2 * b, cols + 2 * b), f64::NAN);
                a.slice_mut(s![b..b + rows, b..b + cols]).assign(&g.to_f64());
                a
            })
            .collect();

        Ok(Self {
            template: first.clone(),
            padded,
            offsets: neighborhood.window_offsets(),
        })
    }

    /// Number of values each grid contributes per window
    pub fn window_len(&self) -> usize {
        self.offsets.len()
    }

    /// Fill `inputs` with the window values around (row, col)
    pub fn window_at(&self, row: usize, col: usize, inputs: &mut [Vec<f64>]) {
        for (buf, padded) in inputs.iter_mut().zip(&self.padded) {
            buf.clear();
            buf.extend(self.offsets.iter().map(|&(dr, dc)| padded[(row + dr, col + dc)]));
        }
    }

    /// Run `reducer` over every cell; one array per output channel
    pub fn reduce(&self, reducer: &mut dyn FocalReducer) -> Vec<Array2<f64>> {
        let (rows, cols) = self.template.shape();
        let channels = reducer.outputs();
        let mut outputs = vec![Array2::from_elem((rows, cols), f64::NAN); channels];
        let mut inputs = vec![Vec::with_capacity(self.window_len()); self.padded.len()];
        let mut out = vec![f64::NAN; channels];

        for row in 0..rows {
            for col in 0..cols {
                self.window_at(row, col, &mut inputs);
                out.fill(f64::NAN);
                reducer.reduce(&inputs, &mut out);
                for (array, &v) in outputs.iter_mut().zip(&out) {
                    array[(row, col)] = v;
                }
            }
        }
        outputs
    }

    /// Run `reducer` and wrap each channel as a `Float32` grid on the
    /// first grid's geometry
    pub fn reduce_to_grids(&self, reducer: &mut dyn FocalReducer) -> Result<Vec<Grid>> {
        self.reduce(reducer)
            .iter()
            .map(|values| self.template.with_values(ElementKind::Float32, values))
            .collect()
    }
}
