use crate::function::{Function, TupleVec, Values, interpolate};
use crate::util::OptionLog;
use log::warn;
use rustc_hash::FxHashSet;
use tinct_syntax::object::dict::keys::{BOUNDS, ENCODE, FUNCTIONS};
use tinct_syntax::object::{Array, Dict, Object};

/// A type 3 function (stitching function).
pub(crate) struct Type3 {
    functions: Vec<Function>,
    bounds: Vec<f32>,
    encode: TupleVec,
    domain: (f32, f32),
    output_count: usize,
}

impl Type3 {
    /// Create a new type 3 function.
    pub(crate) fn new(
        dict: &Dict<'_>,
        domain: &[(f32, f32)],
        visited: &mut FxHashSet<u128>,
    ) -> Option<Self> {
        let [domain] = domain else {
            warn!("stitching function must have exactly one input");

            return None;
        };

        let functions = dict
            .get::<Array<'_>>(FUNCTIONS)
            .warn_none("stitching function has no sub-functions")?
            .iter::<Object<'_>>()
            .map(|o| Function::load(&o, visited))
            .collect::<Option<Vec<_>>>()?;

        if functions.is_empty() {
            warn!("stitching function has no sub-functions");

            return None;
        }

        if functions.iter().any(|f| f.input_count() != 1) {
            warn!("sub-functions of stitching function must have exactly one input");

            return None;
        }

        let bounds = dict.get::<Vec<f32>>(BOUNDS).unwrap_or_default();

        if bounds.len() != functions.len() - 1 || bounds.windows(2).any(|w| w[0] > w[1]) {
            warn!("stitching function has invalid bounds");

            return None;
        }

        let encode = dict
            .get::<Vec<f32>>(ENCODE)
            .filter(|e| e.len() == functions.len() * 2)
            .warn_none("stitching function has invalid encode array")?
            .chunks_exact(2)
            .map(|c| (c[0], c[1]))
            .collect();

        let output_count = functions[0].output_count();

        if functions.iter().any(|f| f.output_count() != output_count) {
            warn!("sub-functions of stitching function must have the same number of outputs");

            return None;
        }

        Some(Self {
            functions,
            bounds,
            encode,
            domain: *domain,
            output_count,
        })
    }

    pub(crate) fn output_count(&self) -> usize {
        self.output_count
    }

    /// Evaluate the function with the given input, which must already be clamped to
    /// the domain.
    pub(crate) fn eval(&self, input: f32) -> Option<Values> {
        let index = find_interval(&self.bounds, input);

        let lower = if index == 0 {
            self.domain.0
        } else {
            self.bounds[index - 1]
        };
        let upper = self.bounds.get(index).copied().unwrap_or(self.domain.1);

        let (e0, e1) = *self.encode.get(index)?;
        let encoded = interpolate(input, lower, upper, e0, e1);

        self.functions.get(index)?.eval(&[encoded])
    }
}

/// Find the sub-function responsible for `x`. Intervals are closed on the left, so a
/// value that lies exactly on a bound belongs to the sub-function to its right.
fn find_interval(bounds: &[f32], x: f32) -> usize {
    bounds.partition_point(|b| *b <= x)
}
