use crate::function::Values;
use log::warn;
use smallvec::smallvec;
use tinct_syntax::object::Dict;
use tinct_syntax::object::dict::keys::{C0, C1, N};

/// A type 2 function (exponential interpolation function).
pub(crate) struct Type2 {
    c0: Values,
    c1: Values,
    n: f32,
}

impl Type2 {
    /// Create a new type 2 function.
    pub(crate) fn new(dict: &Dict<'_>, input_count: usize) -> Option<Self> {
        if input_count != 1 {
            warn!("exponential function must have exactly one input");

            return None;
        }

        let c0 = dict.get::<Values>(C0).unwrap_or(smallvec![0.0]);
        let c1 = dict.get::<Values>(C1).unwrap_or(smallvec![1.0]);
        let n = dict.get::<f32>(N).unwrap_or(1.0);

        if c0.len() != c1.len() {
            warn!("C0 and C1 of exponential function have different lengths");

            return None;
        }

        Some(Self { c0, c1, n })
    }

    pub(crate) fn output_count(&self) -> usize {
        self.c0.len()
    }

    /// Evaluate the function with the given input.
    pub(crate) fn eval(&self, input: f32) -> Option<Values> {
        if input < 0.0 && self.n.fract() != 0.0 {
            warn!("exponential function with non-integer exponent evaluated at negative input");

            return None;
        }

        let factor = input.powf(self.n);

        Some(
            self.c0
                .iter()
                .zip(self.c1.iter())
                .map(|(c0, c1)| *c0 + factor * (*c1 - *c0))
                .collect(),
        )
    }
}
