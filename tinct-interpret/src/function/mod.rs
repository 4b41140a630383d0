//! PDF functions.
//!
//! Functions map a number of input values to a number of output values. They are used
//! as tint transforms of `Separation` and `DeviceN` color spaces and to compute the
//! colors of shadings.

mod type0;
mod type2;
mod type3;
mod type4;

use crate::function::type0::Type0;
use crate::function::type2::Type2;
use crate::function::type3::Type3;
use crate::function::type4::Type4;
use crate::util::OptionLog;
use log::warn;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tinct_syntax::object::dict::keys::{DOMAIN, FUNCTION_TYPE, RANGE};
use tinct_syntax::object::{CacheKey, Dict, Object, dict_or_stream};

/// The input or output values of a function.
pub type Values = SmallVec<[f32; 4]>;
type TupleVec = SmallVec<[(f32, f32); 4]>;

/// A PDF function.
#[derive(Clone)]
pub struct Function(Arc<Repr>);

struct Repr {
    function_type: FunctionType,
    clamper: Clamper,
    output_count: usize,
}

enum FunctionType {
    Type0(Type0),
    Type2(Type2),
    Type3(Type3),
    Type4(Type4),
}

impl Function {
    /// Create a new function from a dictionary or stream object.
    pub fn new(object: &Object<'_>) -> Option<Self> {
        Self::load(object, &mut FxHashSet::default())
    }

    /// Create a new function, rejecting objects that are already in `visited`.
    ///
    /// Stitching functions reference their sub-functions, which makes it possible to
    /// construct function graphs that contain themselves.
    pub fn load(object: &Object<'_>, visited: &mut FxHashSet<u128>) -> Option<Self> {
        let key = object.cache_key();

        if !visited.insert(key) {
            warn!("function references itself");

            return None;
        }

        let function = Self::load_inner(object, visited);
        visited.remove(&key);

        function
    }

    fn load_inner(object: &Object<'_>, visited: &mut FxHashSet<u128>) -> Option<Self> {
        let (dict, stream) = dict_or_stream(object).warn_none("function is not a dictionary")?;
        let mut clamper = Clamper::new(&dict)?;
        let function_type = dict.get::<i32>(FUNCTION_TYPE)?;

        let (function_type, output_count) = match function_type {
            0 => {
                let stream = stream.warn_none("sampled function is not a stream")?;
                let range = clamper.range.as_ref().warn_none("sampled function has no range")?;
                let function = Type0::new(&stream, &clamper.domain, range)?;
                let outputs = range.len();

                (FunctionType::Type0(function), outputs)
            }
            2 => {
                let function = Type2::new(&dict, clamper.input_count())?;
                let outputs = function.output_count();

                (FunctionType::Type2(function), outputs)
            }
            3 => {
                let function = Type3::new(&dict, &clamper.domain, visited)?;
                let outputs = function.output_count();

                (FunctionType::Type3(function), outputs)
            }
            4 => {
                let stream = stream.warn_none("postscript function is not a stream")?;
                let range = clamper
                    .range
                    .as_ref()
                    .warn_none("postscript function has no range")?;
                let outputs = range.len();

                (FunctionType::Type4(Type4::new(&stream)?), outputs)
            }
            n => {
                warn!("unknown function type {n}");

                return None;
            }
        };

        // A range that is too short for the outputs doesn't clamp the excess outputs.
        if let Some(range) = clamper.range.as_mut()
            && range.len() < output_count
        {
            range.resize(output_count, (f32::NEG_INFINITY, f32::INFINITY));
        }

        Some(Self(Arc::new(Repr {
            function_type,
            clamper,
            output_count,
        })))
    }

    /// Evaluate the function with the given input.
    ///
    /// Returns `None` if the number of inputs doesn't match or the evaluation failed.
    pub fn eval(&self, input: &[f32]) -> Option<Values> {
        let mut input = Values::from_slice(input);

        if input.len() != self.input_count() {
            warn!(
                "function expected {} inputs, but got {}",
                self.input_count(),
                input.len()
            );

            return None;
        }

        self.0.clamper.clamp_input(&mut input)?;

        let mut out = match &self.0.function_type {
            FunctionType::Type0(f) => f.eval(&input)?,
            FunctionType::Type2(f) => f.eval(input[0])?,
            FunctionType::Type3(f) => f.eval(input[0])?,
            FunctionType::Type4(f) => f.eval(&input, self.0.output_count)?,
        };

        self.0.clamper.clamp_output(&mut out)?;

        Some(out)
    }

    /// The number of input values the function expects.
    pub fn input_count(&self) -> usize {
        self.0.clamper.input_count()
    }

    /// The number of output values the function produces.
    pub fn output_count(&self) -> usize {
        self.0.output_count
    }
}

impl Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.0.function_type {
            FunctionType::Type0(_) => 0,
            FunctionType::Type2(_) => 2,
            FunctionType::Type3(_) => 3,
            FunctionType::Type4(_) => 4,
        };

        f.debug_struct("Function")
            .field("type", &kind)
            .field("inputs", &self.input_count())
            .field("outputs", &self.output_count())
            .finish()
    }
}

/// The domain and range of a function.
#[derive(Debug, Clone)]
struct Clamper {
    domain: TupleVec,
    range: Option<TupleVec>,
}

impl Clamper {
    fn new(dict: &Dict<'_>) -> Option<Self> {
        let domain = read_pairs(dict, DOMAIN).warn_none("function has an invalid domain")?;

        let range = if dict.contains_key(RANGE) {
            Some(read_pairs(dict, RANGE).warn_none("function has an invalid range")?)
        } else {
            None
        };

        Some(Self { domain, range })
    }

    fn input_count(&self) -> usize {
        self.domain.len()
    }

    #[must_use]
    fn clamp_input(&self, input: &mut [f32]) -> Option<()> {
        clamp_pairs(input, &self.domain)
    }

    #[must_use]
    fn clamp_output(&self, output: &mut [f32]) -> Option<()> {
        match &self.range {
            Some(range) => clamp_pairs(output, range),
            None => Some(()),
        }
    }
}

fn clamp_pairs(values: &mut [f32], pairs: &[(f32, f32)]) -> Option<()> {
    for (value, (min, max)) in values.iter_mut().zip(pairs) {
        if min > max {
            warn!("function has an inverted domain or range");

            return None;
        }

        *value = value.clamp(*min, *max);
    }

    Some(())
}

/// Read an array of numbers with an even, non-zero length as pairs.
fn read_pairs(dict: &Dict<'_>, key: &[u8]) -> Option<TupleVec> {
    let values = dict.get::<Vec<f32>>(key)?;

    if values.is_empty() || values.len() % 2 != 0 {
        return None;
    }

    Some(values.chunks_exact(2).map(|c| (c[0], c[1])).collect())
}

/// Linearly map `x` from the interval `[x_min, x_max]` to `[y_min, y_max]`.
///
/// Returns `y_min` for an empty input interval.
#[inline]
pub fn interpolate(x: f32, x_min: f32, x_max: f32, y_min: f32, y_max: f32) -> f32 {
    if x_max == x_min {
        return y_min;
    }

    y_min + (x - x_min) * ((y_max - y_min) / (x_max - x_min))
}
