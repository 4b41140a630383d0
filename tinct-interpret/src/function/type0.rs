use crate::function::{TupleVec, Values, interpolate};
use crate::util::OptionLog;
use log::warn;
use smallvec::{SmallVec, smallvec};
use tinct_syntax::bit_reader::{BitReader, BitSize};
use tinct_syntax::object::Stream;
use tinct_syntax::object::dict::keys::{BITS_PER_SAMPLE, DECODE, ENCODE, SIZE};

type IntVec = SmallVec<[usize; 4]>;

/// A type 0 function (sampled function).
pub(crate) struct Type0 {
    sizes: IntVec,
    samples: Vec<u32>,
    domain: TupleVec,
    encode: TupleVec,
    decode: TupleVec,
    sample_max: f32,
}

impl Type0 {
    /// Create a new type 0 function.
    pub(crate) fn new(stream: &Stream<'_>, domain: &[(f32, f32)], range: &[(f32, f32)]) -> Option<Self> {
        let dict = stream.dict();

        let bits_per_sample = dict
            .get::<u8>(BITS_PER_SAMPLE)
            .filter(|b| matches!(b, 1 | 2 | 4 | 8 | 12 | 16 | 24 | 32))
            .and_then(BitSize::from_u8)
            .warn_none("sampled function has invalid bits per sample")?;

        let sizes = dict
            .get::<Vec<i32>>(SIZE)
            .filter(|s| s.len() == domain.len())
            .and_then(|s| {
                s.iter()
                    .map(|n| usize::try_from(*n).ok().filter(|n| *n > 0))
                    .collect::<Option<IntVec>>()
            })
            .warn_none("sampled function has invalid sizes")?;

        let encode = match dict.get::<Vec<f32>>(ENCODE) {
            Some(e) if e.len() >= sizes.len() * 2 => {
                e.chunks_exact(2).take(sizes.len()).map(|c| (c[0], c[1])).collect()
            }
            _ => sizes
                .iter()
                .map(|s| (0.0, if *s == 1 { 1.0 } else { (*s - 1) as f32 }))
                .collect(),
        };

        let decode = match dict.get::<Vec<f32>>(DECODE) {
            Some(d) if d.len() >= range.len() * 2 => {
                d.chunks_exact(2).take(range.len()).map(|c| (c[0], c[1])).collect()
            }
            _ => range.iter().copied().collect(),
        };

        let num_samples = sizes
            .iter()
            .try_fold(range.len(), |acc, s| acc.checked_mul(*s))
            .warn_none("sampled function is too large")?;

        let data = stream.decoded();

        if num_samples
            .checked_mul(bits_per_sample.bits())
            .is_none_or(|bits| bits > data.len() * 8)
        {
            warn!("sampled function doesn't have enough sample data");

            return None;
        }

        let mut reader = BitReader::new(data);
        let samples = (0..num_samples)
            .map(|_| reader.read(bits_per_sample))
            .collect::<Option<Vec<_>>>()?;

        Some(Self {
            sizes,
            samples,
            domain: domain.iter().copied().collect(),
            encode,
            decode,
            sample_max: bits_per_sample.max_value(),
        })
    }

    /// Evaluate the function with the given input, which must already be clamped to
    /// the domain.
    pub(crate) fn eval(&self, input: &[f32]) -> Option<Values> {
        let encoded = input
            .iter()
            .zip(self.domain.iter())
            .zip(self.encode.iter().zip(self.sizes.iter()))
            .map(|((x, domain), (encode, size))| {
                let e = interpolate(*x, domain.0, domain.1, encode.0, encode.1);

                e.clamp(0.0, (*size - 1) as f32)
            })
            .collect::<SmallVec<[f32; 4]>>();

        let interpolator = Interpolator {
            input: &encoded,
            sizes: &self.sizes,
            samples: &self.samples,
            out_len: self.decode.len(),
        };

        let interpolated = interpolator.interpolate()?;

        Some(
            interpolated
                .iter()
                .zip(self.decode.iter())
                .map(|(x, decode)| interpolate(*x, 0.0, self.sample_max, decode.0, decode.1))
                .collect(),
        )
    }
}

/// Multilinear interpolation over the sample grid.
///
/// Dimensions are processed one after another. Along each dimension, the samples at the
/// grid lines below and above the input are interpolated, unless the input lies exactly
/// on a grid line or on the last one, in which case that grid line is used directly.
// See <https://github.com/apache/pdfbox/blob/bb778d4784f354c36ce032e91a0cee2169a4c598/pdfbox/src/main/java/org/apache/pdfbox/pdmodel/common/function/PDFunctionType0.java#L252>
struct Interpolator<'a> {
    input: &'a [f32],
    sizes: &'a [usize],
    samples: &'a [u32],
    out_len: usize,
}

impl Interpolator<'_> {
    fn interpolate(&self) -> Option<Values> {
        self.interpolate_inner(0, 0, 1)
    }

    /// `offset` is the index of the grid point selected so far (in units of samples),
    /// `stride` the distance between two grid points along dimension `step`.
    fn interpolate_inner(&self, step: usize, offset: usize, stride: usize) -> Option<Values> {
        if step == self.input.len() {
            let start = offset * self.out_len;

            return Some(
                self.samples
                    .get(start..start + self.out_len)?
                    .iter()
                    .map(|s| *s as f32)
                    .collect(),
            );
        }

        let x = self.input[step];
        let prev = x.floor() as usize;
        let next_stride = stride * self.sizes[step];

        if x.fract() == 0.0 || prev + 1 >= self.sizes[step] {
            return self.interpolate_inner(step + 1, offset + prev * stride, next_stride);
        }

        let val1 = self.interpolate_inner(step + 1, offset + prev * stride, next_stride)?;
        let val2 = self.interpolate_inner(step + 1, offset + (prev + 1) * stride, next_stride)?;

        let mut out: Values = smallvec![0.0; self.out_len];

        for i in 0..self.out_len {
            out[i] = interpolate(x, prev as f32, (prev + 1) as f32, val1[i], val2[i]);
        }

        Some(out)
    }
}
