use std::f64::consts::PI;

use crate::F;

/// Index of the largest value, first occurrence wins on ties.
pub fn arg_max(values: impl IntoIterator<Item = F>) -> Option<usize> {
    values
        .into_iter()
        .enumerate()
        .reduce(|max, next| if next.1 > max.1 { next } else { max })
        .map(|(i, _)| i)
}

/// Square root of a periodic Hann window.
///
/// The 0.5 exponent makes overlapping frames at half-window hop satisfy a
/// near-unity overlap-add power condition and must not be tuned.
pub fn sqrt_hann(len: usize) -> impl Iterator<Item = F> {
    (0..len).map(move |i| (0.5 * (1. - (2. * PI * i as F / len as F).cos())).sqrt())
}
