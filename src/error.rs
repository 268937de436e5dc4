use thiserror::Error;

use crate::F;

/// Errors raised while building an [`Srp`](crate::Srp) or feeding it audio.
///
/// Configuration errors are raised before any transform or sweep work
/// begins; input-shape errors are raised before the transform touches the
/// waveform. No partial results are produced on failure.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// The array under-samples spatial phase at `f_high`, making angle
    /// estimates ambiguous.
    #[error(
        "spatial nyquist violated: element spacing {spacing} m exceeds {limit} m \
         allowed for an upper passband frequency of {f_high} Hz"
    )]
    SpatialNyquist { spacing: F, limit: F, f_high: F },
    #[error("angle resolution {0}° must be positive and evenly divide 180°")]
    InvalidResolution(F),
    /// No FFT bin falls inside `[f_low, f_high)`, every downstream
    /// reduction would be over zero elements.
    #[error(
        "no frequency bins retained in the {f_low} Hz..{f_high} Hz passband \
         at a sample rate of {sample_rate} Hz"
    )]
    EmptyBand { f_low: F, f_high: F, sample_rate: F },
    #[error("hop length must be non-zero")]
    ZeroHop,
    #[error("window length {window_length} exceeds the FFT size {n_fft}")]
    WindowExceedsFft { window_length: usize, n_fft: usize },
    #[error("channel {channel} has {len} samples, expected {expected}")]
    ChannelLengthMismatch {
        channel: usize,
        len: usize,
        expected: usize,
    },
    #[error("waveform contains no samples")]
    EmptyWaveform,
    #[error("waveform of {samples} samples is too short, need at least {min}")]
    ShortWaveform { samples: usize, min: usize },
    #[error("waveform sampled at {actual} Hz, configured for {expected} Hz")]
    SampleRateMismatch { expected: F, actual: F },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
