use std::iter;
#[cfg(feature = "wav")]
use std::path::Path;

use itertools::Itertools;
use ndarray::{Array2, ArrayView1};
use num::{FromPrimitive, ToPrimitive};

use crate::{Error, Result, F};

/// Multi-channel waveform buffer.
///
/// Channel-major storage, every channel shares the same length and sample
/// rate; both are enforced by the constructors. Immutable input to the
/// estimator.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub struct Audio {
    pub(crate) sample_rate: F,
    pub(crate) data: Array2<F>,
}

impl Audio {
    #[must_use]
    pub fn channels(&self) -> usize {
        self.data.dim().0
    }

    #[must_use]
    pub fn samples(&self) -> usize {
        self.data.dim().1
    }

    #[must_use]
    pub fn sample_rate(&self) -> F {
        self.sample_rate
    }

    #[cfg(feature = "wav")]
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        use std::fs::File;
        Self::from_wav(File::open(path).unwrap())
    }

    #[cfg(feature = "wav")]
    pub fn from_wav<R: std::io::Read>(data: R) -> Self {
        let reader = hound::WavReader::new(data).unwrap();
        let spec = reader.spec();
        match spec.sample_format {
            hound::SampleFormat::Float => Self::from_interleaved(
                spec.sample_rate as F,
                spec.channels as usize,
                reader
                    .into_samples()
                    .collect::<Result<Vec<f32>, _>>()
                    .unwrap(),
            )
            .unwrap(),
            hound::SampleFormat::Int => Self::from_interleaved(
                spec.sample_rate as F,
                spec.channels as usize,
                reader
                    .into_samples()
                    .map_ok(normalize_pcm_wav(spec.bits_per_sample))
                    .collect::<Result<Vec<F>, _>>()
                    .unwrap(),
            )
            .unwrap(),
        }
    }

    /// Builds from frame-interleaved samples, i.e. `c1s1, c2s1, c1s2, ...`.
    pub fn from_interleaved(
        sample_rate: F,
        channels: usize,
        data: impl IntoIterator<Item = impl Into<F>>,
    ) -> Result<Self> {
        let data = data.into_iter().map_into().collect_vec();
        if channels == 0 || data.is_empty() {
            return Err(Error::EmptyWaveform);
        }
        if data.len() % channels != 0 {
            return Err(Error::ChannelLengthMismatch {
                channel: channels - 1,
                len: data.len() / channels,
                expected: data.len() / channels + 1,
            });
        }
        Ok(Self {
            sample_rate,
            data: Array2::from_shape_fn((channels, data.len() / channels), |(c, s)| {
                data[c + s * channels].to_f64().unwrap()
            }),
        })
    }

    /// Builds from one sample sequence per channel.
    pub fn from_channels(
        sample_rate: F,
        channels: impl IntoIterator<Item = impl IntoIterator<Item = impl Into<F>>>,
    ) -> Result<Self> {
        let channels = channels
            .into_iter()
            .map(|c| c.into_iter().map_into().collect_vec())
            .collect_vec();
        let expected = channels.first().ok_or(Error::EmptyWaveform)?.len();
        for (channel, data) in channels.iter().enumerate() {
            if data.len() != expected {
                return Err(Error::ChannelLengthMismatch {
                    channel,
                    len: data.len(),
                    expected,
                });
            }
        }
        if expected == 0 {
            return Err(Error::EmptyWaveform);
        }
        Ok(Self {
            sample_rate,
            data: Array2::from_shape_fn((channels.len(), expected), |(c, s)| channels[c][s]),
        })
    }

    pub fn to_interleaved<T: FromPrimitive>(&self) -> impl Iterator<Item = T> + '_ {
        let channels = self.channels();
        let mut channel = channels - 1;
        let mut sample = 0;
        iter::from_fn(move || {
            channel = (channel + 1) % channels;
            if channel == 0 && sample == self.samples() {
                return None;
            }
            let value = self.data[(channel, sample)];
            if channel == channels - 1 {
                sample += 1;
            }
            Some(T::from_f64(value).expect("audio format can be converted"))
        })
    }

    pub(crate) fn channel(&self, channel: usize) -> ArrayView1<F> {
        self.data.row(channel)
    }
}

impl float_cmp::ApproxEq for &Audio {
    type Margin = float_cmp::F64Margin;

    fn approx_eq<M: Into<Self::Margin>>(self, other: Self, margin: M) -> bool {
        let margin = margin.into();
        self.data.dim() == other.data.dim()
            && self.sample_rate.approx_eq(other.sample_rate, margin)
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(&a, &b)| a.approx_eq(b, margin))
    }
}

/// Utility to normalize integer wav data.
#[cfg(feature = "wav")]
pub fn normalize_pcm_wav(bits_per_sample: u16) -> impl Fn(i32) -> F {
    match bits_per_sample {
        u @ 0..=8 => Box::new(move |s: i32| {
            (s - 2i32.pow(u as u32 - 1)) as F / (2f64.powi(u as i32 - 1) - 1.)
        }) as Box<dyn Fn(i32) -> F>,
        i => Box::new(move |s: i32| s as F / (2f64.powi(i as i32) - 1.)),
    }
}

#[cfg(test)]
mod test {
    use float_cmp::assert_approx_eq;
    use itertools::Itertools;

    use super::*;
    use crate::Error;

    #[test]
    fn ragged_channels_are_rejected() {
        let err = Audio::from_channels(16_000., [vec![0.; 8], vec![0.; 7]]).unwrap_err();
        assert_eq!(
            err,
            Error::ChannelLengthMismatch {
                channel: 1,
                len: 7,
                expected: 8
            }
        );
    }

    #[test]
    fn empty_waveforms_are_rejected() {
        assert_eq!(
            Audio::from_channels(16_000., Vec::<Vec<F>>::new()).unwrap_err(),
            Error::EmptyWaveform
        );
        assert_eq!(
            Audio::from_channels(16_000., [Vec::<F>::new()]).unwrap_err(),
            Error::EmptyWaveform
        );
        assert_eq!(
            Audio::from_interleaved(16_000., 2, Vec::<F>::new()).unwrap_err(),
            Error::EmptyWaveform
        );
    }

    #[test]
    fn round_trip_interleaved() {
        let expected =
            Audio::from_channels(16_000., [[0.1, 0.2, 0.3], [-0.1, -0.2, -0.3]]).unwrap();
        let interleaved = expected.to_interleaved::<F>().collect_vec();
        assert_eq!(interleaved, vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3]);
        let actual = Audio::from_interleaved(16_000., 2, interleaved).unwrap();
        assert_approx_eq!(&Audio, &actual, &expected, epsilon = 1e-12);
    }
}
