//! Steered response power DOA estimation for uniform linear arrays.
//!
//! One block of multi-channel audio in, one angle estimate plus the
//! per-angle power curve out. The sweep applies a delay-and-sum beamformer
//! in the STFT domain for every candidate angle and picks the angle with
//! the highest frequency-averaged power.
use std::f64::consts::PI;
use std::ops::Range;

use derive_more::Constructor;
use itertools::Itertools;
use log::debug;
use ndarray::{s, Array1, Array2, Array3, ArrayView3, Axis};
use rayon::prelude::*;
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;

use crate::utils::{arg_max, sqrt_hann};
use crate::{Audio, Error, Result, C, F};

/// Configuration of the estimator, an immutable value object.
///
/// Defaults match a small speech-band ULA: 2 cm element spacing, 16 kHz
/// audio and a 400 Hz..1 kHz analysis band.
#[derive(SmartDefault, Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SrpConfig {
    /// Inter-element spacing in meters, uniform across the array.
    #[default = 0.02]
    pub d_inter: F,
    #[default = 343.0]
    pub speed_of_sound: F,
    #[default = 512]
    pub n_fft: usize,
    #[default = 256]
    pub hop_length: usize,
    #[default = 512]
    pub window_length: usize,
    #[default = 16_000.0]
    pub sample_rate: F,
    /// Lower passband bound in Hz, inclusive.
    #[default = 400.0]
    pub f_low: F,
    /// Upper passband bound in Hz, exclusive.
    #[default = 1_000.0]
    pub f_high: F,
    /// Angle grid step in degrees, must evenly divide 180°.
    #[default = 0.5]
    pub resolution: F,
}

impl SrpConfig {
    /// Validates the configuration and precomputes the angle grid, the
    /// retained frequency band and the analysis window.
    ///
    /// # Errors
    /// All configuration errors of the estimator are raised here, before
    /// any signal is touched: spatial Nyquist violations, a resolution not
    /// dividing 180°, an empty passband and degenerate STFT parameters.
    pub fn create(self) -> Result<Srp> {
        let SrpConfig {
            d_inter,
            speed_of_sound,
            n_fft,
            hop_length,
            window_length,
            sample_rate,
            f_low,
            f_high,
            resolution,
        } = self;

        let limit = speed_of_sound / (2. * f_high);
        if d_inter > limit {
            return Err(Error::SpatialNyquist {
                spacing: d_inter,
                limit,
                f_high,
            });
        }

        let steps = 180. / resolution;
        if !(resolution > 0.) || (steps - steps.round()).abs() > 1e-9 {
            return Err(Error::InvalidResolution(resolution));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let angles = (0..=steps.round() as usize)
            .map(|i| i as F * resolution - 90.)
            .collect_vec();

        assert!(n_fft % 2 == 0, "the FFT size must be even");
        if hop_length == 0 {
            return Err(Error::ZeroHop);
        }
        if window_length > n_fft {
            return Err(Error::WindowExceedsFft {
                window_length,
                n_fft,
            });
        }

        let nbin = n_fft / 2 + 1;
        let f_analog = (0..nbin)
            .map(|k| k as F * sample_rate / 2. / (nbin - 1) as F)
            .collect_vec();
        // half-open band: f_low inclusive, f_high exclusive
        let band = f_analog.partition_point(|&f| f < f_low)..f_analog.partition_point(|&f| f < f_high);
        if band.is_empty() {
            return Err(Error::EmptyBand {
                f_low,
                f_high,
                sample_rate,
            });
        }
        let freqs = f_analog[band.clone()].to_vec();
        debug!(
            "{} frequency bins retained in the {f_low} Hz..{f_high} Hz band",
            freqs.len()
        );

        // sqrt-Hann window, zero-padded centred when shorter than the FFT
        let mut window = Array1::zeros(n_fft);
        let offset = (n_fft - window_length) / 2;
        for (i, w) in sqrt_hann(window_length).enumerate() {
            window[offset + i] = w;
        }

        Ok(Srp {
            d_inter,
            speed_of_sound,
            n_fft,
            hop_length,
            sample_rate,
            resolution,
            window,
            angles,
            band,
            freqs,
        })
    }
}

/// The angle estimate together with its diagnostic power curve.
#[derive(Debug, Clone, PartialEq, Constructor)]
pub struct DoaEstimate {
    /// Estimated arrival angle in degrees relative to broadside.
    pub angle: F,
    /// Beamformed power per candidate angle, same order as
    /// [`Srp::angles`].
    pub power_curve: Array1<F>,
}

/// A validated SRP delay-and-sum estimator.
///
/// Constructed once via [`SrpConfig::create`], holds no mutable state and
/// can be shared between threads and reused across invocations.
#[derive(Debug, Clone)]
pub struct Srp {
    d_inter: F,
    speed_of_sound: F,
    n_fft: usize,
    hop_length: usize,
    sample_rate: F,
    resolution: F,
    window: Array1<F>,
    angles: Vec<F>,
    band: Range<usize>,
    freqs: Vec<F>,
}

impl Srp {
    /// Candidate angle grid in degrees, `-90..=90` stepped by the
    /// configured resolution.
    #[must_use]
    pub fn angles(&self) -> &[F] {
        &self.angles
    }

    /// Estimates the direction of arrival of the dominant source.
    ///
    /// # Errors
    /// Rejects waveforms whose sample rate differs from the configured one
    /// and waveforms too short to frame.
    pub fn estimate(&self, audio: &Audio) -> Result<DoaEstimate> {
        let x_ft = self.stft(audio)?;
        let power = self.steered_power(x_ft.view());
        let power_curve = power
            .mean_axis(Axis(0))
            .expect("the retained band is never empty");
        let index =
            arg_max(power_curve.iter().copied()).expect("the angle grid is never empty");
        let angle = index as F * self.resolution - 90.;
        debug!("doa estimate {angle}° with power {}", power_curve[index]);
        Ok(DoaEstimate { angle, power_curve })
    }

    /// The frequency-averaged power curve over the angle grid, without the
    /// arg-max decision.
    ///
    /// # Errors
    /// Same input-shape errors as [`Srp::estimate`].
    pub fn angular_power(&self, audio: &Audio) -> Result<Array1<F>> {
        Ok(self.estimate(audio)?.power_curve)
    }

    /// Per-channel STFT restricted to the retained band.
    ///
    /// Returns bins x frames x channels, with frames centred on multiples
    /// of the hop length via reflect padding.
    fn stft(&self, audio: &Audio) -> Result<Array3<C>> {
        #[allow(clippy::float_cmp)]
        if audio.sample_rate() != self.sample_rate {
            return Err(Error::SampleRateMismatch {
                expected: self.sample_rate,
                actual: audio.sample_rate(),
            });
        }
        let samples = audio.samples();
        let pad = self.n_fft / 2;
        if samples <= pad {
            return Err(Error::ShortWaveform {
                samples,
                min: pad + 1,
            });
        }
        let nfram = samples / self.hop_length + 1;
        let nbin = self.n_fft / 2 + 1;

        let mut planner = RealFftPlanner::<F>::new();
        let fft = planner.plan_fft_forward(self.n_fft);

        let mut x_ft = Array3::default((self.freqs.len(), nfram, audio.channels()));

        for channel in 0..audio.channels() {
            let row = audio.channel(channel);
            let mut padded = Vec::with_capacity(samples + 2 * pad);
            padded.extend((1..=pad).rev().map(|i| row[i]));
            padded.extend(row.iter().copied());
            padded.extend((samples - 1 - pad..samples - 1).rev().map(|i| row[i]));

            let mut x_ft = x_ft.index_axis_mut(Axis(2), channel);
            for t in 0..nfram {
                let start = t * self.hop_length;
                let mut frame = padded[start..start + self.n_fft]
                    .iter()
                    .zip(&self.window)
                    .map(|(&x, &w)| x * w)
                    .collect_vec();
                let mut frame_ft = vec![C::default(); nbin];
                fft.process(&mut frame, &mut frame_ft).unwrap();
                x_ft.index_axis_mut(Axis(1), t)
                    .assign(&Array1::from(frame_ft[self.band.clone()].to_vec()));
            }
        }
        Ok(x_ft)
    }

    /// Delay-and-sum steering sweep over the candidate angles.
    ///
    /// Angles are independent and write disjoint columns, so the sweep is a
    /// parallel map; the per-angle reduction order is fixed, keeping the
    /// result deterministic. The ordering inside one cell is magnitude,
    /// then mean over frames, then square.
    fn steered_power(&self, x_ft: ArrayView3<C>) -> Array2<F> {
        let (nbin, nfram, channels) = x_ft.dim();
        debug_assert_eq!(nbin, self.freqs.len());

        let columns = self
            .angles
            .par_iter()
            .map(|&theta| {
                let theta_sin = theta.to_radians().sin();
                let mut column = Array1::zeros(nbin);
                for (bin, &freq) in self.freqs.iter().enumerate() {
                    // plane-wave phase delay of element m relative to element 0
                    let steer = (0..channels)
                        .map(|m| {
                            (-C::i()
                                * (2. * PI * theta_sin * self.d_inter * freq * m as F
                                    / self.speed_of_sound))
                                .exp()
                        })
                        .collect_vec();
                    let mut magnitudes = 0.;
                    for t in 0..nfram {
                        let response: C = x_ft
                            .slice(s![bin, t, ..])
                            .iter()
                            .zip(&steer)
                            .map(|(x, s)| x * s)
                            .sum();
                        magnitudes += response.norm();
                    }
                    let mean = magnitudes / nfram as F;
                    column[bin] = mean * mean;
                }
                column
            })
            .collect::<Vec<_>>();

        let mut power = Array2::zeros((nbin, self.angles.len()));
        for (angle, column) in columns.into_iter().enumerate() {
            power.column_mut(angle).assign(&column);
        }
        power
    }
}
