#![warn(clippy::pedantic)]
#![allow(
    clippy::missing_panics_doc,
    clippy::cast_lossless,
    clippy::cast_precision_loss
)]
//! Steered response power (SRP) direction of arrival estimation for uniform
//! linear microphone arrays, using delay-and-sum beamforming in the STFT
//! domain.
//!
//! Build an [`Srp`] from an [`SrpConfig`], feed it a multi-channel
//! [`Audio`] block and get back the arrival angle in degrees relative to
//! broadside together with the per-angle power curve:
//!
//! ```no_run
//! use srp_doa::{Audio, SrpConfig};
//!
//! # fn main() -> Result<(), srp_doa::Error> {
//! let srp = SrpConfig {
//!     d_inter: 0.02,
//!     ..SrpConfig::default()
//! }
//! .create()?;
//! let audio = Audio::from_channels(16_000., vec![vec![0.; 16_000]; 4])?;
//! let estimate = srp.estimate(&audio)?;
//! println!("doa: {}°", estimate.angle);
//! # Ok(())
//! # }
//! ```
use num::complex::Complex;

mod audio;
pub use audio::*;
mod error;
pub use error::{Error, Result};
pub mod srp;
pub use srp::{DoaEstimate, Srp, SrpConfig};
mod utils;

pub type F = f64;
pub type C = Complex<F>;
