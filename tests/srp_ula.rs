use std::f64::consts::PI;

use float_cmp::assert_approx_eq;
use itertools::Itertools;
use srp_doa::{Audio, SrpConfig, F};

/// Far-field tone arriving from `angle` degrees, synthesized by phase
/// shifting each element by the plane-wave delay. `elements` gives the
/// array element feeding each channel, allowing reversed channel order.
fn tone_from(
    angle: F,
    elements: impl IntoIterator<Item = usize>,
    freq: F,
    config: &SrpConfig,
    seconds: F,
) -> Audio {
    let delay = config.d_inter * angle.to_radians().sin() / config.speed_of_sound;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let samples = (seconds * config.sample_rate) as usize;
    Audio::from_channels(
        config.sample_rate,
        elements.into_iter().map(|m| {
            (0..samples)
                .map(|t| (2. * PI * freq * (t as F / config.sample_rate + m as F * delay)).sin())
                .collect_vec()
        }),
    )
    .unwrap()
}

#[test]
fn recovers_oblique_source() {
    let config = SrpConfig::default();
    let srp = config.create().unwrap();
    // 750 Hz sits exactly on an FFT bin of the default configuration
    let audio = tone_from(20., 0..4, 750., &config, 0.5);
    let estimate = srp.estimate(&audio).unwrap();
    assert_eq!(estimate.power_curve.len(), 361);
    assert_eq!(estimate.power_curve.len(), srp.angles().len());
    assert!(
        (estimate.angle - 20.).abs() <= 1.,
        "expected 20°, estimated {}°",
        estimate.angle
    );
}

#[test]
fn recovers_broadside_source_exactly() {
    let config = SrpConfig::default();
    let srp = config.create().unwrap();
    let audio = tone_from(0., 0..4, 750., &config, 0.5);
    let estimate = srp.estimate(&audio).unwrap();
    assert_approx_eq!(F, estimate.angle, 0.);
}

#[test]
fn recovers_negative_angles() {
    let config = SrpConfig::default();
    let srp = config.create().unwrap();
    let audio = tone_from(-40., 0..4, 750., &config, 0.5);
    let estimate = srp.estimate(&audio).unwrap();
    assert!(
        (estimate.angle + 40.).abs() <= 1.,
        "expected -40°, estimated {}°",
        estimate.angle
    );
}

#[test]
fn off_grid_source_lands_within_one_step() {
    let config = SrpConfig::default();
    let srp = config.create().unwrap();
    let audio = tone_from(10.25, 0..4, 750., &config, 0.5);
    let estimate = srp.estimate(&audio).unwrap();
    assert!(
        (estimate.angle - 10.25).abs() <= config.resolution,
        "expected 10.25° ± {}, estimated {}°",
        config.resolution,
        estimate.angle
    );
}

/// Reversing the channel order mirrors the array, so the power curve must
/// mirror too. Validates the sign convention of the steering phase.
#[test]
fn channel_reversal_mirrors_the_power_curve() {
    let config = SrpConfig::default();
    let srp = config.create().unwrap();
    let forward = srp
        .angular_power(&tone_from(35., 0..4, 750., &config, 0.5))
        .unwrap();
    let reversed = srp
        .angular_power(&tone_from(35., (0..4).rev(), 750., &config, 0.5))
        .unwrap();
    for (&a, &b) in forward.iter().zip(reversed.iter().rev()) {
        assert_approx_eq!(F, a, b, ulps = 8);
    }
}

#[test]
fn power_curve_is_deterministic() {
    let config = SrpConfig::default();
    let srp = config.create().unwrap();
    let audio = tone_from(20., 0..4, 750., &config, 0.5);
    let first = srp.estimate(&audio).unwrap();
    let second = srp.estimate(&audio).unwrap();
    assert_eq!(first.power_curve, second.power_curve);
    assert_approx_eq!(F, first.angle, second.angle);
}
