//! Harmonic level generator for additive kits.
//!
//! Levels follow Leiter's closed-form spectrum for classic analog shapes:
//!
//! ```text
//! a(n) = 1/n^A * sin(n*pi*XP)^B * cos(n*pi*XP)^C * sin(n*pi*YP)^D * cos(n*pi*YP)^E
//! ```
//!
//! and are converted to the device's 0-127 level scale, where 8 steps make
//! one octave of amplitude.

use core::f64::consts::PI;

use crate::additive::HARMONIC_COUNT;

/// Maximum harmonic level.
const MAX_LEVEL: f64 = 127.0;

/// Spectrum shape parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveformParameters {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub xp: f64,
    pub d: f64,
    pub e: f64,
    pub yp: f64,
}

const fn params(a: f64, b: f64, c: f64, xp: f64, d: f64, e: f64, yp: f64) -> WaveformParameters {
    WaveformParameters { a, b, c, xp, d, e, yp }
}

/// Named waveform presets.
pub const PRESETS: [(&str, WaveformParameters); 10] = [
    ("Saw", params(1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0)),
    ("Square", params(1.0, 1.0, 0.0, 0.5, 0.0, 0.0, 0.0)),
    ("Triangle", params(2.0, 1.0, 0.0, 0.5, 0.0, 0.0, 0.0)),
    ("Pulse20", params(1.0, 1.0, 0.0, 0.2, 0.0, 0.0, 0.0)),
    // 20% uneven triangle
    ("PluckedString", params(2.0, 1.0, 0.0, 0.2, 0.0, 0.0, 0.0)),
    // 10% triangular pulse
    ("Brassy", params(2.0, 2.0, 0.0, 0.1, 0.0, 0.0, 0.0)),
    ("AnalogSquare", params(3.0, 1.0, 0.0, 0.48, 2.0, 0.0, 0.035)),
    ("Oboe", params(0.4, 1.0, 0.0, 0.12, 0.0, 1.0, 0.47)),
    ("Trombone", params(2.0, 1.0, 0.0, 0.045, 1.0, 1.0, 0.0625)),
    ("FrenchHorn", params(2.0, 1.0, 0.0, 0.09, 1.0, 0.0, 0.13)),
];

/// Find a preset by name, ignoring case.
pub fn preset(name: &str) -> Option<WaveformParameters> {
    PRESETS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, p)| p)
}

fn amplitude(harmonic: u32, p: &WaveformParameters) -> f64 {
    let n = harmonic as f64;
    let x = n * PI * p.xp;
    let y = n * PI * p.yp;

    let falloff = 1.0 / libm::pow(n, p.a);
    let shape_x = libm::pow(libm::sin(x), p.b) * libm::pow(libm::cos(x), p.c);
    let shape_y = libm::pow(libm::sin(y), p.d) * libm::pow(libm::cos(y), p.e);

    falloff * shape_x * shape_y
}

fn level(harmonic: u32, p: &WaveformParameters) -> u8 {
    let level = MAX_LEVEL + 8.0 * libm::log2(libm::fabs(amplitude(harmonic, p)));
    // Also catches NaN and -inf from a zero amplitude.
    if !(level > 0.0) {
        return 0;
    }
    libm::floor(level.min(MAX_LEVEL)) as u8
}

/// Levels for harmonics 1 through 64.
pub fn harmonic_levels(p: &WaveformParameters) -> [u8; HARMONIC_COUNT] {
    let mut levels = [0u8; HARMONIC_COUNT];
    for (i, out) in levels.iter_mut().enumerate() {
        *out = level(i as u32 + 1, p);
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saw_falls_one_octave_per_doubling() {
        let levels = harmonic_levels(&preset("saw").unwrap());
        assert_eq!(levels[0], 127);
        assert_eq!(levels[1], 119);
        assert_eq!(levels[3], 111);
        assert!(levels.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn square_has_only_odd_harmonics() {
        let levels = harmonic_levels(&preset("Square").unwrap());
        assert_eq!(levels[0], 127);
        for (i, &level) in levels.iter().enumerate() {
            if (i + 1) % 2 == 0 {
                assert_eq!(level, 0, "harmonic {}", i + 1);
            } else {
                assert!(level > 0, "harmonic {}", i + 1);
            }
        }
    }

    #[test]
    fn unknown_preset() {
        assert!(preset("kazoo").is_none());
        assert!(preset("FRENCHHORN").is_some());
    }
}
