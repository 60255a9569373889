//! Additive (ADD) wave kit: 64 harmonics with per-harmonic envelopes and a
//! 128-band formant filter.

use serde::Serialize;

/// Harmonics per level set.
pub const HARMONIC_COUNT: usize = 64;

/// Formant filter bands.
pub const FORMANT_BANDS: usize = 128;

/// One additive wave kit, owned by the source that selects the ADD wave.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AdditiveKit {
    /// Checksum byte as stored on the device
    pub checksum: u8,
    /// MORF (harmonic morphing) enabled
    pub morf: bool,
    pub harmonics: HarmonicParams,
    pub formant: FormantParams,
    /// Soft harmonic levels
    #[serde(serialize_with = "crate::big_array::serialize")]
    pub levels_low: [u8; HARMONIC_COUNT],
    /// Loud harmonic levels
    #[serde(serialize_with = "crate::big_array::serialize")]
    pub levels_high: [u8; HARMONIC_COUNT],
    #[serde(serialize_with = "crate::big_array::serialize")]
    pub formant_filter: [u8; FORMANT_BANDS],
    #[serde(serialize_with = "crate::big_array::serialize")]
    pub envelopes: [HarmonicEnvelope; HARMONIC_COUNT],
    /// Trailing byte, kept so the kit re-encodes unchanged
    pub reserved: u8,
}

impl Default for AdditiveKit {
    fn default() -> Self {
        Self {
            checksum: 0,
            morf: false,
            harmonics: HarmonicParams::default(),
            formant: FormantParams::default(),
            levels_low: [0; HARMONIC_COUNT],
            levels_high: [0; HARMONIC_COUNT],
            formant_filter: [0; FORMANT_BANDS],
            envelopes: [HarmonicEnvelope::default(); HARMONIC_COUNT],
            reserved: 0,
        }
    }
}

impl AdditiveKit {
    /// Index of the loudest soft-level harmonic (0-based), if any is non-zero.
    pub fn strongest_harmonic(&self) -> Option<usize> {
        self.levels_low
            .iter()
            .enumerate()
            .filter(|&(_, &level)| level > 0)
            .max_by_key(|&(i, &level)| (level, std::cmp::Reverse(i)))
            .map(|(i, _)| i)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HarmonicParams {
    pub total_gain: u8,
    pub group: u8,
    pub key_scaling: i8,
    /// Velocity curve, 1-12
    pub velocity_curve: u8,
    pub velocity_depth: u8,
    pub copies: [HarmonicCopy; 4],
    pub morf_envelope: MorfEnvelope,
}

/// Source of one MORF harmonic copy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HarmonicCopy {
    pub patch: u8,
    pub source: u8,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MorfEnvelope {
    pub times: [u8; 4],
    pub loop_type: u8,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FormantParams {
    pub bias: i8,
    /// Formant modulated by the LFO rather than the envelope
    pub lfo_selected: bool,
    pub envelope_depth: i8,
    pub envelope: FormantEnvelope,
    pub lfo: FormantLfo,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FormantEnvelope {
    pub rates: [u8; 4],
    pub levels: [i8; 4],
    pub loop_type: u8,
    pub velocity_sensitivity: i8,
    pub key_scaling: i8,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FormantLfo {
    pub speed: u8,
    pub shape: u8,
    pub depth: u8,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EnvelopeSegment {
    pub rate: u8,
    pub level: u8,
}

/// Envelope of a single harmonic.
///
/// On the device the loop flags share a byte with the level of segments 2
/// and 3. They are split out here; segment levels are always 0-63.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HarmonicEnvelope {
    pub segments: [EnvelopeSegment; 4],
    pub loop_segment1: bool,
    pub loop_segment2: bool,
}

impl HarmonicEnvelope {
    pub fn is_looping(&self) -> bool {
        self.loop_segment1 || self.loop_segment2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_kit_is_silent() {
        let kit = AdditiveKit::default();
        assert_eq!(kit.strongest_harmonic(), None);
        assert!(kit.envelopes.iter().all(|e| !e.is_looping()));
    }

    #[test]
    fn strongest_harmonic_prefers_lowest_on_tie() {
        let mut kit = AdditiveKit::default();
        kit.levels_low[3] = 100;
        kit.levels_low[7] = 100;
        kit.levels_low[10] = 20;
        assert_eq!(kit.strongest_harmonic(), Some(3));
    }
}
