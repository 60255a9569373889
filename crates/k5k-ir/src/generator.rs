//! Single-patch generator: an additive layer built from harmonic levels plus
//! a PCM layer.

use crate::additive::{AdditiveKit, EnvelopeSegment, HarmonicEnvelope, HARMONIC_COUNT};
use crate::bank::Patch;
use crate::source::{
    Amplifier, AmplifierEnvelope, Filter, FilterEnvelope, FilterVelocity, Oscillator,
    PitchEnvelope, Source, VelocityModifier, ADD_WAVE_KIT, MAX_PCM_WAVE_KIT,
};

const fn shape(segments: [(u8, u8); 4]) -> HarmonicEnvelope {
    let [a, b, c, d] = segments;
    HarmonicEnvelope {
        segments: [
            EnvelopeSegment { rate: a.0, level: a.1 },
            EnvelopeSegment { rate: b.0, level: b.1 },
            EnvelopeSegment { rate: c.0, level: c.1 },
            EnvelopeSegment { rate: d.0, level: d.1 },
        ],
        loop_segment1: false,
        loop_segment2: false,
    }
}

/// Named harmonic envelopes, as (rate, level) per segment.
pub const HARMONIC_ENVELOPES: [(&str, HarmonicEnvelope); 5] = [
    ("piano", shape([(125, 63), (92, 63), (49, 63), (39, 49)])),
    ("epiano", shape([(127, 63), (81, 63), (15, 63), (0, 0)])),
    ("pluck", shape([(127, 63), (118, 63), (79, 63), (0, 0)])),
    ("padFast", shape([(83, 63), (63, 63), (64, 63), (52, 0)])),
    ("padSlow", shape([(67, 63), (63, 63), (64, 63), (0, 0)])),
];

/// Find a harmonic envelope by name, ignoring case.
pub fn harmonic_envelope(name: &str) -> Option<HarmonicEnvelope> {
    HARMONIC_ENVELOPES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|&(_, e)| e)
}

fn layer(wave_kit: u16, release_time: u8, velocity_times: i8) -> Source {
    Source {
        zone_low: 0,
        zone_high: 127,
        volume: 120,
        bender_pitch: 2,
        bender_cutoff: 12,
        oscillator: Oscillator {
            wave_kit,
            envelope: PitchEnvelope {
                attack_time: 4,
                decay_time: 64,
                ..PitchEnvelope::default()
            },
            ..Oscillator::default()
        },
        filter: Filter {
            bypass: false,
            velocity_curve: 5,
            level: 7,
            cutoff: 55,
            envelope_depth: 25,
            envelope: FilterEnvelope {
                attack_time: 0,
                decay1_time: 120,
                decay1_level: 63,
                decay2_time: 80,
                decay2_level: 63,
                release_time: 20,
            },
            velocity: FilterVelocity {
                depth: 30,
                ..FilterVelocity::default()
            },
            ..Filter::default()
        },
        amplifier: Amplifier {
            envelope: AmplifierEnvelope {
                attack_time: 1,
                decay1_time: 94,
                decay1_level: 127,
                decay2_time: 80,
                decay2_level: 63,
                release_time,
            },
            velocity: VelocityModifier {
                level: 20,
                attack_time: velocity_times,
                decay1_time: velocity_times,
                release_time: velocity_times,
            },
            ..Amplifier::default()
        },
        ..Source::default()
    }
}

/// Build a two-source patch: source 1 plays an additive kit with `levels`
/// and every harmonic shaped by `envelope`, source 2 plays PCM wave kit
/// `pcm_wave`. Returns `None` when `pcm_wave` is not a PCM kit number.
pub fn additive_patch(
    name: &str,
    levels: &[u8; HARMONIC_COUNT],
    envelope: HarmonicEnvelope,
    pcm_wave: u16,
) -> Option<Patch> {
    if !(1..=MAX_PCM_WAVE_KIT).contains(&pcm_wave) {
        return None;
    }

    let mut patch = Patch::default();
    let common = &mut patch.common;
    common.set_name(name);
    common.effect_algorithm = 1;
    common.volume = 115;
    common.source_count = 2;

    let mut kit = AdditiveKit::default();
    kit.levels_low = *levels;
    kit.envelopes = [envelope; HARMONIC_COUNT];

    patch.sources.push(layer(ADD_WAVE_KIT, 20, 20));
    patch.sources.push(layer(pcm_wave, 15, 0));
    patch.additive_kits.push(kit);
    patch.additive_slots[0] = true;
    Some(patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harmonics::{harmonic_levels, preset};

    #[test]
    fn envelope_lookup_ignores_case() {
        let pluck = harmonic_envelope("PLUCK").unwrap();
        assert_eq!(pluck.segments[1].rate, 118);
        assert!(harmonic_envelope("padfast").is_some());
        assert!(harmonic_envelope("organ").is_none());
    }

    #[test]
    fn additive_layer_comes_first() {
        let levels = harmonic_levels(&preset("saw").unwrap());
        let env = harmonic_envelope("pluck").unwrap();
        let patch = additive_patch("SawPluck", &levels, env, 100).unwrap();

        assert_eq!(patch.name(), "SawPluck");
        assert_eq!(patch.common.source_count, 2);
        assert_eq!(patch.source_types(), "AP----");
        assert_eq!(patch.sources[1].oscillator.wave_kit, 100);

        let kit = patch.additive_kit(0).unwrap();
        assert_eq!(kit.levels_low, levels);
        assert!(kit.envelopes.iter().all(|e| *e == env));
    }

    #[test]
    fn pcm_layer_must_be_a_pcm_kit() {
        let levels = [0u8; HARMONIC_COUNT];
        let env = HarmonicEnvelope::default();
        assert!(additive_patch("X", &levels, env, 0).is_none());
        assert!(additive_patch("X", &levels, env, MAX_PCM_WAVE_KIT + 1).is_none());
        assert!(additive_patch("X", &levels, env, MAX_PCM_WAVE_KIT).is_some());
    }
}
