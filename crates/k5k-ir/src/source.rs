//! Source parameters: oscillator, filter, amplifier and LFO for one voice layer.

use serde::Serialize;

use crate::common::{ControlAssignment, ModulationTarget};

/// Wave kit number (1-based) that selects the additive (ADD) kit instead
/// of a PCM wave. Stored on the device as 512.
pub const ADD_WAVE_KIT: u16 = 513;

/// Highest PCM wave kit number (1-based).
pub const MAX_PCM_WAVE_KIT: u16 = 342;

/// One source of a patch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Source {
    pub zone_low: u8,
    pub zone_high: u8,
    pub velocity_switch: VelocitySwitch,
    pub effect_path: u8,
    pub volume: u8,
    pub bender_pitch: u8,
    pub bender_cutoff: u8,
    pub pressure: ControllerPair,
    pub wheel: ControllerPair,
    pub expression: ControllerPair,
    pub assign1: ControlAssignment,
    pub assign2: ControlAssignment,
    pub key_on_delay: u8,
    pub pan: Pan,
    pub oscillator: Oscillator,
    pub filter: Filter,
    pub amplifier: Amplifier,
    pub lfo: Lfo,
}

impl Source {
    /// Does this source play the additive wave kit?
    pub fn is_additive(&self) -> bool {
        self.oscillator.is_additive()
    }
}

/// Velocity switch byte, unpacked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VelocitySwitch {
    /// Switch mode (0 = off, 1 = loud, 2 = soft), bits 5-6
    pub kind: u8,
    /// Threshold step, bits 0-4
    pub threshold: u8,
}

/// Two modulation targets driven by one performance controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ControllerPair {
    pub target1: ModulationTarget,
    pub target2: ModulationTarget,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Pan {
    /// Pan mode (normal, key scaling, negative key scaling, random)
    pub kind: u8,
    /// Normal pan position, -63 (left) to +63 (right)
    pub value: i8,
}

/// DCO settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Oscillator {
    /// Wave kit number, 1-based. [`ADD_WAVE_KIT`] selects the additive kit.
    pub wave_kit: u16,
    pub coarse: i8,
    pub fine: i8,
    /// 0 = off, otherwise the fixed MIDI key
    pub fixed_key: u8,
    /// Key scaling to pitch (0 = 0 cent, 1 = 25, 2 = 33, 3 = 50)
    pub key_scaling_pitch: u8,
    pub envelope: PitchEnvelope,
}

impl Oscillator {
    pub fn is_additive(&self) -> bool {
        self.wave_kit == ADD_WAVE_KIT
    }

    pub fn is_pcm(&self) -> bool {
        (1..=MAX_PCM_WAVE_KIT).contains(&self.wave_kit)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PitchEnvelope {
    pub start_level: i8,
    pub attack_time: u8,
    pub attack_level: i8,
    pub decay_time: u8,
    /// Velocity sensitivity of the envelope times
    pub time_velocity: i8,
    /// Velocity sensitivity of the envelope levels
    pub level_velocity: i8,
}

/// DCF settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Filter {
    pub bypass: bool,
    /// 0 = low pass, 1 = high pass
    pub mode: u8,
    /// Velocity curve, 1-12
    pub velocity_curve: u8,
    pub resonance: u8,
    pub level: u8,
    pub cutoff: u8,
    pub cutoff_key_scaling: i8,
    pub cutoff_velocity: i8,
    pub envelope_depth: i8,
    pub envelope: FilterEnvelope,
    pub key_scaling: FilterKeyScaling,
    pub velocity: FilterVelocity,
}

/// Filter envelope. Unlike the amplifier envelope, the decay levels are signed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FilterEnvelope {
    pub attack_time: u8,
    pub decay1_time: u8,
    pub decay1_level: i8,
    pub decay2_time: u8,
    pub decay2_level: i8,
    pub release_time: u8,
}

/// Key scaling to filter envelope times.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FilterKeyScaling {
    pub attack_time: i8,
    pub decay1_time: i8,
}

/// Velocity to filter envelope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FilterVelocity {
    pub depth: i8,
    pub attack_time: i8,
    pub decay1_time: i8,
}

/// DCA settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Amplifier {
    /// Velocity curve byte exactly as stored.
    ///
    /// Revisions of the format documentation disagree on whether this one is
    /// zero- or one-based, so it is not adjusted. See
    /// [`Amplifier::velocity_curve_one_based`].
    pub velocity_curve: u8,
    pub envelope: AmplifierEnvelope,
    pub key_scaling: KeyScalingModifier,
    pub velocity: VelocityModifier,
}

impl Amplifier {
    /// The velocity curve treating the stored byte as zero-based (1-12).
    pub fn velocity_curve_one_based(&self) -> u8 {
        self.velocity_curve.wrapping_add(1)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AmplifierEnvelope {
    pub attack_time: u8,
    pub decay1_time: u8,
    pub decay1_level: u8,
    pub decay2_time: u8,
    pub decay2_level: u8,
    pub release_time: u8,
}

/// Key scaling to amplifier envelope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct KeyScalingModifier {
    pub level: i8,
    pub attack_time: i8,
    pub decay1_time: i8,
    pub release_time: i8,
}

/// Velocity to amplifier envelope. The level is unsigned (0-63).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VelocityModifier {
    pub level: u8,
    pub attack_time: i8,
    pub decay1_time: i8,
    pub release_time: i8,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Lfo {
    /// Triangle, square, sawtooth, sine, random
    pub waveform: u8,
    pub speed: u8,
    pub delay_onset: u8,
    pub fade_in_time: u8,
    pub fade_in_to_speed: u8,
    pub vibrato: LfoDepth,
    pub growl: LfoDepth,
    pub tremolo: LfoDepth,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LfoDepth {
    pub depth: u8,
    pub key_scaling: i8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_kit_is_not_pcm() {
        let mut osc = Oscillator { wave_kit: ADD_WAVE_KIT, ..Oscillator::default() };
        assert!(osc.is_additive());
        assert!(!osc.is_pcm());

        osc.wave_kit = 1;
        assert!(!osc.is_additive());
        assert!(osc.is_pcm());

        osc.wave_kit = MAX_PCM_WAVE_KIT + 1;
        assert!(!osc.is_pcm());
    }

    #[test]
    fn amplifier_curve_is_kept_raw() {
        let amp = Amplifier { velocity_curve: 0, ..Amplifier::default() };
        assert_eq!(amp.velocity_curve, 0);
        assert_eq!(amp.velocity_curve_one_based(), 1);
    }
}
