//! Core data model for Kawai K5000 sound banks.
//!
//! This crate defines the typed representation that the bank decoders in
//! `k5k-formats` emit. Every biased or packed byte from the device format
//! is already resolved here: signed values are plain `i8`, one-based
//! enumerations are one-based, and packed flags are separate `bool`s.

mod additive;
mod analysis;
mod bank;
mod common;
mod generator;
mod harmonics;
mod names;
mod source;

pub use additive::{
    AdditiveKit, EnvelopeSegment, FormantEnvelope, FormantLfo, FormantParams, HarmonicCopy,
    HarmonicEnvelope, HarmonicParams, MorfEnvelope, FORMANT_BANDS, HARMONIC_COUNT,
};
pub use analysis::{summarize, BankSummary};
pub use bank::{
    Bank, Patch, ADDITIVE_KIT_SIZE, COMMON_SIZE, MAX_SOURCES, PATCH_COUNT, POOL_SIZE, SOURCE_SIZE,
};
pub use common::{
    ControlAssignment, Common, Effect, EffectKind, Geq, MacroController, ModulationTarget,
    Portamento, Reverb, SourceMutes, Switches, EFFECT_COUNT, GEQ_BANDS, NAME_CAPACITY,
    NAME_LENGTH,
};
pub use generator::{additive_patch, harmonic_envelope, HARMONIC_ENVELOPES};
pub use harmonics::{harmonic_levels, preset, WaveformParameters, PRESETS};
pub use names::{
    effect_info, filter_mode_name, lfo_waveform_name, polyphony_name, reverb_info, EffectInfo,
    OutOfRangeEnumeration, ReverbInfo, DOCUMENTED_EFFECT_COUNT, EFFECTS, REVERBS,
};
pub use source::{
    Amplifier, AmplifierEnvelope, ControllerPair, Filter, FilterEnvelope, FilterKeyScaling,
    FilterVelocity, KeyScalingModifier, Lfo, LfoDepth, Oscillator, Pan, PitchEnvelope, Source,
    VelocityModifier, VelocitySwitch, ADD_WAVE_KIT, MAX_PCM_WAVE_KIT,
};

/// Serialize fixed-size arrays longer than serde's built-in limit of 32.
pub(crate) mod big_array {
    use serde::{Serialize, Serializer};

    pub fn serialize<S, T, const N: usize>(values: &[T; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        serializer.collect_seq(values.iter())
    }
}
