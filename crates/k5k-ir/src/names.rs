//! Name and parameter-label tables for enumerated values.
//!
//! Decoding keeps every enumeration byte as stored, so a bank from a newer
//! firmware or a damaged file still decodes. The lookups here are where an
//! unknown value finally surfaces, as [`OutOfRangeEnumeration`].

use thiserror::Error;

/// A stored enumeration value has no entry in its name table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("{table} index {index} has no name")]
pub struct OutOfRangeEnumeration {
    pub table: &'static str,
    pub index: u8,
}

/// Reverb type name and the labels of its four parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReverbInfo {
    pub name: &'static str,
    pub params: [&'static str; 4],
}

/// Effect type name and the labels of its four parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectInfo {
    pub name: &'static str,
    pub params: [&'static str; 4],
}

const REVERB_PARAMS: [&str; 4] = ["Dry/Wet", "Reverb Time", "Predelay Time", "High Frequency Damping"];
const DELAY_REVERB_PARAMS: [&str; 4] = ["Dry/Wet", "Feedback", "Predelay Time", "High Frequency Damping"];
const LONG_DELAY_PARAMS: [&str; 4] = ["Dry/Wet", "Feedback", "Delay Time", "High Frequency Damping"];

pub const REVERBS: [ReverbInfo; 11] = [
    ReverbInfo { name: "Hall 1", params: REVERB_PARAMS },
    ReverbInfo { name: "Hall 2", params: REVERB_PARAMS },
    ReverbInfo { name: "Hall 3", params: REVERB_PARAMS },
    ReverbInfo { name: "Room 1", params: REVERB_PARAMS },
    ReverbInfo { name: "Room 2", params: REVERB_PARAMS },
    ReverbInfo { name: "Room 3", params: REVERB_PARAMS },
    ReverbInfo { name: "Plate 1", params: REVERB_PARAMS },
    ReverbInfo { name: "Plate 2", params: REVERB_PARAMS },
    ReverbInfo { name: "Plate 3", params: REVERB_PARAMS },
    ReverbInfo { name: "Reverse", params: DELAY_REVERB_PARAMS },
    ReverbInfo { name: "Long Delay", params: LONG_DELAY_PARAMS },
];

const REFLECTION: [&str; 4] = ["Slope", "Predelay Time", "Feedback", "Level"];
const TAP_DELAY: [&str; 4] = ["Delay Time 1", "Tap Level", "Delay Time 2", "Feedback"];
const DELAY: [&str; 4] = ["Delay Time L", "Feedback", "Delay Time R", "High Frequency Damping"];
const AUTO_PAN: [&str; 4] = ["Speed", "Shape", "Depth", "Phase"];
const MODULATION: [&str; 4] = ["Speed", "Depth", "Predelay Time", "Wave"];
const MODULATION_DELAY: [&str; 4] = ["Speed", "Depth", "Delay Time", "Feedback"];
const FLANGER: [&str; 4] = ["Speed", "Depth", "Predelay Time", "Feedback"];
const TREMOLO: [&str; 4] = ["Speed", "Depth", "Phase", "Wave"];
const PHASER: [&str; 4] = ["Speed", "Depth", "Manual", "Feedback"];
const ROTARY: [&str; 4] = ["Slow Speed", "Fast Speed", "Acceleration", "Slow/Fast Switch"];
const FILTER: [&str; 4] = ["Sense", "Frequency Bottom", "Frequency Top", "Resonance"];
const EXCITER: [&str; 4] = ["Harmonics", "Frequency", "Blend", "Emphasis"];
const DRIVE: [&str; 4] = ["Drive", "Tone", "Presence", "Level"];
const DRIVE_DELAY: [&str; 4] = ["Drive", "Tone", "Delay Time", "Feedback"];

const fn effect(name: &'static str, params: [&'static str; 4]) -> EffectInfo {
    EffectInfo { name, params }
}

/// Effect table as the device lists it. It has one entry more than the
/// documented effect count ([`DOCUMENTED_EFFECT_COUNT`]); both are kept
/// until checked against hardware.
pub const EFFECTS: [EffectInfo; 37] = [
    effect("Early Reflection 1", REFLECTION),
    effect("Early Reflection 2", REFLECTION),
    effect("Tap Delay 1", TAP_DELAY),
    effect("Tap Delay 2", TAP_DELAY),
    effect("Single Delay", DELAY),
    effect("Dual Delay", DELAY),
    effect("Stereo Delay", DELAY),
    effect("Cross Delay", DELAY),
    effect("Auto Pan", AUTO_PAN),
    effect("Auto Pan & Delay", MODULATION_DELAY),
    effect("Chorus 1", MODULATION),
    effect("Chorus 2", MODULATION),
    effect("Chorus 1 & Delay", MODULATION_DELAY),
    effect("Chorus 2 & Delay", MODULATION_DELAY),
    effect("Flanger 1", FLANGER),
    effect("Flanger 2", FLANGER),
    effect("Flanger 1 & Delay", MODULATION_DELAY),
    effect("Flanger 2 & Delay", MODULATION_DELAY),
    effect("Ensemble", MODULATION),
    effect("Ensemble & Delay", MODULATION_DELAY),
    effect("Celeste", MODULATION),
    effect("Celeste & Delay", MODULATION_DELAY),
    effect("Tremolo", TREMOLO),
    effect("Tremolo & Delay", MODULATION_DELAY),
    effect("Phaser 1", PHASER),
    effect("Phaser 2", PHASER),
    effect("Phaser 1 & Delay", MODULATION_DELAY),
    effect("Phaser 2 & Delay", MODULATION_DELAY),
    effect("Rotary", ROTARY),
    effect("Autowah", FILTER),
    effect("Bandpass", FILTER),
    effect("Exciter", EXCITER),
    effect("Enhancer", EXCITER),
    effect("Overdrive", DRIVE),
    effect("Distortion", DRIVE),
    effect("Overdrive & Delay", DRIVE_DELAY),
    effect("Distortion & Delay", DRIVE_DELAY),
];

/// Effect count stated by the device documentation.
pub const DOCUMENTED_EFFECT_COUNT: usize = 36;

const POLYPHONY: [&str; 3] = ["POLY", "SOLO1", "SOLO2"];
const FILTER_MODES: [&str; 2] = ["Low Pass", "High Pass"];
const LFO_WAVEFORMS: [&str; 5] = ["Triangle", "Square", "Sawtooth", "Sine", "Random"];

fn lookup<T>(table: &'static str, entries: &'static [T], index: u8) -> Result<&'static T, OutOfRangeEnumeration> {
    entries.get(index as usize).ok_or(OutOfRangeEnumeration { table, index })
}

pub fn reverb_info(kind: u8) -> Result<&'static ReverbInfo, OutOfRangeEnumeration> {
    lookup("reverb", &REVERBS, kind)
}

/// Look up an effect by table index (see [`crate::Effect::effect_type`]).
pub fn effect_info(index: u8) -> Result<&'static EffectInfo, OutOfRangeEnumeration> {
    lookup("effect", &EFFECTS, index)
}

pub fn polyphony_name(mode: u8) -> Result<&'static str, OutOfRangeEnumeration> {
    lookup("polyphony", &POLYPHONY, mode).copied()
}

pub fn filter_mode_name(mode: u8) -> Result<&'static str, OutOfRangeEnumeration> {
    lookup("filter mode", &FILTER_MODES, mode).copied()
}

pub fn lfo_waveform_name(waveform: u8) -> Result<&'static str, OutOfRangeEnumeration> {
    lookup("LFO waveform", &LFO_WAVEFORMS, waveform).copied()
}
