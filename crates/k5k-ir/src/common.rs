//! Patch common parameters.

use arrayvec::ArrayString;
use bitflags::bitflags;
use serde::Serialize;

/// Number of effect slots in a patch.
pub const EFFECT_COUNT: usize = 4;

/// Number of graphic EQ bands.
pub const GEQ_BANDS: usize = 7;

/// Maximum patch name length in bytes.
pub const NAME_LENGTH: usize = 8;

/// UTF-8 capacity of a name: every Latin-1 character takes at most two bytes.
pub const NAME_CAPACITY: usize = 2 * NAME_LENGTH;

/// Common header of a patch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Common {
    /// Checksum byte as stored on the device
    pub checksum: u8,
    /// Effect algorithm (1-4)
    pub effect_algorithm: u8,
    pub reverb: Reverb,
    pub effects: [Effect; EFFECT_COUNT],
    pub geq: Geq,
    /// Drum mark byte
    pub drum_mark: u8,
    /// Patch name, NUL padding trimmed, one char per stored Latin-1 byte
    pub name: ArrayString<NAME_CAPACITY>,
    pub volume: u8,
    /// Polyphony mode (0 = POLY, 1 = SOLO1, 2 = SOLO2)
    pub polyphony: u8,
    /// Unassigned byte, kept as stored
    pub unused: u8,
    /// Number of sources (1-6)
    pub source_count: u8,
    pub source_mutes: SourceMutes,
    /// Amplitude modulation: source N modulates source N+1 (1-based)
    pub amplitude_modulation: u8,
    pub effect_controls: [ControlAssignment; 2],
    pub portamento: Portamento,
    pub macros: [MacroController; 4],
    pub switches: Switches,
}

impl Common {
    /// Set the name from arbitrary text. Keeps at most [`NAME_LENGTH`]
    /// characters and replaces anything outside Latin-1 with `?`.
    pub fn set_name(&mut self, name: &str) {
        self.name.clear();
        for c in name.chars().take(NAME_LENGTH) {
            let c = if (c as u32) < 0x100 { c } else { '?' };
            if self.name.try_push(c).is_err() {
                break;
            }
        }
    }
}

/// Reverb settings. The meaning of `params` depends on `kind`, see
/// [`crate::reverb_info`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Reverb {
    /// Reverb type (0-10)
    pub kind: u8,
    pub dry_wet: u8,
    pub params: [u8; 4],
}

/// One of the four effect slots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Effect {
    pub kind: EffectKind,
    pub depth: u8,
    pub params: [u8; 4],
}

impl Effect {
    /// Index into the effect name table. `Off` shares index 0 with the
    /// first table entry.
    pub fn effect_type(&self) -> u8 {
        self.kind.index()
    }
}

/// Effect type as decoded from the raw type byte.
///
/// The device stores effect types as 11..=47. A raw zero shows up in real
/// banks and is kept distinct so it survives re-encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum EffectKind {
    /// Raw byte 0
    #[default]
    Off,
    /// Raw byte minus 11
    Type(u8),
}

impl EffectKind {
    pub fn index(self) -> u8 {
        match self {
            EffectKind::Off => 0,
            EffectKind::Type(n) => n,
        }
    }
}

/// Graphic EQ, one signed gain per band (-64..63, nominally -6..+6 dB).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Geq {
    pub bands: [i8; GEQ_BANDS],
}

bitflags! {
    /// Source mute bits as stored: a set bit mutes the source, a clear bit
    /// leaves it playing. Bits beyond the sixth source are retained.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
    #[serde(transparent)]
    pub struct SourceMutes: u8 {
        const SOURCE_1 = 1 << 0;
        const SOURCE_2 = 1 << 1;
        const SOURCE_3 = 1 << 2;
        const SOURCE_4 = 1 << 3;
        const SOURCE_5 = 1 << 4;
        const SOURCE_6 = 1 << 5;
    }
}

impl SourceMutes {
    /// Is source `index` (0-based) muted?
    pub fn is_muted(self, index: usize) -> bool {
        index < 8 && self.bits() & (1 << index) != 0
    }
}

/// A modulation destination with a signed depth.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ModulationTarget {
    pub destination: u8,
    pub depth: i8,
}

/// An assignable controller: a control source routed to one target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ControlAssignment {
    pub source: u8,
    pub target: ModulationTarget,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Portamento {
    pub enabled: bool,
    pub speed: u8,
}

/// A macro controller drives two parameters at once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MacroController {
    pub param1: ModulationTarget,
    pub param2: ModulationTarget,
}

/// Switch assignments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Switches {
    pub switch1: u8,
    pub switch2: u8,
    pub foot_switch1: u8,
    pub foot_switch2: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_effect_shares_first_index() {
        let off = Effect::default();
        let first = Effect { kind: EffectKind::Type(0), ..Effect::default() };
        assert_eq!(off.effect_type(), 0);
        assert_eq!(first.effect_type(), 0);
        assert_ne!(off, first);
    }

    #[test]
    fn set_name_keeps_eight_latin1_chars() {
        let mut common = Common::default();
        common.set_name("Crème brûlée");
        assert_eq!(common.name.as_str(), "Crème br");
        common.set_name("Bell\u{266B}");
        assert_eq!(common.name.as_str(), "Bell?");
        common.set_name("ÉÉÉÉÉÉÉÉÉÉ");
        assert_eq!(common.name.chars().count(), NAME_LENGTH);
    }

    #[test]
    fn mute_bits_keep_stored_sense() {
        let mutes = SourceMutes::from_bits_retain(0b0000_0101);
        assert!(mutes.is_muted(0));
        assert!(!mutes.is_muted(1));
        assert!(mutes.is_muted(2));
        assert!(!mutes.is_muted(8));
    }
}
