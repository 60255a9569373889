//! Patch common record (82 bytes).

use arrayvec::ArrayString;
use k5k_ir::{
    Common, MacroController, Portamento, SourceMutes, Switches, COMMON_SIZE, EFFECT_COUNT,
    NAME_CAPACITY, NAME_LENGTH,
};

use crate::codec::{
    decode_assignment, decode_effect, decode_geq, decode_reverb, encode_assignment, encode_effect,
    encode_geq, encode_reverb, ByteReader, ByteWriter, BIAS_32,
};
use crate::FormatError;

/// Offset of the source count byte inside the common record.
pub const SOURCE_COUNT_OFFSET: usize = 51;

/// Decode a patch name: NUL padding trimmed, bytes read as Latin-1.
fn parse_name(data: &[u8]) -> Result<ArrayString<NAME_CAPACITY>, FormatError> {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    let mut name = ArrayString::new();
    for &b in &data[..end] {
        name.try_push(b as char).map_err(|_| {
            FormatError::MalformedHeader(format!("patch name {:02X?} does not fit", data))
        })?;
    }
    Ok(name)
}

fn name_bytes(name: &str) -> [u8; NAME_LENGTH] {
    let mut out = [0u8; NAME_LENGTH];
    for (slot, c) in out.iter_mut().zip(name.chars()) {
        *slot = u8::try_from(c).unwrap_or(b'?');
    }
    out
}

/// Decode the common record at the start of `data`.
pub fn decode_common(data: &[u8]) -> Result<Common, FormatError> {
    let mut r = ByteReader::new(data);

    let checksum = r.read_u8()?;
    let effect_algorithm = r.read_one_based()?;
    let reverb = decode_reverb(&mut r)?;

    let mut effects = [Default::default(); EFFECT_COUNT];
    for effect in &mut effects {
        *effect = decode_effect(&mut r)?;
    }

    let geq = decode_geq(&mut r)?;
    let drum_mark = r.read_u8()?;
    let name = parse_name(r.read_bytes(NAME_LENGTH)?)?;
    let volume = r.read_u8()?;
    let polyphony = r.read_u8()?;
    let unused = r.read_u8()?;
    let source_count = r.read_u8()?;
    let source_mutes = SourceMutes::from_bits_retain(r.read_u8()?);
    let amplitude_modulation = r.read_one_based()?;

    let effect_controls = [decode_assignment(&mut r)?, decode_assignment(&mut r)?];

    let portamento = Portamento {
        enabled: r.read_flag()?,
        speed: r.read_u8()?,
    };

    // Destinations for all four macros come first, then the eight depths
    // interleaved per macro.
    let mut macros = [MacroController::default(); 4];
    for m in &mut macros {
        m.param1.destination = r.read_u8()?;
    }
    for m in &mut macros {
        m.param2.destination = r.read_u8()?;
    }
    for m in &mut macros {
        m.param1.depth = r.read_biased(BIAS_32)?;
        m.param2.depth = r.read_biased(BIAS_32)?;
    }

    let switches = Switches {
        switch1: r.read_u8()?,
        switch2: r.read_u8()?,
        foot_switch1: r.read_u8()?,
        foot_switch2: r.read_u8()?,
    };

    debug_assert_eq!(r.position(), COMMON_SIZE);

    Ok(Common {
        checksum,
        effect_algorithm,
        reverb,
        effects,
        geq,
        drum_mark,
        name,
        volume,
        polyphony,
        unused,
        source_count,
        source_mutes,
        amplitude_modulation,
        effect_controls,
        portamento,
        macros,
        switches,
    })
}

/// Encode a common record.
pub fn encode_common(common: &Common) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(COMMON_SIZE);
    write_common(&mut w, common);
    w.into_inner()
}

pub(crate) fn write_common(w: &mut ByteWriter, common: &Common) {
    w.write_u8(common.checksum);
    w.write_one_based(common.effect_algorithm);
    encode_reverb(w, &common.reverb);
    for effect in &common.effects {
        encode_effect(w, effect);
    }
    encode_geq(w, &common.geq);
    w.write_u8(common.drum_mark);
    w.write_bytes(&name_bytes(&common.name));
    w.write_u8(common.volume);
    w.write_u8(common.polyphony);
    w.write_u8(common.unused);
    w.write_u8(common.source_count);
    w.write_u8(common.source_mutes.bits());
    w.write_one_based(common.amplitude_modulation);

    for control in &common.effect_controls {
        encode_assignment(w, control);
    }

    w.write_flag(common.portamento.enabled);
    w.write_u8(common.portamento.speed);

    for m in &common.macros {
        w.write_u8(m.param1.destination);
    }
    for m in &common.macros {
        w.write_u8(m.param2.destination);
    }
    for m in &common.macros {
        w.write_biased(m.param1.depth, BIAS_32);
        w.write_biased(m.param2.depth, BIAS_32);
    }

    let sw = &common.switches;
    w.write_bytes(&[sw.switch1, sw.switch2, sw.foot_switch1, sw.foot_switch2]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use k5k_ir::EffectKind;

    /// A common record with every field away from zero.
    fn sample_common() -> Vec<u8> {
        let mut data = vec![0u8; COMMON_SIZE];
        data[0] = 0x2A; // checksum
        data[1] = 2; // algorithm 3
        data[2..8].copy_from_slice(&[9, 40, 1, 2, 3, 4]);
        data[8..14].copy_from_slice(&[0x11, 50, 5, 6, 7, 8]);
        data[14..20].copy_from_slice(&[0x00, 0, 0, 0, 0, 0]);
        data[20..26].copy_from_slice(&[11, 99, 1, 1, 1, 1]);
        data[26..32].copy_from_slice(&[47, 10, 2, 2, 2, 2]);
        data[32..39].copy_from_slice(&[64, 0, 127, 70, 58, 64, 64]);
        data[39] = 0;
        data[40..48].copy_from_slice(b"PadVox\0\0");
        data[48] = 115;
        data[49] = 1;
        data[51] = 2;
        data[52] = 0b0000_0010;
        data[53] = 0;
        data[54..60].copy_from_slice(&[3, 12, 40, 4, 13, 24]);
        data[60] = 1;
        data[61] = 77;
        data[62..70].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        data[70..78].copy_from_slice(&[32, 33, 31, 63, 1, 32, 40, 20]);
        data[78..82].copy_from_slice(&[10, 11, 12, 13]);
        data
    }

    #[test]
    fn decodes_fields() {
        let c = decode_common(&sample_common()).unwrap();
        assert_eq!(c.checksum, 0x2A);
        assert_eq!(c.effect_algorithm, 3);
        assert_eq!(c.reverb.kind, 9);
        assert_eq!(c.reverb.params, [1, 2, 3, 4]);
        assert_eq!(c.effects[0].kind, EffectKind::Type(6));
        assert_eq!(c.effects[1].kind, EffectKind::Off);
        assert_eq!(c.effects[2].effect_type(), 0);
        assert_eq!(c.effects[3].effect_type(), 36);
        assert_eq!(c.geq.bands, [0, -64, 63, 6, -6, 0, 0]);
        assert_eq!(c.name.as_str(), "PadVox");
        assert_eq!(c.volume, 115);
        assert_eq!(c.source_count, 2);
        assert!(c.source_mutes.is_muted(1));
        assert!(!c.source_mutes.is_muted(0));
        assert_eq!(c.amplitude_modulation, 1);
        assert_eq!(c.effect_controls[0].target.depth, 8);
        assert_eq!(c.effect_controls[1].target.depth, -8);
        assert!(c.portamento.enabled);
        assert_eq!(c.portamento.speed, 77);
        assert_eq!(c.macros[0].param1.destination, 1);
        assert_eq!(c.macros[0].param2.destination, 5);
        assert_eq!(c.macros[0].param1.depth, 0);
        assert_eq!(c.macros[0].param2.depth, 1);
        assert_eq!(c.macros[1].param1.depth, -1);
        assert_eq!(c.macros[1].param2.depth, 31);
        assert_eq!(c.macros[3].param2.depth, -12);
        assert_eq!(c.switches.foot_switch2, 13);
    }

    #[test]
    fn encode_reproduces_record() {
        let data = sample_common();
        let c = decode_common(&data).unwrap();
        assert_eq!(encode_common(&c), data);
    }

    #[test]
    fn full_length_name_is_kept() {
        let mut data = sample_common();
        data[40..48].copy_from_slice(b"Strings1");
        let c = decode_common(&data).unwrap();
        assert_eq!(c.name.as_str(), "Strings1");
        assert_eq!(encode_common(&c), data);
    }

    #[test]
    fn latin1_name_keeps_every_byte() {
        let mut data = sample_common();
        data[40..48].copy_from_slice(b"Caf\xE9\xE9\xE9\xE9\xE9");
        let c = decode_common(&data).unwrap();
        assert_eq!(c.name.as_str(), "Caf\u{E9}\u{E9}\u{E9}\u{E9}\u{E9}");
        assert_eq!(c.name.chars().count(), NAME_LENGTH);
        assert_eq!(encode_common(&c), data);
    }

    #[test]
    fn short_record_is_truncated() {
        let data = sample_common();
        assert!(matches!(
            decode_common(&data[..60]),
            Err(FormatError::TruncatedBuffer { available: 60, .. })
        ));
    }
}
