//! Source record (86 bytes).

use k5k_ir::{Pan, Source, VelocitySwitch, SOURCE_SIZE};

use crate::codec::{
    decode_amplifier, decode_assignment, decode_controller, decode_filter, decode_lfo,
    decode_oscillator, encode_amplifier, encode_assignment, encode_controller, encode_filter,
    encode_lfo, encode_oscillator, ByteReader, ByteWriter, BIAS_64,
};
use crate::FormatError;

fn velocity_switch(b: u8) -> VelocitySwitch {
    VelocitySwitch {
        kind: (b >> 5) & 0x03,
        threshold: b & 0x1F,
    }
}

fn velocity_switch_byte(v: &VelocitySwitch) -> u8 {
    ((v.kind & 0x03) << 5) | (v.threshold & 0x1F)
}

/// Decode the source record at the start of `data`.
pub fn decode_source(data: &[u8]) -> Result<Source, FormatError> {
    let mut r = ByteReader::new(data);

    let source = Source {
        zone_low: r.read_u8()?,
        zone_high: r.read_u8()?,
        velocity_switch: velocity_switch(r.read_u8()?),
        effect_path: r.read_u8()?,
        volume: r.read_u8()?,
        bender_pitch: r.read_u8()?,
        bender_cutoff: r.read_u8()?,
        pressure: decode_controller(&mut r)?,
        wheel: decode_controller(&mut r)?,
        expression: decode_controller(&mut r)?,
        assign1: decode_assignment(&mut r)?,
        assign2: decode_assignment(&mut r)?,
        key_on_delay: r.read_u8()?,
        pan: Pan {
            kind: r.read_u8()?,
            value: r.read_biased(BIAS_64)?,
        },
        oscillator: decode_oscillator(&mut r)?,
        filter: decode_filter(&mut r)?,
        amplifier: decode_amplifier(&mut r)?,
        lfo: decode_lfo(&mut r)?,
    };

    debug_assert_eq!(r.position(), SOURCE_SIZE);
    Ok(source)
}

/// Encode a source record.
pub fn encode_source(source: &Source) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(SOURCE_SIZE);
    write_source(&mut w, source);
    w.into_inner()
}

pub(crate) fn write_source(w: &mut ByteWriter, s: &Source) {
    w.write_u8(s.zone_low);
    w.write_u8(s.zone_high);
    w.write_u8(velocity_switch_byte(&s.velocity_switch));
    w.write_u8(s.effect_path);
    w.write_u8(s.volume);
    w.write_u8(s.bender_pitch);
    w.write_u8(s.bender_cutoff);
    encode_controller(w, &s.pressure);
    encode_controller(w, &s.wheel);
    encode_controller(w, &s.expression);
    encode_assignment(w, &s.assign1);
    encode_assignment(w, &s.assign2);
    w.write_u8(s.key_on_delay);
    w.write_u8(s.pan.kind);
    w.write_biased(s.pan.value, BIAS_64);
    encode_oscillator(w, &s.oscillator);
    encode_filter(w, &s.filter);
    encode_amplifier(w, &s.amplifier);
    encode_lfo(w, &s.lfo);
}

#[cfg(test)]
mod tests {
    use super::*;
    use k5k_ir::ADD_WAVE_KIT;

    fn sample_source() -> Vec<u8> {
        let mut d = vec![64u8; SOURCE_SIZE];
        d[0] = 0;
        d[1] = 127;
        d[2] = (2 << 5) | 17; // soft switch, threshold 17
        d[3] = 1;
        d[4] = 120;
        d[7..19].copy_from_slice(&[1, 40, 2, 24, 3, 32, 4, 63, 5, 1, 6, 33]);
        d[19..25].copy_from_slice(&[7, 8, 36, 9, 10, 28]);
        d[25] = 0;
        d[26] = 0;
        d[27] = 100;
        d[28] = 1; // wave 1*128 + 44 + 1 = 173
        d[29] = 44;
        d[30] = 52;
        d[31] = 70;
        d[32] = 0;
        d[33] = 2;
        d[40] = 1; // bypass
        d[41] = 1; // high pass
        d[42] = 4; // curve 5
        d[60] = 3; // amp curve, raw
        d[61..67].copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        d[71] = 20;
        d[75] = 3; // sine
        d[80] = 12;
        d[81] = 80;
        d
    }

    #[test]
    fn decodes_fields() {
        let s = decode_source(&sample_source()).unwrap();
        assert_eq!((s.zone_low, s.zone_high), (0, 127));
        assert_eq!(s.velocity_switch, VelocitySwitch { kind: 2, threshold: 17 });
        assert_eq!(s.pressure.target1.depth, 8);
        assert_eq!(s.pressure.target2.depth, -8);
        assert_eq!(s.wheel.target2.depth, 31);
        assert_eq!(s.expression.target1.depth, -31);
        assert_eq!(s.assign1.source, 7);
        assert_eq!(s.assign1.target.depth, 4);
        assert_eq!(s.assign2.target.depth, -4);
        assert_eq!(s.pan.value, 36);
        assert_eq!(s.oscillator.wave_kit, 173);
        assert_eq!(s.oscillator.coarse, -12);
        assert_eq!(s.oscillator.fine, 6);
        assert_eq!(s.oscillator.envelope.start_level, 0);
        assert!(s.filter.bypass);
        assert_eq!(s.filter.mode, 1);
        assert_eq!(s.filter.velocity_curve, 5);
        assert_eq!(s.filter.envelope.decay1_level, 0);
        assert_eq!(s.amplifier.velocity_curve, 3);
        assert_eq!(s.amplifier.envelope.release_time, 6);
        assert_eq!(s.amplifier.velocity.level, 20);
        assert_eq!(s.lfo.waveform, 3);
        assert_eq!(s.lfo.vibrato.depth, 12);
        assert_eq!(s.lfo.vibrato.key_scaling, 16);
        assert!(!s.is_additive());
    }

    #[test]
    fn encode_reproduces_record() {
        let data = sample_source();
        assert_eq!(encode_source(&decode_source(&data).unwrap()), data);
    }

    #[test]
    fn add_wave_kit() {
        let mut data = sample_source();
        data[28] = 4;
        data[29] = 0;
        let s = decode_source(&data).unwrap();
        assert_eq!(s.oscillator.wave_kit, ADD_WAVE_KIT);
        assert!(s.is_additive());
        assert_eq!(encode_source(&s), data);
    }

    #[test]
    fn short_record_is_truncated() {
        assert!(matches!(
            decode_source(&sample_source()[..85]),
            Err(FormatError::TruncatedBuffer { needed: 86, available: 85 })
        ));
    }
}
