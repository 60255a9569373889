//! Additive wave kit record (806 bytes).

use k5k_ir::{AdditiveKit, HarmonicEnvelope, ADDITIVE_KIT_SIZE, FORMANT_BANDS, HARMONIC_COUNT};

use crate::codec::{
    decode_formant_params, decode_harmonic_envelope, decode_harmonic_params,
    encode_formant_params, encode_harmonic_envelope, encode_harmonic_params, ByteReader,
    ByteWriter,
};
use crate::FormatError;

/// Decode the additive kit at the start of `data`.
pub fn decode_additive_kit(data: &[u8]) -> Result<AdditiveKit, FormatError> {
    let mut r = ByteReader::new(data);

    let checksum = r.read_u8()?;
    let morf = r.read_flag()?;
    let harmonics = decode_harmonic_params(&mut r)?;
    let formant = decode_formant_params(&mut r)?;
    let levels_low: [u8; HARMONIC_COUNT] = r.read_array()?;
    let levels_high: [u8; HARMONIC_COUNT] = r.read_array()?;
    let formant_filter: [u8; FORMANT_BANDS] = r.read_array()?;

    let mut envelopes = [HarmonicEnvelope::default(); HARMONIC_COUNT];
    for env in &mut envelopes {
        *env = decode_harmonic_envelope(&mut r)?;
    }

    let reserved = r.read_u8()?;
    debug_assert_eq!(r.position(), ADDITIVE_KIT_SIZE);

    Ok(AdditiveKit {
        checksum,
        morf,
        harmonics,
        formant,
        levels_low,
        levels_high,
        formant_filter,
        envelopes,
        reserved,
    })
}

/// Encode an additive kit.
pub fn encode_additive_kit(kit: &AdditiveKit) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(ADDITIVE_KIT_SIZE);
    write_additive_kit(&mut w, kit);
    w.into_inner()
}

pub(crate) fn write_additive_kit(w: &mut ByteWriter, kit: &AdditiveKit) {
    w.write_u8(kit.checksum);
    w.write_flag(kit.morf);
    encode_harmonic_params(w, &kit.harmonics);
    encode_formant_params(w, &kit.formant);
    w.write_bytes(&kit.levels_low);
    w.write_bytes(&kit.levels_high);
    w.write_bytes(&kit.formant_filter);
    for env in &kit.envelopes {
        encode_harmonic_envelope(w, env);
    }
    w.write_u8(kit.reserved);
}
