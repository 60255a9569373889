//! SysEx block single dumps.
//!
//! ```text
//! F0 40 <ch> 21 00 0A 00 <bank>   header
//! <19 bytes>                      tone map, 7 patches per byte
//! <patch records...>              present patches back to back
//! F7
//! ```

use k5k_ir::{Bank, PATCH_COUNT};

use crate::bank_format::{decode_inline_patch, extract_patch};
use crate::FormatError;

pub const SYSEX_HEADER_SIZE: usize = 8;

/// Bytes in the tone map: 128 patches at 7 bits per byte.
pub const TONE_MAP_SIZE: usize = PATCH_COUNT.div_ceil(7);

const SYSEX_START: u8 = 0xF0;
const SYSEX_END: u8 = 0xF7;
const KAWAI_ID: u8 = 0x40;
/// Block single dump: function, group, machine (K5000), substatus 1.
const BLOCK_SINGLE_DUMP: [u8; 4] = [0x21, 0x00, 0x0A, 0x00];

const BANK_NAMES: [&str; 5] = ["A", "B", "D", "E", "F"];

/// Parsed SysEx header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SysExHeader {
    /// MIDI channel, 1-16
    pub channel: u8,
    /// Bank id as stored
    pub bank: u8,
}

impl SysExHeader {
    pub fn parse(data: &[u8]) -> Result<Self, FormatError> {
        if data.len() < SYSEX_HEADER_SIZE {
            return Err(FormatError::TruncatedBuffer {
                needed: SYSEX_HEADER_SIZE,
                available: data.len(),
            });
        }
        if data[0] != SYSEX_START {
            return Err(FormatError::MalformedHeader(format!(
                "expected SysEx start 0xF0, found {:#04X}",
                data[0]
            )));
        }
        if data[1] != KAWAI_ID {
            return Err(FormatError::MalformedHeader(format!(
                "manufacturer {:#04X} is not Kawai",
                data[1]
            )));
        }
        if data[2] > 0x0F {
            return Err(FormatError::MalformedHeader(format!(
                "channel byte {:#04X} out of range",
                data[2]
            )));
        }
        if data[3..7] != BLOCK_SINGLE_DUMP {
            return Err(FormatError::MalformedHeader(format!(
                "not a K5000 block single dump: {:02X?}",
                &data[3..7]
            )));
        }

        Ok(Self {
            channel: data[2] + 1,
            bank: data[7],
        })
    }

    pub fn bank_name(&self) -> Option<&'static str> {
        BANK_NAMES.get(self.bank as usize).copied()
    }

    /// Bank id for a bank letter, ignoring case.
    pub fn bank_id(name: &str) -> Option<u8> {
        BANK_NAMES
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
            .map(|i| i as u8)
    }

    pub fn to_bytes(&self) -> [u8; SYSEX_HEADER_SIZE] {
        let [f, g, m, s] = BLOCK_SINGLE_DUMP;
        [
            SYSEX_START,
            KAWAI_ID,
            self.channel.wrapping_sub(1) & 0x0F,
            f,
            g,
            m,
            s,
            self.bank,
        ]
    }
}

fn is_present(map: &[u8], index: usize) -> bool {
    map[index / 7] & (1 << (index % 7)) != 0
}

/// Decode a SysEx block dump into a bank.
///
/// The resulting bank has no base address; set one before passing it to
/// [`crate::encode_bank`].
pub fn decode_sysex_bank(data: &[u8]) -> Result<(SysExHeader, Bank), FormatError> {
    let header = SysExHeader::parse(data)?;

    let map_end = SYSEX_HEADER_SIZE + TONE_MAP_SIZE;
    if data.len() < map_end {
        return Err(FormatError::TruncatedBuffer {
            needed: map_end,
            available: data.len(),
        });
    }
    let map = &data[SYSEX_HEADER_SIZE..map_end];

    let mut body = &data[map_end..];
    if let Some((&SYSEX_END, rest)) = body.split_last() {
        body = rest;
    }

    let mut bank = Bank::default();
    let mut pos = 0;
    for index in (0..PATCH_COUNT).filter(|&i| is_present(map, i)) {
        let (patch, used) = decode_inline_patch(&body[pos.min(body.len())..]).map_err(|e| match e {
            FormatError::InvalidSpan { length, .. } => FormatError::InvalidSpan {
                patch: index,
                offset: pos as i64,
                length,
                pool: body.len(),
            },
            other => other,
        })?;
        tracing::debug!(patch = index + 1, name = patch.name(), "decoded SysEx patch");
        bank.patches[index] = patch;
        pos += used;
    }

    if pos < body.len() {
        tracing::warn!(trailing = body.len() - pos, "unused bytes after last patch");
    }

    Ok((header, bank))
}

/// Encode a bank as a SysEx block dump.
pub fn encode_sysex_bank(header: &SysExHeader, bank: &Bank) -> Vec<u8> {
    let mut map = [0u8; TONE_MAP_SIZE];
    let mut body = Vec::new();
    for (index, patch) in bank.used_patches() {
        map[index / 7] |= 1 << (index % 7);
        body.extend_from_slice(&extract_patch(patch));
    }

    let mut out = Vec::with_capacity(SYSEX_HEADER_SIZE + TONE_MAP_SIZE + body.len() + 1);
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&map);
    out.extend_from_slice(&body);
    out.push(SYSEX_END);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use k5k_ir::{AdditiveKit, Patch, Source, ADD_WAVE_KIT};

    const HEADER: [u8; 8] = [0xF0, 0x40, 0x00, 0x21, 0x00, 0x0A, 0x00, 0x00];

    #[test]
    fn parses_valid_header() {
        let mut data = HEADER;
        data[2] = 0x0F;
        data[7] = 2;
        let h = SysExHeader::parse(&data).unwrap();
        assert_eq!(h.channel, 16);
        assert_eq!(h.bank_name(), Some("D"));
        assert_eq!(h.to_bytes(), data);
    }

    #[test]
    fn rejects_other_manufacturers() {
        let mut data = HEADER;
        data[1] = 0x43;
        assert!(matches!(SysExHeader::parse(&data), Err(FormatError::MalformedHeader(_))));
    }

    #[test]
    fn rejects_other_commands() {
        let mut data = HEADER;
        data[3] = 0x20; // one single, not a block
        assert!(matches!(SysExHeader::parse(&data), Err(FormatError::MalformedHeader(_))));
        let mut data = HEADER;
        data[5] = 0x0B;
        assert!(matches!(SysExHeader::parse(&data), Err(FormatError::MalformedHeader(_))));
    }

    #[test]
    fn short_header_is_truncated() {
        assert!(matches!(
            SysExHeader::parse(&HEADER[..7]),
            Err(FormatError::TruncatedBuffer { needed: 8, available: 7 })
        ));
    }

    #[test]
    fn unknown_bank_has_no_name() {
        let h = SysExHeader { channel: 1, bank: 9 };
        assert_eq!(h.bank_name(), None);
    }

    #[test]
    fn bank_letters_map_to_ids() {
        assert_eq!(SysExHeader::bank_id("a"), Some(0));
        assert_eq!(SysExHeader::bank_id("D"), Some(2));
        assert_eq!(SysExHeader::bank_id("F"), Some(4));
        assert_eq!(SysExHeader::bank_id("C"), None);
    }

    fn add_patch() -> Patch {
        let mut p = Patch::default();
        let _ = p.common.name.try_push_str("Organ");
        p.common.source_count = 2;
        for i in 0..2 {
            let mut s = Source::default();
            s.oscillator.wave_kit = if i == 1 { ADD_WAVE_KIT } else { 100 };
            p.sources.push(s);
        }
        let mut kit = AdditiveKit::default();
        kit.morf = true;
        kit.envelopes[0].loop_segment2 = true;
        p.additive_kits.push(kit);
        p.additive_slots[1] = true;
        p
    }

    #[test]
    fn block_dump_with_add_source() {
        let mut bank = Bank::default();
        bank.patches[3] = add_patch();
        bank.patches[9] = add_patch();
        let header = SysExHeader { channel: 1, bank: 0 };

        let data = encode_sysex_bank(&header, &bank);
        assert_eq!(data.len(), 8 + 19 + 2 * (82 + 2 * 86 + 806) + 1);
        assert_eq!(data[8], 1 << 3);
        assert_eq!(data[9], 1 << 2);

        let (h, decoded) = decode_sysex_bank(&data).unwrap();
        assert_eq!(h, header);
        assert_eq!(decoded, bank);
    }

    #[test]
    fn truncated_dump_reports_patch() {
        let mut bank = Bank::default();
        bank.patches[0] = add_patch();
        bank.patches[1] = add_patch();
        let data = encode_sysex_bank(&SysExHeader { channel: 1, bank: 0 }, &bank);
        let short = &data[..data.len() - 100];
        assert!(decode_sysex_bank(short).is_err());
    }
}
