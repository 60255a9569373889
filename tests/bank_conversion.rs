//! Integration tests for moving patches between SysEx dumps, bank files
//! and single-patch records.

use k5k_formats::{
    decode_bank, decode_patch, decode_sysex_bank, encode_bank, encode_sysex_bank, extract_patch,
    SysExHeader, POINTER_TABLE_SIZE,
};
use k5k_ir::{summarize, AdditiveKit, Bank, Patch, Source, ADD_WAVE_KIT, POOL_SIZE};

const BASE: i32 = 0x0002_4000;

fn patch(name: &str, waves: &[u16]) -> Patch {
    let mut patch = Patch::default();
    let _ = patch.common.name.try_push_str(name);
    patch.common.source_count = waves.len() as u8;
    patch.common.effect_algorithm = 1;
    patch.common.volume = 110;
    for (i, &wave) in waves.iter().enumerate() {
        let mut source = Source::default();
        source.oscillator.wave_kit = wave;
        source.zone_high = 127;
        if wave == ADD_WAVE_KIT {
            let mut kit = AdditiveKit::default();
            kit.levels_low[0] = 127;
            kit.envelopes[1].loop_segment1 = true;
            patch.additive_kits.push(kit);
            patch.additive_slots[i] = true;
        }
        patch.sources.push(source);
    }
    patch
}

fn sample_bank() -> Bank {
    let mut bank = Bank::default();
    bank.patches[0] = patch("Piano", &[12, 12]);
    bank.patches[6] = patch("AddBell", &[ADD_WAVE_KIT, 200, ADD_WAVE_KIT]);
    bank.patches[127] = patch("Last", &[1]);
    bank
}

#[test]
fn sysex_dump_converts_to_bank_file() {
    let header = SysExHeader { channel: 3, bank: 0 };
    let dump = encode_sysex_bank(&header, &sample_bank());

    let (parsed, mut bank) = decode_sysex_bank(&dump).unwrap();
    assert_eq!(parsed.channel, 3);
    assert_eq!(bank.base_address, 0);

    bank.base_address = BASE;
    let file = encode_bank(&bank).unwrap();
    assert_eq!(file.len(), POINTER_TABLE_SIZE + POOL_SIZE);

    let decoded = decode_bank(&file).unwrap();
    assert_eq!(decoded.base_address, BASE);
    assert_eq!(decoded.patches, sample_bank().patches);
}

#[test]
fn extracted_patch_matches_bank_slot() {
    let mut bank = sample_bank();
    bank.base_address = BASE;
    let decoded = decode_bank(&encode_bank(&bank).unwrap()).unwrap();

    let record = extract_patch(&decoded.patches[6]);
    assert_eq!(record.len(), decoded.patches[6].record_size());
    let single = decode_patch(&record).unwrap();
    assert_eq!(single, decoded.patches[6]);
    assert_eq!(single.source_types(), "APA---");
    assert!(single.additive_kit(2).unwrap().envelopes[1].loop_segment1);
}

#[test]
fn summary_counts_sources() {
    let summary = summarize(&sample_bank());
    assert_eq!(summary.patch_count, 3);
    assert_eq!(summary.total_sources, 6);
    assert_eq!(summary.additive_sources, 2);
    assert_eq!(summary.pcm_sources, 4);
    assert_eq!(summary.source_count_range, Some((1, 3)));
}
