//! Bank file decoder and encoder.
//!
//! File layout: the pointer table (see [`crate::PointerTable`]), then a
//! 128 KiB pool holding the patch records. Each record is a common header
//! followed by its sources; additive kits sit at their own source pointers,
//! which the device places right after the owning record.

use arrayvec::ArrayVec;
use k5k_ir::{
    AdditiveKit, Bank, Patch, Source, ADDITIVE_KIT_SIZE, COMMON_SIZE, MAX_SOURCES, PATCH_COUNT,
    POOL_SIZE, SOURCE_SIZE,
};

use crate::additive::{decode_additive_kit, write_additive_kit};
use crate::codec::ByteWriter;
use crate::common::{decode_common, write_common, SOURCE_COUNT_OFFSET};
use crate::pool::{resolve, PointerTable, PoolLayout, ToneRecordSpan, POINTER_TABLE_SIZE};
use crate::source::{decode_source, write_source};
use crate::FormatError;

/// Options for [`decode_bank_with`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DecodeOptions {
    /// Recompute record checksums and log mismatches
    pub verify_checksums: bool,
}

/// Device checksum of a record whose first byte is the stored checksum.
pub fn checksum(record: &[u8]) -> u8 {
    let sum = record
        .iter()
        .skip(1)
        .fold(0u32, |acc, &b| acc.wrapping_add(b as u32));
    (sum.wrapping_add(0xA5) & 0x7F) as u8
}

fn verify(what: &str, patch: usize, record: &[u8]) {
    let Some(&stored) = record.first() else {
        return;
    };
    let computed = checksum(record);
    if stored != computed {
        tracing::warn!(patch = patch + 1, stored, computed, "{} checksum mismatch", what);
    }
}

/// Decode a bank file.
pub fn decode_bank(data: &[u8]) -> Result<Bank, FormatError> {
    decode_bank_with(data, &DecodeOptions::default())
}

/// Decode a bank file with explicit options.
pub fn decode_bank_with(data: &[u8], options: &DecodeOptions) -> Result<Bank, FormatError> {
    let table = PointerTable::parse(data)?;

    let pool_end = POINTER_TABLE_SIZE + POOL_SIZE;
    if data.len() < pool_end {
        return Err(FormatError::TruncatedBuffer {
            needed: pool_end,
            available: data.len(),
        });
    }
    if data.len() > pool_end {
        tracing::debug!(trailing = data.len() - pool_end, "ignoring bytes after the pool");
    }
    let pool = &data[POINTER_TABLE_SIZE..pool_end];

    let layout = resolve(&table.entries, table.high_water_mark);
    let mut bank = Bank {
        base_address: layout.base,
        ..Bank::default()
    };

    for index in 0..PATCH_COUNT {
        let Some(span) = layout.span(index, pool)? else {
            continue;
        };
        let patch = decode_pool_patch(index, &span, &layout, pool, options)?;
        tracing::debug!(
            patch = index + 1,
            name = patch.name(),
            sources = patch.sources.len(),
            kits = patch.additive_kits.len(),
            "decoded patch"
        );
        bank.patches[index] = patch;
    }

    Ok(bank)
}

fn decode_sources(record: &[u8], count: usize) -> Result<ArrayVec<Source, MAX_SOURCES>, FormatError> {
    let mut sources = ArrayVec::new();
    for i in 0..count.min(MAX_SOURCES) {
        let at = COMMON_SIZE + i * SOURCE_SIZE;
        sources.push(decode_source(record.get(at..).unwrap_or_default())?);
    }
    Ok(sources)
}

fn decode_pool_patch(
    index: usize,
    span: &ToneRecordSpan,
    layout: &PoolLayout,
    pool: &[u8],
    options: &DecodeOptions,
) -> Result<Patch, FormatError> {
    let record = &pool[span.range()];
    let common = decode_common(record)?;
    let sources = decode_sources(record, span.source_count)?;

    if options.verify_checksums {
        verify("tone", index, &record[..COMMON_SIZE + span.source_count * SOURCE_SIZE]);
    }

    let mut additive_kits = Vec::with_capacity(span.additive_kit_count);
    let mut additive_slots = [false; MAX_SOURCES];
    for (i, source) in sources.iter().enumerate() {
        match layout.kit_range(index, i, pool)? {
            Some(range) => {
                let data = &pool[range];
                if options.verify_checksums {
                    verify("additive kit", index, data);
                }
                additive_kits.push(decode_additive_kit(data)?);
                additive_slots[i] = true;
            }
            None if source.is_additive() => {
                tracing::warn!(patch = index + 1, source = i + 1, "ADD source without a kit pointer");
            }
            None => {}
        }
    }

    Ok(Patch {
        common,
        sources,
        additive_kits,
        additive_slots,
    })
}

/// Decode a patch whose additive kits follow its sources directly, as in
/// single-patch files and SysEx dumps. Returns the patch and the bytes used.
pub(crate) fn decode_inline_patch(data: &[u8]) -> Result<(Patch, usize), FormatError> {
    let count = *data.get(SOURCE_COUNT_OFFSET).ok_or(FormatError::TruncatedBuffer {
        needed: SOURCE_COUNT_OFFSET + 1,
        available: data.len(),
    })? as usize;
    if !(1..=MAX_SOURCES).contains(&count) {
        return Err(FormatError::InvalidSpan {
            patch: 0,
            offset: 0,
            length: COMMON_SIZE + count * SOURCE_SIZE,
            pool: data.len(),
        });
    }

    let common = decode_common(data)?;
    let sources = decode_sources(data, count)?;

    let mut pos = COMMON_SIZE + count * SOURCE_SIZE;
    let mut additive_kits = Vec::new();
    let mut additive_slots = [false; MAX_SOURCES];
    for (i, source) in sources.iter().enumerate() {
        if !source.is_additive() {
            continue;
        }
        additive_kits.push(decode_additive_kit(data.get(pos..).unwrap_or_default())?);
        additive_slots[i] = true;
        pos += ADDITIVE_KIT_SIZE;
    }

    let patch = Patch {
        common,
        sources,
        additive_kits,
        additive_slots,
    };
    Ok((patch, pos))
}

/// Decode a single-patch record as written by [`extract_patch`].
pub fn decode_patch(data: &[u8]) -> Result<Patch, FormatError> {
    decode_inline_patch(data).map(|(patch, _)| patch)
}

fn write_patch(w: &mut ByteWriter, patch: &Patch) {
    write_common(w, &patch.common);
    for source in &patch.sources {
        write_source(w, source);
    }
}

fn additive_kits(patch: &Patch) -> impl Iterator<Item = (usize, &AdditiveKit)> {
    patch
        .additive_slots
        .iter()
        .enumerate()
        .filter(|&(_, &owned)| owned)
        .map(|(i, _)| i)
        .zip(&patch.additive_kits)
}

/// Single-patch record: common, sources, then the additive kits in source order.
pub fn extract_patch(patch: &Patch) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(patch.record_size());
    write_patch(&mut w, patch);
    for (_, kit) in additive_kits(patch) {
        write_additive_kit(&mut w, kit);
    }
    w.into_inner()
}

/// Encode a bank file.
///
/// Used patches are laid out back to back from the bank's base address in
/// slot order, each record followed by its additive kits.
pub fn encode_bank(bank: &Bank) -> Result<Vec<u8>, FormatError> {
    let mut used = bank.used_patches().peekable();
    if used.peek().is_some() && bank.base_address == 0 {
        return Err(FormatError::ZeroBaseAddress);
    }

    let base = bank.base_address;
    let mut table = PointerTable::default();
    let mut pool = ByteWriter::with_capacity(POOL_SIZE);

    for (index, patch) in used {
        table.entries[index].tone = base.wrapping_add(pool.len() as i32);
        write_patch(&mut pool, patch);
        for (source, kit) in additive_kits(patch) {
            table.entries[index].sources[source] = base.wrapping_add(pool.len() as i32);
            write_additive_kit(&mut pool, kit);
        }
    }

    if pool.len() > POOL_SIZE {
        return Err(FormatError::PoolOverflow {
            needed: pool.len(),
            capacity: POOL_SIZE,
        });
    }

    table.high_water_mark = base.wrapping_add(pool.len() as i32);
    tracing::debug!(bytes = pool.len(), base, "encoded pool");
    pool.pad_to(POOL_SIZE);

    let mut out = table.to_bytes()?;
    out.extend_from_slice(&pool.into_inner());
    Ok(out)
}
