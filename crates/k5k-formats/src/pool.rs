//! Pointer table and pool layout.
//!
//! A bank starts with 128 pointer entries (one tone pointer and six source
//! pointers each, all signed big-endian 32-bit) and one high-water-mark
//! pointer. Pointers are device addresses, not file offsets. The pool base
//! is not stored anywhere: it is the lowest address among the used tone
//! pointers and the high-water mark.

use std::ops::Range;

use binrw::io::Cursor;
use binrw::{binrw, BinRead, BinWrite};
use k5k_ir::{ADDITIVE_KIT_SIZE, COMMON_SIZE, MAX_SOURCES, PATCH_COUNT, SOURCE_SIZE};

use crate::common::SOURCE_COUNT_OFFSET;
use crate::FormatError;

/// Size of the pointer table plus the high-water mark.
pub const POINTER_TABLE_SIZE: usize = PATCH_COUNT * (1 + MAX_SOURCES) * 4 + 4;

/// One pointer table entry. Zero means "unused".
#[binrw]
#[brw(big)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointerEntry {
    pub tone: i32,
    pub sources: [i32; MAX_SOURCES],
}

/// The full pointer table as stored at the start of a bank file.
#[binrw]
#[brw(big)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PointerTable {
    pub entries: [PointerEntry; PATCH_COUNT],
    pub high_water_mark: i32,
}

impl Default for PointerTable {
    fn default() -> Self {
        Self {
            entries: [PointerEntry::default(); PATCH_COUNT],
            high_water_mark: 0,
        }
    }
}

impl PointerTable {
    /// Read the table from the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self, FormatError> {
        if data.len() < POINTER_TABLE_SIZE {
            return Err(FormatError::TruncatedBuffer {
                needed: POINTER_TABLE_SIZE,
                available: data.len(),
            });
        }
        let mut cursor = Cursor::new(&data[..POINTER_TABLE_SIZE]);
        Ok(Self::read(&mut cursor)?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, FormatError> {
        let mut out = Vec::with_capacity(POINTER_TABLE_SIZE);
        self.write(&mut Cursor::new(&mut out))?;
        Ok(out)
    }
}

/// Pool offsets of one patch, base already subtracted. `None` for zero pointers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatchPointers {
    pub tone: Option<i64>,
    pub sources: [Option<i64>; MAX_SOURCES],
}

/// Where one patch record sits in the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToneRecordSpan {
    pub offset: usize,
    pub source_count: usize,
    pub additive_kit_count: usize,
    /// Common + sources + additive kits
    pub length: usize,
}

impl ToneRecordSpan {
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.length
    }
}

/// Resolved pointer table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolLayout {
    pub base: i32,
    pub high_water_mark: i32,
    pub patches: [PatchPointers; PATCH_COUNT],
}

fn corrected(pointer: i32, base: i32) -> Option<i64> {
    (pointer != 0).then(|| pointer as i64 - base as i64)
}

/// Derive the pool base and make every non-zero pointer pool-relative.
pub fn resolve(entries: &[PointerEntry; PATCH_COUNT], high_water_mark: i32) -> PoolLayout {
    let mut addresses: Vec<i32> = entries
        .iter()
        .map(|e| e.tone)
        .filter(|&p| p != 0)
        .collect();
    addresses.push(high_water_mark);
    addresses.sort_unstable();
    let base = addresses[0];

    let mut patches = [PatchPointers::default(); PATCH_COUNT];
    for (out, entry) in patches.iter_mut().zip(entries) {
        out.tone = corrected(entry.tone, base);
        for (slot, &pointer) in out.sources.iter_mut().zip(&entry.sources) {
            *slot = corrected(pointer, base);
        }
    }

    tracing::debug!(base, high_water_mark, "resolved pool base");

    PoolLayout {
        base,
        high_water_mark,
        patches,
    }
}

impl PoolLayout {
    /// Bytes between the base and the high-water mark.
    pub fn used_bytes(&self) -> i64 {
        self.high_water_mark as i64 - self.base as i64
    }

    fn invalid(&self, patch: usize, offset: i64, length: usize, pool: &[u8]) -> FormatError {
        FormatError::InvalidSpan {
            patch,
            offset,
            length,
            pool: pool.len(),
        }
    }

    /// Locate patch `index` in `pool`. `Ok(None)` for an unused slot.
    ///
    /// The source count is read from the record's own common header before
    /// the full length is known, so the peek is bounds-checked separately.
    pub fn span(&self, index: usize, pool: &[u8]) -> Result<Option<ToneRecordSpan>, FormatError> {
        let Some(pointers) = self.patches.get(index) else {
            return Ok(None);
        };
        let Some(offset) = pointers.tone else {
            return Ok(None);
        };

        let peek = SOURCE_COUNT_OFFSET + 1;
        if offset < 0 || offset as u64 + peek as u64 > pool.len() as u64 {
            return Err(self.invalid(index, offset, peek, pool));
        }
        let start = offset as usize;

        let source_count = pool[start + SOURCE_COUNT_OFFSET] as usize;
        let additive_kit_count = pointers.sources[..source_count.min(MAX_SOURCES)]
            .iter()
            .filter(|p| p.is_some())
            .count();
        let length = COMMON_SIZE + SOURCE_SIZE * source_count + ADDITIVE_KIT_SIZE * additive_kit_count;

        if !(1..=MAX_SOURCES).contains(&source_count) || start + length > pool.len() {
            return Err(self.invalid(index, offset, length, pool));
        }

        Ok(Some(ToneRecordSpan {
            offset: start,
            source_count,
            additive_kit_count,
            length,
        }))
    }

    /// Pool range of the additive kit owned by `source` of patch `index`.
    pub fn kit_range(
        &self,
        index: usize,
        source: usize,
        pool: &[u8],
    ) -> Result<Option<Range<usize>>, FormatError> {
        let Some(offset) = self
            .patches
            .get(index)
            .and_then(|p| p.sources.get(source).copied().flatten())
        else {
            return Ok(None);
        };

        if offset < 0 || offset as u64 + ADDITIVE_KIT_SIZE as u64 > pool.len() as u64 {
            return Err(self.invalid(index, offset, ADDITIVE_KIT_SIZE, pool));
        }
        let start = offset as usize;
        Ok(Some(start..start + ADDITIVE_KIT_SIZE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(tones: &[(usize, i32)], high_water_mark: i32) -> PointerTable {
        let mut t = PointerTable::default();
        for &(i, p) in tones {
            t.entries[i].tone = p;
        }
        t.high_water_mark = high_water_mark;
        t
    }

    #[test]
    fn table_size() {
        assert_eq!(POINTER_TABLE_SIZE, 3588);
        let bytes = PointerTable::default().to_bytes().unwrap();
        assert_eq!(bytes.len(), POINTER_TABLE_SIZE);
    }

    #[test]
    fn table_is_big_endian() {
        let mut t = table(&[(0, 0x0102_0304)], 0x0A0B_0C0D);
        t.entries[1].sources[5] = -2;
        let bytes = t.to_bytes().unwrap();
        assert_eq!(&bytes[0..4], &[1, 2, 3, 4]);
        assert_eq!(&bytes[28 + 24..28 + 28], &[0xFF, 0xFF, 0xFF, 0xFE]);
        assert_eq!(&bytes[3584..3588], &[0x0A, 0x0B, 0x0C, 0x0D]);
        assert_eq!(PointerTable::parse(&bytes).unwrap(), t);
    }

    #[test]
    fn short_table_is_truncated() {
        let bytes = vec![0u8; POINTER_TABLE_SIZE - 1];
        assert!(matches!(
            PointerTable::parse(&bytes),
            Err(FormatError::TruncatedBuffer { needed: 3588, available: 3587 })
        ));
    }

    #[test]
    fn base_is_lowest_used_pointer() {
        let t = table(&[(0, 500), (1, 300), (2, 700)], 900);
        let layout = resolve(&t.entries, t.high_water_mark);
        assert_eq!(layout.base, 300);
        assert_eq!(layout.patches[0].tone, Some(200));
        assert_eq!(layout.patches[1].tone, Some(0));
        assert_eq!(layout.patches[2].tone, Some(400));
        assert_eq!(layout.patches[3].tone, None);
        assert_eq!(layout.used_bytes(), 600);
    }

    #[test]
    fn zero_pointers_never_become_base() {
        // Most entries are zero; the base must still be 300.
        let mut t = table(&[(10, 300)], 400);
        t.entries[10].sources[0] = 350;
        let layout = resolve(&t.entries, t.high_water_mark);
        assert_eq!(layout.base, 300);
        assert_eq!(layout.patches[10].sources[0], Some(50));
        assert_eq!(layout.patches[10].sources[1], None);
    }

    #[test]
    fn empty_table_uses_high_water_mark() {
        let t = table(&[], 4096);
        let layout = resolve(&t.entries, t.high_water_mark);
        assert_eq!(layout.base, 4096);
        assert!(layout.patches.iter().all(|p| p.tone.is_none()));
    }

    fn pool_with_count(len: usize, at: usize, count: u8) -> Vec<u8> {
        let mut pool = vec![0u8; len];
        pool[at + SOURCE_COUNT_OFFSET] = count;
        pool
    }

    #[test]
    fn span_uses_embedded_source_count() {
        let mut t = table(&[(5, 1000)], 2000);
        t.entries[5].sources[1] = 1000 + 82 + 2 * 86;
        let layout = resolve(&t.entries, t.high_water_mark);
        let pool = pool_with_count(2000, 0, 2);

        let span = layout.span(5, &pool).unwrap().unwrap();
        assert_eq!(span.offset, 0);
        assert_eq!(span.source_count, 2);
        assert_eq!(span.additive_kit_count, 1);
        assert_eq!(span.length, 82 + 2 * 86 + 806);
        assert_eq!(span.range(), 0..1060);

        assert_eq!(layout.kit_range(5, 1, &pool).unwrap(), Some(254..1060));
        assert_eq!(layout.kit_range(5, 0, &pool).unwrap(), None);
        assert!(layout.span(4, &pool).unwrap().is_none());
    }

    #[test]
    fn span_past_pool_end_is_invalid() {
        let t = table(&[(0, 100)], 500);
        let layout = resolve(&t.entries, t.high_water_mark);
        let pool = pool_with_count(200, 0, 3);
        match layout.span(0, &pool) {
            Err(FormatError::InvalidSpan { patch, offset, length, pool }) => {
                assert_eq!(patch, 0);
                assert_eq!(offset, 0);
                assert_eq!(length, 82 + 3 * 86);
                assert_eq!(pool, 200);
            }
            other => panic!("expected InvalidSpan, got {:?}", other),
        }
    }

    #[test]
    fn bad_source_count_is_invalid() {
        let t = table(&[(0, 100)], 500);
        let layout = resolve(&t.entries, t.high_water_mark);
        for count in [0u8, 7] {
            let pool = pool_with_count(2000, 0, count);
            assert!(matches!(layout.span(0, &pool), Err(FormatError::InvalidSpan { .. })));
        }
    }

    #[test]
    fn pointer_below_base_is_invalid() {
        let mut t = table(&[(0, 100)], 500);
        t.entries[0].sources[0] = 50;
        let layout = resolve(&t.entries, t.high_water_mark);
        let pool = pool_with_count(2000, 0, 1);
        assert!(matches!(
            layout.kit_range(0, 0, &pool),
            Err(FormatError::InvalidSpan { offset: -50, .. })
        ));
        // A peek past the pool is caught before the count is read.
        let layout = resolve(&table(&[(0, 100), (1, 140)], 500).entries, 500);
        assert!(matches!(
            layout.span(1, &pool[..60]),
            Err(FormatError::InvalidSpan { patch: 1, .. })
        ));
    }
}
