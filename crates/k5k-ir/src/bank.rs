//! Bank and patch containers.

use arrayvec::ArrayVec;
use serde::Serialize;

use crate::additive::AdditiveKit;
use crate::common::Common;
use crate::source::Source;

/// Patch slots in a bank.
pub const PATCH_COUNT: usize = 128;

/// Maximum sources in a patch.
pub const MAX_SOURCES: usize = 6;

/// Size of the patch data pool in bytes.
pub const POOL_SIZE: usize = 0x20000;

/// Serialized size of the common record.
pub const COMMON_SIZE: usize = 82;
/// Serialized size of one source record.
pub const SOURCE_SIZE: usize = 86;
/// Serialized size of one additive kit, including its checksum byte.
pub const ADDITIVE_KIT_SIZE: usize = 806;

/// A decoded sound bank.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Bank {
    /// Always exactly [`PATCH_COUNT`] entries, unused slots are `Patch::default()`
    pub patches: Vec<Patch>,
    /// Device address the pool was loaded at, same signed type as the
    /// pointers in the bank file
    pub base_address: i32,
}

impl Default for Bank {
    fn default() -> Self {
        Self {
            patches: vec![Patch::default(); PATCH_COUNT],
            base_address: 0,
        }
    }
}

impl Bank {
    pub fn patch(&self, index: usize) -> Option<&Patch> {
        self.patches.get(index)
    }

    pub fn patch_mut(&mut self, index: usize) -> Option<&mut Patch> {
        self.patches.get_mut(index)
    }

    /// Used patches with their slot index, in index order.
    pub fn used_patches(&self) -> impl Iterator<Item = (usize, &Patch)> {
        self.patches.iter().enumerate().filter(|(_, p)| p.is_used())
    }

    /// Total record bytes of all used patches.
    pub fn pool_bytes_used(&self) -> usize {
        self.used_patches().map(|(_, p)| p.record_size()).sum()
    }
}

/// One patch slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Patch {
    pub common: Common,
    pub sources: ArrayVec<Source, MAX_SOURCES>,
    /// Additive kits in source order, one per ADD source
    pub additive_kits: Vec<AdditiveKit>,
    /// Which source positions own an additive kit
    pub additive_slots: [bool; MAX_SOURCES],
}

impl Patch {
    pub fn is_used(&self) -> bool {
        !self.sources.is_empty()
    }

    pub fn name(&self) -> &str {
        self.common.name.as_str()
    }

    /// Size of the patch record in the pool.
    pub fn record_size(&self) -> usize {
        COMMON_SIZE + SOURCE_SIZE * self.sources.len() + ADDITIVE_KIT_SIZE * self.additive_kits.len()
    }

    /// One character per source: `A` for additive, `P` for PCM, `-` for an
    /// empty position.
    pub fn source_types(&self) -> String {
        (0..MAX_SOURCES)
            .map(|i| match self.sources.get(i) {
                Some(_) if self.additive_slots[i] => 'A',
                Some(_) => 'P',
                None => '-',
            })
            .collect()
    }

    /// Additive kit owned by source `index`, if that source is an ADD source.
    pub fn additive_kit(&self, index: usize) -> Option<&AdditiveKit> {
        if !self.additive_slots.get(index).copied().unwrap_or(false) {
            return None;
        }
        let position = self.additive_slots[..index].iter().filter(|&&s| s).count();
        self.additive_kits.get(position)
    }
}
