//! Format decoders for Kawai K5000 sound banks.
//!
//! Decodes native bank files and SysEx block dumps into the IR, and
//! encodes the IR back to bank files and single-patch records.

mod additive;
mod bank_format;
mod codec;
mod common;
mod pool;
mod source;
mod sysex;

pub use additive::{decode_additive_kit, encode_additive_kit};
pub use bank_format::{
    checksum, decode_bank, decode_bank_with, decode_patch, encode_bank, extract_patch,
    DecodeOptions,
};
pub use codec::{decode_biased, encode_biased, ByteReader, ByteWriter};
pub use common::{decode_common, encode_common, SOURCE_COUNT_OFFSET};
pub use pool::{
    resolve, PatchPointers, PointerEntry, PointerTable, PoolLayout, ToneRecordSpan,
    POINTER_TABLE_SIZE,
};
pub use source::{decode_source, encode_source};
pub use sysex::{decode_sysex_bank, encode_sysex_bank, SysExHeader, SYSEX_HEADER_SIZE, TONE_MAP_SIZE};

use thiserror::Error;

/// Error type for format parsing.
#[derive(Debug, Error)]
pub enum FormatError {
    /// SysEx header bytes fail the fixed checks
    #[error("malformed header: {0}")]
    MalformedHeader(String),
    /// A fixed-size read runs past the end of the input
    #[error("truncated buffer: needed {needed} bytes, {available} available")]
    TruncatedBuffer { needed: usize, available: usize },
    /// A patch record does not fit inside the pool
    #[error("patch {patch}: record at offset {offset} with length {length} exceeds pool of {pool} bytes")]
    InvalidSpan {
        patch: usize,
        offset: i64,
        length: usize,
        pool: usize,
    },
    /// Encoded patches do not fit in the pool
    #[error("patches need {needed} bytes, pool holds {capacity}")]
    PoolOverflow { needed: usize, capacity: usize },
    /// A bank with used patches has no base address to point from
    #[error("bank has used patches but a zero base address")]
    ZeroBaseAddress,
    /// I/O error from the pointer table reader or writer
    #[error("I/O error: {0}")]
    Io(#[from] binrw::Error),
}
