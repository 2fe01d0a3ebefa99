//! Bitshuffle + LZ4 block format.
//!
//! Layout of a compressed payload:
//! - 8 bytes: uncompressed size in bytes (u64, big-endian)
//! - 4 bytes: block size in bytes (u32, big-endian)
//! - blocks: `[u32 BE compressed length][raw LZ4 block]`, each holding a
//!   bit-transposed run of elements
//! - trailing `(count % 8) * elem_size` bytes, copied verbatim
//!
//! The bit transpose is bit-exact with the reference bitshuffle library so
//! payloads interoperate with other producers.

use bytes::{Buf, BufMut};

use crate::error::ChannelError;

const HEADER_LEN: usize = 12;
const TARGET_BLOCK_BYTES: usize = 8192;
const MIN_BLOCK_ELEMS: usize = 128;
const BLOCK_MULTIPLE: usize = 8;

/// Default block size in elements for an element width.
pub fn default_block_size(elem_size: usize) -> usize {
    let elems = TARGET_BLOCK_BYTES / elem_size.max(1) / BLOCK_MULTIPLE * BLOCK_MULTIPLE;
    elems.max(MIN_BLOCK_ELEMS)
}

/// Bit-transpose a run of elements. `input.len()` must be a multiple of `8 * elem_size`.
pub fn shuffle(input: &[u8], elem_size: usize) -> Vec<u8> {
    let count = input.len() / elem_size;
    let row = count / 8;
    let mut out = vec![0u8; input.len()];
    for (i, element) in input.chunks_exact(elem_size).enumerate() {
        let mask = 1u8 << (i % 8);
        let column = i / 8;
        for (j, &byte) in element.iter().enumerate() {
            if byte == 0 {
                continue;
            }
            for k in 0..8 {
                if (byte >> k) & 1 != 0 {
                    out[(j * 8 + k) * row + column] |= mask;
                }
            }
        }
    }
    out
}

/// Inverse of [`shuffle`].
pub fn unshuffle(input: &[u8], elem_size: usize) -> Vec<u8> {
    let count = input.len() / elem_size;
    let row = count / 8;
    let mut out = vec![0u8; input.len()];
    for (i, element) in out.chunks_exact_mut(elem_size).enumerate() {
        let shift = i % 8;
        let column = i / 8;
        for (j, byte) in element.iter_mut().enumerate() {
            for k in 0..8 {
                if (input[(j * 8 + k) * row + column] >> shift) & 1 != 0 {
                    *byte |= 1 << k;
                }
            }
        }
    }
    out
}

/// Compress `input` as a run of `elem_size`-byte elements.
///
/// `block_size` is in elements; 0 selects [`default_block_size`].
pub fn compress(input: &[u8], elem_size: usize, block_size: usize) -> Result<Vec<u8>, ChannelError> {
    let elem_size = elem_size.max(1);
    if input.len() % elem_size != 0 {
        return Err(ChannelError::Length {
            len: input.len(),
            width: elem_size,
        });
    }
    let block_elems = if block_size == 0 {
        default_block_size(elem_size)
    } else {
        block_size
    };
    if block_elems % BLOCK_MULTIPLE != 0 {
        return Err(ChannelError::BlockSize {
            bytes: block_elems * elem_size,
            width: elem_size,
        });
    }
    let block_bytes = block_elems * elem_size;
    let block_bytes_u32 = u32::try_from(block_bytes).map_err(|_| ChannelError::BlockSize {
        bytes: block_bytes,
        width: elem_size,
    })?;

    let mut out = Vec::with_capacity(HEADER_LEN + input.len() / 2);
    out.put_u64(input.len() as u64);
    out.put_u32(block_bytes_u32);

    let count = input.len() / elem_size;
    let full_blocks = count / block_elems;
    let tail_elems = (count % block_elems) / BLOCK_MULTIPLE * BLOCK_MULTIPLE;
    let mut offset = 0;

    for _ in 0..full_blocks {
        write_block(&mut out, &input[offset..offset + block_bytes], elem_size);
        offset += block_bytes;
    }
    if tail_elems > 0 {
        let len = tail_elems * elem_size;
        write_block(&mut out, &input[offset..offset + len], elem_size);
        offset += len;
    }
    out.extend_from_slice(&input[offset..]);
    Ok(out)
}

fn write_block(out: &mut Vec<u8>, block: &[u8], elem_size: usize) {
    let compressed = lz4_flex::block::compress(&shuffle(block, elem_size));
    out.put_u32(compressed.len() as u32);
    out.extend_from_slice(&compressed);
}

/// Decompress a payload produced by [`compress`] (or any compatible producer).
pub fn decompress(input: &[u8], elem_size: usize) -> Result<Vec<u8>, ChannelError> {
    let elem_size = elem_size.max(1);
    if input.len() < HEADER_LEN {
        return Err(ChannelError::Truncated("missing size header"));
    }
    let mut cursor = input;
    let total = usize::try_from(cursor.get_u64())
        .map_err(|_| ChannelError::Truncated("uncompressed size exceeds address space"))?;
    let block_bytes = cursor.get_u32() as usize;

    if total % elem_size != 0 {
        return Err(ChannelError::Length {
            len: total,
            width: elem_size,
        });
    }
    let block_elems = if block_bytes == 0 {
        default_block_size(elem_size)
    } else {
        if block_bytes % elem_size != 0 || (block_bytes / elem_size) % BLOCK_MULTIPLE != 0 {
            return Err(ChannelError::BlockSize {
                bytes: block_bytes,
                width: elem_size,
            });
        }
        block_bytes / elem_size
    };

    let count = total / elem_size;
    let full_blocks = count / block_elems;
    let tail_elems = (count % block_elems) / BLOCK_MULTIPLE * BLOCK_MULTIPLE;
    let leftover = (count % BLOCK_MULTIPLE) * elem_size;

    // LZ4 expands a block at most ~255x.
    let mut out = Vec::with_capacity(total.min(input.len().saturating_mul(255)));
    for _ in 0..full_blocks {
        read_block(&mut cursor, block_elems * elem_size, elem_size, &mut out)?;
    }
    if tail_elems > 0 {
        read_block(&mut cursor, tail_elems * elem_size, elem_size, &mut out)?;
    }

    if cursor.len() < leftover {
        return Err(ChannelError::Truncated("leftover bytes missing"));
    }
    if cursor.len() > leftover {
        return Err(ChannelError::Truncated("trailing bytes after last block"));
    }
    out.extend_from_slice(cursor);
    Ok(out)
}

fn read_block(
    cursor: &mut &[u8],
    expected: usize,
    elem_size: usize,
    out: &mut Vec<u8>,
) -> Result<(), ChannelError> {
    if cursor.len() < 4 {
        return Err(ChannelError::Truncated("missing block length"));
    }
    let len = cursor.get_u32() as usize;
    if cursor.len() < len {
        return Err(ChannelError::Truncated("block shorter than declared"));
    }
    let current = *cursor;
    let (block, rest) = current.split_at(len);
    *cursor = rest;

    let shuffled = lz4_flex::block::decompress(block, expected)?;
    if shuffled.len() != expected {
        return Err(ChannelError::BlockLength {
            expected,
            actual: shuffled.len(),
        });
    }
    out.extend_from_slice(&unshuffle(&shuffled, elem_size));
    Ok(())
}
