use std::fmt;
use std::str;

use crate::utils::{read_u32_le_at, slice_at};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ChunkId(pub [u8; 4]);

impl ChunkId {
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        str::from_utf8(&self.0).ok()
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.as_str() {
            Some(s) => write!(f, "{:?}", s),
            None => write!(f, "{:?}", self.0),
        }
    }
}

/// Header of a RIFF file: the `RIFF` tag, declared size and form type.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct RiffHeader {
    pub len: u32,
    pub form_type: ChunkId,
}

pub const RIFF_HEADER_LEN: usize = 12;

/// Reads the 12-byte RIFF header, or `None` if `data` does not start with one.
pub fn read_header(data: &[u8]) -> Option<RiffHeader> {
    let hdr = slice_at(data, 0, RIFF_HEADER_LEN)?;
    if &hdr[..4] != b"RIFF" {
        return None;
    }
    Some(RiffHeader {
        len: read_u32_le_at(hdr, 4)?,
        form_type: ChunkId([hdr[8], hdr[9], hdr[10], hdr[11]]),
    })
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct RiffChunk<'a> {
    chunk_id: ChunkId,
    offset: usize,
    data: &'a [u8],
}

impl<'a> RiffChunk<'a> {
    #[inline]
    pub fn chunk_id(&self) -> ChunkId { self.chunk_id }

    /// Offset of the chunk header within the walked buffer.
    #[inline]
    pub fn offset(&self) -> usize { self.offset }

    /// Offset of the first payload byte within the walked buffer.
    #[inline]
    pub fn data_offset(&self) -> usize { self.offset + 8 }

    #[inline]
    pub fn len(&self) -> u32 { self.data.len() as u32 }

    #[inline]
    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    #[inline]
    pub fn contents(&self) -> &'a [u8] { self.data }
}

/// A chunk header whose declared size runs past the end of the buffer.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct TruncatedChunk {
    pub chunk_id: ChunkId,
    pub offset: usize,
    pub declared: u32,
    pub available: usize,
}

/// Iterates over the sub-chunks of a flat RIFF list.
///
/// Payloads with odd length are followed by one pad byte, which is skipped.
/// A trailing fragment shorter than a chunk header ends the walk.
pub struct Chunks<'a> {
    data: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> Chunks<'a> {
    /// Walks `data` starting at `offset`.
    pub fn new(data: &'a [u8], offset: usize) -> Chunks<'a> {
        Chunks {
            data,
            offset,
            failed: false,
        }
    }

    /// Walks the chunks that follow a 12-byte RIFF header.
    pub fn after_header(data: &'a [u8]) -> Chunks<'a> {
        Chunks::new(data, RIFF_HEADER_LEN)
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Result<RiffChunk<'a>, TruncatedChunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let start = self.offset;
        let (id, len) = match slice_at(self.data, start, 8) {
            Some(hdr) => (ChunkId([hdr[0], hdr[1], hdr[2], hdr[3]]), read_u32_le_at(hdr, 4)?),
            None => return None,
        };

        let data_start = start + 8;
        let payload = match slice_at(self.data, data_start, len as usize) {
            Some(p) => p,
            None => {
                self.failed = true;
                return Some(Err(TruncatedChunk {
                    chunk_id: id,
                    offset: start,
                    declared: len,
                    available: self.data.len() - data_start,
                }));
            }
        };

        self.offset = data_start + len as usize + (len as usize & 1);

        Some(Ok(RiffChunk {
            chunk_id: id,
            offset: start,
            data: payload,
        }))
    }
}
