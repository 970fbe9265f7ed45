use log::{debug, trace, warn};

use crate::common::exif::{read_from_tiff, ExifError};
use crate::common::riff::{self, ChunkId, Chunks, RiffChunk};
use crate::config::Config;
use crate::mapper::map_tags;
use crate::traits::Decoder;
use crate::types::{
    ColorInfo, Dimensions, FileInfo, ImageFormat, ImageMetadata, Result, WebpCompression, WebpInfo,
};
use crate::utils::{has_extension, read_u16_le_at, read_u24_le_at, read_u32_le_at};

const WEBP_FORM_TYPE: ChunkId = ChunkId(*b"WEBP");
const VP8_CHUNK_ID: ChunkId   = ChunkId(*b"VP8 ");
const VP8L_CHUNK_ID: ChunkId  = ChunkId(*b"VP8L");
const VP8X_CHUNK_ID: ChunkId  = ChunkId(*b"VP8X");
const EXIF_CHUNK_ID: ChunkId  = ChunkId(*b"EXIF");

const VP8_MIN_LEN: usize = 10;
const VP8L_MIN_LEN: usize = 5;
const VP8X_MIN_LEN: usize = 10;

const VP8_START_CODE: [u8; 3] = [0x9D, 0x01, 0x2A];
const VP8L_SIGNATURE: u8 = 0x2F;

const VP8X_ALPHA: u8 = 0x10;
const VP8X_ANIMATION: u8 = 0x02;

const DIMENSION_MASK: u32 = 0x3FFF;

/// What one image chunk says about the frame.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
struct FrameInfo {
    dimensions: Dimensions,
    compression: Option<WebpCompression>,
    flags: Option<u8>,
}

fn too_short(file: &FileInfo, chunk: &RiffChunk, min: usize) -> crate::types::Error {
    malformed!(
        file, ImageFormat::WebP, Some(chunk.offset() as u64),
        "{} chunk has {} bytes, expected at least {}", chunk.chunk_id(), chunk.len(), min
    )
}

fn read_vp8(file: &FileInfo, chunk: &RiffChunk) -> Result<FrameInfo> {
    let data = chunk.contents();
    if data.len() < VP8_MIN_LEN {
        return Err(too_short(file, chunk, VP8_MIN_LEN));
    }

    // bytes 0-2 are the frame tag, 3-5 the key frame start code, then two
    // 16-bit fields holding a 2-bit scale over a 14-bit size
    if data[3..6] != VP8_START_CODE {
        warn!("{}: VP8 key frame start code is invalid: {:02X?}", file.name, &data[3..6]);
    }

    let field = |at| read_u16_le_at(data, at).map_or(0, |v| v as u32 & DIMENSION_MASK);
    Ok(FrameInfo {
        dimensions: (field(6), field(8)).into(),
        compression: Some(WebpCompression::Lossy),
        flags: None,
    })
}

fn read_vp8l(file: &FileInfo, chunk: &RiffChunk) -> Result<FrameInfo> {
    let data = chunk.contents();
    if data.len() < VP8L_MIN_LEN {
        return Err(too_short(file, chunk, VP8L_MIN_LEN));
    }
    if data[0] != VP8L_SIGNATURE {
        warn!("{}: VP8L signature byte is {:#04X}, expected {:#04X}", file.name, data[0], VP8L_SIGNATURE);
    }

    // bits of the 32-bit value after the signature, low to high:
    //    14 bits width - 1, 14 bits height - 1, alpha hint, 3 bits version
    let bits = read_u32_le_at(data, 1).unwrap_or(0);
    Ok(FrameInfo {
        dimensions: ((bits & DIMENSION_MASK) + 1, ((bits >> 14) & DIMENSION_MASK) + 1).into(),
        compression: Some(WebpCompression::Lossless),
        flags: None,
    })
}

fn read_vp8x(file: &FileInfo, chunk: &RiffChunk) -> Result<FrameInfo> {
    let data = chunk.contents();
    if data.len() < VP8X_MIN_LEN {
        return Err(too_short(file, chunk, VP8X_MIN_LEN));
    }

    // flags byte, three reserved bytes, then canvas width - 1 and height - 1
    // as 24-bit values
    let canvas = |at| read_u24_le_at(data, at).map_or(0, |v| v + 1);
    Ok(FrameInfo {
        dimensions: (canvas(4), canvas(7)).into(),
        compression: None,
        flags: Some(data[0]),
    })
}

/// Reads WebP canvas geometry and features from the RIFF sub-chunks, and
/// EXIF from an `EXIF` chunk if there is one.
#[derive(Clone, Debug)]
pub struct WebpDecoder {
    read_exif: bool,
}

impl WebpDecoder {
    pub fn new(config: &Config) -> WebpDecoder {
        WebpDecoder { read_exif: config.read_exif }
    }
}

impl Default for WebpDecoder {
    fn default() -> WebpDecoder {
        WebpDecoder::new(&Config::default())
    }
}

impl Decoder for WebpDecoder {
    #[inline]
    fn format(&self) -> ImageFormat { ImageFormat::WebP }

    #[inline]
    fn header_len(&self) -> usize { riff::RIFF_HEADER_LEN }

    fn can_handle(&self, header: &[u8], file_name: &str) -> bool {
        has_extension(file_name, &["webp"])
            && riff::read_header(header).map_or(false, |h| h.form_type == WEBP_FORM_TYPE)
    }

    fn extract(&self, bytes: &[u8], file: FileInfo) -> Result<ImageMetadata> {
        match riff::read_header(bytes) {
            Some(h) if h.form_type == WEBP_FORM_TYPE => {}
            _ => return Err(malformed!(file, ImageFormat::WebP, Some(0), "invalid RIFF/WEBP signature")),
        }

        let mut dimensions = Dimensions::default();
        let mut compression = WebpCompression::Unknown;
        let mut flags = 0u8;
        let mut exif = None;

        for chunk in Chunks::after_header(bytes) {
            let chunk = chunk.map_err(|t| malformed!(
                file, ImageFormat::WebP, Some(t.offset as u64),
                "{} chunk declares {} bytes but only {} remain", t.chunk_id, t.declared, t.available
            ))?;
            trace!("{}: RIFF chunk {} ({} bytes) at {}", file.name, chunk.chunk_id(), chunk.len(), chunk.offset());

            let frame = match chunk.chunk_id() {
                VP8_CHUNK_ID => read_vp8(&file, &chunk)?,
                VP8L_CHUNK_ID => read_vp8l(&file, &chunk)?,
                VP8X_CHUNK_ID => read_vp8x(&file, &chunk)?,
                EXIF_CHUNK_ID => {
                    exif = Some(chunk.contents());
                    continue;
                }
                _ => continue,
            };

            dimensions = frame.dimensions;
            if let Some(c) = frame.compression {
                compression = c;
            }
            if let Some(f) = frame.flags {
                flags = f;
            }
        }

        let info = WebpInfo {
            compression_type: compression,
            has_alpha: flags & VP8X_ALPHA != 0,
            is_animated: flags & VP8X_ANIMATION != 0,
        };
        let color_type = if info.has_alpha { "RGBA" } else { "RGB" };

        let mut md = ImageMetadata::new(
            ImageFormat::WebP,
            file,
            dimensions,
            ColorInfo { color_type: color_type.into(), bit_depth: 8 },
        );
        md.webp = Some(info);

        if self.read_exif {
            match exif.map(read_from_tiff) {
                Some(Ok(tags)) => map_tags(&tags).apply_to(&mut md),
                Some(Err(ExifError::NotFound(_))) | None => debug!("{}: no EXIF data", md.file.name),
                Some(Err(e)) => warn!("{}: ignoring unreadable EXIF data: {}", md.file.name, e),
            }
        }

        Ok(md)
    }
}
