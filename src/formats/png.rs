use std::borrow::Cow;
use std::io::Read;

use flate2::read::ZlibDecoder;
use log::{debug, trace, warn};

use crate::config::Config;
use crate::traits::Decoder;
use crate::types::{
    ColorInfo, Compression, FileInfo, ImageFormat, ImageMetadata, InternationalText, PhysicalDimensions, Result,
    TextMetadata, TextValue,
};
use crate::utils::{has_extension, latin1_to_string, read_u32_be_at, slice_at, split_nul};

pub const SIGNATURE: [u8; 8] = *b"\x89PNG\r\n\x1a\n";

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ColorType {
    Grayscale,
    Rgb,
    Indexed,
    GrayscaleAlpha,
    RgbAlpha,
}

const CT_GRAYSCALE: u8 = 0;
const CT_RGB: u8 = 2;
const CT_INDEXED: u8 = 3;
const CT_GRAYSCALE_ALPHA: u8 = 4;
const CT_RGB_ALPHA: u8 = 6;

impl ColorType {
    pub fn from_u8(n: u8) -> Option<ColorType> {
        match n {
            CT_GRAYSCALE       => Some(ColorType::Grayscale),
            CT_RGB             => Some(ColorType::Rgb),
            CT_INDEXED         => Some(ColorType::Indexed),
            CT_GRAYSCALE_ALPHA => Some(ColorType::GrayscaleAlpha),
            CT_RGB_ALPHA       => Some(ColorType::RgbAlpha),
            _                  => None
        }
    }

    pub fn label(&self) -> &'static str {
        match *self {
            ColorType::Grayscale => "Grayscale",
            ColorType::Rgb => "RGB",
            ColorType::Indexed => "Indexed",
            ColorType::GrayscaleAlpha => "Grayscale with Alpha",
            ColorType::RgbAlpha => "RGBA",
        }
    }
}

/// Display label for a raw `IHDR` color type byte.
pub fn color_type_label(n: u8) -> Cow<'static, str> {
    match ColorType::from_u8(n) {
        Some(ct) => Cow::Borrowed(ct.label()),
        None => Cow::Owned(format!("Unknown ({})", n)),
    }
}

const IHDR_LEN: usize = 13;
const PHYS_LEN: usize = 9;

/// Fields of the `IHDR` chunk, kept raw.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
struct Header {
    width: u32,
    height: u32,
    bit_depth: u8,
    color_type: u8,
    compression_method: u8,
    filter_method: u8,
    interlace_method: u8,
}

impl Header {
    fn parse(data: &[u8]) -> Option<Header> {
        if data.len() != IHDR_LEN {
            return None;
        }
        Some(Header {
            width: read_u32_be_at(data, 0)?,
            height: read_u32_be_at(data, 4)?,
            bit_depth: data[8],
            color_type: data[9],
            compression_method: data[10],
            filter_method: data[11],
            interlace_method: data[12],
        })
    }
}

fn parse_phys(data: &[u8]) -> Option<PhysicalDimensions> {
    if data.len() != PHYS_LEN {
        return None;
    }
    Some(PhysicalDimensions {
        pixels_per_unit_x: read_u32_be_at(data, 0)?,
        pixels_per_unit_y: read_u32_be_at(data, 4)?,
        unit: data[8],
    })
}

/// Why a text chunk did not produce an entry.
enum TextSkip {
    Disabled,
    Invalid(Cow<'static, str>),
}

type TextEntry = std::result::Result<(String, TextValue), TextSkip>;

fn invalid(reason: &'static str) -> TextSkip {
    TextSkip::Invalid(Cow::Borrowed(reason))
}

/// Reads PNG metadata from the `IHDR`, `pHYs`, `tEXt`, `zTXt` and `iTXt`
/// chunks. Chunk CRCs are not verified.
#[derive(Clone, Debug)]
pub struct PngDecoder {
    inflate_text: bool,
    max_text_bytes: usize,
}

impl PngDecoder {
    pub fn new(config: &Config) -> PngDecoder {
        PngDecoder {
            inflate_text: config.inflate_text,
            max_text_bytes: config.max_text_bytes,
        }
    }

    fn inflate(&self, data: &[u8]) -> std::result::Result<Vec<u8>, TextSkip> {
        if !self.inflate_text {
            return Err(TextSkip::Disabled);
        }
        let limit = self.max_text_bytes as u64;
        let mut out = Vec::new();
        ZlibDecoder::new(data)
            .take(limit + 1)
            .read_to_end(&mut out)
            .map_err(|e| TextSkip::Invalid(format!("cannot inflate text: {}", e).into()))?;
        if out.len() as u64 > limit {
            return Err(TextSkip::Invalid(format!("inflated text exceeds {} bytes", limit).into()));
        }
        Ok(out)
    }

    fn read_text(&self, chunk_type: &[u8; 4], data: &[u8]) -> TextEntry {
        let (keyword, rest) = split_nul(data).ok_or_else(|| invalid("keyword is not NUL-terminated"))?;
        if keyword.is_empty() {
            return Err(invalid("empty keyword"));
        }
        let keyword = latin1_to_string(keyword);

        match chunk_type {
            b"tEXt" => Ok((keyword, TextValue::Text(latin1_to_string(rest)))),
            b"zTXt" => {
                let (&method, compressed) = rest.split_first().ok_or_else(|| invalid("missing compression method"))?;
                if method != 0 {
                    return Err(TextSkip::Invalid(format!("unknown compression method {}", method).into()));
                }
                let text = self.inflate(compressed)?;
                Ok((keyword, TextValue::Text(latin1_to_string(&text))))
            }
            _ => {
                let (flag, method) = match *rest {
                    [flag, method, ..] => (flag, method),
                    _ => return Err(invalid("missing compression flag")),
                };
                let (language, rest) = split_nul(&rest[2..]).ok_or_else(|| invalid("language tag is not NUL-terminated"))?;
                let (translated, text) = split_nul(rest).ok_or_else(|| invalid("translated keyword is not NUL-terminated"))?;

                let text = match flag {
                    0 => Cow::Borrowed(text),
                    1 if method == 0 => Cow::Owned(self.inflate(text)?),
                    1 => return Err(TextSkip::Invalid(format!("unknown compression method {}", method).into())),
                    _ => return Err(TextSkip::Invalid(format!("invalid compression flag {}", flag).into())),
                };
                let text = String::from_utf8_lossy(&text).into_owned();

                if language.is_empty() && translated.is_empty() {
                    Ok((keyword, TextValue::Text(text)))
                } else {
                    Ok((keyword, TextValue::International(InternationalText {
                        language: latin1_to_string(language),
                        translated_keyword: String::from_utf8_lossy(translated).into_owned(),
                        text,
                    })))
                }
            }
        }
    }
}

impl Default for PngDecoder {
    fn default() -> PngDecoder {
        PngDecoder::new(&Config::default())
    }
}

impl Decoder for PngDecoder {
    #[inline]
    fn format(&self) -> ImageFormat { ImageFormat::Png }

    #[inline]
    fn header_len(&self) -> usize { SIGNATURE.len() }

    fn can_handle(&self, header: &[u8], file_name: &str) -> bool {
        has_extension(file_name, &["png"]) && header.starts_with(&SIGNATURE)
    }

    fn extract(&self, bytes: &[u8], file: FileInfo) -> Result<ImageMetadata> {
        if !bytes.starts_with(&SIGNATURE) {
            return Err(malformed!(file, ImageFormat::Png, Some(0), "invalid PNG signature"));
        }

        let mut header: Option<Header> = None;
        let mut physical = None;
        let mut text = TextMetadata::new();
        let mut seen_end = false;

        let mut offset = SIGNATURE.len();
        while offset < bytes.len() {
            let at = Some(offset as u64);
            let (len, chunk_type) = match slice_at(bytes, offset, 8) {
                Some(h) => (read_u32_be_at(h, 0).unwrap_or(0), [h[4], h[5], h[6], h[7]]),
                None => return Err(malformed!(file, ImageFormat::Png, at, "truncated chunk header")),
            };
            if len > i32::MAX as u32 {
                return Err(malformed!(file, ImageFormat::Png, at, "chunk length {} exceeds 2^31-1", len));
            }

            let data_start = offset + 8;
            let data = match slice_at(bytes, data_start, len as usize + 4) {
                Some(d) => &d[..len as usize],
                None => return Err(malformed!(
                    file, ImageFormat::Png, at,
                    "{} chunk declares {} bytes plus CRC but only {} remain",
                    String::from_utf8_lossy(&chunk_type), len, bytes.len() - data_start
                )),
            };
            trace!("{}: PNG chunk {} ({} bytes) at {}", file.name, String::from_utf8_lossy(&chunk_type), len, offset);

            if header.is_none() && &chunk_type != b"IHDR" {
                return Err(malformed!(
                    file, ImageFormat::Png, at,
                    "first chunk is {}, expected IHDR", String::from_utf8_lossy(&chunk_type)
                ));
            }

            match &chunk_type {
                b"IHDR" => {
                    if header.is_some() {
                        return Err(malformed!(file, ImageFormat::Png, at, "duplicate IHDR chunk"));
                    }
                    header = Some(Header::parse(data).ok_or_else(|| malformed!(
                        file, ImageFormat::Png, at,
                        "IHDR chunk has length {}, expected {}", len, IHDR_LEN
                    ))?);
                }
                b"pHYs" => match parse_phys(data) {
                    Some(p) => physical = Some(p),
                    None => warn!("{}: ignoring pHYs chunk of length {}", file.name, len),
                },
                b"tEXt" | b"zTXt" | b"iTXt" => match self.read_text(&chunk_type, data) {
                    Ok((k, v)) => text.insert(k, v),
                    Err(TextSkip::Disabled) => debug!("{}: skipping compressed text chunk", file.name),
                    Err(TextSkip::Invalid(reason)) => warn!(
                        "{}: ignoring {} chunk at byte {}: {}",
                        file.name, String::from_utf8_lossy(&chunk_type), offset, reason
                    ),
                },
                b"IEND" => {
                    seen_end = true;
                    break;
                }
                _ => {}
            }

            offset = data_start + len as usize + 4;
        }

        let header = header.ok_or_else(|| malformed!(file, ImageFormat::Png, None, "missing IHDR chunk"))?;
        if !seen_end {
            warn!("{}: PNG stream ends without an IEND chunk", file.name);
        }

        let mut md = ImageMetadata::new(
            ImageFormat::Png,
            file,
            (header.width, header.height).into(),
            ColorInfo {
                color_type: color_type_label(header.color_type).into_owned(),
                bit_depth: header.bit_depth,
            },
        );
        md.compression = Some(Compression {
            compression_method: header.compression_method,
            filter_method: header.filter_method,
            interlace_method: header.interlace_method,
        });
        md.physical_dimensions = physical;
        md.text_metadata = text.into_option();
        Ok(md)
    }
}
