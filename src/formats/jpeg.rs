use log::{debug, trace, warn};

use crate::common::exif::{read_from_container, ExifError};
use crate::config::Config;
use crate::mapper::map_tags;
use crate::traits::Decoder;
use crate::types::{ColorInfo, Dimensions, FileInfo, ImageFormat, ImageMetadata, Result};
use crate::utils::{has_extension, read_u16_be_at};

pub const SIGNATURE: [u8; 3] = [0xFF, 0xD8, 0xFF];

const SOS: u8 = 0xDA;
const EOI: u8 = 0xD9;

fn is_sof(marker: u8) -> bool {
    match marker {
        0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => true,
        _ => false,
    }
}

/// Markers without a length field.
fn is_standalone(marker: u8) -> bool {
    marker == 0x01 || (0xD0..=0xD8).contains(&marker)
}

/// Walks the marker segments up to the first start-of-frame and reads the
/// frame size from it.
///
/// Returns `Ok(None)` when the scan data or the end of the image is reached
/// before any frame header.
pub fn scan_dimensions(bytes: &[u8], file: &FileInfo) -> Result<Option<Dimensions>> {
    let mut pos = 2;
    loop {
        // Garbage between segments is skipped up to the next marker prefix.
        match bytes[pos.min(bytes.len())..].iter().position(|&b| b == 0xFF) {
            Some(skip) => pos += skip,
            None => return Ok(None),
        }
        // Any number of fill bytes may precede the marker.
        while bytes.get(pos + 1) == Some(&0xFF) {
            pos += 1;
        }
        let marker = match bytes.get(pos + 1) {
            Some(&m) => m,
            None => return Ok(None),
        };

        if marker == 0x00 {
            pos += 2;
            continue;
        }
        if is_standalone(marker) {
            trace!("{}: JPEG marker {:02X} at {}", file.name, marker, pos);
            pos += 2;
            continue;
        }
        if marker == SOS || marker == EOI {
            debug!("{}: JPEG marker {:02X} at {} before any frame header", file.name, marker, pos);
            return Ok(None);
        }

        let at = Some(pos as u64);
        let len = match read_u16_be_at(bytes, pos + 2) {
            Some(len) => len as usize,
            None => return Err(malformed!(file, ImageFormat::Jpeg, at, "truncated segment length")),
        };
        if len < 2 {
            return Err(malformed!(file, ImageFormat::Jpeg, at, "segment length {} is below 2", len));
        }
        let end = pos + 2 + len;
        if end > bytes.len() {
            return Err(malformed!(
                file, ImageFormat::Jpeg, at,
                "segment {:02X} declares {} bytes but only {} remain",
                marker, len, bytes.len() - (pos + 2)
            ));
        }
        trace!("{}: JPEG segment {:02X} ({} bytes) at {}", file.name, marker, len, pos);

        if is_sof(marker) {
            return match (read_u16_be_at(bytes, pos + 5), read_u16_be_at(bytes, pos + 7)) {
                (Some(h), Some(w)) if len >= 7 => Ok(Some((w, h).into())),
                _ => Err(malformed!(file, ImageFormat::Jpeg, at, "frame header too short")),
            };
        }

        pos = end;
    }
}

/// Reads the frame size of a JPEG file and, optionally, its EXIF block.
#[derive(Clone, Debug)]
pub struct JpegDecoder {
    read_exif: bool,
}

impl JpegDecoder {
    pub fn new(config: &Config) -> JpegDecoder {
        JpegDecoder { read_exif: config.read_exif }
    }
}

impl Default for JpegDecoder {
    fn default() -> JpegDecoder {
        JpegDecoder::new(&Config::default())
    }
}

impl Decoder for JpegDecoder {
    #[inline]
    fn format(&self) -> ImageFormat { ImageFormat::Jpeg }

    #[inline]
    fn header_len(&self) -> usize { SIGNATURE.len() }

    fn can_handle(&self, header: &[u8], file_name: &str) -> bool {
        has_extension(file_name, &["jpg", "jpeg"]) && header.starts_with(&SIGNATURE)
    }

    fn extract(&self, bytes: &[u8], file: FileInfo) -> Result<ImageMetadata> {
        if !bytes.starts_with(&SIGNATURE[..2]) {
            return Err(malformed!(file, ImageFormat::Jpeg, Some(0), "missing SOI marker"));
        }

        let dimensions = match scan_dimensions(bytes, &file)? {
            Some(d) => d,
            None => {
                warn!("{}: no frame header found, reporting 0x0", file.name);
                Dimensions::default()
            }
        };

        let mut md = ImageMetadata::new(
            ImageFormat::Jpeg,
            file,
            dimensions,
            ColorInfo { color_type: "RGB".into(), bit_depth: 8 },
        );

        if self.read_exif {
            match read_from_container(bytes) {
                Ok(tags) => map_tags(&tags).apply_to(&mut md),
                Err(ExifError::NotFound(_)) => debug!("{}: no EXIF data", md.file.name),
                Err(e) => warn!("{}: ignoring unreadable EXIF data: {}", md.file.name, e),
            }
        }

        Ok(md)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(out: &mut Vec<u8>, marker: u8, data: &[u8]) {
        out.extend_from_slice(&[0xFF, marker]);
        out.extend_from_slice(&((data.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(data);
    }

    fn sof(marker: u8, w: u16, h: u16) -> Vec<u8> {
        let mut out = Vec::new();
        let mut data = vec![8];
        data.extend_from_slice(&h.to_be_bytes());
        data.extend_from_slice(&w.to_be_bytes());
        data.extend_from_slice(&[3, 1, 0x22, 0, 2, 0x11, 1, 3, 0x11, 1]);
        segment(&mut out, marker, &data);
        out
    }

    fn jpeg(body: &[u8]) -> Vec<u8> {
        let mut out = vec![0xFF, 0xD8];
        out.extend_from_slice(body);
        out.extend_from_slice(&[0xFF, 0xD9]);
        out
    }

    fn extract(data: &[u8]) -> Result<ImageMetadata> {
        JpegDecoder::default().extract(data, FileInfo::new("test.jpg", data.len() as u64))
    }

    #[test]
    fn test_can_handle() {
        let d = JpegDecoder::default();
        assert!(d.can_handle(&[0xFF, 0xD8, 0xFF, 0xE0], "a.jpg"));
        assert!(d.can_handle(&[0xFF, 0xD8, 0xFF, 0xE0], "a.JPEG"));
        assert!(!d.can_handle(&[0xFF, 0xD8, 0xFF, 0xE0], "a.png"));
        assert!(!d.can_handle(&[0xFF, 0xD8, 0x00], "a.jpg"));
    }

    #[test]
    fn test_baseline_frame() {
        let mut body = Vec::new();
        segment(&mut body, 0xE0, b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0");
        body.extend(sof(0xC0, 640, 480));

        let md = extract(&jpeg(&body)).unwrap();
        assert_eq!(md.format, ImageFormat::Jpeg);
        assert_eq!((md.dimensions.width, md.dimensions.height), (640, 480));
        assert_eq!(md.color, ColorInfo { color_type: "RGB".into(), bit_depth: 8 });
        assert_eq!(md.compression, None);
        assert_eq!(md.camera_info, None);
    }

    #[test]
    fn test_all_frame_kinds() {
        for marker in [0xC1, 0xC2, 0xC3, 0xC5, 0xC6, 0xC7, 0xC9, 0xCA, 0xCB, 0xCD, 0xCE, 0xCF] {
            let md = extract(&jpeg(&sof(marker, 3, 5))).unwrap();
            assert_eq!((md.dimensions.width, md.dimensions.height), (3, 5), "marker {:02X}", marker);
        }
    }

    #[test]
    fn test_non_frame_markers_are_skipped() {
        // DHT, JPG and DAC share the C4, C8 and CC codes with no frame header
        let mut body = Vec::new();
        segment(&mut body, 0xC4, &[0, 1, 2, 3, 4, 5, 6, 7]);
        segment(&mut body, 0xC8, &[9, 9, 9, 9, 9, 9, 9, 9]);
        segment(&mut body, 0xCC, &[7, 7, 7, 7, 7, 7, 7, 7]);
        body.extend_from_slice(&[0xFF, 0xFF, 0xFF]);
        body.extend_from_slice(&[0xFF, 0xD0]);
        body.extend(sof(0xC2, 10, 20));

        let md = extract(&jpeg(&body)).unwrap();
        assert_eq!((md.dimensions.width, md.dimensions.height), (10, 20));
    }

    #[test]
    fn test_missing_frame_header_degrades_to_zero() {
        let mut body = Vec::new();
        segment(&mut body, 0xDB, &[0; 65]);
        body.extend_from_slice(&[0xFF, 0xDA]);
        let md = extract(&jpeg(&body)).unwrap();
        assert_eq!((md.dimensions.width, md.dimensions.height), (0, 0));

        let md = extract(&jpeg(&[])).unwrap();
        assert_eq!((md.dimensions.width, md.dimensions.height), (0, 0));
    }

    #[test]
    fn test_bad_segment_lengths() {
        let body = [0xFF, 0xE1, 0x00, 0x01];
        assert!(matches!(
            extract(&jpeg(&body)),
            Err(crate::Error::MalformedImage { offset: Some(2), .. })
        ));

        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE1, 0x10, 0x00];
        data.extend_from_slice(&[0; 16]);
        assert!(matches!(extract(&data), Err(crate::Error::MalformedImage { offset: Some(2), .. })));

        let data = [0xFF, 0xD8, 0xFF, 0xE1, 0x00];
        assert!(matches!(extract(&data), Err(crate::Error::MalformedImage { .. })));
    }

    #[test]
    fn test_short_frame_header() {
        let mut body = Vec::new();
        segment(&mut body, 0xC0, &[8, 0, 1]);
        assert!(matches!(extract(&jpeg(&body)), Err(crate::Error::MalformedImage { .. })));
    }

    #[test]
    fn test_exif_can_be_disabled() {
        let config = Config { read_exif: false, ..Config::default() };
        let data = jpeg(&sof(0xC0, 1, 1));
        let md = JpegDecoder::new(&config).extract(&data, FileInfo::new("a.jpg", 0)).unwrap();
        assert_eq!(md.camera_info, None);
        assert_eq!(md.text_metadata, None);
    }
}
