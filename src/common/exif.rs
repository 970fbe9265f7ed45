//! Thin layer over `kamadak-exif` that turns an EXIF block into a flat map
//! from tag names to simple values.
//!
//! Only a fixed vocabulary of primary-image tags is read; the thumbnail IFD and ICC data are never consulted. Callers must treat
//! every failure here as recoverable.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Cursor;

use chrono::{NaiveDate, NaiveDateTime};
use exif::{Exif, Field, In, Reader, Tag, Value};
use log::{trace, warn};

pub use exif::Error as ExifError;

/// A decoded tag value.
#[derive(Clone, PartialEq, Debug)]
pub enum TagValue {
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
}

pub type TagMap = BTreeMap<String, TagValue>;

const ISO_8601: &str = "%Y-%m-%dT%H:%M:%S";

impl TagValue {
    /// Numeric view; text is parsed when it holds a number.
    pub fn as_number(&self) -> Option<f64> {
        match *self {
            TagValue::Number(n) => Some(n),
            TagValue::Text(ref s) => s.trim().parse().ok(),
            TagValue::Date(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match *self {
            TagValue::Text(ref s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for TagValue {
    /// Dates render as ISO 8601 local time (`2008-05-30T15:56:01`) with no
    /// zone or `Z` suffix, since EXIF dates carry no offset. Everything else
    /// renders in its natural form.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            TagValue::Text(ref s) => f.write_str(s),
            TagValue::Number(n) => write!(f, "{}", n),
            TagValue::Date(ref d) => write!(f, "{}", d.format(ISO_8601)),
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum Conversion {
    Text,
    Number,
    /// Coded values rendered through the library's human-readable tables.
    Enumerated,
    Date,
    Comment,
}

/// Tags read from the primary IFD, the names they are reported under and
/// how their values are decoded.
const VOCABULARY: &[(Tag, &str, Conversion)] = &[
    (Tag::Make, "Make", Conversion::Text),
    (Tag::Model, "Model", Conversion::Text),
    (Tag::PhotographicSensitivity, "ISO", Conversion::Number),
    (Tag::ExposureTime, "ExposureTime", Conversion::Number),
    (Tag::FNumber, "FNumber", Conversion::Number),
    (Tag::FocalLength, "FocalLength", Conversion::Number),
    (Tag::Flash, "Flash", Conversion::Enumerated),
    (Tag::MeteringMode, "MeteringMode", Conversion::Enumerated),
    (Tag::ExposureProgram, "ExposureProgram", Conversion::Enumerated),
    (Tag::WhiteBalance, "WhiteBalance", Conversion::Enumerated),
    (Tag::Artist, "Artist", Conversion::Text),
    (Tag::Copyright, "Copyright", Conversion::Text),
    (Tag::Software, "Software", Conversion::Text),
    (Tag::ImageDescription, "ImageDescription", Conversion::Text),
    (Tag::UserComment, "UserComment", Conversion::Comment),
    (Tag::DateTime, "ModifyDate", Conversion::Date),
    (Tag::DateTimeOriginal, "DateTimeOriginal", Conversion::Date),
    (Tag::DateTimeDigitized, "CreateDate", Conversion::Date),
    (Tag::XResolution, "XResolution", Conversion::Number),
    (Tag::YResolution, "YResolution", Conversion::Number),
    (Tag::ResolutionUnit, "ResolutionUnit", Conversion::Number),
];

/// Reads EXIF from a complete image file (JPEG and the other containers
/// `kamadak-exif` understands).
pub fn read_from_container(data: &[u8]) -> Result<TagMap, ExifError> {
    let exif = Reader::new()
        .continue_on_error(true)
        .read_from_container(&mut Cursor::new(data))
        .or_else(|e| e.distill_partial_result(log_partial))?;
    Ok(collect_tags(&exif))
}

/// Reads EXIF from a bare TIFF block, as stored in a WebP `EXIF` chunk.
///
/// Some writers keep the JPEG-style `Exif\0\0` preamble; it is skipped.
pub fn read_from_tiff(data: &[u8]) -> Result<TagMap, ExifError> {
    let data = data.strip_prefix(b"Exif\0\0").unwrap_or(data);
    let exif = Reader::new()
        .continue_on_error(true)
        .read_raw(data.to_vec())
        .or_else(|e| e.distill_partial_result(log_partial))?;
    Ok(collect_tags(&exif))
}

fn log_partial(errors: Vec<ExifError>) {
    for e in errors {
        warn!("ignoring damaged EXIF entry: {}", e);
    }
}

fn collect_tags(exif: &Exif) -> TagMap {
    let mut tags = TagMap::new();
    let little_endian = exif.little_endian();
    for &(tag, name, conversion) in VOCABULARY {
        let field = match exif.get_field(tag, In::PRIMARY) {
            Some(f) => f,
            None => continue,
        };
        match convert(field, conversion, little_endian) {
            Some(value) => {
                trace!("EXIF {} = {:?}", name, value);
                tags.insert(name.to_owned(), value);
            }
            None => trace!("EXIF {} has an unusable value: {:?}", name, field.value),
        }
    }
    tags
}

fn convert(field: &Field, conversion: Conversion, little_endian: bool) -> Option<TagValue> {
    match conversion {
        Conversion::Text => match field.value {
            Value::Ascii(ref parts) => ascii_text(parts).map(TagValue::Text),
            _ => non_empty(field.display_value().to_string()).map(TagValue::Text),
        },
        Conversion::Number => number(&field.value).map(TagValue::Number),
        Conversion::Enumerated => non_empty(field.display_value().to_string()).map(TagValue::Text),
        Conversion::Date => match field.value {
            Value::Ascii(ref parts) => {
                let raw = parts.first()?;
                match parse_date(raw) {
                    Some(d) => Some(TagValue::Date(d)),
                    None => ascii_text(parts).map(TagValue::Text),
                }
            }
            _ => None,
        },
        Conversion::Comment => match field.value {
            Value::Undefined(ref data, _) => decode_user_comment(data, little_endian).map(TagValue::Text),
            Value::Ascii(ref parts) => ascii_text(parts).map(TagValue::Text),
            _ => None,
        },
    }
}

fn number(value: &Value) -> Option<f64> {
    let n = match *value {
        Value::Rational(ref v) => v.first()?.to_f64(),
        Value::SRational(ref v) => v.first()?.to_f64(),
        Value::Float(ref v) => *v.first()? as f64,
        Value::Double(ref v) => *v.first()?,
        Value::Byte(_) | Value::Short(_) | Value::Long(_) => value.get_uint(0)? as f64,
        _ => return None,
    };
    if n.is_finite() {
        Some(n)
    } else {
        None
    }
}

fn ascii_text(parts: &[Vec<u8>]) -> Option<String> {
    parts
        .iter()
        .filter_map(|p| non_empty(String::from_utf8_lossy(p).into_owned()))
        .next()
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == s.len() {
        Some(s)
    } else {
        Some(trimmed.to_owned())
    }
}

fn parse_date(raw: &[u8]) -> Option<NaiveDateTime> {
    let dt = exif::DateTime::from_ascii(raw).ok()?;
    NaiveDate::from_ymd_opt(dt.year as i32, dt.month as u32, dt.day as u32)?
        .and_hms_opt(dt.hour as u32, dt.minute as u32, dt.second as u32)
}

/// Decodes an EXIF `UserComment`: an 8-byte character code followed by the text.
///
/// `UNICODE` text is UTF-16 in the byte order of the enclosing TIFF block.
fn decode_user_comment(data: &[u8], little_endian: bool) -> Option<String> {
    if data.len() < 8 {
        return None;
    }
    let (code, text) = data.split_at(8);
    match code {
        b"ASCII\0\0\0" | b"\0\0\0\0\0\0\0\0" => non_empty(String::from_utf8_lossy(text).into_owned()),
        b"UNICODE\0" => non_empty(decode_utf16(text, little_endian)),
        _ => None,
    }
}

fn decode_utf16(data: &[u8], little_endian: bool) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|p| if little_endian { u16::from_le_bytes([p[0], p[1]]) } else { u16::from_be_bytes([p[0], p[1]]) })
        .collect();
    String::from_utf16_lossy(&units)
}
