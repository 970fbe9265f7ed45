use std::borrow::Cow;
use std::fmt;
use std::io;
use std::result;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unsupported file format: {file_name}")]
    UnsupportedFormat { file_name: String },

    #[error("malformed {format} image {file_name}{}: {reason}", at_offset(.offset))]
    MalformedImage {
        file_name: String,
        format: ImageFormat,
        offset: Option<u64>,
        reason: Cow<'static, str>,
    },

    #[error("I/O error reading {file_name}: {source}")]
    Io {
        file_name: String,
        #[source]
        source: io::Error,
    },
}

fn at_offset(offset: &Option<u64>) -> String {
    match *offset {
        Some(n) => format!(" at byte {}", n),
        None => String::new(),
    }
}

impl Error {
    /// Name of the file the failure relates to.
    pub fn file_name(&self) -> &str {
        match *self {
            Error::UnsupportedFormat { ref file_name }
            | Error::MalformedImage { ref file_name, .. }
            | Error::Io { ref file_name, .. } => file_name,
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ImageFormat {
    #[serde(rename = "PNG")]
    Png,
    #[serde(rename = "JPEG")]
    Jpeg,
    #[serde(rename = "WebP")]
    WebP,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match *self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            ImageFormat::Png => "PNG",
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::WebP => "WebP",
        })
    }
}

/// Attributes of the input file supplied by the caller, not read from the bytes.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub name: String,
    pub size_bytes: u64,
}

impl FileInfo {
    pub fn new<S: Into<String>>(name: S, size_bytes: u64) -> FileInfo {
        FileInfo {
            name: name.into(),
            size_bytes,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl<T: Into<u32>, U: Into<u32>> From<(T, U)> for Dimensions {
    fn from((w, h): (T, U)) -> Dimensions {
        Dimensions {
            width: w.into(),
            height: h.into(),
        }
    }
}

impl Dimensions {
    /// Width and height divided by their greatest common divisor.
    ///
    /// Returns `None` when either side is zero.
    pub fn aspect_ratio(&self) -> Option<(u32, u32)> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let d = gcd(self.width, self.height);
        Some((self.width / d, self.height / d))
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorInfo {
    pub color_type: String,
    pub bit_depth: u8,
}

/// Raw PNG `IHDR` compression parameters.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compression {
    pub compression_method: u8,
    pub filter_method: u8,
    pub interlace_method: u8,
}

pub const UNIT_UNKNOWN: u8 = 0;
pub const UNIT_METER: u8 = 1;

const METERS_PER_INCH: f64 = 0.0254;

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalDimensions {
    pub pixels_per_unit_x: u32,
    pub pixels_per_unit_y: u32,
    /// 0 = unknown (aspect only), 1 = meter.
    pub unit: u8,
}

impl PhysicalDimensions {
    /// Dots per inch along X and Y, only defined for a meter unit.
    pub fn dpi(&self) -> Option<(u32, u32)> {
        if self.unit != UNIT_METER {
            return None;
        }
        let conv = |ppm: u32| (ppm as f64 * METERS_PER_INCH).round() as u32;
        Some((conv(self.pixels_per_unit_x), conv(self.pixels_per_unit_y)))
    }
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso: Option<u32>,
    /// Seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure_time: Option<f64>,
    #[serde(default, rename = "fNumber", skip_serializing_if = "Option::is_none")]
    pub f_number: Option<f64>,
    /// Millimeters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metering_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure_program: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white_balance: Option<String>,
}

impl CameraInfo {
    pub fn is_empty(&self) -> bool {
        *self == CameraInfo::default()
    }
}

/// PNG `iTXt` payload that carries a language tag or translated keyword.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternationalText {
    pub language: String,
    pub translated_keyword: String,
    pub text: String,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextValue {
    Text(String),
    International(InternationalText),
}

impl TextValue {
    /// The annotation text regardless of representation.
    pub fn text(&self) -> &str {
        match *self {
            TextValue::Text(ref s) => s,
            TextValue::International(ref t) => &t.text,
        }
    }
}

impl From<String> for TextValue {
    fn from(s: String) -> TextValue {
        TextValue::Text(s)
    }
}

impl<'a> From<&'a str> for TextValue {
    fn from(s: &'a str) -> TextValue {
        TextValue::Text(s.to_owned())
    }
}

/// Keyword to annotation mapping that keeps insertion order.
///
/// Serializes as a JSON object whose keys appear in insertion order.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct TextMetadata {
    entries: Vec<(String, TextValue)>,
}

impl TextMetadata {
    pub fn new() -> TextMetadata {
        TextMetadata::default()
    }

    /// Inserts a value; a repeated key replaces the old value in place.
    pub fn insert<K: Into<String>, V: Into<TextValue>>(&mut self, key: K, value: V) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|entry| entry.0 == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&TextValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TextValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `None` when empty, so that absent groups stay absent.
    pub fn into_option(self) -> Option<TextMetadata> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

impl Serialize for TextMetadata {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TextMetadata {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> result::Result<TextMetadata, D::Error> {
        struct EntriesVisitor;

        impl<'de> serde::de::Visitor<'de> for EntriesVisitor {
            type Value = TextMetadata;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of text annotations")
            }

            fn visit_map<A: serde::de::MapAccess<'de>>(self, mut access: A) -> result::Result<TextMetadata, A::Error> {
                let mut md = TextMetadata::new();
                while let Some((k, v)) = access.next_entry::<String, TextValue>()? {
                    md.insert(k, v);
                }
                Ok(md)
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum WebpCompression {
    Lossy,
    Lossless,
    Unknown,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebpInfo {
    pub compression_type: WebpCompression,
    pub has_alpha: bool,
    pub is_animated: bool,
}

/// Metadata extracted from a single image file.
///
/// Optional groups are `None` when the file carries no such data and are
/// omitted entirely from serialized output.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    pub format: ImageFormat,
    pub file: FileInfo,
    pub dimensions: Dimensions,
    pub color: ColorInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<Compression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_dimensions: Option<PhysicalDimensions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_info: Option<CameraInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_metadata: Option<TextMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webp: Option<WebpInfo>,
}

impl ImageMetadata {
    /// A record with the mandatory groups set and every optional group absent.
    pub fn new(format: ImageFormat, file: FileInfo, dimensions: Dimensions, color: ColorInfo) -> ImageMetadata {
        ImageMetadata {
            format,
            file,
            dimensions,
            color,
            compression: None,
            physical_dimensions: None,
            camera_info: None,
            text_metadata: None,
            webp: None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}
