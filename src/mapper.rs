//! Projection of EXIF tags onto the camera, text and resolution groups of
//! [`ImageMetadata`](crate::ImageMetadata).
//!
//! The mapping is a pure function of a [`TagMap`], so tag maps produced by
//! any reader that uses the same tag names can be fed through it.

use crate::common::exif::{TagMap, TagValue};
use crate::types::{CameraInfo, ImageMetadata, PhysicalDimensions, TextMetadata, UNIT_METER};

/// Pixels per meter in one pixel per inch.
pub const PIXELS_PER_METER_PER_DPI: f64 = 39.3701;

/// EXIF `ResolutionUnit` value for inches.
const RESOLUTION_UNIT_INCHES: f64 = 2.0;

/// EXIF tags copied into the text metadata group, in output order.
pub const TEXT_TAGS: &[&str] = &[
    "Artist",
    "Copyright",
    "Software",
    "ImageDescription",
    "UserComment",
    "DateTime",
    "ModifyDate",
    "DateTimeOriginal",
    "CreateDate",
];

/// The optional groups derived from EXIF; each is `None` when nothing
/// relevant was found.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ExifMetadata {
    pub physical_dimensions: Option<PhysicalDimensions>,
    pub camera_info: Option<CameraInfo>,
    pub text_metadata: Option<TextMetadata>,
}

impl ExifMetadata {
    pub fn is_empty(&self) -> bool {
        self.physical_dimensions.is_none() && self.camera_info.is_none() && self.text_metadata.is_none()
    }

    /// Moves the groups into `md`, leaving groups absent here untouched there.
    pub fn apply_to(self, md: &mut ImageMetadata) {
        if self.physical_dimensions.is_some() {
            md.physical_dimensions = self.physical_dimensions;
        }
        if self.camera_info.is_some() {
            md.camera_info = self.camera_info;
        }
        if self.text_metadata.is_some() {
            md.text_metadata = self.text_metadata;
        }
    }
}

pub fn map_tags(tags: &TagMap) -> ExifMetadata {
    ExifMetadata {
        physical_dimensions: physical_dimensions(tags),
        camera_info: camera_info(tags),
        text_metadata: text_metadata(tags),
    }
}

/// Only inch-based resolution is converted; the result is always per meter.
pub fn physical_dimensions(tags: &TagMap) -> Option<PhysicalDimensions> {
    let x = positive(tags.get("XResolution")?)?;
    let y = positive(tags.get("YResolution")?)?;
    if !is_inches(tags.get("ResolutionUnit")?) {
        return None;
    }
    Some(PhysicalDimensions {
        pixels_per_unit_x: (x * PIXELS_PER_METER_PER_DPI).round() as u32,
        pixels_per_unit_y: (y * PIXELS_PER_METER_PER_DPI).round() as u32,
        unit: UNIT_METER,
    })
}

fn positive(v: &TagValue) -> Option<f64> {
    v.as_number().filter(|&n| n > 0.0)
}

fn is_inches(v: &TagValue) -> bool {
    match *v {
        TagValue::Text(ref s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("inches") || s.eq_ignore_ascii_case("inch")
        }
        TagValue::Number(n) => n == RESOLUTION_UNIT_INCHES,
        _ => false,
    }
}

pub fn camera_info(tags: &TagMap) -> Option<CameraInfo> {
    let text = |name: &str| tags.get(name).map(|v| v.to_string());
    let number = |name: &str| tags.get(name).and_then(TagValue::as_number);

    let ci = CameraInfo {
        make: text("Make"),
        model: text("Model"),
        iso: number("ISO").and_then(to_u32),
        exposure_time: number("ExposureTime"),
        f_number: number("FNumber"),
        focal_length: number("FocalLength"),
        flash: text("Flash"),
        metering_mode: text("MeteringMode"),
        exposure_program: text("ExposureProgram"),
        white_balance: text("WhiteBalance"),
    };

    if ci.is_empty() {
        None
    } else {
        Some(ci)
    }
}

fn to_u32(n: f64) -> Option<u32> {
    if n >= 0.0 && n <= u32::MAX as f64 {
        Some(n.round() as u32)
    } else {
        None
    }
}

/// Text and date tags, dates rendered as ISO 8601. Empty values are skipped.
pub fn text_metadata(tags: &TagMap) -> Option<TextMetadata> {
    let mut md = TextMetadata::new();
    for &name in TEXT_TAGS {
        if let Some(value) = tags.get(name) {
            let s = value.to_string();
            if !s.is_empty() {
                md.insert(name, s);
            }
        }
    }
    md.into_option()
}
