use std::fmt::Write;

use imgmeta::{Dimensions, ImageMetadata, TextValue, WebpCompression};

const KB: u64 = 1024;
const MB: u64 = 1024 * 1024;

pub fn format_file_size(bytes: u64) -> String {
    if bytes < KB {
        format!("{} bytes", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    }
}

pub fn format_aspect_ratio(dimensions: &Dimensions) -> String {
    match dimensions.aspect_ratio() {
        Some((w, h)) => format!("{}:{}", w, h),
        None => "unknown".into(),
    }
}

/// Sub-second exposures print as a reciprocal, e.g. `1/200s`.
pub fn format_exposure_time(seconds: f64) -> String {
    if seconds > 0.0 && seconds < 1.0 {
        format!("1/{}s", (1.0 / seconds).round())
    } else {
        format!("{}s", seconds)
    }
}

pub fn compression_method_label(n: u8) -> String {
    match n {
        0 => "Deflate".into(),
        n => format!("Unknown ({})", n),
    }
}

pub fn filter_method_label(n: u8) -> String {
    match n {
        0 => "Adaptive".into(),
        n => format!("Unknown ({})", n),
    }
}

pub fn interlace_method_label(n: u8) -> String {
    match n {
        0 => "None".into(),
        1 => "Adam7".into(),
        n => format!("Unknown ({})", n),
    }
}

fn webp_compression_label(c: WebpCompression) -> &'static str {
    match c {
        WebpCompression::Lossy => "Lossy",
        WebpCompression::Lossless => "Lossless",
        WebpCompression::Unknown => "Unknown",
    }
}

fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}

/// Renders the human-readable report for one file.
pub fn render(md: &ImageMetadata) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = render_into(&mut out, md);
    out
}

fn render_into(out: &mut String, md: &ImageMetadata) -> std::fmt::Result {
    writeln!(out, "{} image:", md.format)?;
    writeln!(out, "  File:")?;
    writeln!(out, "    Name: {}", md.file.name)?;
    writeln!(out, "    Size: {}", format_file_size(md.file.size_bytes))?;
    writeln!(out, "    MIME type: {}", md.mime_type())?;

    writeln!(out, "  Dimensions:")?;
    writeln!(out, "    Width: {}px", md.dimensions.width)?;
    writeln!(out, "    Height: {}px", md.dimensions.height)?;
    writeln!(out, "    Aspect ratio: {}", format_aspect_ratio(&md.dimensions))?;

    writeln!(out, "  Color profile:")?;
    writeln!(out, "    Color type: {}", md.color.color_type)?;
    writeln!(out, "    Bit depth: {} bits", md.color.bit_depth)?;

    if let Some(ref c) = md.compression {
        writeln!(out, "  Compression:")?;
        writeln!(out, "    Method: {}", compression_method_label(c.compression_method))?;
        writeln!(out, "    Filter: {}", filter_method_label(c.filter_method))?;
        writeln!(out, "    Interlace: {}", interlace_method_label(c.interlace_method))?;
    }

    if let Some(ref pd) = md.physical_dimensions {
        writeln!(out, "  Physical dimensions:")?;
        let unit = if pd.unit == imgmeta::UNIT_METER { "meter" } else { "unit" };
        writeln!(out, "    Pixels per {}: {} x {}", unit, pd.pixels_per_unit_x, pd.pixels_per_unit_y)?;
        if let Some((x, y)) = pd.dpi() {
            writeln!(out, "    DPI: {} x {}", x, y)?;
        }
    }

    if let Some(ref ci) = md.camera_info {
        writeln!(out, "  Camera:")?;
        if let Some(ref v) = ci.make { writeln!(out, "    Make: {}", v)?; }
        if let Some(ref v) = ci.model { writeln!(out, "    Model: {}", v)?; }
        if let Some(v) = ci.iso { writeln!(out, "    ISO: {}", v)?; }
        if let Some(v) = ci.exposure_time { writeln!(out, "    Exposure: {}", format_exposure_time(v))?; }
        if let Some(v) = ci.f_number { writeln!(out, "    Aperture: f/{}", v)?; }
        if let Some(v) = ci.focal_length { writeln!(out, "    Focal length: {} mm", v)?; }
        if let Some(ref v) = ci.flash { writeln!(out, "    Flash: {}", v)?; }
        if let Some(ref v) = ci.metering_mode { writeln!(out, "    Metering mode: {}", v)?; }
        if let Some(ref v) = ci.exposure_program { writeln!(out, "    Exposure program: {}", v)?; }
        if let Some(ref v) = ci.white_balance { writeln!(out, "    White balance: {}", v)?; }
    }

    if let Some(ref w) = md.webp {
        writeln!(out, "  WebP:")?;
        writeln!(out, "    Compression: {}", webp_compression_label(w.compression_type))?;
        writeln!(out, "    Alpha: {}", yes_no(w.has_alpha))?;
        writeln!(out, "    Animated: {}", yes_no(w.is_animated))?;
    }

    if let Some(ref text) = md.text_metadata {
        writeln!(out, "  Text metadata:")?;
        for (key, value) in text.iter() {
            match *value {
                TextValue::Text(ref s) => writeln!(out, "    {}: {}", key, s)?,
                TextValue::International(ref t) => writeln!(
                    out, "    {} [{}] ({}): {}", key, t.language, t.translated_keyword, t.text
                )?,
            }
        }
    }

    Ok(())
}
