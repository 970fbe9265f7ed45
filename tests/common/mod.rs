#![allow(dead_code)]

use std::io::{Cursor, Write};

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use flate2::write::ZlibEncoder;
use flate2::Compression;

pub const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

pub struct PngBuilder {
    data: Vec<u8>,
}

impl PngBuilder {
    pub fn new(width: u32, height: u32, bit_depth: u8, color_type: u8, interlace: u8) -> PngBuilder {
        let mut ihdr = Vec::new();
        ihdr.write_u32::<BigEndian>(width).unwrap();
        ihdr.write_u32::<BigEndian>(height).unwrap();
        ihdr.write_all(&[bit_depth, color_type, 0, 0, interlace]).unwrap();

        let mut b = PngBuilder { data: PNG_SIGNATURE.to_vec() };
        b.chunk(b"IHDR", &ihdr);
        b
    }

    pub fn chunk(&mut self, ty: &[u8; 4], data: &[u8]) -> &mut PngBuilder {
        self.data.write_u32::<BigEndian>(data.len() as u32).unwrap();
        self.data.write_all(ty).unwrap();
        self.data.write_all(data).unwrap();
        self.data.write_all(&[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
        self
    }

    pub fn phys(&mut self, x: u32, y: u32, unit: u8) -> &mut PngBuilder {
        let mut d = Vec::new();
        d.write_u32::<BigEndian>(x).unwrap();
        d.write_u32::<BigEndian>(y).unwrap();
        d.push(unit);
        self.chunk(b"pHYs", &d)
    }

    pub fn text(&mut self, key: &str, value: &str) -> &mut PngBuilder {
        let mut d = key.as_bytes().to_vec();
        d.push(0);
        d.extend_from_slice(value.as_bytes());
        self.chunk(b"tEXt", &d)
    }

    pub fn ztxt(&mut self, key: &str, value: &str) -> &mut PngBuilder {
        let mut d = key.as_bytes().to_vec();
        d.extend_from_slice(&[0, 0]);
        d.extend(zlib(value.as_bytes()));
        self.chunk(b"zTXt", &d)
    }

    pub fn itxt(&mut self, key: &str, language: &str, translated: &str, value: &str) -> &mut PngBuilder {
        let mut d = Vec::new();
        for part in [key, "\0\0\0", language, "\0", translated, "\0", value] {
            d.extend_from_slice(part.as_bytes());
        }
        self.chunk(b"iTXt", &d)
    }

    pub fn build(&mut self) -> Vec<u8> {
        self.chunk(b"IDAT", &zlib(&[0, 0, 0, 0]));
        self.chunk(b"IEND", &[]);
        self.data.clone()
    }
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut e = ZlibEncoder::new(Vec::new(), Compression::default());
    e.write_all(data).unwrap();
    e.finish().unwrap()
}

pub fn ascii(tag: Tag, s: &str) -> Field {
    Field { tag, ifd_num: In::PRIMARY, value: Value::Ascii(vec![s.as_bytes().to_vec()]) }
}

pub fn rational(tag: Tag, num: u32, denom: u32) -> Field {
    Field { tag, ifd_num: In::PRIMARY, value: Value::Rational(vec![Rational { num, denom }]) }
}

pub fn short(tag: Tag, n: u16) -> Field {
    Field { tag, ifd_num: In::PRIMARY, value: Value::Short(vec![n]) }
}

/// A little-endian TIFF block holding `fields`.
pub fn tiff(fields: &[Field]) -> Vec<u8> {
    let mut w = Writer::new();
    for f in fields {
        w.push_field(f);
    }
    let mut buf = Cursor::new(Vec::new());
    w.write(&mut buf, true).unwrap();
    buf.into_inner()
}

/// The EXIF block of a Canon EOS 40D sample photo.
pub fn canon_fields() -> Vec<Field> {
    vec![
        ascii(Tag::Make, "Canon"),
        ascii(Tag::Model, "Canon EOS 40D"),
        ascii(Tag::Software, "GIMP 2.4.5"),
        ascii(Tag::DateTime, "2008:07:31 10:38:11"),
        ascii(Tag::DateTimeOriginal, "2008:05:30 15:56:01"),
        rational(Tag::XResolution, 72, 1),
        rational(Tag::YResolution, 72, 1),
        short(Tag::ResolutionUnit, 2),
        rational(Tag::ExposureTime, 1, 160),
        rational(Tag::FNumber, 71, 10),
        short(Tag::PhotographicSensitivity, 100),
        rational(Tag::FocalLength, 135, 1),
        short(Tag::Flash, 9),
        short(Tag::MeteringMode, 5),
        short(Tag::ExposureProgram, 1),
        short(Tag::WhiteBalance, 0),
    ]
}

fn segment(out: &mut Vec<u8>, marker: u8, data: &[u8]) {
    out.write_all(&[0xFF, marker]).unwrap();
    out.write_u16::<BigEndian>(data.len() as u16 + 2).unwrap();
    out.write_all(data).unwrap();
}

/// A baseline JPEG skeleton with an optional APP1 EXIF segment.
pub fn jpeg(width: u16, height: u16, exif: Option<Vec<u8>>) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];
    segment(&mut out, 0xE0, b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0");
    if let Some(tiff) = exif {
        let mut app1 = b"Exif\0\0".to_vec();
        app1.extend(tiff);
        segment(&mut out, 0xE1, &app1);
    }
    segment(&mut out, 0xDB, &[0; 65]);

    let mut sof = vec![8];
    sof.write_u16::<BigEndian>(height).unwrap();
    sof.write_u16::<BigEndian>(width).unwrap();
    sof.extend_from_slice(&[3, 1, 0x22, 0, 2, 0x11, 1, 3, 0x11, 1]);
    segment(&mut out, 0xC0, &sof);

    segment(&mut out, 0xDA, &[3, 1, 0, 2, 0x11, 3, 0x11, 0, 0x3F, 0]);
    out.extend_from_slice(&[0x12, 0x34, 0xFF, 0x00, 0x56]);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

pub fn riff_chunk(out: &mut Vec<u8>, id: &[u8; 4], data: &[u8]) {
    out.write_all(id).unwrap();
    out.write_u32::<LittleEndian>(data.len() as u32).unwrap();
    out.write_all(data).unwrap();
    if data.len() % 2 == 1 {
        out.push(0);
    }
}

pub fn webp(chunks: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let mut body = b"WEBP".to_vec();
    for (id, data) in chunks {
        riff_chunk(&mut body, id, data);
    }
    let mut out = b"RIFF".to_vec();
    out.write_u32::<LittleEndian>(body.len() as u32).unwrap();
    out.extend(body);
    out
}

pub fn vp8(width: u16, height: u16) -> Vec<u8> {
    let mut d = vec![0x50, 0x02, 0x00, 0x9D, 0x01, 0x2A];
    d.write_u16::<LittleEndian>(width).unwrap();
    d.write_u16::<LittleEndian>(height).unwrap();
    d.extend_from_slice(&[0; 8]);
    d
}

pub fn vp8l(width: u32, height: u32) -> Vec<u8> {
    let mut d = vec![0x2F];
    d.write_u32::<LittleEndian>((width - 1) | ((height - 1) << 14)).unwrap();
    d
}

pub fn vp8x(flags: u8, width: u32, height: u32) -> Vec<u8> {
    let mut d = vec![flags, 0, 0, 0];
    d.write_u24::<LittleEndian>(width - 1).unwrap();
    d.write_u24::<LittleEndian>(height - 1).unwrap();
    d
}
