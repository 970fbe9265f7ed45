use std::path::Path;

use log::debug;

use crate::config::Config;
use crate::formats::{JpegDecoder, PngDecoder, WebpDecoder};
use crate::source::{BufferSource, FileSource};
use crate::traits::{ByteSource, Decoder};
use crate::types::{Error, ImageMetadata, Result};

/// Identifies a file's format and extracts its metadata.
///
/// Decoders are consulted in registration order and the first one whose
/// `can_handle` accepts the file performs the extraction; later decoders are
/// never tried, even if that extraction fails. An `Inspector` holds no
/// per-file state and can be shared between threads.
pub struct Inspector {
    decoders: Vec<Box<dyn Decoder>>,
}

impl Inspector {
    /// The standard decoder set, in the order PNG, JPEG, WebP.
    pub fn new(config: Config) -> Inspector {
        Inspector::with_decoders(vec![
            Box::new(PngDecoder::new(&config)),
            Box::new(JpegDecoder::new(&config)),
            Box::new(WebpDecoder::new(&config)),
        ])
    }

    pub fn with_decoders(decoders: Vec<Box<dyn Decoder>>) -> Inspector {
        Inspector { decoders }
    }

    pub fn decoders(&self) -> &[Box<dyn Decoder>] {
        &self.decoders
    }

    pub fn identify_and_extract<S: ByteSource + ?Sized>(&self, source: &mut S) -> Result<ImageMetadata> {
        let peek = self.decoders.iter().map(|d| d.header_len()).max().unwrap_or(0);
        let header = source.read_prefix(peek).map_err(|e| io_error(source, e))?;

        let decoder = self
            .decoders
            .iter()
            .find(|d| d.can_handle(&header, source.name()))
            .ok_or_else(|| Error::UnsupportedFormat { file_name: source.name().to_owned() })?;
        debug!("{}: detected {}", source.name(), decoder.format());

        let bytes = source.read_all().map_err(|e| io_error(source, e))?;
        decoder.extract(&bytes, source.file_info())
    }

    pub fn inspect_file<P: AsRef<Path>>(&self, path: P) -> Result<ImageMetadata> {
        let path = path.as_ref();
        let mut source = FileSource::open(path).map_err(|e| Error::Io {
            file_name: path.display().to_string(),
            source: e,
        })?;
        self.identify_and_extract(&mut source)
    }

    pub fn inspect_buffer(&self, name: &str, bytes: &[u8]) -> Result<ImageMetadata> {
        self.identify_and_extract(&mut BufferSource::new(name, bytes))
    }
}

impl Default for Inspector {
    fn default() -> Inspector {
        Inspector::new(Config::default())
    }
}

fn io_error<S: ByteSource + ?Sized>(source: &S, e: std::io::Error) -> Error {
    Error::Io { file_name: source.name().to_owned(), source: e }
}

/// Inspects `source` with the default decoder set.
pub fn inspect<S: ByteSource + ?Sized>(source: &mut S) -> Result<ImageMetadata> {
    Inspector::default().identify_and_extract(source)
}

/// Opens and inspects the file at `path` with the default decoder set.
pub fn inspect_file<P: AsRef<Path>>(path: P) -> Result<ImageMetadata> {
    Inspector::default().inspect_file(path)
}

pub fn inspect_buffer(name: &str, bytes: &[u8]) -> Result<ImageMetadata> {
    Inspector::default().inspect_buffer(name, bytes)
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::types::{ColorInfo, FileInfo, ImageFormat};

    struct Fixed(ImageFormat);

    impl Decoder for Fixed {
        fn format(&self) -> ImageFormat { self.0 }

        fn header_len(&self) -> usize { 2 }

        fn can_handle(&self, header: &[u8], _file_name: &str) -> bool {
            header == b"ok"
        }

        fn extract(&self, _bytes: &[u8], file: FileInfo) -> Result<ImageMetadata> {
            Ok(ImageMetadata::new(self.0, file, (1u8, 1u8).into(), ColorInfo { color_type: "RGB".into(), bit_depth: 8 }))
        }
    }

    struct Broken(ImageFormat);

    impl Decoder for Broken {
        fn format(&self) -> ImageFormat { self.0 }

        fn header_len(&self) -> usize { 2 }

        fn can_handle(&self, header: &[u8], _file_name: &str) -> bool {
            header == b"ok"
        }

        fn extract(&self, _bytes: &[u8], file: FileInfo) -> Result<ImageMetadata> {
            Err(malformed!(file, self.0, Some(1), "bad header"))
        }
    }

    struct Failing;

    impl ByteSource for Failing {
        fn name(&self) -> &str { "broken.png" }

        fn size(&self) -> u64 { 0 }

        fn read_prefix(&mut self, _n: usize) -> io::Result<Vec<u8>> {
            Err(io::Error::new(io::ErrorKind::Other, "device gone"))
        }

        fn read_all(&mut self) -> io::Result<Vec<u8>> {
            Err(io::Error::new(io::ErrorKind::Other, "device gone"))
        }
    }

    #[test]
    fn test_first_accepting_decoder_wins() {
        let inspector = Inspector::with_decoders(vec![
            Box::new(Fixed(ImageFormat::WebP)),
            Box::new(Fixed(ImageFormat::Png)),
        ]);
        let md = inspector.inspect_buffer("x", b"ok").unwrap();
        assert_eq!(md.format, ImageFormat::WebP);
        assert_eq!(md.file, FileInfo::new("x", 2));
    }

    #[test]
    fn test_failed_extraction_does_not_fall_back() {
        let inspector = Inspector::with_decoders(vec![
            Box::new(Broken(ImageFormat::Png)),
            Box::new(Fixed(ImageFormat::Jpeg)),
        ]);
        match inspector.inspect_buffer("x.img", b"ok") {
            Err(Error::MalformedImage { file_name, format, offset, reason }) => {
                assert_eq!(file_name, "x.img");
                assert_eq!(format, ImageFormat::Png);
                assert_eq!(offset, Some(1));
                assert_eq!(reason, "bad header");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_unsupported() {
        let inspector = Inspector::with_decoders(vec![Box::new(Fixed(ImageFormat::Png))]);
        match inspector.inspect_buffer("x.bin", b"no") {
            Err(Error::UnsupportedFormat { file_name }) => assert_eq!(file_name, "x.bin"),
            other => panic!("unexpected result: {:?}", other),
        }

        let empty = Inspector::with_decoders(Vec::new());
        assert!(matches!(empty.inspect_buffer("x", b""), Err(Error::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_read_failure() {
        match inspect(&mut Failing) {
            Err(e @ Error::Io { .. }) => assert_eq!(e.file_name(), "broken.png"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_standard_order() {
        let formats: Vec<_> = Inspector::default().decoders().iter().map(|d| d.format()).collect();
        assert_eq!(formats, [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::WebP]);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            inspect_file("/nonexistent/dir/image.png"),
            Err(Error::Io { .. })
        ));
    }
}
