pub mod png;
pub mod jpeg;
pub mod webp;

pub use self::jpeg::JpegDecoder;
pub use self::png::PngDecoder;
pub use self::webp::WebpDecoder;
