//! Metadata extraction for PNG, JPEG and WebP images.
//!
//! The [`Inspector`] picks a decoder from the file name and a short header
//! peek, then reads the whole file and returns one [`ImageMetadata`] record.
//! Pixel data is never decoded.
//!
//! ```no_run
//! let md = imgmeta::inspect_file("photo.jpg").unwrap();
//! println!("{} {}x{}", md.format, md.dimensions.width, md.dimensions.height);
//! ```

pub use crate::config::Config;
pub use crate::generic::{inspect, inspect_buffer, inspect_file, Inspector};
pub use crate::source::{BufferSource, FileSource};
pub use crate::traits::{ByteSource, Decoder};
pub use crate::types::{
    CameraInfo, ColorInfo, Compression, Dimensions, Error, FileInfo, ImageFormat, ImageMetadata,
    InternationalText, PhysicalDimensions, Result, TextMetadata, TextValue, WebpCompression, WebpInfo,
    UNIT_METER, UNIT_UNKNOWN,
};

#[macro_use] mod macros;
mod config;
mod generic;
mod source;
mod traits;
mod types;
mod utils;

pub mod common;
pub mod formats;
pub mod mapper;
