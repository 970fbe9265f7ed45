pub mod exif;
pub mod riff;
