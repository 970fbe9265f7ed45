use std::io;

use crate::types::{FileInfo, ImageFormat, Result, ImageMetadata};

/// A single file's bytes as seen by the inspector.
///
/// Name and size come from the caller; the inspector first peeks at a short
/// prefix and only reads everything once a decoder has accepted the file.
pub trait ByteSource {
    fn name(&self) -> &str;

    fn size(&self) -> u64;

    /// Reads up to `n` bytes from the start of the file. Returns fewer if the
    /// file is shorter.
    fn read_prefix(&mut self, n: usize) -> io::Result<Vec<u8>>;

    fn read_all(&mut self) -> io::Result<Vec<u8>>;

    #[inline]
    fn file_info(&self) -> FileInfo {
        FileInfo::new(self.name(), self.size())
    }
}

impl<'a, S: ByteSource + ?Sized> ByteSource for &'a mut S {
    #[inline]
    fn name(&self) -> &str { (**self).name() }

    #[inline]
    fn size(&self) -> u64 { (**self).size() }

    #[inline]
    fn read_prefix(&mut self, n: usize) -> io::Result<Vec<u8>> { (**self).read_prefix(n) }

    #[inline]
    fn read_all(&mut self) -> io::Result<Vec<u8>> { (**self).read_all() }
}

/// One container format the inspector can recognise and read.
pub trait Decoder: Send + Sync {
    fn format(&self) -> ImageFormat;

    /// Number of leading bytes `can_handle` needs to look at.
    fn header_len(&self) -> usize;

    /// Cheap acceptance test over the file name and a header prefix.
    ///
    /// `header` may be shorter than `header_len()` for very small files.
    fn can_handle(&self, header: &[u8], file_name: &str) -> bool;

    fn extract(&self, bytes: &[u8], file: FileInfo) -> Result<ImageMetadata>;
}
