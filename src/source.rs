use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::traits::ByteSource;

/// A file on disk, opened once and re-read from the start on every request.
pub struct FileSource {
    name: String,
    size: u64,
    file: File,
}

impl FileSource {
    /// Opens `path`; the reported name is the final path component.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<FileSource> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(FileSource { name, size, file })
    }
}

impl ByteSource for FileSource {
    #[inline]
    fn name(&self) -> &str { &self.name }

    #[inline]
    fn size(&self) -> u64 { self.size }

    fn read_prefix(&mut self, n: usize) -> io::Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut buf = Vec::with_capacity(n);
        (&mut self.file).take(n as u64).read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn read_all(&mut self) -> io::Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(0))?;
        let mut buf = Vec::with_capacity(self.size as usize);
        self.file.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// Bytes already in memory, with a caller-supplied name.
pub struct BufferSource<'a> {
    name: String,
    data: Cow<'a, [u8]>,
}

impl<'a> BufferSource<'a> {
    pub fn new<S: Into<String>, D: Into<Cow<'a, [u8]>>>(name: S, data: D) -> BufferSource<'a> {
        BufferSource {
            name: name.into(),
            data: data.into(),
        }
    }
}

impl<'a> ByteSource for BufferSource<'a> {
    #[inline]
    fn name(&self) -> &str { &self.name }

    #[inline]
    fn size(&self) -> u64 { self.data.len() as u64 }

    fn read_prefix(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let n = n.min(self.data.len());
        Ok(self.data[..n].to_vec())
    }

    fn read_all(&mut self) -> io::Result<Vec<u8>> {
        Ok(self.data.to_vec())
    }
}
