use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Borrows `len` bytes at `offset`, or `None` if that runs past the end.
#[inline]
pub fn slice_at(data: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    let end = offset.checked_add(len)?;
    data.get(offset..end)
}

#[inline]
pub fn read_u16_be_at(data: &[u8], offset: usize) -> Option<u16> {
    slice_at(data, offset, 2).map(BigEndian::read_u16)
}

#[inline]
pub fn read_u32_be_at(data: &[u8], offset: usize) -> Option<u32> {
    slice_at(data, offset, 4).map(BigEndian::read_u32)
}

#[inline]
pub fn read_u16_le_at(data: &[u8], offset: usize) -> Option<u16> {
    slice_at(data, offset, 2).map(LittleEndian::read_u16)
}

#[inline]
pub fn read_u24_le_at(data: &[u8], offset: usize) -> Option<u32> {
    slice_at(data, offset, 3).map(LittleEndian::read_u24)
}

#[inline]
pub fn read_u32_le_at(data: &[u8], offset: usize) -> Option<u32> {
    slice_at(data, offset, 4).map(LittleEndian::read_u32)
}

/// Case-insensitive file extension test; `exts` are given without the dot.
pub fn has_extension(file_name: &str, exts: &[&str]) -> bool {
    let lower = file_name.to_ascii_lowercase();
    exts.iter().any(|ext| {
        lower.len() > ext.len()
            && lower.ends_with(ext)
            && lower.as_bytes()[lower.len() - ext.len() - 1] == b'.'
    })
}

/// Decodes ISO 8859-1 text, where every byte is its own code point.
pub fn latin1_to_string(data: &[u8]) -> String {
    data.iter().map(|&b| b as char).collect()
}

/// Splits at the first NUL byte, dropping the NUL itself.
pub fn split_nul(data: &[u8]) -> Option<(&[u8], &[u8])> {
    data.iter().position(|&b| b == 0).map(|i| (&data[..i], &data[i + 1..]))
}
