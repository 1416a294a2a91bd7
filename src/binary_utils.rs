use std::io::{self, Cursor, Read, Seek};

fn ensure_remaining(cursor: &Cursor<&[u8]>, needed: u64, what: &str) -> io::Result<()> {
    let len = cursor.get_ref().len() as u64;
    if cursor.position() + needed > len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "Not enough bytes for {} at position {} (buffer length: {})",
                what,
                cursor.position(),
                len
            ),
        ));
    }
    Ok(())
}

pub fn read_u8(cursor: &mut Cursor<&[u8]>) -> io::Result<u8> {
    ensure_remaining(cursor, 1, "u8")?;

    let mut buf = [0u8; 1];
    cursor.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub fn read_u16_le(cursor: &mut Cursor<&[u8]>) -> io::Result<u16> {
    ensure_remaining(cursor, 2, "u16")?;

    let mut buf = [0u8; 2];
    cursor.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

/// Reads a packed 3-byte little-endian value.
pub fn read_u24_le(cursor: &mut Cursor<&[u8]>) -> io::Result<u32> {
    ensure_remaining(cursor, 3, "u24")?;

    let mut buf = [0u8; 3];
    cursor.read_exact(&mut buf)?;
    Ok(u32::from(buf[0]) | u32::from(buf[1]) << 8 | u32::from(buf[2]) << 16)
}

pub fn read_u32_le(cursor: &mut Cursor<&[u8]>) -> io::Result<u32> {
    ensure_remaining(cursor, 4, "u32")?;

    let mut buf = [0u8; 4];
    cursor.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub fn seek_to(cursor: &mut Cursor<&[u8]>, position: u64) -> io::Result<()> {
    use std::io::SeekFrom;

    if position > cursor.get_ref().len() as u64 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Cannot seek to position {} (buffer length: {})",
                position,
                cursor.get_ref().len()
            ),
        ));
    }

    cursor.seek(SeekFrom::Start(position))?;
    Ok(())
}

pub fn read_bytes(cursor: &mut Cursor<&[u8]>, length: usize) -> io::Result<Vec<u8>> {
    ensure_remaining(cursor, length as u64, "byte block")?;

    let mut buffer = vec![0u8; length];
    cursor.read_exact(&mut buffer)?;
    Ok(buffer)
}

/// Borrow `length` bytes at `offset`, or fail with `UnexpectedEof`.
pub fn slice_at(data: &[u8], offset: usize, length: usize) -> io::Result<&[u8]> {
    offset
        .checked_add(length)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "Range {}+{} outside buffer of {} bytes",
                    offset,
                    length,
                    data.len()
                ),
            )
        })
}

pub fn u16_le_at(data: &[u8], offset: usize) -> io::Result<u16> {
    let b = slice_at(data, offset, 2)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

pub fn u16_be_at(data: &[u8], offset: usize) -> io::Result<u16> {
    let b = slice_at(data, offset, 2)?;
    Ok(u16::from_be_bytes([b[0], b[1]]))
}

pub fn i16_le_at(data: &[u8], offset: usize) -> io::Result<i16> {
    let b = slice_at(data, offset, 2)?;
    Ok(i16::from_le_bytes([b[0], b[1]]))
}

pub fn u32_le_at(data: &[u8], offset: usize) -> io::Result<u32> {
    let b = slice_at(data, offset, 4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

pub fn u32_be_at(data: &[u8], offset: usize) -> io::Result<u32> {
    let b = slice_at(data, offset, 4)?;
    Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

/// Back-fill a little-endian u32 into an already written buffer.
pub fn write_u32(data: &mut [u8], value: u32, pos: usize) {
    if pos + 4 <= data.len() {
        data[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
    }
}
