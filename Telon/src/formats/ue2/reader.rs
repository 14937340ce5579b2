//! Bounds-checked cursor over an in-memory package buffer

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};

/// Shifts applied to the 7-bit groups carried by compact index bytes 1-3.
const COMPACT_SHIFTS: [u32; 3] = [6, 13, 20];
/// Shift of the terminal compact index byte, which contributes all 8 bits.
const COMPACT_LAST_SHIFT: u32 = 27;

/// Little-endian reader over a borrowed byte slice.
///
/// Every read is checked against the remaining length first and fails with
/// [`Error::OutOfBounds`] instead of a generic IO error, so callers can tell
/// "ran off the end" apart from everything else.
#[derive(Debug, Clone)]
pub struct Ue2Reader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Ue2Reader<'a> {
    /// Create a reader positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    /// Create a reader positioned at `offset` (clamped to the buffer end).
    #[must_use]
    pub fn at(data: &'a [u8], offset: usize) -> Self {
        let mut reader = Self::new(data);
        reader.cursor.set_position(offset.min(data.len()) as u64);
        reader
    }

    /// The whole underlying buffer.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        *self.cursor.get_ref()
    }

    /// Total buffer length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    /// Current position.
    #[must_use]
    pub fn tell(&self) -> usize {
        self.cursor.position() as usize
    }

    /// Bytes left after the current position.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.tell())
    }

    /// Move to an absolute position. Seeking exactly to the end is allowed.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.len() {
            return Err(Error::OutOfBounds {
                offset: pos,
                needed: 0,
                len: self.len(),
            });
        }
        self.cursor.set_position(pos as u64);
        Ok(())
    }

    /// Advance by `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.cursor.set_position((self.tell() + n) as u64);
        Ok(())
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.remaining() < needed {
            return Err(Error::OutOfBounds {
                offset: self.tell(),
                needed,
                len: self.len(),
            });
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.cursor.read_u8()?)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.ensure(1)?;
        Ok(self.cursor.read_i8()?)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.cursor.read_u16::<LittleEndian>()?)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.ensure(2)?;
        Ok(self.cursor.read_i16::<LittleEndian>()?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.cursor.read_u32::<LittleEndian>()?)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(self.cursor.read_i32::<LittleEndian>()?)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.ensure(8)?;
        Ok(self.cursor.read_u64::<LittleEndian>()?)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.ensure(8)?;
        Ok(self.cursor.read_i64::<LittleEndian>()?)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.ensure(4)?;
        Ok(self.cursor.read_f32::<LittleEndian>()?)
    }

    /// Read three consecutive floats.
    pub fn read_vec3(&mut self) -> Result<[f32; 3]> {
        Ok([self.read_f32()?, self.read_f32()?, self.read_f32()?])
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let start = self.tell();
        let data = self.data();
        self.cursor.set_position((start + n) as u64);
        Ok(&data[start..start + n])
    }

    /// Read a compact index: a signed 1-5 byte variable-length integer.
    ///
    /// Byte 0 carries the sign (bit 7), a continuation flag (bit 6) and six
    /// value bits. Bytes 1-3 carry seven value bits each plus their own
    /// continuation flag. Byte 4 carries a full eight value bits.
    pub fn read_compact_index(&mut self) -> Result<i64> {
        let b0 = self.read_u8()?;
        let negative = b0 & 0x80 != 0;
        let mut value = i64::from(b0 & 0x3F);

        if b0 & 0x40 != 0 {
            let mut more = true;
            for shift in COMPACT_SHIFTS {
                let b = self.read_u8()?;
                value |= i64::from(b & 0x7F) << shift;
                more = b & 0x80 != 0;
                if !more {
                    break;
                }
            }
            if more {
                let b = self.read_u8()?;
                value |= i64::from(b) << COMPACT_LAST_SHIFT;
            }
        }

        Ok(if negative { -value } else { value })
    }

    /// Read an FString.
    ///
    /// A positive compact length is a count of Latin-1 bytes, a negative one
    /// a count of UTF-16LE code units. Trailing NULs are dropped.
    pub fn read_fstring(&mut self) -> Result<String> {
        let length = self.read_compact_index()?;
        if length == 0 {
            return Ok(String::new());
        }

        let text = if length < 0 {
            let units = length.unsigned_abs() as usize;
            let bytes = self.read_bytes(units.saturating_mul(2))?;
            let wide: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&wide)
        } else {
            let bytes = self.read_bytes(length as usize)?;
            bytes.iter().map(|&b| char::from(b)).collect()
        };

        Ok(text.trim_end_matches('\0').to_string())
    }
}
