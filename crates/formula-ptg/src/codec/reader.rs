use crate::error::DecodeError;

/// Little-endian cursor over an `rgce` buffer.
///
/// Offsets reported in errors are relative to the start of the buffer handed to [`PtgReader::new`].
#[derive(Debug, Clone)]
pub struct PtgReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PtgReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Unread tail of the buffer.
    pub fn rest(&self) -> &'a [u8] {
        self.data.get(self.pos..).unwrap_or_default()
    }

    pub(crate) fn peek_u8(&self) -> Result<u8, DecodeError> {
        self.data.get(self.pos).copied().ok_or(self.truncated(1))
    }

    pub(crate) fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(self.truncated(len))?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let [b] = self.read_array::<1>()?;
        Ok(b)
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub(crate) fn read_f64(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    /// Read `cch` characters stored either compressed (one byte each, Latin-1) or as UTF-16LE.
    pub(crate) fn read_chars(&mut self, cch: usize, utf16: bool) -> Result<String, DecodeError> {
        if utf16 {
            let needed = cch.checked_mul(2).ok_or(self.truncated(usize::MAX))?;
            let raw = self.read_bytes(needed)?;
            let units: Vec<u16> = raw
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            Ok(String::from_utf16_lossy(&units))
        } else {
            let raw = self.read_bytes(cch)?;
            Ok(raw.iter().map(|&b| char::from(b)).collect())
        }
    }

    fn truncated(&self, needed: usize) -> DecodeError {
        DecodeError::TruncatedStream {
            offset: self.pos,
            needed,
            remaining: self.remaining(),
        }
    }
}
