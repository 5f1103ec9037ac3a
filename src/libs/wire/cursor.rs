use super::error::{WireError, WireResult};

/// Cursor over a byte slice; every read names the field it is decoding.
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    pub fn position(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    /// Reads exactly `len` bytes.
    pub fn read_exact(&mut self, len: usize, field: &'static str) -> WireResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(WireError::unexpected_end(field));
        }
        let start = self.offset;
        self.offset += len;
        Ok(&self.bytes[start..start + len])
    }

    pub fn read_array<const N: usize>(&mut self, field: &'static str) -> WireResult<[u8; N]> {
        let bytes = self.read_exact(N, field)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Reads up to and including the next NUL; returns the bytes before it.
    pub fn read_until_nul(&mut self, field: &'static str) -> WireResult<&'a [u8]> {
        let rest = &self.bytes[self.offset.min(self.bytes.len())..];
        let end = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| WireError::unexpected_end(field))?;
        self.offset += end + 1;
        Ok(&rest[..end])
    }

    /// Errors unless every byte was consumed.
    pub fn finish(&self) -> WireResult<()> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(WireError::TrailingBytes {
                consumed: self.offset,
                remaining,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads() {
        let data = b"ab\0cd";
        let mut reader = ByteReader::new(data);
        assert_eq!(reader.read_until_nul("s").unwrap(), b"ab");
        assert_eq!(reader.position(), 3);
        assert_eq!(reader.read_array::<2>("t").unwrap(), *b"cd");
        assert!(reader.finish().is_ok());
        assert_eq!(
            reader.read_exact(1, "u"),
            Err(WireError::UnexpectedEnd { field: "u" })
        );
    }

    #[test]
    fn test_missing_nul() {
        let mut reader = ByteReader::new(b"abc");
        assert!(reader.read_until_nul("s").is_err());
        // A failed read does not move the cursor
        assert_eq!(reader.position(), 0);
        assert_eq!(
            reader.finish(),
            Err(WireError::TrailingBytes {
                consumed: 0,
                remaining: 3
            })
        );
    }
}
