//! Binary wire format used to replicate values to remote observers.
//!
//! The wire is an ordered byte stream with no field names: every codec reads
//! exactly the bytes it wrote, in the same order. Layout of the primitives:
//!
//! ```text
//! var_u64 / var_i64   bincode varint (zigzag for signed)
//! u32 / u64 fixed     little-endian, full width
//! f32 / f64           little-endian IEEE 754
//! bool                one byte (0 or 1)
//! str                 [varint length][UTF-8 bytes]
//! bytes               [varint length][raw bytes]
//! key                 str form of `namespace:path`
//! ```

use bincode::Options;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, WireError};
use crate::key::Key;

fn varint() -> impl Options {
    bincode::DefaultOptions::new()
        .with_varint_encoding()
        .with_little_endian()
        .allow_trailing_bytes()
}

fn fixint() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .allow_trailing_bytes()
}

/// Append-only writer for the binary wire format.
#[derive(Clone, Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn write_var_u64(&mut self, value: u64) -> Result<()> {
        self.write_with(varint(), &value)
    }

    pub fn write_var_i64(&mut self, value: i64) -> Result<()> {
        self.write_with(varint(), &value)
    }

    pub fn write_u32_fixed(&mut self, value: u32) -> Result<()> {
        self.write_with(fixint(), &value)
    }

    pub fn write_u64_fixed(&mut self, value: u64) -> Result<()> {
        self.write_with(fixint(), &value)
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.write_with(varint(), &value)
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_with(varint(), &value)
    }

    /// Writes a varint length-prefixed UTF-8 string.
    pub fn write_str(&mut self, value: &str) -> Result<()> {
        self.write_with(varint(), value)
    }

    /// Writes a varint length-prefixed run of raw bytes.
    pub fn write_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.write_var_u64(value.len() as u64)?;
        self.buf.extend_from_slice(value);
        Ok(())
    }

    /// Writes a key in its string form.
    pub fn write_key(&mut self, key: &Key) -> Result<()> {
        self.write_str(&key.to_string())
    }

    /// Writes any serde value with the varint layout.
    pub fn write_serde<V: Serialize + ?Sized>(&mut self, value: &V) -> Result<()> {
        self.write_with(varint(), value)
    }

    /// Writes a fixed-width `u32` length prefix followed by `payload`.
    pub fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        let len = u32::try_from(payload.len()).map_err(|_| WireError::LengthOverflow {
            len: payload.len(),
            max: u64::from(u32::MAX),
        })?;
        self.write_u32_fixed(len)?;
        self.buf.extend_from_slice(payload);
        Ok(())
    }

    fn write_with<V: Serialize + ?Sized>(&mut self, options: impl Options, value: &V) -> Result<()> {
        options
            .serialize_into(&mut self.buf, value)
            .map_err(WireError::Encoding)?;
        Ok(())
    }
}

/// Cursor over a borrowed wire buffer.
///
/// Each read consumes exactly the bytes of one value, so values written
/// back-to-back by [`WireWriter`] are read back-to-back here.
#[derive(Clone, Debug)]
pub struct WireReader<'a> {
    buf: &'a [u8],
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_with(varint())
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        self.read_with(varint())
    }

    pub fn read_var_u64(&mut self) -> Result<u64> {
        self.read_with(varint())
    }

    pub fn read_var_i64(&mut self) -> Result<i64> {
        self.read_with(varint())
    }

    pub fn read_u32_fixed(&mut self) -> Result<u32> {
        self.read_with(fixint())
    }

    pub fn read_u64_fixed(&mut self) -> Result<u64> {
        self.read_with(fixint())
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_with(varint())
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_with(varint())
    }

    pub fn read_str(&mut self) -> Result<String> {
        self.read_with(varint())
    }

    /// Reads a varint length-prefixed run of raw bytes without copying.
    pub fn read_bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.read_var_u64()?;
        self.take(len)
    }

    pub fn read_key(&mut self) -> Result<Key> {
        Key::parse(&self.read_str()?)
    }

    /// Reads any serde value written with [`WireWriter::write_serde`].
    pub fn read_serde<V: DeserializeOwned>(&mut self) -> Result<V> {
        self.read_with(varint())
    }

    /// Reads a frame written by [`WireWriter::write_frame`] as a sub-reader.
    pub fn read_frame(&mut self) -> Result<WireReader<'a>> {
        let len = self.read_u32_fixed()?;
        Ok(WireReader::new(self.take(u64::from(len))?))
    }

    /// Fails if any bytes are left unread.
    pub fn finish(self) -> Result<()> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(WireError::TrailingBytes {
                remaining: self.buf.len(),
            }
            .into())
        }
    }

    fn take(&mut self, len: u64) -> Result<&'a [u8]> {
        let len = usize::try_from(len)
            .ok()
            .filter(|len| *len <= self.buf.len())
            .ok_or_else(|| {
                WireError::Encoding(Box::new(bincode::ErrorKind::Io(std::io::Error::from(
                    std::io::ErrorKind::UnexpectedEof,
                ))))
            })?;
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }

    // Length prefixes may not claim more than what is left in the buffer.
    fn read_with<V: DeserializeOwned>(&mut self, options: impl Options) -> Result<V> {
        let value = options
            .with_limit(self.buf.len() as u64)
            .deserialize_from(&mut self.buf)
            .map_err(WireError::Encoding)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodecError;

    #[test]
    fn primitives_read_back_in_order() {
        let mut writer = WireWriter::new();
        writer.write_u8(7);
        writer.write_bool(true);
        writer.write_var_u64(300).unwrap();
        writer.write_var_i64(-2).unwrap();
        writer.write_u32_fixed(0xdead_beef).unwrap();
        writer.write_f64(1.5).unwrap();
        writer.write_str("hello").unwrap();
        writer.write_bytes(&[1, 2, 3]).unwrap();
        writer
            .write_key(&Key::parse("effect:fixed").unwrap())
            .unwrap();

        let bytes = writer.into_bytes();
        let mut reader = WireReader::new(&bytes);
        assert_eq!(reader.read_u8().unwrap(), 7);
        assert!(reader.read_bool().unwrap());
        assert_eq!(reader.read_var_u64().unwrap(), 300);
        assert_eq!(reader.read_var_i64().unwrap(), -2);
        assert_eq!(reader.read_u32_fixed().unwrap(), 0xdead_beef);
        assert_eq!(reader.read_f64().unwrap(), 1.5);
        assert_eq!(reader.read_str().unwrap(), "hello");
        assert_eq!(reader.read_bytes().unwrap(), &[1, 2, 3]);
        assert_eq!(reader.read_key().unwrap().to_string(), "effect:fixed");
        reader.finish().unwrap();
    }

    #[test]
    fn small_varints_take_one_byte() {
        let mut writer = WireWriter::new();
        writer.write_var_u64(5).unwrap();
        assert_eq!(writer.len(), 1);
        writer.write_u32_fixed(5).unwrap();
        assert_eq!(writer.len(), 5);
    }

    #[test]
    fn string_is_length_prefixed() {
        let mut writer = WireWriter::new();
        writer.write_str("abc").unwrap();
        assert_eq!(writer.as_bytes(), &[3, b'a', b'b', b'c']);
    }

    #[test]
    fn truncated_input_is_an_error() {
        let mut writer = WireWriter::new();
        writer.write_str("truncated").unwrap();
        let bytes = writer.into_bytes();
        let mut reader = WireReader::new(&bytes[..4]);
        assert!(reader.read_str().is_err());

        let mut reader = WireReader::new(&[5, 1]);
        assert!(reader.read_bytes().is_err());
    }

    #[test]
    fn oversized_length_prefix_is_an_error() {
        let mut huge = vec![253];
        huge.extend_from_slice(&(1u64 << 40).to_le_bytes());
        let err = WireReader::new(&huge).read_str().unwrap_err();
        assert!(matches!(err, CodecError::Wire(WireError::Encoding(_))));

        let mut max = vec![253];
        max.extend_from_slice(&u64::MAX.to_le_bytes());
        max.extend_from_slice(b"abc");
        let err = WireReader::new(&max).read_str().unwrap_err();
        assert_eq!(err.error_code(), "wire");
    }

    #[test]
    fn finish_reports_trailing_bytes() {
        let reader = WireReader::new(&[1, 2]);
        let err = reader.finish().unwrap_err();
        assert!(err.to_string().contains("2 unread bytes"));
    }

    #[test]
    fn frames_bound_their_payload() {
        let mut writer = WireWriter::new();
        writer.write_frame(&[9, 9, 9]).unwrap();
        writer.write_u8(1);
        let bytes = writer.into_bytes();

        let mut reader = WireReader::new(&bytes);
        let mut frame = reader.read_frame().unwrap();
        assert_eq!(frame.remaining(), 3);
        assert_eq!(frame.read_u8().unwrap(), 9);
        assert_eq!(reader.read_u8().unwrap(), 1);
        reader.finish().unwrap();
    }
}
