//! Binary encoding traits and the built-in scalar codecs.
//!
//! All multi-byte values are little-endian. Strings, byte strings and
//! arrays carry an `i32` length prefix where `-1` denotes null.

use crate::error::{DecodeError, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use chrono::{TimeZone, Utc};
use uuid::Uuid;

/// A value that can be written in the binary wire format.
pub trait BinaryEncodable {
    /// Exact number of bytes [`encode`](Self::encode) writes.
    fn byte_len(&self) -> usize;

    /// Write the value into `buf`.
    fn encode<B: BufMut>(&self, buf: &mut B);

    /// Encode into a freshly allocated buffer.
    fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.byte_len());
        self.encode(&mut buf);
        buf.freeze()
    }
}

/// A value that can be read from the binary wire format.
pub trait BinaryDecodable: Sized {
    /// Read a value from the front of `buf`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is truncated or malformed.
    fn decode<B: Buf>(buf: &mut B) -> Result<Self>;
}

pub(crate) fn ensure_remaining<B: Buf>(buf: &B, needed: usize) -> Result<()> {
    if buf.remaining() < needed {
        return Err(DecodeError::UnexpectedEof {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

/// Reads an `i32` length prefix. Returns `None` for null.
pub(crate) fn decode_length<B: Buf>(buf: &mut B, what: &'static str) -> Result<Option<usize>> {
    let length = i32::decode(buf)?;
    if length < 0 {
        return Ok(None);
    }
    #[allow(clippy::cast_sign_loss)]
    let length = length as usize;
    if length > buf.remaining() {
        return Err(DecodeError::InvalidLength {
            what,
            length: length as i64,
        });
    }
    Ok(Some(length))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub(crate) fn encode_length<B: BufMut>(buf: &mut B, length: usize) {
    buf.put_i32_le(length as i32);
}

macro_rules! impl_scalar {
    ($ty:ty, $size:expr, $put:ident, $get:ident) => {
        impl BinaryEncodable for $ty {
            fn byte_len(&self) -> usize {
                $size
            }

            fn encode<B: BufMut>(&self, buf: &mut B) {
                buf.$put(*self);
            }
        }

        impl BinaryDecodable for $ty {
            fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
                ensure_remaining(buf, $size)?;
                Ok(buf.$get())
            }
        }
    };
}

impl_scalar!(u8, 1, put_u8, get_u8);
impl_scalar!(i8, 1, put_i8, get_i8);
impl_scalar!(u16, 2, put_u16_le, get_u16_le);
impl_scalar!(i16, 2, put_i16_le, get_i16_le);
impl_scalar!(u32, 4, put_u32_le, get_u32_le);
impl_scalar!(i32, 4, put_i32_le, get_i32_le);
impl_scalar!(u64, 8, put_u64_le, get_u64_le);
impl_scalar!(i64, 8, put_i64_le, get_i64_le);
impl_scalar!(f32, 4, put_f32_le, get_f32_le);
impl_scalar!(f64, 8, put_f64_le, get_f64_le);

impl BinaryEncodable for bool {
    fn byte_len(&self) -> usize {
        1
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(u8::from(*self));
    }
}

impl BinaryDecodable for bool {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        Ok(u8::decode(buf)? != 0)
    }
}

// Empty strings go out as null.
impl BinaryEncodable for String {
    fn byte_len(&self) -> usize {
        4 + self.len()
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        if self.is_empty() {
            buf.put_i32_le(-1);
        } else {
            encode_length(buf, self.len());
            buf.put_slice(self.as_bytes());
        }
    }
}

impl BinaryDecodable for String {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        match decode_length(buf, "string")? {
            None => Ok(Self::new()),
            Some(length) => {
                let raw = buf.copy_to_bytes(length);
                Self::from_utf8(raw.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
            }
        }
    }
}

impl<T: BinaryEncodable> BinaryEncodable for Vec<T> {
    fn byte_len(&self) -> usize {
        4 + self.iter().map(BinaryEncodable::byte_len).sum::<usize>()
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        encode_length(buf, self.len());
        for item in self {
            item.encode(buf);
        }
    }
}

impl<T: BinaryDecodable> BinaryDecodable for Vec<T> {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        // Every element occupies at least one byte, so the length check in
        // decode_length bounds the allocation.
        let Some(length) = decode_length(buf, "array")? else {
            return Ok(Self::new());
        };
        let mut items = Self::with_capacity(length);
        for _ in 0..length {
            items.push(T::decode(buf)?);
        }
        Ok(items)
    }
}

/// Opaque sequence of bytes (certificates, nonces, continuation points).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteString(pub Vec<u8>);

impl ByteString {
    /// Null byte string.
    #[must_use]
    pub const fn null() -> Self {
        Self(Vec::new())
    }

    /// Returns `true` when the byte string is null or empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<&[u8]> for ByteString {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl BinaryEncodable for ByteString {
    fn byte_len(&self) -> usize {
        4 + self.0.len()
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        if self.0.is_empty() {
            buf.put_i32_le(-1);
        } else {
            encode_length(buf, self.0.len());
            buf.put_slice(&self.0);
        }
    }
}

impl BinaryDecodable for ByteString {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        match decode_length(buf, "byte string")? {
            None => Ok(Self::null()),
            Some(length) => Ok(Self(buf.copy_to_bytes(length).to_vec())),
        }
    }
}

/// Ticks between 1601-01-01 and the Unix epoch.
const EPOCH_OFFSET_TICKS: i64 = 116_444_736_000_000_000;

/// Timestamp in 100 nanosecond ticks since 1601-01-01 UTC. Zero is null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime(pub i64);

impl DateTime {
    /// Current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self::from(Utc::now())
    }

    /// The null timestamp.
    #[must_use]
    pub const fn null() -> Self {
        Self(0)
    }

    /// Returns `true` for the null timestamp.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Convert to a `chrono` timestamp, `None` when null or out of range.
    #[must_use]
    pub fn to_chrono(&self) -> Option<chrono::DateTime<Utc>> {
        if self.is_null() {
            return None;
        }
        let unix_ticks = self.0 - EPOCH_OFFSET_TICKS;
        let seconds = unix_ticks.div_euclid(10_000_000);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let nanos = (unix_ticks.rem_euclid(10_000_000) * 100) as u32;
        Utc.timestamp_opt(seconds, nanos).single()
    }
}

impl From<chrono::DateTime<Utc>> for DateTime {
    fn from(value: chrono::DateTime<Utc>) -> Self {
        let ticks = value.timestamp() * 10_000_000 + i64::from(value.timestamp_subsec_nanos() / 100);
        Self(ticks + EPOCH_OFFSET_TICKS)
    }
}

impl std::fmt::Display for DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_chrono() {
            Some(value) => write!(f, "{}", value.to_rfc3339()),
            None => write!(f, "null"),
        }
    }
}

impl BinaryEncodable for DateTime {
    fn byte_len(&self) -> usize {
        8
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_i64_le(self.0);
    }
}

impl BinaryDecodable for DateTime {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        Ok(Self(i64::decode(buf)?))
    }
}

impl BinaryEncodable for Uuid {
    fn byte_len(&self) -> usize {
        16
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        let (data1, data2, data3, data4) = self.as_fields();
        buf.put_u32_le(data1);
        buf.put_u16_le(data2);
        buf.put_u16_le(data3);
        buf.put_slice(data4);
    }
}

impl BinaryDecodable for Uuid {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        ensure_remaining(buf, 16)?;
        let data1 = buf.get_u32_le();
        let data2 = buf.get_u16_le();
        let data3 = buf.get_u16_le();
        let mut data4 = [0u8; 8];
        buf.copy_to_slice(&mut data4);
        Ok(Self::from_fields(data1, data2, data3, &data4))
    }
}
