//! Built-in structured types: names, texts, extension objects, variants
//! and data values.

use crate::encoding::{BinaryDecodable, BinaryEncodable, ByteString, DateTime};
use crate::error::{DecodeError, Result};
use crate::node_id::{ExpandedNodeId, NodeId};
use crate::status_code::StatusCode;
use bytes::{Buf, BufMut};
use uuid::Uuid;

binary_struct! {
    /// Name qualified by a namespace index.
    pub struct QualifiedName {
        /// Namespace index.
        pub namespace_index: u16,
        /// Name text.
        pub name: String,
    }
}

impl QualifiedName {
    /// Build a qualified name.
    #[must_use]
    pub fn new(namespace_index: u16, name: impl Into<String>) -> Self {
        Self {
            namespace_index,
            name: name.into(),
        }
    }
}

/// Human readable text with an optional locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedText {
    /// Locale, empty when absent.
    pub locale: String,
    /// Text, empty when absent.
    pub text: String,
}

impl LocalizedText {
    /// Text without a locale.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            locale: String::new(),
            text: text.into(),
        }
    }
}

impl std::fmt::Display for LocalizedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl BinaryEncodable for LocalizedText {
    fn byte_len(&self) -> usize {
        let mut len = 1;
        if !self.locale.is_empty() {
            len += self.locale.byte_len();
        }
        if !self.text.is_empty() {
            len += self.text.byte_len();
        }
        len
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        let mut mask = 0u8;
        if !self.locale.is_empty() {
            mask |= 0x01;
        }
        if !self.text.is_empty() {
            mask |= 0x02;
        }
        buf.put_u8(mask);
        if !self.locale.is_empty() {
            self.locale.encode(buf);
        }
        if !self.text.is_empty() {
            self.text.encode(buf);
        }
    }
}

impl BinaryDecodable for LocalizedText {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        let mask = u8::decode(buf)?;
        let locale = if mask & 0x01 != 0 {
            String::decode(buf)?
        } else {
            String::new()
        };
        let text = if mask & 0x02 != 0 {
            String::decode(buf)?
        } else {
            String::new()
        };
        Ok(Self { locale, text })
    }
}

/// Body of an [`ExtensionObject`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExtensionBody {
    /// No body.
    #[default]
    None,
    /// Binary encoded body.
    Binary(ByteString),
    /// XML encoded body.
    Xml(String),
}

/// A structure wrapped with the id of its encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionObject {
    /// Encoding id of the body.
    pub type_id: NodeId,
    /// The body.
    pub body: ExtensionBody,
}

impl ExtensionObject {
    /// The null extension object.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            type_id: NodeId::NULL,
            body: ExtensionBody::None,
        }
    }

    /// Wrap `value` using its binary encoding id.
    #[must_use]
    pub fn from_message<T: BinaryEncodable>(type_id: u32, value: &T) -> Self {
        Self {
            type_id: NodeId::numeric(0, type_id),
            body: ExtensionBody::Binary(ByteString(value.to_bytes().to_vec())),
        }
    }

    /// Returns `true` when the object has no body.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self.body, ExtensionBody::None)
    }

    /// Decode the binary body as `T`. `None` when the body is not binary.
    ///
    /// # Errors
    ///
    /// Returns an error if the body does not decode as `T`.
    pub fn decode_inner<T: BinaryDecodable>(&self) -> Result<Option<T>> {
        match &self.body {
            ExtensionBody::Binary(bytes) => {
                let mut raw = bytes.as_bytes();
                T::decode(&mut raw).map(Some)
            }
            _ => Ok(None),
        }
    }
}

impl BinaryEncodable for ExtensionObject {
    fn byte_len(&self) -> usize {
        self.type_id.byte_len()
            + 1
            + match &self.body {
                ExtensionBody::None => 0,
                ExtensionBody::Binary(bytes) => bytes.byte_len(),
                ExtensionBody::Xml(text) => text.byte_len(),
            }
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        self.type_id.encode(buf);
        match &self.body {
            ExtensionBody::None => buf.put_u8(0x00),
            ExtensionBody::Binary(bytes) => {
                buf.put_u8(0x01);
                bytes.encode(buf);
            }
            ExtensionBody::Xml(text) => {
                buf.put_u8(0x02);
                text.encode(buf);
            }
        }
    }
}

impl BinaryDecodable for ExtensionObject {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        let type_id = NodeId::decode(buf)?;
        let body = match u8::decode(buf)? {
            0x00 => ExtensionBody::None,
            0x01 => ExtensionBody::Binary(ByteString::decode(buf)?),
            0x02 => ExtensionBody::Xml(String::decode(buf)?),
            other => {
                return Err(DecodeError::InvalidEnumValue {
                    type_name: "ExtensionObjectEncoding",
                    value: i32::from(other),
                });
            }
        };
        Ok(Self { type_id, body })
    }
}

/// Deepest chain of inner diagnostics accepted when decoding.
pub const MAX_DIAGNOSTIC_DEPTH: usize = 100;

/// Vendor specific diagnostics attached to a result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticInfo {
    /// Index into the string table.
    pub symbolic_id: Option<i32>,
    /// Index into the string table.
    pub namespace_uri: Option<i32>,
    /// Index into the string table.
    pub locale: Option<i32>,
    /// Index into the string table.
    pub localized_text: Option<i32>,
    /// Free-form detail.
    pub additional_info: Option<String>,
    /// Status of an underlying operation.
    pub inner_status_code: Option<StatusCode>,
    /// Diagnostics of an underlying operation.
    pub inner_diagnostic_info: Option<Box<DiagnosticInfo>>,
}

impl DiagnosticInfo {
    fn mask(&self) -> u8 {
        let mut mask = 0;
        if self.symbolic_id.is_some() {
            mask |= 0x01;
        }
        if self.namespace_uri.is_some() {
            mask |= 0x02;
        }
        if self.localized_text.is_some() {
            mask |= 0x04;
        }
        if self.locale.is_some() {
            mask |= 0x08;
        }
        if self.additional_info.is_some() {
            mask |= 0x10;
        }
        if self.inner_status_code.is_some() {
            mask |= 0x20;
        }
        if self.inner_diagnostic_info.is_some() {
            mask |= 0x40;
        }
        mask
    }
}

impl BinaryEncodable for DiagnosticInfo {
    fn byte_len(&self) -> usize {
        1 + [
            self.symbolic_id,
            self.namespace_uri,
            self.locale,
            self.localized_text,
        ]
        .iter()
        .flatten()
        .count()
            * 4
            + self.additional_info.as_ref().map_or(0, BinaryEncodable::byte_len)
            + self.inner_status_code.map_or(0, |_| 4)
            + self
                .inner_diagnostic_info
                .as_ref()
                .map_or(0, |inner| inner.byte_len())
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.mask());
        if let Some(value) = self.symbolic_id {
            buf.put_i32_le(value);
        }
        if let Some(value) = self.namespace_uri {
            buf.put_i32_le(value);
        }
        if let Some(value) = self.locale {
            buf.put_i32_le(value);
        }
        if let Some(value) = self.localized_text {
            buf.put_i32_le(value);
        }
        if let Some(value) = &self.additional_info {
            value.encode(buf);
        }
        if let Some(value) = self.inner_status_code {
            value.encode(buf);
        }
        if let Some(value) = &self.inner_diagnostic_info {
            value.encode(buf);
        }
    }
}

impl BinaryDecodable for DiagnosticInfo {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        Self::decode_at(buf, 1)
    }
}

impl DiagnosticInfo {
    fn decode_at<B: Buf>(buf: &mut B, depth: usize) -> Result<Self> {
        if depth > MAX_DIAGNOSTIC_DEPTH {
            return Err(DecodeError::NestingTooDeep {
                what: "diagnostic info",
                max: MAX_DIAGNOSTIC_DEPTH,
            });
        }

        let mask = u8::decode(buf)?;
        let mut info = Self::default();
        if mask & 0x01 != 0 {
            info.symbolic_id = Some(i32::decode(buf)?);
        }
        if mask & 0x02 != 0 {
            info.namespace_uri = Some(i32::decode(buf)?);
        }
        if mask & 0x08 != 0 {
            info.locale = Some(i32::decode(buf)?);
        }
        if mask & 0x04 != 0 {
            info.localized_text = Some(i32::decode(buf)?);
        }
        if mask & 0x10 != 0 {
            info.additional_info = Some(String::decode(buf)?);
        }
        if mask & 0x20 != 0 {
            info.inner_status_code = Some(StatusCode::decode(buf)?);
        }
        if mask & 0x40 != 0 {
            info.inner_diagnostic_info = Some(Box::new(Self::decode_at(buf, depth + 1)?));
        }
        Ok(info)
    }
}

/// A value of any built-in type.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Variant {
    /// No value.
    #[default]
    Empty,
    /// `Boolean`
    Boolean(bool),
    /// `SByte`
    SByte(i8),
    /// `Byte`
    Byte(u8),
    /// `Int16`
    Int16(i16),
    /// `UInt16`
    UInt16(u16),
    /// `Int32`
    Int32(i32),
    /// `UInt32`
    UInt32(u32),
    /// `Int64`
    Int64(i64),
    /// `UInt64`
    UInt64(u64),
    /// `Float`
    Float(f32),
    /// `Double`
    Double(f64),
    /// `String`
    String(String),
    /// `DateTime`
    DateTime(DateTime),
    /// `Guid`
    Guid(Uuid),
    /// `ByteString`
    ByteString(ByteString),
    /// `NodeId`
    NodeId(Box<NodeId>),
    /// `ExpandedNodeId`
    ExpandedNodeId(Box<ExpandedNodeId>),
    /// `StatusCode`
    StatusCode(StatusCode),
    /// `QualifiedName`
    QualifiedName(Box<QualifiedName>),
    /// `LocalizedText`
    LocalizedText(Box<LocalizedText>),
    /// `ExtensionObject`
    ExtensionObject(Box<ExtensionObject>),
    /// One-dimensional array of a single element type.
    Array {
        /// Built-in type id of every element.
        element_type: u8,
        /// The elements.
        values: Vec<Variant>,
    },
}

const ARRAY_FLAG: u8 = 0x80;
const DIMENSIONS_FLAG: u8 = 0x40;

impl Variant {
    /// Built-in type id, zero for [`Variant::Empty`].
    #[must_use]
    pub const fn type_id(&self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Boolean(_) => 1,
            Self::SByte(_) => 2,
            Self::Byte(_) => 3,
            Self::Int16(_) => 4,
            Self::UInt16(_) => 5,
            Self::Int32(_) => 6,
            Self::UInt32(_) => 7,
            Self::Int64(_) => 8,
            Self::UInt64(_) => 9,
            Self::Float(_) => 10,
            Self::Double(_) => 11,
            Self::String(_) => 12,
            Self::DateTime(_) => 13,
            Self::Guid(_) => 14,
            Self::ByteString(_) => 15,
            Self::NodeId(_) => 17,
            Self::ExpandedNodeId(_) => 18,
            Self::StatusCode(_) => 19,
            Self::QualifiedName(_) => 20,
            Self::LocalizedText(_) => 21,
            Self::ExtensionObject(_) => 22,
            Self::Array { element_type, .. } => *element_type,
        }
    }

    /// Returns `true` for [`Variant::Empty`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    fn scalar_len(&self) -> usize {
        match self {
            Self::Empty | Self::Array { .. } => 0,
            Self::Boolean(_) | Self::SByte(_) | Self::Byte(_) => 1,
            Self::Int16(_) | Self::UInt16(_) => 2,
            Self::Int32(_) | Self::UInt32(_) | Self::Float(_) | Self::StatusCode(_) => 4,
            Self::Int64(_) | Self::UInt64(_) | Self::Double(_) | Self::DateTime(_) => 8,
            Self::String(value) => value.byte_len(),
            Self::Guid(_) => 16,
            Self::ByteString(value) => value.byte_len(),
            Self::NodeId(value) => value.byte_len(),
            Self::ExpandedNodeId(value) => value.byte_len(),
            Self::QualifiedName(value) => value.byte_len(),
            Self::LocalizedText(value) => value.byte_len(),
            Self::ExtensionObject(value) => value.byte_len(),
        }
    }

    fn encode_scalar<B: BufMut>(&self, buf: &mut B) {
        match self {
            Self::Empty | Self::Array { .. } => {}
            Self::Boolean(value) => value.encode(buf),
            Self::SByte(value) => value.encode(buf),
            Self::Byte(value) => value.encode(buf),
            Self::Int16(value) => value.encode(buf),
            Self::UInt16(value) => value.encode(buf),
            Self::Int32(value) => value.encode(buf),
            Self::UInt32(value) => value.encode(buf),
            Self::Int64(value) => value.encode(buf),
            Self::UInt64(value) => value.encode(buf),
            Self::Float(value) => value.encode(buf),
            Self::Double(value) => value.encode(buf),
            Self::String(value) => value.encode(buf),
            Self::DateTime(value) => value.encode(buf),
            Self::Guid(value) => value.encode(buf),
            Self::ByteString(value) => value.encode(buf),
            Self::NodeId(value) => value.encode(buf),
            Self::ExpandedNodeId(value) => value.encode(buf),
            Self::StatusCode(value) => value.encode(buf),
            Self::QualifiedName(value) => value.encode(buf),
            Self::LocalizedText(value) => value.encode(buf),
            Self::ExtensionObject(value) => value.encode(buf),
        }
    }

    fn decode_scalar<B: Buf>(buf: &mut B, type_id: u8) -> Result<Self> {
        Ok(match type_id {
            0 => Self::Empty,
            1 => Self::Boolean(bool::decode(buf)?),
            2 => Self::SByte(i8::decode(buf)?),
            3 => Self::Byte(u8::decode(buf)?),
            4 => Self::Int16(i16::decode(buf)?),
            5 => Self::UInt16(u16::decode(buf)?),
            6 => Self::Int32(i32::decode(buf)?),
            7 => Self::UInt32(u32::decode(buf)?),
            8 => Self::Int64(i64::decode(buf)?),
            9 => Self::UInt64(u64::decode(buf)?),
            10 => Self::Float(f32::decode(buf)?),
            11 => Self::Double(f64::decode(buf)?),
            12 => Self::String(String::decode(buf)?),
            13 => Self::DateTime(DateTime::decode(buf)?),
            14 => Self::Guid(Uuid::decode(buf)?),
            15 => Self::ByteString(ByteString::decode(buf)?),
            17 => Self::NodeId(Box::new(NodeId::decode(buf)?)),
            18 => Self::ExpandedNodeId(Box::new(ExpandedNodeId::decode(buf)?)),
            19 => Self::StatusCode(StatusCode::decode(buf)?),
            20 => Self::QualifiedName(Box::new(QualifiedName::decode(buf)?)),
            21 => Self::LocalizedText(Box::new(LocalizedText::decode(buf)?)),
            22 => Self::ExtensionObject(Box::new(ExtensionObject::decode(buf)?)),
            other => return Err(DecodeError::InvalidVariantType(other)),
        })
    }
}

macro_rules! variant_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Variant {
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }
        )*
    };
}

variant_from! {
    bool => Boolean,
    i8 => SByte,
    u8 => Byte,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f32 => Float,
    f64 => Double,
    String => String,
    DateTime => DateTime,
    Uuid => Guid,
    ByteString => ByteString,
    NodeId => NodeId,
    StatusCode => StatusCode,
    QualifiedName => QualifiedName,
    LocalizedText => LocalizedText,
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("<empty>"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::SByte(value) => write!(f, "{value}"),
            Self::Byte(value) => write!(f, "{value}"),
            Self::Int16(value) => write!(f, "{value}"),
            Self::UInt16(value) => write!(f, "{value}"),
            Self::Int32(value) => write!(f, "{value}"),
            Self::UInt32(value) => write!(f, "{value}"),
            Self::Int64(value) => write!(f, "{value}"),
            Self::UInt64(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Double(value) => write!(f, "{value}"),
            Self::String(value) => write!(f, "{value:?}"),
            Self::DateTime(value) => write!(f, "{value}"),
            Self::Guid(value) => write!(f, "{value}"),
            Self::ByteString(value) => write!(f, "<{} bytes>", value.0.len()),
            Self::NodeId(value) => write!(f, "{value}"),
            Self::ExpandedNodeId(value) => write!(f, "{}", value.node_id),
            Self::StatusCode(value) => write!(f, "{value}"),
            Self::QualifiedName(value) => write!(f, "{}:{}", value.namespace_index, value.name),
            Self::LocalizedText(value) => write!(f, "{value}"),
            Self::ExtensionObject(value) => write!(f, "<extension {}>", value.type_id),
            Self::Array { values, .. } => {
                f.write_str("[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl BinaryEncodable for Variant {
    fn byte_len(&self) -> usize {
        match self {
            Self::Array { values, .. } => {
                1 + 4 + values.iter().map(Self::scalar_len).sum::<usize>()
            }
            scalar => 1 + scalar.scalar_len(),
        }
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        match self {
            Self::Array {
                element_type,
                values,
            } => {
                buf.put_u8(element_type | ARRAY_FLAG);
                crate::encoding::encode_length(buf, values.len());
                for value in values {
                    value.encode_scalar(buf);
                }
            }
            scalar => {
                buf.put_u8(scalar.type_id());
                scalar.encode_scalar(buf);
            }
        }
    }
}

impl BinaryDecodable for Variant {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        let mask = u8::decode(buf)?;
        let type_id = mask & 0x3F;
        if mask & ARRAY_FLAG == 0 {
            return Self::decode_scalar(buf, type_id);
        }

        let values = match crate::encoding::decode_length(buf, "variant array")? {
            None => Vec::new(),
            Some(length) => {
                let mut values = Vec::with_capacity(length);
                for _ in 0..length {
                    values.push(Self::decode_scalar(buf, type_id)?);
                }
                values
            }
        };
        if mask & DIMENSIONS_FLAG != 0 {
            // Flattened; dimensions are not kept.
            let _dimensions = Vec::<i32>::decode(buf)?;
        }
        Ok(Self::Array {
            element_type: type_id,
            values,
        })
    }
}

/// A value with its status and timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataValue {
    /// The value.
    pub value: Option<Variant>,
    /// Quality of the value.
    pub status: Option<StatusCode>,
    /// Time the source produced the value.
    pub source_timestamp: Option<DateTime>,
    /// Sub-tick precision of the source timestamp.
    pub source_picoseconds: Option<u16>,
    /// Time the server observed the value.
    pub server_timestamp: Option<DateTime>,
    /// Sub-tick precision of the server timestamp.
    pub server_picoseconds: Option<u16>,
}

impl DataValue {
    /// Data value carrying only `value`.
    #[must_use]
    pub fn new(value: impl Into<Variant>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Status of the value, Good when absent.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::GOOD)
    }

    fn mask(&self) -> u8 {
        let mut mask = 0;
        if self.value.is_some() {
            mask |= 0x01;
        }
        if self.status.is_some() {
            mask |= 0x02;
        }
        if self.source_timestamp.is_some() {
            mask |= 0x04;
        }
        if self.server_timestamp.is_some() {
            mask |= 0x08;
        }
        if self.source_picoseconds.is_some() {
            mask |= 0x10;
        }
        if self.server_picoseconds.is_some() {
            mask |= 0x20;
        }
        mask
    }
}

impl BinaryEncodable for DataValue {
    fn byte_len(&self) -> usize {
        1 + self.value.as_ref().map_or(0, BinaryEncodable::byte_len)
            + self.status.map_or(0, |_| 4)
            + self.source_timestamp.map_or(0, |_| 8)
            + self.source_picoseconds.map_or(0, |_| 2)
            + self.server_timestamp.map_or(0, |_| 8)
            + self.server_picoseconds.map_or(0, |_| 2)
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.mask());
        if let Some(value) = &self.value {
            value.encode(buf);
        }
        if let Some(value) = self.status {
            value.encode(buf);
        }
        if let Some(value) = self.source_timestamp {
            value.encode(buf);
        }
        if let Some(value) = self.source_picoseconds {
            value.encode(buf);
        }
        if let Some(value) = self.server_timestamp {
            value.encode(buf);
        }
        if let Some(value) = self.server_picoseconds {
            value.encode(buf);
        }
    }
}

impl BinaryDecodable for DataValue {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        let mask = u8::decode(buf)?;
        let mut value = Self::default();
        if mask & 0x01 != 0 {
            value.value = Some(Variant::decode(buf)?);
        }
        if mask & 0x02 != 0 {
            value.status = Some(StatusCode::decode(buf)?);
        }
        if mask & 0x04 != 0 {
            value.source_timestamp = Some(DateTime::decode(buf)?);
        }
        if mask & 0x10 != 0 {
            value.source_picoseconds = Some(u16::decode(buf)?);
        }
        if mask & 0x08 != 0 {
            value.server_timestamp = Some(DateTime::decode(buf)?);
        }
        if mask & 0x20 != 0 {
            value.server_picoseconds = Some(u16::decode(buf)?);
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localized_text_omits_absent_parts() {
        let text = LocalizedText::new("Pump");
        let bytes = text.to_bytes();
        assert_eq!(bytes[0], 0x02);
        assert_eq!(bytes.len(), text.byte_len());
        assert_eq!(LocalizedText::decode(&mut &bytes[..]).unwrap(), text);
    }

    #[test]
    fn scalar_variant_layout() {
        let bytes = Variant::from(42i32).to_bytes();
        assert_eq!(&bytes[..], &[6, 42, 0, 0, 0]);
    }

    #[test]
    fn array_variant_decodes_and_drops_dimensions() {
        let raw: &[u8] = &[
            0x80 | 0x40 | 7, // UInt32 array with dimensions
            2, 0, 0, 0, // length
            1, 0, 0, 0, 2, 0, 0, 0, // values
            1, 0, 0, 0, 2, 0, 0, 0, // dimensions [2]
        ];
        let decoded = Variant::decode(&mut &raw[..]).unwrap();
        assert_eq!(
            decoded,
            Variant::Array {
                element_type: 7,
                values: vec![Variant::UInt32(1), Variant::UInt32(2)],
            }
        );
    }

    #[test]
    fn unsupported_variant_type_is_rejected() {
        let raw: &[u8] = &[16, 0, 0, 0, 0];
        assert_eq!(
            Variant::decode(&mut &raw[..]),
            Err(DecodeError::InvalidVariantType(16))
        );
    }

    #[test]
    fn data_value_field_order_follows_mask() {
        let value = DataValue {
            value: Some(Variant::Double(1.5)),
            status: Some(StatusCode::GOOD),
            source_timestamp: Some(DateTime(10)),
            source_picoseconds: Some(3),
            server_timestamp: Some(DateTime(20)),
            server_picoseconds: None,
        };
        let bytes = value.to_bytes();
        assert_eq!(bytes[0], 0x1F);
        assert_eq!(bytes.len(), value.byte_len());
        assert_eq!(DataValue::decode(&mut &bytes[..]).unwrap(), value);
    }

    #[test]
    fn diagnostic_info_nests() {
        let info = DiagnosticInfo {
            additional_info: Some("detail".into()),
            inner_status_code: Some(StatusCode::BAD_TIMEOUT),
            inner_diagnostic_info: Some(Box::new(DiagnosticInfo {
                symbolic_id: Some(1),
                ..DiagnosticInfo::default()
            })),
            ..DiagnosticInfo::default()
        };
        let bytes = info.to_bytes();
        assert_eq!(bytes.len(), info.byte_len());
        assert_eq!(DiagnosticInfo::decode(&mut &bytes[..]).unwrap(), info);
    }

    fn nested_diagnostics(depth: usize) -> DiagnosticInfo {
        (1..depth).fold(DiagnosticInfo::default(), |inner, _| DiagnosticInfo {
            inner_diagnostic_info: Some(Box::new(inner)),
            ..DiagnosticInfo::default()
        })
    }

    #[test]
    fn diagnostic_info_depth_is_limited() {
        let deepest = nested_diagnostics(MAX_DIAGNOSTIC_DEPTH).to_bytes();
        assert!(DiagnosticInfo::decode(&mut &deepest[..]).is_ok());

        let too_deep = nested_diagnostics(MAX_DIAGNOSTIC_DEPTH + 1).to_bytes();
        assert_eq!(
            DiagnosticInfo::decode(&mut &too_deep[..]),
            Err(DecodeError::NestingTooDeep {
                what: "diagnostic info",
                max: MAX_DIAGNOSTIC_DEPTH,
            })
        );
    }

    #[test]
    fn long_diagnostic_chain_is_rejected() {
        // Every byte announces another inner diagnostic.
        let raw = vec![0x40u8; 60_000];
        assert!(matches!(
            DiagnosticInfo::decode(&mut &raw[..]),
            Err(DecodeError::NestingTooDeep { .. })
        ));
    }

    #[test]
    fn variants_do_not_nest() {
        // Variant, DataValue and DiagnosticInfo are not accepted inside a
        // variant, so a variant never decodes another variant.
        for type_id in [23u8, 24, 25] {
            let raw = [0x80 | type_id, 1, 0, 0, 0, type_id];
            assert_eq!(
                Variant::decode(&mut &raw[..]),
                Err(DecodeError::InvalidVariantType(type_id))
            );
        }
    }

    #[test]
    fn extension_object_wraps_message() {
        let name = QualifiedName::new(1, "Temp");
        let object = ExtensionObject::from_message(999, &name);
        let bytes = object.to_bytes();
        let decoded = ExtensionObject::decode(&mut &bytes[..]).unwrap();
        assert_eq!(decoded.decode_inner::<QualifiedName>().unwrap(), Some(name));
        assert_eq!(ExtensionObject::null().decode_inner::<QualifiedName>().unwrap(), None);
    }
}
