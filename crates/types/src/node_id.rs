//! Node identifiers and their compact binary forms.

use crate::encoding::{BinaryDecodable, BinaryEncodable, ByteString, ensure_remaining};
use crate::error::{DecodeError, ParseNodeIdError, Result};
use bytes::{Buf, BufMut};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const ENCODING_TWO_BYTE: u8 = 0x00;
const ENCODING_FOUR_BYTE: u8 = 0x01;
const ENCODING_NUMERIC: u8 = 0x02;
const ENCODING_STRING: u8 = 0x03;
const ENCODING_GUID: u8 = 0x04;
const ENCODING_BYTE_STRING: u8 = 0x05;

const FLAG_NAMESPACE_URI: u8 = 0x80;
const FLAG_SERVER_INDEX: u8 = 0x40;

/// The identifier part of a [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// Numeric identifier (`i=`).
    Numeric(u32),
    /// String identifier (`s=`).
    String(String),
    /// GUID identifier (`g=`).
    Guid(Uuid),
    /// Opaque identifier (`b=`, hex encoded in text form).
    Opaque(ByteString),
}

impl Default for Identifier {
    fn default() -> Self {
        Self::Numeric(0)
    }
}

/// Identifies a node in a server's address space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodeId {
    /// Namespace index.
    pub namespace: u16,
    /// Identifier within the namespace.
    pub identifier: Identifier,
}

impl NodeId {
    /// The null node id (`i=0`).
    pub const NULL: Self = Self::numeric(0, 0);
    /// `RootFolder`.
    pub const ROOT_FOLDER: Self = Self::numeric(0, 84);
    /// `ObjectsFolder`.
    pub const OBJECTS_FOLDER: Self = Self::numeric(0, 85);
    /// `TypesFolder`.
    pub const TYPES_FOLDER: Self = Self::numeric(0, 86);
    /// `ViewsFolder`.
    pub const VIEWS_FOLDER: Self = Self::numeric(0, 87);
    /// `Server` object.
    pub const SERVER: Self = Self::numeric(0, 2253);
    /// `HierarchicalReferences` reference type.
    pub const HIERARCHICAL_REFERENCES: Self = Self::numeric(0, 33);
    /// `Organizes` reference type.
    pub const ORGANIZES: Self = Self::numeric(0, 35);
    /// `HasComponent` reference type.
    pub const HAS_COMPONENT: Self = Self::numeric(0, 47);

    /// Numeric node id.
    #[must_use]
    pub const fn numeric(namespace: u16, value: u32) -> Self {
        Self {
            namespace,
            identifier: Identifier::Numeric(value),
        }
    }

    /// String node id.
    #[must_use]
    pub fn string(namespace: u16, value: impl Into<String>) -> Self {
        Self {
            namespace,
            identifier: Identifier::String(value.into()),
        }
    }

    /// GUID node id.
    #[must_use]
    pub const fn guid(namespace: u16, value: Uuid) -> Self {
        Self {
            namespace,
            identifier: Identifier::Guid(value),
        }
    }

    /// Opaque node id.
    #[must_use]
    pub fn opaque(namespace: u16, value: impl Into<Vec<u8>>) -> Self {
        Self {
            namespace,
            identifier: Identifier::Opaque(ByteString(value.into())),
        }
    }

    /// Returns `true` for `ns=0;i=0`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// Numeric value when the identifier is numeric.
    #[must_use]
    pub const fn as_numeric(&self) -> Option<u32> {
        match self.identifier {
            Identifier::Numeric(value) => Some(value),
            _ => None,
        }
    }

    fn encoding_byte(&self) -> u8 {
        match &self.identifier {
            Identifier::Numeric(value) if self.namespace == 0 && *value <= 0xFF => ENCODING_TWO_BYTE,
            Identifier::Numeric(value) if self.namespace <= 0xFF && *value <= 0xFFFF => {
                ENCODING_FOUR_BYTE
            }
            Identifier::Numeric(_) => ENCODING_NUMERIC,
            Identifier::String(_) => ENCODING_STRING,
            Identifier::Guid(_) => ENCODING_GUID,
            Identifier::Opaque(_) => ENCODING_BYTE_STRING,
        }
    }

    fn body_len(&self, encoding: u8) -> usize {
        match (&self.identifier, encoding) {
            (_, ENCODING_TWO_BYTE) => 1,
            (_, ENCODING_FOUR_BYTE) => 3,
            (_, ENCODING_NUMERIC) => 6,
            (Identifier::String(value), _) => 2 + value.byte_len(),
            (Identifier::Guid(_), _) => 2 + 16,
            (Identifier::Opaque(value), _) => 2 + value.byte_len(),
            _ => 0,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn encode_with_flags<B: BufMut>(&self, buf: &mut B, flags: u8) {
        let encoding = self.encoding_byte();
        buf.put_u8(encoding | flags);
        match &self.identifier {
            Identifier::Numeric(value) => match encoding {
                ENCODING_TWO_BYTE => buf.put_u8(*value as u8),
                ENCODING_FOUR_BYTE => {
                    buf.put_u8(self.namespace as u8);
                    buf.put_u16_le(*value as u16);
                }
                _ => {
                    buf.put_u16_le(self.namespace);
                    buf.put_u32_le(*value);
                }
            },
            Identifier::String(value) => {
                buf.put_u16_le(self.namespace);
                value.encode(buf);
            }
            Identifier::Guid(value) => {
                buf.put_u16_le(self.namespace);
                value.encode(buf);
            }
            Identifier::Opaque(value) => {
                buf.put_u16_le(self.namespace);
                value.encode(buf);
            }
        }
    }

    fn decode_with_encoding<B: Buf>(buf: &mut B, encoding: u8) -> Result<Self> {
        match encoding {
            ENCODING_TWO_BYTE => Ok(Self::numeric(0, u32::from(u8::decode(buf)?))),
            ENCODING_FOUR_BYTE => {
                ensure_remaining(buf, 3)?;
                let namespace = u16::from(buf.get_u8());
                Ok(Self::numeric(namespace, u32::from(buf.get_u16_le())))
            }
            ENCODING_NUMERIC => {
                let namespace = u16::decode(buf)?;
                Ok(Self::numeric(namespace, u32::decode(buf)?))
            }
            ENCODING_STRING => {
                let namespace = u16::decode(buf)?;
                Ok(Self::string(namespace, String::decode(buf)?))
            }
            ENCODING_GUID => {
                let namespace = u16::decode(buf)?;
                Ok(Self::guid(namespace, Uuid::decode(buf)?))
            }
            ENCODING_BYTE_STRING => {
                let namespace = u16::decode(buf)?;
                Ok(Self {
                    namespace,
                    identifier: Identifier::Opaque(ByteString::decode(buf)?),
                })
            }
            other => Err(DecodeError::InvalidNodeIdEncoding(other)),
        }
    }
}

impl From<u32> for NodeId {
    fn from(value: u32) -> Self {
        Self::numeric(0, value)
    }
}

impl BinaryEncodable for NodeId {
    fn byte_len(&self) -> usize {
        1 + self.body_len(self.encoding_byte())
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        self.encode_with_flags(buf, 0);
    }
}

impl BinaryDecodable for NodeId {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        let encoding = u8::decode(buf)?;
        if encoding & (FLAG_NAMESPACE_URI | FLAG_SERVER_INDEX) != 0 {
            return Err(DecodeError::InvalidNodeIdEncoding(encoding));
        }
        Self::decode_with_encoding(buf, encoding)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace != 0 {
            write!(f, "ns={};", self.namespace)?;
        }
        match &self.identifier {
            Identifier::Numeric(value) => write!(f, "i={value}"),
            Identifier::String(value) => write!(f, "s={value}"),
            Identifier::Guid(value) => write!(f, "g={value}"),
            Identifier::Opaque(value) => {
                f.write_str("b=")?;
                for byte in value.as_bytes() {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for NodeId {
    type Err = ParseNodeIdError;

    fn from_str(input: &str) -> std::result::Result<Self, Self::Err> {
        let fail = |reason| ParseNodeIdError {
            input: input.to_string(),
            reason,
        };

        let (namespace, rest) = match input.strip_prefix("ns=") {
            Some(tail) => {
                let (ns, rest) = tail.split_once(';').ok_or_else(|| fail("missing `;` after namespace"))?;
                let ns = ns.parse::<u16>().map_err(|_| fail("namespace is not a u16"))?;
                (ns, rest)
            }
            None => (0, input),
        };

        let (kind, value) = rest
            .split_once('=')
            .ok_or_else(|| fail("expected `i=`, `s=`, `g=` or `b=`"))?;
        let identifier = match kind {
            "i" => Identifier::Numeric(value.parse().map_err(|_| fail("identifier is not a u32"))?),
            "s" => Identifier::String(value.to_string()),
            "g" => Identifier::Guid(Uuid::parse_str(value).map_err(|_| fail("identifier is not a GUID"))?),
            "b" => Identifier::Opaque(ByteString(parse_hex(value).ok_or_else(|| fail("identifier is not hex"))?)),
            _ => return Err(fail("unknown identifier type")),
        };

        Ok(Self {
            namespace,
            identifier,
        })
    }
}

fn parse_hex(value: &str) -> Option<Vec<u8>> {
    if value.len() % 2 != 0 {
        return None;
    }
    (0..value.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(value.get(i..i + 2)?, 16).ok())
        .collect()
}

/// A node id that may carry a namespace URI and server index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ExpandedNodeId {
    /// The node id.
    pub node_id: NodeId,
    /// Namespace URI, empty when absent.
    pub namespace_uri: String,
    /// Server index, zero for the local server.
    pub server_index: u32,
}

impl From<NodeId> for ExpandedNodeId {
    fn from(node_id: NodeId) -> Self {
        Self {
            node_id,
            namespace_uri: String::new(),
            server_index: 0,
        }
    }
}

impl BinaryEncodable for ExpandedNodeId {
    fn byte_len(&self) -> usize {
        let mut len = self.node_id.byte_len();
        if !self.namespace_uri.is_empty() {
            len += self.namespace_uri.byte_len();
        }
        if self.server_index != 0 {
            len += 4;
        }
        len
    }

    fn encode<B: BufMut>(&self, buf: &mut B) {
        let mut flags = 0;
        if !self.namespace_uri.is_empty() {
            flags |= FLAG_NAMESPACE_URI;
        }
        if self.server_index != 0 {
            flags |= FLAG_SERVER_INDEX;
        }
        self.node_id.encode_with_flags(buf, flags);
        if !self.namespace_uri.is_empty() {
            self.namespace_uri.encode(buf);
        }
        if self.server_index != 0 {
            buf.put_u32_le(self.server_index);
        }
    }
}

impl BinaryDecodable for ExpandedNodeId {
    fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        let raw = u8::decode(buf)?;
        let node_id = NodeId::decode_with_encoding(buf, raw & 0x3F)?;
        let namespace_uri = if raw & FLAG_NAMESPACE_URI != 0 {
            String::decode(buf)?
        } else {
            String::new()
        };
        let server_index = if raw & FLAG_SERVER_INDEX != 0 {
            u32::decode(buf)?
        } else {
            0
        };
        Ok(Self {
            node_id,
            namespace_uri,
            server_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_smallest_numeric_form() {
        assert_eq!(&NodeId::numeric(0, 85).to_bytes()[..], &[0x00, 85]);
        assert_eq!(&NodeId::numeric(2, 1000).to_bytes()[..], &[0x01, 2, 0xE8, 0x03]);
        assert_eq!(
            &NodeId::numeric(300, 7).to_bytes()[..],
            &[0x02, 0x2C, 0x01, 7, 0, 0, 0]
        );
    }

    #[test]
    fn byte_len_matches_encoded_size() {
        let ids = [
            NodeId::numeric(0, 1),
            NodeId::numeric(1, 70_000),
            NodeId::string(3, "Demo.Static"),
            NodeId::guid(1, Uuid::nil()),
            NodeId::opaque(4, vec![1, 2, 3]),
        ];
        for id in ids {
            assert_eq!(id.byte_len(), id.to_bytes().len(), "{id}");
        }
    }

    #[test]
    fn decodes_string_node_id() {
        let bytes = NodeId::string(2, "Pump").to_bytes();
        assert_eq!(NodeId::decode(&mut &bytes[..]).unwrap(), NodeId::string(2, "Pump"));
    }

    #[test]
    fn rejects_unknown_encoding() {
        let mut raw: &[u8] = &[0x09, 0, 0];
        assert_eq!(
            NodeId::decode(&mut raw),
            Err(DecodeError::InvalidNodeIdEncoding(0x09))
        );
    }

    #[test]
    fn parses_text_forms() {
        assert_eq!("i=85".parse::<NodeId>().unwrap(), NodeId::OBJECTS_FOLDER);
        assert_eq!(
            "ns=2;s=Line1.Speed".parse::<NodeId>().unwrap(),
            NodeId::string(2, "Line1.Speed")
        );
        assert_eq!(
            "ns=1;b=0aff".parse::<NodeId>().unwrap(),
            NodeId::opaque(1, vec![0x0a, 0xff])
        );
        assert!("ns=x;i=1".parse::<NodeId>().is_err());
        assert!("q=1".parse::<NodeId>().is_err());
    }

    #[test]
    fn display_matches_parse() {
        let id = NodeId::string(4, "Boiler");
        assert_eq!(id.to_string(), "ns=4;s=Boiler");
        assert_eq!(NodeId::numeric(0, 2253).to_string(), "i=2253");
    }

    #[test]
    fn expanded_node_id_carries_flags() {
        let id = ExpandedNodeId {
            node_id: NodeId::numeric(0, 5),
            namespace_uri: "urn:x".into(),
            server_index: 2,
        };
        let bytes = id.to_bytes();
        assert_eq!(bytes[0], 0xC0);
        assert_eq!(bytes.len(), id.byte_len());
        assert_eq!(ExpandedNodeId::decode(&mut &bytes[..]).unwrap(), id);
    }
}
