//! Declarative helpers for structures encoded field by field.

/// Declares a structure whose binary form is its fields in declaration order.
macro_rules! binary_struct {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                pub $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )*
        }

        impl $crate::encoding::BinaryEncodable for $name {
            fn byte_len(&self) -> usize {
                0 $(+ $crate::encoding::BinaryEncodable::byte_len(&self.$field))*
            }

            fn encode<B: ::bytes::BufMut>(&self, buf: &mut B) {
                let _ = &buf;
                $($crate::encoding::BinaryEncodable::encode(&self.$field, buf);)*
            }
        }

        impl $crate::encoding::BinaryDecodable for $name {
            fn decode<B: ::bytes::Buf>(buf: &mut B) -> $crate::error::Result<Self> {
                let _ = &buf;
                Ok(Self {
                    $($field: $crate::encoding::BinaryDecodable::decode(buf)?,)*
                })
            }
        }
    };
}

/// Declares an `Int32` enumeration.
macro_rules! binary_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident = $value:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        #[repr(i32)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                $variant = $value,
            )*
        }

        impl $crate::encoding::BinaryEncodable for $name {
            fn byte_len(&self) -> usize {
                4
            }

            fn encode<B: ::bytes::BufMut>(&self, buf: &mut B) {
                buf.put_i32_le(*self as i32);
            }
        }

        impl $crate::encoding::BinaryDecodable for $name {
            fn decode<B: ::bytes::Buf>(buf: &mut B) -> $crate::error::Result<Self> {
                match <i32 as $crate::encoding::BinaryDecodable>::decode(buf)? {
                    $($value => Ok(Self::$variant),)*
                    value => Err($crate::error::DecodeError::InvalidEnumValue {
                        type_name: stringify!($name),
                        value,
                    }),
                }
            }
        }
    };
}

/// Binds a request to its response and both to their binary encoding ids.
macro_rules! service_pair {
    (
        $request:ident => $response:ident,
        request_id = $request_id:literal,
        response_id = $response_id:literal
        $(, message_type = $message_type:expr)? $(,)?
    ) => {
        impl $crate::service::ServiceRequest for $request {
            type Response = $response;
            const TYPE_ID: u32 = $request_id;
            $(const MESSAGE_TYPE: $crate::frame::MessageType = $message_type;)?

            fn request_header(&self) -> &$crate::header::RequestHeader {
                &self.request_header
            }

            fn request_header_mut(&mut self) -> &mut $crate::header::RequestHeader {
                &mut self.request_header
            }
        }

        impl $crate::service::ServiceResponse for $response {
            const TYPE_ID: u32 = $response_id;

            fn response_header(&self) -> &$crate::header::ResponseHeader {
                &self.response_header
            }

            #[allow(clippy::needless_update)]
            fn from_response_header(response_header: $crate::header::ResponseHeader) -> Self {
                Self {
                    response_header,
                    ..Default::default()
                }
            }
        }
    };
}
