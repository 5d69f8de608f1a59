//! Record (struct) encoding
//!
//! Fields are packed back to back in declaration order.

use crate::{Pack, PackLen, Packer, Unpack, Unpacker};

/// Declares a record type together with its codec implementation.
///
/// ```
/// apxnode_encoding::record! {
///     #[derive(Debug, Clone, Copy, PartialEq, Eq)]
///     pub struct SoundRequest {
///         pub sound_id: u16,
///         pub volume: u8,
///     }
/// }
///
/// let mut buf = [0u8; 3];
/// let value = SoundRequest { sound_id: 0x0102, volume: 3 };
/// apxnode_encoding::encode(&value, &mut buf).unwrap();
/// assert_eq!(buf, [0x02, 0x01, 0x03]);
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($(#[$field_meta:meta])* $field_vis:vis $field:ident : $ty:ty),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $($(#[$field_meta])* $field_vis $field: $ty),*
        }

        impl $crate::PackLen for $name {
            const PACK_LEN: usize = 0 $(+ <$ty as $crate::PackLen>::PACK_LEN)*;
        }

        impl $crate::Pack for $name {
            fn pack(&self, packer: &mut $crate::Packer<'_>) {
                $(packer.pack(&self.$field);)*
            }
        }

        impl $crate::Unpack for $name {
            fn unpack(unpacker: &mut $crate::Unpacker<'_>) -> Self {
                // Struct expression fields are evaluated in source order
                Self {
                    $($field: unpacker.unpack::<$ty>(),)*
                }
            }
        }
    };
}

macro_rules! impl_tuple {
    ($($name:ident),+) => {
        impl<$($name: PackLen),+> PackLen for ($($name,)+) {
            const PACK_LEN: usize = 0 $(+ $name::PACK_LEN)+;
        }

        impl<$($name: Pack),+> Pack for ($($name,)+) {
            #[allow(non_snake_case)]
            fn pack(&self, packer: &mut Packer<'_>) {
                let ($($name,)+) = self;
                $(packer.pack($name);)+
            }
        }

        impl<$($name: Unpack),+> Unpack for ($($name,)+) {
            fn unpack(unpacker: &mut Unpacker<'_>) -> Self {
                ($(unpacker.unpack::<$name>(),)+)
            }
        }
    };
}

impl_tuple!(A, B);
impl_tuple!(A, B, C);
impl_tuple!(A, B, C, D);

#[cfg(test)]
mod tests {
    use crate::{PackLen, decode, encode};

    crate::record! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        struct SoundRequest {
            sound_id: u16,
            volume: u8,
        }
    }

    crate::record! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        struct Nested {
            header: u8,
            request: SoundRequest,
            samples: [i16; 2],
        }
    }

    #[test]
    fn test_record_layout() {
        assert_eq!(SoundRequest::PACK_LEN, 3);
        assert_eq!(Nested::PACK_LEN, 8);
    }

    #[test]
    fn test_record_roundtrip() {
        let mut buf = [0u8; 3];
        let value = SoundRequest {
            sound_id: 65535,
            volume: 255,
        };
        encode(&value, &mut buf).unwrap();
        assert_eq!(buf, [0xff, 0xff, 0xff]);
        assert_eq!(decode::<SoundRequest>(&buf).unwrap(), value);

        let buf = [0x01, 0x00, 0x10];
        let value = decode::<SoundRequest>(&buf).unwrap();
        assert_eq!(value.sound_id, 1);
        assert_eq!(value.volume, 16);
    }

    #[test]
    fn test_nested_record() {
        let value = Nested {
            header: 0xaa,
            request: SoundRequest {
                sound_id: 0x1234,
                volume: 7,
            },
            samples: [-1, 2],
        };
        let mut buf = [0u8; 8];
        encode(&value, &mut buf).unwrap();
        assert_eq!(buf, [0xaa, 0x34, 0x12, 7, 0xff, 0xff, 2, 0]);
        assert_eq!(decode::<Nested>(&buf).unwrap(), value);
    }
}
