//! Port data codec
//!
//! Scalars are packed in little-endian byte order using 1, 2 or 4 bytes. Arrays repeat the
//! element encoding, records concatenate field encodings in declaration order. There is no
//! padding anywhere, so the packed length of a type is known at compile time and the byte
//! layout is bit-exact with peers built from the same signal description.
//!
//! Users should not depend on this crate directly. Use `apxnode::encoding` reexport instead.

#![no_std]

pub use apxnode_core::Width;

mod record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    BufferTooShort,
}

/// Writes the `width` low bytes of `value` in little-endian order.
///
/// Returns the remainder of `dst` past the written bytes.
///
/// # Panics
/// Panics if `dst` is shorter than `width`.
pub fn pack_le(dst: &mut [u8], value: u32, width: Width) -> &mut [u8] {
    let (head, tail) = dst.split_at_mut(width.bytes());
    head.copy_from_slice(&value.to_le_bytes()[..width.bytes()]);
    tail
}

/// Reads a `width`-byte little-endian value, zero-extended to `u32`.
///
/// # Panics
/// Panics if `src` is shorter than `width`.
pub fn unpack_le(src: &[u8], width: Width) -> u32 {
    let mut bytes = [0u8; 4];
    bytes[..width.bytes()].copy_from_slice(&src[..width.bytes()]);
    u32::from_le_bytes(bytes)
}

/// Compile-time packed length of a type
pub trait PackLen {
    const PACK_LEN: usize;
}

pub trait Pack: PackLen {
    fn pack(&self, packer: &mut Packer<'_>);
}

pub trait Unpack: PackLen + Sized {
    fn unpack(unpacker: &mut Unpacker<'_>) -> Self;
}

/// Write cursor over a byte buffer
pub struct Packer<'a> {
    buf: &'a mut [u8],
}

impl<'a> Packer<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// # Panics
    /// Panics if fewer than `width` bytes remain.
    pub fn put(&mut self, value: u32, width: Width) {
        let buf = core::mem::take(&mut self.buf);
        self.buf = pack_le(buf, value, width);
    }

    pub fn pack<T: Pack + ?Sized>(&mut self, value: &T) {
        value.pack(self);
    }
}

/// Read cursor over a byte buffer
pub struct Unpacker<'a> {
    buf: &'a [u8],
}

impl<'a> Unpacker<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// # Panics
    /// Panics if fewer than `width` bytes remain.
    pub fn take(&mut self, width: Width) -> u32 {
        let value = unpack_le(self.buf, width);
        self.buf = &self.buf[width.bytes()..];
        value
    }

    pub fn unpack<T: Unpack>(&mut self) -> T {
        T::unpack(self)
    }
}

/// Packs `value` into the front of `dst`
pub fn encode<T: Pack + ?Sized>(value: &T, dst: &mut [u8]) -> Result<(), EncodeError> {
    if dst.len() < T::PACK_LEN {
        return Err(EncodeError::BufferTooShort);
    }
    Packer::new(&mut dst[..T::PACK_LEN]).pack(value);
    Ok(())
}

/// Unpacks a value from the front of `src`
pub fn decode<T: Unpack>(src: &[u8]) -> Result<T, EncodeError> {
    if src.len() < T::PACK_LEN {
        return Err(EncodeError::BufferTooShort);
    }
    Ok(Unpacker::new(&src[..T::PACK_LEN]).unpack())
}

macro_rules! impl_unsigned {
    ($ty:ty, $width:expr) => {
        impl PackLen for $ty {
            const PACK_LEN: usize = $width.bytes();
        }

        impl Pack for $ty {
            fn pack(&self, packer: &mut Packer<'_>) {
                packer.put(u32::from(*self), $width);
            }
        }

        impl Unpack for $ty {
            fn unpack(unpacker: &mut Unpacker<'_>) -> Self {
                unpacker.take($width) as $ty
            }
        }
    };
}

// Signed scalars travel as two's complement of their own width
macro_rules! impl_signed {
    ($ty:ty, $unsigned:ty, $width:expr) => {
        impl PackLen for $ty {
            const PACK_LEN: usize = $width.bytes();
        }

        impl Pack for $ty {
            fn pack(&self, packer: &mut Packer<'_>) {
                packer.put(u32::from(*self as $unsigned), $width);
            }
        }

        impl Unpack for $ty {
            fn unpack(unpacker: &mut Unpacker<'_>) -> Self {
                unpacker.take($width) as $unsigned as $ty
            }
        }
    };
}

impl_unsigned!(u8, Width::U8);
impl_unsigned!(u16, Width::U16);
impl_unsigned!(u32, Width::U32);
impl_signed!(i8, u8, Width::U8);
impl_signed!(i16, u16, Width::U16);
impl_signed!(i32, u32, Width::U32);

impl<T: PackLen, const N: usize> PackLen for [T; N] {
    const PACK_LEN: usize = T::PACK_LEN * N;
}

impl<T: Pack, const N: usize> Pack for [T; N] {
    fn pack(&self, packer: &mut Packer<'_>) {
        self.iter().for_each(|item| item.pack(packer));
    }
}

impl<T: Unpack, const N: usize> Unpack for [T; N] {
    fn unpack(unpacker: &mut Unpacker<'_>) -> Self {
        core::array::from_fn(|_| T::unpack(unpacker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_le() {
        let mut buf = [0xffu8; 7];
        let rest = pack_le(&mut buf, 0x1234_5678, Width::U32);
        let rest = pack_le(rest, 0xabcd, Width::U16);
        let rest = pack_le(rest, 0x42, Width::U8);
        assert_eq!(rest.len(), 0);
        assert_eq!(buf, [0x78, 0x56, 0x34, 0x12, 0xcd, 0xab, 0x42]);
    }

    #[test]
    fn test_pack_truncates_to_width() {
        let mut buf = [0u8; 4];
        pack_le(&mut buf, 0x1234_5678, Width::U16);
        assert_eq!(buf, [0x78, 0x56, 0, 0]);
    }

    #[test]
    fn test_unpack_le() {
        let buf = [0x78, 0x56, 0x34, 0x12];
        assert_eq!(unpack_le(&buf, Width::U8), 0x78);
        assert_eq!(unpack_le(&buf, Width::U16), 0x5678);
        assert_eq!(unpack_le(&buf, Width::U32), 0x1234_5678);
    }

    #[test]
    fn test_scalar_boundaries() {
        let widths = [
            (Width::U8, u8::MAX as u32),
            (Width::U16, u16::MAX as u32),
            (Width::U32, u32::MAX),
        ];
        for (width, max) in widths {
            for value in [0, 1, max / 2, max - 1, max] {
                let mut buf = [0u8; 4];
                pack_le(&mut buf, value, width);
                assert_eq!(unpack_le(&buf, width), value);
            }
        }
    }

    #[test]
    fn test_signed() {
        let mut buf = [0u8; 7];
        encode(&(-2i8, -300i16, i32::MIN), &mut buf).unwrap();
        assert_eq!(buf, [0xfe, 0xd4, 0xfe, 0x00, 0x00, 0x00, 0x80]);
        let (a, b, c): (i8, i16, i32) = decode(&buf).unwrap();
        assert_eq!((a, b, c), (-2, -300, i32::MIN));
    }

    #[test]
    fn test_array() {
        let mut buf = [0xffu8; 12];
        encode(&[1u16, 2, 3, 4], &mut buf).unwrap();
        assert_eq!(buf[..8], [1, 0, 2, 0, 3, 0, 4, 0]);
        assert_eq!(buf[8..], [0xff; 4]);
        assert_eq!(<[u16; 4]>::PACK_LEN, 8);
        assert_eq!(decode::<[u16; 4]>(&buf).unwrap(), [1, 2, 3, 4]);
    }

    #[test]
    fn test_short_buffer() {
        let mut buf = [0u8; 3];
        assert_eq!(encode(&0u32, &mut buf), Err(EncodeError::BufferTooShort));
        assert_eq!(decode::<[u8; 4]>(&buf), Err(EncodeError::BufferTooShort));
        assert_eq!(decode::<u16>(&buf), Ok(0));
    }
}
