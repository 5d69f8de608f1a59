//! APX node core data types
//!
//! This crate provides basic data type definitions used by other apxnode crates.
//! Users should not depend on this crate directly. Use `apxnode::core` reexport instead.
#![no_std]

use core::ops::Range;

mod layout;

pub use layout::{Direction, LayoutError, NodeLayout, PortInfo, Ports};

#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidValue;

/// Port data access failure
///
/// Reported by typed accessors and by the transport-facing channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessError {
    /// The byte range does not fit into the port data buffer
    OutOfRange,
    /// The offset is not the start offset of a port in the given direction
    NotPortStart,
    /// The encoded width of the value differs from the port length
    LengthMismatch,
}

/// Width of a packed scalar in bytes
///
/// Only the widths used by the APX signal types are representable, so an encoder
/// never sees an unsupported width at runtime.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Width {
    U8 = 1,
    U16 = 2,
    U32 = 4,
}

impl Width {
    pub const fn try_from_u8(bytes: u8) -> Option<Width> {
        match bytes {
            1 => Some(Width::U8),
            2 => Some(Width::U16),
            4 => Some(Width::U32),
            _ => None,
        }
    }

    pub const fn bytes(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for Width {
    type Error = InvalidValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Width::try_from_u8(value).ok_or(InvalidValue)
    }
}

impl From<Width> for u8 {
    fn from(value: Width) -> Self {
        value as u8
    }
}

/// Byte range of a port within a port data buffer
///
/// Doubles as the write command a transport receives when an output port changes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortSpan {
    pub offset: u32,
    pub len: u32,
}

impl PortSpan {
    pub const fn new(offset: u32, len: u32) -> Self {
        Self { offset, len }
    }

    /// First offset past the span. Saturates on overflow.
    pub const fn end(&self) -> u32 {
        self.offset.saturating_add(self.len)
    }

    pub const fn contains(&self, offset: u32) -> bool {
        self.offset <= offset && offset < self.end()
    }

    pub const fn overlaps(&self, other: PortSpan) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }

    /// Index range of the span, checked against a buffer of `buffer_len` bytes
    pub fn range_within(&self, buffer_len: usize) -> Option<Range<usize>> {
        let start = usize::try_from(self.offset).ok()?;
        let end = start.checked_add(usize::try_from(self.len).ok()?)?;
        (end <= buffer_len).then_some(start..end)
    }
}

/// Edge-triggered per-port change state
///
/// An output port turns `Dirty` on its first write while a subscriber exists and stays
/// `Dirty` until the transport acknowledges the change. An input port turns `Dirty` when
/// the transport stores new bytes into it and stays `Dirty` until the application takes
/// the update.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PortState {
    #[default]
    Clean = 0,
    Dirty = 1,
}

impl PortState {
    pub const fn is_dirty(self) -> bool {
        matches!(self, PortState::Dirty)
    }
}
