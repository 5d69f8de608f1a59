//! Typed port handles
//!
//! A handle binds a port offset to the value type the signal compiler generated for it.
//! Handles are `const`-constructible, so generated code can declare one per port.

use core::marker::PhantomData;
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::core::AccessError;
use crate::encoding::{Pack, Unpack};
use crate::node_data::NodeData;

/// Handle of a require (input) port
pub struct RequirePort<T> {
    offset: u32,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> RequirePort<T> {
    pub const fn new(offset: u32) -> Self {
        Self {
            offset,
            _phantom: PhantomData,
        }
    }

    pub const fn offset(&self) -> u32 {
        self.offset
    }
}

impl<T: Unpack> RequirePort<T> {
    /// Decodes the port value under the input lock.
    pub fn read<M: RawMutex>(&self, node: &NodeData<'_, M>) -> Result<T, AccessError> {
        node.read_in_port(self.offset)
    }

    /// Returns whether the port received data since the last call.
    pub fn take_update<M: RawMutex>(&self, node: &NodeData<'_, M>) -> Result<bool, AccessError> {
        node.take_in_port_update(self.offset)
    }
}

impl<T> Clone for RequirePort<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RequirePort<T> {}

/// Handle of a provide (output) port
pub struct ProvidePort<T> {
    offset: u32,
    _phantom: PhantomData<fn(T)>,
}

impl<T> ProvidePort<T> {
    pub const fn new(offset: u32) -> Self {
        Self {
            offset,
            _phantom: PhantomData,
        }
    }

    pub const fn offset(&self) -> u32 {
        self.offset
    }
}

impl<T: Pack> ProvidePort<T> {
    /// Encodes `value` into the port and announces the change if it is the first since the
    /// transport last acknowledged the port.
    pub fn write<M: RawMutex>(&self, node: &NodeData<'_, M>, value: &T) -> Result<(), AccessError> {
        node.write_out_port(self.offset, value)
    }
}

impl<T: Unpack> ProvidePort<T> {
    /// Decodes the last written value.
    pub fn read<M: RawMutex>(&self, node: &NodeData<'_, M>) -> Result<T, AccessError> {
        node.read_out_port(self.offset)
    }
}

impl<T> Clone for ProvidePort<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ProvidePort<T> {}
