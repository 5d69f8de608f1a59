//! Channels connecting transport and node port data

use apxnode_core::AccessError;

use crate::internal;

/// Consumer of inbound port data
///
/// A remote write may arrive in fragments. All fragments but the last carry `more = true`;
/// the node's inbound handler runs once, after the last fragment is stored.
///
/// The channel blocks only for the duration of a buffer copy.
pub struct Rx<'a>(&'a (dyn internal::DynamicRx + Sync));

impl<'a> Rx<'a> {
    /// Stores `data` at `offset` of the input buffer.
    ///
    /// Fails with `OutOfRange` if the bytes do not fit; nothing is written in that case.
    pub fn write(&mut self, offset: u32, data: &[u8], more: bool) -> Result<(), AccessError> {
        self.0.write(offset, data, more)
    }
}

/// Producer of outbound port data
///
/// While closed, application writes update the buffer silently. Opening the channel resets
/// every output port to `Clean` and drops pending write commands; the transport is expected
/// to send the full buffer image right after opening.
pub struct Tx<'a>(&'a (dyn internal::DynamicTx + Sync));

impl<'a> Tx<'a> {
    /// Reports a subscriber for the output data. Subsequent writes produce notifications.
    pub fn open(&mut self) {
        self.0.set_open(true);
    }

    pub fn close(&mut self) {
        self.0.set_open(false);
    }

    pub fn is_open(&self) -> bool {
        self.0.is_open()
    }

    /// Copies output bytes starting at `offset` into `dst` without touching port states.
    pub fn read(&self, offset: u32, dst: &mut [u8]) -> Result<(), AccessError> {
        self.0.read(offset, dst)
    }

    /// Copies output bytes starting at `offset` into `dst` and marks the port at `offset`
    /// `Clean` within the same critical section.
    ///
    /// `dst` must not extend past the port; fails with `OutOfRange` otherwise.
    pub fn consume(&mut self, offset: u32, dst: &mut [u8]) -> Result<(), AccessError> {
        self.0.consume(offset, dst)
    }

    /// Marks the port at `offset` `Clean`, so that the next write notifies again.
    pub fn acknowledge(&mut self, offset: u32) -> Result<(), AccessError> {
        self.0.acknowledge(offset)
    }

    pub fn is_dirty(&self, offset: u32) -> Result<bool, AccessError> {
        self.0.is_dirty(offset)
    }
}

/// Channel container. A transport should consume it.
pub struct Link<'a>(&'a (dyn internal::DynamicLink + Sync));

impl<'a> Link<'a> {
    pub fn new(access: &'a (dyn internal::DynamicLink + Sync)) -> Self {
        Self(access)
    }

    pub fn split(self) -> (Rx<'a>, Tx<'a>) {
        (Rx(self.0), Tx(self.0))
    }
}
