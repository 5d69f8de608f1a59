/// Private interfaces for apxnode NodeData
///
/// Transports should not use this module.
/// Backward-incompatible changes can be made without major version bump.
use apxnode_core::AccessError;

pub trait DynamicRx {
    fn write(&self, offset: u32, data: &[u8], more: bool) -> Result<(), AccessError>;
}

pub trait DynamicTx {
    fn is_open(&self) -> bool;
    fn set_open(&self, open: bool);
    fn read(&self, offset: u32, dst: &mut [u8]) -> Result<(), AccessError>;
    fn consume(&self, offset: u32, dst: &mut [u8]) -> Result<(), AccessError>;
    fn acknowledge(&self, offset: u32) -> Result<(), AccessError>;
    fn is_dirty(&self, offset: u32) -> Result<bool, AccessError>;
}

pub trait DynamicLink: DynamicRx + DynamicTx {}
