//! Inbound port data handlers
//!
//! A handler runs right after the transport stored new input bytes, while the input lock
//! is still held. It receives the whole input buffer and the written span, so it can decode
//! the touched ports in place. It must not block.

use crate::core::{Direction, NodeLayout, PortInfo, PortSpan};

pub trait InPortDataHandler {
    fn in_port_data_written(&self, data: &[u8], span: PortSpan);
}

/// Handler that ignores every write
pub struct NoopHandler;

impl InPortDataHandler for NoopHandler {
    fn in_port_data_written(&self, _data: &[u8], _span: PortSpan) {}
}

/// Function-based handler for simple cases
pub struct FnHandler<F: Fn(&[u8], PortSpan)>(pub F);

impl<F: Fn(&[u8], PortSpan)> InPortDataHandler for FnHandler<F> {
    fn in_port_data_written(&self, data: &[u8], span: PortSpan) {
        (self.0)(data, span);
    }
}

/// Per-port dispatch
///
/// Walks the written span port by port and calls `F` once for each require port the write
/// touched, with the port's bytes. A write that covers a port partially still reports the
/// whole port.
///
/// ```
/// use apxnode::core::{NodeLayout, PortInfo, PortSpan};
/// use apxnode::handler::{InPortDataHandler, PortDispatch};
///
/// const REQUIRE: &[PortInfo] = &[PortInfo::new("A", 0, 2), PortInfo::new("B", 2, 1)];
/// let layout = NodeLayout::new(REQUIRE, &[]);
///
/// let dispatch = PortDispatch::new(layout, |port: &PortInfo, bytes: &[u8]| {
///     assert_eq!(port.name, "B");
///     assert_eq!(bytes, [7]);
/// });
/// dispatch.in_port_data_written(&[0, 0, 7], PortSpan::new(2, 1));
/// ```
pub struct PortDispatch<'a, F: Fn(&PortInfo, &[u8])> {
    layout: NodeLayout<'a>,
    f: F,
}

impl<'a, F: Fn(&PortInfo, &[u8])> PortDispatch<'a, F> {
    pub fn new(layout: NodeLayout<'a>, f: F) -> Self {
        Self { layout, f }
    }
}

impl<F: Fn(&PortInfo, &[u8])> InPortDataHandler for PortDispatch<'_, F> {
    fn in_port_data_written(&self, data: &[u8], span: PortSpan) {
        for port in self.layout.ports_in(Direction::Require, span) {
            match port.span.range_within(data.len()) {
                Some(range) => (self.f)(port, &data[range]),
                None => {
                    warn!("port {} lies outside the input data", port.name);
                    break;
                }
            }
        }
    }
}
