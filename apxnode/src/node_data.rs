//! Node data container
//!
//! `NodeData` owns the input (require port) and output (provide port) data of one node.
//! Each region has its own lock, so inbound and outbound traffic never contend.
//!
//! ## Locking
//!
//! Every access runs inside a single closure-scoped critical section:
//! * a read decodes the whole port under the input lock, so a multi-field record is never
//!   observed half updated;
//! * a write encodes the port and runs the write-completion step under the output lock, then
//!   releases it and only afterwards announces the change to the delivery sink.
//!
//! Lock release is tied to the closure scope, so an acquisition can never be left unpaired.
//!
//! ## Change tracking
//!
//! Output ports follow an edge-triggered two-state machine:
//!
//! ```text
//! Clean --write (open)--> Dirty   announce (offset, len)
//! Dirty --write---------> Dirty   silent, buffer holds latest value
//! Dirty --acknowledge---> Clean   transport consumed the bytes
//! Clean --write (closed)> Clean   silent, buffer holds latest value
//! ```
//!
//! ## Examples
//!
//! ```
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex as Mutex;
//! use apxnode::config::Config;
//! use apxnode::core::{NodeLayout, PortInfo, PortSpan};
//! use apxnode::delivery::Push;
//! use apxnode::node_data::NodeData;
//! use apxnode::storage::Storage;
//!
//! const REQUIRE: &[PortInfo] = &[PortInfo::new("U8Port", 0, 1)];
//! const PROVIDE: &[PortInfo] = &[PortInfo::new("U32Port", 0, 4)];
//! const LAYOUT: NodeLayout<'static> = NodeLayout::new(REQUIRE, PROVIDE);
//!
//! let sink = Push(|span: PortSpan| assert_eq!(span, PortSpan::new(0, 4)));
//! let mut storage = Storage::new([0xff; 1], [0xff; 4]);
//! let (input, output) = storage.split();
//! let config = Config::default().with_delivery(&sink).with_out_open(true);
//! let node = NodeData::<Mutex>::new("Test", b"APX/1.2\n", LAYOUT, input, output, config).unwrap();
//!
//! assert_eq!(node.read_in_port::<u8>(0), Ok(255));
//! node.write_out_port(0, &0x1234_5678u32).unwrap();
//! ```

use core::cell::RefCell;
use core::ops::Range;
use core::sync::atomic::{AtomicBool, Ordering};
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use apxnode_driver::internal::{DynamicLink, DynamicRx, DynamicTx};

use crate::config::Config;
use crate::core::{AccessError, Direction, LayoutError, NodeLayout, PortInfo, PortSpan, PortState};
use crate::delivery::Delivery;
use crate::dirty;
use crate::encoding::{Pack, Packer, Unpack, Unpacker};
use crate::file::{FileKind, FileName};
use crate::handler::InPortDataHandler;
use crate::link::Link;

/// Caller-owned port data region: the data bytes and one marker per byte offset
pub struct PortData<'a> {
    data: &'a mut [u8],
    markers: &'a mut [PortState],
    // Bytes stored by the fragments of an unfinished inbound write
    pending: Option<PortSpan>,
}

impl<'a> PortData<'a> {
    pub fn new(data: &'a mut [u8], markers: &'a mut [PortState]) -> Self {
        Self {
            data,
            markers,
            pending: None,
        }
    }

    /// Region of a node without ports in this direction
    pub fn empty() -> Self {
        Self::new(&mut [], &mut [])
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    Layout(LayoutError),
    /// The data buffer length differs from the total width of the ports
    DataLength {
        direction: Direction,
        expected: usize,
        actual: usize,
    },
    /// The marker array length differs from the data buffer length
    MarkerLength {
        direction: Direction,
        expected: usize,
        actual: usize,
    },
    /// The write queue cannot hold one command per provide port
    QueueCapacity { required: usize, capacity: usize },
}

impl From<LayoutError> for ConfigError {
    fn from(value: LayoutError) -> Self {
        ConfigError::Layout(value)
    }
}

pub struct NodeData<'a, M: RawMutex> {
    name: &'a str,
    definition: &'a [u8],
    layout: NodeLayout<'a>,
    in_len: usize,
    out_len: usize,
    input: Mutex<M, RefCell<PortData<'a>>>,
    output: Mutex<M, RefCell<PortData<'a>>>,
    out_open: AtomicBool,
    delivery: Option<&'a (dyn Delivery + Sync)>,
    handler: Option<&'a (dyn InPortDataHandler + Sync)>,
}

impl<'a, M: RawMutex> NodeData<'a, M> {
    /// Binds caller-owned port data to a node.
    ///
    /// `definition` is the signal description text; it is carried as opaque bytes.
    /// Fails if the buffers do not match `layout` or if the configured write queue is too
    /// small to hold one command per provide port.
    pub fn new(
        name: &'a str,
        definition: &'a [u8],
        layout: NodeLayout<'a>,
        input: PortData<'a>,
        output: PortData<'a>,
        config: Config<'a>,
    ) -> Result<Self, ConfigError> {
        layout.validate()?;
        check_region(&layout, Direction::Require, &input)?;
        check_region(&layout, Direction::Provide, &output)?;

        if let Some(capacity) = config.delivery.and_then(|delivery| delivery.capacity()) {
            let required = layout.ports(Direction::Provide).len();
            if capacity < required {
                return Err(ConfigError::QueueCapacity { required, capacity });
            }
        }

        debug!(
            "node {}: {} in port bytes, {} out port bytes",
            name,
            input.len(),
            output.len()
        );

        Ok(Self {
            name,
            definition,
            layout,
            in_len: input.len(),
            out_len: output.len(),
            input: Mutex::new(RefCell::new(input)),
            output: Mutex::new(RefCell::new(output)),
            out_open: AtomicBool::new(config.out_open),
            delivery: config.delivery,
            handler: config.handler,
        })
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn definition(&self) -> &'a [u8] {
        self.definition
    }

    pub fn layout(&self) -> NodeLayout<'a> {
        self.layout
    }

    pub fn file_name(&self, kind: FileKind) -> FileName<'a> {
        FileName {
            node: self.name,
            kind,
        }
    }

    pub fn in_port_data_len(&self) -> usize {
        self.in_len
    }

    pub fn out_port_data_len(&self) -> usize {
        self.out_len
    }

    /// Whether a transport subscriber currently exists for the output data
    pub fn is_out_port_data_open(&self) -> bool {
        self.out_open.load(Ordering::Relaxed)
    }

    /// Runs `f` on the input data under the input lock.
    ///
    /// `f` must not access the input data of this node through any other path.
    pub fn with_in_port_data<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        self.input.lock(|cell| f(&cell.borrow().data[..]))
    }

    /// Runs `f` on the output data under the output lock.
    pub fn with_out_port_data<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        self.output.lock(|cell| f(&cell.borrow().data[..]))
    }

    /// Decodes the require port starting at `offset`.
    pub fn read_in_port<T: Unpack>(&self, offset: u32) -> Result<T, AccessError> {
        let port = self.typed_port(Direction::Require, offset, T::PACK_LEN)?;
        let range = span_range(port.span);
        Ok(self.with_in_port_data(|data| Unpacker::new(&data[range]).unpack()))
    }

    /// Decodes the current value of the provide port starting at `offset`.
    pub fn read_out_port<T: Unpack>(&self, offset: u32) -> Result<T, AccessError> {
        let port = self.typed_port(Direction::Provide, offset, T::PACK_LEN)?;
        let range = span_range(port.span);
        Ok(self.with_out_port_data(|data| Unpacker::new(&data[range]).unpack()))
    }

    /// Encodes `value` into the provide port starting at `offset`.
    pub fn write_out_port<T: Pack>(&self, offset: u32, value: &T) -> Result<(), AccessError> {
        let port = self.typed_port(Direction::Provide, offset, T::PACK_LEN)?;
        self.write_out_port_data(port.span, |bytes| Packer::new(bytes).pack(value))
    }

    /// Lets `f` fill `span` of the output data and completes the write.
    ///
    /// `span` must be non-empty and lie within a single provide port. The encode and the write-completion
    /// step share one critical section; the change is announced after the lock is released.
    pub fn write_out_port_data(
        &self,
        span: PortSpan,
        f: impl FnOnce(&mut [u8]),
    ) -> Result<(), AccessError> {
        let port = self
            .layout
            .port_containing(Direction::Provide, span.offset)
            .filter(|port| span.len > 0 && span.end() <= port.span.end())
            .ok_or_else(|| {
                warn!(
                    "node {}: write outside a single out port, offset={} len={}",
                    self.name, span.offset, span.len
                );
                AccessError::OutOfRange
            })?;
        let range = span_range(span);
        let marker = port.span.offset as usize;

        let announce = self.output.lock(|cell| {
            let mut region = cell.borrow_mut();
            f(&mut region.data[range]);
            let open = self.out_open.load(Ordering::Relaxed);
            dirty::complete_write(&mut region.markers[marker], span, open)
        });

        if let Some(span) = announce {
            self.notify_out_port_data(span);
        }
        Ok(())
    }

    /// Announces a changed output span to the delivery sink.
    ///
    /// Must be called without holding the output lock. Runs synchronously on the caller's
    /// execution context.
    pub fn notify_out_port_data(&self, span: PortSpan) {
        trace!(
            "node {}: out port data changed, offset={} len={}",
            self.name, span.offset, span.len
        );
        if let Some(delivery) = self.delivery {
            delivery.deliver(span);
        }
    }

    /// Returns whether the require port at `offset` received data since the last call,
    /// and marks it as seen.
    pub fn take_in_port_update(&self, offset: u32) -> Result<bool, AccessError> {
        let port = self.port(Direction::Require, offset)?;
        let marker = port.span.offset as usize;
        Ok(self
            .input
            .lock(|cell| dirty::acknowledge(&mut cell.borrow_mut().markers[..], marker)))
    }

    fn port(&self, direction: Direction, offset: u32) -> Result<&'a PortInfo, AccessError> {
        self.layout.port_at(direction, offset).ok_or_else(|| {
            warn!("node {}: no port starts at offset {}", self.name, offset);
            AccessError::NotPortStart
        })
    }

    fn typed_port(
        &self,
        direction: Direction,
        offset: u32,
        len: usize,
    ) -> Result<&'a PortInfo, AccessError> {
        let port = self.port(direction, offset)?;
        if port.span.len as usize != len {
            warn!(
                "node {}: port {} is {} bytes wide, value needs {}",
                self.name, port.name, port.span.len, len
            );
            return Err(AccessError::LengthMismatch);
        }
        Ok(port)
    }

    fn out_range(&self, offset: u32, len: usize) -> Result<Range<usize>, AccessError> {
        let len = u32::try_from(len).map_err(|_| AccessError::OutOfRange)?;
        PortSpan::new(offset, len)
            .range_within(self.out_len)
            .ok_or(AccessError::OutOfRange)
    }
}

impl<'a, M: RawMutex + Sync> NodeData<'a, M> {
    /// Transport handle
    pub fn link(&self) -> Link<'_> {
        Link::new(self)
    }
}

impl<M: RawMutex> DynamicRx for NodeData<'_, M> {
    fn write(&self, offset: u32, data: &[u8], more: bool) -> Result<(), AccessError> {
        let span = u32::try_from(data.len())
            .ok()
            .map(|len| PortSpan::new(offset, len))
            .filter(|span| span.range_within(self.in_len).is_some())
            .ok_or_else(|| {
                warn!(
                    "node {}: in port data write out of range, offset={} len={}",
                    self.name,
                    offset,
                    data.len()
                );
                AccessError::OutOfRange
            })?;
        let range = span_range(span);

        self.input.lock(|cell| {
            let written = {
                let mut region = cell.borrow_mut();
                region.data[range].copy_from_slice(data);
                for port in self.layout.ports_in(Direction::Require, span) {
                    dirty::mark(&mut region.markers[..], port.span.offset as usize);
                }
                let written = region.pending.map_or(span, |pending| merge(pending, span));
                region.pending = more.then_some(written);
                written
            };

            if !more {
                if let Some(handler) = self.handler {
                    handler.in_port_data_written(&cell.borrow().data[..], written);
                }
            }
        });
        Ok(())
    }
}

impl<M: RawMutex> DynamicTx for NodeData<'_, M> {
    fn is_open(&self) -> bool {
        self.is_out_port_data_open()
    }

    fn set_open(&self, open: bool) {
        self.output.lock(|cell| {
            let was_open = self.out_open.swap(open, Ordering::Relaxed);
            if open && !was_open {
                dirty::reset(&mut cell.borrow_mut().markers[..]);
                if let Some(delivery) = self.delivery {
                    delivery.reset();
                }
            }
        });
        if open {
            info!("node {}: out port data opened", self.name);
        } else {
            info!("node {}: out port data closed", self.name);
        }
    }

    fn read(&self, offset: u32, dst: &mut [u8]) -> Result<(), AccessError> {
        let range = self.out_range(offset, dst.len())?;
        self.with_out_port_data(|data| dst.copy_from_slice(&data[range]));
        Ok(())
    }

    fn consume(&self, offset: u32, dst: &mut [u8]) -> Result<(), AccessError> {
        let port = self.port(Direction::Provide, offset)?;
        if dst.len() > port.span.len as usize {
            warn!(
                "node {}: consume of {} bytes exceeds port {}",
                self.name,
                dst.len(),
                port.name
            );
            return Err(AccessError::OutOfRange);
        }
        let range = self.out_range(offset, dst.len())?;
        let marker = port.span.offset as usize;
        self.output.lock(|cell| {
            let mut region = cell.borrow_mut();
            dst.copy_from_slice(&region.data[range]);
            dirty::acknowledge(&mut region.markers[..], marker);
        });
        Ok(())
    }

    fn acknowledge(&self, offset: u32) -> Result<(), AccessError> {
        let port = self.port(Direction::Provide, offset)?;
        let marker = port.span.offset as usize;
        self.output
            .lock(|cell| dirty::acknowledge(&mut cell.borrow_mut().markers[..], marker));
        Ok(())
    }

    fn is_dirty(&self, offset: u32) -> Result<bool, AccessError> {
        let port = self.port(Direction::Provide, offset)?;
        let marker = port.span.offset as usize;
        Ok(self
            .output
            .lock(|cell| cell.borrow().markers[marker].is_dirty()))
    }
}

impl<M: RawMutex> DynamicLink for NodeData<'_, M> {}

fn check_region(
    layout: &NodeLayout<'_>,
    direction: Direction,
    region: &PortData<'_>,
) -> Result<(), ConfigError> {
    let expected = layout.data_len(direction);
    if region.data.len() != expected {
        return Err(ConfigError::DataLength {
            direction,
            expected,
            actual: region.data.len(),
        });
    }
    if region.markers.len() != expected {
        return Err(ConfigError::MarkerLength {
            direction,
            expected,
            actual: region.markers.len(),
        });
    }
    Ok(())
}

// Smallest span covering both
fn merge(a: PortSpan, b: PortSpan) -> PortSpan {
    let offset = a.offset.min(b.offset);
    PortSpan::new(offset, a.end().max(b.end()) - offset)
}

// Spans reaching here are validated against the buffer length
fn span_range(span: PortSpan) -> Range<usize> {
    span.offset as usize..span.end() as usize
}
