//! Compiled port layout of a node
//!
//! The signal description compiler assigns each port a fixed offset within the port data
//! buffer of its direction. Ports follow each other in declaration order, starting at
//! offset zero, without padding.

use crate::PortSpan;

/// Port direction as seen by the node
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Input port, backed by the input (in-port) data buffer
    Require,
    /// Output port, backed by the output (out-port) data buffer
    Provide,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortInfo {
    pub name: &'static str,
    pub span: PortSpan,
}

impl PortInfo {
    pub const fn new(name: &'static str, offset: u32, len: u32) -> Self {
        Self {
            name,
            span: PortSpan::new(offset, len),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LayoutError {
    /// A port starts past the end of its predecessor
    Gap { direction: Direction, offset: u32 },
    /// A port starts before the end of its predecessor
    Overlap { direction: Direction, offset: u32 },
    /// A port occupies no bytes
    ZeroLength { direction: Direction, offset: u32 },
}

/// Require and provide port tables of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLayout<'a> {
    require: &'a [PortInfo],
    provide: &'a [PortInfo],
}

impl<'a> NodeLayout<'a> {
    pub const fn new(require: &'a [PortInfo], provide: &'a [PortInfo]) -> Self {
        Self { require, provide }
    }

    pub const fn ports(&self, direction: Direction) -> &'a [PortInfo] {
        match direction {
            Direction::Require => self.require,
            Direction::Provide => self.provide,
        }
    }

    /// Total byte width of the ports in the given direction
    pub fn data_len(&self, direction: Direction) -> usize {
        self.ports(direction)
            .last()
            .map_or(0, |port| port.span.end() as usize)
    }

    /// Checks that ports are contiguous, ordered, non-empty and start at zero
    pub fn validate(&self) -> Result<(), LayoutError> {
        for direction in [Direction::Require, Direction::Provide] {
            let mut expected = 0u32;
            for port in self.ports(direction) {
                let offset = port.span.offset;
                if port.span.len == 0 {
                    return Err(LayoutError::ZeroLength { direction, offset });
                }
                if offset > expected {
                    return Err(LayoutError::Gap { direction, offset });
                }
                if offset < expected {
                    return Err(LayoutError::Overlap { direction, offset });
                }
                expected = port.span.end();
            }
        }
        Ok(())
    }

    /// Looks up the port whose start offset is exactly `offset`
    pub fn port_at(&self, direction: Direction, offset: u32) -> Option<&'a PortInfo> {
        let ports = self.ports(direction);
        let idx = ports
            .binary_search_by_key(&offset, |port| port.span.offset)
            .ok()?;
        Some(&ports[idx])
    }

    /// Looks up the port covering `offset`
    pub fn port_containing(&self, direction: Direction, offset: u32) -> Option<&'a PortInfo> {
        let ports = self.ports(direction);
        let idx = first_ending_after(ports, offset);
        ports.get(idx).filter(|port| port.span.contains(offset))
    }

    /// Ports touched by the byte span, in offset order
    pub fn ports_in(&self, direction: Direction, span: PortSpan) -> Ports<'a> {
        let ports = self.ports(direction);
        let first = first_ending_after(ports, span.offset);
        Ports {
            ports: &ports[first..],
            span,
        }
    }
}

// Index of the first port that ends after `offset`; ports must be sorted and disjoint
fn first_ending_after(ports: &[PortInfo], offset: u32) -> usize {
    ports.partition_point(|port| port.span.end() <= offset)
}

/// Iterator over the ports overlapping a byte span
#[derive(Debug, Clone)]
pub struct Ports<'a> {
    ports: &'a [PortInfo],
    span: PortSpan,
}

impl<'a> Iterator for Ports<'a> {
    type Item = &'a PortInfo;

    fn next(&mut self) -> Option<Self::Item> {
        let (port, rest) = self.ports.split_first()?;
        if !port.span.overlaps(self.span) {
            self.ports = &[];
            return None;
        }
        self.ports = rest;
        Some(port)
    }
}
