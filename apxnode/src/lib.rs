//! # APX node
//!
//! This library provides the port data runtime of an APX signal bus node in no_std
//! environments. Port values live in user-provided buffers; the library requires no dynamic
//! memory allocation.
//!
//! A node exchanges data with the bus through three files: the signal definition
//! (`<name>.apx`), the input data (`<name>.in`) and the output data (`<name>.out`). Each port
//! occupies a fixed byte range of its data file, assigned by the signal compiler.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌───────────────────────────┐
//! ┌──────┐  write │ NodeData                  │  read_in_port
//! │  Rx  ├───────►│ ┌───────────┐ input lock  │◄──────────── application
//! └──────┘        │ │ In data   │             │
//!                 │ └───────────┘             │
//! ┌──────┐ consume│ ┌───────────┐ output lock │  write_out_port
//! │  Tx  │◄───────┤ │ Out data  │             │◄──────────── application
//! └──────┘        │ └───────────┘             │
//!     ▲           └─────────────┬─────────────┘
//!     │  write command          │ notify (after unlock)
//!     │           ┌─────────────▼─────────────┐
//!     └───────────┤ Delivery: Push/WriteQueue │
//!                 └───────────────────────────┘
//! ```
//! Components:
//! * _NodeData_ owns the input and output data of one node. Each region has its own lock.
//! * _Link_ is the transport handle. Its `Rx` half stores bytes written by remote peers, its
//!   `Tx` half exposes the output data and its change state.
//! * _Delivery_ carries output change announcements to the transport, either as a direct
//!   callback or through a bounded write command queue.
//! * _Port handles_ bind a port offset to the value type the signal compiler generated.
//!
//! ## Concurrency model
//!
//! Every access to a data region runs inside a single critical section, so a multi-byte port
//! value is never observed half written. Change announcements run after the output lock is
//! released, on the writer's execution context. There are two mutex implementation options:
//! * _CriticalSectionRawMutex_ allows the application and the transport to run at different
//!   interrupt levels, but can add bounded priority inversion to the rest of the system.
//! * _ThreadModeRawMutex_ has no system-wide effects but requires all users of the node to run
//!   in a thread (non-interrupt) executor.
//!
//! Critical sections last for one buffer copy or one port encode.
//!
//! ## Limitations
//!
//! * Port data is restricted to fixed-size values; strings and dynamic arrays are not supported.
//! * Integers wider than 32 bits are not supported.
//! * Signal definitions are carried as opaque bytes and not parsed.
#![no_std]

pub use apxnode_core as core;
pub use apxnode_driver::link;
pub use apxnode_encoding as encoding;

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod config;
pub mod delivery;
mod dirty;
pub mod file;
pub mod handler;
pub mod node_data;
pub mod port;
pub mod storage;

pub use node_data::{ConfigError, NodeData, PortData};
