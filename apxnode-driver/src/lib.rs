//! APX node transport interface
//!
//! The crate provides an interface between a transport (network or serial file manager) and
//! the node port data. Limited scope facilitates compatibility across versions.
//! Transport crates should depend on this crate. Application code should depend on the
//! `apxnode` crate instead.
//!
//! A `Link` encompasses two channels:
//! * `Rx` consumes inbound port data written by remote peers
//! * `Tx` exposes outbound port data and its change state
//!
//! Outbound changes are announced through the delivery sink configured on the node
//! (a push callback or a bounded write queue). Each announcement leaves the port `Dirty`;
//! the transport must call `Tx::consume` or `Tx::acknowledge` once it has sent the bytes,
//! otherwise further writes to that port stay silent.

#![no_std]

pub mod internal;
pub mod link;

pub use apxnode_core::{AccessError, PortSpan};
