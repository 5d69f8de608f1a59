//! Per-port change state tracking
//!
//! Markers are indexed by byte offset; only the start offset of a port is ever read or
//! written. Every function here runs while the caller holds the lock of the region that
//! owns the markers.

use crate::core::{PortSpan, PortState};

/// Write-completion step of an output port write.
///
/// Transitions the port `Clean -> Dirty` when a subscriber exists and returns the span
/// to announce. Writes to a port that is already `Dirty`, or that happen while no subscriber
/// exists, are coalesced: the buffer already holds the latest value and nothing is announced.
/// The announced span is never widened to cover later writes.
///
/// `marker` is the state of the port that contains `span`.
pub(crate) fn complete_write(
    marker: &mut PortState,
    span: PortSpan,
    open: bool,
) -> Option<PortSpan> {
    if *marker == PortState::Clean && open {
        *marker = PortState::Dirty;
        Some(span)
    } else {
        None
    }
}

/// `Dirty -> Clean`. Returns whether the port was dirty.
pub(crate) fn acknowledge(markers: &mut [PortState], offset: usize) -> bool {
    core::mem::take(&mut markers[offset]).is_dirty()
}

/// Marks the port starting at `offset` as updated.
pub(crate) fn mark(markers: &mut [PortState], offset: usize) {
    markers[offset] = PortState::Dirty;
}

pub(crate) fn reset(markers: &mut [PortState]) {
    markers.fill(PortState::Clean);
}
