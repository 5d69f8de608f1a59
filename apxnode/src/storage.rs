use crate::core::PortState;
use crate::node_data::PortData;

/// Statically sized backing storage for both port data regions
///
/// `IN` and `OUT` are the total byte widths of the require and provide ports. The initial
/// images are the port init values packed by the signal compiler.
///
/// ```
/// use apxnode::storage::Storage;
/// use static_cell::StaticCell;
///
/// static STORAGE: StaticCell<Storage<7, 12>> = StaticCell::new();
/// let storage = STORAGE.init(Storage::new([0xff; 7], [0xff; 12]));
/// let (input, output) = storage.split();
/// assert_eq!(input.len(), 7);
/// assert_eq!(output.len(), 12);
/// ```
pub struct Storage<const IN: usize, const OUT: usize> {
    in_data: [u8; IN],
    in_markers: [PortState; IN],
    out_data: [u8; OUT],
    out_markers: [PortState; OUT],
}

impl<const IN: usize, const OUT: usize> Storage<IN, OUT> {
    pub const fn new(in_init: [u8; IN], out_init: [u8; OUT]) -> Self {
        Self {
            in_data: in_init,
            in_markers: [PortState::Clean; IN],
            out_data: out_init,
            out_markers: [PortState::Clean; OUT],
        }
    }

    pub fn split(&mut self) -> (PortData<'_>, PortData<'_>) {
        (
            PortData::new(&mut self.in_data, &mut self.in_markers),
            PortData::new(&mut self.out_data, &mut self.out_markers),
        )
    }
}
