use crate::delivery::Delivery;
use crate::handler::InPortDataHandler;

/// Node data configuration
///
/// ```
/// use apxnode::config::Config;
/// use apxnode::core::PortSpan;
/// use apxnode::delivery::Push;
///
/// let sink = Push(|_span: PortSpan| {});
/// let config = Config::default().with_delivery(&sink).with_out_open(true);
/// assert!(config.out_open);
/// ```
#[derive(Clone, Copy, Default)]
#[non_exhaustive]
pub struct Config<'a> {
    /// Sink for output change announcements. Without a sink, changes are only tracked.
    pub delivery: Option<&'a (dyn Delivery + Sync)>,
    /// Extension point invoked after each complete inbound write
    pub handler: Option<&'a (dyn InPortDataHandler + Sync)>,
    /// Initial state of the output-open flag
    pub out_open: bool,
}

impl<'a> Config<'a> {
    pub fn with_delivery(mut self, delivery: &'a (dyn Delivery + Sync)) -> Self {
        self.delivery = Some(delivery);
        self
    }

    pub fn with_handler(mut self, handler: &'a (dyn InPortDataHandler + Sync)) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn with_out_open(mut self, out_open: bool) -> Self {
        self.out_open = out_open;
        self
    }
}
