//! Web content message bridge
//!
//! The single narrow waist between the embedded page and the native
//! capability controllers:
//! - protocol: inbound request and outbound event types
//! - dispatcher: parse, route and run controller tasks
//! - outbox: serialize and deliver events

pub mod dispatcher;
pub mod outbox;
pub mod protocol;

pub use dispatcher::{Bridge, Devices};
pub use outbox::{MessageSink, Outbox};
pub use protocol::{EventData, EventKind, InboundRequest, OutboundEvent, RequestKind};
