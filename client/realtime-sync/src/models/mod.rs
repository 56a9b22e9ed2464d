pub mod connectivity;
pub mod event;
pub mod notification;
pub mod status;

pub use connectivity::{ConnectivitySignal, ConnectivitySnapshot};
pub use event::{ClientMessage, EventKind, InboundEvent, ServerMessage};
pub use notification::{Notification, NotificationCategory};
pub use status::{ConnectionState, ConnectionStatus, DisconnectCause};
