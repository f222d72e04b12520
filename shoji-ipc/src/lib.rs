pub mod command;
pub mod event;
pub mod layout;

pub use command::{Command, Response, WindowInfo, WorkspaceInfo};
pub use event::{EventFilter, StateEvent, SubscribeRequest};
pub use layout::{LayoutKind, LayoutMessage, LayoutResult, WindowGeometry};
