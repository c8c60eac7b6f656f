pub mod clipboard;
pub mod error;
pub mod id;
pub mod model;
pub mod persist;

pub use clipboard::ClipboardData;
pub use error::{ConnectError, PersistError};
pub use id::{EdgeId, NodeId};
pub use model::*;
