pub mod commands;
pub mod config;
pub mod history;
pub mod input;
pub mod interaction;
pub mod session;
pub mod shortcuts;

pub use commands::{Command, NodeMove};
pub use config::{CanvasConfig, EditorConfig, NewNodeTemplate};
pub use history::CommandManager;
pub use input::{InputEvent, Modifiers};
pub use interaction::{InteractionController, Mode, Reaction};
pub use session::{EditorSession, Feedback};
pub use shortcuts::{ShortcutAction, ShortcutMap};
