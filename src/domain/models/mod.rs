mod catalog;
mod citation;
mod event;
mod message;
mod role;
mod selection;
mod slash_commands;
mod transport;

pub use catalog::*;
pub use citation::*;
pub use event::*;
pub use message::*;
pub use role::*;
pub use selection::*;
pub use slash_commands::*;
pub use transport::*;
