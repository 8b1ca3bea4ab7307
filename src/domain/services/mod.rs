mod chat_session;
mod stream;

pub use chat_session::*;
pub use stream::*;
