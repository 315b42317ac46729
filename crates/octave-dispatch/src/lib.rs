pub mod protocol;
pub mod render;
pub mod scanner;
pub mod session;

pub use protocol::Command;
pub use render::{Format, Renderer};
pub use scanner::Scanner;
pub use session::{Exit, Session, SessionOptions};
