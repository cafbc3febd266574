//! Request handlers.

pub mod health;
pub mod process_frame;
pub mod proxy;

pub use health::*;
pub use process_frame::*;
pub use proxy::*;
