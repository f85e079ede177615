mod error;
mod history;
mod message;

pub use error::*;
pub use history::*;
pub use message::*;
