mod app;
mod cli;
mod env;
mod history;
mod stream_renderer;

pub use app::App;
pub use cli::{Cli, TopLevelCommand};
pub use env::Environment;
pub use history::HistoryStore;
pub use stream_renderer::{ResponseWriter, term_width};
