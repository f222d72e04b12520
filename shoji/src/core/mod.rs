mod application;
mod closed_cache;
mod config;
mod monitor;
mod state;
mod window;
mod workspace;

pub use application::*;
pub use closed_cache::*;
pub use config::*;
pub use monitor::*;
pub use state::*;
pub use window::*;
pub use workspace::*;
