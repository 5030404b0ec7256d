pub mod config;
pub mod now;
pub mod task;
pub mod view;

pub use config::*;
pub use now::*;
pub use task::*;
pub use view::*;
