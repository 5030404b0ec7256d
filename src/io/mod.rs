pub mod config_io;
pub mod state;
pub mod storage;
