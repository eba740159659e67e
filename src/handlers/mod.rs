pub mod cleanup_handler;
pub mod download_handler;
