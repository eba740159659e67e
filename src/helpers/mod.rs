pub mod directories;
pub mod filesystem;
pub mod unarchive;
