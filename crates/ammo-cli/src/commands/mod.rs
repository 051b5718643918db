pub mod entries;
pub mod init;
pub mod inventory;
pub mod maintenance;
pub mod master;
pub mod misc;
