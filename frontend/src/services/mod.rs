pub mod local_storage;
pub mod logging;
pub mod telegram;
pub mod transport;
