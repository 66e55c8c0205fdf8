pub mod use_access_gate;
pub mod use_subscription;

pub use use_access_gate::use_access_gate;
pub use use_subscription::{use_shared_stores, use_subscription};
