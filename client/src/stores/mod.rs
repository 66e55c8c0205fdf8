//! # Stores
//!
//! Observable state containers passed down the component tree instead of
//! living in globals. Each store owns one [`Store`] and, when persistent, a
//! [`Persisted`](crate::storage::Persisted) handle under its own namespace.

pub mod app_store;
pub mod booking_meta_store;
pub mod observable;
pub mod services_store;
pub mod settings_store;

pub use app_store::{AppState, AppStore};
pub use booking_meta_store::{build_booking_key, BookingMetaStore};
pub use observable::{Store, SubscriptionId};
pub use services_store::{ServicePatch, ServicesStore};
pub use settings_store::{SettingsError, SettingsStore};

/// Schema version written into every persisted envelope
pub const STORE_SCHEMA_VERSION: u32 = 1;
