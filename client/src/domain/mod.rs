//! # Domain Module
//!
//! Screen models and flows. Each model owns the state its screen renders and
//! exposes async operations that talk to the [`ApiClient`](crate::io::ApiClient)
//! and update injected stores. Nothing here touches the DOM.

pub mod access_gate;
pub mod booking_sheet;
pub mod calendar_screen;
pub mod clients_screen;
pub mod ledger;
pub mod query_cache;
pub mod schedule_screen;
pub mod services_screen;
pub mod toast;

#[cfg(test)]
mod fixtures;

pub use access_gate::{AccessGate, AccessState, Sleeper};
pub use booking_sheet::{BookingForm, BookingFormError, BookingSheet};
pub use calendar_screen::{CalendarScreen, DayCell, TimelineRow};
pub use clients_screen::{
    group_clients, ClientGroup, ClientsError, ClientsScreen, ClientsState, RangePreset, Visit,
};
pub use ledger::{LedgerError, LedgerPanel, LedgerState, ADDED_MESSAGE, REMOVED_MESSAGE};
pub use query_cache::{InvalidateScope, QueryCache, QueryKey};
pub use schedule_screen::{
    Announcement, AnnouncementLine, ScheduleError, ScheduleScreen, ScheduleState, SlotSaveReport,
    SlotSegment,
};
pub use services_screen::{
    service_summary, ServiceDraft, ServiceDraftError, ServicesScreen, ServicesSheetState,
};
pub use toast::{Toast, ToastKind, ToastQueue};
