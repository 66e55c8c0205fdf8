//! Ephemeral navigation state: active tab, selected day and the booking sheet.

use log::debug;
use shared::ScreenKey;

use super::observable::{Store, SubscriptionId};

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub active_screen: ScreenKey,
    /// `YYYY-MM-DD`
    pub selected_date: String,
    pub booking_open: bool,
    /// `None` while creating a new booking
    pub editing_booking_id: Option<i64>,
    /// Timeline slot the sheet was opened from
    pub draft_time: Option<String>,
}

impl AppState {
    pub fn new(today: &str) -> Self {
        Self {
            active_screen: ScreenKey::default(),
            selected_date: today.to_string(),
            booking_open: false,
            editing_booking_id: None,
            draft_time: None,
        }
    }
}

#[derive(Clone)]
pub struct AppStore {
    state: Store<AppState>,
}

impl AppStore {
    pub fn new(today: &str) -> Self {
        Self {
            state: Store::new(AppState::new(today)),
        }
    }

    pub fn state(&self) -> AppState {
        self.state.get()
    }

    pub fn active_screen(&self) -> ScreenKey {
        self.state.with(|s| s.active_screen)
    }

    pub fn selected_date(&self) -> String {
        self.state.with(|s| s.selected_date.clone())
    }

    pub fn set_screen(&self, screen: ScreenKey) {
        debug!("Switching to {:?} screen", screen);
        self.state.update(|s| s.active_screen = screen);
    }

    pub fn select_date(&self, date: &str) {
        self.state.update(|s| s.selected_date = date.to_string());
    }

    /// Open the booking sheet for a new booking (optionally at a slot) or an existing one
    pub fn open_booking(&self, booking_id: Option<i64>, time: Option<&str>) {
        debug!("Opening booking sheet: id={:?} time={:?}", booking_id, time);
        self.state.update(|s| {
            s.booking_open = true;
            s.editing_booking_id = booking_id;
            s.draft_time = time.map(str::to_string);
        });
    }

    pub fn close_booking(&self) {
        self.state.update(|s| {
            s.booking_open = false;
            s.editing_booking_id = None;
            s.draft_time = None;
        });
    }

    pub fn subscribe(&self, listener: impl Fn(&AppState) + 'static) -> SubscriptionId {
        self.state.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }
}
