//! Models shared by every screen. `App` builds them once and hands the
//! [`AppContext`] handle to each screen as a prop.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Local;
use gloo::timers::future::TimeoutFuture;
use manik_client::domain::{
    BookingSheet, CalendarScreen, ClientsScreen, LedgerPanel, QueryCache, ScheduleScreen,
    ServicesScreen, ToastQueue,
};
use manik_client::io::{ApiClient, InitDataSource, LedgerKind};
use manik_client::storage::KeyValueStore;
use manik_client::stores::{AppStore, BookingMetaStore, ServicesStore, SettingsStore};
use manik_client::ClientConfig;
use shared::{format_iso_date, MonthCursor};
use wasm_bindgen_futures::spawn_local;
use yew::Callback;

use crate::services::local_storage::BrowserStore;
use crate::services::logging::Logger;
use crate::services::telegram;
use crate::services::transport::FetchTransport;

fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

/// Toast queue plus a re-render trigger for the toast host
#[derive(Clone)]
pub struct Toasts {
    queue: Rc<RefCell<ToastQueue>>,
    notify: Rc<RefCell<Option<Callback<()>>>>,
}

impl Toasts {
    fn new() -> Self {
        Self {
            queue: Rc::new(RefCell::new(ToastQueue::new())),
            notify: Rc::new(RefCell::new(None)),
        }
    }

    /// Register the component that renders toasts
    pub fn set_listener(&self, listener: Option<Callback<()>>) {
        *self.notify.borrow_mut() = listener;
    }

    fn changed(&self) {
        let listener = self.notify.borrow().clone();
        if let Some(listener) = listener {
            listener.emit(());
        }
    }

    fn schedule_expiry(&self, delay_ms: u64) {
        let toasts = self.clone();
        spawn_local(async move {
            TimeoutFuture::new(delay_ms as u32).await;
            let expired = toasts.queue.borrow_mut().expire(now_ms());
            if expired {
                toasts.changed();
            }
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        let delay = self.queue.borrow_mut().info(message, now_ms()).kind.duration_ms();
        self.changed();
        self.schedule_expiry(delay);
    }

    pub fn error(&self, message: impl Into<String>) {
        let delay = self.queue.borrow_mut().error(message, now_ms()).kind.duration_ms();
        self.changed();
        self.schedule_expiry(delay);
    }

    pub fn failure(&self, err: &impl std::fmt::Display) {
        let message = err.to_string();
        Logger::error_with_component("toast", &message);
        self.error(message);
    }

    /// `(message, is_error)` of the toast to render now
    pub fn visible(&self) -> Option<(String, bool)> {
        self.queue.borrow().visible(now_ms()).map(|toast| {
            (
                toast.message.clone(),
                toast.kind == manik_client::domain::ToastKind::Error,
            )
        })
    }

    pub fn dismiss(&self) {
        let id = self.queue.borrow().visible(now_ms()).map(|t| t.id);
        if let Some(id) = id {
            self.queue.borrow_mut().dismiss(id);
            self.changed();
        }
    }
}

pub struct Models {
    pub config: ClientConfig,
    pub today: String,
    pub api: ApiClient,
    pub cache: QueryCache,
    pub app: AppStore,
    pub settings: SettingsStore,
    pub services: ServicesStore,
    pub booking_sheet: BookingSheet,
    pub calendar: CalendarScreen,
    pub schedule: ScheduleScreen,
    pub clients: ClientsScreen,
    pub services_screen: ServicesScreen,
    pub salary: LedgerPanel,
    pub expenses: LedgerPanel,
    pub toasts: Toasts,
}

/// Cheap handle to [`Models`]; equality is identity
#[derive(Clone)]
pub struct AppContext(Rc<Models>);

impl PartialEq for AppContext {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::ops::Deref for AppContext {
    type Target = Models;

    fn deref(&self) -> &Models {
        &self.0
    }
}

impl AppContext {
    pub fn new(config: ClientConfig) -> Self {
        let today = format_iso_date(Local::now().date_naive());
        let cursor = MonthCursor::from_iso_date(&today).unwrap_or(MonthCursor {
            year: 2025,
            month: 1,
        });

        let init_data: Rc<dyn InitDataSource> = Rc::new(telegram::init_data);
        let api = ApiClient::new(config.api_base.clone(), Rc::new(FetchTransport), init_data);
        let storage: Rc<dyn KeyValueStore> = Rc::new(BrowserStore);
        let cache = QueryCache::new();
        let app = AppStore::new(&today);
        let settings = SettingsStore::new(storage.clone(), &config.namespace("settings"));
        let services = ServicesStore::new(storage.clone(), &config.namespace("services"));
        let meta = BookingMetaStore::new(storage, &config.namespace("booking-meta"));

        let booking_sheet = BookingSheet::new(
            api.clone(),
            cache.clone(),
            app.clone(),
            services.clone(),
            settings.clone(),
            meta,
        );
        let calendar = CalendarScreen::new(
            api.clone(),
            cache.clone(),
            app.clone(),
            settings.clone(),
            &today,
        );

        Self(Rc::new(Models {
            schedule: ScheduleScreen::new(api.clone(), cache.clone(), cursor),
            clients: ClientsScreen::new(api.clone(), cache.clone(), &today),
            services_screen: ServicesScreen::new(services.clone()),
            salary: LedgerPanel::new(LedgerKind::Salary, api.clone(), cache.clone(), cursor),
            expenses: LedgerPanel::new(LedgerKind::Expenses, api.clone(), cache.clone(), cursor),
            toasts: Toasts::new(),
            config,
            today,
            api,
            cache,
            app,
            settings,
            services,
            booking_sheet,
            calendar,
        }))
    }
}
