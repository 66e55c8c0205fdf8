//! # Booking Sheet
//!
//! Modal form that creates, edits or deletes one booking.
//!
//! Opening the sheet loads the selected day's bookings (to find the one
//! being edited) and the trailing year of bookings (to autofill names from
//! contact handles). A successful submit moves the local annotation to the
//! booking's new composite key, invalidates client queries and closes the
//! sheet. A failed submit leaves the form exactly as typed.

use log::{debug, info, warn};
use shared::{
    add_days, normalize_time_input, parse_iso_date, round_time, Booking, BookingMeta,
    BookingPayload, PrepaymentChoice, ServiceItem,
};
use thiserror::Error;

use super::query_cache::{InvalidateScope, QueryCache, QueryKey};
use crate::io::{ApiClient, ApiError};
use crate::stores::{
    build_booking_key, AppStore, BookingMetaStore, ServicesStore, SettingsStore, Store,
    SubscriptionId,
};

/// Days of history loaded for name autofill
pub const HISTORY_DAYS: i64 = 365;

const DEFAULT_DURATION_MINUTES: u32 = 60;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BookingFormError {
    #[error("Укажите имя клиента")]
    MissingName,
    #[error("Укажите ссылку на клиента")]
    MissingLink,
    #[error("Укажите время записи")]
    MissingTime,
    #[error("Некорректное время: {0}")]
    InvalidTime(String),
    #[error("Некорректная дата: {0}")]
    InvalidDate(String),
    #[error("Некорректная сумма предоплаты: {0}")]
    InvalidPrepayment(String),
    #[error("Подтвердите удаление записи")]
    NotConfirmed,
    #[error("Запись не выбрана")]
    NothingToDelete,
    #[error("Запись уже сохраняется")]
    Busy,
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BookingForm {
    pub service_id: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub time: String,
    pub duration_minutes: u32,
    pub name: String,
    pub link: String,
    pub comment: String,
    pub prepayment: PrepaymentChoice,
}

impl BookingForm {
    /// Validate and build the request body
    pub fn to_payload(&self) -> Result<BookingPayload, BookingFormError> {
        let name = self.name.trim();
        let link = self.link.trim();
        let time = self.time.trim();
        if name.is_empty() {
            return Err(BookingFormError::MissingName);
        }
        if link.is_empty() {
            return Err(BookingFormError::MissingLink);
        }
        if time.is_empty() {
            return Err(BookingFormError::MissingTime);
        }
        let normalized = normalize_time_input(time);
        if normalized.is_empty() {
            return Err(BookingFormError::InvalidTime(time.to_string()));
        }
        if parse_iso_date(&self.date).is_none() {
            return Err(BookingFormError::InvalidDate(self.date.clone()));
        }

        Ok(BookingPayload {
            name: name.to_string(),
            link: link.to_string(),
            time: normalized,
            date: self.date.clone(),
            prepayment: self.prepayment.to_wire(),
        })
    }

    /// Local annotation for the booking; blank fields are left out
    pub fn meta(&self) -> BookingMeta {
        let comment = self.comment.trim();
        BookingMeta {
            service_id: (!self.service_id.is_empty()).then(|| self.service_id.clone()),
            duration_minutes: (self.duration_minutes > 0).then_some(self.duration_minutes),
            comment: (!comment.is_empty()).then(|| comment.to_string()),
        }
    }
}

/// Parse the prepayment amount field; blank is zero
pub fn parse_prepayment_amount(text: &str) -> Result<f64, BookingFormError> {
    let text = text.trim().replace(',', ".");
    if text.is_empty() {
        return Ok(0.0);
    }
    match text.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount >= 0.0 => Ok(amount),
        _ => Err(BookingFormError::InvalidPrepayment(text)),
    }
}

/// Parse the prepayment amount field as a wire choice; blank means no prepayment
pub fn parse_prepayment(text: &str) -> Result<PrepaymentChoice, BookingFormError> {
    parse_prepayment_amount(text).map(|amount| PrepaymentChoice::from_wire(Some(amount)))
}

fn amount_text(choice: &PrepaymentChoice) -> String {
    match choice {
        PrepaymentChoice::Amount(amount) => amount.to_string(),
        _ => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BookingSheetState {
    pub form: BookingForm,
    /// Booking being edited, resolved from the day's bookings
    pub editing: Option<Booking>,
    pub day_bookings: Vec<Booking>,
    pub known_clients: Vec<Booking>,
    /// Amount field as typed
    pub prepayment_text: String,
    /// The amount field holds text that is not a valid amount
    pub prepayment_invalid: bool,
    pub loading: bool,
    pub submitting: bool,
    pub confirm_delete: bool,
}

#[derive(Clone)]
pub struct BookingSheet {
    api: ApiClient,
    cache: QueryCache,
    app: AppStore,
    services: ServicesStore,
    settings: SettingsStore,
    meta: BookingMetaStore,
    state: Store<BookingSheetState>,
}

impl BookingSheet {
    pub fn new(
        api: ApiClient,
        cache: QueryCache,
        app: AppStore,
        services: ServicesStore,
        settings: SettingsStore,
        meta: BookingMetaStore,
    ) -> Self {
        Self {
            api,
            cache,
            app,
            services,
            settings,
            meta,
            state: Store::new(BookingSheetState::default()),
        }
    }

    pub fn state(&self) -> BookingSheetState {
        self.state.get()
    }

    pub fn form(&self) -> BookingForm {
        self.state.with(|s| s.form.clone())
    }

    pub fn subscribe(&self, listener: impl Fn(&BookingSheetState) + 'static) -> SubscriptionId {
        self.state.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }

    pub fn is_editing(&self) -> bool {
        self.state.with(|s| s.editing.is_some())
    }

    pub fn title(&self) -> &'static str {
        if self.is_editing() {
            "Редактирование записи"
        } else {
            "Новая запись"
        }
    }

    /// Text of the Telegram MainButton while the sheet is open
    pub fn main_button_text(&self) -> &'static str {
        if self.is_editing() {
            "Сохранить запись"
        } else {
            "Создать запись"
        }
    }

    pub fn services(&self) -> Vec<ServiceItem> {
        self.services.list()
    }

    /// Load the day and history, then pre-fill the form.
    ///
    /// The form is filled even when a load fails; the first error is returned
    /// for a toast.
    pub async fn open(&self, today: &str) -> Result<(), ApiError> {
        let date = self.app.selected_date();
        self.state.update(|s| {
            s.loading = true;
            s.confirm_delete = false;
        });

        let day = self
            .cache
            .get_or_fetch(QueryKey::ClientsByDay(date.clone()), || {
                self.api.clients_by_day(&date)
            })
            .await;

        let start = add_days(today, -HISTORY_DAYS).unwrap_or_else(|| today.to_string());
        let end = today.to_string();
        let history = self
            .cache
            .get_or_fetch(
                QueryKey::ClientsByRange {
                    start: start.clone(),
                    end: end.clone(),
                },
                || self.api.clients_by_range(&start, &end),
            )
            .await;

        let mut first_error = None;
        let day_bookings = day.unwrap_or_else(|e| {
            warn!("Failed to load bookings for {}: {}", date, e);
            first_error.get_or_insert(e);
            Vec::new()
        });
        let known_clients = history.unwrap_or_else(|e| {
            warn!("Failed to load booking history: {}", e);
            first_error.get_or_insert(e);
            Vec::new()
        });
        debug!(
            "Booking sheet loaded {} day bookings, {} known clients",
            day_bookings.len(),
            known_clients.len()
        );

        self.state.update(|s| {
            s.day_bookings = day_bookings;
            s.known_clients = known_clients;
            s.loading = false;
        });
        self.prefill();

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Reset the form from the app store: the edited booking and its
    /// annotation, or a blank booking at the draft slot
    pub fn prefill(&self) {
        let app = self.app.state();
        let services = self.services.list();
        let step = self.settings.get().slot_step.minutes();
        let default_service = services.first();

        let editing = app.editing_booking_id.and_then(|id| {
            self.state
                .with(|s| s.day_bookings.iter().find(|b| b.id == id).cloned())
        });

        let form = match &editing {
            Some(booking) => {
                let key = build_booking_key(&booking.date, &booking.time, &booking.link);
                let meta = self.meta.meta_for(&key).unwrap_or_default();
                let service_id = meta
                    .service_id
                    .clone()
                    .or_else(|| default_service.map(|s| s.id.clone()))
                    .unwrap_or_default();
                let duration_minutes = meta
                    .duration_minutes
                    .or_else(|| {
                        services
                            .iter()
                            .find(|s| s.id == service_id)
                            .map(|s| s.duration_minutes)
                    })
                    .unwrap_or(DEFAULT_DURATION_MINUTES);
                BookingForm {
                    service_id,
                    date: booking.date.clone(),
                    time: booking.normalized_time(),
                    duration_minutes,
                    name: booking.name.clone(),
                    link: booking.link.clone(),
                    comment: meta.comment.unwrap_or_default(),
                    prepayment: PrepaymentChoice::from_wire(booking.prepayment),
                }
            }
            None => {
                let time = app
                    .draft_time
                    .as_deref()
                    .map(|draft| {
                        let rounded = round_time(draft, step);
                        if rounded.is_empty() {
                            draft.to_string()
                        } else {
                            rounded
                        }
                    })
                    .unwrap_or_default();
                BookingForm {
                    service_id: default_service.map(|s| s.id.clone()).unwrap_or_default(),
                    date: app.selected_date.clone(),
                    time,
                    duration_minutes: default_service
                        .map(|s| s.duration_minutes)
                        .unwrap_or(DEFAULT_DURATION_MINUTES),
                    ..BookingForm::default()
                }
            }
        };

        if app.editing_booking_id.is_some() && editing.is_none() {
            warn!("Booking {:?} not found on {}", app.editing_booking_id, app.selected_date);
        }

        self.state.update(|s| {
            s.prepayment_text = amount_text(&form.prepayment);
            s.prepayment_invalid = false;
            s.editing = editing;
            s.form = form;
        });
    }

    pub fn edit_form(&self, f: impl FnOnce(&mut BookingForm)) {
        self.state.update(|s| f(&mut s.form));
    }

    /// Choose a service; its duration replaces the current one
    pub fn select_service(&self, service_id: &str) {
        let duration = self.services.find(service_id).map(|s| s.duration_minutes);
        self.edit_form(|form| {
            form.service_id = service_id.to_string();
            if let Some(duration) = duration {
                form.duration_minutes = duration;
            }
        });
    }

    /// Update the contact handle; an empty name is filled from known bookings
    pub fn set_link(&self, link: &str) {
        self.state.update(|s| {
            s.form.link = link.to_string();
            let handle = link.trim();
            if handle.is_empty() || !s.form.name.trim().is_empty() {
                return;
            }
            let known = s
                .known_clients
                .iter()
                .chain(s.day_bookings.iter())
                .find(|b| b.link.trim() == handle);
            if let Some(known) = known {
                debug!("Autofilled name for {}", handle);
                s.form.name = known.name.clone();
            }
        });
    }

    pub fn set_prepayment(&self, choice: PrepaymentChoice) {
        self.state.update(|s| {
            if let PrepaymentChoice::Amount(_) = choice {
                s.prepayment_text = amount_text(&choice);
            }
            s.prepayment_invalid = false;
            s.form.prepayment = choice;
        });
    }

    /// Edit the amount field. The form always follows the text: blank is a
    /// zero amount and unparseable text blocks submit until corrected.
    pub fn set_prepayment_text(&self, text: &str) {
        let parsed = parse_prepayment_amount(text);
        self.state.update(|s| {
            s.prepayment_text = text.to_string();
            s.prepayment_invalid = parsed.is_err();
            s.form.prepayment = PrepaymentChoice::Amount(parsed.unwrap_or(0.0));
        });
    }

    /// Create or update the booking
    pub async fn submit(&self) -> Result<(), BookingFormError> {
        let (form, editing, submitting, invalid_amount) = self.state.with(|s| {
            (
                s.form.clone(),
                s.editing.clone(),
                s.submitting,
                s.prepayment_invalid.then(|| s.prepayment_text.trim().to_string()),
            )
        });
        if submitting {
            return Err(BookingFormError::Busy);
        }
        if let Some(text) = invalid_amount {
            return Err(BookingFormError::InvalidPrepayment(text));
        }
        let payload = form.to_payload()?;

        self.state.update(|s| s.submitting = true);
        let result = match &editing {
            Some(booking) => self.api.update_booking(booking.id, &payload).await,
            None => self.api.create_booking(&payload).await,
        };
        self.state.update(|s| s.submitting = false);
        result?;

        info!(
            "Booking {} for {} at {} {}",
            if editing.is_some() { "updated" } else { "created" },
            payload.link,
            payload.date,
            payload.time
        );

        let new_key = build_booking_key(&payload.date, &payload.time, &payload.link);
        let old_key = editing
            .as_ref()
            .map(|b| build_booking_key(&b.date, &b.time, &b.link));
        if let Err(e) = self.meta.move_meta(old_key.as_deref(), &new_key, form.meta()) {
            warn!("Booking saved but annotation was not: {:#}", e);
        }

        self.cache.invalidate(InvalidateScope::Clients);
        self.app.close_booking();
        Ok(())
    }

    /// First step of deletion; returns `false` when nothing is being edited
    pub fn request_delete(&self) -> bool {
        self.state.update(|s| {
            s.confirm_delete = s.editing.is_some();
            s.confirm_delete
        })
    }

    pub fn cancel_delete(&self) {
        self.state.update(|s| s.confirm_delete = false);
    }

    /// Delete the edited booking once confirmed
    pub async fn delete(&self) -> Result<(), BookingFormError> {
        let (editing, confirmed) = self.state.with(|s| (s.editing.clone(), s.confirm_delete));
        let booking = editing.ok_or(BookingFormError::NothingToDelete)?;
        if !confirmed {
            return Err(BookingFormError::NotConfirmed);
        }

        self.api.delete_booking(booking.id).await?;
        info!("Booking {} deleted", booking.id);

        let key = build_booking_key(&booking.date, &booking.time, &booking.link);
        if let Err(e) = self.meta.clear_meta(&key) {
            warn!("Failed to clear annotation {}: {:#}", key, e);
        }
        self.state.update(|s| s.confirm_delete = false);
        self.cache.invalidate(InvalidateScope::Clients);
        self.app.close_booking();
        Ok(())
    }
}
