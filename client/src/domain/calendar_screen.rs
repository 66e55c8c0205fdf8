//! Calendar screen: month grid with booking marks, the selected day's
//! bookings and a timeline of working slots.

use std::collections::BTreeSet;

use log::{debug, warn};
use shared::{add_days, format_date_title, iso_weekday, parse_iso_date, Booking, MonthCursor};

use super::query_cache::{QueryCache, QueryKey};
use crate::io::{ApiClient, ApiError};
use crate::stores::{AppStore, SettingsStore, Store, SubscriptionId};

#[derive(Debug, Clone, PartialEq)]
pub struct DayCell {
    pub day: u32,
    pub iso: String,
    pub selected: bool,
    /// Has at least one booking
    pub marked: bool,
    pub today: bool,
    pub weekend: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineRow {
    /// `HH:MM`
    pub time: String,
    /// Time in the configured clock format
    pub label: String,
    pub booking: Option<Booking>,
}

impl TimelineRow {
    pub fn is_free(&self) -> bool {
        self.booking.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarState {
    pub cursor: MonthCursor,
    pub marked_days: BTreeSet<u32>,
    /// Selected day's bookings, time-normalized and sorted
    pub day_bookings: Vec<Booking>,
    pub today_bookings: Vec<Booking>,
    pub loading: bool,
}

#[derive(Clone)]
pub struct CalendarScreen {
    api: ApiClient,
    cache: QueryCache,
    app: AppStore,
    settings: SettingsStore,
    today: String,
    state: Store<CalendarState>,
}

/// Normalize booking times and sort by them
pub fn sort_bookings(bookings: Vec<Booking>) -> Vec<Booking> {
    let mut bookings: Vec<Booking> = bookings
        .into_iter()
        .map(|mut booking| {
            booking.time = booking.normalized_time();
            booking
        })
        .collect();
    bookings.sort_by(|a, b| a.time.cmp(&b.time));
    bookings
}

impl CalendarScreen {
    pub fn new(
        api: ApiClient,
        cache: QueryCache,
        app: AppStore,
        settings: SettingsStore,
        today: &str,
    ) -> Self {
        let cursor = MonthCursor::from_iso_date(&app.selected_date())
            .or_else(|| MonthCursor::from_iso_date(today))
            .unwrap_or(MonthCursor { year: 2025, month: 1 });
        Self {
            api,
            cache,
            app,
            settings,
            today: today.to_string(),
            state: Store::new(CalendarState {
                cursor,
                marked_days: BTreeSet::new(),
                day_bookings: Vec::new(),
                today_bookings: Vec::new(),
                loading: false,
            }),
        }
    }

    pub fn state(&self) -> CalendarState {
        self.state.get()
    }

    pub fn subscribe(&self, listener: impl Fn(&CalendarState) + 'static) -> SubscriptionId {
        self.state.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }

    pub fn selected_date(&self) -> String {
        self.app.selected_date()
    }

    /// `"пт, 13 июня"` for the selected day
    pub fn title(&self) -> String {
        format_date_title(&self.selected_date())
    }

    pub fn month_label(&self) -> String {
        self.state.with(|s| s.cursor.label())
    }

    /// Load the selected day, today and the cursor month's marks
    pub async fn refresh(&self) -> Result<(), ApiError> {
        self.sync_cursor();
        let date = self.selected_date();
        let cursor = self.state.with(|s| s.cursor);
        self.state.update(|s| s.loading = true);

        let day = self
            .cache
            .get_or_fetch(QueryKey::ClientsByDay(date.clone()), || {
                self.api.clients_by_day(&date)
            })
            .await;
        let today = self
            .cache
            .get_or_fetch(QueryKey::ClientsByDay(self.today.clone()), || {
                self.api.clients_by_day(&self.today)
            })
            .await;
        let marked = self
            .cache
            .get_or_fetch(
                QueryKey::MarkedDays {
                    year: cursor.year,
                    month: cursor.month,
                },
                || self.api.marked_days(cursor.year, cursor.month),
            )
            .await;

        let mut first_error = None;
        self.state.update(|s| {
            s.loading = false;
            match day {
                Ok(bookings) => s.day_bookings = sort_bookings(bookings),
                Err(e) => {
                    warn!("Failed to load bookings for {}: {}", date, e);
                    first_error.get_or_insert(e);
                }
            }
            match today {
                Ok(bookings) => s.today_bookings = sort_bookings(bookings),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
            match marked {
                Ok(days) => s.marked_days = days.into_iter().collect(),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        });

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Keep the month cursor on the selected day's month
    fn sync_cursor(&self) {
        if let Some(cursor) = MonthCursor::from_iso_date(&self.selected_date()) {
            if self.state.with(|s| s.cursor) != cursor {
                debug!("Calendar cursor follows selection to {}", cursor);
                self.state.update(|s| s.cursor = cursor);
            }
        }
    }

    pub fn grid(&self) -> Vec<Option<DayCell>> {
        let selected = self.selected_date();
        let settings = self.settings.get();
        self.state.with(|s| {
            s.cursor
                .grid()
                .into_iter()
                .map(|cell| {
                    cell.map(|cell| {
                        let weekday = parse_iso_date(&cell.iso).map(iso_weekday).unwrap_or(0);
                        DayCell {
                            selected: cell.iso == selected,
                            marked: s.marked_days.contains(&cell.day),
                            today: cell.iso == self.today,
                            weekend: settings.is_weekend(weekday as u8),
                            day: cell.day,
                            iso: cell.iso,
                        }
                    })
                })
                .collect()
        })
    }

    /// Working-day slots paired with bookings; bookings off the slot grid
    /// get their own rows so nothing is hidden
    pub fn timeline(&self) -> Vec<TimelineRow> {
        let settings = self.settings.get();
        let bookings = self.state.with(|s| s.day_bookings.clone());

        let mut rows: Vec<TimelineRow> = settings
            .day_slots()
            .into_iter()
            .map(|time| TimelineRow {
                label: settings.display_time(&time),
                booking: bookings.iter().find(|b| b.time == time).cloned(),
                time,
            })
            .collect();

        for booking in &bookings {
            if !rows.iter().any(|row| row.time == booking.time) {
                rows.push(TimelineRow {
                    time: booking.time.clone(),
                    label: settings.display_time(&booking.time),
                    booking: Some(booking.clone()),
                });
            }
        }
        rows.sort_by(|a, b| a.time.cmp(&b.time));
        rows
    }

    pub fn has_bookings_today(&self) -> bool {
        self.state.with(|s| !s.today_bookings.is_empty())
    }

    pub fn select_day(&self, iso: &str) {
        if parse_iso_date(iso).is_none() {
            warn!("Ignoring invalid date selection: {}", iso);
            return;
        }
        self.app.select_date(iso);
        self.sync_cursor();
    }

    pub fn shift_day(&self, delta: i64) {
        if let Some(next) = add_days(&self.selected_date(), delta) {
            self.select_day(&next);
        }
    }

    /// Move the cursor by `delta` months and select day 1 of that month
    pub fn shift_month(&self, delta: i32) {
        let next = self.state.with(|s| s.cursor.shift(delta));
        self.state.update(|s| s.cursor = next);
        self.app.select_date(&next.first_day_iso());
    }

    pub fn go_today(&self) {
        let today = self.today.clone();
        self.select_day(&today);
    }

    /// Open the booking sheet for a free slot or an existing booking
    pub fn open_row(&self, row: &TimelineRow) {
        match &row.booking {
            Some(booking) => self.app.open_booking(Some(booking.id), None),
            None => self.app.open_booking(None, Some(&row.time)),
        }
    }
}
