//! # Schedule Screen
//!
//! Three tools on one screen:
//!
//! - a month grid of working-day toggles, flipped optimistically and
//!   reverted when the server rejects the change
//! - the weekly slot template editor with per-weekday validation
//! - the announcement generator that turns selected days and slots into
//!   text ready to paste into a channel

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info, warn};
use shared::{
    format_date_display, iso_for, validate_slot_field, Booking, MonthCursor, SlotFieldValidity,
    WeekTemplate,
};
use thiserror::Error;

use super::calendar_screen::sort_bookings;
use super::query_cache::{QueryCache, QueryKey};
use crate::io::{ApiClient, ApiError};
use crate::stores::{Store, SubscriptionId};

const HEADER_PREFIX: &str = "расписание за";
const STRIKE_OPEN: &str = "<s>";
const STRIKE_CLOSE: &str = "</s>";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("Проверьте формат времени слотов")]
    InvalidSlots(Vec<usize>),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Piece of an announcement line
#[derive(Debug, Clone, PartialEq)]
pub enum SlotSegment {
    Plain(String),
    /// Already booked, rendered struck through
    Struck(String),
}

impl SlotSegment {
    pub fn text(&self) -> &str {
        match self {
            SlotSegment::Plain(text) | SlotSegment::Struck(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnouncementLine {
    pub segments: Vec<SlotSegment>,
}

impl AnnouncementLine {
    pub fn parse(line: &str) -> Self {
        let mut segments = Vec::new();
        let mut rest = line;
        while let Some(start) = rest.find(STRIKE_OPEN) {
            let after_open = &rest[start + STRIKE_OPEN.len()..];
            let Some(end) = after_open.find(STRIKE_CLOSE) else {
                break;
            };
            if start > 0 {
                segments.push(SlotSegment::Plain(rest[..start].to_string()));
            }
            segments.push(SlotSegment::Struck(after_open[..end].to_string()));
            rest = &after_open[end + STRIKE_CLOSE.len()..];
        }
        if !rest.is_empty() {
            segments.push(SlotSegment::Plain(rest.to_string()));
        }
        Self { segments }
    }

    /// Line without markup
    pub fn plain(&self) -> String {
        self.segments.iter().map(SlotSegment::text).collect()
    }
}

/// Generated schedule text split into an optional header and day lines
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Announcement {
    pub header: Option<String>,
    pub lines: Vec<AnnouncementLine>,
}

impl Announcement {
    /// Collapse whitespace, drop blank lines and split off the
    /// `"Расписание за …"` header
    pub fn parse(raw: &[String]) -> Self {
        let mut cleaned = raw
            .iter()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .peekable();

        let header = cleaned.next_if(|first| first.to_lowercase().starts_with(HEADER_PREFIX));
        let lines = cleaned.map(|line| AnnouncementLine::parse(&line)).collect();
        Self { header, lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Day lines as plain text for the clipboard
    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(AnnouncementLine::plain)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Which weekdays were saved and which kept their previous value
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SlotSaveReport {
    pub saved: Vec<usize>,
    pub rejected: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleState {
    pub cursor: MonthCursor,
    pub selected_days: BTreeSet<u32>,
    pub marked_days: BTreeSet<u32>,
    /// Toggles waiting for the server
    pub pending: BTreeSet<u32>,
    pub focused_date: Option<String>,
    pub focused_bookings: Vec<Booking>,
    /// Template as edited
    pub template: WeekTemplate,
    /// Template as last confirmed by the server
    pub stored_template: WeekTemplate,
    pub validity: Vec<SlotFieldValidity>,
    pub announcement: Option<Announcement>,
}

#[derive(Clone)]
pub struct ScheduleScreen {
    api: ApiClient,
    cache: QueryCache,
    state: Store<ScheduleState>,
}

impl ScheduleScreen {
    pub fn new(api: ApiClient, cache: QueryCache, cursor: MonthCursor) -> Self {
        let template = WeekTemplate::default();
        Self {
            api,
            cache,
            state: Store::new(ScheduleState {
                cursor,
                selected_days: BTreeSet::new(),
                marked_days: BTreeSet::new(),
                pending: BTreeSet::new(),
                focused_date: None,
                focused_bookings: Vec::new(),
                validity: template.validate(),
                stored_template: template.clone(),
                template,
                announcement: None,
            }),
        }
    }

    pub fn state(&self) -> ScheduleState {
        self.state.get()
    }

    pub fn subscribe(&self, listener: impl Fn(&ScheduleState) + 'static) -> SubscriptionId {
        self.state.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }

    pub fn month_label(&self) -> String {
        self.state.with(|s| s.cursor.label())
    }

    // ---- working days ----

    /// Load selected and marked days for the cursor month
    pub async fn load_month(&self) -> Result<(), ApiError> {
        let cursor = self.state.with(|s| s.cursor);
        let selected = self
            .cache
            .get_or_fetch(
                QueryKey::SelectedDays {
                    year: cursor.year,
                    month: cursor.month,
                },
                || self.api.selected_days(cursor.year, cursor.month),
            )
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

        // the cursor may have moved while loading
        if self.state.with(|s| s.cursor) != cursor {
            return Ok(());
        }
        let selected = selected?;
        let marked = marked?;
        self.state.update(|s| {
            s.selected_days = selected.into_iter().collect();
            s.marked_days = marked.into_iter().collect();
        });
        Ok(())
    }

    pub fn shift_month(&self, delta: i32) {
        self.state.update(|s| {
            s.cursor = s.cursor.shift(delta);
            s.selected_days.clear();
            s.marked_days.clear();
            s.pending.clear();
            s.focused_date = None;
            s.focused_bookings.clear();
            s.announcement = None;
        });
    }

    /// Flip a day's working state.
    ///
    /// The grid changes at once; the server's day list replaces it on
    /// success and the flip is undone on failure.
    pub async fn toggle_day(&self, day: u32) -> Result<bool, ApiError> {
        let cursor = self.state.with(|s| s.cursor);
        self.state.update(|s| {
            if !s.selected_days.remove(&day) {
                s.selected_days.insert(day);
            }
            s.pending.insert(day);
        });

        let result = self.api.toggle_day(cursor.year, cursor.month, day).await;
        let same_month = self.state.with(|s| s.cursor) == cursor;

        match result {
            Ok(response) => {
                debug!("Day {} of {} selected={}", day, cursor, response.selected);
                self.cache.set(
                    QueryKey::SelectedDays {
                        year: cursor.year,
                        month: cursor.month,
                    },
                    response.days.clone(),
                );
                if same_month {
                    self.state.update(|s| {
                        s.pending.remove(&day);
                        s.selected_days = response.days.iter().copied().collect();
                    });
                }
                Ok(response.selected)
            }
            Err(e) => {
                warn!("Toggling day {} of {} failed, reverting: {}", day, cursor, e);
                if same_month {
                    self.state.update(|s| {
                        s.pending.remove(&day);
                        if !s.selected_days.remove(&day) {
                            s.selected_days.insert(day);
                        }
                    });
                }
                Err(e)
            }
        }
    }

    /// Show the bookings of one day under the grid
    pub async fn focus_day(&self, day: u32) -> Result<(), ApiError> {
        let cursor = self.state.with(|s| s.cursor);
        let iso = iso_for(cursor.year, cursor.month, day);
        self.state.update(|s| s.focused_date = Some(iso.clone()));

        let bookings = self
            .cache
            .get_or_fetch(QueryKey::ClientsByDay(iso.clone()), || {
                self.api.clients_by_day(&iso)
            })
            .await?;
        self.state.update(|s| {
            if s.focused_date.as_deref() == Some(iso.as_str()) {
                s.focused_bookings = sort_bookings(bookings);
            }
        });
        Ok(())
    }

    /// `"Записи на 13.06.2025"`, or a prompt when no day is focused
    pub fn focused_title(&self) -> String {
        match self.state.with(|s| s.focused_date.clone()) {
            Some(iso) => format!("Записи на {}", format_date_display(&iso)),
            None => "Выберите день.".to_string(),
        }
    }

    // ---- slot template ----

    /// Load the stored template; weekdays the server does not know about,
    /// or a failed request, fall back to defaults
    pub async fn load_slots(&self) {
        let slots = match self.api.schedule_slots().await {
            Ok(slots) => slots,
            Err(e) => {
                warn!("Failed to load slot template, using defaults: {}", e);
                BTreeMap::new()
            }
        };
        let template = WeekTemplate::from_wire(&slots);
        self.cache.set(QueryKey::ScheduleSlots, slots);
        self.state.update(|s| {
            s.validity = template.validate();
            s.stored_template = template.clone();
            s.template = template;
        });
    }

    pub fn set_slot_field(&self, weekday: usize, text: &str) {
        self.state.update(|s| {
            s.template.set_field(weekday, text);
            if let Some(validity) = s.validity.get_mut(weekday) {
                *validity = validate_slot_field(text);
            }
        });
    }

    pub fn invalid_weekdays(&self) -> Vec<usize> {
        self.state.with(|s| {
            s.validity
                .iter()
                .enumerate()
                .filter(|(_, v)| !v.is_valid())
                .map(|(weekday, _)| weekday)
                .collect()
        })
    }

    /// Save every valid weekday. Invalid weekdays are sent with their
    /// previously stored value and stay in the editor for correction.
    pub async fn save_slots(&self) -> Result<SlotSaveReport, ScheduleError> {
        let (template, stored) = self
            .state
            .with(|s| (s.template.clone(), s.stored_template.clone()));
        let validity = template.validate();

        let mut report = SlotSaveReport::default();
        let mut outgoing = stored.clone();
        for (weekday, field) in validity.iter().enumerate() {
            match field {
                SlotFieldValidity::Valid(tokens) => {
                    outgoing.set_field(weekday, tokens.join(", "));
                    report.saved.push(weekday);
                }
                SlotFieldValidity::Empty => {
                    outgoing.set_field(weekday, "");
                    report.saved.push(weekday);
                }
                SlotFieldValidity::Invalid(bad) => {
                    warn!("Weekday {} keeps its stored slots, rejected {:?}", weekday, bad);
                    report.rejected.push(weekday);
                }
            }
        }

        let response = self.api.update_schedule_slots(outgoing.to_wire()).await?;
        let confirmed = WeekTemplate::from_wire(&response.slots);
        info!(
            "Slot template saved: {} weekdays, {} rejected",
            report.saved.len(),
            report.rejected.len()
        );

        self.cache.set(QueryKey::ScheduleSlots, response.slots);
        self.state.update(|s| {
            for weekday in &report.saved {
                s.template.set_field(*weekday, confirmed.field(*weekday));
            }
            s.stored_template = confirmed;
            s.validity = s.template.validate();
        });
        Ok(report)
    }

    /// Drop the stored template and show the server defaults
    pub async fn reset_slots(&self) -> Result<(), ApiError> {
        let response = self.api.reset_schedule_slots().await?;
        let template = WeekTemplate::from_wire(&response.slots);
        info!("Slot template reset to defaults");
        self.cache.set(QueryKey::ScheduleSlots, response.slots);
        self.state.update(|s| {
            s.validity = template.validate();
            s.stored_template = template.clone();
            s.template = template;
        });
        Ok(())
    }

    // ---- announcement ----

    /// Generate the announcement for the cursor month from the edited template
    pub async fn generate(&self) -> Result<Announcement, ScheduleError> {
        let invalid = self.invalid_weekdays();
        if !invalid.is_empty() {
            return Err(ScheduleError::InvalidSlots(invalid));
        }
        let (cursor, template) = self.state.with(|s| (s.cursor, s.template.clone()));

        let lines = self
            .api
            .generate_schedule(cursor.year, cursor.month, Some(template.to_generate_slots()))
            .await?;
        let announcement = Announcement::parse(&lines);
        debug!("Generated {} announcement lines for {}", announcement.lines.len(), cursor);

        self.state.update(|s| s.announcement = Some(announcement.clone()));
        Ok(announcement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::Harness;

    fn june() -> MonthCursor {
        MonthCursor { year: 2025, month: 6 }
    }

    fn screen(h: &Harness) -> ScheduleScreen {
        ScheduleScreen::new(h.api.clone(), h.cache.clone(), june())
    }

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_announcement_parse() {
        let parsed = Announcement::parse(&lines(&[
            "Расписание за июнь:",
            "",
            "13.06 (пт)   <s>11.00</s> 17.00 20.00*",
            "  ",
            "14.06 (сб) 10.00",
        ]));
        assert_eq!(parsed.header.as_deref(), Some("Расписание за июнь:"));
        assert_eq!(parsed.lines.len(), 2);
        assert_eq!(
            parsed.lines[0].segments,
            vec![
                SlotSegment::Plain("13.06 (пт) ".into()),
                SlotSegment::Struck("11.00".into()),
                SlotSegment::Plain(" 17.00 20.00*".into()),
            ]
        );
        assert_eq!(parsed.plain_text(), "13.06 (пт) 11.00 17.00 20.00*\n14.06 (сб) 10.00");
    }

    #[test]
    fn test_announcement_without_header_or_with_broken_markup() {
        let parsed = Announcement::parse(&lines(&["13.06 (пт) <s>11.00 17.00"]));
        assert!(parsed.header.is_none());
        assert_eq!(
            parsed.lines[0].segments,
            vec![SlotSegment::Plain("13.06 (пт) <s>11.00 17.00".into())]
        );
        assert!(Announcement::parse(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_selection() {
        let h = Harness::new();
        h.backend.select_days(2025, 6, &[2, 3]);
        let screen = screen(&h);
        screen.load_month().await.unwrap();
        let original = screen.state().selected_days;

        assert!(screen.toggle_day(13).await.unwrap());
        assert!(screen.state().selected_days.contains(&13));
        assert!(!screen.toggle_day(13).await.unwrap());

        assert_eq!(screen.state().selected_days, original);
        assert!(screen.state().pending.is_empty());
    }

    #[tokio::test]
    async fn test_failed_toggle_reverts() {
        let h = Harness::new();
        h.backend.select_days(2025, 6, &[2]);
        let screen = screen(&h);
        screen.load_month().await.unwrap();

        h.backend.fail_next(500, "boom");
        assert!(screen.toggle_day(2).await.is_err());
        assert_eq!(screen.state().selected_days, BTreeSet::from([2]));
        assert!(screen.state().pending.is_empty());
    }

    #[tokio::test]
    async fn test_server_days_replace_local_state() {
        let h = Harness::new();
        let screen = screen(&h);
        screen.load_month().await.unwrap();

        // another device selected day 5 meanwhile
        h.backend.select_days(2025, 6, &[5]);
        screen.toggle_day(6).await.unwrap();
        assert_eq!(screen.state().selected_days, BTreeSet::from([5, 6]));
    }

    #[tokio::test]
    async fn test_focus_day_lists_bookings() {
        let h = Harness::new();
        h.backend.seed_booking("А", "@a", "2025-06-13", "12:30");
        let screen = screen(&h);

        assert_eq!(screen.focused_title(), "Выберите день.");
        screen.focus_day(13).await.unwrap();
        assert_eq!(screen.focused_title(), "Записи на 13.06.2025");
        assert_eq!(screen.state().focused_bookings[0].time, "12:30");
    }

    #[tokio::test]
    async fn test_load_slots_falls_back_to_defaults() {
        let h = Harness::new();
        h.backend.fail_network("offline");
        let screen = screen(&h);
        screen.load_slots().await;
        assert_eq!(screen.state().template, WeekTemplate::default());
    }

    #[tokio::test]
    async fn test_invalid_field_keeps_previous_stored_value() {
        let h = Harness::new();
        let screen = screen(&h);
        screen.load_slots().await;

        screen.set_slot_field(0, "09:00, 12:00");
        screen.save_slots().await.unwrap();
        assert_eq!(h.backend.stored_slots()[&0u8], vec!["09:00", "12:00"]);

        screen.set_slot_field(0, "09:00, 25:99");
        screen.set_slot_field(1, "8.30, 13");
        assert_eq!(screen.invalid_weekdays(), vec![0]);

        let report = screen.save_slots().await.unwrap();
        assert_eq!(report.rejected, vec![0]);
        assert!(report.saved.contains(&1));

        let stored = h.backend.stored_slots();
        assert_eq!(stored[&0u8], vec!["09:00", "12:00"]);
        assert_eq!(stored[&1u8], vec!["08:30", "13:00"]);

        let state = screen.state();
        assert_eq!(state.template.field(0), "09:00, 25:99");
        assert_eq!(state.template.field(1), "08:30, 13:00");
        assert_eq!(state.stored_template.field(0), "09:00, 12:00");
    }

    #[tokio::test]
    async fn test_reset_slots() {
        let h = Harness::new();
        let screen = screen(&h);
        screen.set_slot_field(2, "07:00");
        screen.save_slots().await.unwrap();

        screen.reset_slots().await.unwrap();
        assert!(h.backend.stored_slots().is_empty());
        assert_eq!(screen.state().template.field(2), "11:00, 14:00, 17:00, 20:00*");
    }

    #[tokio::test]
    async fn test_generate_rejects_invalid_template() {
        let h = Harness::new();
        let screen = screen(&h);
        screen.set_slot_field(3, "abc");
        assert_eq!(screen.generate().await, Err(ScheduleError::InvalidSlots(vec![3])));
        assert_eq!(h.backend.request_count("/api/schedule/generate"), 0);
    }

    #[tokio::test]
    async fn test_generate_strikes_booked_slots() {
        let h = Harness::new();
        h.backend.select_days(2025, 6, &[13]);
        h.backend.seed_booking("А", "@a", "2025-06-13", "14:00");
        let screen = screen(&h);
        screen.set_slot_field(4, "10:00, 14:00, 18:00");

        let announcement = screen.generate().await.unwrap();
        assert_eq!(announcement.header.as_deref(), Some("Расписание за июнь:"));
        assert_eq!(announcement.lines.len(), 1);
        assert_eq!(
            announcement.lines[0].segments,
            vec![
                SlotSegment::Plain("13.06 (пт) 10.00 ".into()),
                SlotSegment::Struck("14.00".into()),
                SlotSegment::Plain(" 18.00".into()),
            ]
        );
        assert_eq!(screen.state().announcement, Some(announcement));
    }

    #[tokio::test]
    async fn test_generate_without_selected_days_is_empty() {
        let h = Harness::new();
        let screen = screen(&h);
        assert!(screen.generate().await.unwrap().is_empty());
    }

    #[test]
    fn test_shift_month_clears_month_state() {
        let h = Harness::new();
        let screen = screen(&h);
        screen.shift_month(7);
        let state = screen.state();
        assert_eq!(state.cursor, MonthCursor { year: 2026, month: 1 });
        assert!(state.selected_days.is_empty());
        assert_eq!(screen.month_label(), "Январь 2026");
    }
}
