use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub mod calendar;
pub mod time_slots;

pub use calendar::{
    add_days, build_fixed_month_grid, build_month_grid, days_in_month, format_date_display,
    format_date_title, format_day_short, format_iso_date, iso_for, iso_weekday, month_label, month_name,
    parse_iso_date, week_days, GridCell, MonthCursor, WEEKDAY_LABELS,
};
pub use time_slots::{
    build_time_slots, display_time, format_prepayment, normalize_time_input, round_time,
    to_minutes, validate_slot_field, validate_slot_token, SlotFieldValidity, WeekTemplate,
    DEFAULT_WEEK_SLOTS,
};

/// Screens reachable from the bottom tab bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenKey {
    #[default]
    Calendar,
    Schedule,
    Clients,
    Services,
    Settings,
    /// Salary and expense tallies
    Ledger,
}

impl ScreenKey {
    /// Tab order as rendered in the tab bar
    pub const ALL: [ScreenKey; 6] = [
        ScreenKey::Calendar,
        ScreenKey::Schedule,
        ScreenKey::Clients,
        ScreenKey::Services,
        ScreenKey::Ledger,
        ScreenKey::Settings,
    ];

    /// Human-readable tab label
    pub fn label(&self) -> &'static str {
        match self {
            ScreenKey::Calendar => "Календарь",
            ScreenKey::Schedule => "Расписание",
            ScreenKey::Clients => "Клиенты",
            ScreenKey::Services => "Услуги",
            ScreenKey::Settings => "Настройки",
            ScreenKey::Ledger => "Финансы",
        }
    }
}

/// A single booking as served by `/api/clients*`.
///
/// The backend owns these records; the client only ever holds cached copies
/// for the view it is rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub name: String,
    /// Contact handle, usually a Telegram `@username`
    pub link: String,
    /// Start time, `HH:MM` once normalized by the backend
    pub time: String,
    /// Booking day, `YYYY-MM-DD`
    pub date: String,
    /// `0` = no prepayment, `1` = prepaid, anything else is an amount
    #[serde(default)]
    pub prepayment: Option<f64>,
    /// Server-rendered prepayment label (`✗`, `✓`, or the amount)
    #[serde(default)]
    pub prepayment_display: Option<String>,
}

impl Booking {
    /// Start time normalized to `HH:MM`, falling back to the raw value
    pub fn normalized_time(&self) -> String {
        let normalized = normalize_time_input(&self.time);
        if normalized.is_empty() {
            self.time.clone()
        } else {
            normalized
        }
    }

    /// Roster grouping key: the contact handle, or the name when no handle was recorded
    pub fn roster_key(&self) -> &str {
        if self.link.trim().is_empty() {
            &self.name
        } else {
            &self.link
        }
    }

    /// Whether the contact handle is a Telegram username that can be copied
    pub fn has_telegram_handle(&self) -> bool {
        self.link.trim().starts_with('@')
    }

    pub fn prepayment_label(&self) -> String {
        self.prepayment_display
            .clone()
            .unwrap_or_else(|| format_prepayment(self.prepayment))
    }
}

/// Body for `POST /api/clients` and `PUT /api/clients/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingPayload {
    pub name: String,
    pub link: String,
    pub time: String,
    pub date: String,
    pub prepayment: f64,
}

/// How a booking was prepaid, as chosen in the booking form
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PrepaymentChoice {
    #[default]
    None,
    Paid,
    Amount(f64),
}

impl PrepaymentChoice {
    /// Decode the overloaded wire value (`0`, `1`, or an amount)
    pub fn from_wire(value: Option<f64>) -> Self {
        match value {
            None => PrepaymentChoice::None,
            Some(v) if v == 0.0 => PrepaymentChoice::None,
            Some(v) if v == 1.0 => PrepaymentChoice::Paid,
            Some(v) => PrepaymentChoice::Amount(v),
        }
    }

    pub fn to_wire(&self) -> f64 {
        match self {
            PrepaymentChoice::None => 0.0,
            PrepaymentChoice::Paid => 1.0,
            PrepaymentChoice::Amount(amount) => *amount,
        }
    }
}

/// Generic `{"status": "ok"}` acknowledgement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Day numbers within a month (selected working days or marked days)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DaysResponse {
    #[serde(default)]
    pub days: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleDayRequest {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleDayResponse {
    pub selected: bool,
    #[serde(default)]
    pub days: Vec<u32>,
}

/// Weekly slot template keyed by weekday (`"0"` = Monday)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SlotsPayload {
    pub slots: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SlotsResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub slots: BTreeMap<String, String>,
}

/// Body for `POST /api/schedule/generate`; `None` uses the stored template
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerateScheduleRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slots: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerateScheduleResponse {
    #[serde(default)]
    pub lines: Vec<String>,
}

/// Salary or expense total for a `YYYY-MM` month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthTotal {
    pub month: String,
    pub total: f64,
}

/// Body for `POST /api/salary` and `POST /api/expenses`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountRequest {
    /// Whole currency units
    pub amount: i64,
    pub month: String,
}

/// Response of the salary/expense mutations: status plus the refreshed total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalUpdate {
    pub status: String,
    #[serde(default)]
    pub total: f64,
}

/// Visit count for one contact handle (`GET /api/visits`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitCount {
    pub link: String,
    pub count: u32,
}

/// Most frequent clients (`GET /api/visits/top`)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TopVisits {
    #[serde(default)]
    pub items: Vec<VisitCount>,
}

/// Response of `GET /api/access`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessStatus {
    pub access: bool,
    #[serde(default)]
    pub is_admin: bool,
}

/// A service offered by the business. Declared and stored on the device only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceItem {
    pub id: String,
    pub title: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub price: Option<f64>,
}

impl ServiceItem {
    /// The service every fresh install starts with
    pub fn seed() -> Self {
        Self {
            id: "service-basic".to_string(),
            title: "Маникюр".to_string(),
            duration_minutes: 60,
            price: Some(0.0),
        }
    }
}

/// Local annotation attached to a booking via its composite key
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BookingMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Allowed timeline granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum SlotStep {
    Fifteen,
    #[default]
    Thirty,
    Sixty,
}

impl SlotStep {
    pub const ALL: [SlotStep; 3] = [SlotStep::Fifteen, SlotStep::Thirty, SlotStep::Sixty];

    pub fn minutes(&self) -> u32 {
        match self {
            SlotStep::Fifteen => 15,
            SlotStep::Thirty => 30,
            SlotStep::Sixty => 60,
        }
    }
}

impl TryFrom<u32> for SlotStep {
    type Error = SlotStepError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            15 => Ok(SlotStep::Fifteen),
            30 => Ok(SlotStep::Thirty),
            60 => Ok(SlotStep::Sixty),
            other => Err(SlotStepError(other)),
        }
    }
}

impl From<SlotStep> for u32 {
    fn from(step: SlotStep) -> Self {
        step.minutes()
    }
}

/// Error returned when a slot step is not one of 15, 30 or 60 minutes
#[derive(Debug, Clone, PartialEq)]
pub struct SlotStepError(pub u32);

impl fmt::Display for SlotStepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unsupported slot step: {} minutes (expected 15, 30 or 60)", self.0)
    }
}

impl std::error::Error for SlotStepError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeFormat {
    #[default]
    #[serde(rename = "24h")]
    H24,
    #[serde(rename = "12h")]
    H12,
}

/// User-tunable working parameters. Client-local, no server counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub workday_start: String,
    pub workday_end: String,
    pub slot_step: SlotStep,
    /// Weekday numbers with Monday = 0
    pub weekend_days: BTreeSet<u8>,
    pub time_format: TimeFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workday_start: "10:00".to_string(),
            workday_end: "20:00".to_string(),
            slot_step: SlotStep::Thirty,
            weekend_days: BTreeSet::from([6]),
            time_format: TimeFormat::H24,
        }
    }
}

impl Settings {
    pub fn is_weekend(&self, weekday: u8) -> bool {
        self.weekend_days.contains(&weekday)
    }

    /// Timeline slots for one working day
    pub fn day_slots(&self) -> Vec<String> {
        build_time_slots(&self.workday_start, &self.workday_end, self.slot_step.minutes())
    }

    /// Render an `HH:MM` value in the configured time format
    pub fn display_time(&self, hhmm: &str) -> String {
        display_time(hhmm, self.time_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(link: &str, name: &str) -> Booking {
        Booking {
            id: 1,
            name: name.to_string(),
            link: link.to_string(),
            time: "10.30".to_string(),
            date: "2025-06-13".to_string(),
            prepayment: None,
            prepayment_display: None,
        }
    }

    #[test]
    fn test_booking_decodes_backend_shape() {
        let json = r#"{"id":7,"name":"Анна","link":"@anna","time":"10:00","date":"2025-06-13","prepayment":500.0,"prepayment_display":"500"}"#;
        let booking: Booking = serde_json::from_str(json).unwrap();
        assert_eq!(booking.id, 7);
        assert_eq!(booking.link, "@anna");
        assert_eq!(booking.prepayment, Some(500.0));
        assert_eq!(booking.prepayment_label(), "500");

        let minimal = r#"{"id":8,"name":"Б","link":"","time":"11:00","date":"2025-06-13"}"#;
        let booking: Booking = serde_json::from_str(minimal).unwrap();
        assert_eq!(booking.prepayment, None);
        assert_eq!(booking.prepayment_label(), "✗");
    }

    #[test]
    fn test_booking_roster_key_falls_back_to_name() {
        assert_eq!(booking("@anna", "Анна").roster_key(), "@anna");
        assert_eq!(booking("  ", "Анна").roster_key(), "Анна");
    }

    #[test]
    fn test_booking_normalized_time() {
        assert_eq!(booking("@a", "A").normalized_time(), "10:30");
        assert!(booking("@a", "A").has_telegram_handle());
        assert!(!booking("+7999", "A").has_telegram_handle());
    }

    #[test]
    fn test_prepayment_choice_wire_mapping() {
        assert_eq!(PrepaymentChoice::from_wire(None), PrepaymentChoice::None);
        assert_eq!(PrepaymentChoice::from_wire(Some(0.0)), PrepaymentChoice::None);
        assert_eq!(PrepaymentChoice::from_wire(Some(1.0)), PrepaymentChoice::Paid);
        assert_eq!(PrepaymentChoice::from_wire(Some(750.0)), PrepaymentChoice::Amount(750.0));
        assert_eq!(PrepaymentChoice::Paid.to_wire(), 1.0);
        assert_eq!(PrepaymentChoice::Amount(300.0).to_wire(), 300.0);
    }

    #[test]
    fn test_slot_step_serializes_as_minutes() {
        assert_eq!(serde_json::to_string(&SlotStep::Fifteen).unwrap(), "15");
        let step: SlotStep = serde_json::from_str("60").unwrap();
        assert_eq!(step, SlotStep::Sixty);
        assert!(serde_json::from_str::<SlotStep>("45").is_err());
        assert_eq!(SlotStep::try_from(20), Err(SlotStepError(20)));
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.workday_start, "10:00");
        assert_eq!(settings.workday_end, "20:00");
        assert_eq!(settings.slot_step.minutes(), 30);
        assert!(settings.is_weekend(6));
        assert!(!settings.is_weekend(0));
        assert_eq!(settings.day_slots().len(), 21);

        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("\"time_format\":\"24h\""));
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn test_generate_request_omits_missing_slots() {
        let request = GenerateScheduleRequest::default();
        assert_eq!(serde_json::to_string(&request).unwrap(), "{}");
    }

    #[test]
    fn test_screen_key_wire_names() {
        assert_eq!(serde_json::to_string(&ScreenKey::Ledger).unwrap(), "\"ledger\"");
        assert_eq!(ScreenKey::default(), ScreenKey::Calendar);
        assert_eq!(ScreenKey::ALL.len(), 6);
    }
}
