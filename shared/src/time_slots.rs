//! Time-of-day helpers: timeline slot generation, loose time parsing and the
//! weekly slot template used to seed announced working hours.

use std::collections::BTreeMap;

use crate::TimeFormat;

/// Default weekly template, Monday first. A trailing `*` marks a slot
/// offered on request only.
pub const DEFAULT_WEEK_SLOTS: [&str; 7] = [
    "11:00, 14:00, 17:00, 20:00*",
    "11:00, 14:00, 17:00, 20:00*",
    "11:00, 14:00, 17:00, 20:00*",
    "11:00, 14:00, 17:00, 20:00*",
    "11:00, 14:00, 17:00, 20:00*",
    "10:00, 13:00, 16:00, 19:00*",
    "10:00, 13:00, 16:00, 19:00*",
];

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Minutes since midnight for a strict `H:MM`/`HH:MM` value
pub fn to_minutes(hhmm: &str) -> Option<u32> {
    let (hours, minutes) = hhmm.trim().split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    (hours < 24 && minutes < 60).then_some(hours * 60 + minutes)
}

pub fn format_minutes(total: u32) -> String {
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Inclusive ascending sequence of `HH:MM` values from `start` to `end`.
///
/// Unparseable bounds or a zero step produce an empty timeline.
pub fn build_time_slots(start: &str, end: &str, step: u32) -> Vec<String> {
    if step == 0 {
        return Vec::new();
    }
    let (Some(start), Some(end)) = (to_minutes(start), to_minutes(end)) else {
        return Vec::new();
    };
    (start..=end)
        .step_by(step as usize)
        .map(format_minutes)
        .collect()
}

/// Normalize loosely typed times (`10:00`, `10.00`, `10-00`, `10/00`, `10`)
/// to `HH:MM`.
///
/// Hours are clamped to 0–23 and out-of-range minutes become `00`. Returns an
/// empty string when the hour part is not a number.
pub fn normalize_time_input(raw: &str) -> String {
    let mut value: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if matches!(c, '.' | '-' | '/') { ':' } else { c })
        .collect();
    if value.is_empty() {
        return String::new();
    }
    if !value.contains(':') {
        value.push_str(":00");
    }

    let mut parts = value.split(':');
    let Some(Ok(hours)) = parts.next().map(str::parse::<i64>) else {
        return String::new();
    };
    let minutes = match parts.next() {
        None | Some("") => 0,
        Some(text) => match text.parse::<i64>() {
            Ok(minutes) => minutes,
            Err(_) => return String::new(),
        },
    };

    let hours = hours.clamp(0, 23);
    let minutes = if (0..=59).contains(&minutes) { minutes } else { 0 };
    format!("{:02}:{:02}", hours, minutes)
}

/// Round a draft time to the nearest slot step.
///
/// Values that cannot be parsed are returned unchanged; an empty draft stays
/// empty. Rounding never crosses midnight.
pub fn round_time(raw: &str, step: u32) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    let Some(minutes) = to_minutes(raw) else {
        return raw.to_string();
    };
    if step == 0 {
        return format_minutes(minutes);
    }
    let mut rounded = ((minutes as f64 / step as f64).round() as u32) * step;
    while rounded >= MINUTES_PER_DAY {
        rounded -= step;
    }
    format_minutes(rounded)
}

/// Render `HH:MM` in the requested clock format
pub fn display_time(hhmm: &str, format: TimeFormat) -> String {
    match (format, to_minutes(hhmm)) {
        (TimeFormat::H12, Some(total)) => {
            let hours = total / 60;
            let suffix = if hours < 12 { "AM" } else { "PM" };
            let hours12 = match hours % 12 {
                0 => 12,
                h => h,
            };
            format!("{}:{:02} {}", hours12, total % 60, suffix)
        }
        _ => hhmm.to_string(),
    }
}

fn is_one_or_two_digits(text: &str) -> bool {
    (1..=2).contains(&text.len()) && text.chars().all(|c| c.is_ascii_digit())
}

/// Validate one slot-template token.
///
/// Accepts `H`, `HH`, `H:MM` and `H.MM` with an optional trailing `*`, and
/// additionally requires a real time of day (hour ≤ 23, minute ≤ 59).
pub fn validate_slot_token(token: &str) -> bool {
    let token = token.trim();
    let base = token.strip_suffix('*').unwrap_or(token).trim_end();

    let (hours, minutes) = match base.find(|c: char| c == ':' || c == '.') {
        Some(idx) => (&base[..idx], Some(&base[idx + 1..])),
        None => (base, None),
    };

    if !is_one_or_two_digits(hours) {
        return false;
    }
    if let Some(minutes) = minutes {
        if !is_one_or_two_digits(minutes) {
            return false;
        }
        if minutes.parse::<u32>().map_or(true, |m| m > 59) {
            return false;
        }
    }
    hours.parse::<u32>().map_or(false, |h| h <= 23)
}

/// Split a comma-separated slot field into trimmed, non-empty tokens
pub fn split_slot_field(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Outcome of validating one weekday's slot field
#[derive(Debug, Clone, PartialEq)]
pub enum SlotFieldValidity {
    /// Nothing entered: the weekday offers no slots
    Empty,
    /// Every token parsed; holds the normalized tokens (`HH:MM`, `*` kept)
    Valid(Vec<String>),
    /// At least one token failed; holds the offending tokens
    Invalid(Vec<String>),
}

impl SlotFieldValidity {
    pub fn is_valid(&self) -> bool {
        !matches!(self, SlotFieldValidity::Invalid(_))
    }
}

pub fn validate_slot_field(text: &str) -> SlotFieldValidity {
    let tokens = split_slot_field(text);
    if tokens.is_empty() {
        return SlotFieldValidity::Empty;
    }

    let bad: Vec<String> = tokens
        .iter()
        .filter(|token| !validate_slot_token(token))
        .cloned()
        .collect();
    if !bad.is_empty() {
        return SlotFieldValidity::Invalid(bad);
    }

    SlotFieldValidity::Valid(
        tokens
            .iter()
            .map(|token| {
                let starred = token.ends_with('*');
                let normalized = normalize_time_input(token.trim_end_matches('*'));
                if starred {
                    format!("{}*", normalized)
                } else {
                    normalized
                }
            })
            .collect(),
    )
}

/// Editable weekly slot template, one free-text field per weekday (Monday = 0)
#[derive(Debug, Clone, PartialEq)]
pub struct WeekTemplate {
    fields: [String; 7],
}

impl Default for WeekTemplate {
    fn default() -> Self {
        Self {
            fields: DEFAULT_WEEK_SLOTS.map(str::to_string),
        }
    }
}

impl WeekTemplate {
    /// Build from the server map, filling missing or blank weekdays with defaults
    pub fn from_wire(slots: &BTreeMap<String, String>) -> Self {
        let mut template = Self::default();
        for (weekday, field) in template.fields.iter_mut().enumerate() {
            if let Some(value) = slots.get(&weekday.to_string()) {
                if !value.trim().is_empty() {
                    *field = value.clone();
                }
            }
        }
        template
    }

    pub fn field(&self, weekday: usize) -> &str {
        self.fields.get(weekday).map(String::as_str).unwrap_or("")
    }

    pub fn set_field(&mut self, weekday: usize, value: impl Into<String>) {
        if let Some(field) = self.fields.get_mut(weekday) {
            *field = value.into();
        }
    }

    pub fn validate(&self) -> Vec<SlotFieldValidity> {
        self.fields.iter().map(|field| validate_slot_field(field)).collect()
    }

    pub fn is_valid(&self) -> bool {
        self.validate().iter().all(SlotFieldValidity::is_valid)
    }

    /// Every field as sent to `POST /api/schedule/slots`
    pub fn to_wire(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .enumerate()
            .map(|(weekday, field)| (weekday.to_string(), field.clone()))
            .collect()
    }

    /// Non-empty fields split into tokens, as sent with a generate request
    pub fn to_generate_slots(&self) -> BTreeMap<String, Vec<String>> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, field)| !field.trim().is_empty())
            .map(|(weekday, field)| (weekday.to_string(), split_slot_field(field)))
            .collect()
    }
}

/// Label for a prepayment value: `✗` for none, `✓` for paid, else the amount
pub fn format_prepayment(value: Option<f64>) -> String {
    match value {
        None => "✗".to_string(),
        Some(v) if v == 0.0 => "✗".to_string(),
        Some(v) if v == 1.0 => "✓".to_string(),
        Some(v) => {
            let text = format!("{:.2}", v);
            text.trim_end_matches('0').trim_end_matches('.').to_string()
        }
    }
}
