//! In-memory stand-in for the scheduling backend.
//!
//! Implements [`HttpTransport`] by routing requests to a small state machine
//! that mirrors the server's observable behavior: validation messages,
//! 404s, `{"detail": ...}` error bodies and the announcement generator.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;

use async_trait::async_trait;
use chrono::Datelike;
use serde::Serialize;
use serde_json::{json, Value};
use shared::{
    format_prepayment, iso_for, iso_weekday, month_name, normalize_time_input, parse_iso_date,
    to_minutes, Booking, BookingPayload, ToggleDayRequest, DEFAULT_WEEK_SLOTS,
};

use super::api::ApiClient;
use super::http::{ApiError, HttpRequest, HttpResponse, HttpTransport, Method, INIT_DATA_HEADER};

const WEEKDAY_SHORT: [&str; 7] = ["пн", "вт", "ср", "чт", "пт", "сб", "вс"];
const BOOKED_GAP_MINUTES: i64 = 90;

/// Answer of `GET /api/access` once init data is present
#[derive(Debug, Clone, PartialEq)]
pub enum AccessBehavior {
    Grant { is_admin: bool },
    /// `{"access": false}`
    Revoked,
    /// Non-2xx with a detail message
    Fail { status: u16, detail: String },
}

#[derive(Default)]
struct BackendState {
    bookings: Vec<Booking>,
    next_id: i64,
    selected: HashMap<(i32, u32), BTreeSet<u32>>,
    slots: BTreeMap<u8, Vec<String>>,
    salary: HashMap<String, Vec<i64>>,
    expenses: HashMap<String, Vec<i64>>,
    requests: Vec<HttpRequest>,
    network_failure: Option<String>,
    fail_next: Option<(u16, String)>,
    access: Option<AccessBehavior>,
}

#[derive(Clone)]
pub struct FakeBackend {
    state: Rc<RefCell<BackendState>>,
    init_data: Rc<RefCell<Option<String>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(BackendState {
                next_id: 1,
                ..BackendState::default()
            })),
            init_data: Rc::new(RefCell::new(None)),
        }
    }

    pub fn with_init_data(self, value: &str) -> Self {
        self.set_init_data(Some(value));
        self
    }

    /// Simulate the host delivering (or withdrawing) init data
    pub fn set_init_data(&self, value: Option<&str>) {
        *self.init_data.borrow_mut() = value.map(str::to_string);
    }

    pub fn init_data_source(&self) -> Rc<RefCell<Option<String>>> {
        self.init_data.clone()
    }

    pub fn client(&self) -> ApiClient {
        let init_data = self.init_data.clone();
        ApiClient::new(
            "",
            Rc::new(self.clone()),
            Rc::new(move || init_data.borrow().clone()),
        )
    }

    pub fn set_access(&self, behavior: AccessBehavior) {
        self.state.borrow_mut().access = Some(behavior);
    }

    /// Every request until cleared fails before reaching the server
    pub fn fail_network(&self, message: &str) {
        self.state.borrow_mut().network_failure = Some(message.to_string());
    }

    pub fn restore_network(&self) {
        self.state.borrow_mut().network_failure = None;
    }

    /// The next request answers with `status` and a detail message
    pub fn fail_next(&self, status: u16, detail: &str) {
        self.state.borrow_mut().fail_next = Some((status, detail.to_string()));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.borrow().requests.clone()
    }

    pub fn request_count(&self, path_prefix: &str) -> usize {
        self.state
            .borrow()
            .requests
            .iter()
            .filter(|r| r.url.starts_with(path_prefix))
            .count()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.state.borrow().requests.last().cloned()
    }

    pub fn bookings(&self) -> Vec<Booking> {
        self.state.borrow().bookings.clone()
    }

    pub fn stored_slots(&self) -> BTreeMap<u8, Vec<String>> {
        self.state.borrow().slots.clone()
    }

    /// Insert a booking directly, bypassing validation
    pub fn seed_booking(&self, name: &str, link: &str, date: &str, time: &str) -> i64 {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.bookings.push(Booking {
            id,
            name: name.to_string(),
            link: link.to_string(),
            time: time.to_string(),
            date: date.to_string(),
            prepayment: Some(0.0),
            prepayment_display: Some(format_prepayment(Some(0.0))),
        });
        id
    }

    pub fn select_days(&self, year: i32, month: u32, days: &[u32]) {
        self.state
            .borrow_mut()
            .selected
            .entry((year, month))
            .or_default()
            .extend(days.iter().copied());
    }

    fn route(&self, request: &HttpRequest) -> HttpResponse {
        let (path, query) = split_url(&request.url);
        let body: Value = request
            .body
            .as_deref()
            .and_then(|b| serde_json::from_str(b).ok())
            .unwrap_or(Value::Null);

        match (request.method, path.as_str()) {
            (Method::Get, "/api/access") => self.access(request),
            (Method::Get, "/api/clients/day") => {
                let date = query.get("date_iso").cloned().unwrap_or_default();
                let mut rows: Vec<Booking> = self
                    .bookings()
                    .into_iter()
                    .filter(|b| b.date == date)
                    .collect();
                rows.sort_by_key(|b| to_minutes(&b.time));
                ok(&rows)
            }
            (Method::Get, "/api/clients") => {
                let start = query.get("start").cloned().unwrap_or_default();
                let end = query.get("end").cloned().unwrap_or_default();
                let mut rows: Vec<Booking> = self
                    .bookings()
                    .into_iter()
                    .filter(|b| b.date >= start && b.date <= end)
                    .collect();
                rows.sort_by(|a, b| (&a.date, to_minutes(&a.time)).cmp(&(&b.date, to_minutes(&b.time))));
                ok(&rows)
            }
            (Method::Get, "/api/clients/marked-days") => {
                let (year, month) = year_month(&query);
                let days: BTreeSet<u32> = self
                    .bookings()
                    .iter()
                    .filter_map(|b| parse_iso_date(&b.date))
                    .filter(|d| d.year() == year && d.month() == month)
                    .map(|d| d.day())
                    .collect();
                ok(&json!({ "days": days }))
            }
            (Method::Post, "/api/clients") => match validate_payload(body) {
                Ok(payload) => {
                    self.seed_payload(None, payload);
                    ok(&json!({ "status": "ok" }))
                }
                Err(response) => response,
            },
            (Method::Delete, "/api/clients/by-link") => {
                let link = query.get("link").cloned().unwrap_or_default();
                let mut state = self.state.borrow_mut();
                let before = state.bookings.len();
                state.bookings.retain(|b| b.link != link);
                if state.bookings.len() == before {
                    detail(404, "Client not found")
                } else {
                    ok(&json!({ "status": "ok" }))
                }
            }
            (Method::Put, p) if p.starts_with("/api/clients/") => {
                let Some(id) = parse_id(p) else {
                    return detail(422, "Invalid id");
                };
                if !self.bookings().iter().any(|b| b.id == id) {
                    return detail(404, "Client not found");
                }
                match validate_payload(body) {
                    Ok(payload) => {
                        self.seed_payload(Some(id), payload);
                        ok(&json!({ "status": "ok" }))
                    }
                    Err(response) => response,
                }
            }
            (Method::Delete, p) if p.starts_with("/api/clients/") => {
                let Some(id) = parse_id(p) else {
                    return detail(422, "Invalid id");
                };
                let mut state = self.state.borrow_mut();
                let before = state.bookings.len();
                state.bookings.retain(|b| b.id != id);
                if state.bookings.len() == before {
                    detail(404, "Client not found")
                } else {
                    ok(&json!({ "status": "ok" }))
                }
            }
            (Method::Get, "/api/visits") => {
                let link = query.get("link").cloned().unwrap_or_default();
                let count = self.bookings().iter().filter(|b| b.link == link).count();
                ok(&json!({ "link": link, "count": count }))
            }
            (Method::Get, "/api/visits/top") => {
                let limit: usize = query.get("limit").and_then(|l| l.parse().ok()).unwrap_or(10);
                let mut counts: BTreeMap<String, u32> = BTreeMap::new();
                for booking in self.bookings() {
                    *counts.entry(booking.link).or_default() += 1;
                }
                let mut items: Vec<(String, u32)> = counts.into_iter().collect();
                items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
                let items: Vec<Value> = items
                    .into_iter()
                    .take(limit)
                    .map(|(link, count)| json!({ "link": link, "count": count }))
                    .collect();
                ok(&json!({ "items": items }))
            }
            (Method::Get, "/api/schedule/selected") => {
                let key = year_month(&query);
                let days = self.state.borrow().selected.get(&key).cloned().unwrap_or_default();
                ok(&json!({ "days": days }))
            }
            (Method::Post, "/api/schedule/toggle") => {
                let Ok(toggle) = serde_json::from_value::<ToggleDayRequest>(body) else {
                    return detail(422, "Invalid toggle payload");
                };
                let mut state = self.state.borrow_mut();
                let days = state.selected.entry((toggle.year, toggle.month)).or_default();
                let selected = if days.remove(&toggle.day) {
                    false
                } else {
                    days.insert(toggle.day);
                    true
                };
                ok(&json!({ "selected": selected, "days": days }))
            }
            (Method::Get, "/api/schedule/slots") => {
                let slots = joined_slots(&self.stored_slots());
                ok(&json!({ "slots": slots }))
            }
            (Method::Post, "/api/schedule/slots") => {
                let normalized = normalize_slots_payload(body.get("slots"));
                if normalized.is_empty() {
                    return detail(400, "Slots required");
                }
                self.state.borrow_mut().slots = normalized.clone();
                ok(&json!({ "status": "ok", "slots": joined_slots(&normalized) }))
            }
            (Method::Post, "/api/schedule/slots/reset") => {
                self.state.borrow_mut().slots.clear();
                ok(&json!({ "status": "ok", "slots": joined_slots(&default_slots()) }))
            }
            (Method::Post, "/api/schedule/generate") => {
                let (year, month) = year_month(&query);
                let lines = self.generate(year, month, body.get("slots"));
                ok(&json!({ "lines": lines }))
            }
            (method, p) if p == "/api/salary" || p == "/api/expenses" || p.ends_with("/last") => {
                self.ledger(method, p, &query, body)
            }
            _ => detail(404, "Not Found"),
        }
    }

    fn access(&self, request: &HttpRequest) -> HttpResponse {
        if request.header(INIT_DATA_HEADER).map_or(true, str::is_empty) {
            return detail(401, "Missing init data");
        }
        match self
            .state
            .borrow()
            .access
            .clone()
            .unwrap_or(AccessBehavior::Grant { is_admin: false })
        {
            AccessBehavior::Grant { is_admin } => ok(&json!({ "access": true, "is_admin": is_admin })),
            AccessBehavior::Revoked => ok(&json!({ "access": false, "is_admin": false })),
            AccessBehavior::Fail { status, detail: message } => detail(status, &message),
        }
    }

    fn ledger(
        &self,
        method: Method,
        path: &str,
        query: &HashMap<String, String>,
        body: Value,
    ) -> HttpResponse {
        let salary = path.starts_with("/api/salary");
        let mut state = self.state.borrow_mut();
        let book = if salary { &mut state.salary } else { &mut state.expenses };
        let total = |entries: Option<&Vec<i64>>| entries.map_or(0, |e| e.iter().sum::<i64>()) as f64;

        match method {
            Method::Get => {
                let month = query.get("month").cloned().unwrap_or_default();
                let total = total(book.get(&month));
                ok(&json!({ "month": month, "total": total }))
            }
            Method::Post => {
                let month = body.get("month").and_then(Value::as_str).unwrap_or_default().to_string();
                let Some(amount) = body.get("amount").and_then(Value::as_i64) else {
                    return detail(422, "amount must be an integer");
                };
                let entries = book.entry(month).or_default();
                entries.push(amount);
                ok(&json!({ "status": "ok", "total": total(Some(&*entries)) }))
            }
            Method::Delete => {
                let month = query.get("month").cloned().unwrap_or_default();
                let entries = book.entry(month).or_default();
                entries.pop();
                ok(&json!({ "status": "ok", "total": total(Some(&*entries)) }))
            }
            Method::Put => detail(405, "Method Not Allowed"),
        }
    }

    fn seed_payload(&self, id: Option<i64>, payload: BookingPayload) {
        let mut state = self.state.borrow_mut();
        let id = id.unwrap_or_else(|| {
            let next = state.next_id;
            state.next_id += 1;
            next
        });
        let booking = Booking {
            id,
            name: payload.name.trim().to_string(),
            link: payload.link.trim().to_string(),
            time: payload.time,
            date: payload.date,
            prepayment: Some(payload.prepayment),
            prepayment_display: Some(format_prepayment(Some(payload.prepayment))),
        };
        match state.bookings.iter_mut().find(|b| b.id == id) {
            Some(existing) => *existing = booking,
            None => state.bookings.push(booking),
        }
    }

    fn generate(&self, year: i32, month: u32, override_slots: Option<&Value>) -> Vec<String> {
        let selected = self
            .state
            .borrow()
            .selected
            .get(&(year, month))
            .cloned()
            .unwrap_or_default();
        if selected.is_empty() {
            return Vec::new();
        }

        let mut template = default_slots();
        template.extend(self.stored_slots());
        template.extend(normalize_slots_payload(override_slots));

        let mut lines = vec![
            format!("Расписание за {}:", month_name(month.saturating_sub(1)).to_lowercase()),
            String::new(),
        ];
        for day in selected {
            let iso = iso_for(year, month, day);
            let Some(date) = parse_iso_date(&iso) else {
                continue;
            };
            let weekday = iso_weekday(date) as usize;
            let Some(slots) = template.get(&(weekday as u8)).filter(|s| !s.is_empty()) else {
                continue;
            };

            let booked: BTreeSet<String> = self
                .bookings()
                .iter()
                .filter(|b| b.date == iso)
                .map(|b| normalize_time_input(&b.time))
                .filter(|t| !t.is_empty())
                .collect();
            let booked_minutes: Vec<i64> = booked
                .iter()
                .filter_map(|t| to_minutes(t))
                .map(i64::from)
                .collect();

            let mut candidates: Vec<String> = slots.iter().cloned().chain(booked.iter().cloned()).collect();
            candidates.sort_by_key(|t| to_minutes(t.trim_end_matches('*')));
            candidates.dedup_by(|a, b| a.trim_end_matches('*') == b.trim_end_matches('*'));

            let mut texts = Vec::new();
            for slot in candidates {
                let bare = slot.trim_end_matches('*');
                let display = slot.replace(':', ".");
                if booked.contains(bare) {
                    texts.push(format!("<s>{}</s>", bare.replace(':', ".")));
                    continue;
                }
                let minutes = to_minutes(bare).map_or(-1, i64::from);
                if !booked_minutes.iter().any(|b| (minutes - b).abs() <= BOOKED_GAP_MINUTES) {
                    texts.push(display);
                }
            }
            lines.push(format!(
                "{} ({}) {}",
                date.format("%d.%m"),
                WEEKDAY_SHORT[weekday],
                texts.join(" ")
            ));
            lines.push(String::new());
        }
        lines
    }
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl HttpTransport for FakeBackend {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.state.borrow_mut().requests.push(request.clone());

        if let Some(message) = self.state.borrow().network_failure.clone() {
            return Err(ApiError::Network(message));
        }
        if let Some((status, message)) = self.state.borrow_mut().fail_next.take() {
            return Ok(detail(status, &message));
        }
        Ok(self.route(&request))
    }
}

fn ok<T: Serialize>(value: &T) -> HttpResponse {
    HttpResponse::new(200, serde_json::to_string(value).unwrap_or_default())
}

fn detail(status: u16, message: &str) -> HttpResponse {
    HttpResponse::new(status, json!({ "detail": message }).to_string())
}

fn split_url(url: &str) -> (String, HashMap<String, String>) {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let params = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = urlencoding::decode(value).ok()?.into_owned();
            Some((key.to_string(), value))
        })
        .collect();
    (path.to_string(), params)
}

fn year_month(query: &HashMap<String, String>) -> (i32, u32) {
    let year = query.get("year").and_then(|y| y.parse().ok()).unwrap_or(0);
    let month = query.get("month").and_then(|m| m.parse().ok()).unwrap_or(0);
    (year, month)
}

fn parse_id(path: &str) -> Option<i64> {
    path.rsplit('/').next()?.parse().ok()
}

fn validate_payload(body: Value) -> Result<BookingPayload, HttpResponse> {
    let mut payload: BookingPayload =
        serde_json::from_value(body).map_err(|e| detail(422, &e.to_string()))?;
    if parse_iso_date(payload.date.trim()).is_none() {
        return Err(detail(400, "Invalid date format"));
    }
    let time = normalize_time_input(&payload.time);
    if time.is_empty() {
        return Err(detail(400, "Invalid time format"));
    }
    payload.date = payload.date.trim().to_string();
    payload.time = time;
    Ok(payload)
}

fn default_slots() -> BTreeMap<u8, Vec<String>> {
    DEFAULT_WEEK_SLOTS
        .iter()
        .enumerate()
        .map(|(weekday, field)| (weekday as u8, normalize_tokens(field.split(','))))
        .collect()
}

fn normalize_tokens<'a>(tokens: impl Iterator<Item = &'a str>) -> Vec<String> {
    tokens
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .filter_map(|t| {
            let starred = t.ends_with('*');
            let time = normalize_time_input(t.trim_end_matches('*'));
            match (time.is_empty(), starred) {
                (true, _) => None,
                (false, true) => Some(format!("{}*", time)),
                (false, false) => Some(time),
            }
        })
        .collect()
}

fn normalize_slots_payload(raw: Option<&Value>) -> BTreeMap<u8, Vec<String>> {
    let Some(Value::Object(map)) = raw else {
        return BTreeMap::new();
    };
    map.iter()
        .filter_map(|(key, value)| {
            let weekday: u8 = key.parse().ok()?;
            let tokens = match value {
                Value::String(text) => normalize_tokens(text.split(',')),
                Value::Array(items) => normalize_tokens(items.iter().filter_map(Value::as_str)),
                _ => return None,
            };
            (!tokens.is_empty()).then_some((weekday, tokens))
        })
        .collect()
}

fn joined_slots(slots: &BTreeMap<u8, Vec<String>>) -> BTreeMap<String, String> {
    slots
        .iter()
        .map(|(weekday, tokens)| (weekday.to_string(), tokens.join(", ")))
        .collect()
}
