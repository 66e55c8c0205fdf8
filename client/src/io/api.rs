//! # API Client
//!
//! Typed wrapper over the scheduling backend. One method per endpoint; every
//! request carries the Telegram init-data header when the host provides it.
//! Calls are fire-and-forget: no retry, backoff or idempotency key.

use std::collections::BTreeMap;
use std::rc::Rc;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::{
    AccessStatus, AmountRequest, Booking, BookingPayload, DaysResponse, GenerateScheduleRequest,
    GenerateScheduleResponse, MonthTotal, SlotsPayload, SlotsResponse, StatusResponse,
    ToggleDayRequest, ToggleDayResponse, TopVisits, TotalUpdate, VisitCount,
};
use urlencoding::encode;

use super::http::{ApiError, HttpRequest, HttpTransport, InitDataSource, Method, INIT_DATA_HEADER};

/// Which monthly tally a ledger call targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerKind {
    Salary,
    Expenses,
}

impl LedgerKind {
    fn path(&self) -> &'static str {
        match self {
            LedgerKind::Salary => "/api/salary",
            LedgerKind::Expenses => "/api/expenses",
        }
    }
}

/// API client for the scheduling backend
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Rc<dyn HttpTransport>,
    init_data: Rc<dyn InitDataSource>,
}

impl ApiClient {
    /// Create a client; `base_url` is prepended to every `/api/...` path
    pub fn new(
        base_url: impl Into<String>,
        transport: Rc<dyn HttpTransport>,
        init_data: Rc<dyn InitDataSource>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
            init_data,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
    ) -> Result<T, ApiError> {
        let mut request = HttpRequest::new(method, format!("{}{}", self.base_url, path));
        request
            .headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        if let Some(init_data) = self.init_data.init_data().filter(|v| !v.is_empty()) {
            request.headers.push((INIT_DATA_HEADER.to_string(), init_data));
        }
        request.body = body;

        debug!("{} {}", method.as_str(), path);
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            let err = ApiError::from_response(&response);
            warn!("{} {} failed with {}: {}", method.as_str(), path, response.status, err);
            return Err(err);
        }

        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Method::Get, path, None).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let json = serde_json::to_string(body).map_err(|e| ApiError::Encode(e.to_string()))?;
        self.send(Method::Post, path, Some(json)).await
    }

    async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let json = serde_json::to_string(body).map_err(|e| ApiError::Encode(e.to_string()))?;
        self.send(Method::Put, path, Some(json)).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Method::Delete, path, None).await
    }

    // ---- clients ----

    /// Bookings for one day (`YYYY-MM-DD`)
    pub async fn clients_by_day(&self, date_iso: &str) -> Result<Vec<Booking>, ApiError> {
        self.get(&format!("/api/clients/day?date_iso={}", encode(date_iso)))
            .await
    }

    /// Bookings within an inclusive date range
    pub async fn clients_by_range(&self, start: &str, end: &str) -> Result<Vec<Booking>, ApiError> {
        self.get(&format!(
            "/api/clients?start={}&end={}",
            encode(start),
            encode(end)
        ))
        .await
    }

    /// Days of the month that have at least one booking
    pub async fn marked_days(&self, year: i32, month: u32) -> Result<Vec<u32>, ApiError> {
        let response: DaysResponse = self
            .get(&format!("/api/clients/marked-days?year={}&month={}", year, month))
            .await?;
        Ok(response.days)
    }

    pub async fn create_booking(&self, payload: &BookingPayload) -> Result<StatusResponse, ApiError> {
        self.post("/api/clients", payload).await
    }

    pub async fn update_booking(
        &self,
        id: i64,
        payload: &BookingPayload,
    ) -> Result<StatusResponse, ApiError> {
        self.put(&format!("/api/clients/{}", id), payload).await
    }

    pub async fn delete_booking(&self, id: i64) -> Result<StatusResponse, ApiError> {
        self.delete(&format!("/api/clients/{}", id)).await
    }

    /// Delete every booking recorded under a contact handle
    pub async fn delete_by_link(&self, link: &str) -> Result<StatusResponse, ApiError> {
        self.delete(&format!("/api/clients/by-link?link={}", encode(link)))
            .await
    }

    /// Number of visits for a contact handle
    pub async fn visit_count(&self, link: &str) -> Result<VisitCount, ApiError> {
        self.get(&format!("/api/visits?link={}", encode(link))).await
    }

    /// Most frequent clients, `limit` between 1 and 100
    pub async fn top_visits(&self, limit: u32) -> Result<Vec<VisitCount>, ApiError> {
        let response: TopVisits = self
            .get(&format!("/api/visits/top?limit={}", limit.clamp(1, 100)))
            .await?;
        Ok(response.items)
    }

    // ---- schedule ----

    /// Working days selected for a month (`month` is 1-based)
    pub async fn selected_days(&self, year: i32, month: u32) -> Result<Vec<u32>, ApiError> {
        let response: DaysResponse = self
            .get(&format!("/api/schedule/selected?year={}&month={}", year, month))
            .await?;
        Ok(response.days)
    }

    pub async fn toggle_day(
        &self,
        year: i32,
        month: u32,
        day: u32,
    ) -> Result<ToggleDayResponse, ApiError> {
        self.post("/api/schedule/toggle", &ToggleDayRequest { year, month, day })
            .await
    }

    /// Stored weekly template keyed by weekday (`"0"` = Monday)
    pub async fn schedule_slots(&self) -> Result<BTreeMap<String, String>, ApiError> {
        let response: SlotsResponse = self.get("/api/schedule/slots").await?;
        Ok(response.slots)
    }

    pub async fn update_schedule_slots(
        &self,
        slots: BTreeMap<String, String>,
    ) -> Result<SlotsResponse, ApiError> {
        self.post("/api/schedule/slots", &SlotsPayload { slots }).await
    }

    pub async fn reset_schedule_slots(&self) -> Result<SlotsResponse, ApiError> {
        self.send(Method::Post, "/api/schedule/slots/reset", None).await
    }

    /// Announcement lines for the selected days of a month
    pub async fn generate_schedule(
        &self,
        year: i32,
        month: u32,
        slots: Option<BTreeMap<String, Vec<String>>>,
    ) -> Result<Vec<String>, ApiError> {
        let response: GenerateScheduleResponse = self
            .post(
                &format!("/api/schedule/generate?year={}&month={}", year, month),
                &GenerateScheduleRequest { slots },
            )
            .await?;
        Ok(response.lines)
    }

    // ---- salary / expenses ----

    /// Total for a `YYYY-MM` month
    pub async fn ledger_total(&self, kind: LedgerKind, month: &str) -> Result<MonthTotal, ApiError> {
        self.get(&format!("{}?month={}", kind.path(), encode(month)))
            .await
    }

    pub async fn ledger_add(
        &self,
        kind: LedgerKind,
        month: &str,
        amount: i64,
    ) -> Result<TotalUpdate, ApiError> {
        let body = AmountRequest {
            amount,
            month: month.to_string(),
        };
        self.post(kind.path(), &body).await
    }

    pub async fn ledger_remove_last(&self, kind: LedgerKind, month: &str) -> Result<TotalUpdate, ApiError> {
        self.delete(&format!("{}/last?month={}", kind.path(), encode(month)))
            .await
    }

    pub async fn salary_total(&self, month: &str) -> Result<MonthTotal, ApiError> {
        self.ledger_total(LedgerKind::Salary, month).await
    }

    pub async fn add_salary(&self, month: &str, amount: i64) -> Result<TotalUpdate, ApiError> {
        self.ledger_add(LedgerKind::Salary, month, amount).await
    }

    pub async fn remove_last_salary(&self, month: &str) -> Result<TotalUpdate, ApiError> {
        self.ledger_remove_last(LedgerKind::Salary, month).await
    }

    pub async fn expenses_total(&self, month: &str) -> Result<MonthTotal, ApiError> {
        self.ledger_total(LedgerKind::Expenses, month).await
    }

    pub async fn add_expense(&self, month: &str, amount: i64) -> Result<TotalUpdate, ApiError> {
        self.ledger_add(LedgerKind::Expenses, month, amount).await
    }

    pub async fn remove_last_expense(&self, month: &str) -> Result<TotalUpdate, ApiError> {
        self.ledger_remove_last(LedgerKind::Expenses, month).await
    }

    // ---- access ----

    pub async fn access_status(&self) -> Result<AccessStatus, ApiError> {
        self.get("/api/access").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::test_utils::FakeBackend;
    use shared::PrepaymentChoice;

    fn payload(name: &str, link: &str, date: &str, time: &str) -> BookingPayload {
        BookingPayload {
            name: name.to_string(),
            link: link.to_string(),
            time: time.to_string(),
            date: date.to_string(),
            prepayment: PrepaymentChoice::Paid.to_wire(),
        }
    }

    #[tokio::test]
    async fn test_create_then_fetch_day_round_trip() {
        let backend = FakeBackend::new();
        let api = backend.client();

        api.create_booking(&payload("Анна", "@anna", "2025-06-13", "14:00"))
            .await
            .unwrap();

        let day = api.clients_by_day("2025-06-13").await.unwrap();
        assert_eq!(day.len(), 1);
        let booking = &day[0];
        assert_eq!(booking.name, "Анна");
        assert_eq!(booking.link, "@anna");
        assert_eq!(booking.date, "2025-06-13");
        assert_eq!(booking.time, "14:00");
        assert_eq!(booking.prepayment_label(), "✓");
    }

    #[tokio::test]
    async fn test_init_data_header_attached_when_available() {
        let backend = FakeBackend::new().with_init_data("query_id=42");
        let api = backend.client();

        api.access_status().await.unwrap();

        let request = backend.last_request().unwrap();
        assert_eq!(request.header(INIT_DATA_HEADER), Some("query_id=42"));
        assert_eq!(request.header("Content-Type"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_missing_init_data_is_401() {
        let backend = FakeBackend::new();
        let api = backend.client();

        let err = api.access_status().await.unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(err.is_missing_init_data());
        assert!(backend.last_request().unwrap().header(INIT_DATA_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_query_parameters_are_encoded() {
        let backend = FakeBackend::new();
        let api = backend.client();

        let _ = api.delete_by_link("@a b&c").await;

        let request = backend.last_request().unwrap();
        assert_eq!(request.url, "/api/clients/by-link?link=%40a%20b%26c");
        assert_eq!(request.method, Method::Delete);
    }

    #[tokio::test]
    async fn test_server_detail_becomes_error_message() {
        let backend = FakeBackend::new();
        let api = backend.client();

        let err = api
            .create_booking(&payload("Анна", "@anna", "2025-06-13", "soon"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Http {
                status: 400,
                message: "Invalid time format".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_network_failure_surfaces_as_network_error() {
        let backend = FakeBackend::new();
        backend.fail_network("connection refused");
        let api = backend.client();

        let err = api.marked_days(2025, 6).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }

    #[tokio::test]
    async fn test_update_and_delete_booking() {
        let backend = FakeBackend::new();
        let api = backend.client();

        api.create_booking(&payload("Анна", "@anna", "2025-06-13", "14:00"))
            .await
            .unwrap();
        let id = api.clients_by_day("2025-06-13").await.unwrap()[0].id;

        api.update_booking(id, &payload("Анна", "@anna", "2025-06-14", "15:30"))
            .await
            .unwrap();
        assert!(api.clients_by_day("2025-06-13").await.unwrap().is_empty());
        assert_eq!(api.clients_by_day("2025-06-14").await.unwrap()[0].time, "15:30");
        assert_eq!(api.marked_days(2025, 6).await.unwrap(), vec![14]);

        api.delete_booking(id).await.unwrap();
        assert!(api.clients_by_day("2025-06-14").await.unwrap().is_empty());
        assert_eq!(api.delete_booking(id).await.unwrap_err().status(), Some(404));
    }

    #[tokio::test]
    async fn test_ledger_endpoints() {
        let backend = FakeBackend::new();
        let api = backend.client();

        api.add_salary("2025-06", 1500).await.unwrap();
        let update = api.add_salary("2025-06", 500).await.unwrap();
        assert_eq!(update.total, 2000.0);
        assert_eq!(api.remove_last_salary("2025-06").await.unwrap().total, 1500.0);
        assert_eq!(api.expenses_total("2025-06").await.unwrap().total, 0.0);

        api.add_expense("2025-06", 300).await.unwrap();
        let total = api.expenses_total("2025-06").await.unwrap();
        assert_eq!(total.month, "2025-06");
        assert_eq!(total.total, 300.0);
    }

    #[tokio::test]
    async fn test_visits() {
        let backend = FakeBackend::new();
        let api = backend.client();

        for date in ["2025-06-01", "2025-06-08"] {
            api.create_booking(&payload("Анна", "@anna", date, "11:00"))
                .await
                .unwrap();
        }
        api.create_booking(&payload("Ира", "@ira", "2025-06-02", "11:00"))
            .await
            .unwrap();

        assert_eq!(api.visit_count("@anna").await.unwrap().count, 2);
        let top = api.top_visits(10).await.unwrap();
        assert_eq!(top[0].link, "@anna");
        assert_eq!(top.len(), 2);
    }
}
