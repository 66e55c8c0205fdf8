//! Salary and expense panels: month total, add an amount, remove the last
//! entry. Both panels share one implementation keyed by [`LedgerKind`].

use log::{debug, info};
use shared::MonthCursor;
use thiserror::Error;

use super::query_cache::{InvalidateScope, QueryCache, QueryKey};
use crate::io::{ApiClient, ApiError, LedgerKind};
use crate::stores::{Store, SubscriptionId};

pub const ADDED_MESSAGE: &str = "Сумма добавлена";
pub const REMOVED_MESSAGE: &str = "Последняя сумма удалена";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("Введите месяц и сумму")]
    MissingInput,
    #[error("Выберите месяц")]
    MissingMonth,
    #[error("Некорректный месяц: {0}")]
    InvalidMonth(String),
    #[error("Сумма должна быть положительным целым числом")]
    InvalidAmount,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl LedgerKind {
    fn query_key(&self, month: &str) -> QueryKey {
        match self {
            LedgerKind::Salary => QueryKey::SalaryTotal(month.to_string()),
            LedgerKind::Expenses => QueryKey::ExpensesTotal(month.to_string()),
        }
    }

    fn scope(&self) -> InvalidateScope {
        match self {
            LedgerKind::Salary => InvalidateScope::Salary,
            LedgerKind::Expenses => InvalidateScope::Expenses,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            LedgerKind::Salary => "Зарплата",
            LedgerKind::Expenses => "Траты",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LedgerState {
    /// `YYYY-MM`
    pub month: String,
    /// Amount field as typed
    pub amount: String,
    /// Total of the month shown, once loaded
    pub total: Option<f64>,
    pub busy: bool,
}

#[derive(Clone)]
pub struct LedgerPanel {
    kind: LedgerKind,
    api: ApiClient,
    cache: QueryCache,
    state: Store<LedgerState>,
}

impl LedgerPanel {
    pub fn new(kind: LedgerKind, api: ApiClient, cache: QueryCache, month: MonthCursor) -> Self {
        Self {
            kind,
            api,
            cache,
            state: Store::new(LedgerState {
                month: month.to_string(),
                ..LedgerState::default()
            }),
        }
    }

    pub fn kind(&self) -> LedgerKind {
        self.kind
    }

    pub fn state(&self) -> LedgerState {
        self.state.get()
    }

    pub fn subscribe(&self, listener: impl Fn(&LedgerState) + 'static) -> SubscriptionId {
        self.state.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }

    /// Changing the month drops the shown total until the next refresh.
    /// Parseable months are stored zero-padded (`2025-6` becomes `2025-06`).
    pub fn set_month(&self, month: &str) {
        let month = MonthCursor::parse(month)
            .map(|cursor| cursor.to_string())
            .unwrap_or_else(|| month.trim().to_string());
        self.state.update(|s| {
            if s.month != month {
                s.month = month;
                s.total = None;
            }
        });
    }

    pub fn set_amount(&self, amount: &str) {
        self.state.update(|s| s.amount = amount.to_string());
    }

    /// `"Зарплата за 2025-06: 1500 руб."`
    pub fn total_label(&self) -> Option<String> {
        self.state.with(|s| {
            s.total
                .map(|total| format!("{} за {}: {} руб.", self.kind.title(), s.month, total))
        })
    }

    fn month(&self) -> Result<String, LedgerError> {
        let month = self.state.with(|s| s.month.clone());
        if month.is_empty() {
            return Err(LedgerError::MissingMonth);
        }
        MonthCursor::parse(&month)
            .map(|cursor| cursor.to_string())
            .ok_or(LedgerError::InvalidMonth(month))
    }

    /// Load the total of the selected month
    pub async fn refresh(&self) -> Result<f64, LedgerError> {
        let month = self.month()?;
        let total = self
            .cache
            .get_or_fetch(self.kind.query_key(&month), || async {
                Ok(self.api.ledger_total(self.kind, &month).await?.total)
            })
            .await?;
        self.state.update(|s| {
            if s.month == month {
                s.total = Some(total);
            }
        });
        Ok(total)
    }

    /// Post the typed amount; the field is cleared and the total refetched
    pub async fn add(&self) -> Result<f64, LedgerError> {
        let (month, amount) = self
            .state
            .with(|s| (s.month.clone(), s.amount.trim().to_string()));
        if month.is_empty() || amount.is_empty() {
            return Err(LedgerError::MissingInput);
        }
        let month = self.month()?;
        let amount: i64 = amount.parse().map_err(|_| LedgerError::InvalidAmount)?;
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount);
        }

        self.state.update(|s| s.busy = true);
        let result = self.api.ledger_add(self.kind, &month, amount).await;
        self.state.update(|s| s.busy = false);
        result?;
        info!("{} {}: added {}", self.kind.title(), month, amount);

        self.state.update(|s| s.amount.clear());
        self.cache.invalidate(self.kind.scope());
        self.refresh().await
    }

    pub async fn remove_last(&self) -> Result<f64, LedgerError> {
        let month = self.month()?;

        self.state.update(|s| s.busy = true);
        let result = self.api.ledger_remove_last(self.kind, &month).await;
        self.state.update(|s| s.busy = false);
        result?;
        debug!("{} {}: removed last entry", self.kind.title(), month);

        self.cache.invalidate(self.kind.scope());
        self.refresh().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::Harness;

    fn june() -> MonthCursor {
        MonthCursor { year: 2025, month: 6 }
    }

    fn panel(h: &Harness, kind: LedgerKind) -> LedgerPanel {
        LedgerPanel::new(kind, h.api.clone(), h.cache.clone(), june())
    }

    #[tokio::test]
    async fn test_add_then_remove_refreshes_total() {
        let h = Harness::new();
        let salary = panel(&h, LedgerKind::Salary);

        assert_eq!(salary.refresh().await.unwrap(), 0.0);
        salary.set_amount("1500");
        assert_eq!(salary.add().await.unwrap(), 1500.0);
        assert!(salary.state().amount.is_empty());

        salary.set_amount(" 500 ");
        assert_eq!(salary.add().await.unwrap(), 2000.0);
        assert_eq!(salary.total_label().unwrap(), "Зарплата за 2025-06: 2000 руб.");

        assert_eq!(salary.remove_last().await.unwrap(), 1500.0);
        assert_eq!(h.backend.request_count("/api/salary?month=2025-06"), 4);
    }

    #[tokio::test]
    async fn test_panels_are_independent() {
        let h = Harness::new();
        let salary = panel(&h, LedgerKind::Salary);
        let expenses = panel(&h, LedgerKind::Expenses);

        expenses.set_amount("300");
        expenses.add().await.unwrap();
        assert_eq!(salary.refresh().await.unwrap(), 0.0);
        assert_eq!(expenses.total_label().unwrap(), "Траты за 2025-06: 300 руб.");
    }

    #[tokio::test]
    async fn test_add_validation() {
        let h = Harness::new();
        let salary = panel(&h, LedgerKind::Salary);

        assert_eq!(salary.add().await, Err(LedgerError::MissingInput));
        salary.set_amount("-5");
        assert_eq!(salary.add().await, Err(LedgerError::InvalidAmount));
        salary.set_amount("12.5");
        assert_eq!(salary.add().await, Err(LedgerError::InvalidAmount));

        salary.set_month("2025-13");
        salary.set_amount("100");
        assert_eq!(
            salary.add().await,
            Err(LedgerError::InvalidMonth("2025-13".into()))
        );
        salary.set_month("");
        assert_eq!(salary.remove_last().await, Err(LedgerError::MissingMonth));

        assert_eq!(h.backend.request_count("/api/salary"), 0);
    }

    #[tokio::test]
    async fn test_failed_add_keeps_amount() {
        let h = Harness::new();
        let salary = panel(&h, LedgerKind::Salary);
        salary.set_amount("100");
        h.backend.fail_next(500, "Database unavailable");

        let err = salary.add().await.unwrap_err();
        assert_eq!(err.to_string(), "Database unavailable");
        let state = salary.state();
        assert_eq!(state.amount, "100");
        assert!(!state.busy);
    }

    #[tokio::test]
    async fn test_switching_month_clears_total() {
        let h = Harness::new();
        let salary = panel(&h, LedgerKind::Salary);
        salary.refresh().await.unwrap();
        assert!(salary.state().total.is_some());

        salary.set_month("2025-07");
        assert!(salary.total_label().is_none());
    }

    #[tokio::test]
    async fn test_unpadded_month_shows_total() {
        let h = Harness::new();
        let salary = panel(&h, LedgerKind::Salary);
        salary.set_month(" 2025-7 ");
        assert_eq!(salary.state().month, "2025-07");

        salary.set_amount("700");
        salary.add().await.unwrap();
        assert_eq!(salary.total_label().unwrap(), "Зарплата за 2025-07: 700 руб.");

        salary.set_month("2025-07");
        assert!(salary.state().total.is_some());
    }
}
