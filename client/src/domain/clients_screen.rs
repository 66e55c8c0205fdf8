//! Client roster: bookings over a date range grouped per contact, with
//! search, visit history and removal by contact handle.

use std::collections::HashMap;

use log::{debug, info};
use shared::{add_days, format_day_short, parse_iso_date, Booking};
use thiserror::Error;

use super::booking_sheet::HISTORY_DAYS;
use super::query_cache::{InvalidateScope, QueryCache, QueryKey};
use crate::io::{ApiClient, ApiError};
use crate::stores::{Store, SubscriptionId};

/// Upper bound used for "all upcoming"
pub const FAR_FUTURE: &str = "2099-12-31";
const WEEK_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientsError {
    #[error("Выберите диапазон дат")]
    MissingRange,
    #[error("Некорректная дата: {0}")]
    InvalidDate(String),
    #[error("Начало диапазона позже конца")]
    ReversedRange,
    #[error("Укажите ссылку клиента")]
    MissingLink,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Date range the roster is built from
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RangePreset {
    /// Trailing year up to today
    #[default]
    History,
    Today,
    /// Today and the following seven days
    Week,
    /// Today onwards
    AllUpcoming,
    Custom { start: String, end: String },
}

impl RangePreset {
    /// Inclusive `(start, end)` ISO dates relative to `today`
    pub fn bounds(&self, today: &str) -> Result<(String, String), ClientsError> {
        let today = today.to_string();
        let shifted = |delta: i64| {
            add_days(&today, delta).ok_or_else(|| ClientsError::InvalidDate(today.clone()))
        };
        match self {
            RangePreset::History => Ok((shifted(-HISTORY_DAYS)?, today.clone())),
            RangePreset::Today => Ok((today.clone(), today.clone())),
            RangePreset::Week => Ok((today.clone(), shifted(WEEK_DAYS)?)),
            RangePreset::AllUpcoming => Ok((today.clone(), FAR_FUTURE.to_string())),
            RangePreset::Custom { start, end } => {
                let (start, end) = (start.trim(), end.trim());
                if start.is_empty() || end.is_empty() {
                    return Err(ClientsError::MissingRange);
                }
                let first = parse_iso_date(start)
                    .ok_or_else(|| ClientsError::InvalidDate(start.to_string()))?;
                let last = parse_iso_date(end)
                    .ok_or_else(|| ClientsError::InvalidDate(end.to_string()))?;
                if first > last {
                    return Err(ClientsError::ReversedRange);
                }
                Ok((start.to_string(), end.to_string()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Visit {
    pub booking_id: i64,
    pub date: String,
    pub time: String,
}

impl Visit {
    /// `"13.06"`
    pub fn day_label(&self) -> String {
        format_day_short(&self.date)
    }
}

/// All bookings of one client within the loaded range
#[derive(Debug, Clone, PartialEq)]
pub struct ClientGroup {
    /// Contact handle, or the name when no handle was recorded
    pub key: String,
    pub name: String,
    pub link: String,
    /// Newest first
    pub visits: Vec<Visit>,
}

impl ClientGroup {
    pub fn visit_count(&self) -> usize {
        self.visits.len()
    }

    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.name.to_lowercase().contains(&term)
            || self.link.to_lowercase().contains(&term)
    }

    fn latest(&self) -> Option<(&str, &str)> {
        self.visits.first().map(|v| (v.date.as_str(), v.time.as_str()))
    }
}

/// Group bookings by contact, visits newest first, most recent clients first
pub fn group_clients(bookings: &[Booking]) -> Vec<ClientGroup> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, ClientGroup> = HashMap::new();

    for booking in bookings {
        let key = booking.roster_key().to_string();
        let group = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            ClientGroup {
                key,
                name: booking.name.clone(),
                link: booking.link.clone(),
                visits: Vec::new(),
            }
        });
        group.visits.push(Visit {
            booking_id: booking.id,
            date: booking.date.clone(),
            time: booking.normalized_time(),
        });
    }

    let mut grouped: Vec<ClientGroup> = order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .map(|mut group| {
            group
                .visits
                .sort_by(|a, b| (&b.date, &b.time).cmp(&(&a.date, &a.time)));
            group
        })
        .collect();
    grouped.sort_by(|a, b| b.latest().cmp(&a.latest()));
    grouped
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientsState {
    pub preset: RangePreset,
    pub range: Option<(String, String)>,
    pub groups: Vec<ClientGroup>,
    pub search: String,
    /// Key of the group whose history is open
    pub history: Option<String>,
    pub loading: bool,
}

#[derive(Clone)]
pub struct ClientsScreen {
    api: ApiClient,
    cache: QueryCache,
    today: String,
    state: Store<ClientsState>,
}

impl ClientsScreen {
    pub fn new(api: ApiClient, cache: QueryCache, today: &str) -> Self {
        Self {
            api,
            cache,
            today: today.to_string(),
            state: Store::new(ClientsState::default()),
        }
    }

    pub fn state(&self) -> ClientsState {
        self.state.get()
    }

    pub fn subscribe(&self, listener: impl Fn(&ClientsState) + 'static) -> SubscriptionId {
        self.state.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }

    /// Switch to a preset and load its range. An invalid custom range
    /// leaves the current roster untouched.
    pub async fn load(&self, preset: RangePreset) -> Result<(), ClientsError> {
        let (start, end) = preset.bounds(&self.today)?;
        debug!("Loading client roster {}..{}", start, end);
        self.state.update(|s| {
            s.preset = preset;
            s.range = Some((start.clone(), end.clone()));
            s.loading = true;
        });
        self.fetch(start, end).await
    }

    /// Reload the current range, or the default history when nothing was loaded
    pub async fn refresh(&self) -> Result<(), ClientsError> {
        match self.state.with(|s| s.range.clone()) {
            Some((start, end)) => {
                self.state.update(|s| s.loading = true);
                self.fetch(start, end).await
            }
            None => self.load(RangePreset::History).await,
        }
    }

    async fn fetch(&self, start: String, end: String) -> Result<(), ClientsError> {
        let result = self
            .cache
            .get_or_fetch(
                QueryKey::ClientsByRange {
                    start: start.clone(),
                    end: end.clone(),
                },
                || self.api.clients_by_range(&start, &end),
            )
            .await;

        let still_current = self
            .state
            .with(|s| s.range.as_ref() == Some(&(start.clone(), end.clone())));
        if !still_current {
            return result.map(|_| ()).map_err(ClientsError::from);
        }
        self.state.update(|s| s.loading = false);
        let bookings = result?;
        let groups = group_clients(&bookings);
        debug!("Roster has {} clients from {} bookings", groups.len(), bookings.len());
        self.state.update(|s| s.groups = groups);
        Ok(())
    }

    pub fn set_search(&self, term: &str) {
        self.state.update(|s| s.search = term.to_string());
    }

    /// Groups matching the search term
    pub fn visible(&self) -> Vec<ClientGroup> {
        self.state.with(|s| {
            s.groups
                .iter()
                .filter(|group| group.matches(&s.search))
                .cloned()
                .collect()
        })
    }

    pub fn open_history(&self, key: &str) {
        self.state.update(|s| s.history = Some(key.to_string()));
    }

    pub fn close_history(&self) {
        self.state.update(|s| s.history = None);
    }

    pub fn history(&self) -> Option<ClientGroup> {
        self.state.with(|s| {
            let key = s.history.as_ref()?;
            s.groups.iter().find(|group| &group.key == key).cloned()
        })
    }

    /// Remove every booking recorded under a contact handle
    pub async fn delete_by_link(&self, link: &str) -> Result<(), ClientsError> {
        let link = link.trim();
        if link.is_empty() {
            return Err(ClientsError::MissingLink);
        }
        self.api.delete_by_link(link).await?;
        info!("Deleted bookings of {}", link);

        self.cache.invalidate(InvalidateScope::Clients);
        self.state.update(|s| {
            if s.history.as_deref() == Some(link) {
                s.history = None;
            }
        });
        self.refresh().await
    }
}
