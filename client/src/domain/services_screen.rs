//! Services screen: list of locally declared services with a create/edit
//! sheet backed by [`ServicesStore`].

use log::{debug, warn};
use shared::ServiceItem;
use thiserror::Error;

use crate::stores::{ServicePatch, ServicesStore, Store, SubscriptionId};

const DEFAULT_DURATION_MINUTES: u32 = 60;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceDraftError {
    #[error("Введите название услуги")]
    EmptyTitle,
    #[error("Длительность должна быть целым числом минут")]
    InvalidDuration,
    #[error("Некорректная цена")]
    InvalidPrice,
    #[error("Услуга не найдена")]
    NotFound,
    #[error("Не удалось сохранить услуги: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for ServiceDraftError {
    fn from(e: anyhow::Error) -> Self {
        ServiceDraftError::Storage(format!("{:#}", e))
    }
}

/// Sheet form values as typed
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDraft {
    pub title: String,
    pub duration_minutes: String,
    pub price: String,
}

impl Default for ServiceDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            duration_minutes: DEFAULT_DURATION_MINUTES.to_string(),
            price: "0".to_string(),
        }
    }
}

impl ServiceDraft {
    pub fn from_service(service: &ServiceItem) -> Self {
        Self {
            title: service.title.clone(),
            duration_minutes: service.duration_minutes.to_string(),
            price: service.price.map(format_price).unwrap_or_default(),
        }
    }

    /// Validated `(title, duration, price)`; a blank duration is zero and a
    /// blank price means none
    pub fn parse(&self) -> Result<(String, u32, Option<f64>), ServiceDraftError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ServiceDraftError::EmptyTitle);
        }

        let duration = match self.duration_minutes.trim() {
            "" => 0,
            text => text
                .parse::<u32>()
                .map_err(|_| ServiceDraftError::InvalidDuration)?,
        };

        let price = match self.price.trim().replace(',', ".").as_str() {
            "" => None,
            text => match text.parse::<f64>() {
                Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
                _ => return Err(ServiceDraftError::InvalidPrice),
            },
        };

        Ok((title.to_string(), duration, price))
    }
}

fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{}", price as i64)
    } else {
        format!("{}", price)
    }
}

/// `"60 мин · 1500 ₽"`
pub fn service_summary(service: &ServiceItem) -> String {
    format!(
        "{} мин · {} ₽",
        service.duration_minutes,
        format_price(service.price.unwrap_or(0.0))
    )
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServicesSheetState {
    pub open: bool,
    /// Id of the service being edited, `None` when creating
    pub editing: Option<String>,
    pub draft: ServiceDraft,
}

#[derive(Clone)]
pub struct ServicesScreen {
    services: ServicesStore,
    sheet: Store<ServicesSheetState>,
}

impl ServicesScreen {
    pub fn new(services: ServicesStore) -> Self {
        Self {
            services,
            sheet: Store::new(ServicesSheetState::default()),
        }
    }

    pub fn services(&self) -> Vec<ServiceItem> {
        self.services.list()
    }

    pub fn sheet(&self) -> ServicesSheetState {
        self.sheet.get()
    }

    pub fn subscribe(&self, listener: impl Fn(&ServicesSheetState) + 'static) -> SubscriptionId {
        self.sheet.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.sheet.unsubscribe(id)
    }

    pub fn open_create(&self) {
        self.sheet.set(ServicesSheetState {
            open: true,
            editing: None,
            draft: ServiceDraft::default(),
        });
    }

    /// Returns `false` when the service no longer exists
    pub fn open_edit(&self, id: &str) -> bool {
        let Some(service) = self.services.find(id) else {
            warn!("Cannot edit unknown service {}", id);
            return false;
        };
        self.sheet.set(ServicesSheetState {
            open: true,
            editing: Some(service.id.clone()),
            draft: ServiceDraft::from_service(&service),
        });
        true
    }

    pub fn edit_draft(&self, f: impl FnOnce(&mut ServiceDraft)) {
        self.sheet.update(|s| f(&mut s.draft));
    }

    pub fn close(&self) {
        self.sheet.update(|s| s.open = false);
    }

    pub fn sheet_title(&self) -> &'static str {
        if self.sheet.with(|s| s.editing.is_some()) {
            "Редактировать услугу"
        } else {
            "Новая услуга"
        }
    }

    pub fn save_label(&self) -> &'static str {
        if self.sheet.with(|s| s.editing.is_some()) {
            "Сохранить"
        } else {
            "Создать"
        }
    }

    /// Validate the draft and write it to the store. The sheet stays open
    /// with the draft intact on failure.
    pub fn save(&self) -> Result<ServiceItem, ServiceDraftError> {
        let (editing, draft) = self.sheet.with(|s| (s.editing.clone(), s.draft.clone()));
        let (title, duration_minutes, price) = draft.parse()?;

        let saved = match editing {
            Some(id) => {
                let patch = ServicePatch {
                    title: Some(title),
                    duration_minutes: Some(duration_minutes),
                    price: Some(price),
                };
                if !self.services.update(&id, patch)? {
                    return Err(ServiceDraftError::NotFound);
                }
                self.services.find(&id).ok_or(ServiceDraftError::NotFound)?
            }
            None => self.services.add(&title, duration_minutes, price)?,
        };
        debug!("Saved service {}", saved.id);

        self.close();
        Ok(saved)
    }

    pub fn remove(&self, id: &str) -> Result<bool, ServiceDraftError> {
        Ok(self.services.remove(id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::Harness;

    #[test]
    fn test_draft_parse() {
        let draft = ServiceDraft {
            title: "  Педикюр ".into(),
            duration_minutes: "90".into(),
            price: "2500,50".into(),
        };
        assert_eq!(draft.parse().unwrap(), ("Педикюр".to_string(), 90, Some(2500.5)));

        let blank = ServiceDraft {
            title: "Снятие".into(),
            duration_minutes: "".into(),
            price: " ".into(),
        };
        assert_eq!(blank.parse().unwrap(), ("Снятие".to_string(), 0, None));
    }

    #[test]
    fn test_draft_rejects_bad_input() {
        let mut draft = ServiceDraft::default();
        assert_eq!(draft.parse(), Err(ServiceDraftError::EmptyTitle));

        draft.title = "Маникюр".into();
        draft.duration_minutes = "час".into();
        assert_eq!(draft.parse(), Err(ServiceDraftError::InvalidDuration));

        draft.duration_minutes = "60".into();
        draft.price = "-1".into();
        assert_eq!(draft.parse(), Err(ServiceDraftError::InvalidPrice));
    }

    #[test]
    fn test_create_service() {
        let h = Harness::new();
        let screen = ServicesScreen::new(h.services.clone());

        screen.open_create();
        assert_eq!(screen.sheet_title(), "Новая услуга");
        assert_eq!(screen.save_label(), "Создать");
        screen.edit_draft(|d| {
            d.title = "Покрытие".into();
            d.price = "1500".into();
        });

        let saved = screen.save().unwrap();
        assert_eq!(saved.duration_minutes, 60);
        assert_eq!(service_summary(&saved), "60 мин · 1500 ₽");
        assert!(!screen.sheet().open);
        assert_eq!(screen.services().len(), 2);
    }

    #[test]
    fn test_empty_title_keeps_sheet_open() {
        let h = Harness::new();
        let screen = ServicesScreen::new(h.services.clone());
        screen.open_create();
        screen.edit_draft(|d| d.title = "   ".into());

        assert_eq!(screen.save(), Err(ServiceDraftError::EmptyTitle));
        assert!(screen.sheet().open);
        assert_eq!(screen.services().len(), 1);
    }

    #[test]
    fn test_edit_existing_service() {
        let h = Harness::new();
        let screen = ServicesScreen::new(h.services.clone());

        assert!(!screen.open_edit("missing"));
        assert!(screen.open_edit("service-basic"));
        assert_eq!(screen.sheet_title(), "Редактировать услугу");
        assert_eq!(screen.sheet().draft.price, "0");

        screen.edit_draft(|d| d.duration_minutes = "75".into());
        screen.save().unwrap();
        let service = h.services.find("service-basic").unwrap();
        assert_eq!(service.duration_minutes, 75);
        assert_eq!(service.title, "Маникюр");
    }

    #[test]
    fn test_edit_of_removed_service_fails() {
        let h = Harness::new();
        let screen = ServicesScreen::new(h.services.clone());
        screen.open_edit("service-basic");
        assert!(screen.remove("service-basic").unwrap());

        assert_eq!(screen.save(), Err(ServiceDraftError::NotFound));
        assert!(screen.services().is_empty());
    }
}
