use chrono::{DateTime, Utc};
use service_core::error::AppError;
use std::sync::Arc;

use super::calendar::BusinessCalendar;
use super::ids::{EntityKind, IdGenerator};
use super::store::Store;
use crate::dtos::non_blank;
use crate::dtos::subscriber::SubscriberRequest;
use crate::models::{
    LookupKind, MagazineSubscriber, SearchField, StatusFilter, SubscriberFilter, Subscription,
};

pub const DEFAULT_PAGE_SIZE: u64 = 50;
pub const MAX_PAGE_SIZE: u64 = 500;

#[derive(Clone)]
pub struct SubscriberService {
    store: Arc<dyn Store>,
    ids: IdGenerator,
    calendar: BusinessCalendar,
}

impl SubscriberService {
    pub fn new(store: Arc<dyn Store>, ids: IdGenerator, calendar: BusinessCalendar) -> Self {
        Self {
            store,
            ids,
            calendar,
        }
    }

    pub async fn create(&self, request: SubscriberRequest) -> Result<MagazineSubscriber, AppError> {
        self.check_references(&request).await?;

        let id = self.ids.next(EntityKind::Subscriber).await?;
        let subscriber = build_subscriber(
            request,
            ManagedFields {
                id,
                has_active_subscriptions: false,
                is_deleted: false,
                created_at: self.calendar.now(),
            },
        );
        self.store.insert_subscriber(&subscriber).await?;

        tracing::info!(subscriber_id = %subscriber.id, "Subscriber created");
        Ok(subscriber)
    }

    /// Replace the editable fields. The aggregate flag, soft-delete flag and
    /// creation time are kept.
    pub async fn replace(
        &self,
        id: &str,
        request: SubscriberRequest,
    ) -> Result<MagazineSubscriber, AppError> {
        let existing = self.get(id).await?;
        self.check_references(&request).await?;

        let subscriber = build_subscriber(
            request,
            ManagedFields {
                id: existing.id,
                has_active_subscriptions: existing.has_active_subscriptions,
                is_deleted: existing.is_deleted,
                created_at: existing.created_at,
            },
        );
        if !self.store.replace_subscriber(&subscriber).await? {
            return Err(AppError::not_found("Subscriber not found"));
        }

        tracing::info!(subscriber_id = %subscriber.id, "Subscriber replaced");
        Ok(subscriber)
    }

    pub async fn get(&self, id: &str) -> Result<MagazineSubscriber, AppError> {
        self.store
            .get_subscriber(id)
            .await?
            .ok_or_else(|| AppError::not_found("Subscriber not found"))
    }

    pub async fn get_with_subscriptions(
        &self,
        id: &str,
    ) -> Result<(MagazineSubscriber, Vec<Subscription>), AppError> {
        let subscriber = self.get(id).await?;
        let subscriptions = self.store.list_subscriptions_for_subscriber(id).await?;
        Ok((subscriber, subscriptions))
    }

    /// One page of subscribers plus the total matching count. Pages start at 1.
    pub async fn list(
        &self,
        mut filter: SubscriberFilter,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<MagazineSubscriber>, u64), AppError> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        filter.skip = (page - 1).saturating_mul(page_size).min(i64::MAX as u64);
        filter.limit = Some(page_size as i64);

        let total = self.store.count_subscribers(&filter).await?;
        let items = self.store.list_subscribers(&filter).await?;
        Ok((items, total))
    }

    /// Soft delete: the record stays, flagged as deleted.
    pub async fn soft_delete(&self, id: &str) -> Result<(), AppError> {
        if !self.store.set_subscriber_deleted(id, true).await? {
            return Err(AppError::not_found("Subscriber not found"));
        }
        tracing::info!(subscriber_id = %id, "Subscriber soft deleted");
        Ok(())
    }

    pub async fn activate(&self, id: &str) -> Result<(), AppError> {
        if !self.store.set_subscriber_deleted(id, false).await? {
            return Err(AppError::not_found("Subscriber not found"));
        }
        tracing::info!(subscriber_id = %id, "Subscriber activated");
        Ok(())
    }

    /// Case-insensitive substring search on one whitelisted field. Without
    /// both a field and a query every subscriber is returned.
    pub async fn search(
        &self,
        filter: Option<&str>,
        query: Option<&str>,
    ) -> Result<Vec<MagazineSubscriber>, AppError> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        match (filter, query) {
            (Some(field), Some(query)) => {
                let field = SearchField::parse(field).ok_or_else(|| {
                    AppError::validation(
                        "filter",
                        "unsupported",
                        format!("Cannot search subscribers by '{}'", field),
                    )
                })?;
                self.store.search_subscribers(field, query).await
            }
            _ => {
                self.store
                    .list_subscribers(&SubscriberFilter {
                        status: StatusFilter::All,
                        ..Default::default()
                    })
                    .await
            }
        }
    }

    async fn check_references(&self, request: &SubscriberRequest) -> Result<(), AppError> {
        if self
            .store
            .get_lookup(LookupKind::Category, request.category.trim())
            .await?
            .is_none()
        {
            return Err(AppError::not_found("Subscriber category not found"));
        }
        if self
            .store
            .get_lookup(LookupKind::SubscriberType, request.stype.trim())
            .await?
            .is_none()
        {
            return Err(AppError::not_found("Subscriber type not found"));
        }
        Ok(())
    }
}

/// Fields the service owns rather than the request.
struct ManagedFields {
    id: String,
    has_active_subscriptions: bool,
    is_deleted: bool,
    created_at: DateTime<Utc>,
}

fn build_subscriber(request: SubscriberRequest, managed: ManagedFields) -> MagazineSubscriber {
    MagazineSubscriber {
        id: managed.id,
        name: request.name.trim().to_string(),
        registration_number: non_blank(request.registration_number),
        address: request.address.trim().to_string(),
        city_town: request.city_town.trim().to_string(),
        district: non_blank(request.district),
        state: request.state.trim().to_string(),
        pincode: request.pincode.trim().to_string(),
        phone: request.phone.trim().to_string(),
        email: non_blank(request.email),
        category_id: Some(request.category.trim().to_string()),
        stype_id: Some(request.stype.trim().to_string()),
        notes: non_blank(request.notes),
        has_active_subscriptions: managed.has_active_subscriptions,
        is_deleted: managed.is_deleted,
        created_at: managed.created_at,
    }
}
