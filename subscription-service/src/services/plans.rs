//! Plan writes: lineage locking, version resolution and persistence.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::sync::Arc;

use super::calendar::BusinessCalendar;
use super::ids::{EntityKind, IdGenerator};
use super::locks::{plan_reference_key, KeyedLocks};
use super::metrics::record_plan_version;
use super::store::Store;
use super::versioning::{resolve_version, VersionDecision};
use crate::models::{Lookup, LookupKind, PlanLineage, SubscriptionPlan};

/// Attempts at resolving and writing a version before giving up on a
/// conflicting concurrent writer.
const MAX_VERSION_ATTEMPTS: usize = 3;

/// Validated plan attributes from a create or replace request.
#[derive(Debug, Clone)]
pub struct PlanTerms {
    pub language_id: String,
    pub mode_id: String,
    pub duration_in_months: i32,
    pub price: Decimal,
    pub start_date: Option<NaiveDate>,
}

impl PlanTerms {
    pub fn lineage(&self) -> PlanLineage {
        PlanLineage {
            language_id: self.language_id.clone(),
            mode_id: self.mode_id.clone(),
            duration_in_months: self.duration_in_months,
        }
    }
}

#[derive(Debug)]
pub enum PlanWrite {
    Created(SubscriptionPlan),
    /// The latest plan of the lineage already carries this price.
    Unchanged(SubscriptionPlan),
}

#[derive(Clone)]
pub struct PlanService {
    store: Arc<dyn Store>,
    ids: IdGenerator,
    locks: KeyedLocks,
    calendar: BusinessCalendar,
}

impl PlanService {
    pub fn new(
        store: Arc<dyn Store>,
        ids: IdGenerator,
        locks: KeyedLocks,
        calendar: BusinessCalendar,
    ) -> Self {
        Self {
            store,
            ids,
            locks,
            calendar,
        }
    }

    pub async fn create(&self, terms: PlanTerms) -> Result<PlanWrite, AppError> {
        let (language, mode) = self.resolve_references(&terms).await?;
        let lineage = terms.lineage();
        let _guard = self.locks.lock(&lineage.lock_key()).await;

        let mut id: Option<String> = None;
        let mut attempt = 1;
        loop {
            let latest = self.store.latest_plan_in_lineage(&lineage).await?;
            let decision = resolve_version(latest.as_ref(), terms.price);

            if let (VersionDecision::Reuse(_), Some(existing)) = (decision, latest) {
                record_plan_version(decision.outcome());
                tracing::info!(
                    plan_id = %existing.id,
                    version = %existing.version,
                    "Plan price unchanged, returning latest version"
                );
                return Ok(PlanWrite::Unchanged(existing));
            }

            let plan_id = match &id {
                Some(plan_id) => plan_id.clone(),
                None => {
                    let plan_id = self.ids.next(EntityKind::SubscriptionPlan).await?;
                    id = Some(plan_id.clone());
                    plan_id
                }
            };
            let now = self.calendar.now();
            let plan = SubscriptionPlan {
                id: plan_id,
                version: decision.tag(),
                version_number: decision.number(),
                name: SubscriptionPlan::display_name(
                    terms.duration_in_months,
                    &language.name,
                    &mode.name,
                ),
                start_date: terms.start_date.unwrap_or_else(|| self.calendar.today()),
                price: terms.price,
                language_id: terms.language_id.clone(),
                mode_id: terms.mode_id.clone(),
                duration_in_months: terms.duration_in_months,
                created_at: now,
                updated_at: now,
            };

            match self.store.insert_plan(&plan).await {
                Ok(()) => {
                    record_plan_version(decision.outcome());
                    tracing::info!(
                        plan_id = %plan.id,
                        version = %plan.version,
                        name = %plan.name,
                        "Subscription plan created"
                    );
                    return Ok(PlanWrite::Created(plan));
                }
                Err(e) if e.is_conflict() && attempt < MAX_VERSION_ATTEMPTS => {
                    tracing::warn!(
                        attempt,
                        version = %plan.version,
                        "Plan version taken by a concurrent writer, retrying"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn replace(&self, id: &str, terms: PlanTerms) -> Result<SubscriptionPlan, AppError> {
        let (language, mode) = self.resolve_references(&terms).await?;
        let lineage = terms.lineage();
        let _guard = self.locks.lock(&lineage.lock_key()).await;

        let mut attempt = 1;
        loop {
            let current = self
                .store
                .get_plan(id)
                .await?
                .ok_or_else(|| AppError::not_found("Subscription plan not found"))?;

            let latest = self.store.latest_plan_in_lineage(&lineage).await?;
            let decision = match resolve_version(latest.as_ref(), terms.price) {
                VersionDecision::Reuse(_) if latest.as_ref().is_some_and(|l| l.id != id) => {
                    return Err(AppError::conflict(
                        "A plan with this language, mode, duration and price already exists",
                    ));
                }
                decision => decision,
            };

            let plan = SubscriptionPlan {
                version: decision.tag(),
                version_number: decision.number(),
                name: SubscriptionPlan::display_name(
                    terms.duration_in_months,
                    &language.name,
                    &mode.name,
                ),
                start_date: terms.start_date.unwrap_or(current.start_date),
                price: terms.price,
                language_id: terms.language_id.clone(),
                mode_id: terms.mode_id.clone(),
                duration_in_months: terms.duration_in_months,
                updated_at: self.calendar.now(),
                ..current
            };

            match self.store.replace_plan(&plan).await {
                Ok(true) => {
                    record_plan_version(decision.outcome());
                    tracing::info!(plan_id = %plan.id, version = %plan.version, "Subscription plan replaced");
                    return Ok(plan);
                }
                Ok(false) => return Err(AppError::not_found("Subscription plan not found")),
                Err(e) if e.is_conflict() && attempt < MAX_VERSION_ATTEMPTS => {
                    tracing::warn!(attempt, plan_id = %id, "Plan version conflict, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn get(&self, id: &str) -> Result<SubscriptionPlan, AppError> {
        self.store
            .get_plan(id)
            .await?
            .ok_or_else(|| AppError::not_found("Subscription plan not found"))
    }

    pub async fn list(&self) -> Result<Vec<SubscriptionPlan>, AppError> {
        self.store.list_plans().await
    }

    /// Plans still referenced by subscriptions are kept.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let _guard = self.locks.lock(&plan_reference_key(id)).await;
        let references = self.store.count_subscriptions_for_plan(id).await?;
        if references > 0 {
            return Err(AppError::conflict(format!(
                "Subscription plan is used by {} subscription(s)",
                references
            )));
        }
        if !self.store.delete_plan(id).await? {
            return Err(AppError::not_found("Subscription plan not found"));
        }
        tracing::info!(plan_id = %id, "Subscription plan deleted");
        Ok(())
    }

    async fn resolve_references(&self, terms: &PlanTerms) -> Result<(Lookup, Lookup), AppError> {
        let language = self
            .store
            .get_lookup(LookupKind::Language, &terms.language_id)
            .await?
            .ok_or_else(|| AppError::not_found("Subscription language not found"))?;
        let mode = self
            .store
            .get_lookup(LookupKind::Mode, &terms.mode_id)
            .await?
            .ok_or_else(|| AppError::not_found("Subscription mode not found"))?;
        Ok((language, mode))
    }
}
