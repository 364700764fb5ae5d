//! Reference data: the four name lookups and payment modes.

use service_core::error::AppError;
use std::sync::Arc;

use super::ids::{EntityKind, IdGenerator};
use super::store::Store;
use crate::models::{Lookup, LookupKind, PaymentMode};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
    ids: IdGenerator,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>, ids: IdGenerator) -> Self {
        Self { store, ids }
    }

    pub async fn list_lookups(&self, kind: LookupKind) -> Result<Vec<Lookup>, AppError> {
        self.store.list_lookups(kind).await
    }

    pub async fn get_lookup(&self, kind: LookupKind, id: &str) -> Result<Lookup, AppError> {
        self.store
            .get_lookup(kind, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("{} not found", kind.label())))
    }

    /// Names are unique per kind; a duplicate surfaces as a conflict.
    pub async fn create_lookup(&self, kind: LookupKind, name: String) -> Result<Lookup, AppError> {
        let lookup = Lookup {
            id: self.ids.next(kind.entity()).await?,
            name,
        };
        self.store.insert_lookup(kind, &lookup).await?;
        tracing::info!(kind = kind.collection(), id = %lookup.id, name = %lookup.name, "Lookup created");
        Ok(lookup)
    }

    pub async fn replace_lookup(
        &self,
        kind: LookupKind,
        id: &str,
        name: String,
    ) -> Result<Lookup, AppError> {
        let lookup = Lookup {
            id: id.to_string(),
            name,
        };
        if !self.store.replace_lookup(kind, &lookup).await? {
            return Err(AppError::not_found(format!("{} not found", kind.label())));
        }
        tracing::info!(kind = kind.collection(), id = %id, "Lookup replaced");
        Ok(lookup)
    }

    pub async fn delete_lookup(&self, kind: LookupKind, id: &str) -> Result<(), AppError> {
        if !self.store.delete_lookup(kind, id).await? {
            return Err(AppError::not_found(format!("{} not found", kind.label())));
        }
        tracing::info!(kind = kind.collection(), id = %id, "Lookup deleted");
        Ok(())
    }

    pub async fn list_payment_modes(&self) -> Result<Vec<PaymentMode>, AppError> {
        self.store.list_payment_modes().await
    }

    pub async fn get_payment_mode(&self, id: &str) -> Result<PaymentMode, AppError> {
        self.store
            .get_payment_mode(id)
            .await?
            .ok_or_else(|| AppError::not_found("Payment mode not found"))
    }

    pub async fn next_payment_mode_id(&self) -> Result<String, AppError> {
        self.ids.next(EntityKind::PaymentMode).await
    }

    pub async fn create_payment_mode(&self, mode: PaymentMode) -> Result<PaymentMode, AppError> {
        self.store.insert_payment_mode(&mode).await?;
        tracing::info!(payment_mode_id = %mode.id, "Payment mode created");
        Ok(mode)
    }

    pub async fn replace_payment_mode(&self, mode: PaymentMode) -> Result<PaymentMode, AppError> {
        if !self.store.replace_payment_mode(&mode).await? {
            return Err(AppError::not_found("Payment mode not found"));
        }
        tracing::info!(payment_mode_id = %mode.id, "Payment mode replaced");
        Ok(mode)
    }

    pub async fn delete_payment_mode(&self, id: &str) -> Result<(), AppError> {
        if !self.store.delete_payment_mode(id).await? {
            return Err(AppError::not_found("Payment mode not found"));
        }
        tracing::info!(payment_mode_id = %id, "Payment mode deleted");
        Ok(())
    }
}
