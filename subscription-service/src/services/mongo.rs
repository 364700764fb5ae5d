use async_trait::async_trait;
use chrono::NaiveDate;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

use super::store::Store;
use crate::models::{
    AdminSession, AdminUser, Lookup, LookupKind, MagazineSubscriber, PaymentMode, PlanLineage,
    SearchField, StatusFilter, SubscriberFilter, Subscription, SubscriptionPlan,
};

const COUNTERS: &str = "counters";

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Quote regex metacharacters so user input matches literally.
fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\^$.|?*+()[]{}/".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn subscriber_query(filter: &SubscriberFilter) -> Document {
    let mut query = Document::new();
    match filter.status {
        StatusFilter::Active => {
            query.insert("isDeleted", false);
        }
        StatusFilter::Inactive => {
            query.insert("isDeleted", true);
        }
        StatusFilter::All => {}
    }
    if let Some(category_id) = &filter.category_id {
        query.insert("category_id", category_id.as_str());
    }
    if let Some(stype_id) = &filter.stype_id {
        query.insert("stype_id", stype_id.as_str());
    }
    query
}

fn by_id() -> FindOptions {
    FindOptions::builder().sort(doc! { "_id": 1 }).build()
}

#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for subscription-service");

        for kind in LookupKind::ALL {
            self.create_index(
                &self.lookups(kind),
                doc! { "name": 1 },
                unique(&format!("{}_name_unique", kind.collection())),
            )
            .await?;
        }

        self.create_index(
            &self.plans(),
            doc! { "language_id": 1, "mode_id": 1, "duration_in_months": 1, "version_number": 1 },
            unique("plan_lineage_version_unique"),
        )
        .await?;

        self.create_index(
            &self.subscribers(),
            doc! { "registration_number": 1 },
            IndexOptions::builder()
                .name("registration_number_unique".to_string())
                .unique(true)
                .partial_filter_expression(doc! { "registration_number": { "$type": "string" } })
                .build(),
        )
        .await?;
        self.create_index(
            &self.subscribers(),
            doc! { "isDeleted": 1, "category_id": 1, "stype_id": 1 },
            named("subscriber_report_lookup"),
        )
        .await?;

        self.create_index(
            &self.subscriptions(),
            doc! { "subscriber_id": 1, "end_date": 1 },
            named("subscription_subscriber_end_date"),
        )
        .await?;
        self.create_index(
            &self.subscriptions(),
            doc! { "plan_id": 1 },
            named("subscription_plan_lookup"),
        )
        .await?;

        for field in ["username", "email", "aadhaar", "mobile"] {
            let mut keys = Document::new();
            keys.insert(field, 1);
            self.create_index(&self.admins(), keys, unique(&format!("admin_{}_unique", field)))
                .await?;
        }

        self.create_index(
            &self.sessions(),
            doc! { "admin_id": 1 },
            named("session_admin_lookup"),
        )
        .await?;

        tracing::info!("MongoDB indexes ready");
        Ok(())
    }

    async fn create_index<T>(
        &self,
        collection: &Collection<T>,
        keys: Document,
        options: IndexOptions,
    ) -> Result<(), AppError>
    where
        T: Send + Sync,
    {
        let name = options.name.clone().unwrap_or_default();
        let index = IndexModel::builder().keys(keys).options(options).build();
        collection.create_index(index, None).await.map_err(|e| {
            tracing::error!(
                collection = %collection.name(),
                index = %name,
                "Failed to create index: {}",
                e
            );
            AppError::from(e)
        })?;
        tracing::debug!(collection = %collection.name(), index = %name, "Index created");
        Ok(())
    }

    fn lookups(&self, kind: LookupKind) -> Collection<Lookup> {
        self.db.collection(kind.collection())
    }

    fn payment_modes(&self) -> Collection<PaymentMode> {
        self.db.collection("payment_modes")
    }

    fn plans(&self) -> Collection<SubscriptionPlan> {
        self.db.collection("subscription_plans")
    }

    fn subscribers(&self) -> Collection<MagazineSubscriber> {
        self.db.collection("magazine_subscribers")
    }

    fn subscriptions(&self) -> Collection<Subscription> {
        self.db.collection("subscriptions")
    }

    fn admins(&self) -> Collection<AdminUser> {
        self.db.collection("admin_users")
    }

    fn sessions(&self) -> Collection<AdminSession> {
        self.db.collection("admin_sessions")
    }
}

fn named(name: &str) -> IndexOptions {
    IndexOptions::builder().name(name.to_string()).build()
}

fn unique(name: &str) -> IndexOptions {
    IndexOptions::builder()
        .name(name.to_string())
        .unique(true)
        .build()
}

#[async_trait]
impl Store for MongoStore {
    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    async fn next_sequence(&self, counter: &str) -> Result<u64, AppError> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .db
            .collection::<Document>(COUNTERS)
            .find_one_and_update(
                doc! { "_id": counter },
                doc! { "$inc": { "seq": 1_i64 } },
                options,
            )
            .await?
            .ok_or_else(|| {
                AppError::DatabaseError(anyhow::anyhow!("counter {} was not upserted", counter))
            })?;
        let value = updated
            .get_i64("seq")
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(value.max(0) as u64)
    }

    async fn insert_lookup(&self, kind: LookupKind, lookup: &Lookup) -> Result<(), AppError> {
        self.lookups(kind).insert_one(lookup, None).await?;
        Ok(())
    }

    async fn get_lookup(&self, kind: LookupKind, id: &str) -> Result<Option<Lookup>, AppError> {
        Ok(self.lookups(kind).find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_lookup_by_name(
        &self,
        kind: LookupKind,
        name: &str,
    ) -> Result<Option<Lookup>, AppError> {
        Ok(self
            .lookups(kind)
            .find_one(doc! { "name": name }, None)
            .await?)
    }

    async fn list_lookups(&self, kind: LookupKind) -> Result<Vec<Lookup>, AppError> {
        let cursor = self.lookups(kind).find(None, by_id()).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn replace_lookup(&self, kind: LookupKind, lookup: &Lookup) -> Result<bool, AppError> {
        let result = self
            .lookups(kind)
            .replace_one(doc! { "_id": &lookup.id }, lookup, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_lookup(&self, kind: LookupKind, id: &str) -> Result<bool, AppError> {
        let result = self.lookups(kind).delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_payment_mode(&self, mode: &PaymentMode) -> Result<(), AppError> {
        self.payment_modes().insert_one(mode, None).await?;
        Ok(())
    }

    async fn get_payment_mode(&self, id: &str) -> Result<Option<PaymentMode>, AppError> {
        Ok(self.payment_modes().find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_payment_modes(&self) -> Result<Vec<PaymentMode>, AppError> {
        let cursor = self.payment_modes().find(None, by_id()).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn replace_payment_mode(&self, mode: &PaymentMode) -> Result<bool, AppError> {
        let result = self
            .payment_modes()
            .replace_one(doc! { "_id": &mode.id }, mode, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_payment_mode(&self, id: &str) -> Result<bool, AppError> {
        let result = self.payment_modes().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_plan(&self, plan: &SubscriptionPlan) -> Result<(), AppError> {
        self.plans().insert_one(plan, None).await?;
        Ok(())
    }

    async fn get_plan(&self, id: &str) -> Result<Option<SubscriptionPlan>, AppError> {
        Ok(self.plans().find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, AppError> {
        let cursor = self.plans().find(None, by_id()).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn latest_plan_in_lineage(
        &self,
        lineage: &PlanLineage,
    ) -> Result<Option<SubscriptionPlan>, AppError> {
        // Legacy records only carry the tag, so the maximum is taken after
        // falling back to the parsed tag.
        let cursor = self
            .plans()
            .find(
                doc! {
                    "language_id": &lineage.language_id,
                    "mode_id": &lineage.mode_id,
                    "duration_in_months": lineage.duration_in_months,
                },
                None,
            )
            .await?;
        let plans: Vec<SubscriptionPlan> = cursor.try_collect().await?;
        Ok(plans
            .into_iter()
            .max_by_key(|plan| plan.effective_version_number()))
    }

    async fn replace_plan(&self, plan: &SubscriptionPlan) -> Result<bool, AppError> {
        let result = self
            .plans()
            .replace_one(doc! { "_id": &plan.id }, plan, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_plan(&self, id: &str) -> Result<bool, AppError> {
        let result = self.plans().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_subscriber(&self, subscriber: &MagazineSubscriber) -> Result<(), AppError> {
        self.subscribers().insert_one(subscriber, None).await?;
        Ok(())
    }

    async fn get_subscriber(&self, id: &str) -> Result<Option<MagazineSubscriber>, AppError> {
        Ok(self.subscribers().find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_subscribers(
        &self,
        filter: &SubscriberFilter,
    ) -> Result<Vec<MagazineSubscriber>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "_id": 1 })
            .skip(filter.skip)
            .limit(filter.limit)
            .build();
        let cursor = self
            .subscribers()
            .find(subscriber_query(filter), options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_subscribers(&self, filter: &SubscriberFilter) -> Result<u64, AppError> {
        Ok(self
            .subscribers()
            .count_documents(subscriber_query(filter), None)
            .await?)
    }

    async fn search_subscribers(
        &self,
        field: SearchField,
        query: &str,
    ) -> Result<Vec<MagazineSubscriber>, AppError> {
        let mut filter = Document::new();
        filter.insert(
            field.as_str(),
            doc! { "$regex": escape_regex(query), "$options": "i" },
        );
        let cursor = self.subscribers().find(filter, by_id()).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn replace_subscriber(&self, subscriber: &MagazineSubscriber) -> Result<bool, AppError> {
        let result = self
            .subscribers()
            .replace_one(doc! { "_id": &subscriber.id }, subscriber, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn set_subscriber_active_flag(&self, id: &str, value: bool) -> Result<bool, AppError> {
        let result = self
            .subscribers()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "hasActiveSubscriptions": value } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn set_subscriber_deleted(&self, id: &str, deleted: bool) -> Result<bool, AppError> {
        let result = self
            .subscribers()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "isDeleted": deleted } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn insert_subscription(&self, subscription: &Subscription) -> Result<(), AppError> {
        self.subscriptions().insert_one(subscription, None).await?;
        Ok(())
    }

    async fn get_subscription(&self, id: &str) -> Result<Option<Subscription>, AppError> {
        Ok(self.subscriptions().find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, AppError> {
        let cursor = self.subscriptions().find(None, by_id()).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn list_subscriptions_for_subscriber(
        &self,
        subscriber_id: &str,
    ) -> Result<Vec<Subscription>, AppError> {
        let cursor = self
            .subscriptions()
            .find(doc! { "subscriber_id": subscriber_id }, by_id())
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn replace_subscription(&self, subscription: &Subscription) -> Result<bool, AppError> {
        let result = self
            .subscriptions()
            .replace_one(doc! { "_id": &subscription.id }, subscription, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_subscription(&self, id: &str) -> Result<bool, AppError> {
        let result = self.subscriptions().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn count_current_subscriptions(
        &self,
        subscriber_id: &str,
        today: NaiveDate,
    ) -> Result<u64, AppError> {
        Ok(self
            .subscriptions()
            .count_documents(
                doc! {
                    "subscriber_id": subscriber_id,
                    "active": true,
                    "end_date": { "$gte": iso(today) },
                },
                None,
            )
            .await?)
    }

    async fn find_overlapping_subscription(
        &self,
        subscriber_id: &str,
        plan_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        exclude_id: Option<&str>,
    ) -> Result<Option<Subscription>, AppError> {
        let mut filter = doc! {
            "subscriber_id": subscriber_id,
            "plan_id": plan_id,
            "start_date": { "$lte": iso(end_date) },
            "end_date": { "$gte": iso(start_date) },
        };
        if let Some(id) = exclude_id {
            filter.insert("_id", doc! { "$ne": id });
        }
        Ok(self.subscriptions().find_one(filter, None).await?)
    }

    async fn count_subscriptions_for_plan(&self, plan_id: &str) -> Result<u64, AppError> {
        Ok(self
            .subscriptions()
            .count_documents(doc! { "plan_id": plan_id }, None)
            .await?)
    }

    async fn insert_admin(&self, admin: &AdminUser) -> Result<(), AppError> {
        self.admins().insert_one(admin, None).await?;
        Ok(())
    }

    async fn get_admin(&self, id: &str) -> Result<Option<AdminUser>, AppError> {
        Ok(self.admins().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_admin_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminUser>, AppError> {
        Ok(self
            .admins()
            .find_one(doc! { "username": username }, None)
            .await?)
    }

    async fn list_admins(&self) -> Result<Vec<AdminUser>, AppError> {
        let cursor = self.admins().find(None, by_id()).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn replace_admin(&self, admin: &AdminUser) -> Result<bool, AppError> {
        let result = self
            .admins()
            .replace_one(doc! { "_id": &admin.id }, admin, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_admin(&self, id: &str) -> Result<bool, AppError> {
        let result = self.admins().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_session(&self, session: &AdminSession) -> Result<(), AppError> {
        self.sessions().insert_one(session, None).await?;
        Ok(())
    }

    async fn find_session(&self, token_digest: &str) -> Result<Option<AdminSession>, AppError> {
        Ok(self
            .sessions()
            .find_one(doc! { "_id": token_digest }, None)
            .await?)
    }

    async fn delete_session(&self, token_digest: &str) -> Result<bool, AppError> {
        let result = self
            .sessions()
            .delete_one(doc! { "_id": token_digest }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn delete_sessions_for_admin(&self, admin_id: &str) -> Result<u64, AppError> {
        let result = self
            .sessions()
            .delete_many(doc! { "admin_id": admin_id }, None)
            .await?;
        Ok(result.deleted_count)
    }
}
