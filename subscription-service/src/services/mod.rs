pub mod auth;
pub mod calendar;
pub mod catalog;
#[cfg(test)]
mod flag_watch;
pub mod ids;
pub mod locks;
pub mod memory;
pub mod metrics;
pub mod mongo;
pub mod pdf;
pub mod period;
pub mod plans;
pub mod report;
pub mod store;
pub mod subscribers;
pub mod subscriptions;
pub mod versioning;

pub use auth::AuthService;
pub use calendar::{BusinessCalendar, Clock, FixedClock, SystemClock};
pub use catalog::CatalogService;
pub use ids::{EntityKind, IdGenerator};
pub use locks::KeyedLocks;
pub use memory::MemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use mongo::MongoStore;
pub use pdf::{PrintPdfRenderer, ReportRenderer};
pub use plans::{PlanService, PlanTerms, PlanWrite};
pub use report::{ReportFilter, ReportRow, ReportService};
pub use store::Store;
pub use subscribers::SubscriberService;
pub use subscriptions::{SubscriptionDraft, SubscriptionService};
