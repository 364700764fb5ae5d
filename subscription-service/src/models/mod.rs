//! Domain models for subscription-service.

mod admin;
mod lookup;
mod payment_mode;
mod plan;
mod subscriber;
mod subscription;

pub use admin::{AdminSession, AdminUser};
pub use lookup::{Lookup, LookupKind};
pub use payment_mode::PaymentMode;
pub use plan::{parse_version_tag, version_tag, PlanLineage, SubscriptionPlan};
pub use subscriber::{MagazineSubscriber, SearchField, StatusFilter, SubscriberFilter};
pub use subscription::{PaymentStatus, Subscription};
