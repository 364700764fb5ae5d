use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentMode {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub details: Option<String>,
}
