//! Customer account model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use graphica_core::{CustomerId, Email};

/// A registered customer. The password hash never leaves the repository.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub email: Email,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}
