use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
    pub medicine_id: i64,
    /// Owning user. `None` for admin-created catalog entries.
    pub client_id: Option<i64>,
    pub name: String,
    pub dosage: String,
    pub note: Option<String>,
}
