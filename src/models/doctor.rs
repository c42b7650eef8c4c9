use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub doctor_id: i64,
    pub client_id: i64,
    pub name: String,
    pub specialization: Option<String>,
    pub contact: Option<String>,
}
