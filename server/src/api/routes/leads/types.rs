//! Lead request DTOs

use serde::Deserialize;
use validator::Validate;

use crate::data::repositories::lead::NewLead;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLeadRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "First name, last_name, and email are required."))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "First name, last_name, and email are required."))]
    pub last_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "First name, last_name, and email are required."))]
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub score: Option<i64>,
    pub lead_value: Option<f64>,
}

impl From<CreateLeadRequest> for NewLead {
    fn from(r: CreateLeadRequest) -> Self {
        Self {
            first_name: r.first_name,
            last_name: r.last_name,
            email: r.email,
            phone: r.phone,
            company: r.company,
            city: r.city,
            state: r.state,
            source: r.source,
            status: r.status,
            score: r.score,
            lead_value: r.lead_value,
        }
    }
}
