//! Organization entity model.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

use intake_core::fields;
use intake_core::types::{FieldMap, Timestamp};

/// A row from the `organizations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Organization {
    pub tax_id: String,
    pub legal_name: String,
    pub trade_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    pub registered_on: Option<NaiveDate>,
    pub external_ref: Option<String>,
    pub portal_url: Option<String>,
    pub onboarding_status: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Organization {
    /// Canonical-field view of this row, for reconciliation, snapshots,
    /// and update planning. Only present (non-NULL) fields get entries.
    pub fn to_field_map(&self) -> FieldMap {
        let mut map = FieldMap::new();
        map.insert(fields::ORG_TAX_ID.to_string(), self.tax_id.clone());
        map.insert(fields::ORG_LEGAL_NAME.to_string(), self.legal_name.clone());

        let optional = [
            (fields::ORG_TRADE_NAME, &self.trade_name),
            (fields::ORG_EMAIL, &self.email),
            (fields::ORG_PHONE, &self.phone),
            (fields::ORG_ADDRESS, &self.address),
            (fields::ORG_CITY, &self.city),
            (fields::ORG_PROVINCE, &self.province),
            (fields::ORG_POSTAL_CODE, &self.postal_code),
            (fields::ORG_EXTERNAL_REF, &self.external_ref),
            (fields::ORG_PORTAL_URL, &self.portal_url),
            (fields::ORG_ONBOARDING_STATUS, &self.onboarding_status),
        ];
        for (field, value) in optional {
            if let Some(value) = value {
                map.insert(field.to_string(), value.clone());
            }
        }
        if let Some(date) = self.registered_on {
            map.insert(
                fields::ORG_REGISTERED_ON.to_string(),
                date.format("%Y-%m-%d").to_string(),
            );
        }
        map
    }
}

/// Parse an ISO date value from a canonical field map.
pub fn parse_date_field(map: &FieldMap, field: &str) -> Option<NaiveDate> {
    map.get(field)
        .and_then(|text| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok())
}
