//! Catalog item entity model.

use serde::Serialize;
use sqlx::FromRow;

use intake_core::fields;
use intake_core::types::{FieldMap, Timestamp};

/// A row from the `items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Item {
    pub code: String,
    pub description: String,
    pub unit: Option<String>,
    pub list_price: Option<String>,
    pub currency: Option<String>,
    pub category: Option<String>,
    pub supplier_tax_id: Option<String>,
    pub external_ref: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Item {
    /// Canonical-field view of this row. Only present fields get entries.
    pub fn to_field_map(&self) -> FieldMap {
        let mut map = FieldMap::new();
        map.insert(fields::ITEM_CODE.to_string(), self.code.clone());
        map.insert(fields::ITEM_DESCRIPTION.to_string(), self.description.clone());

        let optional = [
            (fields::ITEM_UNIT, &self.unit),
            (fields::ITEM_LIST_PRICE, &self.list_price),
            (fields::ITEM_CURRENCY, &self.currency),
            (fields::ITEM_CATEGORY, &self.category),
            (fields::ITEM_SUPPLIER_TAX_ID, &self.supplier_tax_id),
            (fields::ITEM_EXTERNAL_REF, &self.external_ref),
        ];
        for (field, value) in optional {
            if let Some(value) = value {
                map.insert(field.to_string(), value.clone());
            }
        }
        map
    }
}
