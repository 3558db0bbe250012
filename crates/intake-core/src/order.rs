//! Order model and the validation step
//!
//! An [`OrderForm`] collects whatever text fields arrived with the
//! request. [`OrderForm::validate`] turns it into an [`Order`] or
//! explains why it cannot, without touching the filesystem; the caller
//! decides what to do with the stored proof file based on the outcome.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{IntakeError, IntakeResult};
use crate::upload::UploadInfo;

/// Wire names of the fields an order cannot be accepted without
pub const REQUIRED_FIELDS: [&str; 7] = [
    "plan",
    "price",
    "adminFee",
    "total",
    "orderId",
    "customerName",
    "customerPhone",
];

/// Text fields of an order submission, as received
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderForm {
    pub plan: Option<String>,
    pub price: Option<String>,
    pub admin_fee: Option<String>,
    pub total: Option<String>,
    pub order_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub customer_note: Option<String>,
}

impl OrderForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a field by its wire name.
    ///
    /// Returns `false` for names that are not part of an order. A field
    /// sent twice keeps the last value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        let slot = match name {
            "plan" => &mut self.plan,
            "price" => &mut self.price,
            "adminFee" => &mut self.admin_fee,
            "total" => &mut self.total,
            "orderId" => &mut self.order_id,
            "customerName" => &mut self.customer_name,
            "customerPhone" => &mut self.customer_phone,
            "customerEmail" => &mut self.customer_email,
            "customerNote" => &mut self.customer_note,
            _ => return false,
        };
        *slot = Some(value.into());
        true
    }

    /// Look up a field by its wire name
    pub fn get(&self, name: &str) -> Option<&str> {
        let slot = match name {
            "plan" => &self.plan,
            "price" => &self.price,
            "adminFee" => &self.admin_fee,
            "total" => &self.total,
            "orderId" => &self.order_id,
            "customerName" => &self.customer_name,
            "customerPhone" => &self.customer_phone,
            "customerEmail" => &self.customer_email,
            "customerNote" => &self.customer_note,
            _ => return None,
        };
        slot.as_deref()
    }

    /// Required fields that are absent or blank.
    ///
    /// A value made only of whitespace counts as missing, which is stricter
    /// than a plain presence check. Accepted values are trimmed when the
    /// [`Order`] is built.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|name| filled(self.get(name)).is_none())
            .collect()
    }

    /// Validate the form against the proof file that came with it.
    ///
    /// Field completeness is checked before the file, so a request that
    /// is missing both is reported as incomplete.
    pub fn validate(&self, proof: Option<&UploadInfo>) -> IntakeResult<Order> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(IntakeError::IncompleteData { missing });
        }

        let proof = proof.ok_or(IntakeError::MissingProof)?;

        Ok(Order {
            plan: required(self.plan.as_deref()),
            price: required(self.price.as_deref()),
            admin_fee: required(self.admin_fee.as_deref()),
            total: required(self.total.as_deref()),
            order_id: required(self.order_id.as_deref()),
            customer_name: required(self.customer_name.as_deref()),
            customer_phone: required(self.customer_phone.as_deref()),
            customer_email: filled(self.customer_email.as_deref()).map(str::to_string),
            customer_note: filled(self.customer_note.as_deref()).map(str::to_string),
            proof_filename: proof.filename.clone(),
            proof_path: proof.path.display().to_string(),
            proof_size: proof.size,
            received_at: Utc::now(),
        })
    }
}

fn filled(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn required(value: Option<&str>) -> String {
    filled(value).unwrap_or_default().to_string()
}

/// A validated order with its stored proof file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub plan: String,
    pub price: String,
    pub admin_fee: String,
    pub total: String,
    pub order_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_note: Option<String>,
    /// Generated name of the stored proof file
    pub proof_filename: String,
    /// Absolute path of the stored proof file
    pub proof_path: String,
    pub proof_size: u64,
    pub received_at: DateTime<Utc>,
}
