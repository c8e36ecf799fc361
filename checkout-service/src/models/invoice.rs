//! Invoice list item models.
//!
//! Field names on the wire follow the SharePoint list's internal column
//! names (`Title`, `Customer`, `Cost`, ...), so they are renamed explicitly.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Invoice details submitted by a caller to record a new invoice.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct InvoiceDetails {
    #[serde(rename = "Title", default)]
    pub title: Option<String>,
    #[serde(rename = "Customer", default)]
    pub customer: Option<String>,
    #[serde(rename = "Cost", default)]
    #[validate(length(min = 1, message = "Cost is required"))]
    pub cost: String,
    #[serde(rename = "DueBy", default)]
    pub due_by: Option<String>,
}

impl InvoiceDetails {
    /// Returns a copy with the cost trimmed, ready for validation.
    pub fn normalized(&self) -> Self {
        Self {
            cost: self.cost.trim().to_string(),
            ..self.clone()
        }
    }
}

/// Column values of one invoice list item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceFields {
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Customer")]
    pub customer: Option<String>,
    #[serde(rename = "Cost")]
    pub cost: String,
    #[serde(rename = "DueBy")]
    pub due_by: Option<String>,
    #[serde(rename = "InvoiceNumber")]
    pub invoice_number: String,
    #[serde(rename = "CheckoutID")]
    pub checkout_id: String,
}

/// Body of a list item creation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewListItem {
    pub fields: InvoiceFields,
}

/// Payment status callback for an existing list item.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct StatusUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "status is required"))]
    pub status: String,
    #[serde(default)]
    #[validate(
        length(min = 1, message = "item_id is required"),
        custom(function = "validate_item_id")
    )]
    pub item_id: String,
}

/// List item ids end up as a path segment of the Graph item URL, so only
/// the characters Graph uses for them are accepted.
fn validate_item_id(item_id: &str) -> Result<(), ValidationError> {
    if item_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        Ok(())
    } else {
        let mut error = ValidationError::new("invalid_item_id");
        error.message = Some("item_id may only contain letters, digits and '-'".into());
        Err(error)
    }
}

impl StatusUpdate {
    pub fn new(status: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            item_id: item_id.into(),
        }
    }

    /// Returns a copy with both fields trimmed, ready for validation.
    pub fn normalized(&self) -> Self {
        Self {
            status: self.status.trim().to_string(),
            item_id: self.item_id.trim().to_string(),
        }
    }
}

/// PATCH body for a list item's fields when a payment callback arrives.
#[derive(Debug, Clone, Serialize)]
pub struct StatusFields {
    #[serde(rename = "Status")]
    pub status: &'static str,
}

/// Payment outcome as recorded in the list's `Status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Successful,
    Failed,
}

impl PaymentStatus {
    /// `"success"` in any case is a successful payment; anything else failed.
    pub fn from_callback(status: &str) -> Self {
        if status.trim().eq_ignore_ascii_case("success") {
            PaymentStatus::Successful
        } else {
            PaymentStatus::Failed
        }
    }

    pub fn as_list_value(&self) -> &'static str {
        match self {
            PaymentStatus::Successful => "Payment Successful",
            PaymentStatus::Failed => "Payment Failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payment_status_is_case_insensitive() {
        assert_eq!(PaymentStatus::from_callback("success"), PaymentStatus::Successful);
        assert_eq!(PaymentStatus::from_callback("Success"), PaymentStatus::Successful);
        assert_eq!(PaymentStatus::from_callback("SUCCESS"), PaymentStatus::Successful);
        assert_eq!(
            PaymentStatus::Successful.as_list_value(),
            "Payment Successful"
        );
    }

    #[test]
    fn test_other_statuses_are_failures() {
        for status in ["failed", "cancelled", "successful", "ok"] {
            let mapped = PaymentStatus::from_callback(status);
            assert_eq!(mapped, PaymentStatus::Failed, "status {status}");
            assert_eq!(mapped.as_list_value(), "Payment Failed");
        }
    }

    #[test]
    fn test_invoice_details_use_list_column_names() {
        let details: InvoiceDetails = serde_json::from_value(json!({
            "Title": "March retainer",
            "Customer": "Contoso",
            "Cost": " 10.00 ",
            "DueBy": "2024-04-01"
        }))
        .unwrap();

        assert_eq!(details.title.as_deref(), Some("March retainer"));
        assert_eq!(details.normalized().cost, "10.00");
    }

    #[test]
    fn test_blank_cost_fails_validation() {
        let details = InvoiceDetails {
            cost: "   ".to_string(),
            ..Default::default()
        };

        assert!(details.normalized().validate().is_err());
    }

    #[test]
    fn test_blank_status_update_fails_validation() {
        let missing_item = StatusUpdate::new("success", "  ").normalized();
        let errors = missing_item.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("item_id"));

        let missing_status = StatusUpdate::new("", "17").normalized();
        let errors = missing_status.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("status"));
    }

    #[test]
    fn test_item_id_must_be_a_plain_segment() {
        for item_id in ["17", "a1b2-c3"] {
            assert!(StatusUpdate::new("success", item_id).validate().is_ok(), "{item_id}");
        }

        for item_id in ["../../other/items/5", "5?select=Title", "5/fields", "5%2F6"] {
            let errors = StatusUpdate::new("success", item_id).validate().unwrap_err();
            assert!(errors.field_errors().contains_key("item_id"), "{item_id}");
        }
    }

    #[test]
    fn test_status_fields_use_list_column_name() {
        let value = serde_json::to_value(StatusFields {
            status: PaymentStatus::Failed.as_list_value(),
        })
        .unwrap();
        assert_eq!(value, json!({ "Status": "Payment Failed" }));
    }

    #[test]
    fn test_new_list_item_nests_fields() {
        let item = NewListItem {
            fields: InvoiceFields {
                title: Some("Title".to_string()),
                customer: None,
                cost: "10.00".to_string(),
                due_by: Some("2024-04-01".to_string()),
                invoice_number: "INV-1".to_string(),
                checkout_id: "checkout_1".to_string(),
            },
        };

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["fields"]["Cost"], "10.00");
        assert_eq!(value["fields"]["CheckoutID"], "checkout_1");
        assert_eq!(value["fields"]["InvoiceNumber"], "INV-1");
        assert!(value["fields"]["Customer"].is_null());
    }
}
