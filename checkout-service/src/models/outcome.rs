use serde::Serialize;
use serde_json::Value;

/// Result of a create or update call against the invoice list.
///
/// A missing `id` in the Graph response is a soft failure: it is reported
/// here rather than raised, together with whatever detail Graph returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListItemOutcome {
    Created { item_id: String },
    CreateFailed { detail: String },
    Updated { item_id: String },
    UpdateFailed { item_id: String, detail: String },
}

impl ListItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ListItemOutcome::Created { .. } | ListItemOutcome::Updated { .. }
        )
    }

    pub fn item_id(&self) -> Option<&str> {
        match self {
            ListItemOutcome::Created { item_id }
            | ListItemOutcome::Updated { item_id }
            | ListItemOutcome::UpdateFailed { item_id, .. } => Some(item_id),
            ListItemOutcome::CreateFailed { .. } => None,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            ListItemOutcome::CreateFailed { detail }
            | ListItemOutcome::UpdateFailed { detail, .. } => Some(detail),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ListItemOutcome::Created { .. } => "created",
            ListItemOutcome::CreateFailed { .. } => "create_failed",
            ListItemOutcome::Updated { .. } => "updated",
            ListItemOutcome::UpdateFailed { .. } => "update_failed",
        }
    }

    /// Human-readable summary, worded the way list operators already see it.
    pub fn message(&self) -> String {
        match self {
            ListItemOutcome::Created { item_id } => {
                format!("Successfully created a new item with id - {item_id}")
            }
            ListItemOutcome::CreateFailed { .. } => "Failed to create a new item".to_string(),
            ListItemOutcome::Updated { item_id } => {
                format!("Successfully updated the item with id - {item_id}")
            }
            ListItemOutcome::UpdateFailed { item_id, .. } => {
                format!("Failed to update the item with id {item_id}")
            }
        }
    }
}

/// Pulls a usable error detail out of a Graph response that carried no `id`.
pub(crate) fn failure_detail(response: &Value) -> String {
    response
        .pointer("/error/message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| response.to_string())
}

#[derive(Serialize)]
struct OutcomeBody<'a> {
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    item_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
    message: String,
}

impl Serialize for ListItemOutcome {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        OutcomeBody {
            outcome: self.kind(),
            item_id: self.item_id(),
            detail: self.detail(),
            message: self.message(),
        }
        .serialize(serializer)
    }
}
