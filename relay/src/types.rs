use serde::{Deserialize, Serialize};

/// Workflow statuses the dashboard offers, in display order. The empty
/// entry renders as unset.
pub const STATUS_OPTIONS: &[&str] = &[
    "",
    "New",
    "Attempted Contact",
    "In Progress",
    "Quoted",
    "Won",
    "Lost",
    "Do Not Contact",
];

pub const STATUS_WON: &str = "Won";

/// A lead row after normalization. Every field besides `id` is a plain
/// string; past the normalization boundary, absence and empty string mean
/// the same thing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    /// Row identifier assigned by the store; the sole join key. Never
    /// reassigned.
    pub id: u64,
    /// Creation timestamp written by the store. Immutable from this side.
    #[serde(default)]
    pub when: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
    /// Newline-delimited vehicle descriptions. Supersedes the
    /// year/make/model triple for display once populated.
    #[serde(default)]
    pub vehicles: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub agent: String,
    #[serde(default)]
    pub policy_number: String,
    #[serde(default)]
    pub coverage: String,
    #[serde(default)]
    pub deductibles: String,
    /// Comma-joined discount labels.
    #[serde(default)]
    pub discounts: String,
    #[serde(default)]
    pub renewal_date: String,
    /// Consent flag captured at intake. Immutable from this side.
    #[serde(default)]
    pub consent: String,
}

impl Lead {
    pub fn is_won(&self) -> bool {
        self.status == STATUS_WON
    }
}

/// Per-lead quote worksheet. Created implicitly on first save, overwritten
/// wholesale on every save after that.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worksheet {
    #[serde(default)]
    pub coverage_package: String,
    #[serde(default)]
    pub liability: String,
    #[serde(default)]
    pub comp_ded: String,
    #[serde(default)]
    pub coll_ded: String,
    #[serde(default)]
    pub discounts: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

/// Session-scoped annotation an agent attaches to a lead. Never sent to
/// the store; dropped with the dashboard that owns it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityNote {
    pub id: u64,
    pub text: String,
    /// Unix milliseconds as a string; the UI formats it for display.
    pub created_at: String,
    pub agent: String,
}
