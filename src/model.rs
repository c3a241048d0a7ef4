//! Wire shapes exchanged with the accounts API.
//!
//! Requests and success responses wrap their payload in a `{ "data": ... }`
//! envelope. Error bodies come in two shapes: [`ApiErrorBody`] for 400 and
//! 409, [`ForbiddenBody`] for 403.

use serde::{Deserialize, Serialize};

/// Error body returned with 400 and 409 responses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error_message", default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(rename = "error_code", default, skip_serializing_if = "String::is_empty")]
    pub code: String,
}

impl ApiErrorBody {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
        }
    }

    /// Empty fields of `pattern` match anything.
    pub fn matches(&self, pattern: &ApiErrorBody) -> bool {
        field_matches(&self.code, &pattern.code) && field_matches(&self.message, &pattern.message)
    }
}

impl std::fmt::Display for ApiErrorBody {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.code.is_empty() {
            formatter.write_str(&self.message)
        } else {
            write!(formatter, "{}: {}", self.code, self.message)
        }
    }
}

/// Error body returned with 403 responses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForbiddenBody {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(
        rename = "error_description",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub description: String,
}

impl ForbiddenBody {
    pub fn new(error: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            description: description.into(),
        }
    }

    /// Empty fields of `pattern` match anything.
    pub fn matches(&self, pattern: &ForbiddenBody) -> bool {
        field_matches(&self.error, &pattern.error)
            && field_matches(&self.description, &pattern.description)
    }
}

impl std::fmt::Display for ForbiddenBody {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.error.is_empty() {
            formatter.write_str(&self.description)
        } else {
            write!(formatter, "{}: {}", self.error, self.description)
        }
    }
}

fn field_matches(actual: &str, pattern: &str) -> bool {
    pattern.is_empty() || actual == pattern
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }

    pub fn into_inner(self) -> T {
        self.data
    }
}

/// An account resource in the organisation section of the API.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<AccountAttributes>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub organisation_id: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_matching_opt_out: Option<bool>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub account_number: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternative_names: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bank_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bank_id_code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base_currency: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub iban: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joint_account: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub secondary_identification: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub switched: Option<bool>,
}
