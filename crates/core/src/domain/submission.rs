use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::IntakeError;

/// Submission payload exactly as the caller sent it, before sanitization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubmission {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub contact_method: Option<String>,
    pub message: Option<String>,
    pub country: Option<String>,
    pub username: Option<String>,
    pub verification_status: Option<String>,
    pub selected_card: Option<String>,
}

impl RawSubmission {
    /// Decodes a request body. The body must be a JSON object whose known
    /// fields are strings or `null`; unknown fields are ignored.
    pub fn from_json(body: &[u8]) -> Result<Self, IntakeError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|error| IntakeError::Shape(format!("body is not valid JSON: {error}")))?;

        if !value.is_object() {
            return Err(IntakeError::Shape("body must be a JSON object".to_string()));
        }

        serde_json::from_value(value)
            .map_err(|error| IntakeError::Shape(format!("unexpected field type: {error}")))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactMethod {
    Telegram,
    Whatsapp,
    Email,
    Discord,
}

impl ContactMethod {
    pub const ALL: [ContactMethod; 4] = [Self::Telegram, Self::Whatsapp, Self::Email, Self::Discord];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Telegram => "telegram",
            Self::Whatsapp => "whatsapp",
            Self::Email => "email",
            Self::Discord => "discord",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.as_str().eq_ignore_ascii_case(raw.trim()))
    }

    /// Channels that cannot reach the customer without a username.
    pub fn requires_handle(self) -> bool {
        matches!(self, Self::Discord)
    }
}

impl std::fmt::Display for ContactMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sanitized submission that passed every field rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub contact_method: Option<ContactMethod>,
    pub message: Option<String>,
    pub country: Option<String>,
    pub username: Option<String>,
    pub verification_status: Option<String>,
    pub selected_card: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{ContactMethod, RawSubmission};
    use crate::errors::IntakeError;

    #[test]
    fn camel_case_fields_are_decoded() {
        let raw = RawSubmission::from_json(
            br#"{"name":"Ada","contactMethod":"discord","verificationStatus":"verified","selectedCard":"UK","extra":1}"#,
        )
        .expect("object body should decode");

        assert_eq!(raw.name.as_deref(), Some("Ada"));
        assert_eq!(raw.contact_method.as_deref(), Some("discord"));
        assert_eq!(raw.verification_status.as_deref(), Some("verified"));
        assert_eq!(raw.selected_card.as_deref(), Some("UK"));
        assert_eq!(raw.email, None);
    }

    #[test]
    fn non_object_bodies_are_shape_errors() {
        for body in [&b"not json"[..], b"[\"Ada\",\"a@b.co\"]", b"42", b""] {
            let error = RawSubmission::from_json(body).expect_err("body should be rejected");
            assert!(matches!(error, IntakeError::Shape(_)), "unexpected error {error:?}");
        }
    }

    #[test]
    fn non_string_field_is_a_shape_error() {
        let error = RawSubmission::from_json(br#"{"name": 12}"#).expect_err("number name");
        assert!(matches!(error, IntakeError::Shape(_)));
    }

    #[test]
    fn contact_method_parse_is_case_insensitive() {
        assert_eq!(ContactMethod::parse(" Discord "), Some(ContactMethod::Discord));
        assert_eq!(ContactMethod::parse("whatsapp"), Some(ContactMethod::Whatsapp));
        assert_eq!(ContactMethod::parse("carrier-pigeon"), None);
        assert!(ContactMethod::Discord.requires_handle());
        assert!(!ContactMethod::Email.requires_handle());
    }
}
