//! Field rules and sanitization for incoming submissions.
//!
//! Every field is sanitized first (tags and line breaks stripped, whitespace
//! trimmed) and the rules run against the sanitized values. All violations
//! are collected so the caller can fix the form in one round trip.

use crate::domain::submission::{ContactMethod, RawSubmission, Submission};

pub const MAX_EMAIL_LOCAL_PART_LEN: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    Missing,
    InvalidEmail,
    InvalidPhone,
    UnsupportedContactMethod,
    MissingHandle(ContactMethod),
}

impl ViolationKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::InvalidEmail => "invalid_email",
            Self::InvalidPhone => "invalid_phone",
            Self::UnsupportedContactMethod => "unsupported_contact_method",
            Self::MissingHandle(_) => "missing_handle",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub kind: ViolationKind,
}

impl FieldViolation {
    pub fn new(field: &'static str, kind: ViolationKind) -> Self {
        Self { field, kind }
    }

    pub fn message(&self) -> String {
        match self.kind {
            ViolationKind::Missing => format!("{} is required", self.field),
            ViolationKind::InvalidEmail => "Please enter a valid email address".to_string(),
            ViolationKind::InvalidPhone => "Please enter a valid phone number".to_string(),
            ViolationKind::UnsupportedContactMethod => {
                let supported =
                    ContactMethod::ALL.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
                format!("contactMethod must be one of: {supported}")
            }
            ViolationKind::MissingHandle(method) => {
                format!("A username is required when contacting via {method}")
            }
        }
    }
}

/// Strips HTML-like tags and line breaks, then trims. An unterminated `<`
/// swallows the rest of the input.
pub fn sanitize(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut in_tag = false;

    for ch in input.chars() {
        if in_tag {
            if ch == '>' {
                in_tag = false;
            }
            continue;
        }

        match ch {
            '<' => in_tag = true,
            '\r' | '\n' => {}
            _ => output.push(ch),
        }
    }

    output.trim().to_string()
}

pub fn is_valid_email(email: &str) -> bool {
    if email.contains("..") {
        return false;
    }

    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    let local_ok = !local.is_empty()
        && local.chars().count() <= MAX_EMAIL_LOCAL_PART_LEN
        && local.chars().all(|ch| ch.is_ascii_alphanumeric() || "._%+-".contains(ch));
    if !local_ok {
        return false;
    }

    if !domain.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '.' || ch == '-') {
        return false;
    }

    match domain.rsplit_once('.') {
        Some((head, tld)) => {
            !head.is_empty() && tld.len() >= 2 && tld.chars().all(|ch| ch.is_ascii_alphabetic())
        }
        None => false,
    }
}

pub fn is_valid_phone(phone: &str) -> bool {
    phone.chars().all(|ch| ch.is_ascii_digit() || matches!(ch, ' ' | '(' | ')' | '+' | '-'))
}

pub fn validate(raw: RawSubmission) -> Result<Submission, Vec<FieldViolation>> {
    let mut violations = Vec::new();

    let name = required("name", raw.name.as_deref(), &mut violations);

    let email = required("email", raw.email.as_deref(), &mut violations);
    let email_has_line_break = raw
        .email
        .as_deref()
        .is_some_and(|value| value.contains(|ch: char| ch == '\r' || ch == '\n'));
    if let Some(email) = &email {
        if email_has_line_break || !is_valid_email(email) {
            violations.push(FieldViolation::new("email", ViolationKind::InvalidEmail));
        }
    }

    let phone = required("phone", raw.phone.as_deref(), &mut violations);
    if let Some(phone) = &phone {
        if !is_valid_phone(phone) {
            violations.push(FieldViolation::new("phone", ViolationKind::InvalidPhone));
        }
    }

    let contact_method = match optional(raw.contact_method.as_deref()) {
        None => None,
        Some(value) => {
            let parsed = ContactMethod::parse(&value);
            if parsed.is_none() {
                violations.push(FieldViolation::new(
                    "contactMethod",
                    ViolationKind::UnsupportedContactMethod,
                ));
            }
            parsed
        }
    };

    let username = optional(raw.username.as_deref());
    if let Some(method) = contact_method {
        if method.requires_handle() && username.is_none() {
            violations.push(FieldViolation::new("username", ViolationKind::MissingHandle(method)));
        }
    }

    if !violations.is_empty() {
        return Err(violations);
    }
    let (Some(name), Some(email), Some(phone)) = (name, email, phone) else {
        return Err(violations);
    };

    Ok(Submission {
        name,
        email,
        phone,
        contact_method,
        message: optional(raw.message.as_deref()),
        country: optional(raw.country.as_deref()),
        username,
        verification_status: optional(raw.verification_status.as_deref()),
        selected_card: optional(raw.selected_card.as_deref()),
    })
}

fn required(
    field: &'static str,
    value: Option<&str>,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    let value = optional(value);
    if value.is_none() {
        violations.push(FieldViolation::new(field, ViolationKind::Missing));
    }
    value
}

// Empty after sanitization counts as absent.
fn optional(value: Option<&str>) -> Option<String> {
    value.map(sanitize).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{is_valid_email, is_valid_phone, sanitize, validate, ViolationKind};
    use crate::domain::submission::{ContactMethod, RawSubmission};

    fn valid_raw() -> RawSubmission {
        RawSubmission {
            name: Some("Ada Lovelace".to_string()),
            email: Some("user@example.com".to_string()),
            phone: Some("+1 (555) 123-4567".to_string()),
            ..RawSubmission::default()
        }
    }

    #[test]
    fn email_grammar_examples() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.co.uk"));
        assert!(!is_valid_email("a@b"), "domain without a dot");
        assert!(!is_valid_email("a@b.c"), "one-letter top-level label");
        assert!(!is_valid_email("a@@b.com"));
        assert!(!is_valid_email("a@b@c.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a..b@example.com"));
        assert!(!is_valid_email("a@example..com"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("a@example.c0m"));
        assert!(!is_valid_email(&format!("{}@example.com", "x".repeat(65))));
        assert!(is_valid_email(&format!("{}@example.com", "x".repeat(64))));
    }

    #[test]
    fn phone_charset_examples() {
        assert!(is_valid_phone("+1 (555) 123-4567"));
        assert!(is_valid_phone("07700900123"));
        assert!(!is_valid_phone("call-me!"));
        assert!(!is_valid_phone("555.123.4567"));
        assert!(!is_valid_phone("ext 12"));
    }

    #[test]
    fn sanitize_strips_tags_line_breaks_and_whitespace() {
        assert_eq!(sanitize("  <b>Ada</b>\r\n Lovelace "), "Ada Lovelace");
        assert_eq!(sanitize("hello <script>alert(1)"), "hello alert(1)");
        assert_eq!(sanitize("hello <script"), "hello");
        assert_eq!(sanitize("a > b"), "a > b");
        assert_eq!(sanitize("\n\n"), "");
    }

    #[test]
    fn valid_submission_is_normalized() {
        let mut raw = valid_raw();
        raw.name = Some("  <i>Ada</i> Lovelace ".to_string());
        raw.message = Some("   ".to_string());
        raw.country = Some("United Kingdom".to_string());
        raw.contact_method = Some("Email".to_string());

        let submission = validate(raw).expect("submission should validate");

        assert_eq!(submission.name, "Ada Lovelace");
        assert_eq!(submission.contact_method, Some(ContactMethod::Email));
        assert_eq!(submission.message, None, "blank optional fields become absent");
        assert_eq!(submission.country.as_deref(), Some("United Kingdom"));
    }

    #[test]
    fn missing_required_fields_are_all_reported() {
        let violations = validate(RawSubmission {
            name: Some("   ".to_string()),
            email: None,
            phone: Some("<br>".to_string()),
            ..RawSubmission::default()
        })
        .expect_err("empty submission must fail");

        let fields: Vec<_> = violations.iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["name", "email", "phone"]);
        assert!(violations.iter().all(|v| v.kind == ViolationKind::Missing));
    }

    #[test]
    fn email_with_line_break_is_rejected() {
        let mut raw = valid_raw();
        raw.email = Some("user@example.com\nBcc: victim@example.com".to_string());

        let violations = validate(raw).expect_err("header injection attempt must fail");
        assert_eq!(violations[0].field, "email");
        assert_eq!(violations[0].kind, ViolationKind::InvalidEmail);
    }

    #[test]
    fn invalid_phone_is_rejected() {
        let mut raw = valid_raw();
        raw.phone = Some("call-me!".to_string());

        let violations = validate(raw).expect_err("phone must fail");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::InvalidPhone);
        assert_eq!(violations[0].message(), "Please enter a valid phone number");
    }

    #[test]
    fn discord_requires_username() {
        let mut raw = valid_raw();
        raw.contact_method = Some("discord".to_string());

        let violations = validate(raw.clone()).expect_err("discord without username");
        assert_eq!(violations[0].field, "username");
        assert_eq!(violations[0].kind, ViolationKind::MissingHandle(ContactMethod::Discord));
        assert!(violations[0].message().contains("discord"));

        raw.username = Some("ada#1815".to_string());
        let submission = validate(raw).expect("discord with username proceeds");
        assert_eq!(submission.username.as_deref(), Some("ada#1815"));
    }

    #[test]
    fn unknown_contact_method_is_rejected() {
        let mut raw = valid_raw();
        raw.contact_method = Some("fax".to_string());

        let violations = validate(raw).expect_err("unknown method");
        assert_eq!(violations[0].field, "contactMethod");
        assert!(violations[0].message().contains("telegram, whatsapp, email, discord"));
    }
}
