//! Request body validation.
//!
//! Bodies arrive as raw JSON so that every violation can be reported at once
//! rather than stopping at the first serde error. Messages follow the
//! `"field" <problem>` shape clients of the service already parse.

use std::str::FromStr;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use servicedesk_core::Category;
use servicedesk_core::NewServiceRequest;
use servicedesk_core::Priority;
use servicedesk_core::RequestStatus;
use strum::IntoEnumIterator;
use utoipa::ToSchema;

/// All violations found in one body, in field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    pub fn into_details(self) -> Vec<String> {
        self.0
    }
}

/// Body of `POST /api/requests`. Documentation shape only; see
/// [`validate_create`].
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestBody {
    /// 3 to 200 characters.
    pub title: String,
    /// 10 to 2000 characters.
    pub description: String,
    /// 2 to 100 characters.
    pub requester_name: String,
    pub requester_email: String,
    /// Suggested by the classifier when omitted.
    pub category: Option<Category>,
    /// Suggested by the classifier when omitted.
    pub priority: Option<Priority>,
}

/// Body of `PATCH /api/requests/{id}/status`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusBody {
    pub status: RequestStatus,
}

const CREATE_FIELDS: &[&str] = &[
    "title",
    "description",
    "requesterName",
    "requesterEmail",
    "category",
    "priority",
];

const UPDATE_FIELDS: &[&str] = &["status"];

pub fn validate_create(body: &Value) -> Result<NewServiceRequest, ValidationErrors> {
    let object = as_object(body)?;
    let mut errors = Vec::new();

    let title = required_string(object, "title", 3, 200, &mut errors);
    let description = required_string(object, "description", 10, 2000, &mut errors);
    let requester_name = required_string(object, "requesterName", 2, 100, &mut errors);
    let requester_email = required_email(object, "requesterEmail", &mut errors);
    let category = optional_enum::<Category>(object, "category", &mut errors);
    let priority = optional_enum::<Priority>(object, "priority", &mut errors);
    reject_unknown(object, CREATE_FIELDS, &mut errors);

    match (title, description, requester_name, requester_email) {
        (Some(title), Some(description), Some(requester_name), Some(requester_email))
            if errors.is_empty() =>
        {
            Ok(NewServiceRequest {
                title,
                description,
                requester_name,
                requester_email,
                category,
                priority,
            })
        }
        _ => Err(ValidationErrors(errors)),
    }
}

pub fn validate_status_update(body: &Value) -> Result<RequestStatus, ValidationErrors> {
    let object = as_object(body)?;
    let mut errors = Vec::new();

    let status = match object.get("status") {
        None => {
            errors.push(required("status"));
            None
        }
        Some(_) => optional_enum::<RequestStatus>(object, "status", &mut errors),
    };
    reject_unknown(object, UPDATE_FIELDS, &mut errors);

    match status {
        Some(status) if errors.is_empty() => Ok(status),
        _ => Err(ValidationErrors(errors)),
    }
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, ValidationErrors> {
    body.as_object()
        .ok_or_else(|| ValidationErrors(vec!["\"value\" must be of type object".to_string()]))
}

fn required(field: &str) -> String {
    format!("\"{field}\" is required")
}

fn string_field<'a>(
    object: &'a Map<String, Value>,
    field: &str,
    errors: &mut Vec<String>,
) -> Option<&'a str> {
    match object.get(field) {
        None => {
            errors.push(required(field));
            None
        }
        Some(Value::String(s)) if s.is_empty() => {
            errors.push(format!("\"{field}\" is not allowed to be empty"));
            None
        }
        Some(Value::String(s)) => Some(s.as_str()),
        Some(_) => {
            errors.push(format!("\"{field}\" must be a string"));
            None
        }
    }
}

fn required_string(
    object: &Map<String, Value>,
    field: &str,
    min: usize,
    max: usize,
    errors: &mut Vec<String>,
) -> Option<String> {
    let value = string_field(object, field, errors)?;
    let len = value.chars().count();
    if len < min {
        errors.push(format!(
            "\"{field}\" length must be at least {min} characters long"
        ));
        return None;
    }
    if len > max {
        errors.push(format!(
            "\"{field}\" length must be less than or equal to {max} characters long"
        ));
        return None;
    }
    Some(value.to_string())
}

fn required_email(
    object: &Map<String, Value>,
    field: &str,
    errors: &mut Vec<String>,
) -> Option<String> {
    let value = string_field(object, field, errors)?;
    if !is_valid_email(value) {
        errors.push(format!("\"{field}\" must be a valid email"));
        return None;
    }
    Some(value.to_string())
}

fn optional_enum<T>(object: &Map<String, Value>, field: &str, errors: &mut Vec<String>) -> Option<T>
where
    T: FromStr + IntoEnumIterator + AsRef<str>,
{
    let value = object.get(field)?;
    let parsed = value.as_str().and_then(|s| T::from_str(s).ok());
    if parsed.is_none() {
        let allowed: Vec<String> = T::iter().map(|v| v.as_ref().to_string()).collect();
        errors.push(format!("\"{field}\" must be one of [{}]", allowed.join(", ")));
    }
    parsed
}

fn reject_unknown(object: &Map<String, Value>, known: &[&str], errors: &mut Vec<String>) {
    for key in object.keys() {
        if !known.contains(&key.as_str()) {
            errors.push(format!("\"{key}\" is not allowed"));
        }
    }
}

#[allow(clippy::expect_used)]
fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("valid email regex")
    })
}

fn is_valid_email(value: &str) -> bool {
    email_regex().is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn valid_body() -> Value {
        json!({
            "title": "Printer broken",
            "description": "The 3rd floor printer is jammed and unusable",
            "requesterName": "A. Lee",
            "requesterEmail": "a@x.com",
        })
    }

    fn details(result: Result<NewServiceRequest, ValidationErrors>) -> Vec<String> {
        match result {
            Ok(ok) => panic!("expected validation errors, got {ok:?}"),
            Err(errors) => errors.into_details(),
        }
    }

    #[test]
    fn accepts_minimal_body() {
        let parsed = validate_create(&valid_body()).ok();
        assert_eq!(
            parsed,
            Some(NewServiceRequest {
                title: "Printer broken".to_string(),
                description: "The 3rd floor printer is jammed and unusable".to_string(),
                requester_name: "A. Lee".to_string(),
                requester_email: "a@x.com".to_string(),
                category: None,
                priority: None,
            })
        );
    }

    #[test]
    fn accepts_explicit_category_and_priority() {
        let mut body = valid_body();
        body["category"] = json!("IT");
        body["priority"] = json!("High");
        let parsed = validate_create(&body).ok();
        assert_eq!(parsed.as_ref().and_then(|p| p.category), Some(Category::It));
        assert_eq!(parsed.and_then(|p| p.priority), Some(Priority::High));
    }

    #[test]
    fn reports_every_violation() {
        let body = json!({
            "title": "Hi",
            "description": 42,
            "requesterEmail": "not-an-email",
            "category": "Plumbing",
            "extra": true,
        });
        assert_eq!(
            details(validate_create(&body)),
            vec![
                "\"title\" length must be at least 3 characters long",
                "\"description\" must be a string",
                "\"requesterName\" is required",
                "\"requesterEmail\" must be a valid email",
                "\"category\" must be one of [IT, Facilities, General]",
                "\"extra\" is not allowed",
            ]
        );
    }

    #[test]
    fn length_bounds_count_characters() {
        let mut body = valid_body();
        body["title"] = json!("é".repeat(200));
        assert!(validate_create(&body).is_ok());

        body["title"] = json!("x".repeat(201));
        assert_eq!(
            details(validate_create(&body)),
            vec!["\"title\" length must be less than or equal to 200 characters long"]
        );
    }

    #[test]
    fn empty_string_is_reported() {
        let mut body = valid_body();
        body["requesterName"] = json!("");
        assert_eq!(
            details(validate_create(&body)),
            vec!["\"requesterName\" is not allowed to be empty"]
        );
    }

    #[test]
    fn non_object_body() {
        assert_eq!(
            details(validate_create(&json!(["title"]))),
            vec!["\"value\" must be of type object"]
        );
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a x@y.com"));
        assert!(!is_valid_email("@x.com"));
    }

    #[test]
    fn status_update() {
        assert_eq!(
            validate_status_update(&json!({"status": "IN_PROGRESS"})).ok(),
            Some(RequestStatus::InProgress)
        );
        assert_eq!(
            validate_status_update(&json!({})).err(),
            Some(ValidationErrors(vec!["\"status\" is required".to_string()]))
        );
        assert_eq!(
            validate_status_update(&json!({"status": "CLOSED"})).err(),
            Some(ValidationErrors(vec![
                "\"status\" must be one of [OPEN, IN_PROGRESS, RESOLVED]".to_string()
            ]))
        );
    }
}
