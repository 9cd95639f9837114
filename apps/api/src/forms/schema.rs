//! Schema rule set — declarative per-field constraints for the five form
//! sections, in create and partial-edit modes.
//!
//! Each section is a static table of `FieldSpec` rows plus its conditional
//! rules. Validation runs over the raw JSON payload so every violation can be
//! reported with a dotted field path and a human-readable message; only a
//! clean payload is deserialized into the typed models. Errors are
//! accumulated, never fail-fast, uniformly for create and edit.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::forms::conditional::{self, ConditionalRule};
use crate::forms::models::{FormPatch, FormSections, PersonalInfo};

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+923[0-4][0-9]{8}$").unwrap());
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());

const PASSWORD_SPECIALS: &str = "!@#$%^&*";

/// One field violation, keyed by dotted path (e.g. `personal.fullName`).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All violations collected for a payload.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationErrors(vec![FieldError::new(field, message)])
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for err in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}", err.message)?;
            first = false;
        }
        Ok(())
    }
}

/// The constraint a field value must satisfy.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Non-empty text.
    Text,
    Email,
    Password,
    Phone,
    OneOf(&'static [&'static str]),
    /// Calendar date, `YYYY-MM-DD`.
    IsoDate,
    Number { min: Option<f64>, max: Option<f64> },
    Bool,
    TextList,
    /// Accepted and ignored (e.g. `confirmPassword`, checked client-side).
    Any,
}

pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub kind: FieldKind,
}

pub struct SectionSchema {
    pub name: &'static str,
    pub label: &'static str,
    pub fields: &'static [FieldSpec],
    pub conditionals: &'static [ConditionalRule],
}

pub static PERSONAL: SectionSchema = SectionSchema {
    name: "personal",
    label: "Personal",
    fields: &[
        FieldSpec {
            name: "fullName",
            label: "Full Name",
            required: true,
            kind: FieldKind::Text,
        },
        FieldSpec {
            name: "email",
            label: "Email",
            required: true,
            kind: FieldKind::Email,
        },
        FieldSpec {
            name: "password",
            label: "Password",
            required: true,
            kind: FieldKind::Password,
        },
        FieldSpec {
            name: "confirmPassword",
            label: "Confirm Password",
            required: false,
            kind: FieldKind::Any,
        },
        FieldSpec {
            name: "gender",
            label: "Gender",
            required: true,
            kind: FieldKind::OneOf(&["Male", "Female", "Other"]),
        },
        FieldSpec {
            name: "dateOfBirth",
            label: "Date of Birth",
            required: true,
            kind: FieldKind::IsoDate,
        },
    ],
    conditionals: &[],
};

pub static CONTACT: SectionSchema = SectionSchema {
    name: "contact",
    label: "Contact",
    fields: &[
        FieldSpec {
            name: "phoneNumber",
            label: "Phone Number",
            required: true,
            kind: FieldKind::Phone,
        },
        FieldSpec {
            name: "alternatePhoneNumber",
            label: "Alternate Phone Number",
            required: false,
            kind: FieldKind::Phone,
        },
        FieldSpec {
            name: "addressLine1",
            label: "Address Line 1",
            required: true,
            kind: FieldKind::Text,
        },
        FieldSpec {
            name: "addressLine2",
            label: "Address Line 2",
            required: false,
            kind: FieldKind::Any,
        },
        FieldSpec {
            name: "city",
            label: "City",
            required: true,
            kind: FieldKind::Text,
        },
        FieldSpec {
            name: "postalCode",
            label: "Postal Code",
            required: true,
            kind: FieldKind::Text,
        },
        FieldSpec {
            name: "country",
            label: "Country",
            required: true,
            kind: FieldKind::Text,
        },
    ],
    conditionals: &[],
};

pub static EMPLOYMENT: SectionSchema = SectionSchema {
    name: "employment",
    label: "Employment",
    fields: &[
        FieldSpec {
            name: "jobTitle",
            label: "Job Title",
            required: true,
            kind: FieldKind::Text,
        },
        FieldSpec {
            name: "employmentStatus",
            label: "Employment Status",
            required: true,
            kind: FieldKind::OneOf(&["Employed", "Unemployed", "Student"]),
        },
        FieldSpec {
            name: "yearsOfExperience",
            label: "Years of Experience",
            required: true,
            kind: FieldKind::Number {
                min: Some(0.0),
                max: None,
            },
        },
        // Normally written by the artifact coordinator; a caller-supplied
        // location string is tolerated.
        FieldSpec {
            name: "resume",
            label: "Resume",
            required: false,
            kind: FieldKind::Text,
        },
    ],
    conditionals: &[ConditionalRule {
        discriminator: "employmentStatus",
        equals: "Employed",
        dependent: "companyName",
        label: "Company Name",
        constraint: FieldKind::Text,
        required_message: "Company Name is required when Employed",
    }],
};

pub static FINANCIAL: SectionSchema = SectionSchema {
    name: "financial",
    label: "Financial",
    fields: &[
        FieldSpec {
            name: "monthlyIncome",
            label: "Monthly Income",
            required: true,
            kind: FieldKind::Number {
                min: Some(0.0),
                max: None,
            },
        },
        FieldSpec {
            name: "loanStatus",
            label: "Loan Status",
            required: true,
            kind: FieldKind::OneOf(&["Yes", "No"]),
        },
        FieldSpec {
            name: "creditScore",
            label: "Credit Score",
            required: true,
            kind: FieldKind::Number {
                min: Some(300.0),
                max: Some(850.0),
            },
        },
    ],
    conditionals: &[ConditionalRule {
        discriminator: "loanStatus",
        equals: "Yes",
        dependent: "loanAmount",
        label: "Loan Amount",
        constraint: FieldKind::Number {
            min: Some(0.0),
            max: None,
        },
        required_message: "Loan Amount is required when Loan Status is Yes",
    }],
};

pub static PREFERENCES: SectionSchema = SectionSchema {
    name: "preferences",
    label: "Preferences",
    fields: &[
        FieldSpec {
            name: "contactMode",
            label: "Preferred Mode of Contact",
            required: true,
            kind: FieldKind::OneOf(&["Email", "Phone", "SMS"]),
        },
        FieldSpec {
            name: "hobbies",
            label: "Hobbies",
            required: false,
            kind: FieldKind::TextList,
        },
        FieldSpec {
            name: "newsletter",
            label: "Newsletter",
            required: false,
            kind: FieldKind::Bool,
        },
    ],
    conditionals: &[],
};

pub static SECTIONS: [&SectionSchema; 5] =
    [&PERSONAL, &CONTACT, &EMPLOYMENT, &FINANCIAL, &PREFERENCES];

/// Checks one present value against a constraint. Returns the violation
/// message on failure.
pub fn check_value(kind: &FieldKind, value: &Value, label: &str) -> Result<(), String> {
    match kind {
        FieldKind::Any => Ok(()),
        FieldKind::Text => match value.as_str() {
            Some(s) if !s.trim().is_empty() => Ok(()),
            _ => Err(format!("{label} is required")),
        },
        FieldKind::Email => match value.as_str() {
            Some(s) if EMAIL_RE.is_match(s.trim()) => Ok(()),
            _ => Err("Invalid email address".to_string()),
        },
        FieldKind::Password => check_password(value),
        FieldKind::Phone => match value.as_str() {
            Some(s) if PHONE_RE.is_match(s) => Ok(()),
            _ => Err(format!(
                "{label} must be a valid Pakistan number (e.g., +923001234567)"
            )),
        },
        FieldKind::OneOf(options) => match value.as_str() {
            Some(s) if options.contains(&s) => Ok(()),
            _ => Err(format!("{label} must be {}", options_list(options))),
        },
        FieldKind::IsoDate => match value.as_str() {
            Some(s) if chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() => Ok(()),
            _ => Err(format!("{label} must be a valid ISO date (e.g., YYYY-MM-DD)")),
        },
        FieldKind::Number { min, max } => {
            let Some(n) = value.as_f64() else {
                return Err(format!("{label} must be a number"));
            };
            if let Some(min) = min {
                if n < *min {
                    return Err(if *min == 0.0 {
                        format!("{label} cannot be negative")
                    } else {
                        format!("{label} must be at least {min}")
                    });
                }
            }
            if let Some(max) = max {
                if n > *max {
                    return Err(format!("{label} cannot exceed {max}"));
                }
            }
            Ok(())
        }
        FieldKind::Bool => {
            if value.is_boolean() {
                Ok(())
            } else {
                Err(format!("{label} must be true or false"))
            }
        }
        FieldKind::TextList => match value.as_array() {
            Some(items) if items.iter().all(|v| v.is_string()) => Ok(()),
            _ => Err(format!("{label} must be a list of text values")),
        },
    }
}

fn check_password(value: &Value) -> Result<(), String> {
    let Some(s) = value.as_str() else {
        return Err("Password is required".to_string());
    };
    if s.len() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c);
    let complete = s.chars().any(|c| c.is_ascii_lowercase())
        && s.chars().any(|c| c.is_ascii_uppercase())
        && s.chars().any(|c| c.is_ascii_digit())
        && s.chars().any(|c| PASSWORD_SPECIALS.contains(c))
        && s.chars().all(allowed);
    if complete {
        Ok(())
    } else {
        Err("Password must contain at least one uppercase letter, one lowercase letter, \
             one number, and one special character"
            .to_string())
    }
}

/// "Male, Female, or Other"
fn options_list(options: &[&str]) -> String {
    match options {
        [] => String::new(),
        [only] => (*only).to_string(),
        [rest @ .., last] => format!("{}, or {last}", rest.join(", ")),
    }
}

fn validate_section(schema: &SectionSchema, value: &Value, errors: &mut Vec<FieldError>) {
    let Some(map) = value.as_object() else {
        errors.push(FieldError::new(
            schema.name,
            format!("{} section must be an object", schema.label),
        ));
        return;
    };

    for spec in schema.fields {
        let path = format!("{}.{}", schema.name, spec.name);
        match map.get(spec.name).filter(|v| !v.is_null()) {
            None if spec.required => {
                errors.push(FieldError::new(path, format!("{} is required", spec.label)));
            }
            None => {}
            Some(v) => {
                if let Err(message) = check_value(&spec.kind, v, spec.label) {
                    errors.push(FieldError::new(path, message));
                }
            }
        }
    }

    for rule in schema.conditionals {
        conditional::evaluate(rule, schema, map, errors);
    }
}

/// Validates a create payload: all five sections present and valid.
pub fn validate_create(payload: &Value) -> Result<FormSections, ValidationErrors> {
    let Some(root) = payload.as_object() else {
        return Err(ValidationErrors::single("", "Payload must be a JSON object"));
    };

    let mut errors = Vec::new();
    for schema in SECTIONS {
        match root.get(schema.name).filter(|v| !v.is_null()) {
            None => errors.push(FieldError::new(
                schema.name,
                format!("{} section is required", schema.label),
            )),
            Some(section) => validate_section(schema, section, &mut errors),
        }
    }
    if !errors.is_empty() {
        return Err(ValidationErrors(errors));
    }

    let mut sections: FormSections = serde_json::from_value(payload.clone())
        .map_err(|e| ValidationErrors::single("", format!("Malformed payload: {e}")))?;
    normalize_personal(&mut sections.personal);
    Ok(sections)
}

/// Validates a partial edit: at least one section, each present section fully
/// valid (a supplied section must satisfy every rule of that section).
pub fn validate_edit(payload: &Value) -> Result<FormPatch, ValidationErrors> {
    let Some(root) = payload.as_object() else {
        return Err(ValidationErrors::single("", "Payload must be a JSON object"));
    };

    let mut errors = Vec::new();
    let mut supplied = 0usize;
    for schema in SECTIONS {
        if let Some(section) = root.get(schema.name).filter(|v| !v.is_null()) {
            supplied += 1;
            validate_section(schema, section, &mut errors);
        }
    }
    if supplied == 0 {
        errors.push(FieldError::new("", "At least one section must be provided"));
    }
    if !errors.is_empty() {
        return Err(ValidationErrors(errors));
    }

    let mut patch: FormPatch = serde_json::from_value(payload.clone())
        .map_err(|e| ValidationErrors::single("", format!("Malformed payload: {e}")))?;
    if let Some(personal) = &mut patch.personal {
        normalize_personal(personal);
    }
    Ok(patch)
}

/// Case-normalizes the email before persistence.
fn normalize_personal(personal: &mut PersonalInfo) {
    personal.email = personal.email.trim().to_lowercase();
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    fn valid_payload() -> Value {
        json!({
            "personal": {
                "fullName": "Ayesha Khan",
                "email": "Ayesha.Khan@Example.com",
                "password": "Sup3rSecret!",
                "confirmPassword": "Sup3rSecret!",
                "gender": "Female",
                "dateOfBirth": "1995-04-12"
            },
            "contact": {
                "phoneNumber": "+923001234567",
                "addressLine1": "12 Mall Road",
                "city": "Lahore",
                "postalCode": "54000",
                "country": "Pakistan"
            },
            "employment": {
                "jobTitle": "Engineer",
                "employmentStatus": "Student",
                "yearsOfExperience": 2
            },
            "financial": {
                "monthlyIncome": 3000,
                "loanStatus": "No",
                "creditScore": 700
            },
            "preferences": {
                "contactMode": "Email"
            }
        })
    }

    fn messages(err: &ValidationErrors) -> Vec<&str> {
        err.0.iter().map(|e| e.message.as_str()).collect()
    }

    fn fields(err: &ValidationErrors) -> Vec<&str> {
        err.0.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn valid_create_passes_and_normalizes_email() {
        let sections = validate_create(&valid_payload()).unwrap();
        assert_eq!(sections.personal.email, "ayesha.khan@example.com");
        assert_eq!(sections.financial.loan_amount, 0.0);
        assert!(sections.preferences.hobbies.is_empty());
        assert!(!sections.preferences.newsletter);
        assert!(sections.employment.company_name.is_none());
    }

    #[test]
    fn each_missing_section_is_named() {
        for section in ["personal", "contact", "employment", "financial", "preferences"] {
            let mut payload = valid_payload();
            payload.as_object_mut().unwrap().remove(section);
            let err = validate_create(&payload).unwrap_err();
            assert_eq!(fields(&err), vec![section], "section {section}");
            assert!(err.0[0].message.contains("section is required"));
        }
    }

    #[test]
    fn errors_accumulate_across_sections() {
        let mut payload = valid_payload();
        payload["personal"]["fullName"] = json!("");
        payload["contact"]["phoneNumber"] = json!("0300-1234567");
        payload["financial"]["creditScore"] = json!(900);
        let err = validate_create(&payload).unwrap_err();
        assert_eq!(err.0.len(), 3);
        assert!(fields(&err).contains(&"personal.fullName"));
        assert!(fields(&err).contains(&"contact.phoneNumber"));
        assert!(fields(&err).contains(&"financial.creditScore"));
    }

    #[test]
    fn employed_requires_company_name() {
        let mut payload = valid_payload();
        payload["employment"]["employmentStatus"] = json!("Employed");
        let err = validate_create(&payload).unwrap_err();
        assert_eq!(fields(&err), vec!["employment.companyName"]);
        assert_eq!(messages(&err), vec!["Company Name is required when Employed"]);

        payload["employment"]["companyName"] = json!("Acme Corp");
        let sections = validate_create(&payload).unwrap();
        assert_eq!(sections.employment.company_name.as_deref(), Some("Acme Corp"));
    }

    #[test]
    fn non_employed_accepts_any_company_name() {
        for status in ["Unemployed", "Student"] {
            let mut payload = valid_payload();
            payload["employment"]["employmentStatus"] = json!(status);
            assert!(validate_create(&payload).is_ok(), "absent, {status}");

            payload["employment"]["companyName"] = json!("Old Employer");
            assert!(validate_create(&payload).is_ok(), "present, {status}");
        }
    }

    #[test]
    fn invalid_employment_status_reports_once() {
        let mut payload = valid_payload();
        payload["employment"]["employmentStatus"] = json!("Retired");
        let err = validate_create(&payload).unwrap_err();
        assert_eq!(fields(&err), vec!["employment.employmentStatus"]);
        assert_eq!(
            messages(&err),
            vec!["Employment Status must be Employed, Unemployed, or Student"]
        );
    }

    #[test]
    fn loan_yes_requires_amount() {
        let mut payload = valid_payload();
        payload["financial"]["loanStatus"] = json!("Yes");
        let err = validate_create(&payload).unwrap_err();
        assert_eq!(fields(&err), vec!["financial.loanAmount"]);

        payload["financial"]["loanAmount"] = json!(5000);
        let sections = validate_create(&payload).unwrap();
        assert_eq!(sections.financial.loan_amount, 5000.0);
    }

    #[test]
    fn loan_no_defaults_amount_to_zero() {
        let sections = validate_create(&valid_payload()).unwrap();
        assert_eq!(sections.financial.loan_amount, 0.0);
    }

    #[test]
    fn invalid_email_rejected() {
        let mut payload = valid_payload();
        payload["personal"]["email"] = json!("not-an-email");
        let err = validate_create(&payload).unwrap_err();
        assert_eq!(messages(&err), vec!["Invalid email address"]);
    }

    #[test]
    fn short_password_rejected() {
        let mut payload = valid_payload();
        payload["personal"]["password"] = json!("Ab1!");
        let err = validate_create(&payload).unwrap_err();
        assert_eq!(messages(&err), vec!["Password must be at least 8 characters"]);
    }

    #[test]
    fn weak_password_rejected() {
        let mut payload = valid_payload();
        payload["personal"]["password"] = json!("alllowercase1!");
        let err = validate_create(&payload).unwrap_err();
        assert!(err.0[0].message.contains("one uppercase letter"));
    }

    #[test]
    fn password_with_disallowed_characters_rejected() {
        let mut payload = valid_payload();
        payload["personal"]["password"] = json!("Sup3r Secret!");
        assert!(validate_create(&payload).is_err());
    }

    #[test]
    fn invalid_date_of_birth_rejected() {
        let mut payload = valid_payload();
        payload["personal"]["dateOfBirth"] = json!("12/04/1995");
        let err = validate_create(&payload).unwrap_err();
        assert!(err.0[0].message.contains("valid ISO date"));
    }

    #[test]
    fn alternate_phone_validated_when_present() {
        let mut payload = valid_payload();
        payload["contact"]["alternatePhoneNumber"] = json!("+15551234567");
        let err = validate_create(&payload).unwrap_err();
        assert_eq!(fields(&err), vec!["contact.alternatePhoneNumber"]);
    }

    #[test]
    fn negative_years_of_experience_rejected() {
        let mut payload = valid_payload();
        payload["employment"]["yearsOfExperience"] = json!(-1);
        let err = validate_create(&payload).unwrap_err();
        assert_eq!(messages(&err), vec!["Years of Experience cannot be negative"]);
    }

    #[test]
    fn credit_score_bounds_enforced() {
        let mut payload = valid_payload();
        payload["financial"]["creditScore"] = json!(250);
        let err = validate_create(&payload).unwrap_err();
        assert_eq!(messages(&err), vec!["Credit Score must be at least 300"]);

        payload["financial"]["creditScore"] = json!(851);
        let err = validate_create(&payload).unwrap_err();
        assert_eq!(messages(&err), vec!["Credit Score cannot exceed 850"]);
    }

    #[test]
    fn hobbies_must_be_text_list() {
        let mut payload = valid_payload();
        payload["preferences"]["hobbies"] = json!(["reading", 42]);
        let err = validate_create(&payload).unwrap_err();
        assert_eq!(fields(&err), vec!["preferences.hobbies"]);
    }

    #[test]
    fn edit_requires_at_least_one_section() {
        let err = validate_edit(&json!({})).unwrap_err();
        assert_eq!(messages(&err), vec!["At least one section must be provided"]);
    }

    #[test]
    fn edit_with_single_valid_section_passes() {
        let patch = validate_edit(&json!({
            "financial": {
                "loanStatus": "Yes",
                "loanAmount": 5000,
                "monthlyIncome": 3000,
                "creditScore": 700
            }
        }))
        .unwrap();
        assert!(patch.personal.is_none());
        let financial = patch.financial.unwrap();
        assert_eq!(financial.loan_amount, 5000.0);
    }

    #[test]
    fn edit_section_must_be_fully_valid() {
        // A supplied section is validated in full, not field-by-field.
        let err = validate_edit(&json!({
            "financial": { "loanStatus": "No" }
        }))
        .unwrap_err();
        assert!(fields(&err).contains(&"financial.monthlyIncome"));
        assert!(fields(&err).contains(&"financial.creditScore"));
    }

    #[test]
    fn edit_applies_conditional_rules() {
        let err = validate_edit(&json!({
            "employment": {
                "jobTitle": "Engineer",
                "employmentStatus": "Employed",
                "yearsOfExperience": 5
            }
        }))
        .unwrap_err();
        assert_eq!(fields(&err), vec!["employment.companyName"]);
    }

    #[test]
    fn edit_ignores_unknown_top_level_keys() {
        let patch = validate_edit(&json!({
            "preferences": { "contactMode": "SMS" },
            "unknown": { "x": 1 }
        }))
        .unwrap();
        assert!(patch.preferences.is_some());
    }
}
