//! Conditional rule evaluator — resolves "when field X has value V, field Y
//! becomes required" rules declared per section.
//!
//! Rules are data, not branches: each is a `ConditionalRule` row in the
//! section's schema table, and this one evaluator serves both the create and
//! the edit path.

use serde_json::{Map, Value};

use crate::forms::schema::{check_value, FieldError, FieldKind, SectionSchema};

/// A dependent-field rule: when `discriminator` equals `equals`, the
/// `dependent` field must be present and satisfy `constraint`. Otherwise the
/// dependent is optional, but a supplied value must still satisfy
/// `constraint`.
pub struct ConditionalRule {
    pub discriminator: &'static str,
    pub equals: &'static str,
    pub dependent: &'static str,
    pub label: &'static str,
    pub constraint: FieldKind,
    pub required_message: &'static str,
}

/// Evaluates one rule against a section object, appending any violations.
///
/// The discriminator must itself be present and valid before the dependent
/// rule fires; an invalid discriminator already carries its own field error,
/// so the rule is skipped to avoid cascading spurious errors.
pub fn evaluate(
    rule: &ConditionalRule,
    schema: &SectionSchema,
    section: &Map<String, Value>,
    errors: &mut Vec<FieldError>,
) {
    let Some(disc_spec) = schema.fields.iter().find(|f| f.name == rule.discriminator) else {
        return;
    };
    let Some(disc) = present(section, rule.discriminator) else {
        return;
    };
    if check_value(&disc_spec.kind, disc, disc_spec.label).is_err() {
        return;
    }

    let path = format!("{}.{}", schema.name, rule.dependent);
    let dependent = present(section, rule.dependent);

    if disc.as_str() == Some(rule.equals) {
        match dependent {
            None => errors.push(FieldError::new(path, rule.required_message)),
            Some(value) => {
                if let Err(message) = check_value(&rule.constraint, value, rule.label) {
                    // An empty text value reads as "missing" to callers, so it
                    // gets the conditional's own message.
                    let message = if matches!(rule.constraint, FieldKind::Text) {
                        rule.required_message.to_string()
                    } else {
                        message
                    };
                    errors.push(FieldError::new(path, message));
                }
            }
        }
    } else if let Some(value) = dependent {
        if let Err(message) = check_value(&rule.constraint, value, rule.label) {
            errors.push(FieldError::new(path, message));
        }
    }
}

fn present<'a>(section: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    section.get(key).filter(|v| !v.is_null())
}
