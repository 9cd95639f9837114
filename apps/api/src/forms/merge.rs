//! Record merge engine — combines a stored record with a validated partial
//! edit.
//!
//! Policy: section-level replacement only. A section present in the patch
//! replaces the stored section wholesale; absent sections carry over
//! unchanged. Callers that want to change one field must resend the full
//! section. Not-found handling is the caller's job: the record passed in is
//! assumed to exist, and this module never upserts.

use chrono::{DateTime, Utc};

use crate::forms::models::{FormPatch, FormRecord};

/// Applies `patch` on top of `existing`. `created_at` is immutable;
/// `updated_at` becomes `now`.
pub fn merge(existing: FormRecord, patch: FormPatch, now: DateTime<Utc>) -> FormRecord {
    FormRecord {
        id: existing.id,
        personal: patch.personal.unwrap_or(existing.personal),
        contact: patch.contact.unwrap_or(existing.contact),
        employment: patch.employment.unwrap_or(existing.employment),
        financial: patch.financial.unwrap_or(existing.financial),
        preferences: patch.preferences.unwrap_or(existing.preferences),
        created_at: existing.created_at,
        updated_at: now,
    }
}
