use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmploymentStatus {
    Employed,
    Unemployed,
    Student,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactMode {
    Email,
    Phone,
    #[serde(rename = "SMS")]
    Sms,
}

/// Personal section. `password` holds the one-way transform at rest;
/// plaintext only ever appears in inbound payloads before hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate_phone_number: Option<String>,
    pub address_line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmploymentInfo {
    pub job_title: String,
    pub employment_status: EmploymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    pub years_of_experience: f64,
    /// Opaque location of the stored resume artifact. Set by the artifact
    /// coordinator, not by callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialInfo {
    pub monthly_income: f64,
    pub loan_status: LoanStatus,
    #[serde(default)]
    pub loan_amount: f64,
    pub credit_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub contact_mode: ContactMode,
    #[serde(default)]
    pub hobbies: Vec<String>,
    #[serde(default)]
    pub newsletter: bool,
}

/// A fully validated create payload: all five sections present.
#[derive(Debug, Clone, Deserialize)]
pub struct FormSections {
    pub personal: PersonalInfo,
    pub contact: ContactInfo,
    pub employment: EmploymentInfo,
    pub financial: FinancialInfo,
    pub preferences: Preferences,
}

/// A validated partial edit: any subset of sections, at least one present.
/// A present section replaces the stored one wholesale.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormPatch {
    pub personal: Option<PersonalInfo>,
    pub contact: Option<ContactInfo>,
    pub employment: Option<EmploymentInfo>,
    pub financial: Option<FinancialInfo>,
    pub preferences: Option<Preferences>,
}

/// The persisted entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormRecord {
    pub id: Uuid,
    pub personal: PersonalInfo,
    pub contact: ContactInfo,
    pub employment: EmploymentInfo,
    pub financial: FinancialInfo,
    pub preferences: Preferences,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FormRecord {
    pub fn new(sections: FormSections, now: DateTime<Utc>) -> Self {
        FormRecord {
            id: Uuid::new_v4(),
            personal: sections.personal,
            contact: sections.contact,
            employment: sections.employment,
            financial: sections.financial,
            preferences: sections.preferences,
            created_at: now,
            updated_at: now,
        }
    }

    /// Read model with the secret stripped.
    pub fn redacted(&self) -> FormView {
        FormView {
            id: self.id,
            personal: PersonalView {
                full_name: self.personal.full_name.clone(),
                email: self.personal.email.clone(),
                gender: self.personal.gender,
                date_of_birth: self.personal.date_of_birth,
            },
            contact: self.contact.clone(),
            employment: self.employment.clone(),
            financial: self.financial.clone(),
            preferences: self.preferences.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Personal section as exposed to readers: no password field exists on this
/// type, so the transform can never leak through serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalView {
    pub full_name: String,
    pub email: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub id: Uuid,
    pub personal: PersonalView,
    pub contact: ContactInfo,
    pub employment: EmploymentInfo,
    pub financial: FinancialInfo,
    pub preferences: Preferences,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
