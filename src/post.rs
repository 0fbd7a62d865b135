//! The paid job-post flow: a JSON draft file standing in for the web form,
//! field-keyed client-side validation, company-create-then-post submission,
//! and the checkout URL handoff.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::api::{ApiClient, FieldErrors};

/// Reuse an existing company by id, or create one alongside the post.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CompanyRef {
    Existing { existing: String },
    New(NewCompany),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCompany {
    #[serde(default)]
    pub name: String,
    pub logo: Option<PathBuf>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub contact_name: String,
    #[serde(default)]
    pub contact_email: String,
}

/// One job post as drafted by the user. Everything defaults so that a
/// half-filled draft validates with per-field messages instead of failing
/// to parse.
#[derive(Debug, Clone, Deserialize)]
pub struct JobPostDraft {
    #[serde(default)]
    pub job_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub is_worldwide: bool,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub salary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    pub company: Option<CompanyRef>,
}

pub const SHORT_DESCRIPTION_MAX: usize = 200;

impl JobPostDraft {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read draft file: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Draft file is not valid JSON: {}", path.display()))
    }

    /// Client-side validation, mirroring the web form field for field. An
    /// empty map means the draft may be submitted.
    pub fn validate(&self) -> BTreeMap<String, String> {
        let mut errors = BTreeMap::new();
        let mut require = |field: &str, value: &str, message: &str| {
            if value.trim().is_empty() {
                errors.insert(field.to_string(), message.to_string());
            }
        };

        require("job_url", &self.job_url, "Job URL is required");
        require("title", &self.title, "Job title is required");
        if !self.is_worldwide {
            require(
                "location",
                &self.location,
                "Location is required if not worldwide",
            );
        }
        require("category", &self.category, "Category is required");
        require("job_type", &self.job_type, "Job type is required");
        require(
            "description",
            &self.description,
            "Job description is required",
        );
        require(
            "short_description",
            &self.short_description,
            "Short description is required",
        );
        if self.short_description.chars().count() > SHORT_DESCRIPTION_MAX {
            errors.insert(
                "short_description".to_string(),
                format!(
                    "Short description must be less than {} characters",
                    SHORT_DESCRIPTION_MAX
                ),
            );
        }

        match &self.company {
            None => {
                errors.insert("company".to_string(), "Company is required".to_string());
            }
            Some(CompanyRef::Existing { existing }) => {
                if existing.trim().is_empty() {
                    errors.insert(
                        "company".to_string(),
                        "Existing company id is empty".to_string(),
                    );
                }
            }
            Some(CompanyRef::New(company)) => {
                if company.name.trim().is_empty() {
                    errors.insert(
                        "company.name".to_string(),
                        "Company name is required".to_string(),
                    );
                }
                if company.contact_name.trim().is_empty() {
                    errors.insert(
                        "company.contact_name".to_string(),
                        "Contact name is required".to_string(),
                    );
                }
                if company.contact_email.trim().is_empty() {
                    errors.insert(
                        "company.contact_email".to_string(),
                        "Contact email is required".to_string(),
                    );
                }
            }
        }

        errors
    }

    /// Create the company first when needed, then post the job. Returns the
    /// checkout URL when the backend provides one. Callers should have run
    /// [`JobPostDraft::validate`] already; the backend re-validates anyway.
    pub fn submit(&self, client: &ApiClient) -> Result<Option<String>> {
        let company_id = match &self.company {
            Some(CompanyRef::Existing { existing }) => existing.clone(),
            Some(CompanyRef::New(company)) => client.create_company(
                &company.name,
                &company.description,
                &company.contact_name,
                &company.contact_email,
                company.logo.as_deref(),
            )?,
            None => String::new(),
        };

        let payload = json!({
            "job_url": self.job_url,
            "title": self.title,
            "location": self.location,
            "is_worldwide": self.is_worldwide,
            "category": client.resource_url("categories", &self.category),
            "job_type": client.resource_url("jobtypes", &self.job_type),
            "salary": self.salary,
            "description": self.description,
            "short_description": self.short_description,
            "company": client.resource_url("companies", &company_id),
        });

        client.create_job_post(&payload)
    }
}

/// Merge server-side field errors from a failed submit into the same
/// per-field map the client-side validation fills. Returns true when the
/// error carried field-level detail.
pub fn merge_server_errors(errors: &mut BTreeMap<String, String>, err: &anyhow::Error) -> bool {
    match err.downcast_ref::<FieldErrors>() {
        Some(FieldErrors(fields)) => {
            for (field, message) in fields {
                errors.insert(field.clone(), message.clone());
            }
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn complete_draft() -> JobPostDraft {
        serde_json::from_value(json!({
            "job_url": "https://acme.dev/jobs/backend",
            "title": "Backend Engineer",
            "location": "UK",
            "is_worldwide": false,
            "category": "cat-1",
            "job_type": "jt-1",
            "salary": "$60K - $80K",
            "description": "Long form description",
            "short_description": "One sentence.",
            "company": {
                "name": "Acme",
                "contact_name": "Jo Doe",
                "contact_email": "jo@acme.dev"
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_complete_draft_validates_clean() {
        assert!(complete_draft().validate().is_empty());
    }

    #[test]
    fn test_required_fields_reported_per_field() {
        let draft: JobPostDraft = serde_json::from_value(json!({})).unwrap();
        let errors = draft.validate();
        for field in [
            "job_url",
            "title",
            "location",
            "category",
            "job_type",
            "description",
            "short_description",
            "company",
        ] {
            assert!(errors.contains_key(field), "missing error for {}", field);
        }
    }

    #[test]
    fn test_worldwide_waives_location() {
        let mut draft = complete_draft();
        draft.location.clear();
        assert!(draft.validate().contains_key("location"));

        draft.is_worldwide = true;
        assert!(!draft.validate().contains_key("location"));
    }

    #[test]
    fn test_short_description_length_cap() {
        let mut draft = complete_draft();
        draft.short_description = "x".repeat(SHORT_DESCRIPTION_MAX);
        assert!(draft.validate().is_empty());

        draft.short_description = "x".repeat(SHORT_DESCRIPTION_MAX + 1);
        assert!(draft.validate().contains_key("short_description"));
    }

    #[test]
    fn test_new_company_requires_contact_fields() {
        let mut draft = complete_draft();
        draft.company = Some(CompanyRef::New(NewCompany {
            name: "Acme".to_string(),
            ..NewCompany::default()
        }));
        let errors = draft.validate();
        assert!(errors.contains_key("company.contact_name"));
        assert!(errors.contains_key("company.contact_email"));
        assert!(!errors.contains_key("company.name"));
    }

    #[test]
    fn test_existing_company_parses_from_draft() {
        let draft: JobPostDraft = serde_json::from_value(json!({
            "company": { "existing": "uuid-42" }
        }))
        .unwrap();
        match draft.company {
            Some(CompanyRef::Existing { ref existing }) => assert_eq!(existing, "uuid-42"),
            other => panic!("expected existing company, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_server_errors_downcasts_field_errors() {
        let mut local = BTreeMap::new();
        local.insert("title".to_string(), "stale".to_string());

        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), "Too long".to_string());
        fields.insert("job_url".to_string(), "Enter a valid URL".to_string());
        let err = anyhow::Error::new(FieldErrors(fields));

        assert!(merge_server_errors(&mut local, &err));
        assert_eq!(local.get("title").map(String::as_str), Some("Too long"));
        assert_eq!(
            local.get("job_url").map(String::as_str),
            Some("Enter a valid URL")
        );

        let mut local = BTreeMap::new();
        assert!(!merge_server_errors(&mut local, &anyhow!("network down")));
        assert!(local.is_empty());
    }
}
