//! Blocking HTTP client for the job-board backend.
//!
//! The enumeration endpoints are served by a framework that sometimes
//! returns a bare array and sometimes one of several wrapper objects, so
//! every reference-data response goes through one normalization function
//! with a typed error for anything it does not recognize.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::models::{Company, Job, RefOption, Tokens};
use crate::refdata;

const DEFAULT_API_URL: &str = "http://localhost:8000/";

/// A reference-data response we could not make sense of. Distinguishes a
/// payload of the wrong type entirely from a wrapper object missing every
/// known collection key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("expected an array or wrapper object, got {got}")]
    WrongType { got: &'static str },
    #[error("wrapper object has none of the known collection fields")]
    UnrecognizedShape,
}

/// Field-keyed validation errors returned by the backend after a failed
/// submit, e.g. `{"title": ["This field is required."]}`. Carried as a typed
/// error so form flows can merge them into their own per-field display.
#[derive(Debug, Error)]
pub struct FieldErrors(pub BTreeMap<String, String>);

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self
            .0
            .iter()
            .map(|(field, msg)| format!("{}: {}", field, msg))
            .collect();
        write!(f, "{}", joined.join("; "))
    }
}

#[derive(Clone)]
pub struct ApiClient {
    base: String,
    client: reqwest::blocking::Client,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobsResponse {
    #[serde(default)]
    jobs: Vec<Job>,
}

#[derive(Debug, Deserialize)]
struct CheckoutResponse {
    checkout_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedCompany {
    id: Value,
}

impl ApiClient {
    /// Base URL comes from RTJOBS_API_URL, with a trailing slash enforced so
    /// path concatenation stays simple.
    pub fn new() -> Self {
        let base = env::var("RTJOBS_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::with_base(&base)
    }

    pub fn with_base(base: &str) -> Self {
        let mut base = base.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Self {
            base,
            client: reqwest::blocking::Client::new(),
            access_token: None,
        }
    }

    /// Attach the signed-in user's access token to subsequent requests.
    pub fn with_auth(mut self, tokens: Option<&Tokens>) -> Self {
        self.access_token = tokens.map(|t| t.access.clone());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn get(&self, path: &str) -> Result<reqwest::blocking::Response> {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }
        req.send()
            .with_context(|| format!("Failed to reach {}", self.url(path)))
    }

    // --- Job listing ---

    /// GET joblists. The collection lives in the `jobs` field; its absence
    /// means an empty board, not an error.
    pub fn fetch_jobs(&self) -> Result<Vec<Job>> {
        let response = self.get("joblists")?;
        if !response.status().is_success() {
            return Err(anyhow!("joblists request failed: {}", response.status()));
        }
        let body: JobsResponse = response.json().context("Failed to parse job listing")?;
        Ok(body.jobs)
    }

    // --- Reference data ---

    pub fn fetch_categories(&self) -> Result<Vec<RefOption>> {
        self.fetch_enumeration("categories/")
    }

    pub fn fetch_job_types(&self) -> Result<Vec<RefOption>> {
        self.fetch_enumeration("jobtypes/")
    }

    /// Job types with the built-in fallback: a failed fetch yields the five
    /// fixed types plus the error for display, rather than an empty control.
    /// Categories get no such treatment.
    pub fn job_types_or_fallback(&self) -> (Vec<RefOption>, Option<String>) {
        match self.fetch_job_types() {
            Ok(types) => (types, None),
            Err(err) => (refdata::fallback_job_types(), Some(format!("{:#}", err))),
        }
    }

    pub fn fetch_companies(&self) -> Result<Vec<Company>> {
        let response = self.get("companies/")?;
        if !response.status().is_success() {
            return Err(anyhow!("companies request failed: {}", response.status()));
        }
        let body: Value = response.json().context("Failed to parse company list")?;
        let records = unwrap_collection(&body)?;
        let companies = records
            .iter()
            .filter_map(|record| serde_json::from_value(record.clone()).ok())
            .collect();
        Ok(companies)
    }

    fn fetch_enumeration(&self, path: &str) -> Result<Vec<RefOption>> {
        let response = self.get(path)?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "{} request failed: {}",
                path.trim_end_matches('/'),
                response.status()
            ));
        }
        let body: Value = response
            .json()
            .with_context(|| format!("Failed to parse {} response", path))?;
        Ok(normalize_enumeration(&body)?)
    }

    // --- Auth ---

    /// POST api/token/. Error bodies vary: `detail`, `non_field_errors`, or
    /// a field-keyed object; all collapse to one user-facing message.
    pub fn login(&self, email: &str, password: &str) -> Result<Tokens> {
        let response = self
            .client
            .post(self.url("api/token/"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .context("Failed to reach the sign-in endpoint")?;

        let status = response.status();
        let body: Value = response.json().context("Failed to parse sign-in response")?;

        if !status.is_success() {
            return Err(anyhow!("{}", auth_error_message(&body)));
        }
        serde_json::from_value(body).context("Sign-in response missing token pair")
    }

    /// POST signup/. A failed registration surfaces the server's field-keyed
    /// errors as a [`FieldErrors`] inside the anyhow chain.
    pub fn signup(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<()> {
        let response = self
            .client
            .post(self.url("signup/"))
            .json(&serde_json::json!({
                "full_name": full_name,
                "email": email,
                "password": password,
                "confirm_password": confirm_password,
            }))
            .send()
            .context("Failed to reach the signup endpoint")?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body: Value = response.json().unwrap_or(Value::Null);
        let fields = decode_field_errors(&body);
        if fields.0.is_empty() {
            Err(anyhow!("Registration failed: {}", status))
        } else {
            Err(anyhow::Error::new(fields).context("Registration failed"))
        }
    }

    // --- Job posting ---

    /// POST companies/ as multipart, with the optional logo streamed from
    /// disk. Returns the new company's id.
    pub fn create_company(
        &self,
        name: &str,
        description: &str,
        contact_name: &str,
        contact_email: &str,
        logo: Option<&Path>,
    ) -> Result<String> {
        let mut form = reqwest::blocking::multipart::Form::new()
            .text("name", name.to_string())
            .text("description", description.to_string())
            .text("contact_name", contact_name.to_string())
            .text("contact_email", contact_email.to_string());
        if let Some(path) = logo {
            form = form
                .file("logo", path)
                .with_context(|| format!("Failed to read logo file: {}", path.display()))?;
        }

        let mut req = self.client.post(self.url("companies/")).multipart(form);
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }
        let response = req.send().context("Failed to reach the company endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().unwrap_or(Value::Null);
            let fields = decode_field_errors(&body);
            return if fields.0.is_empty() {
                Err(anyhow!("Company creation failed: {}", status))
            } else {
                Err(anyhow::Error::new(fields).context("Company creation failed"))
            };
        }
        let created: CreatedCompany = response
            .json()
            .context("Company creation response missing id")?;
        Ok(stringify(&created.id).unwrap_or_default())
    }

    /// POST jobposts/. On success the backend hands back the payment page;
    /// on validation failure a [`FieldErrors`] is attached for merging into
    /// the form's own error display.
    pub fn create_job_post(&self, payload: &Value) -> Result<Option<String>> {
        let mut req = self.client.post(self.url("jobposts/")).json(payload);
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }
        let response = req.send().context("Failed to reach the job-post endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().unwrap_or(Value::Null);
            let fields = decode_field_errors(&body);
            return if fields.0.is_empty() {
                Err(anyhow!("Job post failed: {}", status))
            } else {
                Err(anyhow::Error::new(fields).context("Job post failed"))
            };
        }
        let body: CheckoutResponse = response.json().context("Failed to parse job-post response")?;
        Ok(body.checkout_url)
    }

    /// Hyperlinked reference the job-post payload uses for category,
    /// job type and company fields.
    pub fn resource_url(&self, collection: &str, id: &str) -> String {
        format!("{}{}/{}/", self.base, collection, id)
    }
}

/// Pull the record array out of a reference-data payload: a bare array is
/// used directly, otherwise the known wrapper fields are probed in order.
fn unwrap_collection(body: &Value) -> Result<&Vec<Value>, ShapeError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(map) => ["categories", "job_types", "results", "data"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .ok_or(ShapeError::UnrecognizedShape),
        Value::Null => Err(ShapeError::WrongType { got: "null" }),
        Value::Bool(_) => Err(ShapeError::WrongType { got: "a boolean" }),
        Value::Number(_) => Err(ShapeError::WrongType { got: "a number" }),
        Value::String(_) => Err(ShapeError::WrongType { got: "a string" }),
    }
}

/// Normalize one reference-data payload to `{value, label}` records. The
/// identifier is probed from `id`/`_id`/`value` and the display text from
/// `name`/`title`/`label`, first present field wins; either falls back to
/// the other, and records with neither are skipped.
pub fn normalize_enumeration(body: &Value) -> Result<Vec<RefOption>, ShapeError> {
    let records = unwrap_collection(body)?;
    Ok(records
        .iter()
        .filter_map(|record| {
            let value = probe(record, &["id", "_id", "value"]);
            let label = probe(record, &["name", "title", "label"]);
            match (value, label) {
                (Some(value), Some(label)) => Some(RefOption::new(value, label)),
                (Some(value), None) => Some(RefOption::new(value.clone(), value)),
                (None, Some(label)) => Some(RefOption::new(label.clone(), label)),
                (None, None) => None,
            }
        })
        .collect())
}

fn probe(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| stringify(record.get(*key)?))
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Flatten a DRF-style error body into per-field messages. Array values are
/// joined; scalar values pass through; anything else is ignored.
pub fn decode_field_errors(body: &Value) -> FieldErrors {
    let mut fields = BTreeMap::new();
    if let Value::Object(map) = body {
        for (key, value) in map {
            let message = match value {
                Value::String(s) => s.clone(),
                Value::Array(items) => items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                _ => continue,
            };
            if !message.is_empty() {
                fields.insert(key.clone(), message);
            }
        }
    }
    FieldErrors(fields)
}

fn auth_error_message(body: &Value) -> String {
    if let Some(detail) = body.get("detail").and_then(Value::as_str) {
        return detail.to_string();
    }
    if let Some(errors) = body.get("non_field_errors").and_then(Value::as_array) {
        let joined: Vec<&str> = errors.iter().filter_map(Value::as_str).collect();
        if !joined.is_empty() {
            return joined.join(". ");
        }
    }
    let fields = decode_field_errors(body);
    if !fields.0.is_empty() {
        return fields.to_string();
    }
    "Invalid email or password".to_string()
}
