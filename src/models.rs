use serde::{Deserialize, Serialize};

/// A job post as the board's list endpoint returns it. Category and job type
/// arrive denormalized as display labels, not identifiers. Any field may be
/// missing from an older record; the filters treat absence as a non-match
/// rather than an error, so everything optional stays optional here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub id: String,
    pub title: Option<String>,
    pub company_name: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub job_type: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub created_at: Option<String>,
    pub featured: Option<bool>,
}

impl Job {
    /// Display title for list rows; records without one do exist.
    pub fn title_or_untitled(&self) -> &str {
        self.title.as_deref().unwrap_or("(untitled)")
    }

    /// Posting date for display. Backend timestamps are RFC 3339; anything
    /// else is shown as-is rather than dropped.
    pub fn posted_date(&self) -> Option<String> {
        let raw = self.created_at.as_deref()?;
        Some(
            chrono::DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|_| raw.to_string()),
        )
    }
}

/// One entry of a server-provided enumeration (category, job type, company),
/// normalized to an identifier plus a display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefOption {
    pub value: String,
    pub label: String,
}

impl RefOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A company record from `companies/`, used by the job-post flow to reuse an
/// existing company instead of creating a new one.
#[derive(Debug, Clone, Deserialize)]
pub struct Company {
    pub id: String,
    pub name: String,
    pub contact_email: Option<String>,
}

/// The JWT pair returned by `api/token/` and persisted by the session store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tokens {
    pub access: String,
    pub refresh: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posted_date_parses_rfc3339() {
        let job = Job {
            created_at: Some("2025-03-14T09:26:53+00:00".to_string()),
            ..Job::default()
        };
        assert_eq!(job.posted_date().as_deref(), Some("2025-03-14"));
    }

    #[test]
    fn test_posted_date_passes_through_unparseable() {
        let job = Job {
            created_at: Some("3 hours ago".to_string()),
            ..Job::default()
        };
        assert_eq!(job.posted_date().as_deref(), Some("3 hours ago"));
        assert_eq!(Job::default().posted_date(), None);
    }
}
