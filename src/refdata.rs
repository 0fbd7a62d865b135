//! Built-in reference data: the fallback job-type list used when the
//! `jobtypes/` fetch fails, and the client-side location list. Categories
//! deliberately have no fallback; a failed categories fetch leaves an empty
//! enumeration plus a visible error.

use crate::models::RefOption;

pub const FALLBACK_JOB_TYPES: [&str; 5] = [
    "Full-time",
    "Part-time",
    "Contract",
    "Freelance",
    "Internship",
];

const LOCATIONS: [(&str, &str); 16] = [
    ("worldwide", "Worldwide"),
    ("usa", "USA"),
    ("uk", "UK"),
    ("canada", "Canada"),
    ("australia", "Australia"),
    ("germany", "Germany"),
    ("france", "France"),
    ("spain", "Spain"),
    ("italy", "Italy"),
    ("netherlands", "Netherlands"),
    ("sweden", "Sweden"),
    ("switzerland", "Switzerland"),
    ("india", "India"),
    ("singapore", "Singapore"),
    ("japan", "Japan"),
    ("kenya", "Kenya"),
];

/// The five built-in job types, used verbatim as both value and label.
pub fn fallback_job_types() -> Vec<RefOption> {
    FALLBACK_JOB_TYPES
        .iter()
        .map(|t| RefOption::new(*t, *t))
        .collect()
}

/// The location filter's candidates are client-side only; the backend treats
/// location as free text.
pub fn locations() -> Vec<RefOption> {
    LOCATIONS
        .iter()
        .map(|(value, label)| RefOption::new(*value, *label))
        .collect()
}

/// Display label for a stored value, falling back to the value itself for
/// anything not in the list.
pub fn label_for<'a>(options: &'a [RefOption], value: &'a str) -> &'a str {
    options
        .iter()
        .find(|opt| opt.value.eq_ignore_ascii_case(value))
        .map(|opt| opt.label.as_str())
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_job_types_are_the_five_builtins() {
        let types = fallback_job_types();
        assert_eq!(types.len(), 5);
        assert_eq!(types[0].label, "Full-time");
        assert_eq!(types[4].label, "Internship");
        // Values double as labels for the builtins.
        assert!(types.iter().all(|t| t.value == t.label));
    }

    #[test]
    fn test_locations_list() {
        let locs = locations();
        assert_eq!(locs.len(), 16);
        assert_eq!(locs[0], RefOption::new("worldwide", "Worldwide"));
        assert!(locs.iter().any(|l| l.label == "Kenya"));
    }

    #[test]
    fn test_label_for_known_and_unknown_values() {
        let locs = locations();
        assert_eq!(label_for(&locs, "uk"), "UK");
        assert_eq!(label_for(&locs, "UK"), "UK");
        assert_eq!(label_for(&locs, "mars"), "mars");
    }
}
