//! Selection state and the filter predicates that decide which jobs are
//! visible on the board.
//!
//! Selections join to jobs by display label, because the list payload
//! denormalizes category and job type to their labels. Matching is
//! case-sensitive for exact label membership and case-insensitive for the
//! substring checks (search term, location), mirroring the board UI.

use crate::models::{Job, RefOption};

/// The set of active filter values. Toggle order is preserved so selected
/// chips display in the order the user picked them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub search_term: String,
    pub selected_categories: Vec<String>,
    pub selected_job_types: Vec<String>,
    pub selected_location: String,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the category if absent, remove it if present.
    pub fn toggle_category(&mut self, label: &str) {
        toggle(&mut self.selected_categories, label);
    }

    /// Add the job type if absent, remove it if present.
    pub fn toggle_job_type(&mut self, label: &str) {
        toggle(&mut self.selected_job_types, label);
    }

    /// Single-select with toggle semantics: setting the currently-selected
    /// value again clears it.
    pub fn set_location(&mut self, value: &str) {
        if self.selected_location == value {
            self.selected_location.clear();
        } else {
            self.selected_location = value.to_string();
        }
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.search_term = term.to_string();
    }

    pub fn clear_categories(&mut self) {
        self.selected_categories.clear();
    }

    pub fn clear_job_types(&mut self) {
        self.selected_job_types.clear();
    }

    pub fn clear_all(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True iff the job passes all four predicates. Strict conjunction, no
    /// relevance ranking.
    pub fn matches(&self, job: &Job) -> bool {
        self.matches_search(job)
            && self.matches_category(job)
            && self.matches_job_type(job)
            && self.matches_location(job)
    }

    /// Case-insensitive substring match against title, company name, or
    /// short description. A missing field is a non-match for that field
    /// only, never an error.
    pub fn matches_search(&self, job: &Job) -> bool {
        if self.search_term.is_empty() {
            return true;
        }
        let term = self.search_term.to_lowercase();
        [&job.title, &job.company_name, &job.short_description]
            .into_iter()
            .any(|field| {
                field
                    .as_deref()
                    .is_some_and(|text| text.to_lowercase().contains(&term))
            })
    }

    pub fn matches_category(&self, job: &Job) -> bool {
        self.selected_categories.is_empty()
            || job
                .category
                .as_deref()
                .is_some_and(|c| self.selected_categories.iter().any(|s| s == c))
    }

    pub fn matches_job_type(&self, job: &Job) -> bool {
        self.selected_job_types.is_empty()
            || job
                .job_type
                .as_deref()
                .is_some_and(|t| self.selected_job_types.iter().any(|s| s == t))
    }

    /// Case-insensitive substring containment, so a selection of "uk"
    /// matches a job located in "UK".
    pub fn matches_location(&self, job: &Job) -> bool {
        if self.selected_location.is_empty() {
            return true;
        }
        let wanted = self.selected_location.to_lowercase();
        job.location
            .as_deref()
            .is_some_and(|loc| loc.to_lowercase().contains(&wanted))
    }
}

fn toggle(set: &mut Vec<String>, label: &str) {
    if let Some(pos) = set.iter().position(|s| s == label) {
        set.remove(pos);
    } else {
        set.push(label.to_string());
    }
}

/// The derived view: the subset of jobs the current selection allows,
/// preserving the collection's original order. Pure; recomputed after every
/// discrete state change, caches nothing.
pub fn visible_jobs<'a>(jobs: &'a [Job], selection: &SelectionState) -> Vec<&'a Job> {
    jobs.iter().filter(|job| selection.matches(job)).collect()
}

/// Narrow an option list by case-insensitive substring match on labels.
/// An empty term returns the full list.
pub fn narrow_options<'a>(options: &'a [RefOption], term: &str) -> Vec<&'a RefOption> {
    let term = term.to_lowercase();
    options
        .iter()
        .filter(|opt| opt.label.to_lowercase().contains(&term))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(title: &str, category: &str, job_type: &str, location: &str) -> Job {
        Job {
            title: Some(title.to_string()),
            company_name: Some("Acme".to_string()),
            short_description: Some(format!("{} role", title)),
            category: Some(category.to_string()),
            job_type: Some(job_type.to_string()),
            location: Some(location.to_string()),
            ..Job::default()
        }
    }

    fn board() -> Vec<Job> {
        vec![
            job(
                "Backend Engineer",
                "Software Development",
                "Full-time",
                "Worldwide",
            ),
            job("Sales Lead", "Sales / Business", "Contract", "UK"),
        ]
    }

    #[test]
    fn test_empty_selection_matches_everything() {
        let selection = SelectionState::new();
        for j in board() {
            assert!(selection.matches(&j));
        }
    }

    #[test]
    fn test_each_predicate_fails_independently() {
        let j = job("Backend Engineer", "Software Development", "Full-time", "UK");

        let mut search_only = SelectionState::new();
        search_only.set_search_term("zzz-no-such-job");
        assert!(!search_only.matches_search(&j));
        assert!(search_only.matches_category(&j));
        assert!(search_only.matches_job_type(&j));
        assert!(search_only.matches_location(&j));
        assert!(!search_only.matches(&j));

        let mut category_only = SelectionState::new();
        category_only.toggle_category("Design");
        assert!(category_only.matches_search(&j));
        assert!(!category_only.matches_category(&j));
        assert!(!category_only.matches(&j));

        let mut type_only = SelectionState::new();
        type_only.toggle_job_type("Internship");
        assert!(!type_only.matches_job_type(&j));
        assert!(!type_only.matches(&j));

        let mut location_only = SelectionState::new();
        location_only.set_location("japan");
        assert!(!location_only.matches_location(&j));
        assert!(!location_only.matches(&j));
    }

    #[test]
    fn test_category_filter_scenario() {
        let jobs = board();
        let mut selection = SelectionState::new();
        selection.toggle_category("Software Development");

        let visible = visible_jobs(&jobs, &selection);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title.as_deref(), Some("Backend Engineer"));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let jobs = board();
        let mut selection = SelectionState::new();
        selection.set_search_term("sales");

        let visible = visible_jobs(&jobs, &selection);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title.as_deref(), Some("Sales Lead"));
    }

    #[test]
    fn test_search_matches_company_and_description() {
        let mut j = job("Backend Engineer", "Software Development", "Full-time", "UK");
        j.company_name = Some("Pentera".to_string());
        j.short_description = Some("Enhance customer relationships".to_string());

        let mut selection = SelectionState::new();
        selection.set_search_term("PENTERA");
        assert!(selection.matches(&j));

        selection.set_search_term("relationships");
        assert!(selection.matches(&j));
    }

    #[test]
    fn test_location_substring_case_insensitive() {
        let j = job("Sales Lead", "Sales / Business", "Contract", "UK");
        let mut selection = SelectionState::new();
        selection.set_location("uk");
        assert!(selection.matches_location(&j));
    }

    #[test]
    fn test_missing_fields_degrade_to_non_match() {
        let bare = Job::default();

        let mut selection = SelectionState::new();
        selection.set_search_term("engineer");
        assert!(!selection.matches_search(&bare));

        selection.clear_all();
        selection.toggle_category("Design");
        assert!(!selection.matches_category(&bare));

        selection.clear_all();
        selection.set_location("uk");
        assert!(!selection.matches_location(&bare));

        // And with no filters active the bare record is still visible.
        selection.clear_all();
        assert!(selection.matches(&bare));
    }

    #[test]
    fn test_toggle_is_idempotent_over_two_applications() {
        let mut selection = SelectionState::new();
        selection.toggle_category("Design");
        let once = selection.clone();

        selection.toggle_category("Design");
        assert!(selection.selected_categories.is_empty());

        selection.toggle_category("Design");
        assert_eq!(selection, once);
    }

    #[test]
    fn test_toggle_preserves_insertion_order() {
        let mut selection = SelectionState::new();
        selection.toggle_category("Writing");
        selection.toggle_category("Design");
        selection.toggle_category("QA");
        selection.toggle_category("Design");
        assert_eq!(selection.selected_categories, vec!["Writing", "QA"]);
    }

    #[test]
    fn test_set_location_again_clears_it() {
        let mut selection = SelectionState::new();
        selection.set_location("uk");
        assert_eq!(selection.selected_location, "uk");
        selection.set_location("uk");
        assert!(selection.selected_location.is_empty());
        selection.set_location("uk");
        selection.set_location("japan");
        assert_eq!(selection.selected_location, "japan");
    }

    #[test]
    fn test_clear_all_yields_empty_state() {
        let mut selection = SelectionState::new();
        selection.set_search_term("rust");
        selection.toggle_category("Software Development");
        selection.toggle_job_type("Full-time");
        selection.set_location("usa");
        assert!(!selection.is_empty());

        selection.clear_all();
        assert_eq!(selection, SelectionState::default());
    }

    #[test]
    fn test_visible_jobs_preserves_order() {
        let jobs = vec![
            job("A", "Design", "Full-time", "UK"),
            job("B", "Design", "Contract", "UK"),
            job("C", "Design", "Full-time", "USA"),
            job("D", "Design", "Full-time", "UK"),
        ];
        let mut selection = SelectionState::new();
        selection.toggle_job_type("Full-time");

        let titles: Vec<_> = visible_jobs(&jobs, &selection)
            .iter()
            .map(|j| j.title.as_deref().unwrap())
            .collect();
        assert_eq!(titles, vec!["A", "C", "D"]);
    }

    #[test]
    fn test_narrow_options_substring_and_reset() {
        let options = vec![
            RefOption::new("design", "Design"),
            RefOption::new("data-analysis", "Data Analysis"),
            RefOption::new("qa", "QA"),
        ];

        let hits = narrow_options(&options, "des");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].label, "Design");

        let hits = narrow_options(&options, "dA");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].label, "Data Analysis");

        // Clearing the term restores the full candidate list.
        assert_eq!(narrow_options(&options, "").len(), options.len());
    }
}
