//! Open/closed and local-search state for one filter control's popup list.
//!
//! The web board closes a dropdown on any pointer-down outside its DOM
//! region; in a terminal the equivalent is focus leaving the control (Esc,
//! or opening a different control), which routes through [`Dropdown::dismiss`].

/// Whether a control keeps its popup open after a selection. Multi-select
/// controls (categories, job types) stay open for further toggling; the
/// single-select location control closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    Multi,
    Single,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dropdown {
    mode: SelectMode,
    open: bool,
    pub search_term: String,
}

impl Dropdown {
    pub fn new(mode: SelectMode) -> Self {
        Self {
            mode,
            open: false,
            search_term: String::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The trigger interaction: closed <-> open. Opening starts with a fresh
    /// search term.
    pub fn toggle(&mut self) {
        if self.open {
            self.dismiss();
        } else {
            self.open = true;
            self.search_term.clear();
        }
    }

    /// Focus left the control: force open -> closed and drop the local
    /// search text. A no-op when already closed.
    pub fn dismiss(&mut self) {
        self.open = false;
        self.search_term.clear();
    }

    /// An option was chosen. Returns true if the popup stays open.
    pub fn selected(&mut self) -> bool {
        match self.mode {
            SelectMode::Multi => true,
            SelectMode::Single => {
                self.dismiss();
                false
            }
        }
    }

    pub fn push_search(&mut self, c: char) {
        self.search_term.push(c);
    }

    pub fn pop_search(&mut self) {
        self.search_term.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_cycles_open_closed() {
        let mut dd = Dropdown::new(SelectMode::Multi);
        assert!(!dd.is_open());
        dd.toggle();
        assert!(dd.is_open());
        dd.toggle();
        assert!(!dd.is_open());
    }

    #[test]
    fn test_dismiss_clears_local_search() {
        let mut dd = Dropdown::new(SelectMode::Multi);
        dd.toggle();
        dd.push_search('d');
        dd.push_search('e');
        assert_eq!(dd.search_term, "de");

        dd.dismiss();
        assert!(!dd.is_open());
        assert!(dd.search_term.is_empty());
    }

    #[test]
    fn test_reopen_starts_with_empty_search() {
        let mut dd = Dropdown::new(SelectMode::Single);
        dd.toggle();
        dd.push_search('u');
        dd.push_search('k');
        dd.toggle();
        dd.toggle();
        assert!(dd.is_open());
        assert!(dd.search_term.is_empty());
    }

    #[test]
    fn test_multi_select_stays_open_on_selection() {
        let mut dd = Dropdown::new(SelectMode::Multi);
        dd.toggle();
        assert!(dd.selected());
        assert!(dd.is_open());
    }

    #[test]
    fn test_single_select_closes_on_selection() {
        let mut dd = Dropdown::new(SelectMode::Single);
        dd.toggle();
        assert!(!dd.selected());
        assert!(!dd.is_open());
    }

    #[test]
    fn test_backspace_edits_search() {
        let mut dd = Dropdown::new(SelectMode::Multi);
        dd.toggle();
        dd.push_search('q');
        dd.push_search('a');
        dd.pop_search();
        assert_eq!(dd.search_term, "q");
        dd.pop_search();
        dd.pop_search(); // extra pop on empty is harmless
        assert!(dd.search_term.is_empty());
    }
}
