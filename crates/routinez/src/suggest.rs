//! Course search field: substring filtering plus delayed dismissal.
//!
//! The dropdown must survive the instant between blurring the input and
//! clicking a suggestion, so closing is armed with a short deadline
//! instead of happening on blur. Picking a suggestion cancels the
//! deadline. Time is passed in explicitly to keep the logic testable.

use std::time::{Duration, Instant};

/// How long the dropdown stays open after the input loses focus.
pub const DISMISS_DELAY: Duration = Duration::from_millis(200);

/// State of the course search field.
#[derive(Debug, Clone, Default)]
pub struct SuggestField {
    options: Vec<String>,
    term: String,
    filtered: Vec<String>,
    open: bool,
    dismiss_at: Option<Instant>,
}

impl SuggestField {
    pub fn new(options: Vec<String>) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Replaces the option list, refiltering against the current term.
    /// `picked` are course codes to exclude (already selected).
    pub fn set_options(&mut self, options: Vec<String>, picked: &[String]) {
        self.options = options;
        self.refilter(picked);
    }

    /// Input gained focus: show the full (unpicked) list.
    pub fn focus(&mut self, picked: &[String]) {
        self.dismiss_at = None;
        self.open = true;
        self.refilter(picked);
    }

    /// The term changed: refilter and keep the dropdown open.
    pub fn input(&mut self, term: &str, picked: &[String]) {
        self.term = term.to_string();
        self.open = true;
        self.dismiss_at = None;
        self.refilter(picked);
    }

    /// A suggestion was clicked. Returns the picked value, clears the
    /// term, and closes the dropdown immediately.
    pub fn pick(&mut self, value: &str) -> Option<String> {
        if !self.filtered.iter().any(|o| o == value) {
            return None;
        }
        self.term.clear();
        self.open = false;
        self.dismiss_at = None;
        Some(value.to_string())
    }

    /// Input lost focus at `now`: arm the dismissal deadline.
    pub fn blur_at(&mut self, now: Instant) {
        if self.open {
            self.dismiss_at = Some(now + DISMISS_DELAY);
        }
    }

    /// Advances time. Returns `true` when the armed deadline fired and
    /// the dropdown closed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.dismiss_at {
            Some(deadline) if now >= deadline => {
                self.open = false;
                self.term.clear();
                self.dismiss_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// Current suggestions, in catalogue order.
    pub fn suggestions(&self) -> &[String] {
        &self.filtered
    }

    fn refilter(&mut self, picked: &[String]) {
        let term = self.term.to_lowercase();
        self.filtered = self
            .options
            .iter()
            .filter(|option| !picked.iter().any(|p| p == *option))
            .filter(|option| term.is_empty() || option.to_lowercase().contains(&term))
            .cloned()
            .collect();
    }
}
