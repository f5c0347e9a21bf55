/// Snapshot-to-columns reconciliation for the dashboard
use crate::config::URL_DISPLAY_LIMIT;
use crate::tab_data::{TabId, TabLogs};
use regex::Regex;
use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

/// Horizontal scroll state of the columns container
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMetrics {
    pub scroll_left: f64,
    pub client_width: f64,
    pub scroll_width: f64,
}

impl ViewportMetrics {
    /// True if the viewport shows the last column, give or take `tolerance_px`
    pub fn is_at_trailing_edge(&self, tolerance_px: f64) -> bool {
        self.scroll_left + self.client_width >= self.scroll_width - tolerance_px
    }

    /// Scroll offset that shows the trailing edge of content `scroll_width` wide
    pub fn trailing_edge(&self, scroll_width: f64) -> f64 {
        (scroll_width - self.client_width).max(0.0)
    }
}

/// One rendered column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnView {
    pub tab_id: TabId,
    pub title: String,
    pub url: String,
    /// Entries separated by a blank line, as shown and copied
    pub body: String,
    pub count: usize,
    /// More entries than at the previous refresh
    pub grew: bool,
    /// Tab was not in the previous snapshot
    pub is_new: bool,
}

/// Everything one refresh renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    pub columns: Vec<ColumnView>,
    pub newly_appeared: Vec<TabId>,
    /// Jump to the trailing edge once the new columns are rendered
    pub scroll_to_end: bool,
    pub total_entries: usize,
}

impl ReconcilePlan {
    pub fn stats_line(&self) -> String {
        format!(
            "{} tab(s) | {} total entries",
            self.columns.len(),
            self.total_entries
        )
    }

    pub fn grown_tabs(&self) -> Vec<TabId> {
        self.columns.iter().filter(|c| c.grew).map(|c| c.tab_id).collect()
    }

    /// Horizontal scroll offset after rendering this plan
    pub fn settled_scroll_left(&self, before: &ViewportMetrics, rendered_scroll_width: f64) -> f64 {
        if self.scroll_to_end {
            before.trailing_edge(rendered_scroll_width)
        } else {
            before.scroll_left
        }
    }
}

/// What the dashboard remembers between refreshes
#[derive(Debug, Clone, Default)]
pub struct DashboardViewState {
    previous_tab_ids: BTreeSet<TabId>,
    last_entry_counts: HashMap<TabId, usize>,
}

impl DashboardViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff a fresh snapshot against the last one and remember it.
    ///
    /// `was_at_end` must be measured before anything is re-rendered.
    pub fn reconcile(&mut self, logs: &TabLogs, was_at_end: bool) -> ReconcilePlan {
        let current: BTreeSet<TabId> = logs.tab_ids().into_iter().collect();
        let newly_appeared: Vec<TabId> = current
            .difference(&self.previous_tab_ids)
            .copied()
            .collect();

        let mut counts = HashMap::with_capacity(current.len());
        let columns: Vec<ColumnView> = logs
            .iter()
            .map(|(tab_id, log)| {
                let count = log.entries.len();
                let previous = self.last_entry_counts.get(&tab_id).copied().unwrap_or(0);
                counts.insert(tab_id, count);
                ColumnView {
                    tab_id,
                    title: display_title(&log.title),
                    url: display_url(&log.url),
                    body: log.joined(),
                    count,
                    grew: count > previous,
                    is_new: !self.previous_tab_ids.contains(&tab_id),
                }
            })
            .collect();

        self.last_entry_counts = counts;
        self.previous_tab_ids = current;

        ReconcilePlan {
            scroll_to_end: was_at_end && !newly_appeared.is_empty(),
            newly_appeared,
            total_entries: logs.total_entries(),
            columns,
        }
    }

    pub fn known_tab_ids(&self) -> Vec<TabId> {
        self.previous_tab_ids.iter().copied().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusStep {
    Next,
    Previous,
}

/// Column to focus after one step, wrapping at both ends
pub fn cycle_focus(tab_ids: &[TabId], current: Option<TabId>, step: FocusStep) -> Option<TabId> {
    if tab_ids.is_empty() {
        return None;
    }
    let last = tab_ids.len() - 1;
    let index = match current.and_then(|id| tab_ids.iter().position(|t| *t == id)) {
        None => match step {
            FocusStep::Next => 0,
            FocusStep::Previous => last,
        },
        Some(i) => match step {
            FocusStep::Next if i == last => 0,
            FocusStep::Next => i + 1,
            FocusStep::Previous if i == 0 => last,
            FocusStep::Previous => i - 1,
        },
    };
    Some(tab_ids[index])
}

fn display_title(title: &str) -> String {
    if title.is_empty() {
        "Untitled".to_string()
    } else {
        title.to_string()
    }
}

fn scheme_prefix() -> Option<&'static Regex> {
    static SCHEME: OnceLock<Option<Regex>> = OnceLock::new();
    SCHEME.get_or_init(|| Regex::new(r"^https?://").ok()).as_ref()
}

/// URL without its http(s) scheme, cut to the header width
pub fn display_url(url: &str) -> String {
    let stripped = match scheme_prefix() {
        Some(scheme) => scheme.replace(url, ""),
        None => Cow::Borrowed(url),
    };
    stripped.chars().take(URL_DISPLAY_LIMIT).collect()
}
