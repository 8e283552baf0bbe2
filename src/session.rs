//! One analysis session: dataset, active filters, and the current view.
//!
//! The session owns the pipeline explicitly. Raw records come in through
//! [`import`](AnalysisSession::import); every mutation that can change the
//! filtered view recomputes it on the spot and re-clamps the navigator.
//! Collaborators are injected at construction, so there are no globals and
//! no hidden recomputation chains.

use tracing::info;

use crate::config::{ConfigStore, EXCLUDE_KNOWN_KEY, FILTERS_KEY};
use crate::filter::{self, FilterOp, FilterSet};
use crate::known::KnownWalletStore;
use crate::navigator::Navigator;
use crate::record::{Dataset, RawValue, Record};
use crate::score::{calculate_scores, StrategyScores};

pub struct AnalysisSession<'a> {
    known: &'a KnownWalletStore,
    config: &'a ConfigStore,
    dataset: Dataset,
    filters: FilterSet,
    exclude_known: bool,
    filtered: Vec<Record>,
    navigator: Navigator,
}

impl<'a> AnalysisSession<'a> {
    /// Start a session with the persisted filter set and exclude toggle.
    /// An unreadable settings store falls back to no filters and exclusion
    /// enabled.
    pub fn new(known: &'a KnownWalletStore, config: &'a ConfigStore) -> Self {
        let filters: FilterSet = config.get(FILTERS_KEY, FilterSet::new());
        let exclude_known = config.get(EXCLUDE_KNOWN_KEY, true);

        AnalysisSession {
            known,
            config,
            dataset: Dataset::default(),
            filters,
            exclude_known,
            filtered: Vec::new(),
            navigator: Navigator::new(0),
        }
    }

    /// Replace the dataset wholesale and start viewing from the first
    /// filtered record.
    pub fn import(&mut self, dataset: Dataset) {
        info!("Session received {} records", dataset.len());
        self.dataset = dataset;
        self.recompute();
        self.navigator.reset(self.filtered.len());
    }

    /// Recompute the filtered view from the current inputs. Also the
    /// re-entry point after the known-wallet store finishes initializing:
    /// the new pass supersedes the previous result.
    pub fn refresh(&mut self) {
        self.recompute();
        self.navigator.sync_len(self.filtered.len());
    }

    fn recompute(&mut self) {
        self.filtered = filter::apply(
            &self.dataset.records,
            &self.filters,
            self.exclude_known,
            self.known,
        );
    }

    pub fn set_filter(
        &mut self,
        column: impl Into<String>,
        operator: FilterOp,
        value: impl Into<RawValue>,
    ) {
        self.filters.set(column, operator, value);
        self.persist_filters();
        self.refresh();
    }

    pub fn remove_filter(&mut self, column: &str) -> bool {
        let removed = self.filters.remove(column);
        if removed {
            self.persist_filters();
            self.refresh();
        }
        removed
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.persist_filters();
        self.refresh();
    }

    pub fn set_exclude_known(&mut self, exclude: bool) {
        self.exclude_known = exclude;
        self.config.set(EXCLUDE_KNOWN_KEY, &exclude);
        self.refresh();
    }

    fn persist_filters(&self) {
        self.config.set(FILTERS_KEY, &self.filters);
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn exclude_known(&self) -> bool {
        self.exclude_known
    }

    pub fn headers(&self) -> &[String] {
        &self.dataset.headers
    }

    pub fn filtered(&self) -> &[Record] {
        &self.filtered
    }

    pub fn total(&self) -> usize {
        self.dataset.len()
    }

    pub fn position(&self) -> Option<usize> {
        self.navigator.position()
    }

    pub fn current(&self) -> Option<&Record> {
        self.filtered.get(self.navigator.position()?)
    }

    /// Scores are computed lazily for whatever record is in view, never
    /// persisted with the filtered sequence.
    pub fn current_scores(&self) -> Option<StrategyScores> {
        self.current().map(calculate_scores)
    }

    pub fn next(&mut self) -> bool {
        self.navigator.next()
    }

    pub fn prev(&mut self) -> bool {
        self.navigator.prev()
    }
}
