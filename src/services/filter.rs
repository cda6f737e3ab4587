//! Search, filter and sort over the cached sources.
//!
//! The view is recomputed from scratch on every criterion or data change
//! and published before the call returns.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::{
    models::{
        CountInfo, CriteriaUpdate, FilterCriteria, FilteredView, LogType, RegionFilter, SortKey,
        SourceRecord, StatusFilter,
    },
    services::events::{DashboardEvent, EventBus},
};

/// Case-insensitive substring match on name, url or region
fn matches_search(source: &SourceRecord, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    source.name.to_lowercase().contains(term)
        || source.url.to_lowercase().contains(term)
        || source
            .region
            .as_deref()
            .is_some_and(|r| r.to_lowercase().contains(term))
}

fn matches_status(source: &SourceRecord, status: StatusFilter) -> bool {
    match status {
        StatusFilter::All => true,
        StatusFilter::Enabled => source.enabled,
        StatusFilter::Disabled => !source.enabled,
    }
}

fn matches_region(source: &SourceRecord, region: &RegionFilter) -> bool {
    match region {
        RegionFilter::All => true,
        RegionFilter::Region(wanted) => source.region.as_deref() == Some(wanted.as_str()),
    }
}

/// Accent- and case-insensitive collation key
fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

/// Stable sort of `sources` by `key`
pub fn sort_sources(sources: &mut [SourceRecord], key: SortKey) {
    match key {
        SortKey::Priority => sources.sort_by_key(SourceRecord::effective_priority),
        SortKey::Name => sources.sort_by(|a, b| compare_names(&a.name, &b.name)),
        SortKey::Recent => {
            sources.sort_by(|a, b| b.last_updated.unwrap_or(0).cmp(&a.last_updated.unwrap_or(0)))
        }
    }
}

/// Visible subset of `all` under `criteria`: search, status and region
/// predicates ANDed, then sorted.
pub fn apply_filters(all: &[SourceRecord], criteria: &FilterCriteria) -> Vec<SourceRecord> {
    let term = criteria.search_term.to_lowercase();
    let mut visible: Vec<SourceRecord> = all
        .iter()
        .filter(|s| matches_search(s, &term))
        .filter(|s| matches_status(s, criteria.status_filter))
        .filter(|s| matches_region(s, &criteria.region_filter))
        .cloned()
        .collect();
    sort_sources(&mut visible, criteria.sort_key);
    visible
}

/// Sorted distinct non-blank regions of `all`
pub fn region_options(all: &[SourceRecord]) -> Vec<String> {
    all.iter()
        .filter_map(SourceRecord::region_label)
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub struct FilterPipeline {
    criteria: FilterCriteria,
    all_sources: Vec<SourceRecord>,
    view: FilteredView,
    events: EventBus,
}

impl FilterPipeline {
    pub fn new(events: EventBus) -> Self {
        let criteria = FilterCriteria::default();
        Self {
            view: FilteredView {
                sources: Vec::new(),
                counts: CountInfo::new(0, 0, &criteria),
            },
            criteria,
            all_sources: Vec::new(),
            events,
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn view(&self) -> &FilteredView {
        &self.view
    }

    /// Regions present in the unfiltered collection
    pub fn region_options(&self) -> Vec<String> {
        region_options(&self.all_sources)
    }

    /// New source collection from the record store
    pub fn update_sources(&mut self, sources: Vec<SourceRecord>) {
        self.all_sources = sources;
        if let RegionFilter::Region(ref region) = self.criteria.region_filter {
            let still_present = self
                .all_sources
                .iter()
                .any(|s| s.region_label() == Some(region.as_str()));
            if !still_present {
                tracing::debug!(region = %region, "Selected region disappeared, showing all");
                self.criteria.region_filter = RegionFilter::All;
            }
        }
        self.recompute();
    }

    /// Merge `update` into the current criteria and recompute
    pub fn set_criteria(&mut self, update: CriteriaUpdate) {
        if let Some(term) = update.search_term {
            self.criteria.search_term = term.to_lowercase();
        }
        if let Some(status) = update.status_filter {
            self.criteria.status_filter = status;
        }
        if let Some(region) = update.region_filter {
            self.criteria.region_filter = region;
        }
        if let Some(sort) = update.sort_key {
            self.criteria.sort_key = sort;
        }
        self.recompute();
    }

    /// Restore default criteria and recompute
    pub fn reset(&mut self) {
        self.criteria = FilterCriteria::default();
        self.recompute();
        self.events.toast(LogType::Info, "Filters reset");
    }

    fn recompute(&mut self) {
        let sources = apply_filters(&self.all_sources, &self.criteria);
        let counts = CountInfo::new(self.all_sources.len(), sources.len(), &self.criteria);
        self.view = FilteredView { sources, counts };
        self.events.publish(DashboardEvent::FilteredViewChanged {
            sources: self.view.sources.clone(),
            counts: self.view.counts.clone(),
        });
    }
}
