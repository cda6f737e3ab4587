//! Filter criteria and the filtered source view

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::source::SourceRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Enabled,
    Disabled,
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Enabled => "enabled",
            StatusFilter::Disabled => "disabled",
        }
    }
}

/// Region criterion; serialized as `"all"` or the region name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RegionFilter {
    #[default]
    All,
    Region(String),
}

impl From<String> for RegionFilter {
    fn from(value: String) -> Self {
        if value.is_empty() || value == "all" {
            RegionFilter::All
        } else {
            RegionFilter::Region(value)
        }
    }
}

impl From<RegionFilter> for String {
    fn from(filter: RegionFilter) -> Self {
        match filter {
            RegionFilter::All => "all".to_string(),
            RegionFilter::Region(region) => region,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Priority,
    Name,
    Recent,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Priority => "priority",
            SortKey::Name => "name",
            SortKey::Recent => "recent",
        }
    }
}

/// Current search/filter/sort selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Lower-cased search term; empty matches everything
    pub search_term: String,
    pub status_filter: StatusFilter,
    #[schema(value_type = String)]
    pub region_filter: RegionFilter,
    pub sort_key: SortKey,
}

impl FilterCriteria {
    /// True when status or region narrows the view
    pub fn has_attribute_filters(&self) -> bool {
        self.status_filter != StatusFilter::All || self.region_filter != RegionFilter::All
    }

    /// Chips describing every non-default criterion
    pub fn active_filters(&self) -> Vec<String> {
        let mut filters = Vec::new();
        if !self.search_term.is_empty() {
            filters.push(format!("Search: \"{}\"", self.search_term));
        }
        if self.status_filter != StatusFilter::All {
            filters.push(format!("Status: {}", self.status_filter.as_str()));
        }
        if let RegionFilter::Region(ref region) = self.region_filter {
            filters.push(format!("Region: {}", region));
        }
        if self.sort_key != SortKey::Priority {
            filters.push(format!("Sort: {}", self.sort_key.as_str()));
        }
        filters
    }
}

/// Partial criteria merged by `FilterPipeline::set_criteria`
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaUpdate {
    pub search_term: Option<String>,
    pub status_filter: Option<StatusFilter>,
    #[schema(value_type = Option<String>)]
    pub region_filter: Option<RegionFilter>,
    pub sort_key: Option<SortKey>,
}

/// Why the filtered view is empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    NoSources,
    NoSearchMatches,
    NoFilterMatches,
}

impl EmptyReason {
    pub fn message(&self, criteria: &FilterCriteria) -> String {
        match self {
            EmptyReason::NoSources => "No sources found".to_string(),
            EmptyReason::NoSearchMatches => {
                format!("No sources match \"{}\"", criteria.search_term)
            }
            EmptyReason::NoFilterMatches => "No sources match the selected filters".to_string(),
        }
    }
}

/// Counters accompanying the filtered view
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CountInfo {
    pub total: usize,
    pub shown: usize,
    /// e.g. "12 sources" or "Showing 3 of 12 sources"
    pub label: String,
    pub active_filters: Vec<String>,
    pub empty_reason: Option<EmptyReason>,
    pub empty_message: Option<String>,
}

impl CountInfo {
    pub fn new(total: usize, shown: usize, criteria: &FilterCriteria) -> Self {
        let noun = if total == 1 { "source" } else { "sources" };
        let label = if shown == total {
            format!("{} {}", total, noun)
        } else {
            format!("Showing {} of {} {}", shown, total, noun)
        };

        let empty_reason = if shown > 0 {
            None
        } else if total == 0 {
            Some(EmptyReason::NoSources)
        } else if !criteria.search_term.is_empty() {
            Some(EmptyReason::NoSearchMatches)
        } else if criteria.has_attribute_filters() {
            Some(EmptyReason::NoFilterMatches)
        } else {
            None
        };

        Self {
            total,
            shown,
            label,
            active_filters: criteria.active_filters(),
            empty_message: empty_reason.map(|reason| reason.message(criteria)),
            empty_reason,
        }
    }
}

/// Filtered, sorted sources plus their counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct FilteredView {
    pub sources: Vec<SourceRecord>,
    pub counts: CountInfo,
}

/// Current criteria with the selectable regions
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub criteria: FilterCriteria,
    pub region_options: Vec<String>,
}
