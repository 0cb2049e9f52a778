//! Dashboard filter state

use crate::api::{RequestQuery, RequestStatus};
use chrono::{DateTime, Duration as ChronoDuration, Utc};

/// Date range presets offered by the dashboard, in days
pub const RANGE_PRESETS: [i64; 3] = [7, 30, 90];

/// Number of days covered by the default date range
pub const DEFAULT_RANGE_DAYS: i64 = 30;

/// Filters applied to every panel
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsFilters {
    /// Inclusive `(from, to)` window on request origination time
    pub date_range: (DateTime<Utc>, DateTime<Utc>),
    /// Chat id search text
    pub search: String,
    /// Selected models; empty means all models
    pub models: Vec<String>,
    /// `None` means all statuses
    pub status: Option<RequestStatus>,
}

impl Default for AnalyticsFilters {
    fn default() -> Self {
        Self::last_days(DEFAULT_RANGE_DAYS, Utc::now())
    }
}

impl AnalyticsFilters {
    /// Filters covering the `days` days that end at `now`
    pub fn last_days(days: i64, now: DateTime<Utc>) -> Self {
        Self {
            date_range: (now - ChronoDuration::days(days), now),
            search: String::new(),
            models: Vec::new(),
            status: None,
        }
    }

    /// Replace the date range, ignoring ranges that end before they start
    pub fn set_date_range(&mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        if from > to {
            return false;
        }
        self.date_range = (from, to);
        true
    }

    /// Length of the current date range in whole days
    pub fn range_days(&self) -> i64 {
        (self.date_range.1 - self.date_range.0).num_days()
    }

    /// Whether every model is selected
    pub fn all_models(&self) -> bool {
        self.models.is_empty() || self.models.iter().any(|m| m == "all")
    }

    /// Select a single model, or all models with `None`
    pub fn select_model(&mut self, model: Option<&str>) {
        self.models = match model {
            Some(model) if model != "all" => vec![model.to_string()],
            _ => Vec::new(),
        };
    }

    /// Label of the model selector
    pub fn model_label(&self) -> String {
        if self.all_models() {
            "All models".to_string()
        } else {
            self.models.join(", ")
        }
    }

    pub fn status_label(&self) -> &'static str {
        match self.status {
            None => "All statuses",
            Some(RequestStatus::Success) => "Success",
            Some(RequestStatus::Error) => "Errors",
            Some(RequestStatus::Partial) => "Partial",
            Some(RequestStatus::Unknown) => "Unknown",
        }
    }

    /// Build the API query for one page of results
    pub fn to_query(&self, limit: u32, offset: u32) -> RequestQuery {
        let search = self.search.trim();
        RequestQuery {
            limit,
            offset,
            model: (!self.all_models()).then(|| self.models.join(",")),
            status: self.status,
            chat_id: (!search.is_empty()).then(|| search.to_string()),
            date_from: Some(self.date_range.0),
            date_to: Some(self.date_range.1),
        }
    }
}

/// Next entry of the model selector: all → first model → ... → all
pub fn next_model<'a>(current: &AnalyticsFilters, known: &'a [String]) -> Option<&'a str> {
    if known.is_empty() {
        return None;
    }
    if current.all_models() {
        return known.first().map(String::as_str);
    }
    let selected = current.models.first()?;
    let position = known.iter().position(|m| m == selected)?;
    known.get(position + 1).map(String::as_str)
}

/// Next entry of the status selector: all → success → error → partial → all
pub fn next_status(current: Option<RequestStatus>) -> Option<RequestStatus> {
    match current {
        None => Some(RequestStatus::Success),
        Some(RequestStatus::Success) => Some(RequestStatus::Error),
        Some(RequestStatus::Error) => Some(RequestStatus::Partial),
        Some(RequestStatus::Partial) | Some(RequestStatus::Unknown) => None,
    }
}

/// Next date range preset after `days`
pub fn next_range_preset(days: i64) -> i64 {
    RANGE_PRESETS
        .iter()
        .copied()
        .find(|preset| *preset > days)
        .unwrap_or(RANGE_PRESETS[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 30, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_default_range_is_thirty_days() {
        let filters = AnalyticsFilters::last_days(DEFAULT_RANGE_DAYS, now());
        assert_eq!(filters.range_days(), 30);
        assert_eq!(filters.date_range.1, now());
        assert!(filters.all_models());
        assert!(filters.status.is_none());
    }

    #[test]
    fn test_query_for_all_filters() {
        let filters = AnalyticsFilters::last_days(7, now());
        let query = filters.to_query(20, 0);
        assert!(query.model.is_none());
        assert!(query.status.is_none());
        assert!(query.chat_id.is_none());
        assert_eq!(query.date_to, Some(now()));
    }

    #[test]
    fn test_query_joins_models_and_trims_search() {
        let mut filters = AnalyticsFilters::last_days(7, now());
        filters.models = vec!["gpt-4o".into(), "gpt-4o-mini".into()];
        filters.search = "  chat-9  ".into();
        filters.status = Some(RequestStatus::Partial);

        let query = filters.to_query(100, 0);
        assert_eq!(query.model.as_deref(), Some("gpt-4o,gpt-4o-mini"));
        assert_eq!(query.chat_id.as_deref(), Some("chat-9"));
        assert_eq!(query.status, Some(RequestStatus::Partial));
    }

    #[test]
    fn test_all_in_model_list_means_no_model_filter() {
        let mut filters = AnalyticsFilters::last_days(7, now());
        filters.models = vec!["all".into(), "gpt-4o".into()];
        assert!(filters.to_query(1, 0).model.is_none());
    }

    #[test]
    fn test_inverted_range_is_ignored() {
        let mut filters = AnalyticsFilters::last_days(7, now());
        let before = filters.date_range;
        assert!(!filters.set_date_range(now(), now() - ChronoDuration::days(1)));
        assert_eq!(filters.date_range, before);
    }

    #[test]
    fn test_model_cycle() {
        let known = vec!["gpt-4o".to_string(), "gpt-4o-mini".to_string()];
        let mut filters = AnalyticsFilters::last_days(7, now());

        let first = next_model(&filters, &known);
        assert_eq!(first, Some("gpt-4o"));
        filters.select_model(first);
        assert_eq!(filters.model_label(), "gpt-4o");

        let second = next_model(&filters, &known);
        assert_eq!(second, Some("gpt-4o-mini"));
        filters.select_model(second);

        let wrapped = next_model(&filters, &known);
        assert_eq!(wrapped, None);
        filters.select_model(wrapped);
        assert!(filters.all_models());
    }

    #[test]
    fn test_status_cycle_returns_to_all() {
        let mut status = None;
        let mut seen = Vec::new();
        for _ in 0..4 {
            status = next_status(status);
            seen.push(status);
        }
        assert_eq!(
            seen,
            vec![
                Some(RequestStatus::Success),
                Some(RequestStatus::Error),
                Some(RequestStatus::Partial),
                None
            ]
        );
    }

    #[test]
    fn test_range_preset_cycle() {
        assert_eq!(next_range_preset(7), 30);
        assert_eq!(next_range_preset(30), 90);
        assert_eq!(next_range_preset(90), 7);
        assert_eq!(next_range_preset(14), 30);
    }

    proptest! {
        #[test]
        fn prop_query_never_sends_blank_search(search in "[ \\t]*[a-z0-9-]{0,8}[ \\t]*") {
            let mut filters = AnalyticsFilters::last_days(7, now());
            filters.search = search.clone();
            let query = filters.to_query(20, 0);
            match query.chat_id {
                Some(chat_id) => {
                    prop_assert!(!chat_id.is_empty());
                    prop_assert_eq!(chat_id.as_str(), search.trim());
                }
                None => prop_assert!(search.trim().is_empty()),
            }
        }
    }
}
