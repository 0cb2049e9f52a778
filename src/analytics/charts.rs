//! Chart series derived from a sample of request events

use crate::api::RequestEvent;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Total cost of one day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostPoint {
    pub date: NaiveDate,
    /// Rounded to cents
    pub cost: f64,
}

impl CostPoint {
    /// Axis label, e.g. `05 Sep`
    pub fn label(&self) -> String {
        self.date.format("%d %b").to_string()
    }
}

/// Token totals of one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokensPoint {
    pub date: NaiveDate,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokensPoint {
    pub fn label(&self) -> String {
        self.date.format("%d %b").to_string()
    }
}

/// Number of requests served by one model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelShare {
    pub name: String,
    pub count: u64,
}

/// Per-day cost, oldest day first
pub fn cost_by_day(items: &[RequestEvent]) -> Vec<CostPoint> {
    let mut days: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for item in items {
        *days.entry(item.originated_at.date_naive()).or_default() += item.cost_usd;
    }

    days.into_iter()
        .map(|(date, cost)| CostPoint {
            date,
            cost: (cost * 100.0).round() / 100.0,
        })
        .collect()
}

/// Per-day input and output tokens, oldest day first
pub fn tokens_by_day(items: &[RequestEvent]) -> Vec<TokensPoint> {
    let mut days: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();
    for item in items {
        let entry = days.entry(item.originated_at.date_naive()).or_default();
        entry.0 += item.input_tokens;
        entry.1 += item.output_tokens;
    }

    days.into_iter()
        .map(|(date, (input_tokens, output_tokens))| TokensPoint {
            date,
            input_tokens,
            output_tokens,
        })
        .collect()
}

/// Requests per model, most used first; ties keep first-seen order
pub fn model_distribution(items: &[RequestEvent]) -> Vec<ModelShare> {
    let mut shares: Vec<ModelShare> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in items {
        match index.get(item.model.as_str()) {
            Some(&i) => shares[i].count += 1,
            None => {
                index.insert(item.model.as_str(), shares.len());
                shares.push(ModelShare {
                    name: item.model.clone(),
                    count: 1,
                });
            }
        }
    }

    // sort_by is stable
    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares
}
