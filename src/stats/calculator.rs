//! Summary Calculator Module
//! Handles the grouped employee totals: top companies, per-county, and per-month.

use crate::data::processor::{
    DataProcessor, ProcessorError, COMPANY, EMPLOYEES, NOTICE_MONTH, NOTICE_YEAR, REGION,
};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Number of companies kept in the company ranking.
pub const TOP_COMPANY_LIMIT: IdxSize = 10;

/// Calendar year covered by the monthly totals.
pub const REPORT_YEAR: i32 = 2023;

/// Ordered `label -> total` pairs. Serializes as a JSON object in this order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateView {
    entries: Vec<(String, f64)>,
}

impl AggregateView {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), *v))
    }

    #[cfg(test)]
    pub fn labels(&self) -> Vec<&str> {
        self.iter().map(|(l, _)| l).collect()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v).sum()
    }
}

impl FromIterator<(String, f64)> for AggregateView {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Serialize for AggregateView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, total) in &self.entries {
            map.serialize_entry(label, total)?;
        }
        map.end()
    }
}

/// The three aggregate views served by the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WarnSummary {
    pub company_data: AggregateView,
    pub state_data: AggregateView,
    pub month_data: AggregateView,
}

/// Handles the grouped sums over the cleaned notice table.
pub struct SummaryCalculator;

impl SummaryCalculator {
    /// Coerce the raw notice table and compute every aggregate view.
    pub fn compute_summary(raw: &DataFrame) -> Result<WarnSummary, ProcessorError> {
        let cleaned = DataProcessor::clean(raw)?;

        Ok(WarnSummary {
            company_data: Self::company_totals(&cleaned)?,
            state_data: Self::region_totals(&cleaned)?,
            month_data: Self::month_totals(&cleaned, REPORT_YEAR)?,
        })
    }

    /// Employee totals of the largest companies, descending.
    ///
    /// Equal totals keep the order in which the companies first appear.
    pub fn company_totals(cleaned: &DataFrame) -> Result<AggregateView, ProcessorError> {
        let totals = Self::group_totals(cleaned, COMPANY)?
            .lazy()
            .sort_by_exprs(
                [col(EMPLOYEES)],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_maintain_order(true),
            )
            .limit(TOP_COMPANY_LIMIT)
            .collect()?;

        Self::labelled(&totals, COMPANY)
    }

    /// Employee totals of every county, in first-seen order.
    pub fn region_totals(cleaned: &DataFrame) -> Result<AggregateView, ProcessorError> {
        let totals = Self::group_totals(cleaned, REGION)?;
        Self::labelled(&totals, REGION)
    }

    /// Employee totals per calendar month of `year`, chronological, labelled like "Mar 2023".
    pub fn month_totals(cleaned: &DataFrame, year: i32) -> Result<AggregateView, ProcessorError> {
        let totals = cleaned
            .clone()
            .lazy()
            .filter(col(NOTICE_YEAR).eq(lit(year)))
            .group_by([col(NOTICE_MONTH)])
            .agg([col(EMPLOYEES).sum().fill_null(lit(0.0))])
            .sort_by_exprs([col(NOTICE_MONTH)], SortMultipleOptions::default())
            .collect()?;

        let months = totals.column(NOTICE_MONTH)?.i32()?;
        let sums = totals.column(EMPLOYEES)?.f64()?;

        Ok(months
            .into_iter()
            .zip(sums)
            .filter_map(|(month, sum)| {
                let first_day = NaiveDate::from_ymd_opt(year, u32::try_from(month?).ok()?, 1)?;
                Some((first_day.format("%b %Y").to_string(), sum.unwrap_or(0.0)))
            })
            .collect())
    }

    /// Sum employee counts per non-null key, groups in first-seen order.
    fn group_totals(cleaned: &DataFrame, key: &str) -> Result<DataFrame, ProcessorError> {
        let totals = cleaned
            .clone()
            .lazy()
            .filter(col(key).is_not_null())
            .group_by_stable([col(key)])
            .agg([col(EMPLOYEES).sum().fill_null(lit(0.0))])
            .collect()?;
        Ok(totals)
    }

    fn labelled(totals: &DataFrame, key: &str) -> Result<AggregateView, ProcessorError> {
        let labels = totals.column(key)?.str()?;
        let sums = totals.column(EMPLOYEES)?.f64()?;

        Ok(labels
            .into_iter()
            .zip(sums)
            .filter_map(|(label, sum)| Some((label?.to_string(), sum.unwrap_or(0.0))))
            .collect())
    }
}
