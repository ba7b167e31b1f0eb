//! Data Processor Module
//! Handles value coercion of the raw notice table (employee counts and notice dates).

use crate::data::loader::{COMPANY_COL, EMPLOYEES_COL, NOTICE_DATE_COL, REGION_COL};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use thiserror::Error;
use tracing::debug;

/// Column names of the cleaned table.
pub const COMPANY: &str = "company";
pub const REGION: &str = "region";
pub const EMPLOYEES: &str = "employees";
pub const NOTICE_YEAR: &str = "notice_year";
pub const NOTICE_MONTH: &str = "notice_month";

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    // two-digit years first, "%Y" would read "23" as year 23
    "%m/%d/%y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d-%b-%Y",
];

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Handles data cleaning and coercion operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Parse an employee count. Anything that is not a finite number becomes `None`.
    pub fn coerce_employee_count(raw: &str) -> Option<f64> {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }

    /// Parse a notice date. Unrecognised text becomes `None`.
    pub fn coerce_notice_date(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|dt| dt.date())
            .or_else(|| {
                DATE_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
            })
    }

    /// Coerce the raw notice table into typed columns.
    ///
    /// Output columns: [company, region, employees (f64), notice_year (i32), notice_month (i32)]
    pub fn clean(df: &DataFrame) -> Result<DataFrame, ProcessorError> {
        let employee_ca = df.column(EMPLOYEES_COL)?.str()?;
        let date_ca = df.column(NOTICE_DATE_COL)?.str()?;

        let employees: Vec<Option<f64>> = employee_ca
            .into_iter()
            .map(|v| v.and_then(Self::coerce_employee_count))
            .collect();
        let dates: Vec<Option<NaiveDate>> = date_ca
            .into_iter()
            .map(|v| v.and_then(Self::coerce_notice_date))
            .collect();

        let malformed_counts = count_coerced_to_null(employee_ca, &employees);
        let malformed_dates = count_coerced_to_null(date_ca, &dates);
        if malformed_counts > 0 || malformed_dates > 0 {
            debug!(
                malformed_counts,
                malformed_dates, "coerced malformed cells to null"
            );
        }

        let years: Vec<Option<i32>> = dates.iter().map(|d| d.map(|d| d.year())).collect();
        let months: Vec<Option<i32>> = dates
            .iter()
            .map(|d| d.map(|d| d.month() as i32))
            .collect();

        let company = df.column(COMPANY_COL)?.clone().with_name(COMPANY.into());
        let region = df.column(REGION_COL)?.clone().with_name(REGION.into());

        let cleaned = DataFrame::new(vec![
            company,
            region,
            Column::new(EMPLOYEES.into(), employees),
            Column::new(NOTICE_YEAR.into(), years),
            Column::new(NOTICE_MONTH.into(), months),
        ])?;

        Ok(cleaned)
    }
}

/// Cells that held text but did not survive coercion.
fn count_coerced_to_null<T>(raw: &StringChunked, coerced: &[Option<T>]) -> usize {
    raw.into_iter()
        .zip(coerced)
        .filter(|(r, c)| r.is_some() && c.is_none())
        .count()
}
