//! WARN Dashboard - layoff notice aggregation
//!
//! Loads the WARN report workbook, totals affected employees per company, county and
//! month, and serves the result as an HTML dashboard and a JSON endpoint.

pub mod data;
pub mod stats;
pub mod web;
