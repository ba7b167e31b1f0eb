//! Stats module - grouped employee totals

mod calculator;

pub use calculator::{
    AggregateView, SummaryCalculator, WarnSummary, REPORT_YEAR, TOP_COMPANY_LIMIT,
};
