//! Workbook Loader Module
//! Reads the WARN report workbook into a raw Polars table using calamine.

use calamine::{open_workbook_auto, Data, Range, Reader};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Header of the company name column.
pub const COMPANY_COL: &str = "Company";
/// Header of the region (county) column.
pub const REGION_COL: &str = "County/Parish";
/// Header of the affected employee count column. The line break is part of the header.
pub const EMPLOYEES_COL: &str = "No. Of\nEmployees";
/// Header of the notice date column. The line break is part of the header.
pub const NOTICE_DATE_COL: &str = "Notice\nDate";

const REQUIRED_COLUMNS: [&str; 4] = [COMPANY_COL, REGION_COL, EMPLOYEES_COL, NOTICE_DATE_COL];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read workbook {}: {source}", path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("Workbook has no worksheet")]
    NoWorksheet,
    #[error("Worksheet has no header row")]
    NoHeaderRow,
    #[error("Missing required column {0:?}")]
    MissingColumn(String),
    #[error("Failed to build table: {0}")]
    Polars(#[from] PolarsError),
}

/// Anything that can hand out a fresh copy of the notice table.
pub trait NoticeSource: Send + Sync {
    fn load_notices(&self) -> Result<DataFrame, LoaderError>;
}

/// Loads the notice table from a workbook on local disk.
///
/// The workbook is re-read on every call; nothing is cached between loads.
#[derive(Debug, Clone)]
pub struct DataLoader {
    file_path: PathBuf,
}

impl DataLoader {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    /// Get file path.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Open the workbook and read its first worksheet.
    pub fn load_workbook(&self) -> Result<DataFrame, LoaderError> {
        let workbook_error = |source: calamine::Error| LoaderError::Workbook {
            path: self.file_path.clone(),
            source,
        };

        let mut workbook = open_workbook_auto(&self.file_path).map_err(workbook_error)?;
        let sheet = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(LoaderError::NoWorksheet)?;
        let range = workbook.worksheet_range(&sheet).map_err(workbook_error)?;

        let df = Self::table_from_range(&range)?;
        debug!(
            path = %self.file_path.display(),
            sheet = %sheet,
            rows = df.height(),
            "loaded workbook"
        );
        Ok(df)
    }

    /// Convert a worksheet range into the raw notice table.
    ///
    /// The first row is the header. Only the four required columns are kept, each as a
    /// nullable `String` column named after its header.
    pub fn table_from_range(range: &Range<Data>) -> Result<DataFrame, LoaderError> {
        let mut rows = range.rows();
        let header = rows.next().ok_or(LoaderError::NoHeaderRow)?;
        let headers: Vec<String> = header
            .iter()
            .map(|cell| cell_text(cell).unwrap_or_default())
            .collect();

        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| LoaderError::MissingColumn(name.to_string()))
        };
        let company_idx = find(COMPANY_COL)?;
        let region_idx = find(REGION_COL)?;
        let employees_idx = find(EMPLOYEES_COL)?;
        let date_idx = find(NOTICE_DATE_COL)?;

        let mut companies = Vec::new();
        let mut regions = Vec::new();
        let mut employees = Vec::new();
        let mut dates = Vec::new();
        for row in rows {
            companies.push(row.get(company_idx).and_then(cell_text));
            regions.push(row.get(region_idx).and_then(cell_text));
            employees.push(row.get(employees_idx).and_then(cell_number_text));
            dates.push(row.get(date_idx).and_then(cell_date_text));
        }

        Ok(build_notice_frame(companies, regions, employees, dates)?)
    }
}

impl NoticeSource for DataLoader {
    fn load_notices(&self) -> Result<DataFrame, LoaderError> {
        self.load_workbook()
    }
}

/// Assemble a raw notice table from its four text columns.
pub fn build_notice_frame(
    companies: Vec<Option<String>>,
    regions: Vec<Option<String>>,
    employees: Vec<Option<String>>,
    dates: Vec<Option<String>>,
) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        Column::new(COMPANY_COL.into(), companies),
        Column::new(REGION_COL.into(), regions),
        Column::new(EMPLOYEES_COL.into(), employees),
        Column::new(NOTICE_DATE_COL.into(), dates),
    ])
}

fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Float(v) => format!("{v}"),
        Data::Int(v) => format!("{v}"),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(_) => cell.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

/// Numbers and text only; date, duration and boolean cells are not counts.
fn cell_number_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Int(_) | Data::Float(_) | Data::String(_) => cell_text(cell),
        _ => None,
    }
}

fn cell_date_text(cell: &Data) -> Option<String> {
    match cell {
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string()),
        other => cell_text(other),
    }
}
