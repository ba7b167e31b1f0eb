//! Dashboard Page
//! Renders the summary into the HTML page served at `/`.
//!
//! Layout:
//! 1. Top companies: bar chart canvas + table
//! 2. Counties: Leaflet map + table
//! 3. Monthly totals for the report year: line chart canvas + table
//!
//! The charts are drawn client-side by `/static/main.js` from `/data`; the tables are
//! rendered here so the page is readable without scripts.

use crate::stats::{AggregateView, WarnSummary, REPORT_YEAR};
use std::fmt::{self, Write};

const CHART_JS_URL: &str = "https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js";
const LEAFLET_JS_URL: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const LEAFLET_CSS_URL: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";

const STYLE: &str = "\
body { font-family: sans-serif; margin: 2em auto; max-width: 960px; color: #222; }
section { margin-bottom: 3em; }
table { border-collapse: collapse; width: 100%; margin-top: 1em; }
th, td { border: 1px solid #ccc; padding: 4px 8px; text-align: left; }
td.num { text-align: right; }
#map { height: 420px; }
";

/// Render the full dashboard page.
pub fn render_index(summary: &WarnSummary) -> String {
    let mut html = String::with_capacity(8 * 1024);
    write_page(&mut html, summary).expect("writing to a String cannot fail");
    html
}

fn write_page(html: &mut String, summary: &WarnSummary) -> fmt::Result {
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n<title>WARN Report Dashboard</title>\n");
    writeln!(html, "<link rel=\"stylesheet\" href=\"{LEAFLET_CSS_URL}\">")?;
    writeln!(html, "<style>\n{STYLE}</style>")?;
    html.push_str("</head>\n<body>\n<h1>WARN Report Dashboard</h1>\n");

    write_section(
        html,
        "Top Companies by Employees Affected",
        "<canvas id=\"companyBarChart\"></canvas>",
        "Company",
        &summary.company_data,
    )?;
    write_section(
        html,
        "Employees Affected by County",
        "<div id=\"map\"></div>",
        "County",
        &summary.state_data,
    )?;
    write_section(
        html,
        &format!("Employees Affected by Month ({REPORT_YEAR})"),
        "<canvas id=\"monthLineChart\"></canvas>",
        "Month",
        &summary.month_data,
    )?;

    writeln!(html, "<script src=\"{CHART_JS_URL}\"></script>")?;
    writeln!(html, "<script src=\"{LEAFLET_JS_URL}\"></script>")?;
    html.push_str("<script src=\"/static/main.js\"></script>\n</body>\n</html>\n");
    Ok(())
}

fn write_section(
    html: &mut String,
    title: &str,
    chart: &str,
    label: &str,
    view: &AggregateView,
) -> fmt::Result {
    writeln!(html, "<section>\n<h2>{}</h2>\n{chart}", escape_html(title))?;
    writeln!(
        html,
        "<table>\n<thead><tr><th>{}</th><th>Employees</th></tr></thead>\n<tbody>",
        escape_html(label)
    )?;
    if view.is_empty() {
        html.push_str("<tr><td colspan=\"2\">No notices</td></tr>\n");
    }
    for (name, total) in view.iter() {
        writeln!(
            html,
            "<tr><td>{}</td><td class=\"num\">{}</td></tr>",
            escape_html(name),
            format_total(total)
        )?;
    }
    html.push_str("</tbody>\n</table>\n</section>\n");
    Ok(())
}

/// Whole totals print without a fractional part.
fn format_total(total: f64) -> String {
    if total.fract() == 0.0 {
        format!("{total:.0}")
    } else {
        format!("{total:.2}")
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
