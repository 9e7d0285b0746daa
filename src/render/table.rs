//! Table rendering
//!
//! The last cell of a row is the "Comments" column. When it contains `<strong>`
//! it is treated as pre-authored markup: newlines become `<br>` and the text is
//! inserted unescaped. Every other cell is escaped.

use super::citations::CitationIndex;
use super::error_fragment;
use super::escape::escape;
use crate::document::TableBlock;
use crate::error::ReportError;

const TRUSTED_MARKUP_HINT: &str = "<strong>";

/// Whether a comments cell is inserted as trusted markup
pub fn is_trusted_comment(cell: &str) -> bool {
    cell.contains(TRUSTED_MARKUP_HINT)
}

fn render_cell(cell: &str, is_last: bool, citations: &CitationIndex) -> String {
    if is_last && is_trusted_comment(cell) {
        format!("<td>{}</td>", citations.resolve(&cell.replace('\n', "<br>")))
    } else {
        format!("<td>{}</td>", citations.resolve(&escape(cell)))
    }
}

/// Render a table; rows that do not match the header count degrade the table
/// to an inline error fragment
pub fn render_table(table: &TableBlock, citations: &CitationIndex) -> String {
    if let Some((row, found)) = table.first_arity_mismatch() {
        let err = ReportError::RowArity {
            caption: table.caption.clone(),
            row: row + 1,
            found,
            expected: table.headers.len(),
        };
        log::warn!("{}", err);
        return error_fragment(&err.to_string());
    }

    let class = match table.class.as_deref() {
        Some(extra) if !extra.is_empty() => format!("academic-table {}", escape(extra)),
        _ => "academic-table".to_string(),
    };

    let mut html = String::with_capacity(256 + table.rows.len() * 128);
    html.push_str(&format!("<table class=\"{class}\">"));
    html.push_str(&format!("<caption>{}</caption>", escape(&table.caption)));
    html.push_str("<thead><tr>");
    for header in &table.headers {
        html.push_str(&format!("<th>{}</th>", escape(header)));
    }
    html.push_str("</tr></thead><tbody>");

    for (index, row) in table.rows.iter().enumerate() {
        if table.separator_rows.contains(&index) {
            html.push_str("<tr class=\"row-separator\">");
        } else {
            html.push_str("<tr>");
        }
        let last = row.len().saturating_sub(1);
        for (i, cell) in row.iter().enumerate() {
            html.push_str(&render_cell(cell, i == last, citations));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");

    if let Some(note) = table.note.as_deref() {
        html.push_str(&format!(
            "<p class=\"table-note\">{}</p>",
            citations.resolve(&escape(note))
        ));
    }
    html
}
