//! Heatmap placeholder, grid rendering and the mount step that joins them

use super::escape::escape;
use super::{Fragment, Mount};
use crate::document::HeatmapDescriptor;
use crate::heatmap::{CategoryData, Coverage, CoverageColors, CweEntry};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

/// Characters `encodeURIComponent` leaves alone
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const LOADING: &str = "<div class=\"heatmap-loading\">Loading heatmap data...</div>";

#[derive(Serialize)]
struct TooltipPayload<'a> {
    cwe: &'a str,
    coverage: &'a str,
    comments: &'a str,
}

/// URL-encoded JSON carried in a cell's `data-tooltip` attribute
pub fn tooltip_payload(entry: &CweEntry) -> String {
    let payload = TooltipPayload {
        cwe: &entry.full_text,
        coverage: &entry.coverage,
        comments: &entry.comments,
    };
    let json = serde_json::to_string(&payload).unwrap_or_else(|_| "{}".to_string());
    utf8_percent_encode(&json, URI_COMPONENT).to_string()
}

fn placeholder_body(id: &str) -> String {
    format!("<div class=\"heatmap-container\" id=\"{id}\">{LOADING}</div>")
}

/// Placeholder container with a loading indicator; the grid arrives at mount time
pub fn render_heatmap(heatmap: &HeatmapDescriptor, id: &str) -> Fragment {
    let caption = heatmap
        .caption
        .as_deref()
        .map(|c| format!("<p class=\"chart-caption\">{}</p>", escape(c)))
        .unwrap_or_default();
    let mut fragment = Fragment::new(format!("{}{caption}", placeholder_body(id)));
    fragment.mounts.push(Mount::Heatmap { id: id.to_string() });
    fragment
}

fn render_legend(colors: &CoverageColors) -> String {
    let mut html = String::from(
        "<div class=\"heatmap-legend\"><span class=\"heatmap-legend-title\">Legend (CWE-IDs):</span>",
    );
    for coverage in Coverage::ALL {
        html.push_str(&format!(
            "<span class=\"heatmap-legend-item\"><span class=\"heatmap-legend-color\" style=\"background-color: {};\"></span>{}</span>",
            escape(colors.color(coverage)),
            coverage.label()
        ));
    }
    html.push_str("</div>");
    html
}

/// Legend, one row per category and the heatmap's own tooltip element
pub fn render_grid(categories: &[CategoryData], colors: &CoverageColors) -> String {
    let mut html = render_legend(colors);
    html.push_str("<div class=\"heatmap-grid\">");
    for category in categories {
        html.push_str(&format!(
            "<div class=\"heatmap-row\"><div class=\"heatmap-category-label\">{}: {}</div><div class=\"heatmap-cells\">",
            escape(&category.id),
            escape(&category.title)
        ));
        for entry in &category.entries {
            html.push_str(&format!(
                "<div class=\"heatmap-cell\" style=\"background-color: {};\" data-status-color=\"{}\" data-tooltip=\"{}\">{}</div>",
                escape(colors.color(entry.status())),
                escape(colors.color(entry.status())),
                tooltip_payload(entry),
                escape(&entry.number)
            ));
        }
        html.push_str("</div></div>");
    }
    html.push_str("</div><div class=\"heatmap-tooltip\" role=\"tooltip\"></div>");
    html
}

/// Fill the placeholder for `id` in `page`. Returns false, leaving the page
/// untouched, when the placeholder is no longer there.
pub fn mount_heatmap(page: &mut String, id: &str, grid: &str) -> bool {
    let placeholder = placeholder_body(id);
    let Some(start) = page.find(&placeholder) else {
        log::debug!("Heatmap placeholder #{} not found; skipping mount", id);
        return false;
    };
    let filled = format!("<div class=\"heatmap-container\" id=\"{id}\">{grid}</div>");
    page.replace_range(start..start + placeholder.len(), &filled);
    true
}
