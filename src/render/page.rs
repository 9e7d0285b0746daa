//! Standalone page template: stylesheet, report container and the small
//! runtime that mounts charts, scrolls to citations and shows heatmap tooltips

use super::escape::escape;
use super::report::{ChartMount, RenderedReport};
use serde_json::json;

pub const DEFAULT_CHART_JS_URL: &str = "https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js";

/// Id of the element that holds the report; the PDF exporter requires it
pub const REPORT_CONTAINER_ID: &str = "report-content";

const STYLESHEET: &str = r#"
:root { --ink: #1a1a1a; --muted: #555; --rule: #d0d0d0; --accent: #232f3e; }
* { box-sizing: border-box; }
body { margin: 0; background: #f4f4f4; color: var(--ink); font-family: Georgia, "Times New Roman", serif; line-height: 1.6; }
.report-content { max-width: 900px; margin: 2rem auto; padding: 3rem 4rem; background: #fff; box-shadow: 0 1px 4px rgba(0,0,0,.12); }
.paper-header { text-align: center; border-bottom: 2px solid var(--accent); padding-bottom: 1.5rem; margin-bottom: 2rem; }
.paper-title { font-size: 1.9rem; margin: 0 0 1rem; }
.author { font-weight: bold; }
.affiliation, .date, .region { color: var(--muted); font-style: italic; }
.abstract { background: #fafafa; border-left: 4px solid var(--accent); padding: 1rem 1.5rem; margin-bottom: 2rem; }
.abstract h2 { margin-top: 0; font-size: 1.1rem; text-transform: uppercase; letter-spacing: .05em; }
.section { margin-bottom: 2.5rem; }
.section h2 { font-size: 1.4rem; border-bottom: 1px solid var(--rule); padding-bottom: .3rem; }
.section h3 { font-size: 1.15rem; margin-top: 1.8rem; }
.section-with-table { max-width: none; }
.academic-table { width: 100%; border-collapse: collapse; margin: 1.5rem 0; font-size: .88rem; font-family: Arial, Helvetica, sans-serif; }
.academic-table caption { caption-side: top; font-weight: bold; text-align: left; padding-bottom: .5rem; font-family: Georgia, serif; }
.academic-table th { border-top: 2px solid var(--ink); border-bottom: 1px solid var(--ink); text-align: left; padding: .45rem .6rem; }
.academic-table td { border-bottom: 1px solid #e6e6e6; padding: .45rem .6rem; vertical-align: top; }
.academic-table tr.row-separator td { border-top: 2px solid var(--muted); }
.table-note { font-size: .8rem; color: var(--muted); margin-top: -1rem; }
.render-error { font-family: Arial, sans-serif; }
.citation { font-size: .75em; }
.citation-link { color: #0a58ca; text-decoration: none; }
.citation-link:hover { text-decoration: underline; }
.references-list p { padding-left: 2.5rem; text-indent: -2.5rem; font-size: .9rem; }
.reference-number { font-weight: bold; }
.reference-url { word-break: break-all; color: var(--muted); font-size: .85em; }
.chart-container { position: relative; margin: 1.5rem 0; }
.chart-caption { text-align: center; font-style: italic; color: var(--muted); font-size: .9rem; }
.heatmap-container { position: relative; margin: 1.5rem 0; font-family: Arial, sans-serif; font-size: .85rem; }
.heatmap-loading { color: var(--muted); font-style: italic; }
.heatmap-legend { display: flex; flex-wrap: wrap; gap: 1rem; margin-bottom: .8rem; align-items: center; }
.heatmap-legend-title { font-weight: bold; }
.heatmap-legend-item { display: inline-flex; align-items: center; gap: .35rem; }
.heatmap-legend-color { display: inline-block; width: 14px; height: 14px; border-radius: 2px; }
.heatmap-row { display: flex; align-items: center; border-bottom: 1px solid #eee; padding: .25rem 0; }
.heatmap-category-label { flex: 0 0 230px; font-weight: bold; }
.heatmap-cells { display: flex; flex-wrap: wrap; gap: 3px; }
.heatmap-cell { min-width: 38px; padding: 2px 4px; text-align: center; color: #fff; border-radius: 2px; cursor: default; font-size: .75rem; }
.heatmap-tooltip { display: none; position: fixed; z-index: 1000; max-width: 420px; background: #fff; border: 1px solid var(--rule); box-shadow: 0 2px 8px rgba(0,0,0,.2); padding: .6rem .8rem; font-size: .8rem; pointer-events: none; }
.heatmap-tooltip-status { display: inline-block; padding: 1px 6px; color: #fff; border-radius: 2px; margin: .3rem 0; }
.paper-footer { margin-top: 3rem; border-top: 1px solid var(--rule); padding-top: 1rem; text-align: center; color: var(--muted); font-size: .85rem; }
.exporting .heatmap-tooltip { display: none !important; }
.exporting .report-content { box-shadow: none; margin: 0 auto; }
"#;

const RUNTIME: &str = r#"
(function () {
  function mountCharts() {
    var manifest = document.getElementById('chart-mounts');
    if (!manifest) return;
    var mounts;
    try { mounts = JSON.parse(manifest.textContent); } catch (e) { console.error('Invalid chart manifest', e); return; }
    mounts.forEach(function (mount) {
      var canvas = document.getElementById(mount.id);
      if (!canvas || typeof Chart === 'undefined') {
        console.error('Chart.js not loaded or canvas element #' + mount.id + ' not found in DOM');
        return;
      }
      var config = mount.config;
      var options = config.options || {};
      if (config.percentTicks && options.scales && options.scales.y) {
        options.scales.y.ticks = options.scales.y.ticks || {};
        options.scales.y.ticks.callback = function (value) { return value + '%'; };
      }
      if (config.percentTooltip) {
        options.plugins = options.plugins || {};
        options.plugins.tooltip = options.plugins.tooltip || {};
        options.plugins.tooltip.callbacks = options.plugins.tooltip.callbacks || {};
        options.plugins.tooltip.callbacks.label = function (ctx) { return ctx.dataset.label + ': ' + ctx.parsed.y + '%'; };
      }
      new Chart(canvas, { type: config.type, data: config.data, options: options });
    });
  }

  function escapeText(text) {
    var div = document.createElement('div');
    div.textContent = text || '';
    return div.innerHTML;
  }

  function showTooltip(event, cell) {
    var container = cell.closest('.heatmap-container');
    var tooltip = container && container.querySelector('.heatmap-tooltip');
    if (!tooltip) return;
    try {
      var data = JSON.parse(decodeURIComponent(cell.getAttribute('data-tooltip')));
      var html = '<div class="heatmap-tooltip-header"><strong>' + escapeText(data.cwe) + '</strong></div>' +
        '<div class="heatmap-tooltip-coverage"><span class="heatmap-tooltip-status" style="background-color: ' +
        cell.getAttribute('data-status-color') + ';">' + escapeText(data.coverage) + '</span></div>';
      if (data.comments) {
        html += '<div class="heatmap-tooltip-comments">' +
          data.comments.replace(/\\n/g, '\n').replace(/\n/g, '<br>') + '</div>';
      }
      tooltip.innerHTML = html;
      tooltip.style.display = 'block';
      var box = tooltip.getBoundingClientRect();
      var left = event.clientX + 15;
      var top = event.clientY + 15;
      if (left + box.width > window.innerWidth) left = event.clientX - box.width - 15;
      if (top + box.height > window.innerHeight) top = event.clientY - box.height - 15;
      tooltip.style.left = Math.max(0, left) + 'px';
      tooltip.style.top = Math.max(0, top) + 'px';
    } catch (e) {
      console.error('Error showing tooltip:', e);
    }
  }

  function hideTooltip(cell) {
    var container = cell.closest('.heatmap-container');
    var tooltip = container && container.querySelector('.heatmap-tooltip');
    if (tooltip) tooltip.style.display = 'none';
  }

  document.addEventListener('click', function (event) {
    var link = event.target.closest && event.target.closest('.citation-link');
    if (!link) return;
    var target = document.getElementById(link.getAttribute('data-ref'));
    if (!target) return;
    event.preventDefault();
    target.scrollIntoView({ behavior: 'smooth', block: 'start' });
    history.replaceState(null, '', '#' + target.id);
  });
  document.addEventListener('mouseover', function (event) {
    var cell = event.target.closest && event.target.closest('.heatmap-cell');
    if (cell) showTooltip(event, cell);
  });
  document.addEventListener('mousemove', function (event) {
    var cell = event.target.closest && event.target.closest('.heatmap-cell');
    if (cell) showTooltip(event, cell);
  });
  document.addEventListener('mouseout', function (event) {
    var cell = event.target.closest && event.target.closest('.heatmap-cell');
    if (cell) hideTooltip(cell);
  });

  document.addEventListener('DOMContentLoaded', function () {
    mountCharts();
    if (window.location.hash) {
      var target = document.getElementById(window.location.hash.slice(1));
      if (target) target.scrollIntoView();
    }
  });
})();
"#;

/// Chart mounts as JSON safe to embed inside a `<script>` element
fn chart_manifest(charts: &[ChartMount]) -> String {
    let mounts: Vec<_> = charts
        .iter()
        .map(|c| json!({ "id": c.id, "config": c.config }))
        .collect();
    serde_json::Value::Array(mounts)
        .to_string()
        .replace("</", "<\\/")
}

/// Render the full HTML page around a rendered report
pub fn render_page(report: &RenderedReport, chart_js_url: &str) -> String {
    let title = if report.title.is_empty() {
        "Report".to_string()
    } else {
        escape(&report.title)
    };
    let chart_js = if report.charts.is_empty() {
        String::new()
    } else {
        format!("<script src=\"{}\"></script>\n", escape(chart_js_url))
    };

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{title}</title>\n<style>{STYLESHEET}</style>\n{chart_js}</head>\n<body>\n\
         <div id=\"{REPORT_CONTAINER_ID}\" class=\"report-content\">{content}</div>\n\
         <script type=\"application/json\" id=\"chart-mounts\">{manifest}</script>\n\
         <script>{RUNTIME}</script>\n</body>\n</html>\n",
        content = report.content,
        manifest = chart_manifest(&report.charts),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(charts: Vec<ChartMount>) -> RenderedReport {
        RenderedReport {
            title: "A <b> title".into(),
            content: "<p>body</p>".into(),
            charts,
            error: None,
        }
    }

    #[test]
    fn test_page_wraps_content_in_report_container() {
        let html = render_page(&report(vec![]), DEFAULT_CHART_JS_URL);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>A &lt;b&gt; title</title>"));
        assert!(html.contains("<div id=\"report-content\" class=\"report-content\"><p>body</p></div>"));
        assert!(!html.contains("chart.umd.min.js"));
    }

    #[test]
    fn test_chart_manifest_is_script_safe() {
        let charts = vec![ChartMount {
            id: "chart-1-1".into(),
            config: json!({"type": "bar", "data": {"labels": ["</script><b>"]}}),
        }];
        let html = render_page(&report(charts), DEFAULT_CHART_JS_URL);
        assert!(html.contains("chart.umd.min.js"));
        assert!(html.contains("\"id\":\"chart-1-1\""));
        assert!(!html.contains("</script><b>"));
        assert!(html.contains("<\\/script><b>"));
    }
}
