//! Chart placeholders and Chart.js configuration

use super::escape::escape;
use super::{Fragment, Mount};
use crate::document::ChartDescriptor;
use serde_json::{json, Map, Value};

/// Recursively merge `source` over `target`: objects merge key by key, anything
/// else in `source` replaces what is in `target`
pub fn deep_merge(target: &Value, source: &Value) -> Value {
    match (target, source) {
        (Value::Object(t), Value::Object(s)) => {
            let mut out: Map<String, Value> = t.clone();
            for (key, value) in s {
                let merged = match t.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                out.insert(key.clone(), merged);
            }
            Value::Object(out)
        }
        (_, other) => other.clone(),
    }
}

/// Default Chart.js options for a descriptor. Line charts get a 0-100 y axis.
pub fn default_options(chart: &ChartDescriptor) -> Value {
    let mut options = json!({
        "responsive": true,
        "maintainAspectRatio": true,
        "plugins": {
            "legend": { "display": chart.show_legend != Some(false) },
            "tooltip": {}
        }
    });
    if chart.chart_type == "line" {
        options["scales"] = json!({
            "y": { "beginAtZero": true, "max": 100 }
        });
    }
    options
}

/// Full config handed to the page runtime. `percentTicks`/`percentTooltip` ask
/// the runtime to install the `%` callbacks JSON cannot express.
pub fn chart_config(chart: &ChartDescriptor) -> Value {
    let defaults = default_options(chart);
    let options = match &chart.options {
        Some(custom) => deep_merge(&defaults, custom),
        None => defaults,
    };
    json!({
        "type": chart.chart_type,
        "data": {
            "labels": chart.labels,
            "datasets": chart.datasets,
        },
        "options": options,
        "percentTicks": chart.chart_type == "line",
        "percentTooltip": true,
    })
}

pub fn render_chart(chart: &ChartDescriptor, id: &str) -> Fragment {
    let caption = chart
        .caption
        .as_deref()
        .map(|c| format!("<p class=\"chart-caption\">{}</p>", escape(c)))
        .unwrap_or_default();
    let mut fragment = Fragment::new(format!(
        "<div class=\"chart-container\"><canvas id=\"{id}\" style=\"min-height: 400px;\"></canvas>{caption}</div>"
    ));
    fragment.mounts.push(Mount::Chart {
        id: id.to_string(),
        config: chart_config(chart),
    });
    fragment
}
