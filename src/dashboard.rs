//! Dashboard HTTP surface: the HTML page with the filter controls and its JSON view.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use tracing::info;

use crate::filters::{FilterState, TypeSelection};
use crate::listing::ListingDataset;
use crate::view::{render_view, DashboardView, PAGE_INTRO, PAGE_TITLE};

pub const PLOTLY_CDN_URL: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Query string shared by the page and the view endpoint.
///
/// Each selected condition arrives as its own `conditions` parameter, so labels may contain
/// commas. Leaving conditions out keeps every condition selected; the `conditions_set` marker
/// (or an empty `conditions=`) with nothing checked selects none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardQuery {
    pub vehicle_type: Option<String>,
    pub conditions: Option<BTreeSet<String>>,
}

impl DashboardQuery {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "type" => query.vehicle_type = Some(value),
                "conditions" => {
                    let selected = query.conditions.get_or_insert_with(BTreeSet::new);
                    let value = value.trim();
                    if !value.is_empty() {
                        selected.insert(value.to_string());
                    }
                }
                "conditions_set" => {
                    query.conditions.get_or_insert_with(BTreeSet::new);
                }
                _ => {}
            }
        }
        query
    }

    pub fn filter_state(&self, dataset: &ListingDataset) -> FilterState {
        let selection = self
            .vehicle_type
            .as_deref()
            .map(TypeSelection::parse)
            .unwrap_or_default();
        FilterState::from_selection(dataset, selection, self.conditions.clone())
    }
}

pub fn dashboard_router(dataset: Arc<ListingDataset>) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .route("/dashboard", get(get_dashboard_html))
        .route("/dashboard/view", get(get_dashboard_view))
        .with_state(DashboardAppState { dataset })
}

pub fn render_dashboard_html(view: &DashboardView) -> String {
    let now_utc = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();

    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape_html(PAGE_TITLE)));
    out.push_str(&format!("<script src=\"{PLOTLY_CDN_URL}\"></script>\n"));
    out.push_str("<style>:root{--bg:#f4f1ea;--card:#ffffff;--ink:#1b2228;--muted:#5f6a73;--line:#d7dce1;--head:#1d3b4a}*{box-sizing:border-box}body{margin:0;color:var(--ink);font-family:\"Space Grotesk\",\"Avenir Next\",\"Segoe UI\",sans-serif;background:linear-gradient(160deg,var(--bg),#e8eef1);min-height:100vh}.layout{display:grid;grid-template-columns:260px 1fr;gap:18px;max-width:1500px;margin:0 auto;padding:24px 18px}.sidebar{background:var(--card);border:1px solid #cbd4db;border-radius:16px;padding:16px;align-self:start;position:sticky;top:16px}.sidebar h2{margin:0 0 4px;font-size:1.1rem}.caption{color:var(--muted);font-size:.82rem;margin:0 0 14px}.field{display:block;font-weight:700;font-size:.85rem;margin:12px 0 6px}select{width:100%;padding:6px;border-radius:8px;border:1px solid var(--line)}.check{display:block;font-size:.86rem;padding:3px 0}.hero{background:linear-gradient(135deg,#17323f 0%,#2b6178 100%);color:#f7fbfc;border-radius:16px;padding:18px 20px}.hero h1{margin:0 0 8px;font-size:1.6rem}.hero p{margin:0 0 8px;color:#dcebf0}.hero-meta{display:flex;gap:16px;flex-wrap:wrap;font-size:.9rem;color:#dcebf0}.card{margin-top:16px;background:var(--card);border:1px solid #cbd4db;border-radius:16px;padding:8px;box-shadow:0 10px 24px rgba(26,35,42,.1)}.chart{min-height:420px}.summary{margin-top:16px;padding:16px 20px;background:var(--card);border-radius:16px;border:1px solid #cbd4db}.summary h3{margin-top:0}@media (max-width:900px){.layout{grid-template-columns:1fr}.sidebar{position:static}}</style>\n");
    out.push_str("</head><body><div class=\"layout\">\n");

    render_sidebar(&mut out, view);

    out.push_str("<main>\n");
    out.push_str(&format!(
        "<section class=\"hero\"><h1>{}</h1><p>{}</p>",
        escape_html(PAGE_TITLE),
        escape_html(PAGE_INTRO)
    ));
    out.push_str("<div class=\"hero-meta\">");
    out.push_str(&format!("<span>Listings: {}</span>", view.total_rows));
    out.push_str(&format!(
        "<span>Matching filters: <b id=\"working-rows\">{}</b></span>",
        view.working_rows
    ));
    out.push_str(&format!(
        "<span>Generated: {}</span>",
        escape_html(&now_utc)
    ));
    out.push_str("<span id=\"status\"></span>");
    out.push_str("</div></section>\n");

    for chart in &view.charts {
        out.push_str(&format!(
            "<section class=\"card\"><div class=\"chart\" id=\"chart-{}\" data-row-count=\"{}\" aria-label=\"{}\"></div></section>\n",
            chart.id.as_str(),
            chart.row_count,
            escape_html(&chart.title)
        ));
    }

    out.push_str("<section class=\"summary\" id=\"summary\">");
    out.push_str(&format!("<h3>{}</h3><ul>", escape_html(view.summary.title)));
    for insight in &view.summary.insights {
        out.push_str(&format!(
            "<li><strong>{}</strong>{}</li>",
            escape_html(insight.headline),
            escape_html(insight.detail)
        ));
    }
    out.push_str("</ul></section>\n");
    out.push_str("</main></div>\n");
    out.push_str(DASHBOARD_SCRIPT);
    out.push_str("</body></html>\n");
    out
}

fn render_sidebar(out: &mut String, view: &DashboardView) {
    let selected_type = view.filters.vehicle_type().as_str();

    out.push_str("<aside class=\"sidebar\"><form id=\"filters-form\" method=\"get\" action=\"/dashboard\">\n");
    out.push_str("<h2>Filters</h2><p class=\"caption\">Use the filters below to customize the dashboard</p>\n");

    out.push_str("<label class=\"field\" for=\"type-select\">Select vehicle type:</label>");
    out.push_str("<select id=\"type-select\" name=\"type\">");
    for option in &view.options.types {
        let selected = if option == selected_type {
            " selected"
        } else {
            ""
        };
        out.push_str(&format!(
            "<option value=\"{0}\"{1}>{0}</option>",
            escape_html(option),
            selected
        ));
    }
    out.push_str("</select>\n");

    out.push_str("<span class=\"field\">Select vehicle condition(s):</span>");
    out.push_str("<input type=\"hidden\" name=\"conditions_set\" value=\"1\">");
    out.push_str("<div id=\"condition-options\">");
    for option in &view.options.conditions {
        let checked = if view.filters.conditions().contains(option) {
            " checked"
        } else {
            ""
        };
        out.push_str(&format!(
            "<label class=\"check\"><input type=\"checkbox\" name=\"conditions\" value=\"{0}\"{1}> {0}</label>",
            escape_html(option),
            checked
        ));
    }
    out.push_str("</div>\n");
    out.push_str("</form></aside>\n");
}

// Plotly does the binning, density counting and box statistics. Every control change
// refetches the whole view; a type change drops the condition selection so it resets.
const DASHBOARD_SCRIPT: &str = r#"<script>
const form = document.getElementById('filters-form');
const conditionBox = document.getElementById('condition-options');
const workingRows = document.getElementById('working-rows');
const statusLine = document.getElementById('status');

function queryFor(resetConditions) {
  const params = new URLSearchParams();
  params.set('type', form.elements['type'].value);
  if (!resetConditions) {
    params.set('conditions_set', '1');
    for (const el of form.querySelectorAll('input[name="conditions"]:checked')) {
      params.append('conditions', el.value);
    }
  }
  return params;
}

function renderConditions(options, selected) {
  conditionBox.replaceChildren();
  for (const value of options) {
    const label = document.createElement('label');
    label.className = 'check';
    const input = document.createElement('input');
    input.type = 'checkbox';
    input.name = 'conditions';
    input.value = value;
    input.checked = selected.includes(value);
    label.append(input, document.createTextNode(' ' + value));
    conditionBox.append(label);
  }
}

function traces(chart) {
  return chart.series.map((s) => {
    if (chart.kind === 'histogram') {
      return { type: 'histogram', x: s.x, name: s.name, nbinsx: chart.nbins_x, opacity: chart.opacity };
    }
    if (chart.kind === 'density_heatmap') {
      return {
        type: 'histogram2d', x: s.x, y: s.y, nbinsx: chart.nbins_x, nbinsy: chart.nbins_y,
        colorscale: chart.color_scale, reversescale: true,
        colorbar: { title: { text: chart.colorbar_label } },
      };
    }
    return { type: 'box', x: s.x, y: s.y, name: s.name || chart.y.label };
  });
}

function layoutFor(chart) {
  const layout = {
    title: { text: chart.title },
    xaxis: { title: { text: chart.x.label } },
    yaxis: { title: { text: chart.y.label } },
    legend: { title: { text: chart.color_field || '' } },
    showlegend: chart.color_field !== null,
    margin: { t: 56 },
  };
  if (chart.barmode) {
    layout.barmode = chart.barmode;
  }
  if (chart.row_count === 0) {
    layout.annotations = [{
      text: 'No listings match the current filters', showarrow: false,
      xref: 'paper', yref: 'paper', x: 0.5, y: 0.5,
    }];
  }
  return layout;
}

async function refresh(resetConditions) {
  const params = queryFor(resetConditions);
  const response = await fetch('/dashboard/view?' + params.toString());
  if (!response.ok) {
    statusLine.textContent = 'View request failed (' + response.status + ')';
    return;
  }
  statusLine.textContent = '';
  const view = await response.json();
  renderConditions(view.options.conditions, view.filters.conditions);
  workingRows.textContent = view.working_rows;
  for (const chart of view.charts) {
    Plotly.react('chart-' + chart.id, traces(chart), layoutFor(chart), { responsive: true });
  }
  history.replaceState(null, '', '/dashboard?' + queryFor(false).toString());
}

form.addEventListener('change', (event) => { refresh(event.target.name === 'type'); });
form.addEventListener('submit', (event) => { event.preventDefault(); refresh(false); });
refresh(false);
</script>
"#;

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[derive(Clone)]
struct DashboardAppState {
    dataset: Arc<ListingDataset>,
}

async fn get_dashboard_html(
    State(state): State<DashboardAppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> impl IntoResponse {
    let filters = DashboardQuery::from_pairs(pairs).filter_state(&state.dataset);
    info!(
        component = "dashboard",
        event = "http.dashboard.request",
        vehicle_type = filters.vehicle_type().as_str(),
        selected_conditions = filters.conditions().len()
    );
    Html(render_dashboard_html(&render_view(&state.dataset, &filters)))
}

async fn get_dashboard_view(
    State(state): State<DashboardAppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> impl IntoResponse {
    let filters = DashboardQuery::from_pairs(pairs).filter_state(&state.dataset);
    let view = render_view(&state.dataset, &filters);
    info!(
        component = "dashboard",
        event = "http.view.request",
        vehicle_type = filters.vehicle_type().as_str(),
        selected_conditions = filters.conditions().len(),
        working_rows = view.working_rows
    );
    Json(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::Listing;

    fn dataset() -> ListingDataset {
        let row = |vehicle_type: &str, condition: &str| Listing {
            price: 12_000.0,
            odometer: Some(60_000.0),
            model_year: Some(2014.0),
            condition: Some(condition.to_string()),
            vehicle_type: vehicle_type.to_string(),
            days_listed: 14,
        };
        ListingDataset::new(vec![
            row("sedan", "good"),
            row("sedan", "like new"),
            row("truck", "fair"),
            row("<script>", "good"),
        ])
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn repeated_condition_parameters_are_collected_verbatim() {
        let query = DashboardQuery::from_pairs(pairs(&[
            ("type", "sedan"),
            ("conditions", " like new "),
            ("conditions", "good, clean"),
            ("conditions", ""),
            ("page", "2"),
        ]));

        assert_eq!(query.vehicle_type.as_deref(), Some("sedan"));
        assert_eq!(
            query.conditions,
            Some(BTreeSet::from([
                "good, clean".to_string(),
                "like new".to_string()
            ]))
        );
    }

    #[test]
    fn query_without_conditions_selects_all_for_type() {
        let dataset = dataset();
        let query = DashboardQuery::from_pairs(pairs(&[("type", "sedan")]));

        assert_eq!(query.conditions, None);
        let state = query.filter_state(&dataset);
        assert_eq!(state.conditions().len(), 2);
    }

    #[test]
    fn marker_or_empty_value_without_checked_conditions_selects_none() {
        let dataset = dataset();
        for raw in [[("conditions_set", "1")], [("conditions", "")]] {
            let state = DashboardQuery::from_pairs(pairs(&raw)).filter_state(&dataset);
            assert_eq!(state.vehicle_type(), &TypeSelection::All);
            assert!(state.conditions().is_empty());
        }
    }

    #[test]
    fn rendered_page_preselects_controls_from_state() {
        let dataset = dataset();
        let query = DashboardQuery::from_pairs(pairs(&[
            ("type", "sedan"),
            ("conditions_set", "1"),
            ("conditions", "like new"),
        ]));
        let html = render_dashboard_html(&render_view(&dataset, &query.filter_state(&dataset)));

        assert!(html.contains("<option value=\"sedan\" selected>sedan</option>"));
        assert!(html.contains("value=\"like new\" checked"));
        assert!(html.contains("value=\"good\"> good"));
        assert!(!html.contains("value=\"fair\""));
    }

    #[test]
    fn rendered_page_escapes_data_values() {
        let dataset = dataset();
        let html = render_dashboard_html(&render_view(&dataset, &FilterState::initial(&dataset)));

        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<option value=\"<script>\""));
    }
}
