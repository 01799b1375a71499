//! Server-rendered lookup page.
//!
//! Each selector is a one-field form that posts its choice to
//! `/select/{stage}`; the handler forwards it to the controller and redirects
//! back to `/`. While any stage is loading the page refreshes itself.

use std::fmt::Write as _;

use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
    Extension, Form,
};
use chrono::{Datelike, Utc};
use infocars_cascade::{CascadeSnapshot, DetailView, SelectorView, ViewState};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{parse_selectable_stage, settle, ApiError, AppState};

const API_DOCS_URL: &str = "https://deividfortuna.github.io/fipe/";

#[derive(Debug, Deserialize)]
pub(super) struct SelectForm {
    pub code: String,
}

/// `GET /`: the lookup page.
pub(super) async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_page(&state.controller.snapshot(), Utc::now().year()))
}

/// `POST /select/{stage}`: form target of every selector.
pub(super) async fn select(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(stage): Path<String>,
    Form(form): Form<SelectForm>,
) -> Result<Redirect, ApiError> {
    let stage = parse_selectable_stage(&req_id.0, &stage)?;
    state.controller.select(stage, &form.code);
    settle(&state.controller).await;
    Ok(Redirect::to("/"))
}

fn is_loading(snapshot: &CascadeSnapshot) -> bool {
    snapshot
        .selectors()
        .iter()
        .any(|s| matches!(s.state, ViewState::Loading))
        || matches!(snapshot.vehicle.state, ViewState::Loading)
}

pub(super) fn render_page(snapshot: &CascadeSnapshot, year: i32) -> String {
    let mut html = String::new();
    html.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    if is_loading(snapshot) {
        html.push_str("<meta http-equiv=\"refresh\" content=\"1\">\n");
    }
    html.push_str("<title>Info Cars</title>\n</head>\n<body>\n");
    let _ = writeln!(
        html,
        "<header><nav><a class=\"brand\" href=\"/\">Info Cars</a> \
         <a href=\"{API_DOCS_URL}\" target=\"_blank\">API</a></nav></header>"
    );

    html.push_str("<main>\n");
    for selector in snapshot.selectors() {
        render_selector(&mut html, selector);
    }
    render_detail(&mut html, &snapshot.vehicle);
    html.push_str("</main>\n");

    let _ = writeln!(html, "<footer>&copy; {year} Info Cars</footer>");
    html.push_str("</body>\n</html>\n");
    html
}

fn render_selector(html: &mut String, selector: &SelectorView) {
    match &selector.state {
        ViewState::Idle => {}
        ViewState::Loading => html.push_str(SPINNER),
        ViewState::Error(message) => {
            let _ = writeln!(html, "<div class=\"error\">Error: {}</div>", escape_html(message));
        }
        ViewState::Ready(items) => {
            let stage = selector.stage.as_str();
            let _ = writeln!(
                html,
                "<form method=\"post\" action=\"/select/{stage}\">\n<h2>{}:</h2>\n\
                 <select name=\"code\" onchange=\"this.form.submit()\">",
                selector.title
            );
            for item in items {
                let selected = if selector.selected.as_deref() == Some(item.code.as_str()) {
                    " selected"
                } else {
                    ""
                };
                let _ = writeln!(
                    html,
                    "<option value=\"{}\"{selected}>{}</option>",
                    escape_html(&item.code),
                    escape_html(&item.label)
                );
            }
            html.push_str("</select>\n<noscript><button type=\"submit\">Go</button></noscript>\n</form>\n");
        }
    }
}

fn render_detail(html: &mut String, detail: &DetailView) {
    match &detail.state {
        ViewState::Idle => {}
        ViewState::Loading => html.push_str(SPINNER),
        ViewState::Error(message) => {
            let _ = writeln!(html, "<div class=\"error\">Error: {}</div>", escape_html(message));
        }
        ViewState::Ready(_) => {
            let _ = writeln!(
                html,
                "<h1>{}</h1>\n<ul>",
                escape_html(detail.title().unwrap_or_default())
            );
            for (label, value) in detail.fields() {
                let _ = writeln!(html, "<li>{label}: {}</li>", escape_html(&value));
            }
            html.push_str("</ul>\n");
        }
    }
}

const SPINNER: &str = "<div class=\"spinner\" role=\"status\" aria-label=\"loading\">\
                       <span class=\"sr-only\">Loading...</span></div>\n";

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
