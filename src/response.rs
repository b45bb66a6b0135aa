//! Response builders: FHIR OperationOutcome envelopes and templated
//! plain-text error replies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::config::Config;
use crate::format::{html_encode, printf};

#[derive(Debug, Serialize)]
pub struct OperationOutcome {
    #[serde(rename = "resourceType")]
    pub resource_type: &'static str,
    pub text: Narrative,
    pub issue: Vec<Issue>,
}

#[derive(Debug, Serialize)]
pub struct Narrative {
    pub status: &'static str,
    pub div: String,
}

#[derive(Debug, Serialize)]
pub struct Issue {
    pub severity: String,
    pub code: String,
    pub diagnostics: String,
}

pub struct OutcomeOptions {
    pub http_code: StatusCode,
    pub issue_code: String,
    pub severity: String,
}

impl Default for OutcomeOptions {
    fn default() -> Self {
        Self {
            http_code: StatusCode::INTERNAL_SERVER_ERROR,
            issue_code: "processing".to_string(),
            severity: "error".to_string(),
        }
    }
}

/// Build an OperationOutcome response: JSON envelope plus a generated
/// narrative embedding the HTML-escaped message.
pub fn operation_outcome(message: &str, options: OutcomeOptions) -> Response {
    let diagnostics = html_encode(message);
    let div = format!(
        "<div xmlns=\"http://www.w3.org/1999/xhtml\">\
         <h1>Operation Outcome</h1>\
         <table border=\"0\"><tr>\
         <td style=\"font-weight:bold;\">{}</td>\
         <td><pre>{}</pre></td>\
         </tr></table></div>",
        options.severity, diagnostics
    );

    let body = OperationOutcome {
        resource_type: "OperationOutcome",
        text: Narrative {
            status: "generated",
            div,
        },
        issue: vec![Issue {
            severity: options.severity,
            code: options.issue_code,
            diagnostics,
        }],
    };

    (options.http_code, Json(body)).into_response()
}

/// Look up a named `%s` template in `config.errors` and format it. Unknown
/// names fall back to the name itself so the caller still gets something
/// displayable.
pub fn error_text(config: &Config, name: &str, params: &[&str]) -> String {
    match config.errors.get(name) {
        Some(template) => printf(template, params),
        None => name.to_string(),
    }
}

/// Plain-text error reply built from a named template.
pub fn reply_with_error(
    config: &Config,
    name: &str,
    code: StatusCode,
    params: &[&str],
) -> Response {
    (code, error_text(config, name, params)).into_response()
}
