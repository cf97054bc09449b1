//! Server-rendered HTML for the prediction page

use crate::types::transaction::TransactionType;
use crate::types::verdict::Prediction;
use crate::web::form::PredictForm;
use std::fmt::Write;

pub const PAGE_TITLE: &str = "Fraud Detection Prediction App";

const STYLE: &str = "\
body{font-family:sans-serif;max-width:42rem;margin:2rem auto;padding:0 1rem;color:#262730}\
label{display:block;margin-top:1rem;font-size:.9rem}\
input,select{width:100%;padding:.4rem;margin-top:.25rem;box-sizing:border-box}\
button{margin-top:1.5rem;padding:.5rem 1rem}\
hr{margin:1.5rem 0;border:none;border-top:1px solid #ddd}\
.alert{padding:1rem;border-radius:.4rem;white-space:pre-line}\
.alert.error{background:#ffe3e3;color:#7d1a1a}\
.alert.success{background:#dff5e3;color:#155724}";

/// What to show under the form after a submission
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A full verdict
    Verdict(Prediction),
    /// An aborted cycle; the message is shown instead of a verdict
    Error(String),
}

/// Escape text for HTML element and attribute content
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

fn document(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{style}</style>\n</head>\n<body>\n\
         <h1>{title}</h1>\n{body}</body>\n</html>\n",
        title = PAGE_TITLE,
        style = STYLE,
        body = body
    )
}

fn alert(class: &str, message: &str) -> String {
    format!(
        "<div class=\"alert {}\" role=\"alert\">{}</div>\n",
        class,
        escape_html(message)
    )
}

/// Render the input form, followed by the outcome of the last submission
pub fn render_form_page(form: &PredictForm, outcome: Option<&Outcome>) -> String {
    let mut body = String::new();
    body.push_str("<p>Please enter the transaction details and click ");
    body.push_str("<strong>Predict</strong></p>\n<hr>\n");
    body.push_str("<form method=\"post\" action=\"/predict\">\n");

    body.push_str("<label for=\"type\">Transaction Type</label>\n");
    body.push_str("<select id=\"type\" name=\"type\">\n");
    for option in TransactionType::ALL {
        let selected = if option.as_str() == form.transaction_type {
            " selected"
        } else {
            ""
        };
        let _ = writeln!(
            body,
            "<option value=\"{0}\"{1}>{0}</option>",
            option.as_str(),
            selected
        );
    }
    body.push_str("</select>\n");

    for (name, label, value) in form.numeric_inputs() {
        let _ = writeln!(body, "<label for=\"{name}\">{label}</label>");
        let _ = writeln!(
            body,
            "<input type=\"number\" id=\"{name}\" name=\"{name}\" \
             min=\"0.0\" step=\"any\" value=\"{value}\" required>",
            value = escape_html(value)
        );
    }

    body.push_str("<button type=\"submit\">Predict Fraud</button>\n</form>\n");

    match outcome {
        Some(Outcome::Verdict(prediction)) => {
            body.push_str("<hr>\n");
            let class = if prediction.verdict.is_fraud() {
                "error"
            } else {
                "success"
            };
            body.push_str(&alert(class, &prediction.message()));
        }
        Some(Outcome::Error(message)) => {
            body.push_str(&alert("error", message));
        }
        None => {}
    }

    document(&body)
}

/// Page shown for the whole run when the model failed to load
pub fn render_unavailable(message: &str) -> String {
    document(&alert("error", message))
}
