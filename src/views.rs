//! HTML pages served by the upload front end.

use crate::{model::Prediction, upload::ALLOWED_EXTENSIONS};

const TITLE: &str = "Diabetic Retinopathy Classifier";

fn page(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{TITLE}</title>\n</head>\n<body>\n<h1>{TITLE}</h1>\n{body}</body>\n</html>\n"
    )
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn index() -> String {
    let accept = ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",");
    page(&format!(
        "<form method=\"post\" action=\"/\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"file\" accept=\"{accept}\">\n\
         <button type=\"submit\">Predict</button>\n\
         </form>\n"
    ))
}

pub fn result(prediction: Option<&Prediction>) -> String {
    let details = match prediction {
        Some(p) => format!(
            "<p>Predicted class: <span id=\"class-index\">{}</span></p>\n\
             <p>Description: <span id=\"class-description\">{}</span></p>\n\
             <p>Probability: <span id=\"probability\">{}</span></p>\n",
            p.index,
            escape(p.description),
            p.probability
        ),
        None => String::new(),
    };
    page(&format!(
        "<h2>Prediction Result</h2>\n{details}<a href=\"/\">Upload another image</a>\n"
    ))
}
