//! Downloadable sleep report for a single prediction.

use crate::service::Prediction;
use crate::suggestions::Suggestion;
use chrono::NaiveDate;
use mime::Mime;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

const TITLE: &str = "Sleep Quality Report";
const SUGGESTIONS_HEADING: &str = "Personalized Suggestions";
const CLOSING: &str = "Thank you for using Sleep Smart!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Html,
}

impl ReportFormat {
    pub fn content_type(self) -> Mime {
        match self {
            Self::Text => mime::TEXT_PLAIN_UTF_8,
            Self::Html => mime::TEXT_HTML_UTF_8,
        }
    }

    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Text => "sleep_report.txt",
            Self::Html => "sleep_report.html",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" | "plain" => Ok(Self::Text),
            "html" | "htm" => Ok(Self::Html),
            other => Err(ReportError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("unsupported report format '{0}' (expected text or html)")]
    UnknownFormat(String),
    #[error("failed to write report to {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Score and suggestions as they appear in the exported document.
#[derive(Debug, Clone, PartialEq)]
pub struct SleepReport {
    pub generated_on: NaiveDate,
    pub score: f64,
    pub suggestions: Vec<Suggestion>,
}

impl SleepReport {
    pub fn from_prediction(prediction: &Prediction) -> Self {
        Self {
            generated_on: prediction.generated_on,
            score: prediction.score,
            suggestions: prediction.suggestions.clone(),
        }
    }

    pub fn score_line(&self) -> String {
        format!("Predicted Sleep Quality Score: {:.1}/100", self.score)
    }

    pub fn render(&self, format: ReportFormat) -> String {
        match format {
            ReportFormat::Text => self.render_text(),
            ReportFormat::Html => self.render_html(),
        }
    }

    fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{TITLE}");
        let _ = writeln!(out, "Date: {}", self.generated_on);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", self.score_line());
        let _ = writeln!(out);
        let _ = writeln!(out, "{SUGGESTIONS_HEADING}:");
        for suggestion in &self.suggestions {
            let _ = writeln!(out, "- {}", suggestion.message);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{CLOSING}");
        out
    }

    fn render_html(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "<!DOCTYPE html>");
        let _ = writeln!(out, "<html lang=\"en\">");
        let _ = writeln!(out, "<head><meta charset=\"utf-8\"><title>{TITLE}</title></head>");
        let _ = writeln!(out, "<body>");
        let _ = writeln!(out, "<h1>{TITLE}</h1>");
        let _ = writeln!(out, "<p>Date: {}</p>", self.generated_on);
        let _ = writeln!(out, "<h2>{}</h2>", escape_html(&self.score_line()));
        let _ = writeln!(out, "<h3>{SUGGESTIONS_HEADING}</h3>");
        let _ = writeln!(out, "<ul>");
        for suggestion in &self.suggestions {
            let _ = writeln!(out, "<li>{}</li>", escape_html(&suggestion.message));
        }
        let _ = writeln!(out, "</ul>");
        let _ = writeln!(out, "<p>{CLOSING}</p>");
        let _ = writeln!(out, "</body>");
        let _ = writeln!(out, "</html>");
        out
    }

    pub fn write_to(&self, path: &Path, format: ReportFormat) -> Result<(), ReportError> {
        std::fs::write(path, self.render(format)).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), ?format, "report written");
        Ok(())
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
