//! Startup loader for [`KnowledgeContext`]. Every failure degrades to a placeholder.

use super::{KnowledgeContext, DEFAULT_SUMMARY};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const SUMMARY_FILE: &str = "summary.txt";
const PROFILE_TEXT_FILE: &str = "linkedin.txt";
const PROFILE_PDF_FILE: &str = "linkedin.pdf";

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid url regex"));

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to extract text from {path}: {message}")]
    Pdf { path: PathBuf, message: String },
}

/// Removes every `http(s)://` URL so the model cannot leak or echo profile links.
pub fn strip_urls(text: &str) -> String {
    URL_RE.replace_all(text, "").into_owned()
}

impl KnowledgeContext {
    /// Loads the persona material from `dir`. Never fails; missing pieces are logged.
    pub fn load(dir: &Path, persona_name: &str, resume_file: &str) -> Self {
        let resume_path = dir.join(resume_file);
        let resume_available = resume_path.is_file();
        if resume_available {
            tracing::info!(target: "folio::knowledge", path = %resume_path.display(), "Resume PDF found");
        } else {
            tracing::warn!(target: "folio::knowledge", path = %resume_path.display(), "Resume PDF not found");
        }

        let profile_text = match read_profile(dir) {
            Ok(Some(text)) => strip_urls(&text),
            Ok(None) => {
                tracing::info!(
                    target: "folio::knowledge",
                    dir = %dir.display(),
                    "No LinkedIn export found, continuing without profile text"
                );
                String::new()
            }
            Err(e) => {
                tracing::warn!(target: "folio::knowledge", error = %e, "Profile load failed");
                String::new()
            }
        };

        let summary = match read_summary(dir) {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::info!(
                    target: "folio::knowledge",
                    dir = %dir.display(),
                    "{} not found, using default summary",
                    SUMMARY_FILE
                );
                DEFAULT_SUMMARY.to_string()
            }
            Err(e) => {
                tracing::warn!(target: "folio::knowledge", error = %e, "Summary load failed");
                DEFAULT_SUMMARY.to_string()
            }
        };

        Self {
            persona_name: persona_name.to_string(),
            summary,
            profile_text,
            resume_available,
            resume_path,
        }
    }
}

fn read_summary(dir: &Path) -> Result<Option<String>, KnowledgeError> {
    let path = dir.join(SUMMARY_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    std::fs::read_to_string(&path)
        .map(Some)
        .map_err(|source| KnowledgeError::Read { path, source })
}

/// Plain-text export wins over the PDF.
fn read_profile(dir: &Path) -> Result<Option<String>, KnowledgeError> {
    let text_path = dir.join(PROFILE_TEXT_FILE);
    if text_path.is_file() {
        return std::fs::read_to_string(&text_path)
            .map(Some)
            .map_err(|source| KnowledgeError::Read { path: text_path, source });
    }

    let pdf_path = dir.join(PROFILE_PDF_FILE);
    if !pdf_path.is_file() {
        return Ok(None);
    }
    // pdf-extract panics on some malformed documents.
    match std::panic::catch_unwind(|| pdf_extract::extract_text(&pdf_path)) {
        Ok(Ok(text)) => Ok(Some(text)),
        Ok(Err(e)) => Err(KnowledgeError::Pdf {
            path: pdf_path,
            message: format!("{e:?}"),
        }),
        Err(_) => Err(KnowledgeError::Pdf {
            path: pdf_path,
            message: "extractor panicked".to_string(),
        }),
    }
}
