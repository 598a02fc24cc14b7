//! Loading the two input documents.
//!
//! Mirrors the checks an upload form would do before anything is sent to the
//! model: the file must look like a PDF, must not be empty, and must be at
//! most 20 MB.

use std::path::Path;

use anyhow::{Context, bail};

pub const MAX_DOCUMENT_BYTES: u64 = 20 * 1024 * 1024;
const PDF_MAGIC: &[u8] = b"%PDF-";

/// A document read from disk, ready to forward.
#[derive(Debug)]
pub struct Document {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Read and validate one input document.
pub async fn load_pdf(path: &Path) -> anyhow::Result<Document> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let meta = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    if !meta.is_file() {
        bail!("{} is not a file", path.display());
    }
    check_size(&name, meta.len())?;

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    check_size(&name, bytes.len() as u64)?;
    check_pdf(&name, &bytes)?;

    Ok(Document { name, bytes })
}

fn check_size(name: &str, len: u64) -> anyhow::Result<()> {
    if len == 0 {
        bail!("File is empty: {name}. Please upload a PDF document.");
    }
    if len > MAX_DOCUMENT_BYTES {
        bail!(
            "File is too large: {name} ({:.1}MB). Max size is 20MB.",
            len as f64 / 1024.0 / 1024.0
        );
    }
    Ok(())
}

/// Accept files that start with the PDF header, or carry a `.pdf` extension.
fn check_pdf(name: &str, bytes: &[u8]) -> anyhow::Result<()> {
    let has_magic = bytes.starts_with(PDF_MAGIC);
    let has_ext = Path::new(name)
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !has_magic && !has_ext {
        bail!("Invalid file type: {name}. Please upload a PDF document.");
    }
    Ok(())
}
