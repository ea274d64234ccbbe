//! Discovery: find every PDF below the input folder.
//!
//! The scan is recursive (`**/*.pdf`), case-sensitive on the extension, and
//! returns regular files sorted by path so that slide order is reproducible
//! across runs and platforms.

use crate::error::Pdf2PptxError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// All `*.pdf` files under `root`, sorted by path.
pub fn discover_pdfs(root: &Path) -> Result<Vec<PathBuf>, Pdf2PptxError> {
    if !root.is_dir() {
        return Err(Pdf2PptxError::InputDirNotFound {
            path: root.to_path_buf(),
        });
    }

    let escaped_root = glob::Pattern::escape(&root.to_string_lossy());
    let pattern = format!("{}/**/*.pdf", escaped_root.trim_end_matches('/'));

    let entries = glob::glob(&pattern).map_err(|e| Pdf2PptxError::Discovery {
        pattern: pattern.clone(),
        detail: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Pdf2PptxError::Discovery {
            pattern: pattern.clone(),
            detail: e.to_string(),
        })?;
        if path.is_file() {
            debug!("Discovered {}", path.display());
            files.push(path);
        }
    }
    files.sort();

    info!("Found {} PDF files under {}", files.len(), root.display());
    Ok(files)
}

/// Check that `path` is readable and starts with the `%PDF` magic bytes.
pub fn validate_pdf(path: &Path) -> Result<(), Pdf2PptxError> {
    let mut file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2PptxError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(Pdf2PptxError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
        return Err(Pdf2PptxError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

/// File stem used for page image names (`report.pdf` → `report`).
pub fn pdf_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// Short name shown in progress output.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
