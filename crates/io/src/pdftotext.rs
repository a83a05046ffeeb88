//! Summary documents as positioned words, via poppler's `pdftotext -bbox`.

use std::path::Path;
use std::process::Command;

use confronto_recon::Token;

use crate::bbox::parse_bbox;
use crate::csv::read_file_as_utf8;
use crate::error::IoError;

const PDFTOTEXT: &str = "pdftotext";

/// Run `pdftotext -bbox <file> -` and capture the XHTML on stdout.
///
/// `binary` overrides the executable looked up on PATH.
pub fn run_pdftotext_bbox(file: &Path, binary: Option<&Path>) -> Result<String, IoError> {
    let program = match binary {
        Some(path) => path.to_path_buf(),
        None => which::which(PDFTOTEXT).map_err(|_| IoError::ToolMissing { tool: PDFTOTEXT.into() })?,
    };

    log::debug!("running {} -bbox {}", program.display(), file.display());
    let output = Command::new(&program)
        .arg("-bbox")
        .arg(file)
        .arg("-")
        .output()
        .map_err(|e| IoError::file(&program, e))?;

    if !output.status.success() {
        return Err(IoError::ToolFailed {
            tool: PDFTOTEXT.into(),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// True for saved `-bbox` dumps, which are read directly instead of
/// converted.
pub fn is_bbox_dump(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "html" | "htm" | "xhtml" | "xml"))
        .unwrap_or(false)
}

/// Load a summary document as pages of tokens, from a PDF or a saved dump.
pub fn load_pages(path: &Path, binary: Option<&Path>) -> Result<Vec<Vec<Token>>, IoError> {
    let xml = if is_bbox_dump(path) {
        read_file_as_utf8(path)?
    } else {
        run_pdftotext_bbox(path, binary)?
    };
    parse_bbox(&xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn dump_extensions() {
        assert!(is_bbox_dump(Path::new("resumo.html")));
        assert!(is_bbox_dump(Path::new("resumo.XHTML")));
        assert!(!is_bbox_dump(Path::new("resumo.pdf")));
        assert!(!is_bbox_dump(Path::new("resumo")));
    }

    #[test]
    fn loads_saved_dump_without_pdftotext() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("resumo.html");
        fs::write(
            &path,
            r#"<doc><page><word xMin="1" yMin="2" xMax="3" yMax="4">Folha</word></page></doc>"#,
        )
        .unwrap();

        let pages = load_pages(&path, None).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0][0].text, "Folha");
    }

    #[test]
    fn missing_binary_override_fails() {
        let dir = tempdir().unwrap();
        let bogus = dir.path().join("no-such-pdftotext");
        let err = run_pdftotext_bbox(&dir.path().join("x.pdf"), Some(&bogus)).unwrap_err();
        assert!(matches!(err, IoError::File { .. }));
    }
}
