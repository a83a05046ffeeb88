// Ledger export decoding

use std::path::Path;

use confronto_recon::config::LedgerConfig;
use confronto_recon::{parse_ledger, LedgerPostingRow};

use crate::error::IoError;

/// Read a ledger export and parse its postings.
pub fn import_ledger(path: &Path, layout: &LedgerConfig) -> Result<Vec<LedgerPostingRow>, IoError> {
    let content = read_file_as_utf8(path)?;
    Ok(parse_ledger(&content, layout))
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let bytes = std::fs::read(path).map_err(|e| IoError::file(path, e))?;
    Ok(decode_bytes(bytes))
}

/// UTF-8 when valid (BOM dropped), Windows-1252 otherwise.
pub fn decode_bytes(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => match s.strip_prefix('\u{feff}') {
            Some(rest) => rest.to_string(),
            None => s,
        },
        Err(e) => {
            let bytes = e.into_bytes();
            // Accounting exports from Windows tools are typically cp1252
            log::debug!("input is not UTF-8, decoding as Windows-1252");
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn utf8_passes_through() {
        assert_eq!(decode_bytes("FÉRIAS".as_bytes().to_vec()), "FÉRIAS");
    }

    #[test]
    fn bom_is_dropped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"1;30057");
        assert_eq!(decode_bytes(bytes), "1;30057");
    }

    #[test]
    fn windows_1252_fallback() {
        // "FÉRIAS" with É = 0xC9 in cp1252
        let bytes = vec![b'F', 0xC9, b'R', b'I', b'A', b'S'];
        assert_eq!(decode_bytes(bytes), "FÉRIAS");
    }

    #[test]
    fn import_ledger_from_cp1252_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lote.txt");
        let mut bytes = b"1;30057;01/2026;358,35;4101;2105;1;F".to_vec();
        bytes.push(0xC9);
        bytes.extend_from_slice(b"RIAS A PAGAR\n");
        fs::write(&path, bytes).unwrap();

        let rows = import_ledger(&path, &LedgerConfig::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ledger_code, "30057");
        assert_eq!(rows[0].amount, dec!(358.35));
        assert_eq!(rows[0].description, "FÉRIAS A PAGAR");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = read_file_as_utf8(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, IoError::File { .. }));
    }
}
