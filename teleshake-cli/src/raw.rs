//! Raw byte tool helpers

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

/// Render bytes as zero-padded decimals, each followed by a space
pub fn format_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:03} ")).collect()
}

/// Write (or append) the rendered response to `path`
pub fn write_response(path: &Path, bytes: &[u8], append: bool) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    file.write_all(format_bytes(bytes).as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(&[1, 48, 0, 0, 0, 49]), "001 048 000 000 000 049 ");
        assert_eq!(format_bytes(&[]), "");
    }

    #[test]
    fn test_write_then_append() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("response.txt");

        write_response(&path, &[1, 2], false).unwrap();
        write_response(&path, &[3], true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "001 002 003 ");

        write_response(&path, &[9], false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "009 ");
    }
}
