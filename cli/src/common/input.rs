//! File input utilities.

use std::io::Read;

/// Read input from a file path or stdin if path is "-".
///
/// Returns the raw bytes and a display name for error messages. Scripts are
/// not decoded here; the runtime rejects invalid UTF-8 itself.
pub fn read_input(path: &str) -> Result<(Vec<u8>, String), String> {
    if is_stdin(path) {
        let mut content = Vec::new();
        std::io::stdin()
            .read_to_end(&mut content)
            .map_err(|e| format!("<stdin>: {}", e))?;
        Ok((content, "<stdin>".to_string()))
    } else {
        let content = std::fs::read(path).map_err(|e| format!("{}: {}", path, e))?;
        Ok((content, path.to_string()))
    }
}

/// Check if the path represents stdin.
pub fn is_stdin(path: &str) -> bool {
    path == "-"
}

/// Strip a leading `#!` line, keeping the newline so line numbers in
/// diagnostics still match the file.
pub fn strip_shebang(content: &[u8]) -> &[u8] {
    if !content.starts_with(b"#!") {
        return content;
    }
    match content.iter().position(|&b| b == b'\n') {
        Some(end) => &content[end..],
        None => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shebang_is_stripped() {
        assert_eq!(strip_shebang(b"#!/usr/bin/env bia run\nprint(1)"), b"\nprint(1)");
        assert_eq!(strip_shebang(b"#!bia"), b"");
    }

    #[test]
    fn plain_script_is_untouched() {
        assert_eq!(strip_shebang(b"print(1)"), b"print(1)");
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = read_input("/definitely/not/here.bia").unwrap_err();
        assert!(err.starts_with("/definitely/not/here.bia: "), "{err}");
    }
}
