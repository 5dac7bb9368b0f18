use ropey::Rope;

use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent, Url};

pub use crate::lsp::models::{LspDocument, LspDocumentState};

/// Converts an LSP position (line, UTF-16 column) to a char index in the Rope.
/// Positions past the end of a line or of the document are clamped.
fn position_to_char_idx(position: &Position, text: &Rope) -> usize {
    let line = position.line as usize;
    if line >= text.len_lines() {
        return text.len_chars();
    }
    let line_start = text.line_to_char(line);
    let line_slice = text.line(line);
    let mut content_len = line_slice.len_chars();
    while content_len > 0 && matches!(line_slice.char(content_len - 1), '\n' | '\r') {
        content_len -= 1;
    }
    let line_end = line_start + content_len;
    let line_start_cu = text.char_to_utf16_cu(line_start);
    let target_cu = (line_start_cu + position.character as usize).min(text.len_utf16_cu());
    text.utf16_cu_to_char(target_cu).min(line_end)
}

/// Converts a UTF-16 column within `line` to a char offset.
/// Returns `None` when the column lies past the end of the line.
pub fn utf16_to_char_offset(line: &str, character: u32) -> Option<usize> {
    let target = character as usize;
    let mut units = 0;
    for (idx, c) in line.chars().enumerate() {
        if units >= target {
            return Some(idx);
        }
        units += c.len_utf16();
    }
    (units >= target).then(|| line.chars().count())
}

impl LspDocumentState {
    /// Applies a list of content changes to the document state, updating the text.
    /// Returns the updated text if the version is newer, otherwise an error.
    pub fn apply(
        &mut self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32
    ) -> Result<String, String> {
        if version <= self.version {
            return Err(format!("Version {} not newer than {}", version, self.version));
        }
        for change in &changes {
            if let Some(range) = change.range {
                let start = position_to_char_idx(&range.start, &self.text);
                let end = position_to_char_idx(&range.end, &self.text).max(start);
                self.text.remove(start..end);
                self.text.insert(start, &change.text);
            } else {
                self.text = Rope::from_str(&change.text);
            }
        }
        self.version = version;
        Ok(self.text.to_string())
    }

    /// Text of `line` without its line terminator.
    pub fn line_text(&self, line: usize) -> Option<String> {
        if line >= self.text.len_lines() {
            return None;
        }
        let text = self.text.line(line).to_string();
        Some(text.trim_end_matches(['\n', '\r']).to_string())
    }
}

impl LspDocument {
    pub fn new(id: u32, uri: Url, text: &str, version: i32) -> Self {
        Self {
            id,
            state: tokio::sync::RwLock::new(LspDocumentState {
                uri,
                text: Rope::from_str(text),
                version,
            }),
        }
    }

    /// Returns the current text of the document as a string.
    pub async fn text(&self) -> String {
        self.state.read().await.text.to_string()
    }

    /// Returns the current version of the document.
    pub async fn version(&self) -> i32 {
        self.state.read().await.version
    }

    /// Returns the text of the specified line, without its terminator.
    pub async fn line_text(&self, line: usize) -> Option<String> {
        self.state.read().await.line_text(line)
    }

    /// Applies changes to the document, returning the updated text.
    pub async fn apply(
        &self,
        changes: Vec<TextDocumentContentChangeEvent>,
        version: i32
    ) -> Result<String, String> {
        let mut state = self.state.write().await;
        state.apply(changes, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_lsp::lsp_types::Range;

    /// Helper to create a test LspDocument.
    fn create_test_document(uri: &str, text: &str) -> Arc<LspDocument> {
        Arc::new(LspDocument::new(1, Url::parse(uri).unwrap(), text, 0))
    }

    fn ranged(start: (u32, u32), end: (u32, u32), text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: Some(Range {
                start: Position { line: start.0, character: start.1 },
                end: Position { line: end.0, character: end.1 },
            }),
            range_length: None,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_apply_full_change() {
        let doc = create_test_document("file:///notes.txt", "initial text");
        let changes = vec![TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "new text".to_string(),
        }];

        let result = doc.apply(changes, 1).await;
        assert_eq!(result.as_deref(), Ok("new text"), "Text should be updated");
        assert_eq!(doc.version().await, 1, "Version should be updated");
    }

    #[tokio::test]
    async fn test_apply_incremental_change() {
        let doc = create_test_document("file:///notes.txt", "hello world");
        let result = doc.apply(vec![ranged((0, 6), (0, 11), "there")], 1).await;
        assert_eq!(result.as_deref(), Ok("hello there"));
    }

    #[tokio::test]
    async fn test_apply_multiple_incremental() {
        let doc = create_test_document("file:///notes.txt", "hello world");
        let changes = vec![
            ranged((0, 6), (0, 11), "rust"),
            ranged((0, 0), (0, 5), "goodbye"),
        ];

        let result = doc.apply(changes, 1).await;
        assert_eq!(result.as_deref(), Ok("goodbye rust"));
    }

    #[tokio::test]
    async fn test_apply_multiline_insert() {
        let doc = create_test_document("file:///notes.txt", "first\nsecond\n");
        let result = doc.apply(vec![ranged((1, 0), (1, 0), "see @")], 1).await;
        assert_eq!(result.as_deref(), Ok("first\nsee @second\n"));
        assert_eq!(doc.line_text(1).await.as_deref(), Some("see @second"));
    }

    #[tokio::test]
    async fn test_apply_utf16_columns() {
        // 😀 occupies two UTF-16 code units
        let doc = create_test_document("file:///notes.txt", "a😀b");
        let result = doc.apply(vec![ranged((0, 3), (0, 4), "c")], 1).await;
        assert_eq!(result.as_deref(), Ok("a😀c"));
    }

    #[tokio::test]
    async fn test_stale_version_rejected() {
        let doc = create_test_document("file:///notes.txt", "text");
        assert!(doc.apply(vec![ranged((0, 0), (0, 0), "x")], 0).await.is_err());
        assert_eq!(doc.text().await, "text");
    }

    #[tokio::test]
    async fn test_line_text_strips_terminators() {
        let doc = create_test_document("file:///notes.txt", "one\r\ntwo");
        assert_eq!(doc.line_text(0).await.as_deref(), Some("one"));
        assert_eq!(doc.line_text(1).await.as_deref(), Some("two"));
        assert_eq!(doc.line_text(2).await, None);
    }

    #[test]
    fn test_utf16_to_char_offset() {
        assert_eq!(utf16_to_char_offset("@util", 5), Some(5));
        assert_eq!(utf16_to_char_offset("@util", 0), Some(0));
        assert_eq!(utf16_to_char_offset("😀@u", 3), Some(2));
        assert_eq!(utf16_to_char_offset("😀@u", 4), Some(3));
        assert_eq!(utf16_to_char_offset("@u", 3), None);
    }
}
