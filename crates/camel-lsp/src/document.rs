//! Document management for the LSP server.
//!
//! Tracks open documents and their content using rope data structures.
//! Changes replace the whole text, so readers always see a complete version.

use dashmap::DashMap;
use ropey::Rope;
use tower_lsp::lsp_types::{Position, Url};

/// A document being edited.
#[derive(Debug, Clone)]
pub struct Document {
    /// The document content as a rope.
    pub content: Rope,
    /// The document version.
    pub version: i32,
}

impl Document {
    /// Create a new document with the given content.
    pub fn new(content: &str, version: i32) -> Self {
        Self {
            content: Rope::from_str(content),
            version,
        }
    }

    /// Get the full text of the document.
    pub fn text(&self) -> String {
        self.content.to_string()
    }

    pub fn line_count(&self) -> usize {
        self.content.len_lines()
    }

    /// A line without its line break.
    pub fn line(&self, line: usize) -> Option<String> {
        if line >= self.content.len_lines() {
            return None;
        }
        let text = self.content.line(line).to_string();
        Some(text.trim_end_matches(['\n', '\r']).to_string())
    }

    /// Iterate over all lines, line breaks removed.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.content
            .lines()
            .map(|l| l.to_string().trim_end_matches(['\n', '\r']).to_string())
    }

    /// Position of a byte offset in the full text, clamped to the end.
    /// Columns count UTF-16 code units.
    pub fn byte_to_position(&self, offset: usize) -> Position {
        let offset = offset.min(self.content.len_bytes());
        let char_index = self.content.byte_to_char(offset);
        let line = self.content.char_to_line(char_index);
        let line_start = self.content.line_to_char(line);
        let character = self.content.char_to_utf16_cu(char_index) - self.content.char_to_utf16_cu(line_start);
        Position {
            line: line as u32,
            character: character as u32,
        }
    }
}

/// Document store for managing all open documents.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: DashMap<Url, Document>,
}

impl DocumentStore {
    /// Create a new document store.
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    /// Open a document.
    pub fn open(&self, uri: Url, content: &str, version: i32) {
        self.documents.insert(uri, Document::new(content, version));
    }

    /// Replace the text of an open document.
    pub fn update(&self, uri: &Url, content: &str, version: i32) {
        if let Some(mut doc) = self.documents.get_mut(uri) {
            *doc = Document::new(content, version);
        }
    }

    /// Close a document.
    pub fn close(&self, uri: &Url) {
        self.documents.remove(uri);
    }

    /// Get a snapshot of a document.
    pub fn get(&self, uri: &Url) -> Option<Document> {
        self.documents.get(uri).map(|doc| doc.clone())
    }

    /// URIs of all open documents.
    pub fn uris(&self) -> Vec<Url> {
        self.documents.iter().map(|entry| entry.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse(&format!("file:///tmp/{path}")).unwrap()
    }

    #[test]
    fn test_open_update_close() {
        let store = DocumentStore::new();
        let uri = url("a.xml");
        store.open(uri.clone(), "<from uri=\"timer:a\"/>", 1);
        store.update(&uri, "<to uri=\"log:a\"/>", 2);

        let doc = store.get(&uri).unwrap();
        assert_eq!(doc.version, 2);
        assert_eq!(doc.text(), "<to uri=\"log:a\"/>");
        assert_eq!(store.uris(), vec![uri.clone()]);

        store.close(&uri);
        assert!(store.get(&uri).is_none());
    }

    #[test]
    fn test_update_of_unknown_document_is_ignored() {
        let store = DocumentStore::new();
        store.update(&url("b.java"), "x", 1);
        assert!(store.uris().is_empty());
    }

    #[test]
    fn test_lines_strip_line_breaks() {
        let doc = Document::new("first\r\nsecond\nthird", 0);
        assert_eq!(doc.line(0).as_deref(), Some("first"));
        assert_eq!(doc.line(2).as_deref(), Some("third"));
        assert_eq!(doc.line(3), None);
        assert_eq!(doc.lines().count(), 3);
    }

    #[test]
    fn test_byte_to_position() {
        let doc = Document::new("ab\nc\u{e9}d", 0);
        assert_eq!(doc.byte_to_position(0), Position::new(0, 0));
        assert_eq!(doc.byte_to_position(3), Position::new(1, 0));
        // 'd' after the two-byte character
        assert_eq!(doc.byte_to_position(6), Position::new(1, 2));
        assert_eq!(doc.byte_to_position(100), Position::new(1, 3));

        let doc = Document::new("x\n\u{1f42a}to(\"log:a\")", 0);
        let quote = doc.text().find('"').unwrap();
        assert_eq!(doc.byte_to_position(quote), Position::new(1, 5));
    }
}
