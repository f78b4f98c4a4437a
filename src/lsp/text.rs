//! Document text helpers: position conversion and word extraction.
//!
//! LSP positions are 0-based (line, UTF-16 code unit) pairs while the index
//! works with byte offsets into the document.

use gibiane::Span;
use ropey::{Rope, RopeSlice};

/// Identifier characters for the purpose of picking the word under the cursor.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Line content without its trailing line break.
fn line_without_newline(rope: &Rope, line: usize) -> RopeSlice<'_> {
    let line_slice = rope.line(line);
    let mut end = line_slice.len_chars();
    while end > 0 && matches!(line_slice.char(end - 1), '\n' | '\r') {
        end -= 1;
    }
    line_slice.slice(..end)
}

pub fn position_from_offset(rope: &Rope, offset: usize) -> lsp_types::Position {
    let offset = offset.min(rope.len_bytes());
    let char_index = rope.byte_to_char(offset);
    let line = rope.char_to_line(char_index);
    let line_start_char = rope.line_to_char(line);
    let slice = line_without_newline(rope, line);
    let char_in_line = char_index
        .saturating_sub(line_start_char)
        .min(slice.len_chars());
    let utf16 = slice.char_to_utf16_cu(char_in_line);
    lsp_types::Position {
        line: line as u32,
        character: utf16 as u32,
    }
}

pub fn offset_from_position(rope: &Rope, position: lsp_types::Position) -> Option<usize> {
    let line = position.line as usize;
    if line >= rope.len_lines() {
        return None;
    }
    let line_start_char = rope.line_to_char(line);
    let slice = line_without_newline(rope, line);
    let utf16_offset = (position.character as usize).min(slice.len_utf16_cu());
    let char_offset = slice.utf16_cu_to_char(utf16_offset);
    Some(rope.char_to_byte(line_start_char + char_offset))
}

pub fn span_to_range(rope: &Rope, span: Span) -> lsp_types::Range {
    lsp_types::Range {
        start: position_from_offset(rope, span.start),
        end: position_from_offset(rope, span.end),
    }
}

/// The identifier touching the cursor at `offset`, with its byte span.
///
/// The cursor may sit anywhere inside the word or just after its last
/// character.
pub fn word_at(rope: &Rope, offset: usize) -> Option<(String, Span)> {
    let cursor = rope.byte_to_char(offset.min(rope.len_bytes()));

    let mut start = cursor;
    while start > 0 && is_word_char(rope.char(start - 1)) {
        start -= 1;
    }
    let mut end = cursor;
    while end < rope.len_chars() && is_word_char(rope.char(end)) {
        end += 1;
    }

    if start == end {
        return None;
    }
    let word = rope.slice(start..end).to_string();
    Some((word, Span::new(rope.char_to_byte(start), rope.char_to_byte(end))))
}

/// Apply one content change event to the document text.
pub fn apply_change(rope: &mut Rope, change: &lsp_types::TextDocumentContentChangeEvent) -> bool {
    let Some(range) = change.range else {
        *rope = Rope::from_str(&change.text);
        return true;
    };

    let (Some(start), Some(end)) = (
        offset_from_position(rope, range.start),
        offset_from_position(rope, range.end),
    ) else {
        return false;
    };
    let start_char = rope.byte_to_char(start);
    let end_char = rope.byte_to_char(end.max(start));
    rope.remove(start_char..end_char);
    rope.insert(start_char, &change.text);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsp_types::{Position, Range, TextDocumentContentChangeEvent};

    fn pos(line: u32, character: u32) -> Position {
        Position { line, character }
    }

    #[test]
    fn test_position_from_offset_simple() {
        let rope = Rope::from_str("hello\nworld");
        assert_eq!(position_from_offset(&rope, 0), pos(0, 0));
        assert_eq!(position_from_offset(&rope, 6), pos(1, 0));
        assert_eq!(position_from_offset(&rope, 10), pos(1, 4));
    }

    #[test]
    fn test_position_from_offset_clamped() {
        let rope = Rope::from_str("hello");
        assert_eq!(position_from_offset(&rope, 100), pos(0, 5));
    }

    #[test]
    fn test_offset_from_position_simple() {
        let rope = Rope::from_str("hello\nworld");
        assert_eq!(offset_from_position(&rope, pos(0, 0)), Some(0));
        assert_eq!(offset_from_position(&rope, pos(1, 0)), Some(6));
        assert_eq!(offset_from_position(&rope, pos(1, 4)), Some(10));
    }

    #[test]
    fn test_offset_from_position_invalid_line() {
        let rope = Rope::from_str("hello");
        assert_eq!(offset_from_position(&rope, pos(5, 0)), None);
    }

    #[test]
    fn test_offset_from_position_clamped_column() {
        let rope = Rope::from_str("hi\r\nworld");
        assert_eq!(offset_from_position(&rope, pos(0, 100)), Some(2));
    }

    #[test]
    fn test_utf16_columns() {
        // 'é' is 2 bytes in UTF-8 and 1 code unit in UTF-16.
        let rope = Rope::from_str("é = 1;");
        assert_eq!(offset_from_position(&rope, pos(0, 1)), Some(2));
        assert_eq!(position_from_offset(&rope, 2), pos(0, 1));
    }

    #[test]
    fn test_span_to_range_multiline() {
        let rope = Rope::from_str("hello\nworld");
        let range = span_to_range(&rope, Span::new(0, 11));
        assert_eq!(range.start, pos(0, 0));
        assert_eq!(range.end, pos(1, 5));
    }

    #[test]
    fn test_word_at_inside_and_after() {
        let rope = Rope::from_str("MAIL1 = SURF cont1;");
        assert_eq!(word_at(&rope, 2), Some(("MAIL1".to_string(), Span::new(0, 5))));
        assert_eq!(word_at(&rope, 5), Some(("MAIL1".to_string(), Span::new(0, 5))));
        assert_eq!(word_at(&rope, 13), Some(("cont1".to_string(), Span::new(13, 18))));
    }

    #[test]
    fn test_word_at_underscore() {
        let rope = Rope::from_str("x my_var;");
        assert_eq!(word_at(&rope, 4).map(|(w, _)| w).as_deref(), Some("my_var"));
    }

    #[test]
    fn test_word_at_nothing() {
        let rope = Rope::from_str("A = B ;");
        assert_eq!(word_at(&rope, 3), None);
        assert_eq!(word_at(&Rope::new(), 0), None);
    }

    #[test]
    fn test_apply_incremental_change() {
        let mut rope = Rope::from_str("N = 1;\nLIST N;");
        let change = TextDocumentContentChangeEvent {
            range: Some(Range {
                start: pos(1, 5),
                end: pos(1, 6),
            }),
            range_length: None,
            text: "M".to_string(),
        };
        assert!(apply_change(&mut rope, &change));
        assert_eq!(rope.to_string(), "N = 1;\nLIST M;");
    }

    #[test]
    fn test_apply_full_change() {
        let mut rope = Rope::from_str("old");
        let change = TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "new".to_string(),
        };
        assert!(apply_change(&mut rope, &change));
        assert_eq!(rope.to_string(), "new");
    }
}
