//! Translation between offsets inside an extracted string and document positions.
//!
//! Every string the dialect adapters pull out of a document (an endpoint URI,
//! a modeline) comes with an anchor: the document position of its first
//! character. Offsets inside the string are byte offsets; document positions
//! use line/character pairs with characters counted in UTF-16 code units. Strings may span several lines, for example an
//! XML attribute value wrapped by a formatter.

use tower_lsp::lsp_types::{Position, Range};

/// Map a byte offset inside `raw` to an absolute document position.
///
/// Offsets past the end of `raw` clamp to the end of the string, offsets
/// inside a multi-byte character snap back to its start.
pub fn to_absolute(anchor: Position, raw: &str, offset: usize) -> Position {
    let offset = floor_char_boundary(raw, offset);
    let prefix = &raw[..offset];

    match prefix.rfind('\n') {
        None => Position {
            line: anchor.line,
            character: anchor.character + utf16_len(prefix),
        },
        Some(last_newline) => Position {
            line: anchor.line + prefix.matches('\n').count() as u32,
            character: utf16_len(&prefix[last_newline + 1..]),
        },
    }
}

/// Map a pair of byte offsets inside `raw` to an absolute range.
pub fn to_range(anchor: Position, raw: &str, start: usize, end: usize) -> Range {
    Range {
        start: to_absolute(anchor, raw, start),
        end: to_absolute(anchor, raw, end),
    }
}

/// Inverse of [`to_absolute`]: the byte offset inside `raw` for a document
/// position, or `None` when the position is outside the string.
///
/// The position one past the last character is considered inside, which is
/// where completion is requested while typing at the end of a literal.
pub fn to_relative(anchor: Position, raw: &str, position: Position) -> Option<usize> {
    if position.line < anchor.line
        || (position.line == anchor.line && position.character < anchor.character)
    {
        return None;
    }

    let mut line = anchor.line;
    let mut character = anchor.character;
    for (offset, c) in raw.char_indices() {
        // a column inside a surrogate pair snaps to the next character
        if line == position.line && character >= position.character {
            return Some(offset);
        }
        if c == '\n' {
            line += 1;
            character = 0;
        } else {
            character += c.len_utf16() as u32;
        }
    }

    (line == position.line && character == position.character).then_some(raw.len())
}

/// Byte offset of the UTF-16 column `column` in a single line.
pub fn column_to_byte(line: &str, column: u32) -> usize {
    let mut units = 0;
    for (offset, c) in line.char_indices() {
        if units >= column {
            return offset;
        }
        units += c.len_utf16() as u32;
    }
    line.len()
}

/// UTF-16 column of the byte offset `offset` in a single line.
pub fn byte_to_column(line: &str, offset: usize) -> u32 {
    let offset = floor_char_boundary(line, offset);
    utf16_len(&line[..offset])
}

/// Length of `s` in UTF-16 code units.
pub fn utf16_len(s: &str) -> u32 {
    s.encode_utf16().count() as u32
}

/// Clamp `offset` to `s` and move it back onto a character boundary.
pub fn floor_char_boundary(s: &str, offset: usize) -> usize {
    let mut offset = offset.min(s.len());
    while !s.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Range of the byte span `start..end` of line `line_no`.
pub fn line_range(line_no: u32, line: &str, start: usize, end: usize) -> Range {
    Range::new(
        Position::new(line_no, byte_to_column(line, start)),
        Position::new(line_no, byte_to_column(line, end.max(start))),
    )
}

/// Whether `position` lies within `range`, both ends included.
pub fn range_contains(range: &Range, position: Position) -> bool {
    let after_start = position.line > range.start.line
        || (position.line == range.start.line && position.character >= range.start.character);
    let before_end = position.line < range.end.line
        || (position.line == range.end.line && position.character <= range.end.character);
    after_start && before_end
}
