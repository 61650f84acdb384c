//! Byte offset to line/column mapping

/// Line start table for one source text
///
/// Lines and columns are 1-based; columns count characters, not bytes.
#[derive(Debug, Clone, Default)]
pub struct LineIndex {
    starts: Vec<usize>,
    text: String,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                starts.push(i + 1);
            }
        }
        Self {
            starts,
            text: source.to_string(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// 1-based line and column of a byte offset
    ///
    /// Offsets past the end clamp to the end of the text.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.text.len());
        let line = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let start = self.starts[line];
        let column = self.text[start..]
            .char_indices()
            .take_while(|(i, _)| start + i < offset)
            .count();
        (line + 1, column + 1)
    }

    /// Byte offset of a 1-based line and column
    pub fn offset(&self, line: usize, column: usize) -> Option<usize> {
        let start = *self.starts.get(line.checked_sub(1)?)?;
        let end = self
            .starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        let wanted = column.checked_sub(1)?;
        let mut chars = self.text[start..end].char_indices();
        for _ in 0..wanted {
            chars.next()?;
        }
        Some(
            chars
                .next()
                .map(|(i, _)| start + i)
                .unwrap_or(end),
        )
    }

    /// Text of a 1-based line without its terminator
    pub fn line_text(&self, line: usize) -> Option<&str> {
        let start = *self.starts.get(line.checked_sub(1)?)?;
        let end = self
            .starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        self.text
            .get(start..end)
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let index = LineIndex::new("ab\ncd\n\nef");
        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.line_col(2), (1, 3));
        assert_eq!(index.line_col(3), (2, 1));
        assert_eq!(index.line_col(7), (4, 1));
        assert_eq!(index.line_col(100), (4, 3));
    }

    #[test]
    fn test_offset_round_trip() {
        let source = "const a = 1;\n  source.pipe(x);\r\nλ.y\n";
        let index = LineIndex::new(source);
        for (offset, _) in source.char_indices() {
            let (line, col) = index.line_col(offset);
            assert_eq!(index.offset(line, col), Some(offset), "offset {}", offset);
        }
    }

    #[test]
    fn test_columns_count_characters() {
        let index = LineIndex::new("λx");
        assert_eq!(index.line_col(2), (1, 2));
    }

    #[test]
    fn test_line_text() {
        let index = LineIndex::new("one\r\ntwo\nthree");
        assert_eq!(index.line_text(1), Some("one"));
        assert_eq!(index.line_text(2), Some("two"));
        assert_eq!(index.line_text(3), Some("three"));
        assert_eq!(index.line_text(4), None);
        assert_eq!(index.line_text(0), None);
    }
}
