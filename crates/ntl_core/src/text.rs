//! Line-indexed access to source text.
//!
//! Diagnostic rendering needs "the line the error is on plus two lines of
//! context"; this type does the splitting once so every diagnostic for the
//! same file shares the index.

/// Source text split into lines for excerpt rendering.
pub struct SourceText<'s> {
    text: &'s str,
    lines: Vec<&'s str>,
}

impl<'s> SourceText<'s> {
    pub fn new(text: &'s str) -> Self {
        // split('\n') keeps a trailing empty line for text ending in '\n',
        // which matches how editors number lines.
        let lines = text.split('\n').map(|l| l.trim_end_matches('\r')).collect();
        Self { text, lines }
    }

    /// The full source text.
    #[inline]
    pub fn text(&self) -> &'s str {
        self.text
    }

    /// Number of lines in the source.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// A single line by 1-based number.
    pub fn line(&self, number: u32) -> Option<&'s str> {
        if number == 0 {
            return None;
        }
        self.lines.get(number as usize - 1).copied()
    }

    /// Lines around `center` (1-based), `context` lines on each side.
    /// Returns `(line number, line text)` pairs in order.
    pub fn excerpt(&self, center: u32, context: u32) -> Vec<(u32, &'s str)> {
        let first = center.saturating_sub(context).max(1);
        let last = (center + context).min(self.line_count() as u32);
        (first..=last)
            .filter_map(|n| self.line(n).map(|l| (n, l)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_one_based() {
        let text = SourceText::new("a\nb\nc");
        assert_eq!(text.line(1), Some("a"));
        assert_eq!(text.line(3), Some("c"));
        assert_eq!(text.line(0), None);
        assert_eq!(text.line(4), None);
    }

    #[test]
    fn crlf_is_stripped() {
        let text = SourceText::new("a\r\nb\r\n");
        assert_eq!(text.line(1), Some("a"));
        assert_eq!(text.line(2), Some("b"));
    }

    #[test]
    fn excerpt_clamps_at_file_edges() {
        let text = SourceText::new("one\ntwo\nthree\nfour");
        let around_start = text.excerpt(1, 2);
        assert_eq!(around_start, vec![(1, "one"), (2, "two"), (3, "three")]);
        let around_end = text.excerpt(4, 2);
        assert_eq!(around_end, vec![(2, "two"), (3, "three"), (4, "four")]);
    }
}
