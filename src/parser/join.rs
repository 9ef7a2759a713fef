//! Backslash continuation joining.
//!
//! A physical line ending in `\` is glued to the next one, with the marker
//! removed. Output is one logical line per statement, tagged with the
//! physical line number it started on.

/// A joined line and the 1-based number of its first physical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    pub line_no: usize,
    pub text: String,
}

/// Lazily join continuation lines from `lines`.
pub fn logical_lines<'a, I>(lines: I) -> LogicalLines<I::IntoIter>
where
    I: IntoIterator<Item = &'a str>,
{
    LogicalLines {
        inner: lines.into_iter(),
        line_no: 0,
    }
}

pub struct LogicalLines<I> {
    inner: I,
    line_no: usize,
}

impl<'a, I> Iterator for LogicalLines<I>
where
    I: Iterator<Item = &'a str>,
{
    type Item = LogicalLine;

    fn next(&mut self) -> Option<LogicalLine> {
        let mut acc: Option<LogicalLine> = None;

        for raw in self.inner.by_ref() {
            self.line_no += 1;
            let raw = raw.strip_suffix('\r').unwrap_or(raw);
            let (part, continued) = match raw.trim_end().strip_suffix('\\') {
                Some(head) => (head, true),
                None => (raw, false),
            };

            let line_no = self.line_no;
            let logical = acc.get_or_insert_with(|| LogicalLine {
                line_no,
                text: String::new(),
            });
            logical.text.push_str(part);

            if !continued {
                return acc;
            }
        }

        // Dangling continuation on the last line
        acc
    }
}
