//! Source metadata captured while parsing one lexical unit.

use crate::value::SledType;

/// Where a lexical unit sits in the normalized source, and what it parsed to.
///
/// Offsets are character indices into the normalized text. `end_index` is
/// exclusive. `sled_type` is `None` while the type is still pending, for
/// example while a map key is being parsed before its kind is checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParseSnapshot {
    pub start_index: usize,
    pub end_index: usize,
    pub line_start: usize,
    pub line_num: usize,
    pub sled_type: Option<SledType>,
}

impl ParseSnapshot {
    /// Starts a snapshot at `start_index` with an empty span and a pending type.
    #[must_use]
    pub const fn pending(start_index: usize, line_start: usize, line_num: usize) -> Self {
        ParseSnapshot {
            start_index,
            end_index: start_index,
            line_start,
            line_num,
            sled_type: None,
        }
    }

    /// 1-based column of the first character of the span.
    #[must_use]
    pub const fn column(&self) -> usize {
        self.start_index - self.line_start + 1
    }

    #[must_use]
    pub const fn finish(mut self, end_index: usize, sled_type: SledType) -> Self {
        self.end_index = end_index;
        self.sled_type = Some(sled_type);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_then_finish() {
        let snapshot = ParseSnapshot::pending(12, 10, 2);
        assert_eq!(snapshot.sled_type, None);
        assert_eq!(snapshot.column(), 3);

        let snapshot = snapshot.finish(15, SledType::String);
        assert_eq!(snapshot.end_index, 15);
        assert_eq!(snapshot.sled_type, Some(SledType::String));
        assert_eq!(snapshot.line_num, 2);
    }
}
