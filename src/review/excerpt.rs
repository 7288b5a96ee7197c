/// Oversized increment for "extend to bottom" — the server clamps the end
/// to the actual file length.
pub const BOTTOM_CHUNK: usize = 3000;

/// Named boundary-extension actions on a displayed source excerpt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendAction {
    OneLineAbove,
    OneLineBelow,
    Top,
    Bottom,
    MatchAbove,
    MatchBelow,
}

/// Start/end of the neighbouring detected matches, supplied out-of-band as
/// data attributes on the excerpt's action bar.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchContext {
    pub prev_match: Option<usize>,
    pub next_match: Option<usize>,
}

/// A displayed source excerpt: a file identity plus a [start, end) line
/// range, re-fetched whenever the range changes. The file identity never
/// changes across extensions.
#[derive(Debug, Clone)]
pub struct SourceExcerpt {
    pub file_id: i64,
    pub start: usize,
    pub end: usize,
    /// Rendered source lines for the current range (opaque server markup)
    pub lines: Vec<String>,
    /// Request id of the newest fetch issued for this excerpt. Responses
    /// tagged with an older id are stale and must be discarded.
    latest_seq: u64,
}

impl SourceExcerpt {
    pub fn new(file_id: i64, start: usize, end: usize) -> Self {
        SourceExcerpt {
            file_id,
            start: start.max(1),
            end,
            lines: Vec::new(),
            latest_seq: 0,
        }
    }

    /// Compute the range an action would request, from the currently
    /// displayed bounds. Does not mutate — the displayed range only changes
    /// when the fetched excerpt arrives. `start` never drops below 1; `end`
    /// has no enforced upper bound.
    pub fn extend(&self, action: ExtendAction, ctx: MatchContext) -> (usize, usize) {
        let (mut start, mut end) = (self.start, self.end);
        match action {
            ExtendAction::OneLineAbove => start = start.saturating_sub(1).max(1),
            ExtendAction::OneLineBelow => end += 1,
            ExtendAction::Top => start = 1,
            ExtendAction::Bottom => end += BOTTOM_CHUNK,
            ExtendAction::MatchAbove => {
                if let Some(prev) = ctx.prev_match {
                    start = prev.max(1);
                }
            }
            ExtendAction::MatchBelow => {
                if let Some(next) = ctx.next_match {
                    end = next;
                }
            }
        }
        (start, end)
    }

    /// Tag an outgoing fetch with the next request id.
    pub fn begin_fetch(&mut self, seq: u64) {
        self.latest_seq = seq;
    }

    /// Apply a fetched excerpt. Returns false (and changes nothing) when the
    /// response is stale — an older request answered after a newer one.
    pub fn apply_fetch(&mut self, seq: u64, start: usize, end: usize, lines: Vec<String>) -> bool {
        if seq < self.latest_seq {
            return false;
        }
        self.start = start.max(1);
        self.end = end;
        self.lines = lines;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_line_above_and_below() {
        let ex = SourceExcerpt::new(5, 10, 20);
        assert_eq!(ex.extend(ExtendAction::OneLineAbove, MatchContext::default()), (9, 20));
        assert_eq!(ex.extend(ExtendAction::OneLineBelow, MatchContext::default()), (10, 21));
    }

    #[test]
    fn above_then_below_widens_both_ends() {
        let mut ex = SourceExcerpt::new(5, 10, 20);
        let (s, e) = ex.extend(ExtendAction::OneLineAbove, MatchContext::default());
        ex.begin_fetch(1);
        assert!(ex.apply_fetch(1, s, e, Vec::new()));
        let (s, e) = ex.extend(ExtendAction::OneLineBelow, MatchContext::default());
        assert_eq!((s, e), (9, 21));
    }

    #[test]
    fn top_resets_start_to_one() {
        let ex = SourceExcerpt::new(5, 42, 50);
        assert_eq!(ex.extend(ExtendAction::Top, MatchContext::default()), (1, 50));
    }

    #[test]
    fn bottom_strictly_increases_end() {
        let ex = SourceExcerpt::new(5, 10, 20);
        let (_, end) = ex.extend(ExtendAction::Bottom, MatchContext::default());
        assert!(end > 20);
        assert_eq!(end, 20 + BOTTOM_CHUNK);
    }

    #[test]
    fn start_never_drops_below_one() {
        let ex = SourceExcerpt::new(5, 1, 20);
        assert_eq!(ex.extend(ExtendAction::OneLineAbove, MatchContext::default()), (1, 20));
    }

    #[test]
    fn match_bounds_come_from_context() {
        let ex = SourceExcerpt::new(5, 10, 20);
        let ctx = MatchContext { prev_match: Some(3), next_match: Some(55) };
        assert_eq!(ex.extend(ExtendAction::MatchAbove, ctx), (3, 20));
        assert_eq!(ex.extend(ExtendAction::MatchBelow, ctx), (10, 55));
    }

    #[test]
    fn missing_match_context_is_noop() {
        let ex = SourceExcerpt::new(5, 10, 20);
        assert_eq!(ex.extend(ExtendAction::MatchAbove, MatchContext::default()), (10, 20));
        assert_eq!(ex.extend(ExtendAction::MatchBelow, MatchContext::default()), (10, 20));
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut ex = SourceExcerpt::new(5, 10, 20);
        ex.begin_fetch(1);
        ex.begin_fetch(2);
        // Slow response from request 1 arrives after request 2 was issued
        assert!(!ex.apply_fetch(1, 1, 20, vec!["old".into()]));
        assert_eq!((ex.start, ex.end), (10, 20));
        assert!(ex.apply_fetch(2, 10, 21, vec!["new".into()]));
        assert_eq!((ex.start, ex.end), (10, 21));
    }

    #[test]
    fn file_identity_survives_fetches() {
        let mut ex = SourceExcerpt::new(5, 10, 20);
        ex.begin_fetch(1);
        ex.apply_fetch(1, 1, 3020, Vec::new());
        assert_eq!(ex.file_id, 5);
    }
}
