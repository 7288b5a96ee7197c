/// Lines to keep between a newly selected fire and the top of the viewport.
pub const SELECTION_MARGIN: usize = 3;

/// A flagged match marker inside a report. Fires start active and are
/// cleared when the reviewer resolves them (ignore, declassify, or a new
/// pattern covering the match).
#[derive(Debug, Clone)]
pub struct Fire {
    /// File container the fire lives in
    pub file_id: i64,
    /// 1-based line number within the file
    pub line: usize,
    /// Match hash shared by every line of the same match group
    pub hash: String,
    /// Snippet identity, when the match came from a snippet
    pub snippet_id: Option<i64>,
    pub active: bool,
}

/// Ordered fire list plus a forward-only cursor. Owned by the report view;
/// consumers hold a reference rather than looking it up globally.
#[derive(Debug, Default)]
pub struct NavigatorState {
    fires: Vec<Fire>,
    /// Index of the last visited fire; None = before first
    cursor: Option<usize>,
    /// The single fire holding the current-selection designation
    current: Option<usize>,
}

impl NavigatorState {
    pub fn new(fires: Vec<Fire>) -> Self {
        NavigatorState {
            fires,
            cursor: None,
            current: None,
        }
    }

    pub fn fires(&self) -> &[Fire] {
        &self.fires
    }

    pub fn current(&self) -> Option<&Fire> {
        self.current.and_then(|i| self.fires.get(i))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Whether a fire at (file, line) is the current selection
    pub fn is_current(&self, file_id: i64, line: usize) -> bool {
        self.current()
            .map(|f| f.file_id == file_id && f.line == line)
            .unwrap_or(false)
    }

    /// Count of still-active fires
    pub fn active_count(&self) -> usize {
        self.fires.iter().filter(|f| f.active).count()
    }

    /// Move the selection to the next active fire. The previous selection is
    /// cleared first; cleared fires are skipped. Returns the newly selected
    /// fire, or None when no active fire remains at or after the cursor (the
    /// call is then a no-op apart from dropping the old selection).
    pub fn advance(&mut self) -> Option<&Fire> {
        self.current = None;
        let start = self.cursor.map(|c| c + 1).unwrap_or(0);
        for i in start..self.fires.len() {
            self.cursor = Some(i);
            if self.fires[i].active {
                self.current = Some(i);
                return self.fires.get(i);
            }
        }
        None
    }

    /// Clear a single fire. Idempotent. If the cleared fire was the current
    /// selection, advances so the reviewer's position keeps moving forward.
    pub fn clear(&mut self, index: usize) {
        let was_current = self.current == Some(index);
        if let Some(fire) = self.fires.get_mut(index) {
            fire.active = false;
        }
        if was_current {
            self.advance();
        }
    }

    /// Clear every fire sharing a match hash. Advances first when the
    /// current selection is part of the group, mirroring the single-fire
    /// semantics.
    pub fn clear_hash(&mut self, hash: &str) {
        let current_in_group = self
            .current()
            .map(|f| f.hash == hash)
            .unwrap_or(false);
        for fire in &mut self.fires {
            if fire.hash == hash {
                fire.active = false;
            }
        }
        if current_in_group {
            self.current = None;
            self.advance();
        }
    }

    /// Scroll target for a selected fire: its line positioned near the top,
    /// minus a fixed margin so it is not flush against the viewport edge.
    pub fn scroll_target(line: usize) -> usize {
        line.saturating_sub(SELECTION_MARGIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_fires(entries: &[(i64, usize, &str, bool)]) -> Vec<Fire> {
        entries.iter()
            .map(|&(file_id, line, hash, active)| Fire {
                file_id,
                line,
                hash: hash.to_string(),
                snippet_id: None,
                active,
            })
            .collect()
    }

    #[test]
    fn advance_visits_active_fires_in_order() {
        let mut nav = NavigatorState::new(make_fires(&[
            (1, 10, "a", true),
            (1, 20, "b", false),
            (1, 30, "c", true),
            (2, 5, "d", true),
        ]));
        let visited: Vec<usize> = std::iter::from_fn(|| nav.advance().map(|f| f.line))
            .collect();
        assert_eq!(visited, vec![10, 30, 5]);
    }

    #[test]
    fn advance_past_end_is_noop() {
        let mut nav = NavigatorState::new(make_fires(&[(1, 10, "a", true)]));
        assert!(nav.advance().is_some());
        assert!(nav.advance().is_none());
        assert!(nav.current().is_none());
        // Cursor never decreases — repeated calls stay a no-op
        assert!(nav.advance().is_none());
    }

    #[test]
    fn advance_on_all_cleared_selects_nothing() {
        let mut nav = NavigatorState::new(make_fires(&[(1, 10, "a", false), (1, 20, "b", false)]));
        assert!(nav.advance().is_none());
        assert!(nav.current().is_none());
    }

    #[test]
    fn exactly_one_current_selection() {
        let mut nav = NavigatorState::new(make_fires(&[(1, 10, "a", true), (1, 20, "b", true)]));
        nav.advance();
        assert!(nav.is_current(1, 10));
        nav.advance();
        assert!(!nav.is_current(1, 10));
        assert!(nav.is_current(1, 20));
    }

    #[test]
    fn clearing_current_advances_automatically() {
        let mut nav = NavigatorState::new(make_fires(&[(1, 10, "a", true), (1, 20, "b", true)]));
        nav.advance();
        let idx = nav.current_index().unwrap();
        nav.clear(idx);
        assert!(nav.is_current(1, 20));
    }

    #[test]
    fn clearing_non_current_keeps_selection() {
        let mut nav = NavigatorState::new(make_fires(&[(1, 10, "a", true), (1, 20, "b", true)]));
        nav.advance();
        nav.clear(1);
        assert!(nav.is_current(1, 10));
        // The cleared fire is skipped later
        assert!(nav.advance().is_none());
    }

    #[test]
    fn clear_is_idempotent() {
        let mut nav = NavigatorState::new(make_fires(&[(1, 10, "a", true), (1, 20, "b", true)]));
        nav.advance();
        nav.clear(0);
        nav.clear(0);
        assert!(nav.is_current(1, 20));
        assert_eq!(nav.active_count(), 1);
    }

    #[test]
    fn clear_hash_clears_whole_group_and_advances() {
        let mut nav = NavigatorState::new(make_fires(&[
            (1, 10, "aa", true),
            (1, 12, "aa", true),
            (1, 30, "bb", true),
        ]));
        nav.advance();
        nav.clear_hash("aa");
        assert_eq!(nav.active_count(), 1);
        assert!(nav.is_current(1, 30));
    }

    #[test]
    fn scroll_target_subtracts_margin() {
        assert_eq!(NavigatorState::scroll_target(50), 50 - SELECTION_MARGIN);
        assert_eq!(NavigatorState::scroll_target(1), 0);
    }
}
