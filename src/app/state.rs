use crate::api::{failure_message, ApiClient, Poller, ReviewRecord};
use crate::config::LcrConfig;
use crate::report::{parse_source_lines, DetailToggle, ReportDoc, ReviewTable, TableConfig};
use crate::review::{
    build_draft, collect_pattern_text, ExtendAction, FlagSet, MatchContext, NavigatorState,
    PatternDraft, SourceExcerpt,
};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::mpsc;
use std::time::Duration;

/// JSON endpoint for the open-reviews table.
const OPEN_REVIEWS: &str = "/reviews/list_open";

// ── Enums ──

/// Which screen we're on
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum View {
    Report,
    Table,
}

/// Whether we're navigating or typing in a dialog
#[derive(Debug, Clone, PartialEq)]
pub enum InputMode {
    Normal,
    Pattern,
    Glob,
}

/// What to do after a pattern was accepted by the server
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Continuation {
    /// Clear the originating match group and move to the next one
    Continue,
    /// Kick off a reindex job and reload the report once it finishes
    Reindex,
}

// ── Dialog state ──

/// State of the pattern-creation dialog. Focus walks license, then one
/// entry per flag checkbox, then the local-only toggle.
#[derive(Debug, Clone)]
pub struct PatternForm {
    pub license: String,
    flag_set: FlagSet,
    /// Checkbox per flag name in the configured set
    pub flags: Vec<(String, bool)>,
    /// Only match within this package
    pub local_only: bool,
    /// Collected match text the pattern is built from
    pub text: String,
    /// Hash of the originating match group
    pub hash: String,
    pub focus: usize,
}

impl PatternForm {
    pub fn new(flag_set: FlagSet, text: String, hash: String) -> Self {
        PatternForm {
            license: String::new(),
            flag_set,
            flags: flag_set
                .names()
                .iter()
                .map(|name| (name.to_string(), false))
                .collect(),
            local_only: false,
            text,
            hash,
            focus: 0,
        }
    }

    fn field_count(&self) -> usize {
        self.flags.len() + 2
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.field_count();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + self.field_count() - 1) % self.field_count();
    }

    pub fn license_focused(&self) -> bool {
        self.focus == 0
    }

    /// Toggle the focused checkbox; a no-op when the license field has focus.
    pub fn toggle_focused(&mut self) {
        if self.focus == 0 {
            return;
        }
        if self.focus <= self.flags.len() {
            let flag = &mut self.flags[self.focus - 1];
            flag.1 = !flag.1;
        } else {
            self.local_only = !self.local_only;
        }
    }

    /// Build the submission from the current form state.
    pub fn draft(&self, packname: &str) -> PatternDraft {
        let checked: HashMap<String, bool> = self.flags.iter().cloned().collect();
        build_draft(
            &self.license,
            &self.text,
            self.flag_set,
            &checked,
            self.local_only,
            packname,
            &self.hash,
        )
    }
}

// ── Worker events ──

/// Messages sent from background workers to the event loop. Errors arrive
/// pre-mapped to their reviewer-facing text.
#[derive(Debug)]
pub enum AppEvent {
    ReportLoaded(Result<String, String>),
    /// The report endpoint answered after a reindex poll
    ReportReady(String),
    ExcerptLoaded {
        file_id: i64,
        seq: u64,
        start: usize,
        end: usize,
        result: Result<String, String>,
    },
    DetailLoaded {
        id: i64,
        result: Result<String, String>,
    },
    PatternCreated {
        continuation: Continuation,
        hash: String,
        result: Result<String, String>,
    },
    ReindexTriggered(Result<(), String>),
    IgnoreAdded {
        hash: String,
        result: Result<(), String>,
    },
    SnippetMarked {
        hash: Option<String>,
        result: Result<(), String>,
    },
    GlobAdded(Result<(), String>),
    ReviewsLoaded(Result<Vec<ReviewRecord>, String>),
}

// ── App ──

/// Top-level application state
pub struct App {
    pub config: LcrConfig,
    pub client: ApiClient,
    tx: mpsc::Sender<AppEvent>,

    pub view: View,
    pub input_mode: InputMode,
    pub should_quit: bool,

    /// Package under review (report view)
    pub package_id: i64,

    /// Parsed report fragment (None until the first load completes)
    pub report: Option<ReportDoc>,

    /// Match navigation over the report's fires
    pub navigator: NavigatorState,

    /// Per-file excerpt ranges with their fetch sequencing
    pub excerpts: HashMap<i64, SourceExcerpt>,

    /// Monotonic sequence shared by all excerpt fetches
    next_seq: u64,

    /// Vertical scroll offset within the source view
    pub source_scroll: u16,

    /// Open-reviews table (table view)
    pub table: ReviewTable,
    pub table_loaded: bool,

    /// Pattern dialog (Some while open)
    pub pattern_form: Option<PatternForm>,

    /// Text buffer for the glob prompt
    pub glob_input: String,

    /// Reindex in flight; the action stays disabled until the report reloads
    pub reindex_pending: bool,

    /// Poll against the report endpoint while a reindex runs
    report_poll: Option<Poller>,

    /// Last transient notification
    pub status_message: Option<String>,
    status_ticks: u8,
}

impl App {
    pub fn new(
        config: LcrConfig,
        package_id: Option<i64>,
        tx: mpsc::Sender<AppEvent>,
    ) -> Result<Self> {
        let client = ApiClient::new(
            &config.server.url,
            Duration::from_secs(config.server.timeout_secs),
        )?;
        let view = if package_id.is_some() {
            View::Report
        } else {
            View::Table
        };
        let table_config = TableConfig {
            show_link: true,
            show_package: true,
            show_state: true,
            ..Default::default()
        };
        Ok(App {
            config,
            client,
            tx,
            view,
            input_mode: InputMode::Normal,
            should_quit: false,
            package_id: package_id.unwrap_or(0),
            report: None,
            navigator: NavigatorState::new(Vec::new()),
            excerpts: HashMap::new(),
            next_seq: 0,
            source_scroll: 0,
            table: ReviewTable::new(&table_config),
            table_loaded: false,
            pattern_form: None,
            glob_input: String::new(),
            reindex_pending: false,
            report_poll: None,
            status_message: None,
            status_ticks: 0,
        })
    }

    /// Flag set for the pattern dialog, from config; unknown names fall back
    /// to the full set.
    pub fn flag_set(&self) -> FlagSet {
        FlagSet::from_name(&self.config.pattern.variant).unwrap_or(FlagSet::Full)
    }

    /// Package name for scoped server actions (ignore, glob, pattern). The
    /// report markup carries it; the numeric id stands in until a report has
    /// been parsed.
    pub fn package_name(&self) -> String {
        self.report
            .as_ref()
            .and_then(|r| r.package_name.clone())
            .unwrap_or_else(|| self.package_id.to_string())
    }

    /// Poll pacing for background retries.
    fn poll_delay(&self) -> Duration {
        Duration::from_millis(self.config.poll.delay_ms)
    }

    // ── Notifications ──

    pub fn notify(&mut self, msg: &str) {
        self.status_message = Some(msg.to_string());
        self.status_ticks = 0;
    }

    /// Tick called on every event loop iteration — used for notification auto-clear
    pub fn tick(&mut self) {
        if self.status_message.is_some() {
            self.status_ticks += 1;
            if self.status_ticks > 20 {
                self.status_message = None;
                self.status_ticks = 0;
            }
        }
    }

    // ── Workers ──

    /// Run one request on a background thread and report back as an event.
    fn spawn_request<T, F, W>(&self, fetch: F, wrap: W)
    where
        T: Send + 'static,
        F: FnOnce(&ApiClient) -> Result<T> + Send + 'static,
        W: FnOnce(Result<T, String>) -> AppEvent + Send + 'static,
    {
        let client = self.client.clone();
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let result = fetch(&client).map_err(|err| failure_message(&err));
            let _ = tx.send(wrap(result));
        });
    }

    // ── Report loading ──

    /// Fetch the report fragment for the current package.
    pub fn load_report(&mut self) {
        let package_id = self.package_id;
        self.spawn_request(
            move |client| client.fetch_report(package_id),
            AppEvent::ReportLoaded,
        );
    }

    /// Replace the report with a freshly fetched fragment and select the
    /// first open match.
    fn apply_report(&mut self, body: &str) {
        let doc = ReportDoc::parse(body);
        self.navigator = NavigatorState::new(doc.fires());
        self.excerpts.clear();
        self.report = Some(doc);
        self.source_scroll = 0;
        self.advance();
    }

    // ── Match navigation ──

    /// Select the next open match and scroll it into view.
    pub fn advance(&mut self) {
        if let Some(fire) = self.navigator.advance() {
            let file_id = fire.file_id;
            let line = fire.line;
            self.scroll_to(file_id, line);
        }
    }

    /// Scroll so the given source line sits near the top, margin above.
    fn scroll_to(&mut self, file_id: i64, line: usize) {
        if let Some(offset) = self.flat_offset(file_id, line) {
            self.source_scroll = NavigatorState::scroll_target(offset) as u16;
        }
    }

    /// Flattened display row of a source line, counting one header row per
    /// container and the lines of expanded containers above it.
    fn flat_offset(&self, file_id: i64, line: usize) -> Option<usize> {
        let report = self.report.as_ref()?;
        let mut offset = 0usize;
        for container in &report.files {
            offset += 1;
            if container.file_id == file_id {
                let pos = container.lines.iter().position(|l| l.number == line)?;
                return Some(offset + pos);
            }
            if !container.collapsed {
                offset += container.lines.len();
            }
        }
        None
    }

    // ── Ignore / declassify ──

    /// Ignore every line of the current match group.
    pub fn ignore_current(&mut self) {
        let Some(fire) = self.navigator.current() else {
            self.notify("No match selected");
            return;
        };
        let hash = fire.hash.clone();
        let package = self.package_name();
        let sent_hash = hash.clone();
        self.spawn_request(
            move |client| client.add_ignore(&hash, &package),
            move |result| AppEvent::IgnoreAdded {
                hash: sent_hash,
                result,
            },
        );
    }

    /// Mark the current snippet as non-license text.
    pub fn declassify_current(&mut self) {
        let Some(fire) = self.navigator.current() else {
            self.notify("No match selected");
            return;
        };
        let Some(snippet_id) = fire.snippet_id else {
            self.notify("Selected match has no snippet");
            return;
        };
        let hash = (!fire.hash.is_empty()).then(|| fire.hash.clone());
        self.spawn_request(
            move |client| client.snippet_decision(snippet_id),
            move |result| AppEvent::SnippetMarked { hash, result },
        );
    }

    /// Drop the match group locally and move on.
    fn clear_group(&mut self, hash: &str) {
        if let Some(report) = self.report.as_mut() {
            report.clear_risk(hash);
        }
        self.navigator.clear_hash(hash);
        if let Some(fire) = self.navigator.current() {
            let (file_id, line) = (fire.file_id, fire.line);
            self.scroll_to(file_id, line);
        }
    }

    // ── Excerpt extension ──

    /// Widen or narrow the current match's excerpt and re-fetch it.
    pub fn extend_excerpt(&mut self, action: ExtendAction) {
        let Some(fire) = self.navigator.current() else {
            self.notify("No match selected");
            return;
        };
        let file_id = fire.file_id;
        let Some(container) = self.report.as_ref().and_then(|r| r.file(file_id)) else {
            return;
        };
        let ctx = MatchContext {
            prev_match: container.prev_match,
            next_match: container.next_match,
        };
        let excerpt = self
            .excerpts
            .entry(file_id)
            .or_insert_with(|| SourceExcerpt::new(file_id, container.start, container.end));
        let (start, end) = excerpt.extend(action, ctx);
        self.fetch_excerpt(file_id, start, end);
    }

    /// Expand a collapsed file container by fetching its excerpt; collapse
    /// needs no fetch.
    pub fn toggle_container(&mut self, file_id: i64) {
        let Some(container) = self.report.as_mut().and_then(|r| r.file_mut(file_id)) else {
            return;
        };
        if !container.collapsed {
            container.collapsed = true;
            return;
        }
        let (start, end) = (container.start, container.end);
        self.excerpts
            .entry(file_id)
            .or_insert_with(|| SourceExcerpt::new(file_id, start, end));
        self.fetch_excerpt(file_id, start, end);
    }

    fn fetch_excerpt(&mut self, file_id: i64, start: usize, end: usize) {
        self.next_seq += 1;
        let seq = self.next_seq;
        if let Some(excerpt) = self.excerpts.get_mut(&file_id) {
            excerpt.begin_fetch(seq);
        }
        self.spawn_request(
            move |client| client.fetch_source(file_id, start, end),
            move |result| AppEvent::ExcerptLoaded {
                file_id,
                seq,
                start,
                end,
                result,
            },
        );
    }

    // ── Pattern workflow ──

    /// Open the pattern dialog seeded from the current match group.
    pub fn open_pattern_form(&mut self) {
        let Some(fire) = self.navigator.current() else {
            self.notify("No match selected");
            return;
        };
        let (file_id, snippet_id, hash) = (fire.file_id, fire.snippet_id, fire.hash.clone());
        let Some(report) = self.report.as_ref() else {
            return;
        };
        let text = collect_pattern_text(&report.fragments(file_id), snippet_id);
        if text.is_empty() {
            self.notify("Nothing to build a pattern from");
            return;
        }
        self.pattern_form = Some(PatternForm::new(self.flag_set(), text, hash));
        self.input_mode = InputMode::Pattern;
    }

    /// Submit the open pattern dialog. The dialog stays open on failure so
    /// the draft is not lost.
    pub fn submit_pattern(&mut self, continuation: Continuation) {
        let Some(form) = self.pattern_form.as_ref() else {
            return;
        };
        let draft = form.draft(&self.package_name());
        let hash = draft.hash.clone();
        self.spawn_request(
            move |client| client.create_pattern(&draft),
            move |result| AppEvent::PatternCreated {
                continuation,
                hash,
                result,
            },
        );
    }

    pub fn close_pattern_form(&mut self) {
        self.pattern_form = None;
        self.input_mode = InputMode::Normal;
    }

    // ── Reindex ──

    /// Whether the reindex action is currently available.
    pub fn can_reindex(&self) -> bool {
        self.report.is_some() && !self.reindex_pending
    }

    /// Kick off a reindex job for the current package.
    pub fn start_reindex(&mut self) {
        if !self.can_reindex() {
            self.notify("Reindex not available yet");
            return;
        }
        self.reindex_pending = true;
        let package_id = self.package_id;
        self.spawn_request(
            move |client| client.trigger_reindex(package_id),
            AppEvent::ReindexTriggered,
        );
    }

    /// Poll the report endpoint until it answers, then reload. Any failure
    /// retries after the configured delay; quitting cancels the poll.
    fn start_report_poll(&mut self) {
        let client = self.client.clone();
        let package_id = self.package_id;
        self.report_poll = Some(Poller::spawn(
            move || client.fetch_report(package_id),
            self.tx.clone(),
            AppEvent::ReportReady,
            self.poll_delay(),
            self.config.poll.attempt_cap(),
        ));
    }

    // ── Glob ──

    /// Prompt for an ignore glob, pre-filled with the current match's file
    /// name so it only needs editing into a pattern.
    pub fn open_glob_input(&mut self) {
        self.glob_input = self
            .navigator
            .current()
            .and_then(|fire| {
                let report = self.report.as_ref()?;
                report.file(fire.file_id).map(|f| f.name.clone())
            })
            .unwrap_or_default();
        self.input_mode = InputMode::Glob;
    }

    pub fn submit_glob(&mut self) {
        let glob = self.glob_input.trim().to_string();
        if glob.is_empty() {
            self.notify("Empty glob");
            return;
        }
        let package = self.package_name();
        self.spawn_request(
            move |client| client.add_glob(&glob, &package),
            AppEvent::GlobAdded,
        );
        self.glob_input.clear();
        self.input_mode = InputMode::Normal;
    }

    // ── Table ──

    /// Fetch the open-reviews table data.
    pub fn load_reviews(&mut self) {
        self.spawn_request(
            |client| client.fetch_reviews(OPEN_REVIEWS),
            AppEvent::ReviewsLoaded,
        );
    }

    /// Toggle the detail panel of the selected row.
    pub fn toggle_detail(&mut self) {
        let Some(id) = self.table.selected_row().map(|r| r.id) else {
            return;
        };
        if let DetailToggle::Fetch(id) = self.table.toggle_row(id) {
            self.fetch_detail(id);
        }
    }

    fn fetch_detail(&mut self, id: i64) {
        self.spawn_request(
            move |client| client.fetch_detail(id),
            move |result| AppEvent::DetailLoaded { id, result },
        );
    }

    /// Re-sort the table by column and replay open detail rows.
    pub fn sort_table(&mut self, column_idx: usize) {
        for id in self.table.sort_by_column(column_idx) {
            self.fetch_detail(id);
        }
    }

    // ── Event handling ──

    /// Drain point for worker messages, called once per received event.
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ReportLoaded(Ok(body)) => {
                self.apply_report(&body);
            }
            AppEvent::ReportLoaded(Err(msg)) => self.notify(&msg),
            AppEvent::ReportReady(body) => {
                self.report_poll = None;
                self.reindex_pending = false;
                self.apply_report(&body);
                self.notify("Report reindexed");
            }
            AppEvent::ExcerptLoaded {
                file_id,
                seq,
                start,
                end,
                result,
            } => match result {
                Ok(body) => self.apply_excerpt(file_id, seq, start, end, &body),
                Err(msg) => self.notify(&msg),
            },
            AppEvent::DetailLoaded { id, result } => match result {
                Ok(body) => {
                    if self.table.is_open(id) {
                        self.table.details.insert(id, body);
                    }
                }
                Err(msg) => self.notify(&msg),
            },
            AppEvent::PatternCreated {
                continuation,
                hash,
                result,
            } => match result {
                Ok(_) => {
                    self.close_pattern_form();
                    self.notify("Pattern created");
                    match continuation {
                        Continuation::Continue => self.clear_group(&hash),
                        Continuation::Reindex => {
                            self.reindex_pending = true;
                            let package_id = self.package_id;
                            self.spawn_request(
                                move |client| client.trigger_reindex(package_id),
                                AppEvent::ReindexTriggered,
                            );
                        }
                    }
                }
                Err(msg) => self.notify(&msg),
            },
            AppEvent::ReindexTriggered(Ok(())) => {
                self.notify("Reindex started");
                self.start_report_poll();
            }
            AppEvent::ReindexTriggered(Err(msg)) => {
                self.reindex_pending = false;
                self.notify(&msg);
            }
            AppEvent::IgnoreAdded { hash, result } => match result {
                Ok(()) => {
                    self.clear_group(&hash);
                    self.notify("Match ignored");
                }
                Err(msg) => self.notify(&msg),
            },
            AppEvent::SnippetMarked { hash, result } => match result {
                Ok(()) => {
                    if let Some(hash) = hash {
                        self.clear_group(&hash);
                    }
                    self.notify("Snippet marked as non-license");
                }
                Err(msg) => self.notify(&msg),
            },
            AppEvent::GlobAdded(Ok(())) => {
                self.notify("Glob added");
                self.load_report();
            }
            AppEvent::GlobAdded(Err(msg)) => self.notify(&msg),
            AppEvent::ReviewsLoaded(Ok(rows)) => {
                self.table_loaded = true;
                for id in self.table.set_rows(rows) {
                    self.fetch_detail(id);
                }
            }
            AppEvent::ReviewsLoaded(Err(msg)) => self.notify(&msg),
        }
    }

    /// Apply a fetched excerpt unless a newer request has superseded it.
    fn apply_excerpt(&mut self, file_id: i64, seq: u64, start: usize, end: usize, body: &str) {
        let lines = parse_source_lines(body, start);
        let texts = lines.iter().map(|l| l.text.clone()).collect();
        let fresh = match self.excerpts.get_mut(&file_id) {
            Some(excerpt) => excerpt.apply_fetch(seq, start, end, texts),
            None => false,
        };
        if !fresh {
            return;
        }
        if let Some(container) = self.report.as_mut().and_then(|r| r.file_mut(file_id)) {
            container.start = start;
            container.end = end;
            container.lines = lines;
            container.collapsed = false;
        }
    }

    /// Cancel background polls before teardown.
    pub fn shutdown(&mut self) {
        if let Some(poll) = self.report_poll.take() {
            poll.cancel();
        }
    }
}
