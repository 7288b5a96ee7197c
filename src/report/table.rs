use crate::api::ReviewRecord;
use crate::report::links;
use std::collections::HashMap;

/// Empty-table indicator once every review has been handled.
pub const ALL_DONE: &str = "All reviews are done!";

// ── Columns ──

/// Which optional columns a table variant shows. One table definition
/// serves several page variants; the caller enumerates its capabilities
/// explicitly instead of probing rendered markup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableConfig {
    pub show_link: bool,
    pub show_package: bool,
    pub show_state: bool,
    pub show_result: bool,
    pub show_login: bool,
    pub show_products: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Link,
    Created,
    Package,
    State,
    Result,
    Login,
    Products,
    Report,
}

impl Column {
    pub fn title(&self) -> &'static str {
        match self {
            Column::Link => "Link",
            Column::Created => "Created",
            Column::Package => "Package",
            Column::State => "State",
            Column::Result => "Result",
            Column::Login => "Login",
            Column::Products => "Products",
            Column::Report => "Report",
        }
    }
}

/// Build the column list: optional link, mandatory created, the optional
/// data columns in fixed order, mandatory report (checksum).
pub fn compose_columns(config: &TableConfig) -> Vec<Column> {
    let mut columns = Vec::new();
    if config.show_link {
        columns.push(Column::Link);
    }
    columns.push(Column::Created);
    if config.show_package {
        columns.push(Column::Package);
    }
    if config.show_state {
        columns.push(Column::State);
    }
    if config.show_result {
        columns.push(Column::Result);
    }
    if config.show_login {
        columns.push(Column::Login);
    }
    if config.show_products {
        columns.push(Column::Products);
    }
    columns.push(Column::Report);
    columns
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

/// Default sort: the created column ascending, unless a state column is
/// present — then that column descending.
pub fn default_sort(columns: &[Column]) -> (usize, SortDir) {
    if let Some(idx) = columns.iter().position(|c| *c == Column::State) {
        return (idx, SortDir::Desc);
    }
    let created = columns
        .iter()
        .position(|c| *c == Column::Created)
        .unwrap_or(0);
    (created, SortDir::Asc)
}

// ── Cell rendering ──

/// Zero-padded sort key for rows without a display link, derived from
/// `10 - priority` so link-less rows still order by urgency.
pub fn link_sort_key(record: &ReviewRecord) -> String {
    let key = (10 - record.priority).clamp(0, 99);
    format!("{:02}{}", key, record.external_link)
}

/// Display text for one cell.
pub fn cell_display(record: &ReviewRecord, column: Column) -> String {
    match column {
        Column::Link => {
            if record.external_link.is_empty() {
                link_sort_key(record)
            } else {
                links::external_link(record)
            }
        }
        Column::Created => record.created.clone(),
        Column::Package => links::package_link(&record.name),
        Column::State => record.state.clone(),
        Column::Result => record.result.clone().unwrap_or_default(),
        Column::Login => record.login.clone().unwrap_or_default(),
        Column::Products => record.products.clone().unwrap_or_default(),
        Column::Report => {
            let mut text = links::report_link(record);
            let jobs = links::job_summary(record);
            if !jobs.is_empty() {
                text.push_str(&format!(" ({jobs})"));
            }
            text
        }
    }
}

/// Ordering key for one cell. Numeric keys are zero-padded so plain string
/// comparison orders correctly.
pub fn cell_sort_key(record: &ReviewRecord, column: Column) -> String {
    match column {
        Column::Link => link_sort_key(record),
        Column::Created => format!("{:020}", record.created_epoch.max(0)),
        Column::Package => record.name.clone(),
        Column::State => record.state.clone(),
        Column::Result => record.result.clone().unwrap_or_default(),
        Column::Login => record.login.clone().unwrap_or_default(),
        Column::Products => record.products.clone().unwrap_or_default(),
        Column::Report => record.checksum.clone().unwrap_or_default(),
    }
}

// ── Table state ──

/// What a row toggle asks the caller to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailToggle {
    /// Row opened — fetch its detail fragment (details are never cached)
    Fetch(i64),
    Closed,
}

/// Review table state: composed columns, sorted rows, and the set of rows
/// whose detail panels are open. The open set survives redraws; after a
/// redraw the expand action is replayed for each remembered id.
#[derive(Debug)]
pub struct ReviewTable {
    pub columns: Vec<Column>,
    pub rows: Vec<ReviewRecord>,
    pub sort: (usize, SortDir),
    pub selected: usize,
    open_rows: Vec<i64>,
    /// Fetched detail fragments for currently open rows
    pub details: HashMap<i64, String>,
}

impl ReviewTable {
    pub fn new(config: &TableConfig) -> Self {
        let columns = compose_columns(config);
        let sort = default_sort(&columns);
        ReviewTable {
            columns,
            rows: Vec::new(),
            sort,
            selected: 0,
            open_rows: Vec::new(),
            details: HashMap::new(),
        }
    }

    /// Replace the row set (a redraw). Rows are re-sorted, stale detail
    /// fragments dropped, and the caller must re-fetch every id returned —
    /// the replayed expand actions.
    pub fn set_rows(&mut self, rows: Vec<ReviewRecord>) -> Vec<i64> {
        self.rows = rows;
        self.resort();
        self.open_rows.retain(|id| self.rows.iter().any(|r| r.id == *id));
        self.details.clear();
        if self.selected >= self.rows.len() {
            self.selected = self.rows.len().saturating_sub(1);
        }
        self.open_rows.clone()
    }

    fn resort(&mut self) {
        let (idx, dir) = self.sort;
        let Some(column) = self.columns.get(idx).copied() else {
            return;
        };
        self.rows
            .sort_by(|a, b| cell_sort_key(a, column).cmp(&cell_sort_key(b, column)));
        if dir == SortDir::Desc {
            self.rows.reverse();
        }
    }

    /// Re-sort by a column, toggling direction when it is already the sort
    /// target. Open rows survive; the returned ids need re-fetching.
    pub fn sort_by_column(&mut self, idx: usize) -> Vec<i64> {
        if idx >= self.columns.len() {
            return Vec::new();
        }
        self.sort = if self.sort.0 == idx {
            (idx, match self.sort.1 {
                SortDir::Asc => SortDir::Desc,
                SortDir::Desc => SortDir::Asc,
            })
        } else {
            (idx, SortDir::Asc)
        };
        self.resort();
        self.details.clear();
        self.open_rows.clone()
    }

    /// Toggle a row's detail panel. Opening always fetches — nothing is
    /// cached across expands.
    pub fn toggle_row(&mut self, id: i64) -> DetailToggle {
        if let Some(pos) = self.open_rows.iter().position(|open| *open == id) {
            self.open_rows.remove(pos);
            self.details.remove(&id);
            DetailToggle::Closed
        } else {
            self.open_rows.push(id);
            DetailToggle::Fetch(id)
        }
    }

    pub fn is_open(&self, id: i64) -> bool {
        self.open_rows.contains(&id)
    }

    pub fn selected_row(&self) -> Option<&ReviewRecord> {
        self.rows.get(self.selected)
    }

    pub fn next_row(&mut self) {
        if self.selected + 1 < self.rows.len() {
            self.selected += 1;
        }
    }

    pub fn prev_row(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Message shown in place of rows when the table is empty.
    pub fn empty_message(&self) -> &'static str {
        ALL_DONE
    }
}
