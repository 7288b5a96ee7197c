pub mod fragment;
pub mod links;
pub mod table;

pub use fragment::{parse_source_lines, FileContainer, ReportDoc, SourceLine};
pub use table::{cell_display, Column, DetailToggle, ReviewTable, SortDir, TableConfig};
