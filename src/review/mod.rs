pub mod excerpt;
pub mod navigator;
pub mod pattern;

pub use excerpt::{ExtendAction, MatchContext, SourceExcerpt};
pub use navigator::{Fire, NavigatorState};
pub use pattern::{build_draft, collect_pattern_text, FlagSet, Fragment, PatternDraft};
