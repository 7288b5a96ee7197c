mod state;

pub use state::{App, AppEvent, Continuation, InputMode, PatternForm, View};
