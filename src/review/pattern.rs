use std::collections::HashMap;

// ── Flag sets ──

/// Pattern classification flags recognized by the creation form. The set
/// varies across product versions, so both are shipped as presets and the
/// active one is picked by configuration.
pub const FLAGS_FULL: &[&str] = &["opinion", "patent", "trademark"];
pub const FLAGS_LEGACY: &[&str] = &["patent", "trademark"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagSet {
    Full,
    Legacy,
}

impl FlagSet {
    pub fn names(&self) -> &'static [&'static str] {
        match self {
            FlagSet::Full => FLAGS_FULL,
            FlagSet::Legacy => FLAGS_LEGACY,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "full" => Some(FlagSet::Full),
            "legacy" => Some(FlagSet::Legacy),
            _ => None,
        }
    }
}

// ── Draft ──

/// A new-pattern creation request assembled from the review form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternDraft {
    /// Chosen license; empty means "pattern without license"
    pub license: String,
    /// Newline-joined text of all fragments sharing the snippet identity
    pub pattern: String,
    /// Checked classification flags, a subset of the configured flag set
    pub flags: Vec<String>,
    /// Package scope, only when "only match within this package" is checked
    pub packname: Option<String>,
    /// Match hash of the originating fire, for the continue continuation
    pub hash: String,
}

impl PatternDraft {
    /// Form body for the create endpoint: `{license, pattern, <flag>=1...,
    /// packname?}`.
    pub fn form_body(&self) -> Vec<(String, String)> {
        let mut body = vec![
            ("license".to_string(), self.license.clone()),
            ("pattern".to_string(), self.pattern.clone()),
        ];
        for flag in &self.flags {
            body.push((flag.clone(), "1".to_string()));
        }
        if let Some(ref packname) = self.packname {
            body.push(("packname".to_string(), packname.clone()));
        }
        body
    }
}

/// A text fragment inside a match group, carrying its snippet identity.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub snippet_id: Option<i64>,
    pub text: String,
}

/// Concatenate all fragments sharing `snippet_id`, one per line with a
/// trailing newline, preserving document order.
pub fn collect_pattern_text(fragments: &[Fragment], snippet_id: Option<i64>) -> String {
    let mut text = String::new();
    for fragment in fragments {
        if fragment.snippet_id == snippet_id {
            text.push_str(&fragment.text);
            text.push('\n');
        }
    }
    text
}

/// Build a draft from the creation form state. `checked` maps flag names to
/// their checkbox state; only flags in the configured set are honored.
/// `local_only` gates the package scope.
pub fn build_draft(
    license: &str,
    pattern_text: &str,
    flag_set: FlagSet,
    checked: &HashMap<String, bool>,
    local_only: bool,
    packname: &str,
    hash: &str,
) -> PatternDraft {
    let flags = flag_set
        .names()
        .iter()
        .filter(|name| checked.get(**name).copied().unwrap_or(false))
        .map(|name| name.to_string())
        .collect();
    PatternDraft {
        license: license.to_string(),
        pattern: pattern_text.to_string(),
        flags,
        packname: local_only.then(|| packname.to_string()),
        hash: hash.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_fragments() -> Vec<Fragment> {
        vec![
            Fragment { snippet_id: Some(7), text: "Permission is hereby granted".into() },
            Fragment { snippet_id: Some(9), text: "unrelated snippet".into() },
            Fragment { snippet_id: Some(7), text: "free of charge".into() },
        ]
    }

    #[test]
    fn collects_only_matching_snippet_fragments() {
        let text = collect_pattern_text(&make_fragments(), Some(7));
        assert_eq!(text, "Permission is hereby granted\nfree of charge\n");
    }

    #[test]
    fn collects_nothing_for_unknown_snippet() {
        assert_eq!(collect_pattern_text(&make_fragments(), Some(1)), "");
    }

    #[test]
    fn full_set_honors_all_three_flags() {
        let checked: HashMap<String, bool> = [
            ("opinion".to_string(), true),
            ("patent".to_string(), false),
            ("trademark".to_string(), true),
        ]
        .into();
        let draft = build_draft("MIT", "text", FlagSet::Full, &checked, false, "pkg", "h1");
        assert_eq!(draft.flags, vec!["opinion", "trademark"]);
        assert_eq!(draft.packname, None);
    }

    #[test]
    fn legacy_set_ignores_opinion() {
        let checked: HashMap<String, bool> = [
            ("opinion".to_string(), true),
            ("patent".to_string(), true),
        ]
        .into();
        let draft = build_draft("MIT", "text", FlagSet::Legacy, &checked, false, "pkg", "h1");
        assert_eq!(draft.flags, vec!["patent"]);
    }

    #[test]
    fn local_only_sets_packname() {
        let checked = HashMap::new();
        let draft = build_draft("", "text", FlagSet::Full, &checked, true, "curl", "h1");
        assert_eq!(draft.packname.as_deref(), Some("curl"));
    }

    #[test]
    fn form_body_shape() {
        let draft = PatternDraft {
            license: "MIT".into(),
            pattern: "p".into(),
            flags: vec!["patent".into()],
            packname: Some("curl".into()),
            hash: "h".into(),
        };
        let body = draft.form_body();
        assert_eq!(
            body,
            vec![
                ("license".to_string(), "MIT".to_string()),
                ("pattern".to_string(), "p".to_string()),
                ("patent".to_string(), "1".to_string()),
                ("packname".to_string(), "curl".to_string()),
            ]
        );
    }
}
