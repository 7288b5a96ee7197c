use crate::api::ReviewRecord;

// ── External link prefixes ──

/// Request-show / pull-request base URLs for the recognized link prefixes.
const LINK_BASES: &[(&str, &str)] = &[
    ("obs#", "https://build.opensuse.org/request/show/"),
    ("ibs#", "https://build.suse.de/request/show/"),
    ("soo#", "https://src.opensuse.org/pulls/"),
    ("ssd#", "https://src.suse.de/pulls/"),
];

/// Render a review's external link as `(priority) <a ...>link</a>`.
/// Unrecognized links pass through unmodified after the priority prefix.
pub fn external_link(record: &ReviewRecord) -> String {
    let link = &record.external_link;
    let prio = format!("({}) ", record.priority);
    for (prefix, base) in LINK_BASES {
        if let Some(id) = link.strip_prefix(prefix) {
            return format!("{prio}<a href='{base}{id}' target='_blank'>{link}</a>");
        }
    }
    format!("{prio}{link}")
}

/// Render the staged report status. The first unmet readiness condition
/// wins; a fully indexed review links its checksum, or "unpacked" when the
/// checksum is still missing.
pub fn report_link(record: &ReviewRecord) -> String {
    if !record.imported {
        return "<i>not yet imported</i>".to_string();
    }
    if !record.unpacked {
        return "<i>not yet unpacked</i>".to_string();
    }
    if !record.indexed {
        return "<i>not yet indexed</i>".to_string();
    }
    let label = record.checksum.as_deref().unwrap_or("unpacked");
    format!("<a href='/reviews/details/{}'>{}</a>", record.id, label)
}

/// Render a license name as a link; the empty name is the pattern-without-
/// license placeholder.
pub fn license_link(name: &str) -> String {
    if name.is_empty() {
        return "<a href='/licenses/'>*Pattern without license*</a>".to_string();
    }
    format!("<a href='/licenses/{name}'>{name}</a>")
}

/// Render a package name as a search link.
pub fn package_link(name: &str) -> String {
    format!("<a href='/search?q={name}'>{name}</a>")
}

/// Decorate the report status with job/match counts. Empty when there is
/// nothing to report.
pub fn job_summary(record: &ReviewRecord) -> String {
    let mut parts = Vec::new();
    if record.active_jobs > 0 {
        parts.push(format!("{} jobs running", record.active_jobs));
    }
    if record.failed_jobs > 0 {
        parts.push(format!("{} jobs failed", record.failed_jobs));
    }
    if record.unresolved_matches > 0 {
        parts.push(format!("{} unresolved matches", record.unresolved_matches));
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(link: &str, priority: i64) -> ReviewRecord {
        ReviewRecord {
            id: 42,
            external_link: link.to_string(),
            priority,
            ..Default::default()
        }
    }

    #[test]
    fn obs_link_renders_request_show_url() {
        let html = external_link(&make_record("obs#123456", 2));
        assert_eq!(
            html,
            "(2) <a href='https://build.opensuse.org/request/show/123456' target='_blank'>obs#123456</a>"
        );
    }

    #[test]
    fn ibs_link_renders_internal_url() {
        let html = external_link(&make_record("ibs#99", 1));
        assert!(html.starts_with("(1) "));
        assert!(html.contains("https://build.suse.de/request/show/99"));
    }

    #[test]
    fn soo_and_ssd_render_pull_urls() {
        assert!(external_link(&make_record("soo#7", 3)).contains("https://src.opensuse.org/pulls/7"));
        assert!(external_link(&make_record("ssd#8", 3)).contains("https://src.suse.de/pulls/8"));
    }

    #[test]
    fn plain_link_passes_through() {
        assert_eq!(external_link(&make_record("plain-text", 2)), "(2) plain-text");
    }

    #[test]
    fn report_staging_order() {
        let mut r = ReviewRecord { id: 7, ..Default::default() };
        assert_eq!(report_link(&r), "<i>not yet imported</i>");
        r.imported = true;
        assert_eq!(report_link(&r), "<i>not yet unpacked</i>");
        r.unpacked = true;
        assert_eq!(report_link(&r), "<i>not yet indexed</i>");
        r.indexed = true;
        assert_eq!(report_link(&r), "<a href='/reviews/details/7'>unpacked</a>");
        r.checksum = Some("abc123".to_string());
        assert_eq!(report_link(&r), "<a href='/reviews/details/7'>abc123</a>");
    }

    #[test]
    fn empty_license_renders_placeholder() {
        assert!(license_link("").contains("*Pattern without license*"));
        assert_eq!(license_link("MIT"), "<a href='/licenses/MIT'>MIT</a>");
    }

    #[test]
    fn job_summary_lists_counts() {
        let r = ReviewRecord {
            active_jobs: 2,
            unresolved_matches: 5,
            ..Default::default()
        };
        assert_eq!(job_summary(&r), "2 jobs running, 5 unresolved matches");
        assert_eq!(job_summary(&ReviewRecord::default()), "");
    }
}
