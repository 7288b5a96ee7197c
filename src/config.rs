use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LcrConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub pattern: PatternConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// [server] section configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the review server
    #[serde(default = "default_server_url")]
    pub url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// [poll] section configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    /// Delay between retry attempts in milliseconds
    #[serde(default = "default_poll_delay")]
    pub delay_ms: u64,
    /// Attempt cap for background polls; 0 means retry until success
    #[serde(default)]
    pub max_attempts: u32,
}

/// [pattern] section configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PatternConfig {
    /// Flag set variant for the pattern dialog: "full" or "legacy"
    #[serde(default = "default_variant")]
    pub variant: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub line_numbers: bool,
    #[serde(default)]
    pub wrap_lines: bool,
}

fn default_server_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_poll_delay() -> u64 {
    crate::api::RETRY_DELAY.as_millis() as u64
}

fn default_variant() -> String {
    "full".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_poll_delay(),
            max_attempts: 0,
        }
    }
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            variant: default_variant(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            line_numbers: true,
            wrap_lines: false,
        }
    }
}

impl PollConfig {
    /// Attempt cap as the poller expects it: `None` retries until success.
    pub fn attempt_cap(&self) -> Option<u32> {
        if self.max_attempts == 0 {
            None
        } else {
            Some(self.max_attempts)
        }
    }
}

/// Load config by merging global defaults with per-directory overrides.
/// Priority: local `.lcr-config.toml` > global `~/.config/lcr/config.toml` > built-in defaults.
/// Merging is deep: individual fields within sections (e.g. `[poll]`) override independently.
pub fn load_config(work_dir: &str) -> LcrConfig {
    let local_path = format!("{work_dir}/.lcr-config.toml");
    let global_path = dirs::config_dir()
        .map(|d| d.join("lcr/config.toml").to_string_lossy().to_string());

    let global_table = global_path
        .and_then(|p| std::fs::read_to_string(p).ok())
        .and_then(|c| c.parse::<toml::Table>().ok());

    let local_table = std::fs::read_to_string(&local_path)
        .ok()
        .and_then(|c| c.parse::<toml::Table>().ok());

    let merged = match (global_table, local_table) {
        (Some(mut global), Some(local)) => {
            deep_merge(&mut global, local);
            toml::Value::Table(global)
        }
        (Some(global), None) => toml::Value::Table(global),
        (None, Some(local)) => toml::Value::Table(local),
        (None, None) => return LcrConfig::default(),
    };

    merged.try_into().unwrap_or_default()
}

/// Recursively merge `overlay` into `base`. Overlay values win; nested tables are merged recursively.
fn deep_merge(
    base: &mut toml::map::Map<String, toml::Value>,
    overlay: toml::map::Map<String, toml::Value>,
) {
    for (key, value) in overlay {
        match (base.get_mut(&key), &value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table.clone());
            }
            _ => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_retry_forever() {
        let config = LcrConfig::default();
        assert_eq!(config.poll.delay_ms, 2000);
        assert_eq!(config.poll.attempt_cap(), None);
        assert_eq!(config.pattern.variant, "full");
    }

    #[test]
    fn local_file_overrides_single_field() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".lcr-config.toml"),
            "[poll]\nmax_attempts = 5\n",
        )
        .unwrap();
        let config = load_config(dir.path().to_str().unwrap());
        assert_eq!(config.poll.attempt_cap(), Some(5));
        // Untouched fields keep their defaults
        assert_eq!(config.poll.delay_ms, 2000);
        assert_eq!(config.server.url, "http://localhost:3000");
    }

    #[test]
    fn section_headers_parse_into_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".lcr-config.toml"),
            "[server]\nurl = 'http://review.example'\n\n[display]\nline_numbers = false\n",
        )
        .unwrap();
        let config = load_config(dir.path().to_str().unwrap());
        assert_eq!(config.server.url, "http://review.example");
        assert!(!config.display.line_numbers);
        assert_eq!(config.pattern.variant, "full");
    }

    #[test]
    fn deep_merge_overlay_wins() {
        let mut base_table = "[server]\nurl = 'http://a'\ntimeout_secs = 10"
            .parse::<toml::Table>()
            .unwrap();
        let overlay_table = "[server]\nurl = 'http://b'".parse::<toml::Table>().unwrap();
        deep_merge(&mut base_table, overlay_table);
        assert_eq!(
            base_table["server"]["url"],
            toml::Value::String("http://b".to_string())
        );
        assert_eq!(base_table["server"]["timeout_secs"], toml::Value::Integer(10));
    }
}
