//! Process configuration loaded from environment variables.
//!
//! Agent tuning (cadence, cooldown, gate, fantasies, compaction) lives in
//! [`fakeman_agency::AgencyConfig::from_env`]; this covers the process.
//!
//! | Variable                | Default          | Description                                    |
//! |-------------------------|------------------|------------------------------------------------|
//! | `FAKEMAN_DATA_DIR`      | `./data`         | Persistent agent state                         |
//! | `FAKEMAN_COMM_DIR`      | `./comm`         | Mailbox directory (input/output/state JSON)    |
//! | `FAKEMAN_LOG_LEVEL`     | `info`           | tracing filter                                 |
//! | `FAKEMAN_GENERATOR_CMD` | (unset)          | Command line of the text generator             |
//! | `FAKEMAN_ECHO`          | `false`          | Use the echo generator even if a command is set |
//! | `FAKEMAN_SUMMARIZE_WITH_GENERATOR` | `true` | Let the generator summarize merged segments |

#[derive(Debug)]
pub struct Config {
    pub data_dir: String,
    pub comm_dir: String,
    pub log_level: String,

    /// Whitespace-separated program and arguments; the prompt goes to stdin.
    pub generator_cmd: Option<String>,
    pub use_echo: bool,
    pub summarize_with_generator: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            data_dir:      env_str("FAKEMAN_DATA_DIR", "./data"),
            comm_dir:      env_str("FAKEMAN_COMM_DIR", "./comm"),
            log_level:     env_str("FAKEMAN_LOG_LEVEL", "info"),
            generator_cmd: std::env::var("FAKEMAN_GENERATOR_CMD").ok().filter(|s| !s.trim().is_empty()),
            use_echo:      env_bool("FAKEMAN_ECHO", false),
            summarize_with_generator: env_bool("FAKEMAN_SUMMARIZE_WITH_GENERATOR", true),
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = Config::from_env();
        assert!(!cfg.data_dir.is_empty());
        assert!(!cfg.comm_dir.is_empty());
        assert!(!cfg.log_level.is_empty());
    }

    #[test]
    fn env_override_applied() {
        std::env::set_var("FAKEMAN_COMM_DIR", "/tmp/fakeman-comm");
        let cfg = Config::from_env();
        assert_eq!(cfg.comm_dir, "/tmp/fakeman-comm");
        std::env::remove_var("FAKEMAN_COMM_DIR");
    }
}
