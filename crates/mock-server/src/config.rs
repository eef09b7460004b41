use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 5173;

/// Where the mock server reads and writes, resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub static_root: PathBuf,
    pub ledger_path: PathBuf,
    pub sync_log_path: PathBuf,
    pub log_json: bool,
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

impl ServerConfig {
    /// `PORT`, `MOCK_ROOT_DIR`, `MOCK_LEDGER_PATH`, `MOCK_SYNC_LOG_PATH`, `MOCK_LOG_JSON`.
    /// Unset or unparsable values fall back to defaults.
    pub fn from_env(env: impl Fn(&str) -> Option<String>) -> Self {
        let port = env("PORT")
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let static_root = PathBuf::from(env("MOCK_ROOT_DIR").unwrap_or_else(|| ".".to_string()));
        let ledger_path = env("MOCK_LEDGER_PATH")
            .map_or_else(|| static_root.join("data").join("ledger.json"), PathBuf::from);
        let sync_log_path = env("MOCK_SYNC_LOG_PATH")
            .map_or_else(|| static_root.join("server").join("sync-log.json"), PathBuf::from);
        let log_json = env("MOCK_LOG_JSON")
            .as_deref()
            .and_then(parse_bool)
            .unwrap_or(false);

        Self {
            port,
            static_root,
            ledger_path,
            sync_log_path,
            log_json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ServerConfig::from_env(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_hang_off_the_root_dir() {
        let cfg = config(&[("MOCK_ROOT_DIR", "/srv/patrol")]);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.ledger_path, PathBuf::from("/srv/patrol/data/ledger.json"));
        assert_eq!(cfg.sync_log_path, PathBuf::from("/srv/patrol/server/sync-log.json"));
        assert!(!cfg.log_json);
    }

    #[test]
    fn explicit_values_win() {
        let cfg = config(&[
            ("PORT", "8080"),
            ("MOCK_LEDGER_PATH", "/tmp/ledger.json"),
            ("MOCK_SYNC_LOG_PATH", "/tmp/log.json"),
            ("MOCK_LOG_JSON", "1"),
        ]);
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.static_root, PathBuf::from("."));
        assert_eq!(cfg.ledger_path, PathBuf::from("/tmp/ledger.json"));
        assert_eq!(cfg.sync_log_path, PathBuf::from("/tmp/log.json"));
        assert!(cfg.log_json);
    }

    #[test]
    fn bad_port_falls_back() {
        assert_eq!(config(&[("PORT", "http")]).port, DEFAULT_PORT);
    }
}
