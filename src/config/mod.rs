// Configuration module entry point
// Manages application configuration and shared runtime state

mod state;
mod types;

use std::net::SocketAddr;

pub use state::AppState;
pub use types::{
    Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, StorageConfig,
};

/// Prefix for environment overrides, e.g. `FILEBOX_SERVER__PORT=9000`
const ENV_PREFIX: &str = "FILEBOX";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// A missing file is not an error, defaults and environment still apply
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.backlog", 1024)?
            .set_default("storage.data_dir", "data")?
            .set_default("storage.public_dir", "public")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.header_read_timeout", 30)?
            .set_default("performance.shutdown_timeout", 5)?
            .set_default("http.server_name", "filebox")?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, config::ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| config::ConfigError::Message(format!("Invalid address: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let cfg = Config::load_from("does-not-exist/filebox").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.storage.data_dir, "data");
        assert_eq!(cfg.storage.public_dir, "public");
        assert_eq!(cfg.storage.index_files, vec!["index.html".to_string()]);
        assert_eq!(cfg.http.max_body_size, None);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert!(cfg.server.workers.is_none());
        assert!(cfg.performance.max_connections.is_none());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 9090\nworkers = 2\n\n[storage]\ndata_dir = \"/srv/uploads\"\n\n[http]\nmax_body_size = 1024\n"
        )
        .unwrap();

        let path = file.path().with_extension("");
        let cfg = Config::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.workers, Some(2));
        assert_eq!(cfg.storage.data_dir, "/srv/uploads");
        assert_eq!(cfg.http.max_body_size, Some(1024));
        assert_eq!(cfg.server.host, "0.0.0.0");
    }

    #[test]
    fn test_invalid_host_rejected() {
        let mut cfg = Config::load_from("does-not-exist/filebox").unwrap();
        cfg.server.host = "not a host".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }
}
