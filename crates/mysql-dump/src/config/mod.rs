//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use std::path::Path;

use mysql_async::{Opts, OptsBuilder};

use crate::error::Result;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Dump options with the database list defaulted to the connection's
    /// database when none is given.
    pub fn dump_options(&self) -> DumpOptions {
        let mut options = self.dump.clone();
        if options.databases.is_empty() && !options.all_databases {
            options.databases.extend(self.connection.database.clone());
        }
        options
    }
}

impl ConnectionConfig {
    /// Driver options for a single connection.
    ///
    /// Every connection switches to `utf8mb4` so character data arrives as
    /// UTF-8 regardless of the server default.
    pub fn opts(&self) -> Opts {
        self.builder(SESSION_INIT).into()
    }

    /// Driver options for the dump connection.
    ///
    /// The session time zone is pinned to UTC, matching the
    /// `SET TIME_ZONE='+00:00'` written into every dump header, so TIMESTAMP
    /// values read as text replay unchanged.
    pub fn dump_opts(&self) -> Opts {
        self.builder(DUMP_SESSION_INIT).into()
    }

    fn builder(&self, init: &[&str]) -> OptsBuilder {
        OptsBuilder::default()
            .ip_or_hostname(self.host.clone())
            .tcp_port(self.port)
            .user(Some(self.user.clone()))
            .pass(Some(self.password.clone()))
            .db_name(self.database.clone())
            .init(init.to_vec())
    }
}

const SESSION_INIT: &[&str] = &["SET NAMES utf8mb4"];

const DUMP_SESSION_INIT: &[&str] = &["SET NAMES utf8mb4", "SET TIME_ZONE='+00:00'"];
