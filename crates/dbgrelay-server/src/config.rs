use std::ffi::OsStr;
use std::path::Path;

use miette::IntoDiagnostic;

/// Configuration of the debug event server.
#[derive(Debug, PartialEq, knus::Decode)]
pub struct ServerConfig {
    /// Address the HTTP server listens on.
    #[knus(child, default = "127.0.0.1:7878".to_owned(), unwrap(argument))]
    pub listen: String,

    /// Interval (in seconds) between keep-alive comments on event streams.
    #[knus(child, default = 15, unwrap(argument))]
    pub keep_alive: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:7878".to_owned(),
            keep_alive: 15,
        }
    }
}

impl ServerConfig {
    /// Parses the configuration.
    ///
    /// If `config` ends with `.kdl`, it is treated as a path to a
    /// configuration file. Otherwise it is directly parsed as inline
    /// KDL-formatted configuration.
    ///
    /// A zero `keep-alive` is rejected, since it would flood idle event
    /// streams with keep-alive comments.
    pub fn parse(config: &str) -> miette::Result<Self> {
        let path = Path::new(config);

        let config = if let Some((filename, "kdl")) = path
            .file_name()
            .and_then(OsStr::to_str)
            .zip(path.extension().and_then(OsStr::to_str))
        {
            let content = std::fs::read_to_string(path).into_diagnostic()?;
            knus::parse::<Self>(filename, &content)?
        } else {
            knus::parse::<Self>("<content>", config)?
        };

        if config.keep_alive == 0 {
            miette::bail!("keep-alive must be at least 1 second");
        }

        Ok(config)
    }
}
