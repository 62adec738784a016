use std::path::PathBuf;

/// The dbgrelay debug event server.
#[derive(clap::Parser)]
pub struct CliOpts {
    /// The command to run.
    #[clap(subcommand)]
    pub action: CliAction,
}

/// The command to run.
#[derive(clap::Subcommand)]
pub enum CliAction {
    /// Command to serve debugging sessions over HTTP.
    Serve {
        /// Server configuration (KDL format).
        ///
        /// If it ends with `.kdl`, it is treated as a path to a configuration
        /// file. Otherwise it is directly parsed as inline KDL-formatted
        /// configuration.
        #[clap(short, long, value_name = "CONTENT/PATH")]
        config: Option<String>,

        /// Address to listen on, overriding the configuration.
        #[clap(short, long, value_name = "ADDR")]
        listen: Option<String>,
    },

    /// Command to spawn a new process and print its debug events.
    Trace {
        /// Name of program to run.
        program: PathBuf,

        /// Program's arguments.
        #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

impl CliOpts {
    /// Parses the CLI from the command-line.
    ///
    /// # Warning
    ///
    /// Exits on error.
    pub fn parse_from_cmdline() -> Self {
        <Self as clap::Parser>::parse()
    }
}
