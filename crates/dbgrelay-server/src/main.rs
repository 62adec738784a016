#![allow(missing_docs)]
#![allow(clippy::print_stderr)]

use dbgrelay_server::{CliAction, CliOpts, ServerConfig};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = CliOpts::parse_from_cmdline();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_env_var("DBGRELAY_LOG")
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let res = match cli.action {
        CliAction::Serve { config, listen } => evaluate_serve(config, listen).map(|_| None),
        CliAction::Trace { program, args } => {
            dbgrelay_server::evaluate_trace(program, args).map(Some)
        }
    };

    match res {
        Ok(Some(exit_code)) => std::process::exit(exit_code),
        Ok(None) => (),
        Err(e) => {
            eprintln!("{e:?}");
            std::process::exit(1);
        }
    }
}

fn evaluate_serve(config: Option<String>, listen: Option<String>) -> miette::Result<()> {
    let mut config = match config {
        Some(config) => ServerConfig::parse(&config)?,
        None => ServerConfig::default(),
    };

    if let Some(listen) = listen {
        config.listen = listen;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;

    runtime.block_on(dbgrelay_server::serve(config))
}
