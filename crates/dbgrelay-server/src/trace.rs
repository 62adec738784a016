use std::path::PathBuf;
use std::sync::Arc;

use dbgrelay_core::Command;
use dbgrelay_core::event::{DebugEventInfo, DebuggerEvent};
use dbgrelay_core::handler::DefaultHandler;
use dbgrelay_core::session::DebuggerSession;
use dbgrelay_debugger::Debugger;
use futures_util::StreamExt;
use miette::IntoDiagnostic;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Runs the subcommand spawning a process and printing its debug events.
///
/// Returns the exit code of the debuggee.
pub fn evaluate_trace(program: PathBuf, args: Vec<String>) -> miette::Result<i32> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()?;

    runtime.block_on(async move {
        let command = Command::new(program).args(args);

        let session = DebuggerSession::spawn(Debugger::new(), command, DefaultHandler)
            .await
            .into_diagnostic()?;

        let session = Arc::new(session);

        let printed = print_events(session.clone(), tokio::io::stdout());

        tokio::select! {
            res = printed => res,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, killing debuggee");
                session.release().await;
                Ok(130)
            }
        }
    })
}

/// Writes every event of `session` to `out`, one `name payload` line per
/// event, and returns the exit code of the debuggee.
async fn print_events<W>(session: Arc<DebuggerSession<Debugger>>, mut out: W) -> miette::Result<i32>
where
    W: AsyncWrite + Unpin,
{
    let pid = session.process_id();
    let mut events = std::pin::pin!(session.events());
    let mut exit_code = None;

    while let Some(event) = events.next().await {
        let line = format!("{} {}\n", event.name(), event.payload());
        out.write_all(line.as_bytes()).await.into_diagnostic()?;

        match event {
            DebuggerEvent::Debug(event) if event.process_id == pid => {
                if let DebugEventInfo::ExitProcess { exit_code: code } = event.info {
                    exit_code = Some(code as i32);
                }
            }
            DebuggerEvent::Error(msg) => miette::bail!("{msg}"),
            _ => (),
        }
    }

    out.flush().await.into_diagnostic()?;

    exit_code.ok_or_else(|| miette::miette!("debuggee exit was not reported"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dbgrelay_core::Command;
    use dbgrelay_core::handler::DefaultHandler;
    use dbgrelay_core::session::DebuggerSession;
    use dbgrelay_debugger::Debugger;
    use test_log::test;

    use super::print_events;

    #[test(tokio::test)]
    async fn prints_one_line_per_event() {
        let command = Command::new("/bin/sh").args(["-c", "exit 3"]);

        let session = DebuggerSession::spawn(Debugger::new(), command, DefaultHandler)
            .await
            .unwrap();
        let pid = session.process_id();

        let mut out = Vec::new();
        let exit_code = print_events(Arc::new(session), &mut out).await.unwrap();

        assert_eq!(exit_code, 3);

        let out = String::from_utf8(out).unwrap();
        let lines = out.lines().collect::<Vec<_>>();

        assert!(lines.first().unwrap().starts_with("createProcess {"));
        let exit = format!(r#"exitProcess {{"processId":{pid},"threadId":{pid},"exitCode":3}}"#);
        assert_eq!(lines.last().copied(), Some(exit.as_str()));
    }
}
