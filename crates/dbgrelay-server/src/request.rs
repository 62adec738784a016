use std::collections::BTreeMap;
use std::path::PathBuf;

use dbgrelay_core::Command;
use dbgrelay_core::debugger::ContinueDecision;
use dbgrelay_core::session::SessionState;
use serde::{Deserialize, Serialize};

/// Body of a session creation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CreateSession {
    /// Spawns a new process.
    Spawn(SpawnRequest),

    /// Attaches to a running process.
    Attach(AttachRequest),
}

/// Launch parameters of a process to spawn.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnRequest {
    /// Program to spawn.
    pub path: PathBuf,

    /// Program arguments.
    #[serde(default)]
    pub args: Vec<String>,

    /// Environment changes. A `null` value removes the variable.
    #[serde(default)]
    pub env: BTreeMap<String, Option<String>>,

    /// Whether the server's environment is not inherited.
    #[serde(default)]
    pub clear_env: bool,

    /// Working directory.
    pub cwd: Option<PathBuf>,
}

impl From<SpawnRequest> for Command {
    fn from(req: SpawnRequest) -> Self {
        let mut command = Self::new(req.path).args(req.args);

        if req.clear_env {
            command = command.env_clear();
        }

        if let Some(cwd) = req.cwd {
            command = command.current_dir(cwd);
        }

        req.env.into_iter().fold(command, |cmd, (k, v)| match v {
            Some(v) => cmd.env(k, v),
            None => cmd.env_remove(k),
        })
    }
}

/// Process to attach to.
#[derive(Debug, Deserialize)]
pub struct AttachRequest {
    /// ID of the process.
    pub pid: u32,
}

/// Body of an explicit continue request.
#[derive(Debug, Deserialize)]
pub struct ContinueRequest {
    /// Decision to resume the debuggee with.
    pub decision: ContinueDecision,
}

/// Session created by a request.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedSession {
    /// Registry index of the session.
    pub index: usize,

    /// ID of the debuggee.
    pub pid: u32,
}

/// Summary of a registered session.
#[derive(Debug, Serialize)]
pub struct SessionSummary {
    /// Registry index of the session.
    pub index: usize,

    /// ID of the debuggee.
    pub pid: u32,

    /// Current state of the session.
    pub state: SessionState,
}

#[cfg(test)]
mod tests {
    use dbgrelay_core::CommandEnv;

    use super::*;

    #[test]
    fn spawn_request_into_command() {
        let req = serde_json::from_str::<CreateSession>(
            r#"{"spawn":{"path":"/bin/env","args":["-0"],"env":{"A":"1","B":null},"cwd":"/tmp"}}"#,
        )
        .unwrap();

        let CreateSession::Spawn(req) = req else {
            panic!("expected spawn request");
        };

        let command = Command::from(req);

        assert_eq!(command.program.to_str(), Some("/bin/env"));
        assert_eq!(command.args, ["-0"]);
        assert_eq!(command.current_dir.as_deref().and_then(|p| p.to_str()), Some("/tmp"));

        let CommandEnv::Inherit(changes) = command.env else {
            panic!("environment should be inherited");
        };
        assert_eq!(changes.get("A"), Some(&Some("1".to_owned())));
        assert_eq!(changes.get("B"), Some(&None));
    }

    #[test]
    fn spawn_request_with_cleared_env() {
        let req = serde_json::from_str::<SpawnRequest>(
            r#"{"path":"/bin/env","clearEnv":true,"env":{"A":"1"}}"#,
        )
        .unwrap();

        let command = Command::from(req);

        let CommandEnv::Replace(env) = command.env else {
            panic!("environment should be replaced");
        };
        assert_eq!(env.len(), 1);
        assert_eq!(env.get("A").map(String::as_str), Some("1"));
    }

    #[test]
    fn attach_and_continue_requests() {
        let req = serde_json::from_str::<CreateSession>(r#"{"attach":{"pid":1234}}"#).unwrap();
        assert!(matches!(req, CreateSession::Attach(AttachRequest { pid: 1234 })));

        let req = serde_json::from_str::<ContinueRequest>(r#"{"decision":"notHandled"}"#).unwrap();
        assert_eq!(req.decision, ContinueDecision::NotHandled);
    }
}
