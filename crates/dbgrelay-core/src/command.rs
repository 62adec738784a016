use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Launch parameters of a process to spawn under debug control.
#[derive(Debug, Clone)]
pub struct Command {
    /// Program to spawn.
    pub program: PathBuf,

    /// Program arguments (without the program itself).
    pub args: Vec<String>,

    /// Environment of the process to spawn.
    pub env: CommandEnv,

    /// Working directory of the process to spawn.
    ///
    /// `None` means the debugger's working directory is inherited.
    pub current_dir: Option<PathBuf>,
}

impl Command {
    /// Creates a command launching `program` with no arguments, the
    /// debugger's environment and the debugger's working directory.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: CommandEnv::Inherit(BTreeMap::new()),
            current_dir: None,
        }
    }

    /// Adds a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Adds multiple arguments.
    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        args.into_iter().fold(self, |cmd, arg| cmd.arg(arg))
    }

    /// Sets an environment variable, overriding an inherited value.
    pub fn env(mut self, key: impl Into<String>, val: impl Into<String>) -> Self {
        match self.env {
            CommandEnv::Inherit(ref mut env) => {
                env.insert(key.into(), Some(val.into()));
            }
            CommandEnv::Replace(ref mut env) => {
                env.insert(key.into(), val.into());
            }
        }

        self
    }

    /// Sets multiple environment variables.
    pub fn envs<I, K, V>(self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        vars.into_iter().fold(self, |cmd, (k, v)| cmd.env(k, v))
    }

    /// Prevents an environment variable from reaching the process, whether it
    /// was set explicitly or inherited.
    pub fn env_remove(mut self, key: impl Into<String>) -> Self {
        match self.env {
            CommandEnv::Inherit(ref mut env) => {
                env.insert(key.into(), None);
            }
            CommandEnv::Replace(ref mut env) => {
                env.remove(&key.into());
            }
        }

        self
    }

    /// Drops the inherited environment; only variables set afterwards reach
    /// the process.
    pub fn env_clear(mut self) -> Self {
        self.env = CommandEnv::Replace(BTreeMap::new());
        self
    }

    /// Sets the working directory.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;

        for arg in &self.args {
            write!(f, " {arg}")?;
        }

        Ok(())
    }
}

/// Environment of a [Command].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEnv {
    /// The debugger's environment with changes applied on top of it.
    ///
    /// A `None` value removes the variable.
    Inherit(BTreeMap<String, Option<String>>),

    /// A complete environment, nothing is inherited.
    Replace(BTreeMap<String, String>),
}

impl CommandEnv {
    /// Resolves the environment the process should receive.
    ///
    /// `None` means the debugger's environment can be inherited as is.
    pub fn resolve(&self) -> Option<BTreeMap<String, String>> {
        match self {
            Self::Inherit(changes) if changes.is_empty() => None,
            Self::Inherit(changes) => {
                let mut env = std::env::vars().collect::<BTreeMap<_, _>>();

                for (k, v) in changes {
                    match v {
                        Some(v) => env.insert(k.clone(), v.clone()),
                        None => env.remove(k),
                    };
                }

                Some(env)
            }
            Self::Replace(env) => Some(env.clone()),
        }
    }
}
