use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};

use dbgrelay_core::Command;
use dbgrelay_core::debugger::{ContinueDecision, DebugSession, Debugger, OsError, TargetHandle};
use dbgrelay_core::event::{CreateProcessInfo, DebugEvent, DebugEventInfo, ExceptionInfo};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("scripted failure (os error {0})")]
    Os(i32),

    #[error("wait failed")]
    Wait,
}

impl OsError for Error {
    fn os_error_code(&self) -> Option<i32> {
        match self {
            Self::Os(code) => Some(*code),
            Self::Wait => None,
        }
    }
}

pub enum Step {
    Event(DebugEventInfo),
    WaitError,
}

/// Calls observed on the fake OS layer.
#[derive(Default)]
pub struct Probe {
    pub resumes: Mutex<Vec<ContinueDecision>>,
    pub terminated: AtomicUsize,
    pub closed: AtomicUsize,
    pub stopped: AtomicUsize,
}

impl Probe {
    pub fn resumes(&self) -> Vec<ContinueDecision> {
        self.resumes.lock().unwrap().clone()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Debugger replaying a scripted sequence of events.
///
/// Once the script is exhausted, the session blocks until the debuggee is
/// terminated.
pub struct ScriptedDebugger {
    pid: u32,
    script: VecDeque<Step>,
    launch_error: Option<i32>,
    probe: Arc<Probe>,
}

impl ScriptedDebugger {
    pub fn new(pid: u32, script: impl IntoIterator<Item = Step>) -> (Self, Arc<Probe>) {
        let probe = Arc::new(Probe::default());

        let debugger = Self {
            pid,
            script: script.into_iter().collect(),
            launch_error: None,
            probe: probe.clone(),
        };

        (debugger, probe)
    }

    pub fn failing(code: i32) -> Self {
        let (mut debugger, _) = Self::new(0, []);
        debugger.launch_error = Some(code);
        debugger
    }

    fn launch(&mut self) -> Result<(ScriptedSession, ScriptedHandle), Error> {
        if let Some(code) = self.launch_error {
            return Err(Error::Os(code));
        }

        let (tx, rx) = mpsc::channel();

        for step in self.script.drain(..) {
            let _ = tx.send(step);
        }

        let session = ScriptedSession {
            pid: self.pid,
            rx,
            probe: self.probe.clone(),
        };

        let handle = ScriptedHandle {
            pid: self.pid,
            tx: Mutex::new(tx),
            probe: self.probe.clone(),
        };

        Ok((session, handle))
    }
}

impl Debugger for ScriptedDebugger {
    type Session = ScriptedSession;
    type Handle = ScriptedHandle;
    type Error = Error;

    fn spawn(&mut self, _command: Command) -> Result<(Self::Session, Self::Handle), Self::Error> {
        self.launch()
    }

    fn attach(&mut self, _pid: u32) -> Result<(Self::Session, Self::Handle), Self::Error> {
        self.launch()
    }
}

pub struct ScriptedSession {
    pid: u32,
    rx: mpsc::Receiver<Step>,
    probe: Arc<Probe>,
}

impl DebugSession for ScriptedSession {
    type Error = Error;

    fn process_id(&self) -> u32 {
        self.pid
    }

    fn wait_event(&mut self) -> Result<DebugEvent, Self::Error> {
        match self.rx.recv() {
            Ok(Step::Event(info)) => Ok(DebugEvent {
                process_id: self.pid,
                thread_id: self.pid,
                info,
            }),
            Ok(Step::WaitError) | Err(_) => Err(Error::Wait),
        }
    }

    fn resume(&mut self, decision: ContinueDecision) -> Result<(), Self::Error> {
        self.probe.resumes.lock().unwrap().push(decision);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Self::Error> {
        self.probe.stopped.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct ScriptedHandle {
    pid: u32,
    tx: Mutex<mpsc::Sender<Step>>,
    probe: Arc<Probe>,
}

impl TargetHandle for ScriptedHandle {
    type Error = Error;

    fn terminate(&self, exit_code: i32) -> Result<(), Self::Error> {
        self.probe.terminated.fetch_add(1, Ordering::SeqCst);

        let exit = Step::Event(DebugEventInfo::ExitProcess {
            exit_code: exit_code as u32,
        });

        // the session may be gone already
        let _ = self.tx.lock().unwrap().send(exit);

        tracing::debug!(pid = self.pid, "terminated");
        Ok(())
    }

    fn close(self) -> Result<(), Self::Error> {
        self.probe.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn create_process() -> Step {
    Step::Event(DebugEventInfo::CreateProcess(CreateProcessInfo {
        file_handle: 0,
        process_handle: 1,
        thread_handle: 2,
        base_of_image: 0x400000,
        debug_info_file_offset: 0,
        debug_info_size: 0,
        thread_local_base: 0,
        start_address: 0x401000,
        image_name: 0,
        unicode: false,
    }))
}

pub fn exception(address: u64, breakpoint: bool) -> Step {
    Step::Event(DebugEventInfo::Exception(ExceptionInfo {
        code: if breakpoint { 0x80000003 } else { 0xc0000005 },
        flags: 0,
        address,
        parameters: Vec::new(),
        first_chance: true,
        breakpoint,
    }))
}

pub fn exit_thread(exit_code: u32) -> Step {
    Step::Event(DebugEventInfo::ExitThread { exit_code })
}

pub fn exit_process(exit_code: u32) -> Step {
    Step::Event(DebugEventInfo::ExitProcess { exit_code })
}
