use std::fmt;

use serde::Serialize;

/// Debug event reported by a [DebugSession](crate::debugger::DebugSession).
///
/// All the data is copied out of the OS notification, so the event stays
/// valid once the debuggee is resumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugEvent {
    /// ID of the process the event comes from.
    pub process_id: u32,

    /// ID of the thread the event comes from.
    pub thread_id: u32,

    /// Kind-specific data.
    #[serde(flatten)]
    pub info: DebugEventInfo,
}

/// Kind-specific data of a [DebugEvent].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DebugEventInfo {
    /// An exception occurred in the debuggee.
    Exception(ExceptionInfo),

    /// A thread was created.
    CreateThread(CreateThreadInfo),

    /// A process was created, or the debugger attached to it.
    CreateProcess(CreateProcessInfo),

    /// A thread has exited.
    #[serde(rename_all = "camelCase")]
    ExitThread {
        /// Exit code of the thread.
        exit_code: u32,
    },

    /// A process has exited.
    #[serde(rename_all = "camelCase")]
    ExitProcess {
        /// Exit code of the process.
        exit_code: u32,
    },

    /// A shared library was loaded.
    LoadDll(LoadDllInfo),

    /// A shared library was unloaded.
    #[serde(rename_all = "camelCase")]
    UnloadDll {
        /// Base address of the library before unloading.
        base_of_dll: u64,
    },

    /// The debuggee sent a debug string.
    OutputDebugString(OutputDebugStringInfo),

    /// The debuggee died outside of the debugger's control.
    Rip(RipInfo),

    /// Event the backend could not map to a known kind.
    Unknown {
        /// Raw kind code.
        code: u32,
    },
}

impl DebugEventInfo {
    /// Returns the kind of this event, `None` for [Unknown](Self::Unknown).
    pub const fn kind(&self) -> Option<EventKind> {
        let kind = match self {
            Self::Exception(_) => EventKind::Exception,
            Self::CreateThread(_) => EventKind::CreateThread,
            Self::CreateProcess(_) => EventKind::CreateProcess,
            Self::ExitThread { .. } => EventKind::ExitThread,
            Self::ExitProcess { .. } => EventKind::ExitProcess,
            Self::LoadDll(_) => EventKind::LoadDll,
            Self::UnloadDll { .. } => EventKind::UnloadDll,
            Self::OutputDebugString(_) => EventKind::OutputDebugString,
            Self::Rip(_) => EventKind::Rip,
            Self::Unknown { .. } => return None,
        };

        Some(kind)
    }
}

/// The nine kinds of debug events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)] // see `DebugEventInfo`
pub enum EventKind {
    Exception,
    CreateThread,
    CreateProcess,
    ExitThread,
    ExitProcess,
    LoadDll,
    UnloadDll,
    OutputDebugString,
    Rip,
}

impl EventKind {
    /// All kinds, ordered by kind code.
    pub const ALL: [Self; 9] = [
        Self::Exception,
        Self::CreateThread,
        Self::CreateProcess,
        Self::ExitThread,
        Self::ExitProcess,
        Self::LoadDll,
        Self::UnloadDll,
        Self::OutputDebugString,
        Self::Rip,
    ];

    /// Returns the kind matching a debug event code (1 to 9).
    pub fn from_code(code: u32) -> Option<Self> {
        code.checked_sub(1)
            .and_then(|i| Self::ALL.get(i as usize))
            .copied()
    }

    /// Returns the debug event code of this kind.
    pub const fn code(self) -> u32 {
        self as u32 + 1
    }

    /// Returns the event name exposed to stream clients.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Exception => "exception",
            Self::CreateThread => "createThread",
            Self::CreateProcess => "createProcess",
            Self::ExitThread => "exitThread",
            Self::ExitProcess => "exitProcess",
            Self::LoadDll => "loadDll",
            Self::UnloadDll => "unloadDll",
            Self::OutputDebugString => "outputDebugString",
            Self::Rip => "rip",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Exception data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct ExceptionInfo {
    pub code: u32,
    pub flags: u32,
    pub address: u64,
    pub parameters: Vec<u64>,
    pub first_chance: bool,

    /// Whether the exception is a debugger trap (breakpoint, single-step).
    pub breakpoint: bool,
}

/// Thread creation data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct CreateThreadInfo {
    pub handle: u64,
    pub thread_local_base: u64,
    pub start_address: u64,
}

/// Process creation data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct CreateProcessInfo {
    pub file_handle: u64,
    pub process_handle: u64,
    pub thread_handle: u64,
    pub base_of_image: u64,
    pub debug_info_file_offset: u32,
    pub debug_info_size: u32,
    pub thread_local_base: u64,
    pub start_address: u64,

    /// Address of the image name in the debuggee (may be 0).
    pub image_name: u64,
    pub unicode: bool,
}

/// Shared library load data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct LoadDllInfo {
    pub file_handle: u64,
    pub base_of_dll: u64,
    pub debug_info_file_offset: u32,
    pub debug_info_size: u32,

    /// Address of the image name in the debuggee (may be 0).
    pub image_name: u64,
    pub unicode: bool,
}

/// Debug string data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct OutputDebugStringInfo {
    /// Address of the string in the debuggee.
    pub string_data: u64,
    pub unicode: bool,
    pub length: u16,
}

/// RIP data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct RipInfo {
    pub error: u32,
    pub rip_type: u32,
}

/// Event delivered to stream clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebuggerEvent {
    /// A classified debug event.
    Debug(DebugEvent),

    /// The debug loop failed, no further event follows.
    Error(String),

    /// The requested session does not exist, no further event follows.
    NotFound(String),
}

impl DebuggerEvent {
    /// Creates the event reported when no session exists at `index`.
    pub fn not_found(index: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("Cannot find debugger at index {index}"))
    }

    /// Returns the event name exposed to stream clients.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Debug(event) => event.info.kind().map_or("unknown", EventKind::name),
            Self::Error(_) => "error",
            Self::NotFound(_) => "notFound",
        }
    }

    /// Returns the payload exposed to stream clients.
    ///
    /// Debug events are JSON-encoded, diagnostics are plain text.
    pub fn payload(&self) -> String {
        match self {
            Self::Debug(event) => serde_json::to_string(event).unwrap_or_else(|e| {
                tracing::error!(error = %e, "debug event serialization");
                String::new()
            }),
            Self::Error(msg) | Self::NotFound(msg) => msg.clone(),
        }
    }

    /// Returns whether this is a diagnostic closing the stream.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Error(_) | Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::{DebugEvent, DebugEventInfo, DebuggerEvent, EventKind};

    #[test]
    fn kind_codes_match_debug_event_codes() {
        assert_eq!(EventKind::from_code(0), None);
        assert_eq!(EventKind::from_code(1), Some(EventKind::Exception));
        assert_eq!(EventKind::from_code(5), Some(EventKind::ExitProcess));
        assert_eq!(EventKind::from_code(9), Some(EventKind::Rip));
        assert_eq!(EventKind::from_code(10), None);

        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_code(kind.code()), Some(kind));
        }
    }

    #[test]
    fn debug_event_payload_is_flat_json() {
        let event = DebuggerEvent::Debug(DebugEvent {
            process_id: 42,
            thread_id: 43,
            info: DebugEventInfo::ExitThread { exit_code: 3 },
        });

        assert_eq!(event.name(), "exitThread");
        assert_eq!(
            event.payload(),
            r#"{"processId":42,"threadId":43,"exitCode":3}"#
        );
        assert!(!event.is_terminal());
    }

    #[test]
    fn not_found_payload_is_the_message() {
        let event = DebuggerEvent::not_found(7);

        assert_eq!(event.name(), "notFound");
        assert_eq!(event.payload(), "Cannot find debugger at index 7");
        assert!(event.is_terminal());
    }
}
