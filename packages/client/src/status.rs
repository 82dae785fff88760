//! etcd v2 service error codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The `errorCode` carried in an etcd error envelope.
///
/// Codes this client does not know are kept as [`ErrorCode::Unknown`] so the
/// original number is never lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum ErrorCode {
    KeyNotFound,
    TestFailed,
    NotFile,
    NoMorePeer,
    NotDir,
    NodeExist,
    KeyIsPreserved,
    RootReadOnly,
    ValueRequired,
    PrevValueRequired,
    TtlNaN,
    IndexNaN,
    RaftInternal,
    LeaderElect,
    WatcherCleared,
    EventIndexCleared,
    Unknown(u32),
}

impl ErrorCode {
    pub fn code(self) -> u32 {
        match self {
            ErrorCode::KeyNotFound => 100,
            ErrorCode::TestFailed => 101,
            ErrorCode::NotFile => 102,
            ErrorCode::NoMorePeer => 103,
            ErrorCode::NotDir => 104,
            ErrorCode::NodeExist => 105,
            ErrorCode::KeyIsPreserved => 106,
            ErrorCode::RootReadOnly => 107,
            ErrorCode::ValueRequired => 200,
            ErrorCode::PrevValueRequired => 201,
            ErrorCode::TtlNaN => 202,
            ErrorCode::IndexNaN => 203,
            ErrorCode::RaftInternal => 300,
            ErrorCode::LeaderElect => 301,
            ErrorCode::WatcherCleared => 400,
            ErrorCode::EventIndexCleared => 401,
            ErrorCode::Unknown(code) => code,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::KeyNotFound => "key not found",
            ErrorCode::TestFailed => "compare failed",
            ErrorCode::NotFile => "not a file",
            ErrorCode::NoMorePeer => "reached the max number of peers in the cluster",
            ErrorCode::NotDir => "not a directory",
            ErrorCode::NodeExist => "key already exists",
            ErrorCode::KeyIsPreserved => "the prefix of given key is a keyword in etcd",
            ErrorCode::RootReadOnly => "root is read only",
            ErrorCode::ValueRequired => "value is required in POST form",
            ErrorCode::PrevValueRequired => "prevValue is required in POST form",
            ErrorCode::TtlNaN => "the given TTL in POST form is not a number",
            ErrorCode::IndexNaN => "the given index in POST form is not a number",
            ErrorCode::RaftInternal => "raft internal error",
            ErrorCode::LeaderElect => "during leader election",
            ErrorCode::WatcherCleared => "watcher is cleared due to etcd recovery",
            ErrorCode::EventIndexCleared => "the event in requested index is outdated and cleared",
            ErrorCode::Unknown(_) => "unknown error",
        }
    }
}

impl From<u32> for ErrorCode {
    fn from(code: u32) -> Self {
        match code {
            100 => ErrorCode::KeyNotFound,
            101 => ErrorCode::TestFailed,
            102 => ErrorCode::NotFile,
            103 => ErrorCode::NoMorePeer,
            104 => ErrorCode::NotDir,
            105 => ErrorCode::NodeExist,
            106 => ErrorCode::KeyIsPreserved,
            107 => ErrorCode::RootReadOnly,
            200 => ErrorCode::ValueRequired,
            201 => ErrorCode::PrevValueRequired,
            202 => ErrorCode::TtlNaN,
            203 => ErrorCode::IndexNaN,
            300 => ErrorCode::RaftInternal,
            301 => ErrorCode::LeaderElect,
            400 => ErrorCode::WatcherCleared,
            401 => ErrorCode::EventIndexCleared,
            other => ErrorCode::Unknown(other),
        }
    }
}

impl From<ErrorCode> for u32 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.code())
    }
}
