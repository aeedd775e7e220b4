//! Run identifiers (strongly-typed IDs).
//!
//! ULID ベースの ID を Phantom type パターンで型付けしています。
//! `RunId` は 1 回の action 実行、`SessionId` は 1 回の mutation session を指し、
//! どちらも tracing の span に載せてログを突き合わせるために使います。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"run-", "session-"）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// `T` は実行時にはメモリを消費しないマーカーで、`RunId` と `SessionId` を
/// 取り違えるとコンパイルエラーになります。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Action 実行のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Run {}

impl IdMarker for Run {
    fn prefix() -> &'static str {
        "run-"
    }
}

/// Mutation session のマーカー型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Session {}

impl IdMarker for Session {
    fn prefix() -> &'static str {
        "session-"
    }
}

/// Identifier of one action execution (one task graph).
pub type RunId = Id<Run>;

/// Identifier of one mutation session (load → check → transform → save).
pub type SessionId = Id<Session>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_their_prefix() {
        let run = RunId::from_ulid(Ulid::new());
        let session = SessionId::from_ulid(Ulid::new());

        assert!(run.to_string().starts_with("run-"));
        assert!(session.to_string().starts_with("session-"));
        // let _: RunId = session; // <- does not compile
    }

    #[test]
    fn ids_roundtrip_through_json() {
        let ulid = Ulid::new();
        let run = RunId::from_ulid(ulid);

        let s = serde_json::to_string(&run).unwrap();
        let back: RunId = serde_json::from_str(&s).unwrap();
        assert_eq!(back, run);
        assert_eq!(back.as_ulid(), ulid);
    }

    #[test]
    fn phantom_marker_is_free() {
        use std::mem::size_of;
        assert_eq!(size_of::<RunId>(), size_of::<Ulid>());
        assert_eq!(size_of::<SessionId>(), size_of::<Ulid>());
    }
}
