//! Conflict detection - 既存マーカー（先行する・競合する操作の痕跡）の検出
//!
//! - `marker`: パターンとラベル、`MarkerSet`
//! - `detector`: scan と、確認結果からの判断（純粋関数）
//! - `catalog`: action ごとのマーカー集合

pub mod catalog;
pub mod detector;
pub mod marker;

pub use detector::{ConflictCheck, ConflictDetector, OnConflict, PendingConfirmation, Resolution};
pub use marker::{ConflictMarker, MarkerMatch, MarkerSet};
