//! Shared UI icons and emojis.
//!
//! Each icon carries a plain-text fallback for terminals without emoji.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[x]");
pub static OPEN: Emoji<'_, '_> = Emoji("⬜ ", "[ ]");
pub static OVERDUE: Emoji<'_, '_> = Emoji("⏰ ", "[!]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");

// Priority indicators
pub static HIGH: Emoji<'_, '_> = Emoji("🔴 ", "(H)");
pub static MEDIUM: Emoji<'_, '_> = Emoji("🟡 ", "(M)");
pub static LOW: Emoji<'_, '_> = Emoji("🟢 ", "(L)");

// Section headers
pub static BOARD: Emoji<'_, '_> = Emoji("📋 ", "#");
pub static COLUMN: Emoji<'_, '_> = Emoji("📂 ", ">");
pub static STATS: Emoji<'_, '_> = Emoji("📊 ", "[STATS]");
pub static ACTIVITY: Emoji<'_, '_> = Emoji("🕒 ", "[LOG]");
