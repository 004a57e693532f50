//! Shared UI icons.
//!
//! Each icon falls back to an ASCII tag when the terminal cannot render emoji.

use console::Emoji;

// Step outcomes
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "[SKIP]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[WARN]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");

pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");
pub static WRENCH: Emoji<'_, '_> = Emoji("🔧 ", "-");
