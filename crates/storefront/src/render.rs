//! Plain-text rendering of screen views.

use core::fmt::Write as _;

use crate::screens::{Block, View};

const RULE_WIDTH: usize = 40;

/// Render `view` for a terminal.
///
/// Buttons show the command that triggers them, so every view doubles as
/// its own help text.
#[must_use]
pub fn render(view: &View, depth: usize) -> String {
    let mut out = String::new();
    let back = if depth > 1 { "< back   " } else { "" };
    let _ = writeln!(out, "{back}{}", view.title);
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));

    for block in &view.blocks {
        match block {
            Block::Text(text) => {
                let _ = writeln!(out, "{text}");
            }
            Block::Loading => {
                let _ = writeln!(out, "...");
            }
            Block::Error { message, retry } => {
                let _ = writeln!(out, "! {message}");
                if *retry {
                    let _ = writeln!(out, "  [retry]");
                }
            }
            Block::Notice(notice) => {
                let _ = writeln!(out, "* {notice}");
            }
            Block::Menu(items) => {
                let _ = writeln!(out, "| {} |", items.join(" | "));
            }
            Block::Item {
                label,
                detail,
                note,
            } => {
                let _ = writeln!(out, "- {label}  {detail}");
                if let Some(note) = note {
                    let _ = writeln!(out, "    {note}");
                }
            }
            Block::Input {
                field,
                label,
                value,
                error,
            } => {
                let _ = writeln!(out, "{label} ({field}): {value}");
                if let Some(error) = error {
                    let _ = writeln!(out, "    ! {error}");
                }
            }
            Block::Button { label, command } => {
                let _ = writeln!(out, "[{label}] -> {command}");
            }
        }
    }

    out
}
