//! Plain-text rendering of the challenge board.

use std::fmt::Write;

use challenge_core::color::Rgb;
use challenge_core::model::Goal;
use services::{MemberStanding, WinnerEntry};

const BAR_WIDTH: usize = 24;
const WIN_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const YELLOW: &str = "\x1b[33m";

/// Everything the board shows, borrowed from the store.
pub struct Board<'a> {
    pub goal: Goal,
    pub winners: &'a [WinnerEntry],
    pub standings: &'a [MemberStanding],
}

/// Renders the board. ANSI styling is emitted only when `ansi` is set.
#[must_use]
pub fn render_board(board: &Board<'_>, ansi: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", bold("LeetCode Challenge Tracker", ansi));
    let _ = writeln!(out, "Total Challenge Goal: {} Problems", board.goal);

    if !board.winners.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", bold("Challenge Winners", ansi));
        for winner in board.winners {
            let line = format!(
                "{} completed on {}",
                winner.name,
                winner.won_at.format(WIN_TIME_FORMAT)
            );
            let _ = writeln!(out, "  {}", paint(&line, YELLOW, ansi));
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", bold("Member Progress", ansi));
    if board.standings.is_empty() {
        let _ = writeln!(out, "  (no members yet)");
    }
    let name_width = board
        .standings
        .iter()
        .map(|row| row.name.as_str().chars().count())
        .max()
        .unwrap_or(0);
    for row in board.standings {
        let _ = writeln!(
            out,
            "  {:<name_width$}  [{}]  {}/{} Problems  {}",
            row.name.as_str(),
            progress_bar(row.ratio, row.color, ansi),
            row.solved,
            row.goal,
            row.color,
        );
    }
    out
}

/// A fixed-width bar, filled in proportion to `ratio`.
#[must_use]
pub fn progress_bar(ratio: f64, color: Rgb, ansi: bool) -> String {
    let filled = filled_cells(ratio);
    let bar = "#".repeat(filled);
    let rest = "-".repeat(BAR_WIDTH - filled);
    if ansi {
        format!(
            "\x1b[38;2;{};{};{}m{bar}{RESET}{rest}",
            color.r, color.g, color.b
        )
    } else {
        format!("{bar}{rest}")
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn filled_cells(ratio: f64) -> usize {
    let ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
    ((ratio * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH)
}

fn bold(text: &str, ansi: bool) -> String {
    paint(text, BOLD, ansi)
}

fn paint(text: &str, code: &str, ansi: bool) -> String {
    if ansi {
        format!("{code}{text}{RESET}")
    } else {
        text.to_owned()
    }
}
