//! Terminal front end for a daily run. The arena is shown as a lettered grid;
//! typing the cell that holds the target counts as a hit.

use std::{fmt::Write as _, time::Duration};

use anyhow::{bail, Context};
use client_core::{CompetitionBackend, DailyCompetition, Leaderboard};
use minigame::{Arena, Point, RunSummary};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    time::{self, Instant, MissedTickBehavior},
};
use tracing::warn;

pub const GRID_COLS: u8 = 8;
pub const GRID_ROWS: u8 = 5;
const TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub col: u8,
    pub row: u8,
}

impl Cell {
    pub fn of(point: Point, arena: &Arena) -> Self {
        let scale = |value: f32, extent: f32, cells: u8| {
            let max = f32::from(cells - 1);
            ((value / extent) * f32::from(cells)).floor().clamp(0.0, max) as u8
        };
        Self {
            col: scale(point.x, arena.width, GRID_COLS),
            row: scale(point.y, arena.height, GRID_ROWS),
        }
    }

    pub fn label(self) -> String {
        format!("{}{}", char::from(b'a' + self.col), self.row + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayInput {
    Cell(Cell),
    Stop,
    Unknown,
}

pub fn parse_input(line: &str) -> PlayInput {
    let line = line.trim().to_ascii_lowercase();
    if matches!(line.as_str(), "s" | "q" | "stop" | "quit") {
        return PlayInput::Stop;
    }

    let mut chars = line.chars();
    let (Some(col), Ok(row)) = (chars.next(), chars.as_str().parse::<u8>()) else {
        return PlayInput::Unknown;
    };
    if !('a'..='h').contains(&col) || !(1..=GRID_ROWS).contains(&row) {
        return PlayInput::Unknown;
    }
    PlayInput::Cell(Cell {
        col: col as u8 - b'a',
        row: row - 1,
    })
}

pub fn render_grid(target: Option<Cell>) -> String {
    let mut out = String::from("   ");
    for col in 0..GRID_COLS {
        let _ = write!(out, " {}", char::from(b'a' + col));
    }
    out.push('\n');
    for row in 0..GRID_ROWS {
        let _ = write!(out, "{:>3}", row + 1);
        for col in 0..GRID_COLS {
            let mark = if target == Some(Cell { col, row }) { 'X' } else { '.' };
            let _ = write!(out, " {mark}");
        }
        out.push('\n');
    }
    out
}

pub fn render_leaderboard(board: &Leaderboard, me: Option<&str>) -> String {
    if board.is_empty() {
        return "No scores yet today.\n".to_string();
    }
    let mut out = String::new();
    for entry in &board.entries {
        let marker = if me == Some(entry.identity.as_str()) { " (you)" } else { "" };
        let _ = writeln!(
            out,
            "{:>3}. {:<32} {:>6}{marker}",
            entry.rank, entry.identity, entry.best_score
        );
    }
    out
}

pub fn render_summary(summary: &RunSummary) -> String {
    format!(
        "Run {} over: score {} | hits {} | misses {} | best streak {} | accuracy {:.0}%",
        summary.run_id,
        summary.score,
        summary.hits,
        summary.misses,
        summary.best_streak,
        summary.accuracy() * 100.0
    )
}

pub async fn play_daily<B>(competition: &mut DailyCompetition<B>) -> anyhow::Result<()>
where
    B: CompetitionBackend + ?Sized,
{
    println!(
        "Daily competition {} | best so far: {}",
        competition.day(),
        competition
            .best_saved()
            .map_or_else(|| "none".to_string(), |best| best.to_string())
    );
    println!(
        "{}s on the clock. Type the target's cell (e.g. c3) and press enter; s stops early.",
        competition.run().time_remaining().as_secs()
    );

    competition.start()?;
    let summary = drive_run(competition).await?;
    println!("{}", render_summary(&summary));

    match competition.complete_run(summary).await {
        Ok(receipt) => println!("Saved. Your best today: {}", receipt.best_score),
        Err(err) => {
            warn!(error = %err, "daily score was not saved");
            println!("Score not saved: {err}");
        }
    }
    if let Some(message) = competition.last_error() {
        println!("Note: {message}");
    }

    println!();
    print!(
        "{}",
        render_leaderboard(competition.leaderboard(), competition.user().email.as_deref())
    );
    Ok(())
}

async fn drive_run<B>(competition: &mut DailyCompetition<B>) -> anyhow::Result<RunSummary>
where
    B: CompetitionBackend + ?Sized,
{
    let arena = competition.run().config().arena;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = time::interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_tick = Instant::now();
    let mut shown = None;

    loop {
        let current = target_cell(competition, &arena);
        if current != shown {
            print!("{}", render_grid(current));
            shown = current;
        }

        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                let finished = competition.tick(now - last_tick);
                last_tick = now;
                if let Some(summary) = finished {
                    return Ok(summary);
                }
            }
            line = lines.next_line() => {
                let input = match line.context("failed to read input")? {
                    Some(line) => parse_input(&line),
                    None => PlayInput::Stop,
                };
                match input {
                    PlayInput::Stop => match competition.stop() {
                        Some(summary) => return Ok(summary),
                        None => bail!("run ended before it could be stopped"),
                    },
                    PlayInput::Cell(cell) => {
                        let target = target_cell(competition, &arena);
                        let verdict = if target == Some(cell) {
                            competition.hit();
                            "hit".to_string()
                        } else {
                            competition.miss();
                            target.map_or_else(
                                || "miss".to_string(),
                                |at| format!("miss, target was {}", at.label()),
                            )
                        };
                        if let Some(run) = competition.run().active() {
                            println!(
                                "{verdict} | score {} | streak {} | {}s left",
                                run.tally.score,
                                run.tally.streak,
                                run.remaining.as_secs()
                            );
                        }
                    }
                    PlayInput::Unknown => println!("type a cell like c3, or s to stop"),
                }
            }
        }
    }
}

fn target_cell<B>(competition: &DailyCompetition<B>, arena: &Arena) -> Option<Cell>
where
    B: CompetitionBackend + ?Sized,
{
    competition
        .run()
        .target()
        .map(|target| Cell::of(target.position, arena))
}
