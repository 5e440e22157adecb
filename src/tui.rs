use crate::models::{Listing, Rejection};
use crossterm::{
    cursor::MoveToPreviousLine,
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};

const BAR_WIDTH: usize = 30;
const RULE_WIDTH: usize = 80;

/// Live console view of a crawl: discovery passes, one line per detail page
/// and a progress bar pinned under the last line.
pub struct ScraperTUI {
    out: Box<dyn Write>,
    total: usize,
    accepted: usize,
    rejected: usize,
    progress_bar_printed: bool,
    line_in_progress: bool,
}

impl ScraperTUI {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Draws to `out` instead of stdout.
    pub fn with_writer(out: impl Write + 'static) -> Self {
        Self {
            out: Box::new(out),
            total: 0,
            accepted: 0,
            rejected: 0,
            progress_bar_printed: false,
            line_in_progress: false,
        }
    }

    pub fn start_gathering(&mut self, source: &str, max_pages: usize) -> io::Result<()> {
        execute!(
            self.out,
            SetForegroundColor(Color::White),
            Print(format!("⏳ Gathering URLs from {} (0/{})...\n", source, max_pages)),
            ResetColor
        )
    }

    pub fn update_gathering_progress(
        &mut self,
        source: &str,
        current_page: usize,
        max_pages: usize,
        urls_found: usize,
    ) -> io::Result<()> {
        let spinner = match current_page % 4 {
            0 => "⠋",
            1 => "⠙",
            2 => "⠹",
            _ => "⠸",
        };

        execute!(
            self.out,
            MoveToPreviousLine(1),
            Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::White),
            Print(format!(
                "{} Gathering URLs from {} ({}/{}) - {} URLs found\n",
                spinner, source, current_page, max_pages, urls_found
            )),
            ResetColor
        )
    }

    pub fn finish_gathering(&mut self, source: &str, total_urls: usize) -> io::Result<()> {
        execute!(
            self.out,
            MoveToPreviousLine(1),
            Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::DarkGrey),
            Print(format!("✓ Gathered {} URLs from {}\n", total_urls, source)),
            ResetColor
        )
    }

    /// Announces the merged candidate list and draws the empty progress bar.
    pub fn show_candidates(&mut self, total: usize) -> io::Result<()> {
        self.total = total;
        execute!(
            self.out,
            SetForegroundColor(Color::White),
            Print(format!("🔍 {} candidate listings after merge\n", total)),
            ResetColor
        )?;
        if total > 0 {
            self.print_progress_bar()?;
            self.progress_bar_printed = true;
        }
        Ok(())
    }

    pub fn start_listing(&mut self, url: &str) -> io::Result<()> {
        self.clear_progress_bar()?;
        execute!(
            self.out,
            SetForegroundColor(Color::White),
            Print(format!("  🔄 {}\n", truncate_url(url))),
            ResetColor
        )?;
        self.line_in_progress = true;
        self.print_progress_bar()
    }

    pub fn finish_listing(&mut self, outcome: Result<&Listing, &Rejection>) -> io::Result<()> {
        self.clear_progress_bar()?;
        if self.line_in_progress {
            execute!(self.out, MoveToPreviousLine(1), Clear(ClearType::CurrentLine))?;
            self.line_in_progress = false;
        }

        match outcome {
            Ok(listing) => {
                self.accepted += 1;
                execute!(
                    self.out,
                    SetForegroundColor(Color::Green),
                    Print(format!(
                        "  ✅ {} | R {} | {} beds | {}\n",
                        listing.reference, listing.price, listing.beds, listing.area
                    )),
                    ResetColor
                )?;
            }
            Err(rejection) => {
                self.rejected += 1;
                execute!(
                    self.out,
                    SetForegroundColor(Color::Red),
                    Print(format!(
                        "  ❌ {} ({})\n",
                        truncate_url(&rejection.url),
                        rejection.reason
                    )),
                    ResetColor
                )?;
            }
        }

        self.print_progress_bar()
    }

    pub fn show_final_summary(&mut self, catalog_size: usize) -> io::Result<()> {
        self.clear_progress_bar()?;
        self.progress_bar_printed = false;

        execute!(
            self.out,
            Print("─".repeat(RULE_WIDTH)),
            Print("\n"),
            SetForegroundColor(Color::Green),
            Print(format!("✅ Crawl completed: {} accepted", self.accepted)),
            ResetColor
        )?;

        if self.rejected > 0 {
            execute!(
                self.out,
                SetForegroundColor(Color::Red),
                Print(format!(", {} rejected", self.rejected)),
                ResetColor
            )?;
        }

        execute!(
            self.out,
            SetForegroundColor(Color::DarkGrey),
            Print(format!(" | catalog: {} listings\n", catalog_size)),
            ResetColor
        )
    }

    fn print_progress_bar(&mut self) -> io::Result<()> {
        if self.total == 0 {
            return Ok(());
        }
        let text = self.progress_bar_text();
        execute!(
            self.out,
            Print("─".repeat(RULE_WIDTH)),
            Print("\n"),
            SetForegroundColor(Color::White),
            Print(text),
            Print("\n"),
            ResetColor
        )
    }

    /// Removes the rule and bar lines so the next line can take their place.
    fn clear_progress_bar(&mut self) -> io::Result<()> {
        if self.progress_bar_printed && self.total > 0 {
            execute!(
                self.out,
                MoveToPreviousLine(2),
                Clear(ClearType::FromCursorDown),
            )?;
        }
        Ok(())
    }

    fn progress_bar_text(&self) -> String {
        let done = self.accepted + self.rejected;
        let total = self.total.max(1);
        let percentage = (done * 100) / total;
        let filled = ((done * BAR_WIDTH) / total).min(BAR_WIDTH);
        let bar = format!("[{}{}]", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled));

        if self.rejected > 0 {
            format!(
                "Progress: {} {}/{} ({}%) | {} rejected",
                bar, done, self.total, percentage, self.rejected
            )
        } else {
            format!("Progress: {} {}/{} ({}%)", bar, done, self.total, percentage)
        }
    }
}

impl Default for ScraperTUI {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate_url(url: &str) -> String {
    if url.chars().count() > 80 {
        let head: String = url.chars().take(77).collect();
        format!("{}...", head)
    } else {
        url.to_string()
    }
}
