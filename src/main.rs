//! Decrypt text in the terminal.
//!
//! Every text on the page is a mounted effect. Effects that activate on view start when they
//! scroll into the viewport, hover effects follow the mouse.

mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers, MouseEventKind},
    execute, queue,
    style::{PrintStyledContent, Stylize},
    terminal::{self, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use decrypted_text::{render, EffectHandle, Frame, Page, PageEntry, Preset, Stage};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::{
    io::{self, Write},
    path::PathBuf,
    time::{Duration, Instant},
};

/// How long to wait for input when no tick is pending
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Rows each page entry takes up, including the gap below it
const ENTRY_ROWS: u16 = 3;

#[derive(Parser, Debug)]
#[command(name = "decrypted-text", about = "Watch text decrypt itself", version)]
struct Cli {
    /// Texts to decrypt, one per line.
    texts: Vec<String>,

    /// Load the page from a YAML file.
    #[clap(short, long, conflicts_with_all = ["texts", "preset"])]
    config: Option<PathBuf>,

    /// Use a built-in page: gallery, featured-artists or showcase.
    #[clap(short, long, conflicts_with = "texts")]
    preset: Option<Preset>,

    /// Start runs when the mouse hovers a text rather than when it comes into view.
    #[clap(long)]
    hover: bool,

    /// Reveal one character per tick.
    #[clap(long)]
    sequential: bool,

    /// The order characters are revealed in: start, end or center.
    #[clap(long)]
    order: Option<String>,

    /// Milliseconds between ticks.
    #[clap(long, allow_negative_numbers = true)]
    interval: Option<i64>,

    /// Scrambles before a non-sequential run settles.
    #[clap(long, allow_negative_numbers = true)]
    iterations: Option<i64>,

    /// Characters to scramble with.
    #[clap(long, conflicts_with = "original_chars")]
    characters: Option<String>,

    /// Scramble with the text's own characters.
    #[clap(long)]
    original_chars: bool,

    /// Seed the scrambling to get the same run every time.
    #[clap(long)]
    seed: Option<u64>,

    /// Decrypt everything once without a UI, printing every frame.
    #[clap(long)]
    once: bool,

    /// Print frames as JSON lines.
    #[clap(long, requires = "once")]
    json: bool,

    /// Write logs to this file. Filter them with RUST_LOG.
    #[clap(long, env = "DECRYPTED_TEXT_LOG")]
    log_file: Option<PathBuf>,

    /// Print the JSON schema of the effect options and exit.
    #[cfg(feature = "json-schema")]
    #[clap(long)]
    print_schema: bool,
}

impl Cli {
    /// Options given on the command line, applied on top of every page entry
    fn overrides(&self) -> Mapping {
        let mut overrides = Mapping::new();
        if self.hover {
            set(&mut overrides, "activation", "hover".into());
        }
        if self.sequential {
            set(&mut overrides, "sequential", true.into());
        }
        if let Some(order) = &self.order {
            set(&mut overrides, "reveal_order", order.as_str().into());
        }
        if let Some(interval) = self.interval {
            set(&mut overrides, "tick_interval_ms", interval.into());
        }
        if let Some(iterations) = self.iterations {
            set(&mut overrides, "max_iterations", iterations.into());
        }
        if let Some(characters) = &self.characters {
            set(&mut overrides, "alphabet", "custom".into());
            set(&mut overrides, "characters", characters.as_str().into());
        }
        if self.original_chars {
            set(&mut overrides, "alphabet", "original".into());
        }
        overrides
    }

    fn page(&self) -> Result<Page> {
        let overrides = self.overrides();
        if let Some(path) = &self.config {
            return Page::load(path, &overrides).with_context(|| format!("loading page {}", path.display()));
        }
        if !self.texts.is_empty() {
            return Ok(Page::from_texts(self.texts.clone(), &overrides)?);
        }
        if let Some(preset) = self.preset {
            return Ok(Page::preset(preset, &overrides)?);
        }
        match Page::default_path().filter(|path| path.exists()) {
            Some(path) => Page::load(&path, &overrides).with_context(|| format!("loading page {}", path.display())),
            None => Ok(Page::preset(Preset::Showcase, &overrides)?),
        }
    }

    fn stage(&self) -> Stage {
        match self.seed {
            Some(seed) => Stage::with_seed(seed),
            None => Stage::new(),
        }
    }
}

fn set(mapping: &mut Mapping, key: &str, value: Value) {
    mapping.insert(key.into(), value);
}

fn mount_all(stage: &mut Stage, entries: &[PageEntry]) -> Result<Vec<EffectHandle>> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            stage.mount(&entry.text, entry.config.clone()).with_context(|| format!("mounting entry {index}"))
        })
        .collect()
}

#[derive(Serialize)]
struct FrameEvent<'a> {
    entry: usize,
    at_ms: u128,
    frame: &'a Frame,
}

/// Activate everything at once and print frames until every run settles
fn run_once(mut stage: Stage, page: Page, json: bool) -> Result<()> {
    let handles = mount_all(&mut stage, &page.entries)?;
    for handle in &handles {
        stage.pointer_enter(*handle);
        stage.visibility_changed(*handle, 1.0);
    }
    let mut stdout = io::stdout().lock();
    while let Some(due) = stage.next_due() {
        for handle in stage.advance(due.saturating_sub(stage.now())) {
            let (Some(entry), Some(frame)) = (handles.iter().position(|h| *h == handle), stage.frame(handle)) else {
                continue;
            };
            if json {
                let event = FrameEvent { entry, at_ms: stage.now().as_millis(), frame: &frame };
                serde_json::to_writer(&mut stdout, &event)?;
                writeln!(stdout)?;
            } else {
                writeln!(stdout, "{}", frame.text())?;
            }
        }
    }
    Ok(())
}

/// Puts the terminal back the way it was, however the UI exits
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), cursor::Show, DisableMouseCapture, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// A mounted page entry and where it sits on the page
#[derive(Debug)]
struct Placed {
    handle: EffectHandle,
    /// Row within the page, not the screen
    row: u16,
    width: u16,
}

struct Host {
    stage: Stage,
    entries: Vec<PageEntry>,
    placed: Vec<Placed>,
    scroll: u16,
    columns: u16,
    rows: u16,
    pointer: Option<(u16, u16)>,
    hovered: Option<EffectHandle>,
}

impl Host {
    fn new(stage: Stage, page: Page) -> Result<Self> {
        let (columns, rows) = terminal::size()?;
        let mut host = Self {
            stage,
            entries: page.entries,
            placed: Vec::new(),
            scroll: 0,
            columns,
            rows,
            pointer: None,
            hovered: None,
        };
        host.mount()?;
        Ok(host)
    }

    fn mount(&mut self) -> Result<()> {
        let handles = mount_all(&mut self.stage, &self.entries)?;
        self.placed = handles
            .into_iter()
            .enumerate()
            .map(|(index, handle)| {
                let width = self.stage.frame(handle).map(|f| render::frame_width(&f)).unwrap_or(0);
                Placed { handle, row: 1 + index as u16 * ENTRY_ROWS, width: width.min(u16::MAX as usize) as u16 }
            })
            .collect();
        self.hovered = None;
        self.refresh_visibility();
        self.refresh_hover();
        Ok(())
    }

    /// Tear everything down and mount the page again
    fn replay(&mut self) -> Result<()> {
        for placed in self.placed.drain(..) {
            self.stage.unmount(placed.handle);
        }
        self.mount()
    }

    /// Rows available to the page, the last one is the footer
    fn viewport_rows(&self) -> u16 {
        self.rows.saturating_sub(1)
    }

    fn page_rows(&self) -> u16 {
        1 + self.placed.len() as u16 * ENTRY_ROWS
    }

    fn screen_row(&self, placed: &Placed) -> Option<u16> {
        placed.row.checked_sub(self.scroll).filter(|row| *row < self.viewport_rows())
    }

    fn column(&self, placed: &Placed) -> u16 {
        self.columns.saturating_sub(placed.width) / 2
    }

    fn scroll_by(&mut self, delta: i32) {
        let max_scroll = self.page_rows().saturating_sub(self.viewport_rows());
        self.scroll = (i32::from(self.scroll) + delta).clamp(0, i32::from(max_scroll)) as u16;
        self.refresh_visibility();
        self.refresh_hover();
    }

    fn refresh_visibility(&mut self) {
        for placed in &self.placed {
            let fraction = if self.screen_row(placed).is_some() { 1.0 } else { 0.0 };
            self.stage.visibility_changed(placed.handle, fraction);
        }
    }

    fn refresh_hover(&mut self) {
        let hovered = self.pointer.and_then(|(column, row)| {
            self.placed
                .iter()
                .find(|placed| {
                    let start = self.column(placed);
                    self.screen_row(placed) == Some(row) && (start..start.saturating_add(placed.width)).contains(&column)
                })
                .map(|placed| placed.handle)
        });
        if hovered == self.hovered {
            return;
        }
        if let Some(previous) = self.hovered {
            self.stage.pointer_leave(previous);
        }
        if let Some(current) = hovered {
            self.stage.pointer_enter(current);
        }
        self.hovered = hovered;
    }

    /// Handle an input event. Returns `false` when the user asked to quit.
    fn handle(&mut self, event: Event) -> Result<bool> {
        match event {
            Event::Key(KeyEvent { code, modifiers, .. }) => match code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(false),
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(false),
                KeyCode::Char('r') => self.replay()?,
                KeyCode::Up | KeyCode::Char('k') => self.scroll_by(-1),
                KeyCode::Down | KeyCode::Char('j') => self.scroll_by(1),
                KeyCode::PageUp => self.scroll_by(-i32::from(self.viewport_rows())),
                KeyCode::PageDown => self.scroll_by(i32::from(self.viewport_rows())),
                _ => (),
            },
            Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => self.scroll_by(-1),
                MouseEventKind::ScrollDown => self.scroll_by(1),
                MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                    self.pointer = Some((mouse.column, mouse.row));
                    self.refresh_hover();
                }
                _ => (),
            },
            Event::Resize(columns, rows) => {
                self.columns = columns;
                self.rows = rows;
                self.scroll_by(0);
            }
            _ => (),
        }
        Ok(true)
    }

    fn draw<W: Write>(&self, out: &mut W) -> io::Result<()> {
        queue!(out, terminal::Clear(ClearType::All))?;
        for placed in &self.placed {
            let (Some(row), Some(effect)) = (self.screen_row(placed), self.stage.effect(placed.handle)) else {
                continue;
            };
            let config = effect.config();
            queue!(out, cursor::MoveTo(self.column(placed), row))?;
            render::draw_frame(out, &effect.frame(), &config.revealed_style, &config.masked_style)?;
        }
        let footer = " q quit  r replay  ↑/↓ scroll ";
        queue!(out, cursor::MoveTo(0, self.rows.saturating_sub(1)), PrintStyledContent(footer.dim()))?;
        out.flush()
    }

    fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        let mut last = Instant::now();
        let mut dirty = true;
        loop {
            if dirty {
                self.draw(&mut stdout)?;
                dirty = false;
            }
            let timeout = self
                .stage
                .next_due()
                .map(|due| due.saturating_sub(self.stage.now()).min(IDLE_POLL))
                .unwrap_or(IDLE_POLL);
            if event::poll(timeout)? {
                if !self.handle(event::read()?)? {
                    break;
                }
                dirty = true;
            }
            let now = Instant::now();
            dirty |= !self.stage.advance(now - last).is_empty();
            last = now;
        }
        for placed in self.placed.drain(..) {
            self.stage.unmount(placed.handle);
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "json-schema")]
    if cli.print_schema {
        let schema = schemars::schema_for!(decrypted_text::ScrambleOptions);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    logging::init(cli.log_file.as_deref(), !cli.once)?;
    let page = cli.page()?;
    tracing::info!(entries = page.entries.len(), "page loaded");

    if cli.once {
        return run_once(cli.stage(), page, cli.json);
    }
    let _guard = TerminalGuard::enter()?;
    Host::new(cli.stage(), page)?.run()
}
