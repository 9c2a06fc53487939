//! Dashboard demo: a small live screen on top of the frame loop.
//!
//! Demonstrates:
//! - Cached widgets (the header only redraws when its text changes)
//! - Boxes, styled spans and embedded-ANSI text
//! - Input handled between frames
//! - Screen transitions that drop the widget cache
//!
//! Keys: `q`/`Esc` quit, `space` pause, `tab` switch screen, `c` clear.
//! Logs go to `cellframe-demo.log` (`RUST_LOG=cellframe=debug` for frames).

use cellframe::{
    content_hash, App, Color, EngineConfig, FrameContext, FrameStats, LoopControl, Rect, Runtime,
    StyledText, Style, TerminalEvent, WidgetKey,
};
use crossterm::event::KeyCode;
use std::collections::VecDeque;
use std::fs::File;
use std::io::Write;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const ACCENT: Color = Color::from_u32(0x5F_AFFF);
const PANEL_BG: Color = Color::from_u32(0x1C_1C1C);
const BAR_BG: Color = Color::from_u32(0x00_0050);
const GOOD: Color = Color::from_u32(0x87_D787);
const WARN: Color = Color::from_u32(0xFF_D75F);

#[derive(Clone, Copy, PartialEq, Eq)]
enum Screen {
    Overview,
    Log,
}

struct Dashboard {
    screen: Screen,
    paused: bool,
    ticks: u64,
    last: Option<FrameStats>,
    log: VecDeque<String>,
}

impl Dashboard {
    fn new() -> Self {
        Self {
            screen: Screen::Overview,
            paused: false,
            ticks: 0,
            last: None,
            log: VecDeque::new(),
        }
    }

    fn push_log(&mut self, line: String) {
        if self.log.len() == 200 {
            self.log.pop_front();
        }
        self.log.push_back(line);
    }

    fn draw_header<W: Write>(&self, frame: &mut FrameContext<'_, W>, width: u16) {
        let title = match self.screen {
            Screen::Overview => " cellframe dashboard: overview ",
            Screen::Log => " cellframe dashboard: event log ",
        };
        let key = WidgetKey::new("header", "title", Rect::new(0, 0, width, 1), 0);
        frame.render_widget(&key, &content_hash(title), |c, rect| {
            c.fill(0, 0, i32::from(rect.width), 1, ' ', Style::new(Color::WHITE, BAR_BG));
            c.write_str(1, 0, title, Color::WHITE, BAR_BG);
            Ok::<(), String>(())
        });
    }

    fn draw_overview<W: Write>(&self, frame: &mut FrameContext<'_, W>, area: Rect) {
        let c = &mut *frame.compositor;
        let (left, right) = area.split_horizontal(area.width / 2);
        let (x, y) = (i32::from(left.x), i32::from(left.y));

        c.begin_layer(0);
        c.draw_box(x, y, i32::from(left.width), i32::from(left.height), ACCENT, PANEL_BG);
        c.write_at(x + 2, y + 1, &StyledText::styled("Frames", Style::new(ACCENT, PANEL_BG)));

        let state = if self.paused {
            StyledText::new().span("state  ", Color::WHITE, PANEL_BG).span("paused", WARN, PANEL_BG)
        } else {
            StyledText::new().span("state  ", Color::WHITE, PANEL_BG).span("running", GOOD, PANEL_BG)
        };
        c.write_at(x + 2, y + 3, &state);
        c.write_str(x + 2, y + 4, &format!("ticks  {:<10}", self.ticks), Color::WHITE, PANEL_BG);
        if let Some(last) = &self.last {
            c.write_str(x + 2, y + 5, &format!("cells  {:<10}", last.diff.cells_changed), Color::WHITE, PANEL_BG);
            c.write_str(x + 2, y + 6, &format!("bytes  {:<10}", last.bytes_written), Color::WHITE, PANEL_BG);
        }
        let stats = *c.stats();
        c.write_str(x + 2, y + 7, &format!("avg us {:<10}", stats.avg_render_us), Color::WHITE, PANEL_BG);
        c.end_layer();

        // A moving bar, to give the diff something to do.
        c.begin_layer(1);
        let (rx, ry) = (i32::from(right.x), i32::from(right.y));
        c.draw_box(rx, ry, i32::from(right.width), i32::from(right.height), ACCENT, PANEL_BG);
        let inner = i32::from(right.width.saturating_sub(4)).max(1);
        let pos = i32::try_from(self.ticks % u64::from(inner.unsigned_abs())).unwrap_or(0);
        c.fill(rx + 2, ry + 2, inner, 1, '·', Style::new(Color::from_u32(0x44_4444), PANEL_BG));
        c.write_ansi(rx + 2 + pos, ry + 2, "\x1b[38;2;135;215;135m█\x1b[0m");
        c.end_layer();
    }

    fn draw_log<W: Write>(&self, frame: &mut FrameContext<'_, W>, area: Rect) {
        let c = &mut *frame.compositor;
        let (x, y) = (i32::from(area.x), i32::from(area.y));
        c.draw_box(x, y, i32::from(area.width), i32::from(area.height), ACCENT, PANEL_BG);

        let rows = usize::from(area.height.saturating_sub(2));
        let width = usize::from(area.width.saturating_sub(4));
        let skip = self.log.len().saturating_sub(rows);
        for (i, line) in self.log.iter().skip(skip).enumerate() {
            let row = y + 1 + i32::try_from(i).unwrap_or(0);
            c.write_str(x + 2, row, &format!("{line:<width$}"), Color::WHITE, PANEL_BG);
        }
    }

    fn draw_status<W: Write>(&self, frame: &mut FrameContext<'_, W>, width: u16, y: u16) {
        let cache = frame.cache.stats();
        let text = format!(
            " q quit · space pause · tab screen · c clear    cache {}/{} hit {:.0}% ",
            cache.entries,
            cache.capacity,
            cache.hit_rate() * 100.0
        );
        let c = &mut *frame.compositor;
        c.fill(0, i32::from(y), i32::from(width), 1, ' ', Style::new(Color::WHITE, BAR_BG));
        c.write_str(0, i32::from(y), &text, Color::WHITE, BAR_BG);
    }
}

impl App for Dashboard {
    fn draw<W: Write>(&mut self, frame: &mut FrameContext<'_, W>) {
        let bounds = frame.compositor.bounds();
        if bounds.height < 4 {
            return;
        }
        let (_, rest) = bounds.split_vertical(1);
        let (body, status) = rest.split_vertical(rest.height - 1);

        self.draw_header(frame, bounds.width);
        match self.screen {
            Screen::Overview => self.draw_overview(frame, body),
            Screen::Log => self.draw_log(frame, body),
        }
        self.draw_status(frame, bounds.width, status.y);
    }

    fn handle_event(&mut self, event: &TerminalEvent, control: &mut LoopControl) {
        match event {
            TerminalEvent::Key(key) => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => control.stop(),
                KeyCode::Char(' ') => self.paused = !self.paused,
                KeyCode::Char('c') => control.request_clear(),
                KeyCode::Tab => {
                    self.screen = match self.screen {
                        Screen::Overview => Screen::Log,
                        Screen::Log => Screen::Overview,
                    };
                    control.transition();
                }
                code => self.push_log(format!("key {code:?}")),
            },
            TerminalEvent::Resize { width, height } => {
                self.push_log(format!("resized to {width}x{height}"));
            }
            other => self.push_log(format!("{other:?}")),
        }
    }

    fn tick(&mut self, stats: &FrameStats, _control: &mut LoopControl) {
        if !self.paused {
            self.ticks += 1;
        }
        self.last = Some(*stats);
    }
}

fn main() -> cellframe::Result<()> {
    let log = File::create("cellframe-demo.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cellframe=info")))
        .with_writer(Mutex::new(log))
        .with_ansi(false)
        .init();

    let config = EngineConfig::default().with_target_fps(30);
    let mut runtime = Runtime::new(&config)?;
    let mut app = Dashboard::new();
    let frames = runtime.run(&mut app)?;
    runtime.shutdown()?;

    println!("rendered {frames} frames");
    Ok(())
}
