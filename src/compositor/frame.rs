//! Compositor: frame lifecycle, layers and the draw API.
//!
//! The compositor owns the two buffers of the double-buffer scheme:
//!
//! - the **backbuffer**, which every draw call writes to, and
//! - the **baseline**, which holds what the terminal is believed to show.
//!
//! `end_frame` diffs the two, writes the result in one `write_all`, and
//! commits the backbuffer as the new baseline. Nothing reaches the terminal
//! between `begin_frame` and `end_frame`.

use super::styled::StyledText;
use crate::buffer::diff::{invalidate_all, invalidate_rows, render_diff, DiffStats};
use crate::buffer::{Cell, CellBuffer, Color, RowPaint, Snapshot, Style};
use crate::cache::{RenderCache, WidgetKey};
use crate::error::{Error, Result};
use crate::layout::Rect;
use crate::terminal::OutputBuffer;
use std::fmt;
use std::io::Write;
use std::ops::Range;
use std::time::{Duration, Instant};

/// Background of the placeholder drawn for a widget that failed to render.
const ERROR_BG: Color = Color::from_u32(0x5F_0000);
/// Foreground of the placeholder text.
const ERROR_FG: Color = Color::from_u32(0xFF_D7D7);

/// Where the compositor is in its frame lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameState {
    /// Between frames. `begin_frame` is the only lifecycle call allowed.
    #[default]
    Idle,
    /// Drawing. `end_frame` flushes and returns to `Idle`.
    InFrame,
}

/// What `end_frame` did for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// 1-based number of the frame.
    pub frame: u64,
    /// Diff statistics for the frame.
    pub diff: DiffStats,
    /// Bytes handed to the writer (diff plus cursor sequences).
    pub bytes_written: usize,
    /// Layers opened below an already-opened layer during the frame.
    pub layer_violations: usize,
    /// Time from `begin_frame` to the end of the flush.
    pub render_time: Duration,
}

/// Render statistics accumulated across frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Total frames rendered.
    pub frames: u64,
    /// Total cells changed across all frames.
    pub cells_changed: u64,
    /// Total bytes written to the terminal.
    pub bytes_written: u64,
    /// Smoothed render time in microseconds.
    pub avg_render_us: u64,
    /// Last render time in microseconds.
    pub last_render_us: u64,
    /// Frames whose write to the terminal failed.
    pub write_errors: u64,
}

/// How [`Compositor::render_widget`] produced a widget's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetOutcome {
    /// Cells came from the cache.
    Cached,
    /// The widget was drawn and its cells stored.
    Rendered,
    /// The widget's render function failed; a placeholder was drawn instead.
    Failed,
}

/// Frame-based compositor writing to any [`Write`] sink.
///
/// ```
/// use cellframe::{Color, Compositor};
///
/// let mut compositor = Compositor::new(Vec::new(), 20, 4).unwrap();
/// compositor.begin_frame().unwrap();
/// compositor.write_str(0, 0, "hello", Color::DEFAULT, Color::DEFAULT);
/// let stats = compositor.end_frame().unwrap();
/// assert_eq!(stats.diff.cells_changed, 80);
/// ```
pub struct Compositor<W: Write> {
    writer: W,
    /// Backbuffer: what the next frame will show.
    current: CellBuffer,
    /// What the terminal shows.
    previous: CellBuffer,
    /// Reused output buffer.
    output: OutputBuffer,
    state: FrameState,
    frame_count: u64,
    frame_start: Instant,
    /// Set by `request_clear`, consumed by the next `begin_frame`.
    clear_requested: bool,
    /// Open layers, innermost last.
    layers: Vec<i32>,
    /// Highest z opened in the current frame.
    max_z: Option<i32>,
    layer_violations: usize,
    /// Requested caret position (`None` = hidden).
    cursor: Option<(u16, u16)>,
    /// Caret state last sent to the terminal; outer `None` = unknown.
    shown_cursor: Option<Option<(u16, u16)>>,
    /// The terminal's colors and attributes are not known to be defaults.
    sgr_unknown: bool,
    stats: RenderStats,
}

impl<W: Write> Compositor<W> {
    /// Create a compositor for a `width`×`height` terminal.
    ///
    /// The baseline starts invalidated, so the first frame paints every cell
    /// whatever the terminal held before. That frame also starts with an SGR
    /// reset, since the diff assumes default colors.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDimensions`] if either dimension is 0.
    pub fn new(writer: W, width: u16, height: u16) -> Result<Self> {
        let current = CellBuffer::new(width, height)?;
        let mut previous = current.clone();
        invalidate_all(&mut previous);

        Ok(Self {
            writer,
            current,
            previous,
            output: OutputBuffer::with_capacity(usize::from(width) * usize::from(height) * 4),
            state: FrameState::Idle,
            frame_count: 0,
            frame_start: Instant::now(),
            clear_requested: false,
            layers: Vec::new(),
            max_z: None,
            layer_violations: 0,
            cursor: None,
            shown_cursor: None,
            sgr_unknown: true,
            stats: RenderStats::default(),
        })
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Start a frame.
    ///
    /// The backbuffer keeps the previous frame's content, so callers only
    /// redraw what changed. A pending [`request_clear`](Self::request_clear)
    /// is applied here.
    ///
    /// # Errors
    /// Returns [`Error::FrameInProgress`] if a frame is already open.
    pub fn begin_frame(&mut self) -> Result<()> {
        if self.state == FrameState::InFrame {
            return Err(Error::FrameInProgress {
                frame: self.frame_count + 1,
            });
        }

        self.state = FrameState::InFrame;
        self.frame_start = Instant::now();
        self.layers.clear();
        self.max_z = None;
        self.layer_violations = 0;

        if self.clear_requested {
            self.clear_requested = false;
            self.current.clear();
            invalidate_all(&mut self.previous);
        }
        Ok(())
    }

    /// Finish the frame: diff, write once, commit the baseline.
    ///
    /// If the write fails the frame still ends and the baseline is
    /// committed, but every baseline row is invalidated so the next frame
    /// repaints the whole screen. A partial write may have left colors set,
    /// so that repaint starts with an SGR reset. The I/O error is returned.
    ///
    /// # Errors
    /// Returns [`Error::NoFrameInProgress`] outside a frame, or
    /// [`Error::Io`] if writing to the terminal failed.
    pub fn end_frame(&mut self) -> Result<FrameStats> {
        if self.state == FrameState::Idle {
            return Err(Error::NoFrameInProgress);
        }

        if !self.layers.is_empty() {
            tracing::debug!(open = self.layers.len(), "frame ended with layers still open");
            self.layers.clear();
        }

        self.output.clear();
        if self.sgr_unknown {
            self.output.reset_attrs();
        }
        let diff = render_diff(&self.current, Some(&self.previous), &mut self.output);
        self.emit_cursor(diff.bytes > 0);

        let write_result = if self.output.is_empty() {
            Ok(())
        } else {
            self.output.flush_to(&mut self.writer)
        };

        self.previous.copy_from(&self.current);
        self.state = FrameState::Idle;
        self.frame_count += 1;

        let render_time = self.frame_start.elapsed();
        self.record_stats(&diff, render_time);

        if let Err(err) = write_result {
            tracing::warn!(frame = self.frame_count, error = %err, "terminal write failed, next frame repaints fully");
            invalidate_all(&mut self.previous);
            self.shown_cursor = None;
            self.sgr_unknown = true;
            self.stats.write_errors += 1;
            return Err(err.into());
        }
        self.sgr_unknown = false;

        tracing::debug!(
            frame = self.frame_count,
            cells_changed = diff.cells_changed,
            bytes = self.output.len(),
            "frame rendered"
        );

        Ok(FrameStats {
            frame: self.frame_count,
            diff,
            bytes_written: self.output.len(),
            layer_violations: self.layer_violations,
            render_time,
        })
    }

    /// Clear the screen at the start of the next frame.
    ///
    /// The request is sticky until a `begin_frame` consumes it: that frame
    /// starts from a blank backbuffer and repaints every row.
    pub fn request_clear(&mut self) {
        self.clear_requested = true;
    }

    /// Whether a clear is pending.
    pub const fn clear_requested(&self) -> bool {
        self.clear_requested
    }

    /// Open a layer at depth `z`.
    ///
    /// Layers are bookkeeping only: every draw lands in the one backbuffer in
    /// call order, so later writes win. Opening a layer below one already
    /// opened this frame is counted and logged, and drawing proceeds.
    pub fn begin_layer(&mut self, z: i32) {
        if let Some(max) = self.max_z {
            if z < max {
                self.layer_violations += 1;
                tracing::debug!(z, max, "layer opened below an earlier layer");
            }
        }
        self.max_z = Some(self.max_z.map_or(z, |max| max.max(z)));
        self.layers.push(z);
    }

    /// Close the innermost layer, returning its depth.
    pub fn end_layer(&mut self) -> Option<i32> {
        let z = self.layers.pop();
        if z.is_none() {
            tracing::debug!("end_layer with no open layer");
        }
        z
    }

    /// Depth of the innermost open layer.
    pub fn current_layer(&self) -> Option<i32> {
        self.layers.last().copied()
    }

    // ── Drawing ─────────────────────────────────────────────────────────

    /// Draw styled text starting at (x, y). Returns cells written.
    pub fn write_at(&mut self, x: i32, y: i32, text: &StyledText) -> usize {
        let mut col = i64::from(x);
        let mut written = 0;
        for span in text.spans() {
            let Ok(start) = i32::try_from(col) else {
                break;
            };
            written += self.current.write_str(start, y, &span.text, span.style);
            col = col.saturating_add(i64::try_from(span.cell_count()).unwrap_or(i64::MAX));
        }
        written
    }

    /// Draw text containing embedded truecolor/reset escapes.
    pub fn write_ansi(&mut self, x: i32, y: i32, text: &str) -> usize {
        self.write_at(x, y, &StyledText::from_ansi(text))
    }

    /// Draw text in uniform colors. Escape bytes are stored as-is (and
    /// rendered as replacement characters), never interpreted.
    pub fn write_str(&mut self, x: i32, y: i32, text: &str, fg: Color, bg: Color) -> usize {
        self.current.write_str(x, y, text, Style::new(fg, bg))
    }

    /// Draw a row with per-character styles inside a clip window.
    pub fn write_row(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        paint: &RowPaint<'_>,
        clip: Range<i32>,
    ) -> usize {
        self.current.write_row(x, y, text, paint, clip)
    }

    /// Fill a rectangle with one character and style.
    pub fn fill(&mut self, x: i32, y: i32, width: i32, height: i32, ch: char, style: Style) {
        self.current.fill(x, y, width, height, ch, style);
    }

    /// Draw a single-line box with its interior filled with `bg`.
    pub fn draw_box(&mut self, x: i32, y: i32, width: i32, height: i32, border_fg: Color, bg: Color) {
        if width <= 0 || height <= 0 {
            return;
        }
        let style = Style::new(border_fg, bg);
        let right = x.saturating_add(width - 1);
        let bottom = y.saturating_add(height - 1);

        self.current.fill(x, y, width, height, ' ', style);
        self.current.fill(x.saturating_add(1), y, width - 2, 1, '─', style);
        self.current.fill(x.saturating_add(1), bottom, width - 2, 1, '─', style);
        self.current.fill(x, y.saturating_add(1), 1, height - 2, '│', style);
        self.current.fill(right, y.saturating_add(1), 1, height - 2, '│', style);

        self.current.set(x, y, Cell::styled('┌', style));
        self.current.set(right, y, Cell::styled('┐', style));
        self.current.set(x, bottom, Cell::styled('└', style));
        self.current.set(right, bottom, Cell::styled('┘', style));
    }

    /// Set one cell. Returns `false` if out of bounds.
    pub fn set_cell(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        self.current.set(x, y, cell)
    }

    /// Copy a snapshot into the backbuffer. Returns cells written.
    pub fn blit(&mut self, x: i32, y: i32, snapshot: &Snapshot) -> usize {
        self.current.blit(x, y, snapshot)
    }

    /// Copy a rectangle out of the backbuffer.
    pub fn capture(&self, rect: Rect) -> Snapshot {
        self.current.capture(rect)
    }

    /// Draw a widget through the render cache.
    ///
    /// On a hit the cached cells are blitted and `render` is not called. On
    /// a miss `render` draws into the compositor, then the widget's rect is
    /// captured and stored under `hash`. If `render` fails, an error
    /// placeholder fills the widget's rect, nothing is cached, and the frame
    /// carries on.
    pub fn render_widget<F, E>(
        &mut self,
        cache: &mut RenderCache,
        key: &WidgetKey,
        hash: &str,
        render: F,
    ) -> WidgetOutcome
    where
        F: FnOnce(&mut Self, Rect) -> std::result::Result<(), E>,
        E: fmt::Display,
    {
        if let Some(hit) = cache.try_get(key, hash) {
            self.current
                .blit(i32::from(hit.x), i32::from(hit.y), &hit.cells);
            return WidgetOutcome::Cached;
        }

        let rect = key.rect();
        match render(&mut *self, rect) {
            Ok(()) => {
                cache.store(key, hash, self.current.capture(rect));
                WidgetOutcome::Rendered
            }
            Err(err) => {
                tracing::warn!(widget = %key, error = %err, "widget render failed");
                self.draw_error_placeholder(rect, &key.widget_type);
                WidgetOutcome::Failed
            }
        }
    }

    fn draw_error_placeholder(&mut self, rect: Rect, widget_type: &str) {
        let style = Style::new(ERROR_FG, ERROR_BG);
        self.current.fill_rect(rect, Cell::styled(' ', style));
        let label = format!("! {widget_type}");
        let left = i32::from(rect.x);
        self.current.write_row(
            left,
            i32::from(rect.y),
            &label,
            &RowPaint::uniform(style),
            left..i32::from(rect.right()),
        );
    }

    // ── Terminal state ──────────────────────────────────────────────────

    /// Resize both buffers, keeping content, and repaint fully next frame.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDimensions`] if either dimension is 0; the
    /// compositor is left unchanged.
    pub fn resize(&mut self, width: u16, height: u16) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        tracing::info!(
            from = ?(self.current.width(), self.current.height()),
            to = ?(width, height),
            "resizing compositor"
        );
        self.current.resize(width, height)?;
        self.previous.resize(width, height)?;
        invalidate_all(&mut self.previous);
        self.shown_cursor = None;
        Ok(())
    }

    /// Place the caret after each frame, or hide it with `None`.
    pub const fn set_cursor(&mut self, position: Option<(u16, u16)>) {
        self.cursor = position;
    }

    /// Force the given rows to repaint on the next frame.
    pub fn invalidate_rows(&mut self, rows: Range<u16>) {
        invalidate_rows(&mut self.previous, rows);
    }

    fn emit_cursor(&mut self, diff_moved_cursor: bool) {
        match (self.cursor, self.shown_cursor) {
            (Some((x, y)), shown) => {
                if diff_moved_cursor || shown != Some(Some((x, y))) {
                    self.output.cursor_move(x, y);
                }
                if !matches!(shown, Some(Some(_))) {
                    self.output.cursor_show();
                }
            }
            (None, Some(None)) => {}
            (None, _) => self.output.cursor_hide(),
        }
        self.shown_cursor = Some(self.cursor);
    }

    fn record_stats(&mut self, diff: &DiffStats, elapsed: Duration) {
        let stats = &mut self.stats;
        stats.frames += 1;
        stats.cells_changed += diff.cells_changed as u64;
        stats.bytes_written += self.output.len() as u64;
        stats.last_render_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);

        // Smoothed average
        if stats.avg_render_us == 0 {
            stats.avg_render_us = stats.last_render_us;
        } else {
            stats.avg_render_us = (stats.avg_render_us * 15 + stats.last_render_us) / 16;
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────

    /// Width in columns.
    pub const fn width(&self) -> u16 {
        self.current.width()
    }

    /// Height in rows.
    pub const fn height(&self) -> u16 {
        self.current.height()
    }

    /// The whole screen as a rectangle.
    pub const fn bounds(&self) -> Rect {
        self.current.bounds()
    }

    /// Lifecycle state.
    pub const fn state(&self) -> FrameState {
        self.state
    }

    /// Number of completed frames.
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Accumulated render statistics.
    pub const fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// The backbuffer.
    pub const fn buffer(&self) -> &CellBuffer {
        &self.current
    }

    /// Mutable access to the backbuffer.
    pub const fn buffer_mut(&mut self) -> &mut CellBuffer {
        &mut self.current
    }

    /// The output sink.
    pub const fn writer(&self) -> &W {
        &self.writer
    }

    /// Mutable access to the output sink.
    pub const fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Consume the compositor, returning the output sink.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<W: Write> fmt::Debug for Compositor<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compositor")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("state", &self.state)
            .field("frame_count", &self.frame_count)
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}
