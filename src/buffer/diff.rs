//! Diffing Engine: Generate minimal ANSI sequences from buffer changes.
//!
//! This module implements the core anti-flicker logic:
//! 1. Compare the current buffer against the last committed one
//! 2. Group changed cells into runs that share colors and attributes
//! 3. Skip cursor moves when the cursor is already in place
//! 4. Track SGR state so each run emits only the escapes it needs
//!
//! Output is a pure function of the two buffers: the tracked terminal state
//! starts from "defaults, cursor unknown" on every call, and a trailing
//! `ESC[0m` is appended whenever the stream would otherwise leave colors or
//! attributes active, so the next diff's starting assumption holds.

use super::{Attributes, Cell, CellBuffer, Color};
use crate::terminal::OutputBuffer;
use std::ops::Range;

/// State tracker for the diffing algorithm.
///
/// This tracks the terminal state implied by the bytes emitted so far
/// (cursor position, colors, attributes). `None` colors mean "unknown", which
/// is the state right after an SGR reset issued to clear attributes.
#[derive(Debug, Clone, Copy)]
struct DiffState {
    /// Virtual cursor position (0-indexed), `None` until first positioned.
    cursor: Option<(u16, u16)>,
    /// Last emitted foreground color.
    fg: Option<Color>,
    /// Last emitted background color.
    bg: Option<Color>,
    /// Active attributes.
    attrs: Attributes,
}

impl DiffState {
    /// Terminal at default colors and attributes, cursor position unknown.
    const fn new() -> Self {
        Self {
            cursor: None,
            fg: Some(Color::DEFAULT),
            bg: Some(Color::DEFAULT),
            attrs: Attributes::empty(),
        }
    }

    /// Whether the emitted stream leaves anything but the defaults active.
    fn leaves_sgr_active(&self) -> bool {
        !self.attrs.is_empty()
            || self.fg.is_some_and(|c| !c.is_default())
            || self.bg.is_some_and(|c| !c.is_default())
    }
}

/// Statistics about a diff operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    /// Number of cells that were different.
    pub cells_changed: usize,
    /// Number of same-style runs emitted.
    pub runs: usize,
    /// Number of cursor move sequences emitted.
    pub cursor_moves: usize,
    /// Number of color change sequences emitted.
    pub color_changes: usize,
    /// Number of attribute transitions emitted.
    pub attribute_changes: usize,
    /// Bytes appended to the output.
    pub bytes: usize,
    /// Whether every cell was treated as changed (no usable baseline).
    pub full_redraw: bool,
}

/// Build the ANSI string that turns a terminal showing `previous` into one
/// showing `current`.
///
/// `None` for `previous` means the terminal contents are unknown and every
/// cell is drawn. A `previous` with different dimensions is treated the same
/// way.
///
/// # Example
/// ```
/// use cellframe::{buffer::diff::build_diff, CellBuffer};
///
/// let a = CellBuffer::new(80, 24).unwrap();
/// assert!(build_diff(&a, Some(&a.clone())).is_empty());
/// ```
pub fn build_diff(current: &CellBuffer, previous: Option<&CellBuffer>) -> String {
    let mut output = OutputBuffer::new();
    render_diff(current, previous, &mut output);
    output.into_string()
}

/// Render the difference between two buffers into an output buffer.
///
/// This is the allocation-reusing form of [`build_diff`]; output is appended
/// to whatever `output` already holds.
pub fn render_diff(
    current: &CellBuffer,
    previous: Option<&CellBuffer>,
    output: &mut OutputBuffer,
) -> DiffStats {
    let start_len = output.len();

    let previous = previous.filter(|prev| {
        let matches = prev.width() == current.width() && prev.height() == current.height();
        if !matches {
            tracing::warn!(
                current = ?(current.width(), current.height()),
                previous = ?(prev.width(), prev.height()),
                "diff baseline has different dimensions, redrawing everything"
            );
        }
        matches
    });

    let mut stats = DiffStats {
        full_redraw: previous.is_none(),
        ..DiffStats::default()
    };
    let mut state = DiffState::new();
    let width = usize::from(current.width());

    for (y, row) in (0..current.height()).zip(current.rows()) {
        let prev_row = previous.and_then(|prev| prev.row(y));

        // Row-skip: an unchanged row is one slice comparison.
        if prev_row == Some(row) {
            continue;
        }

        let mut x = 0;
        while x < width {
            if !is_changed(row, prev_row, x) {
                x += 1;
                continue;
            }

            let head = &row[x];
            let mut end = x + 1;
            while end < width && is_changed(row, prev_row, end) && row[end].same_style(head) {
                end += 1;
            }

            emit_run(output, &mut state, &mut stats, x, y, &row[x..end]);
            x = end;
        }
    }

    if state.leaves_sgr_active() {
        output.reset_attrs();
    }

    stats.bytes = output.len() - start_len;
    stats
}

#[inline]
fn is_changed(row: &[Cell], prev_row: Option<&[Cell]>, x: usize) -> bool {
    match prev_row {
        Some(prev) => prev[x] != row[x],
        None => true,
    }
}

/// Emit one run of changed cells that share fg/bg/attributes.
fn emit_run(
    output: &mut OutputBuffer,
    state: &mut DiffState,
    stats: &mut DiffStats,
    x: usize,
    y: u16,
    run: &[Cell],
) {
    let Some(head) = run.first() else {
        return;
    };
    // x < width <= u16::MAX
    let col = u16::try_from(x).unwrap_or(u16::MAX);

    stats.cells_changed += run.len();
    stats.runs += 1;

    if state.cursor != Some((col, y)) {
        output.cursor_move(col, y);
        stats.cursor_moves += 1;
    }

    // Attributes first: clearing any bit needs a full reset, which also
    // drops the terminal's colors, so tracked colors become unknown and are
    // re-emitted below.
    let attrs = head.attrs();
    if attrs != state.attrs {
        let removed = state.attrs.difference(attrs);
        if removed.is_empty() {
            output.set_attributes(attrs.difference(state.attrs));
        } else {
            output.reset_attrs();
            state.fg = None;
            state.bg = None;
            output.set_attributes(attrs);
        }
        state.attrs = attrs;
        stats.attribute_changes += 1;
    }

    if state.fg != Some(head.fg()) {
        output.set_fg(head.fg());
        state.fg = Some(head.fg());
        stats.color_changes += 1;
    }

    if state.bg != Some(head.bg()) {
        output.set_bg(head.bg());
        state.bg = Some(head.bg());
        stats.color_changes += 1;
    }

    for cell in run {
        output.write_cell_char(cell.ch());
    }

    state.cursor = u16::try_from(x + run.len()).ok().map(|end| (end, y));
}

/// Force the given rows to redraw on the next diff against `previous`.
///
/// The rows are stamped with a sentinel cell that compares unequal to every
/// real cell, so the rest of the baseline stays usable. Rows past the
/// buffer's height are ignored.
pub fn invalidate_rows(previous: &mut CellBuffer, rows: Range<u16>) {
    let end = rows.end.min(previous.height());
    for y in rows.start..end {
        if let Some(row) = previous.row_mut(y) {
            row.fill(Cell::INVALIDATED);
        }
    }
}

/// Force every row of `previous` to redraw.
pub fn invalidate_all(previous: &mut CellBuffer) {
    let height = previous.height();
    invalidate_rows(previous, 0..height);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Style;

    const RED: Color = Color::from_u32(0xFF0000);
    const GREEN: Color = Color::from_u32(0x00FF00);

    fn blank(width: u16, height: u16) -> CellBuffer {
        CellBuffer::new(width, height).unwrap()
    }

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn test_diff_identical_buffers() {
        let mut a = blank(20, 6);
        a.write_str(1, 1, "some text", Style::new(RED, GREEN));
        let b = a.clone();

        assert_eq!(build_diff(&a, Some(&a)), "");
        assert_eq!(build_diff(&a, Some(&b)), "");

        let mut output = OutputBuffer::new();
        let stats = render_diff(&a, Some(&b), &mut output);
        assert_eq!(stats.cells_changed, 0);
        assert!(output.is_empty());
    }

    #[test]
    fn test_scenario_two_cells_one_run() {
        let previous = blank(80, 24);
        let mut current = blank(80, 24);
        current.set_cell(0, 0, 'A', RED, Color::DEFAULT, Attributes::empty());
        current.set_cell(1, 0, 'B', RED, Color::DEFAULT, Attributes::empty());

        let diff = build_diff(&current, Some(&previous));

        assert_eq!(diff, "\x1b[1;1H\x1b[38;2;255;0;0mAB\x1b[0m");
        assert_eq!(count(&diff, "H"), 1);
        assert_eq!(count(&diff, "\x1b[38;2;"), 1);
        assert_eq!(count(&diff, "\x1b[48;2;"), 0);
    }

    #[test]
    fn test_rle_ten_cells_one_color_escape() {
        let previous = blank(20, 3);
        let mut current = blank(20, 3);
        let style = Style::new(RED, GREEN).with_attrs(Attributes::BOLD);
        current.write_str(5, 1, "0123456789", style);

        let mut output = OutputBuffer::new();
        let stats = render_diff(&current, Some(&previous), &mut output);
        let diff = output.as_str();

        assert_eq!(stats.cells_changed, 10);
        assert_eq!(stats.runs, 1);
        assert_eq!(count(diff, "\x1b[38;2;"), 1);
        assert_eq!(count(diff, "\x1b[48;2;"), 1);
        assert_eq!(count(diff, "\x1b[1m"), 1);
        assert!(diff.contains("0123456789"));
    }

    #[test]
    fn test_run_breaks_on_unchanged_cell() {
        let mut previous = blank(10, 1);
        let mut current = blank(10, 1);
        current.write_str(0, 0, "abc", Style::new(RED, Color::DEFAULT));
        // Middle cell already on screen: the run splits around it.
        previous.set(1, 0, current.get_cell(1, 0));

        let mut output = OutputBuffer::new();
        let stats = render_diff(&current, Some(&previous), &mut output);

        assert_eq!(stats.runs, 2);
        assert_eq!(stats.cursor_moves, 2);
        assert_eq!(stats.color_changes, 1);
        assert_eq!(
            output.as_str(),
            "\x1b[1;1H\x1b[38;2;255;0;0ma\x1b[1;3Hc\x1b[0m"
        );
    }

    #[test]
    fn test_adjacent_runs_share_cursor() {
        let previous = blank(10, 1);
        let mut current = blank(10, 1);
        current.write_str(0, 0, "ab", Style::new(RED, Color::DEFAULT));
        current.write_str(2, 0, "cd", Style::new(GREEN, Color::DEFAULT));

        let mut output = OutputBuffer::new();
        let stats = render_diff(&current, Some(&previous), &mut output);

        assert_eq!(stats.runs, 2);
        assert_eq!(stats.cursor_moves, 1);
        assert_eq!(
            output.as_str(),
            "\x1b[1;1H\x1b[38;2;255;0;0mab\x1b[38;2;0;255;0mcd\x1b[0m"
        );
    }

    #[test]
    fn test_full_redraw_without_baseline() {
        let current = blank(3, 2);
        let mut output = OutputBuffer::new();
        let stats = render_diff(&current, None, &mut output);

        assert!(stats.full_redraw);
        assert_eq!(stats.cells_changed, 6);
        // Default cells need no SGR at all, and no trailing reset.
        assert_eq!(output.as_str(), "\x1b[1;1H   \x1b[2;1H   ");
    }

    #[test]
    fn test_attribute_clear_resets_and_reemits_colors() {
        let previous = blank(4, 1);
        let mut current = blank(4, 1);
        current.set_cell(0, 0, 'A', RED, Color::DEFAULT, Attributes::BOLD);
        current.set_cell(1, 0, 'B', RED, Color::DEFAULT, Attributes::empty());

        let diff = build_diff(&current, Some(&previous));
        assert_eq!(
            diff,
            "\x1b[1;1H\x1b[1m\x1b[38;2;255;0;0mA\x1b[0m\x1b[38;2;255;0;0m\x1b[49mB\x1b[0m"
        );
    }

    #[test]
    fn test_attribute_addition_emits_only_new_bits() {
        let previous = blank(4, 1);
        let mut current = blank(4, 1);
        current.set_cell(0, 0, 'A', Color::DEFAULT, Color::DEFAULT, Attributes::BOLD);
        current.set_cell(
            1,
            0,
            'B',
            Color::DEFAULT,
            Color::DEFAULT,
            Attributes::BOLD | Attributes::UNDERLINE,
        );

        let diff = build_diff(&current, Some(&previous));
        assert_eq!(diff, "\x1b[1;1H\x1b[1mA\x1b[4mB\x1b[0m");
    }

    #[test]
    fn test_default_colors_after_truecolor() {
        let previous = blank(4, 1);
        let mut current = blank(4, 1);
        current.set_cell(0, 0, 'x', Color::DEFAULT, RED, Attributes::empty());
        current.set_cell(1, 0, 'y', Color::DEFAULT, Color::DEFAULT, Attributes::empty());

        let diff = build_diff(&current, Some(&previous));
        assert_eq!(diff, "\x1b[1;1H\x1b[48;2;255;0;0mx\x1b[49my");
    }

    #[test]
    fn test_runs_do_not_cross_rows() {
        let previous = blank(3, 2);
        let mut current = blank(3, 2);
        current.fill(0, 0, 3, 2, '#', Style::new(RED, Color::DEFAULT));

        let mut output = OutputBuffer::new();
        let stats = render_diff(&current, Some(&previous), &mut output);
        assert_eq!(stats.runs, 2);
        assert_eq!(stats.color_changes, 1);
        assert_eq!(
            output.as_str(),
            "\x1b[1;1H\x1b[38;2;255;0;0m###\x1b[2;1H###\x1b[0m"
        );
    }

    #[test]
    fn test_dimension_mismatch_forces_full_redraw() {
        let mut current = blank(5, 2);
        current.write_str(0, 0, "hi", Style::DEFAULT);
        let smaller = blank(4, 2);

        let mut output = OutputBuffer::new();
        let stats = render_diff(&current, Some(&smaller), &mut output);

        assert!(stats.full_redraw);
        assert_eq!(stats.cells_changed, 10);
        assert_eq!(output.as_str(), build_diff(&current, None));
    }

    #[test]
    fn test_invalidate_rows_redraws_only_those_rows() {
        let mut current = blank(4, 3);
        current.write_str(0, 0, "top", Style::DEFAULT);
        current.write_str(0, 1, "mid", Style::DEFAULT);
        current.write_str(0, 2, "bot", Style::DEFAULT);
        let mut previous = current.clone();

        invalidate_rows(&mut previous, 1..2);
        let diff = build_diff(&current, Some(&previous));
        assert_eq!(diff, "\x1b[2;1Hmid ");

        invalidate_rows(&mut previous, 2..99);
        let mut output = OutputBuffer::new();
        let stats = render_diff(&current, Some(&previous), &mut output);
        assert_eq!(stats.cells_changed, 8);
        assert!(!stats.full_redraw);
    }

    #[test]
    fn test_invalidate_all() {
        let current = blank(4, 3);
        let mut previous = current.clone();
        invalidate_all(&mut previous);
        assert_eq!(build_diff(&current, Some(&previous)), build_diff(&current, None));
    }

    #[test]
    fn test_output_is_deterministic() {
        let previous = patterned(30, 8, 7);
        let current = patterned(30, 8, 11);
        let first = build_diff(&current, Some(&previous));
        let second = build_diff(&current, Some(&previous));
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_diff_appends() {
        let mut current = blank(2, 1);
        current.write_str(0, 0, "ok", Style::DEFAULT);
        let mut output = OutputBuffer::new();
        output.write_str("prefix");
        let stats = render_diff(&current, Some(&blank(2, 1)), &mut output);
        assert_eq!(output.as_str(), "prefix\x1b[1;1Hok");
        assert_eq!(stats.bytes, output.len() - "prefix".len());
    }

    // ── Replay into a terminal model ─────────────────────────────────────

    /// Deterministic pseudo-random buffer with mixed colors and attributes.
    fn patterned(width: u16, height: u16, seed: u32) -> CellBuffer {
        const PALETTE: [Color; 5] = [
            Color::DEFAULT,
            Color::from_u32(0xFF0000),
            Color::from_u32(0x00AAFF),
            Color::from_u32(0x202020),
            Color::WHITE,
        ];
        let mut buffer = blank(width, height);
        let mut state = seed;
        let mut next = move || {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
            (state >> 16) as usize
        };
        for y in 0..i32::from(height) {
            for x in 0..i32::from(width) {
                let r = next();
                let ch = if r % 7 == 0 {
                    ' '
                } else {
                    char::from(b'a' + u8::try_from(r % 26).unwrap())
                };
                let attrs = Attributes::from_bits_truncate(u8::try_from((r / 26) % 8).unwrap());
                // Clustered styles so runs actually form.
                let fg = PALETTE[(x as usize / 4 + r / 1000) % PALETTE.len()];
                let bg = PALETTE[(y as usize + r / 5000) % PALETTE.len()];
                buffer.set_cell(x, y, ch, fg, bg, attrs);
            }
        }
        buffer
    }

    fn to_vt(color: Color) -> vt100::Color {
        match color.components() {
            Some((r, g, b)) => vt100::Color::Rgb(r, g, b),
            None => vt100::Color::Default,
        }
    }

    fn assert_screen_matches(parser: &vt100::Parser, buffer: &CellBuffer) {
        let screen = parser.screen();
        for y in 0..buffer.height() {
            for x in 0..buffer.width() {
                let expected = buffer.get_cell(i32::from(x), i32::from(y));
                let actual = screen.cell(y, x).unwrap();
                let ch = actual.contents().chars().next().unwrap_or(' ');
                assert_eq!(ch, expected.ch(), "char at ({x}, {y})");
                assert_eq!(actual.fgcolor(), to_vt(expected.fg()), "fg at ({x}, {y})");
                assert_eq!(actual.bgcolor(), to_vt(expected.bg()), "bg at ({x}, {y})");
                assert_eq!(
                    actual.bold(),
                    expected.attrs().contains(Attributes::BOLD),
                    "bold at ({x}, {y})"
                );
                assert_eq!(
                    actual.underline(),
                    expected.attrs().contains(Attributes::UNDERLINE),
                    "underline at ({x}, {y})"
                );
                assert_eq!(
                    actual.italic(),
                    expected.attrs().contains(Attributes::ITALIC),
                    "italic at ({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn test_replay_full_diff_reproduces_buffer() {
        let buffer = patterned(40, 12, 1);
        let mut parser = vt100::Parser::new(12, 40, 0);
        parser.process(build_diff(&buffer, None).as_bytes());
        assert_screen_matches(&parser, &buffer);
    }

    #[test]
    fn test_replay_incremental_diffs() {
        let frames: Vec<CellBuffer> = (1..=4).map(|seed| patterned(32, 10, seed)).collect();
        let mut parser = vt100::Parser::new(10, 32, 0);
        parser.process(build_diff(&frames[0], None).as_bytes());

        for pair in frames.windows(2) {
            parser.process(build_diff(&pair[1], Some(&pair[0])).as_bytes());
            assert_screen_matches(&parser, &pair[1]);
        }
    }

    #[test]
    fn test_replay_sparse_edit() {
        let before = patterned(20, 5, 3);
        let mut after = before.clone();
        after.write_str(18, 4, "zz", Style::new(GREEN, RED).with_attrs(Attributes::ITALIC));
        after.set_cell(0, 0, 'q', Color::DEFAULT, Color::DEFAULT, Attributes::empty());

        let mut parser = vt100::Parser::new(5, 20, 0);
        parser.process(build_diff(&before, None).as_bytes());
        parser.process(build_diff(&after, Some(&before)).as_bytes());
        assert_screen_matches(&parser, &after);
    }
}
