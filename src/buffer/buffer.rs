//! `CellBuffer`: A grid of cells representing the terminal screen.
//!
//! The buffer uses contiguous memory allocation for cache efficiency.
//! Cells are stored in row-major order.
//!
//! Every drawing entry point takes signed coordinates and clips silently, so
//! widget code can draw partially off-screen (scrolled lists, windows dragged
//! past the edge) without bounds checks of its own.

use super::cell::{Attributes, Cell, Color, Style};
use crate::error::{Error, Result};
use crate::layout::Rect;
use std::ops::Range;

/// A clip window that imposes no limit beyond the buffer's own bounds.
pub const UNCLIPPED: Range<i32> = i32::MIN..i32::MAX;

/// Per-character colors for [`CellBuffer::write_row`].
///
/// Slot `i` of `fg`, `bg` and `attrs` styles the `i`-th character of the
/// text. Slices may be shorter than the text (or empty); missing slots fall
/// back to `base`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowPaint<'a> {
    /// Style for characters without an explicit slot.
    pub base: Style,
    /// Per-character foreground colors.
    pub fg: &'a [Color],
    /// Per-character background colors.
    pub bg: &'a [Color],
    /// Per-character attributes.
    pub attrs: &'a [Attributes],
}

impl<'a> RowPaint<'a> {
    /// Every character drawn with one style.
    #[inline]
    pub const fn uniform(base: Style) -> Self {
        Self {
            base,
            fg: &[],
            bg: &[],
            attrs: &[],
        }
    }

    /// Set per-character foreground colors (builder pattern).
    #[inline]
    #[must_use]
    pub const fn with_fg(mut self, fg: &'a [Color]) -> Self {
        self.fg = fg;
        self
    }

    /// Set per-character background colors (builder pattern).
    #[inline]
    #[must_use]
    pub const fn with_bg(mut self, bg: &'a [Color]) -> Self {
        self.bg = bg;
        self
    }

    /// Set per-character attributes (builder pattern).
    #[inline]
    #[must_use]
    pub const fn with_attrs(mut self, attrs: &'a [Attributes]) -> Self {
        self.attrs = attrs;
        self
    }

    fn style_at(&self, index: usize) -> Style {
        Style {
            fg: self.fg.get(index).copied().unwrap_or(self.base.fg),
            bg: self.bg.get(index).copied().unwrap_or(self.base.bg),
            attrs: self.attrs.get(index).copied().unwrap_or(self.base.attrs),
        }
    }
}

/// A rectangular copy of cells, detached from any buffer.
///
/// Produced by [`CellBuffer::capture`] and replayed with [`CellBuffer::blit`];
/// the widget cache stores these.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl Snapshot {
    /// Build a snapshot from row-major cells.
    ///
    /// Returns `None` if `cells.len()` is not `width * height`.
    pub fn from_cells(width: u16, height: u16, cells: Vec<Cell>) -> Option<Self> {
        (cells.len() == usize::from(width) * usize::from(height)).then_some(Self {
            width,
            height,
            cells,
        })
    }

    /// Width in columns.
    #[inline]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Height in rows.
    #[inline]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Row-major cells.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the snapshot holds no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at snapshot-relative coordinates.
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if x < self.width && y < self.height {
            self.cells
                .get(usize::from(y) * usize::from(self.width) + usize::from(x))
        } else {
            None
        }
    }
}

/// A grid of cells representing the terminal screen.
///
/// The buffer stores cells in a contiguous `Vec` for cache efficiency.
/// Access is in row-major order: `index = y * width + x`.
#[derive(Clone, PartialEq, Eq)]
pub struct CellBuffer {
    /// Contiguous cell storage (row-major order).
    cells: Vec<Cell>,
    /// Width in columns.
    width: u16,
    /// Height in rows.
    height: u16,
}

impl CellBuffer {
    /// Create a new buffer with the given dimensions.
    ///
    /// All cells are initialized to the default cell.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDimensions`] if width or height is 0.
    pub fn new(width: u16, height: u16) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        let size = usize::from(width) * usize::from(height);
        Ok(Self {
            cells: vec![Cell::DEFAULT; size],
            width,
            height,
        })
    }

    /// Get the buffer width.
    #[inline]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Get the buffer height.
    #[inline]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// The whole buffer as a rectangle at the origin.
    #[inline]
    pub const fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Get the total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the buffer is empty (never true after construction).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Get a reference to the underlying cell slice.
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Convert (x, y) coordinates to a linear index.
    ///
    /// Returns `None` if coordinates are out of bounds.
    #[inline]
    pub fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        if x < usize::from(self.width) && y < usize::from(self.height) {
            Some(y * usize::from(self.width) + x)
        } else {
            None
        }
    }

    /// Convert a linear index to (x, y) coordinates.
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub fn coords_of(&self, index: usize) -> Option<(u16, u16)> {
        if index < self.cells.len() {
            let w = usize::from(self.width);
            // Both quotient and remainder are bounded by u16 dimensions.
            Some(((index % w) as u16, (index / w) as u16))
        } else {
            None
        }
    }

    /// Get a reference to a cell at (x, y).
    ///
    /// Returns `None` if coordinates are out of bounds.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        self.index_of(x, y).map(|i| &self.cells[i])
    }

    /// Get a copy of the cell at (x, y), or the default cell when out of bounds.
    #[inline]
    pub fn get_cell(&self, x: i32, y: i32) -> Cell {
        self.get(x, y).copied().unwrap_or_default()
    }

    /// Set a cell at (x, y).
    ///
    /// Returns `false` (and does nothing) if coordinates are out of bounds.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) -> bool {
        if let Some(idx) = self.index_of(x, y) {
            self.cells[idx] = cell;
            true
        } else {
            false
        }
    }

    /// Set every field of the cell at (x, y). Out-of-bounds is a no-op.
    #[inline]
    pub fn set_cell(
        &mut self,
        x: i32,
        y: i32,
        ch: char,
        fg: Color,
        bg: Color,
        attrs: Attributes,
    ) -> bool {
        self.set(x, y, Cell::with_all(ch, fg, bg, attrs))
    }

    /// A full row of cells.
    #[inline]
    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        if y >= self.height {
            return None;
        }
        let w = usize::from(self.width);
        let start = usize::from(y) * w;
        Some(&self.cells[start..start + w])
    }

    /// A full row of cells, mutably.
    #[inline]
    pub(crate) fn row_mut(&mut self, y: u16) -> Option<&mut [Cell]> {
        if y >= self.height {
            return None;
        }
        let w = usize::from(self.width);
        let start = usize::from(y) * w;
        Some(&mut self.cells[start..start + w])
    }

    /// Get an iterator over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(usize::from(self.width))
    }

    /// Stamp a rectangle with one character and style, clipped to the buffer.
    pub fn fill(&mut self, x: i32, y: i32, width: i32, height: i32, ch: char, style: Style) {
        let area = Rect::clip_signed(x, y, width, height, self.bounds());
        self.fill_rect(area, Cell::styled(ch, style));
    }

    /// Fill an already-clipped rectangular region with a cell.
    pub fn fill_rect(&mut self, rect: Rect, cell: Cell) {
        let area = rect.intersection(&self.bounds());
        if area.is_empty() {
            return;
        }
        let w = usize::from(self.width);
        for row in area.y..area.bottom() {
            let start = usize::from(row) * w + usize::from(area.x);
            self.cells[start..start + usize::from(area.width)].fill(cell);
        }
    }

    /// Write a horizontal run of characters.
    ///
    /// Character `i` of `text` lands at column `x + i`. Only columns inside
    /// both `clip` and the buffer are touched, so a widget can scroll its
    /// text horizontally by moving `x` left while keeping `clip` fixed to its
    /// own window. Returns the number of cells written.
    pub fn write_row(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        paint: &RowPaint<'_>,
        clip: Range<i32>,
    ) -> usize {
        let Ok(row) = u16::try_from(y) else {
            return 0;
        };
        if row >= self.height {
            return 0;
        }
        let min_x = i64::from(clip.start.max(0));
        let max_x = i64::from(clip.end.min(i32::from(self.width)));
        if min_x >= max_x {
            return 0;
        }

        let row_start = usize::from(row) * usize::from(self.width);
        let mut written = 0;
        for (i, ch) in text.chars().enumerate() {
            let col = i64::from(x) + i64::try_from(i).unwrap_or(i64::MAX);
            if col >= max_x {
                break;
            }
            if col < min_x {
                continue;
            }
            // min_x >= 0 and max_x <= width, so col is a valid column here.
            let idx = row_start + usize::try_from(col).unwrap_or_default();
            self.cells[idx] = Cell::styled(ch, paint.style_at(i));
            written += 1;
        }
        written
    }

    /// Write text in a single style, clipped to the buffer.
    pub fn write_str(&mut self, x: i32, y: i32, text: &str, style: Style) -> usize {
        self.write_row(x, y, text, &RowPaint::uniform(style), UNCLIPPED)
    }

    /// Clear the entire buffer (fill with default cells).
    pub fn clear(&mut self) {
        self.cells.fill(Cell::DEFAULT);
    }

    /// Resize the buffer, preserving content where possible.
    ///
    /// The overlapping top-left region is kept; newly exposed cells are
    /// default cells.
    ///
    /// # Errors
    /// Returns [`Error::InvalidDimensions`] (leaving the buffer untouched) if
    /// either dimension is 0.
    pub fn resize(&mut self, new_width: u16, new_height: u16) -> Result<()> {
        if new_width == 0 || new_height == 0 {
            return Err(Error::InvalidDimensions {
                width: new_width,
                height: new_height,
            });
        }
        if new_width == self.width && new_height == self.height {
            return Ok(());
        }

        let new_size = usize::from(new_width) * usize::from(new_height);
        let mut new_cells = vec![Cell::DEFAULT; new_size];

        // Copy existing content
        let copy_width = usize::from(self.width.min(new_width));
        let copy_height = usize::from(self.height.min(new_height));

        for y in 0..copy_height {
            let old_start = y * usize::from(self.width);
            let new_start = y * usize::from(new_width);
            new_cells[new_start..new_start + copy_width]
                .copy_from_slice(&self.cells[old_start..old_start + copy_width]);
        }

        self.cells = new_cells;
        self.width = new_width;
        self.height = new_height;
        Ok(())
    }

    /// Copy content from another buffer.
    ///
    /// Same-sized buffers reuse the existing allocation; otherwise this buffer
    /// takes on the other's dimensions.
    pub fn copy_from(&mut self, other: &Self) {
        self.cells.clone_from(&other.cells);
        self.width = other.width;
        self.height = other.height;
    }

    /// Copy a rectangle out of the buffer.
    ///
    /// Parts of `rect` outside the buffer read as default cells, so the
    /// snapshot always has exactly `rect`'s dimensions.
    pub fn capture(&self, rect: Rect) -> Snapshot {
        let mut cells = Vec::with_capacity(rect.area() as usize);
        for dy in 0..rect.height {
            let y = i32::from(rect.y) + i32::from(dy);
            for dx in 0..rect.width {
                cells.push(self.get_cell(i32::from(rect.x) + i32::from(dx), y));
            }
        }
        Snapshot {
            width: rect.width,
            height: rect.height,
            cells,
        }
    }

    /// Copy a snapshot into the buffer with its top-left at (x, y), clipped.
    ///
    /// Returns the number of cells written.
    #[allow(clippy::cast_sign_loss)]
    pub fn blit(&mut self, x: i32, y: i32, snapshot: &Snapshot) -> usize {
        let area = Rect::clip_signed(
            x,
            y,
            i32::from(snapshot.width),
            i32::from(snapshot.height),
            self.bounds(),
        );
        if area.is_empty() {
            return 0;
        }
        // Offset of the visible part inside the snapshot (non-negative after clipping).
        let src_x = (i32::from(area.x) - x) as usize;
        let src_y = (i32::from(area.y) - y) as usize;
        let src_w = usize::from(snapshot.width);
        let w = usize::from(self.width);
        let run = usize::from(area.width);

        for dy in 0..usize::from(area.height) {
            let src = (src_y + dy) * src_w + src_x;
            let dst = (usize::from(area.y) + dy) * w + usize::from(area.x);
            self.cells[dst..dst + run].copy_from_slice(&snapshot.cells[src..src + run]);
        }
        area.area() as usize
    }

    /// Get memory usage in bytes (approximate).
    pub fn memory_usage(&self) -> usize {
        self.cells.len() * std::mem::size_of::<Cell>() + std::mem::size_of::<Self>()
    }
}

impl std::fmt::Debug for CellBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("memory_bytes", &self.memory_usage())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgb(255, 0, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);

    fn text_of(buffer: &CellBuffer, y: u16) -> String {
        buffer.row(y).unwrap().iter().map(Cell::ch).collect()
    }

    #[test]
    fn test_buffer_new() {
        let buffer = CellBuffer::new(80, 24).unwrap();
        assert_eq!(buffer.width(), 80);
        assert_eq!(buffer.height(), 24);
        assert_eq!(buffer.len(), 80 * 24);
        assert!(buffer.cells().iter().all(|c| *c == Cell::DEFAULT));
    }

    #[test]
    fn test_buffer_zero_dimensions_rejected() {
        assert!(matches!(
            CellBuffer::new(0, 24),
            Err(Error::InvalidDimensions { width: 0, height: 24 })
        ));
        assert!(CellBuffer::new(80, 0).is_err());
    }

    #[test]
    fn test_buffer_get_set() {
        let mut buffer = CellBuffer::new(80, 24).unwrap();
        assert!(buffer.set_cell(5, 10, 'X', RED, BLUE, Attributes::BOLD));
        let cell = buffer.get_cell(5, 10);
        assert_eq!(cell.ch(), 'X');
        assert_eq!(cell.fg(), RED);
        assert_eq!(cell.bg(), BLUE);
        assert_eq!(cell.attrs(), Attributes::BOLD);
    }

    #[test]
    fn test_set_cell_out_of_bounds_is_noop() {
        let mut buffer = CellBuffer::new(4, 3).unwrap();
        let before = buffer.clone();
        assert!(!buffer.set_cell(-1, -1, 'X', RED, RED, Attributes::empty()));
        assert!(!buffer.set_cell(4, 3, 'X', RED, RED, Attributes::empty()));
        assert!(!buffer.set_cell(4, 0, 'X', RED, RED, Attributes::empty()));
        assert!(!buffer.set_cell(0, 3, 'X', RED, RED, Attributes::empty()));
        assert!(!buffer.set_cell(i32::MIN, i32::MAX, 'X', RED, RED, Attributes::empty()));
        assert_eq!(buffer, before);
    }

    #[test]
    fn test_get_cell_out_of_bounds_is_default() {
        let mut buffer = CellBuffer::new(4, 3).unwrap();
        buffer.fill(0, 0, 4, 3, '#', Style::new(RED, BLUE));
        assert_eq!(buffer.get_cell(-1, 0), Cell::DEFAULT);
        assert_eq!(buffer.get_cell(4, 0), Cell::DEFAULT);
        assert_eq!(buffer.get_cell(0, 3), Cell::DEFAULT);
        assert!(buffer.get(4, 0).is_none());
    }

    #[test]
    fn test_buffer_index_coords() {
        let buffer = CellBuffer::new(80, 24).unwrap();
        assert_eq!(buffer.index_of(5, 10), Some(10 * 80 + 5));
        assert_eq!(buffer.coords_of(10 * 80 + 5), Some((5, 10)));
        assert_eq!(buffer.index_of(-1, 0), None);
        assert_eq!(buffer.coords_of(80 * 24), None);
    }

    #[test]
    fn test_fill_clips() {
        let mut buffer = CellBuffer::new(10, 5).unwrap();
        buffer.fill(-2, 3, 4, 10, 'X', Style::new(RED, Color::DEFAULT));

        assert_eq!(buffer.get_cell(0, 3).ch(), 'X');
        assert_eq!(buffer.get_cell(1, 4).ch(), 'X');
        assert_eq!(buffer.get_cell(2, 3).ch(), ' ');
        assert_eq!(buffer.get_cell(0, 2).ch(), ' ');
        assert_eq!(buffer.get_cell(1, 4).fg(), RED);
    }

    #[test]
    fn test_fill_degenerate_is_noop() {
        let mut buffer = CellBuffer::new(10, 5).unwrap();
        buffer.fill(2, 2, 0, 3, 'X', Style::DEFAULT);
        buffer.fill(2, 2, 3, -1, 'X', Style::DEFAULT);
        buffer.fill(20, 20, 3, 3, 'X', Style::DEFAULT);
        assert!(buffer.cells().iter().all(|c| *c == Cell::DEFAULT));
    }

    #[test]
    fn test_buffer_clear() {
        let mut buffer = CellBuffer::new(80, 24).unwrap();
        buffer.set(5, 5, Cell::new('X'));
        buffer.clear();
        assert_eq!(buffer.get(5, 5), Some(&Cell::DEFAULT));
    }

    #[test]
    fn test_resize_grow_preserves_content() {
        let mut buffer = CellBuffer::new(6, 4).unwrap();
        for y in 0..4 {
            for x in 0..6 {
                let ch = char::from(b'a' + u8::try_from(x + y).unwrap());
                buffer.set_cell(x, y, ch, Color::from_u32(0x10 * (x as u32)), BLUE, Attributes::empty());
            }
        }
        let before = buffer.clone();

        buffer.resize(10, 7).unwrap();
        assert_eq!(buffer.width(), 10);
        assert_eq!(buffer.height(), 7);
        for y in 0..7 {
            for x in 0..10 {
                if x < 6 && y < 4 {
                    assert_eq!(buffer.get_cell(x, y), before.get_cell(x, y));
                } else {
                    assert_eq!(buffer.get_cell(x, y), Cell::DEFAULT);
                }
            }
        }
    }

    #[test]
    fn test_resize_shrink_keeps_top_left() {
        let mut buffer = CellBuffer::new(80, 24).unwrap();
        buffer.set(5, 5, Cell::new('X'));
        buffer.set(50, 20, Cell::new('Y'));

        buffer.resize(10, 10).unwrap();
        assert_eq!(buffer.get_cell(5, 5).ch(), 'X');
        assert!(buffer.get(50, 20).is_none());

        buffer.resize(80, 24).unwrap();
        assert_eq!(buffer.get_cell(50, 20), Cell::DEFAULT);
    }

    #[test]
    fn test_resize_zero_rejected_and_untouched() {
        let mut buffer = CellBuffer::new(8, 8).unwrap();
        buffer.set(1, 1, Cell::new('Q'));
        assert!(buffer.resize(0, 5).is_err());
        assert_eq!(buffer.width(), 8);
        assert_eq!(buffer.get_cell(1, 1).ch(), 'Q');
    }

    #[test]
    fn test_write_row_uniform() {
        let mut buffer = CellBuffer::new(10, 2).unwrap();
        let written = buffer.write_str(2, 1, "hello", Style::new(RED, BLUE));
        assert_eq!(written, 5);
        assert_eq!(text_of(&buffer, 1), "  hello   ");
        assert_eq!(buffer.get_cell(6, 1).fg(), RED);
    }

    #[test]
    fn test_write_row_per_char_colors_fall_back() {
        let mut buffer = CellBuffer::new(10, 1).unwrap();
        let fg = [RED, BLUE];
        let attrs = [Attributes::empty(), Attributes::empty(), Attributes::UNDERLINE];
        let paint = RowPaint::uniform(Style::new(Color::WHITE, Color::BLACK))
            .with_fg(&fg)
            .with_attrs(&attrs);
        buffer.write_row(0, 0, "abcd", &paint, UNCLIPPED);

        assert_eq!(buffer.get_cell(0, 0).fg(), RED);
        assert_eq!(buffer.get_cell(1, 0).fg(), BLUE);
        assert_eq!(buffer.get_cell(2, 0).fg(), Color::WHITE);
        assert_eq!(buffer.get_cell(2, 0).attrs(), Attributes::UNDERLINE);
        assert_eq!(buffer.get_cell(3, 0).bg(), Color::BLACK);
    }

    #[test]
    fn test_write_row_clip_window() {
        let mut buffer = CellBuffer::new(12, 1).unwrap();
        // Text scrolled two columns left inside a window spanning columns 3..7.
        let written = buffer.write_row(1, 0, "abcdefghij", &RowPaint::default(), 3..7);
        assert_eq!(written, 4);
        assert_eq!(text_of(&buffer, 0), "   cdef     ");
    }

    #[test]
    fn test_write_row_per_char_index_survives_clipping() {
        let mut buffer = CellBuffer::new(5, 1).unwrap();
        let fg = [RED, BLUE, Color::WHITE];
        let paint = RowPaint::uniform(Style::DEFAULT).with_fg(&fg);
        buffer.write_row(-2, 0, "xyz", &paint, UNCLIPPED);
        assert_eq!(buffer.get_cell(0, 0).ch(), 'z');
        assert_eq!(buffer.get_cell(0, 0).fg(), Color::WHITE);
    }

    #[test]
    fn test_write_row_out_of_bounds_rows() {
        let mut buffer = CellBuffer::new(5, 2).unwrap();
        assert_eq!(buffer.write_str(0, -1, "abc", Style::DEFAULT), 0);
        assert_eq!(buffer.write_str(0, 2, "abc", Style::DEFAULT), 0);
        assert_eq!(buffer.write_row(0, 0, "abc", &RowPaint::default(), 4..2), 0);
        assert_eq!(buffer.write_str(3, 1, "abc", Style::DEFAULT), 2);
    }

    #[test]
    fn test_copy_from() {
        let mut a = CellBuffer::new(4, 4).unwrap();
        let mut b = CellBuffer::new(4, 4).unwrap();
        b.set(3, 3, Cell::new('Z'));
        a.copy_from(&b);
        assert_eq!(a, b);

        let c = CellBuffer::new(2, 9).unwrap();
        a.copy_from(&c);
        assert_eq!(a.width(), 2);
        assert_eq!(a.height(), 9);
    }

    #[test]
    fn test_capture_and_blit() {
        let mut buffer = CellBuffer::new(10, 5).unwrap();
        buffer.write_str(2, 1, "abc", Style::new(RED, Color::DEFAULT));
        buffer.write_str(2, 2, "def", Style::DEFAULT);

        let snap = buffer.capture(Rect::new(2, 1, 3, 2));
        assert_eq!(snap.width(), 3);
        assert_eq!(snap.height(), 2);
        assert_eq!(snap.get(1, 1).unwrap().ch(), 'e');

        let mut target = CellBuffer::new(10, 5).unwrap();
        assert_eq!(target.blit(6, 3, &snap), 6);
        assert_eq!(target.get_cell(6, 3), buffer.get_cell(2, 1));
        assert_eq!(target.get_cell(8, 4).ch(), 'f');
    }

    #[test]
    fn test_capture_past_edge_reads_default() {
        let mut buffer = CellBuffer::new(4, 2).unwrap();
        buffer.fill(0, 0, 4, 2, '#', Style::DEFAULT);
        let snap = buffer.capture(Rect::new(3, 1, 3, 2));
        assert_eq!(snap.len(), 6);
        assert_eq!(snap.get(0, 0).unwrap().ch(), '#');
        assert_eq!(*snap.get(1, 0).unwrap(), Cell::DEFAULT);
        assert_eq!(*snap.get(0, 1).unwrap(), Cell::DEFAULT);
    }

    #[test]
    fn test_blit_clips_negative_origin() {
        let snap = Snapshot::from_cells(
            3,
            2,
            "abcdef".chars().map(Cell::new).collect(),
        )
        .unwrap();
        let mut buffer = CellBuffer::new(4, 4).unwrap();
        assert_eq!(buffer.blit(-1, -1, &snap), 2);
        assert_eq!(text_of(&buffer, 0), "ef  ");
        assert_eq!(buffer.blit(10, 10, &snap), 0);
    }

    #[test]
    fn test_snapshot_from_cells_checks_length() {
        assert!(Snapshot::from_cells(2, 2, vec![Cell::DEFAULT; 3]).is_none());
        assert!(Snapshot::from_cells(2, 2, vec![Cell::DEFAULT; 4]).is_some());
    }
}
