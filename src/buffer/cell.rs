//! Cell: The atomic unit of terminal display.
//!
//! # Memory Layout
//!
//! A `Cell` packs one character position into 16 bytes so four cells share a
//! 64-byte cache line and whole-row comparisons stay cheap:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Cell Layout (16 bytes)                                  │
//! ├───────────┬───────────┬───────────┬───────┬──────────────┤
//! │    ch     │    fg     │    bg     │ attrs │   padding    │
//! │   char    │   i32     │   i32     │  u8   │   [u8; 3]    │
//! │  4 bytes  │  4 bytes  │  4 bytes  │  1 b  │   3 bytes    │
//! └───────────┴───────────┴───────────┴───────┴──────────────┘
//! ```
//!
//! Colors are packed 24-bit RGB integers, with `-1` standing for the
//! terminal's own default color. Theme and gradient resolution happen before
//! a color reaches this module.

use crate::error::Error;
use bitflags::bitflags;

/// A packed 24-bit RGB color, or the terminal default.
///
/// The packed value is `0xRRGGBB`; the sentinel `-1` means "whatever the
/// terminal's default foreground/background is".
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(i32);

impl Color {
    /// The terminal's default color (`-1`).
    pub const DEFAULT: Self = Self(-1);
    /// Black (0x000000)
    pub const BLACK: Self = Self(0);
    /// White (0xFFFFFF)
    pub const WHITE: Self = Self(0x00FF_FFFF);

    /// Never equal to a color reachable through the public constructors.
    /// Used to poison baseline rows so they compare unequal to every cell.
    pub(crate) const INVALID: Self = Self(i32::MIN);

    /// Create a color from its channels.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as i32) << 16) | ((g as i32) << 8) | (b as i32))
    }

    /// Create from a 24-bit hex color (e.g., 0xFF5500). Bits above 24 are dropped.
    #[inline]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn from_u32(hex: u32) -> Self {
        Self((hex & 0x00FF_FFFF) as i32)
    }

    /// The packed value: `-1` or `0..=0xFFFFFF`.
    #[inline]
    pub const fn packed(self) -> i32 {
        self.0
    }

    /// Whether this is the terminal default color.
    #[inline]
    pub const fn is_default(self) -> bool {
        self.0 == -1
    }

    /// Red, green and blue channels, or `None` for the default color.
    #[inline]
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub const fn components(self) -> Option<(u8, u8, u8)> {
        if self.0 < 0 {
            return None;
        }
        Some((
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        ))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i32> for Color {
    type Error = Error;

    /// Accepts `-1` or a packed value in `0..=0xFFFFFF`.
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if value == -1 || (0..=0x00FF_FFFF).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidColor(i64::from(value)))
        }
    }
}

impl From<u32> for Color {
    /// Convert from a 24-bit hex color (e.g., 0xFF5500)
    #[inline]
    fn from(hex: u32) -> Self {
        Self::from_u32(hex)
    }
}

impl From<(u8, u8, u8)> for Color {
    #[inline]
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::rgb(r, g, b)
    }
}

impl std::fmt::Debug for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.components() {
            Some((r, g, b)) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
            None if self.is_default() => f.write_str("default"),
            None => f.write_str("invalid"),
        }
    }
}

bitflags! {
    /// Text attributes. Independent flags, freely combinable.
    ///
    /// # Example
    /// ```
    /// use cellframe::Attributes;
    /// let style = Attributes::BOLD | Attributes::ITALIC;
    /// assert!(style.contains(Attributes::BOLD));
    /// ```
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attributes: u8 {
        /// Bold text (SGR 1)
        const BOLD = 0b0000_0001;
        /// Underlined text (SGR 4)
        const UNDERLINE = 0b0000_0010;
        /// Italic text (SGR 3)
        const ITALIC = 0b0000_0100;
    }
}

impl std::fmt::Debug for Attributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        bitflags::parser::to_writer(self, f)
    }
}

/// Foreground, background and attributes applied together by draw calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    /// Foreground color.
    pub fg: Color,
    /// Background color.
    pub bg: Color,
    /// Text attributes.
    pub attrs: Attributes,
}

impl Style {
    /// Default colors, no attributes.
    pub const DEFAULT: Self = Self::new(Color::DEFAULT, Color::DEFAULT);

    /// A style with the given colors and no attributes.
    #[inline]
    pub const fn new(fg: Color, bg: Color) -> Self {
        Self {
            fg,
            bg,
            attrs: Attributes::empty(),
        }
    }

    /// Set the attributes (builder pattern).
    #[inline]
    #[must_use]
    pub const fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }
}

/// A single terminal cell: one character position and its full visual state.
///
/// Two cells are equal only when character, both colors and the attribute
/// mask all match. The diff renderer relies on exactly this equality.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
    attrs: Attributes,
}

// Compile-time assertion: Cell must stay at 16 bytes
const _: () = assert!(
    std::mem::size_of::<Cell>() == 16,
    "Cell must be exactly 16 bytes for cache efficiency"
);

impl Default for Cell {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Cell {
    /// The default cell: a space with default colors and no attributes.
    pub const DEFAULT: Self = Self {
        ch: ' ',
        fg: Color::DEFAULT,
        bg: Color::DEFAULT,
        attrs: Attributes::empty(),
    };

    /// Stamped into baseline rows to force them to redraw.
    pub(crate) const INVALIDATED: Self = Self {
        ch: '\0',
        fg: Color::INVALID,
        bg: Color::INVALID,
        attrs: Attributes::all(),
    };

    /// Create a cell with default colors.
    #[inline]
    pub const fn new(ch: char) -> Self {
        Self {
            ch,
            fg: Color::DEFAULT,
            bg: Color::DEFAULT,
            attrs: Attributes::empty(),
        }
    }

    /// Create a cell with every field given.
    #[inline]
    pub const fn with_all(ch: char, fg: Color, bg: Color, attrs: Attributes) -> Self {
        Self { ch, fg, bg, attrs }
    }

    /// Create a cell from a character and a [`Style`].
    #[inline]
    pub const fn styled(ch: char, style: Style) -> Self {
        Self::with_all(ch, style.fg, style.bg, style.attrs)
    }

    /// The character.
    #[inline]
    pub const fn ch(&self) -> char {
        self.ch
    }

    /// Get the foreground color.
    #[inline]
    pub const fn fg(&self) -> Color {
        self.fg
    }

    /// Get the background color.
    #[inline]
    pub const fn bg(&self) -> Color {
        self.bg
    }

    /// Get the attributes.
    #[inline]
    pub const fn attrs(&self) -> Attributes {
        self.attrs
    }

    /// Colors and attributes as a [`Style`].
    #[inline]
    pub const fn style(&self) -> Style {
        Style {
            fg: self.fg,
            bg: self.bg,
            attrs: self.attrs,
        }
    }

    /// Whether `other` would be drawn with the same SGR state.
    #[inline]
    pub fn same_style(&self, other: &Self) -> bool {
        self.fg == other.fg && self.bg == other.bg && self.attrs == other.attrs
    }

    /// Set the character.
    #[inline]
    pub const fn set_ch(&mut self, ch: char) -> &mut Self {
        self.ch = ch;
        self
    }

    /// Set the foreground color.
    #[inline]
    pub const fn set_fg(&mut self, fg: Color) -> &mut Self {
        self.fg = fg;
        self
    }

    /// Set the background color.
    #[inline]
    pub const fn set_bg(&mut self, bg: Color) -> &mut Self {
        self.bg = bg;
        self
    }

    /// Set the attributes.
    #[inline]
    pub const fn set_attrs(&mut self, attrs: Attributes) -> &mut Self {
        self.attrs = attrs;
        self
    }

    /// Set the foreground color (builder pattern).
    #[inline]
    #[must_use]
    pub const fn with_fg(mut self, fg: Color) -> Self {
        self.fg = fg;
        self
    }

    /// Set the background color (builder pattern).
    #[inline]
    #[must_use]
    pub const fn with_bg(mut self, bg: Color) -> Self {
        self.bg = bg;
        self
    }

    /// Set the attributes (builder pattern).
    #[inline]
    #[must_use]
    pub const fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    /// Reset the cell to the default cell.
    #[inline]
    pub const fn reset(&mut self) {
        *self = Self::DEFAULT;
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell")
            .field("ch", &self.ch)
            .field("fg", &self.fg)
            .field("bg", &self.bg)
            .field("attrs", &self.attrs)
            .finish()
    }
}
