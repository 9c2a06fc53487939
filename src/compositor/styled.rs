//! Styled text: ordered runs of text that each carry their own colors.
//!
//! Callers that used to embed escape codes in strings build a [`StyledText`]
//! instead. [`StyledText::from_ansi`] still accepts the old form and turns the
//! truecolor/reset subset of SGR into spans.

use crate::buffer::{Attributes, Color, Style};

const ESC: u8 = 0x1b;

/// One run of text drawn with a single style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Text of the run. Each `char` occupies one cell.
    pub text: String,
    /// Colors and attributes for every cell of the run.
    pub style: Style,
}

impl Span {
    /// Create a span.
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Number of cells the span covers.
    pub fn cell_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// A line of text made of differently styled spans.
///
/// # Example
/// ```
/// use cellframe::{Color, StyledText};
///
/// let text = StyledText::new()
///     .span("ok ", Color::from_u32(0x00FF00), Color::DEFAULT)
///     .span("done", Color::DEFAULT, Color::DEFAULT);
/// assert_eq!(text.cell_count(), 7);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledText {
    spans: Vec<Span>,
}

impl StyledText {
    /// Empty text.
    pub const fn new() -> Self {
        Self { spans: Vec::new() }
    }

    /// Text in the terminal's default colors.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::styled(text, Style::DEFAULT)
    }

    /// Text in a single style.
    pub fn styled(text: impl Into<String>, style: Style) -> Self {
        let mut styled = Self::new();
        styled.push(text, style);
        styled
    }

    /// Builder form of [`push`](Self::push) taking colors only.
    #[must_use]
    pub fn span(mut self, text: impl Into<String>, fg: Color, bg: Color) -> Self {
        self.push(text, Style::new(fg, bg));
        self
    }

    /// Append a run. Empty text is ignored; a run with the same style as the
    /// last one is merged into it.
    pub fn push(&mut self, text: impl Into<String>, style: Style) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.text.push_str(&text),
            _ => self.spans.push(Span { text, style }),
        }
    }

    /// The runs, in drawing order.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Check if there is no text at all.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Total number of cells covered.
    pub fn cell_count(&self) -> usize {
        self.spans.iter().map(Span::cell_count).sum()
    }

    /// The text without any styling.
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }

    /// Parse text with embedded SGR escapes.
    ///
    /// Understood: `ESC[38;2;r;g;bm`, `ESC[48;2;r;g;bm`, `ESC[39m`,
    /// `ESC[49m`, `ESC[0m` (and `ESC[m`), plus bold/underline/italic on
    /// (`1`/`4`/`3`) and off (`22`/`24`/`23`). Every other CSI sequence is
    /// dropped without affecting the text. A truncated sequence at the end of
    /// the input is dropped too.
    pub fn from_ansi(input: &str) -> Self {
        let bytes = input.as_bytes();
        let mut out = Self::new();
        let mut style = Style::DEFAULT;
        let mut segment_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] != ESC {
                i += 1;
                continue;
            }

            out.push(&input[segment_start..i], style);

            match csi_at(bytes, i) {
                Some(Csi { params, final_byte, len }) => {
                    if final_byte == b'm' {
                        apply_sgr(&input[params], &mut style);
                    }
                    i += len;
                }
                None if bytes.get(i + 1) == Some(&b'[') => {
                    // Unterminated CSI runs to the end of the input.
                    i = bytes.len();
                }
                None => i += 1,
            }
            segment_start = i;
        }

        out.push(&input[segment_start..], style);
        out
    }
}

impl From<&str> for StyledText {
    fn from(text: &str) -> Self {
        Self::plain(text)
    }
}

impl From<String> for StyledText {
    fn from(text: String) -> Self {
        Self::plain(text)
    }
}

impl From<Span> for StyledText {
    fn from(span: Span) -> Self {
        Self::styled(span.text, span.style)
    }
}

/// A located CSI sequence.
struct Csi {
    /// Byte range of the parameter bytes.
    params: std::ops::Range<usize>,
    final_byte: u8,
    /// Total length including `ESC[`.
    len: usize,
}

/// Find a CSI sequence (`ESC[` params intermediates final) starting at `pos`.
fn csi_at(bytes: &[u8], pos: usize) -> Option<Csi> {
    if bytes.get(pos) != Some(&ESC) || bytes.get(pos + 1) != Some(&b'[') {
        return None;
    }
    let params_start = pos + 2;
    let mut i = params_start;

    // Parameter bytes: 0x30–0x3F
    while i < bytes.len() && (0x30..=0x3F).contains(&bytes[i]) {
        i += 1;
    }
    let params_end = i;

    // Intermediate bytes: 0x20–0x2F
    while i < bytes.len() && (0x20..=0x2F).contains(&bytes[i]) {
        i += 1;
    }

    // Final byte: 0x40–0x7E
    let final_byte = *bytes.get(i)?;
    if !(0x40..=0x7E).contains(&final_byte) {
        return None;
    }

    Some(Csi {
        params: params_start..params_end,
        final_byte,
        len: i + 1 - pos,
    })
}

/// Apply one SGR parameter list to `style`.
fn apply_sgr(params: &str, style: &mut Style) {
    let codes: Vec<Option<u16>> = params
        .split(';')
        .map(|p| if p.is_empty() { Some(0) } else { p.parse().ok() })
        .collect();

    let mut i = 0;
    while i < codes.len() {
        match codes[i] {
            Some(0) => *style = Style::DEFAULT,
            Some(1) => style.attrs.insert(Attributes::BOLD),
            Some(3) => style.attrs.insert(Attributes::ITALIC),
            Some(4) => style.attrs.insert(Attributes::UNDERLINE),
            Some(22) => style.attrs.remove(Attributes::BOLD),
            Some(23) => style.attrs.remove(Attributes::ITALIC),
            Some(24) => style.attrs.remove(Attributes::UNDERLINE),
            Some(39) => style.fg = Color::DEFAULT,
            Some(49) => style.bg = Color::DEFAULT,
            Some(code @ (38 | 48)) => match codes.get(i + 1) {
                Some(Some(2)) => {
                    if let Some(color) = rgb_at(&codes, i + 2) {
                        if code == 38 {
                            style.fg = color;
                        } else {
                            style.bg = color;
                        }
                    }
                    i += 4;
                }
                // 256-color palette: not representable, skip its index.
                Some(Some(5)) => i += 2,
                _ => return,
            },
            _ => {}
        }
        i += 1;
    }
}

fn rgb_at(codes: &[Option<u16>], start: usize) -> Option<Color> {
    let component = |offset: usize| -> Option<u8> {
        codes
            .get(start + offset)
            .copied()
            .flatten()
            .and_then(|v| u8::try_from(v).ok())
    };
    Some(Color::rgb(component(0)?, component(1)?, component(2)?))
}
