//! Rendering engine seam and the bundled glyph engine.
//!
//! The protocol core treats rendering as an opaque pair of operations behind
//! the [`RenderEngine`] trait: turn source markup into a graphic, and dump
//! the stylesheet covering everything rendered since the previous dump. The
//! engine is constructed once at startup and used by every request; it is the
//! only state that outlives a request cycle.
//!
//! [`GlyphEngine`] is the implementation shipped with the worker. It typesets
//! the source text into a standalone `<svg>` element, one `<tspan>` per run
//! of like glyphs, and styles the runs through CSS classes so the markup
//! stays lean and the styling ships separately in the stylesheet.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use thiserror::Error;

/// Failure surfaced by a rendering engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not produce output for the given source.
    #[error("cannot render input: {0}")]
    Rejected(String),
}

/// The two operations the protocol core needs from a rendering engine.
///
/// Implementations may keep arbitrary internal state (caches, accumulated
/// style usage); the core only guarantees single-threaded, strictly
/// sequential access.
pub trait RenderEngine {
    /// Render source markup into graphic markup.
    ///
    /// `aspect_ratio` is an opaque per-request styling directive; `None`
    /// means the request carried no directive.
    fn render(&mut self, source: &str, aspect_ratio: Option<&str>) -> Result<String, EngineError>;

    /// Emit the stylesheet covering every render since the previous dump.
    fn dump_stylesheet(&mut self) -> Result<String, EngineError>;
}

/// Horizontal advance per glyph, in viewBox units.
const GLYPH_ADVANCE: usize = 9;
/// Line height of the rendered box, in viewBox units.
const LINE_HEIGHT: usize = 18;
/// Baseline offset from the top of the box.
const BASELINE: usize = 14;

/// Glyph categories, each styled by its own CSS class.
///
/// Math convention: letters set in italic, digits and operators upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum GlyphClass {
    /// The enclosing text line; recorded on every render.
    Line,
    Letter,
    Digit,
    Operator,
    Plain,
}

impl GlyphClass {
    fn of(c: char) -> Self {
        if c.is_alphabetic() {
            GlyphClass::Letter
        } else if c.is_ascii_digit() {
            GlyphClass::Digit
        } else if "+-*/=<>^_|(){}[]".contains(c) {
            GlyphClass::Operator
        } else {
            GlyphClass::Plain
        }
    }

    fn css_class(self) -> &'static str {
        match self {
            GlyphClass::Line => "tsd-line",
            GlyphClass::Letter => "tsd-letter",
            GlyphClass::Digit => "tsd-digit",
            GlyphClass::Operator => "tsd-op",
            GlyphClass::Plain => "tsd-plain",
        }
    }

    fn rule(self) -> &'static str {
        match self {
            GlyphClass::Line => {
                ".tsd-line { font-family: 'STIX Two Math', 'Cambria Math', serif; font-size: 16px; }"
            }
            GlyphClass::Letter => ".tsd-letter { font-style: italic; }",
            GlyphClass::Digit => ".tsd-digit { font-style: normal; }",
            GlyphClass::Operator => ".tsd-op { font-style: normal; letter-spacing: 0.1em; }",
            GlyphClass::Plain => ".tsd-plain { font-style: normal; }",
        }
    }
}

/// Self-contained SVG typesetter.
///
/// The emitted `<svg>` carries no `width`/`height` attributes so it scales to
/// fill whatever container the caller wraps it in; sizing comes from the
/// `viewBox` alone. A `preserveAspectRatio` attribute is set from the
/// per-request directive when one is present, falling back to the
/// process-wide default, and omitted entirely when neither exists.
///
/// Style usage accumulates across renders and is drained by
/// `dump_stylesheet`: each dump emits rules for exactly the classes used
/// since the previous dump, then clears the accumulator.
pub struct GlyphEngine {
    default_aspect_ratio: Option<String>,
    used: BTreeSet<GlyphClass>,
}

impl GlyphEngine {
    /// Create an engine with an optional process-wide default styling
    /// directive, applied when a request carries none.
    pub fn new(default_aspect_ratio: Option<String>) -> Self {
        Self {
            default_aspect_ratio,
            used: BTreeSet::new(),
        }
    }
}

impl RenderEngine for GlyphEngine {
    fn render(&mut self, source: &str, aspect_ratio: Option<&str>) -> Result<String, EngineError> {
        self.used.insert(GlyphClass::Line);

        // Group the source into runs of like glyphs, one tspan per run.
        let mut body = String::new();
        let mut run = String::new();
        let mut run_class: Option<GlyphClass> = None;
        for c in source.chars() {
            let class = GlyphClass::of(c);
            if run_class != Some(class) {
                if let Some(prev) = run_class {
                    push_tspan(&mut body, prev, &run);
                    run.clear();
                }
                run_class = Some(class);
                self.used.insert(class);
            }
            run.push(c);
        }
        if let Some(prev) = run_class {
            push_tspan(&mut body, prev, &run);
        }

        let advance = source.chars().count() * GLYPH_ADVANCE;
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {advance} {LINE_HEIGHT}""#
        );
        let directive = aspect_ratio.or(self.default_aspect_ratio.as_deref());
        if let Some(directive) = directive {
            let mut escaped = String::new();
            escape_into(&mut escaped, directive);
            let _ = write!(svg, r#" preserveAspectRatio="{escaped}""#);
        }
        let _ = write!(
            svg,
            r#"><text class="tsd-line" x="0" y="{BASELINE}">{body}</text></svg>"#
        );

        Ok(svg)
    }

    fn dump_stylesheet(&mut self) -> Result<String, EngineError> {
        let rules: Vec<&str> = self.used.iter().map(|class| class.rule()).collect();
        self.used.clear();
        Ok(rules.join("\n"))
    }
}

fn push_tspan(body: &mut String, class: GlyphClass, run: &str) {
    let _ = write!(body, r#"<tspan class="{}">"#, class.css_class());
    escape_into(body, run);
    body.push_str("</tspan>");
}

/// Minimal XML escaping so arbitrary source text yields well-formed markup.
fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}
