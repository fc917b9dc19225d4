//! Text card rendered in place of generated art

use super::GeneratedImage;
use bytes::Bytes;

const SIZE: u32 = 512;
const MARGIN: u32 = 20;
const FIRST_BASELINE: u32 = 30;
const LINE_STEP: u32 = 30;
const FONT_SIZE: u32 = 20;
const MAX_LINES: usize = 12;
const BACKGROUND: (u8, u8, u8) = (60, 90, 130);

/// Average advance of a 20px sans-serif glyph
const GLYPH_WIDTH: f32 = FONT_SIZE as f32 * 0.55;

/// Render `text` as a 512x512 SVG card with greedy word wrapping
pub fn render_fallback_panel(text: &str) -> GeneratedImage {
    let (r, g, b) = BACKGROUND;
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{SIZE}\" height=\"{SIZE}\" viewBox=\"0 0 {SIZE} {SIZE}\">\
<rect width=\"100%\" height=\"100%\" fill=\"rgb({r},{g},{b})\"/>"
    );

    let mut y = FIRST_BASELINE;
    for line in wrap_words(text, (SIZE - 2 * MARGIN) as f32)
        .iter()
        .take(MAX_LINES)
    {
        svg.push_str(&format!(
            "<text x=\"{MARGIN}\" y=\"{y}\" font-family=\"Arial, sans-serif\" font-size=\"{FONT_SIZE}\" fill=\"rgb(255,255,255)\">{}</text>",
            escape_xml(line)
        ));
        y += LINE_STEP;
    }
    svg.push_str("</svg>");

    GeneratedImage {
        bytes: Bytes::from(svg),
        mime: "image/svg+xml".to_string(),
    }
}

fn text_width(line: &str) -> f32 {
    line.chars().count() as f32 * GLYPH_WIDTH
}

/// Greedy wrap; a single word wider than the line gets a line of its own
fn wrap_words(text: &str, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{line} {word}")
        };

        if text_width(&candidate) <= max_width || line.is_empty() {
            line = candidate;
        } else {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svg_text(image: &GeneratedImage) -> String {
        String::from_utf8(image.bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_card_shape() {
        let image = render_fallback_panel("A squirrel discovers Ohm's Law");
        let svg = svg_text(&image);

        assert_eq!(image.mime, "image/svg+xml");
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("width=\"512\" height=\"512\""));
        assert!(svg.contains("fill=\"rgb(60,90,130)\""));
        assert!(svg.contains("Ohm&apos;s Law"));
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "word ".repeat(60);
        let lines = wrap_words(&text, 472.0);

        assert!(lines.len() > 1);
        assert!(lines.iter().all(|line| text_width(line) <= 472.0));
        assert_eq!(lines.iter().map(|l| l.split(' ').count()).sum::<usize>(), 60);
    }

    #[test]
    fn test_overlong_word_is_kept_whole() {
        let long_word = "x".repeat(80);
        let lines = wrap_words(&format!("short {long_word} tail"), 472.0);

        assert_eq!(lines, vec!["short".to_string(), long_word, "tail".to_string()]);
    }

    #[test]
    fn test_lines_capped_and_stepped() {
        let text = "lorem ipsum dolor ".repeat(100);
        let svg = svg_text(&render_fallback_panel(&text));

        assert_eq!(svg.matches("<text ").count(), MAX_LINES);
        assert!(svg.contains("y=\"30\""));
        assert!(svg.contains("y=\"360\""));
        assert!(!svg.contains("y=\"390\""));
    }

    #[test]
    fn test_markup_is_escaped() {
        let svg = svg_text(&render_fallback_panel("<script> & more"));
        assert!(svg.contains("&lt;script&gt; &amp; more"));
        assert!(!svg.contains("<script>"));
    }
}
