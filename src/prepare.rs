//! HTML preparation – prefixes caller HTML with the Arabic style block.
//!
//! The style block declares the bundled faces with `@font-face`, makes the
//! body right-to-left and defines the semantic classes used by the document
//! builders. Everything here is pure string work; no engine is involved.

use std::fmt::Write as _;
use std::path::Path;

use crate::fonts::FontRegistry;

/// Centered bold heading.
pub const TITLE_CLASS: &str = "arabic-title";
/// Right-aligned bold sub-heading.
pub const SUBTITLE_CLASS: &str = "arabic-subtitle";
/// Justified body paragraph with a first-line indent.
pub const PARAGRAPH_CLASS: &str = "arabic-paragraph";
/// Centered verse text set in the Quran face.
pub const QURAN_CLASS: &str = "quran-text";
/// Plain right-to-left text.
pub const TEXT_CLASS: &str = "arabic-text";

const TEXT_FAMILIES: &str = r#""Amiri", "Cairo", Arial, sans-serif"#;
const QURAN_FAMILIES: &str = r#""AmiriQuran", "Amiri", Arial, sans-serif"#;

/// `(family, symbolic font name, bold)` for each declared face.
const FONT_FACES: [(&str, &str, bool); 4] = [
    ("Amiri", "Amiri-Regular", false),
    ("Amiri", "Amiri-Bold", true),
    ("Cairo", "Cairo-Regular", false),
    ("Cairo", "Cairo-Bold", true),
];

/// A font path as it may appear inside `url("...")`. Characters that would
/// close the string or the `<style>` element are percent-encoded.
fn css_url(path: &Path) -> String {
    let mut url = String::new();
    for c in path.to_string_lossy().chars() {
        match c {
            '"' => url.push_str("%22"),
            '<' => url.push_str("%3C"),
            '\n' => url.push_str("%0A"),
            '\r' => url.push_str("%0D"),
            c => url.push(c),
        }
    }
    url
}

/// Prefix `fragment` with the Arabic `<style>` block.
///
/// Deterministic for a given registry. Not idempotent: preparing an already
/// prepared document adds a second style block.
pub fn prepare_arabic_html(fragment: &str, fonts: &FontRegistry) -> String {
    let mut out = String::with_capacity(fragment.len() + 2048);
    out.push_str("<style>\n");

    for (family, name, bold) in FONT_FACES {
        let src = fonts.path(name).map(css_url).unwrap_or_default();
        let _ = writeln!(out, "@font-face {{");
        let _ = writeln!(out, "    font-family: \"{family}\";");
        let _ = writeln!(out, "    src: url(\"{src}\") format(\"truetype\");");
        if bold {
            let _ = writeln!(out, "    font-weight: bold;");
        }
        let _ = writeln!(out, "}}");
    }

    let rules: [(&str, &[(&str, &str)]); 6] = [
        (
            "body",
            &[
                ("font-family", TEXT_FAMILIES),
                ("direction", "rtl"),
                ("text-align", "right"),
                ("line-height", "1.6"),
            ],
        ),
        (
            ".arabic-text",
            &[
                ("direction", "rtl"),
                ("text-align", "right"),
                ("font-family", TEXT_FAMILIES),
            ],
        ),
        (
            ".arabic-title",
            &[
                ("direction", "rtl"),
                ("text-align", "center"),
                ("font-family", TEXT_FAMILIES),
                ("font-size", "18px"),
                ("font-weight", "bold"),
                ("margin-bottom", "20px"),
            ],
        ),
        (
            ".arabic-subtitle",
            &[
                ("direction", "rtl"),
                ("text-align", "right"),
                ("font-family", TEXT_FAMILIES),
                ("font-size", "14px"),
                ("font-weight", "bold"),
                ("margin-top", "15px"),
                ("margin-bottom", "10px"),
            ],
        ),
        (
            ".arabic-paragraph",
            &[
                ("direction", "rtl"),
                ("text-align", "justify"),
                ("font-family", TEXT_FAMILIES),
                ("margin-bottom", "10px"),
                ("text-indent", "20px"),
            ],
        ),
        (
            ".quran-text",
            &[
                ("direction", "rtl"),
                ("text-align", "center"),
                ("font-family", QURAN_FAMILIES),
                ("font-size", "16px"),
                ("line-height", "2"),
                ("margin", "20px 0"),
            ],
        ),
    ];

    for (selector, declarations) in rules {
        let _ = writeln!(out, "{selector} {{");
        for (property, value) in declarations {
            let _ = writeln!(out, "    {property}: {value};");
        }
        let _ = writeln!(out, "}}");
    }

    out.push_str("</style>");
    out.push_str(fragment);
    out
}

/// Escape text for use in HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}

/// Insert `<br />` before every line break (`\r\n`, `\n` or `\r`), keeping
/// the break itself.
pub fn nl2br(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                out.push_str("<br />\r");
                if chars.peek() == Some(&'\n') {
                    chars.next();
                    out.push('\n');
                }
            }
            '\n' => out.push_str("<br />\n"),
            c => out.push(c),
        }
    }
    out
}

/// Fragment for a titled document with one paragraph.
pub fn simple_document_html(title: &str, content: &str) -> String {
    format!(
        "\n<div class=\"{TITLE_CLASS}\">{}</div>\n<div class=\"{PARAGRAPH_CLASS}\">{}</div>\n",
        escape_html(title),
        nl2br(&escape_html(content))
    )
}

/// Fragment for a single Quran verse with its surah/ayah heading.
pub fn quran_document_html(surah: &str, ayah: &str, text: &str) -> String {
    format!(
        "\n<div class=\"{TITLE_CLASS}\">سورة {} - الآية {}</div>\n<div class=\"{QURAN_CLASS}\">{}</div>\n",
        escape_html(surah),
        escape_html(ayah),
        escape_html(text)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> FontRegistry {
        FontRegistry::from_dir(Path::new("/srv/fonts"))
    }

    #[test]
    fn style_block_precedes_fragment() {
        let html = prepare_arabic_html("<p>مرحبا</p>", &registry());
        assert!(html.starts_with("<style>"));
        assert!(html.ends_with("</style><p>مرحبا</p>"));
    }

    #[test]
    fn font_faces_in_order() {
        let html = prepare_arabic_html("", &registry());
        let positions: Vec<usize> = [
            "/srv/fonts/Amiri-Regular.ttf",
            "/srv/fonts/Amiri-Bold.ttf",
            "/srv/fonts/Cairo-Regular.ttf",
            "/srv/fonts/Cairo-Bold.ttf",
        ]
        .iter()
        .map(|p| html.find(p).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(html.matches("@font-face").count(), 4);
        assert_eq!(html.matches("font-weight: bold;").count(), 4);
    }

    #[test]
    fn font_urls_cannot_break_out_of_the_stylesheet() {
        let fonts = FontRegistry::from_dir(Path::new("/srv/my \"fonts\"</style>"));
        let html = prepare_arabic_html("<p>x</p>", &fonts);
        assert!(html.contains(r#"url("/srv/my %22fonts%22%3C/style>/Amiri-Regular.ttf")"#));
        assert_eq!(html.matches("</style>").count(), 1);
    }

    #[test]
    fn class_rules_present() {
        let html = prepare_arabic_html("", &registry());
        for class in [TEXT_CLASS, TITLE_CLASS, SUBTITLE_CLASS, PARAGRAPH_CLASS, QURAN_CLASS] {
            assert!(html.contains(&format!(".{class} {{")), "missing {class}");
        }
        assert!(html.contains("text-indent: 20px;"));
        assert!(html.contains("margin: 20px 0;"));
    }

    #[test]
    fn preparing_twice_adds_a_second_block() {
        let once = prepare_arabic_html("<p>x</p>", &registry());
        let twice = prepare_arabic_html(&once, &registry());
        assert_eq!(twice.matches("<style>").count(), 2);
    }

    #[test]
    fn escaping_matches_html_rules() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#039;Jerry&#039;&lt;/b&gt;"
        );
    }

    #[test]
    fn nl2br_keeps_line_breaks() {
        assert_eq!(nl2br("أ\nب\r\nج"), "أ<br />\nب<br />\r\nج");
    }

    #[test]
    fn simple_fragment_escapes_and_breaks() {
        let html = simple_document_html("<عنوان>", "سطر\nسطر");
        assert!(html.contains(r#"<div class="arabic-title">&lt;عنوان&gt;</div>"#));
        assert!(html.contains(r#"<div class="arabic-paragraph">سطر<br />"#));
    }

    #[test]
    fn quran_heading_template() {
        let html = quran_document_html("الفاتحة", "1", "بِسْمِ اللَّهِ");
        assert!(html.contains("سورة الفاتحة - الآية 1"));
        assert!(html.contains(r#"<div class="quran-text">بِسْمِ اللَّهِ</div>"#));
    }
}
