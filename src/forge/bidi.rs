//! Minimal bidirectional reordering for single lines.
//!
//! Splits a logical line into directional runs and returns them in visual
//! (left-to-right) order. This covers the common Arabic-with-Latin-and-digits
//! case: strong letters decide a run's direction, digits read left to right,
//! and neutrals between two runs of the same direction join them.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Rtl,
    Ltr,
    Neutral,
}

fn class(c: char) -> Class {
    match c as u32 {
        0x0660..=0x0669 | 0x06F0..=0x06F9 => Class::Ltr,
        0x0590..=0x08FF | 0xFB1D..=0xFDFF | 0xFE70..=0xFEFF | 0x10800..=0x10FFF => Class::Rtl,
        _ if c.is_alphanumeric() => Class::Ltr,
        _ => Class::Neutral,
    }
}

/// A directional run of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    /// Characters in logical order.
    pub text: String,
    pub rtl: bool,
}

/// Split `line` into runs, ordered left to right as they appear on the page.
pub fn visual_runs(line: &str, base_rtl: bool) -> Vec<Run> {
    let chars: Vec<char> = line.chars().collect();
    let classes: Vec<Class> = chars.iter().map(|&c| class(c)).collect();
    let base = if base_rtl { Class::Rtl } else { Class::Ltr };

    let mut resolved = classes.clone();
    let mut i = 0;
    while i < classes.len() {
        if classes[i] != Class::Neutral {
            i += 1;
            continue;
        }
        let start = i;
        while i < classes.len() && classes[i] == Class::Neutral {
            i += 1;
        }
        let before = classes[..start]
            .iter()
            .rev()
            .find(|c| **c != Class::Neutral)
            .copied()
            .unwrap_or(base);
        let after = classes[i..]
            .iter()
            .find(|c| **c != Class::Neutral)
            .copied()
            .unwrap_or(base);
        let dir = if before == after { before } else { base };
        resolved[start..i].fill(dir);
    }

    let mut runs: Vec<Run> = Vec::new();
    for (c, dir) in chars.into_iter().zip(resolved) {
        let rtl = dir == Class::Rtl;
        match runs.last_mut() {
            Some(run) if run.rtl == rtl => run.text.push(c),
            _ => runs.push(Run {
                text: c.to_string(),
                rtl,
            }),
        }
    }

    if base_rtl {
        runs.reverse();
    }
    runs
}

/// The line as a string in visual order, with RTL runs reversed and their
/// brackets mirrored. Used where glyphs are drawn one character at a time.
pub fn visual_order(line: &str, base_rtl: bool) -> String {
    visual_runs(line, base_rtl)
        .into_iter()
        .map(|run| {
            if run.rtl {
                run.text.chars().rev().map(mirror).collect()
            } else {
                run.text
            }
        })
        .collect()
}

fn mirror(c: char) -> char {
    match c {
        '(' => ')',
        ')' => '(',
        '[' => ']',
        ']' => '[',
        '{' => '}',
        '}' => '{',
        '<' => '>',
        '>' => '<',
        '«' => '»',
        '»' => '«',
        c => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pure_arabic_is_one_reversed_run() {
        let runs = visual_runs("بسم الله", true);
        assert_eq!(runs.len(), 1);
        assert!(runs[0].rtl);
        assert_eq!(visual_order("بسم", true), "مسب");
    }

    #[test]
    fn digits_keep_reading_order() {
        let runs = visual_runs("الآية 255", true);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "255");
        assert!(!runs[0].rtl);
        assert_eq!(runs[1].text, "الآية ");
    }

    #[test]
    fn latin_in_rtl_paragraph_moves_left() {
        let text = "مكتبة PDF عربية";
        let runs = visual_runs(text, true);
        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        // Spaces next to the Latin run take the paragraph direction.
        assert_eq!(texts, vec![" عربية", "PDF", "مكتبة "]);
        assert!(!runs[1].rtl);
    }

    #[test]
    fn ltr_base_keeps_run_order() {
        let runs = visual_runs("Hello مرحبا", false);
        assert_eq!(runs[0].text, "Hello ");
        assert!(runs[1].rtl);
    }

    #[test]
    fn brackets_mirror_in_rtl_runs() {
        assert_eq!(visual_order("(نص)", true), "(صن)");
    }
}
