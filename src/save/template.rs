//! Filename template expansion.
//!
//! | Placeholder | Expands to                              |
//! |-------------|-----------------------------------------|
//! | `%Y`        | year, 4 digits                          |
//! | `%y`        | year, 2 digits                          |
//! | `%M`        | month                                   |
//! | `%D`        | day                                     |
//! | `%H`        | hour                                    |
//! | `%m`        | minute                                  |
//! | `%S`        | second                                  |
//! | `%T`        | window title (empty when unknown)       |
//! | `%d`        | sequence number                         |
//! | `%Nd`       | sequence number padded to N digits      |
//!
//! Unknown placeholders are kept verbatim.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Used when a template expands to nothing.
const FALLBACK_NAME: &str = "Screenshot";

/// Upper bound on sequence numbers probed before giving up on uniqueness.
const MAX_SEQUENCE: u32 = 100_000;

/// Values substituted into a template.
#[derive(Debug, Clone)]
pub struct TemplateContext<'a> {
    pub time: DateTime<Local>,
    pub window_title: Option<&'a str>,
}

/// Expands `template` for sequence number `sequence`.
pub fn expand_template(template: &str, ctx: &TemplateContext<'_>, sequence: u32) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut width = String::new();
        while let Some(digit) = chars.peek().copied().filter(char::is_ascii_digit) {
            width.push(digit);
            chars.next();
        }

        match (width.is_empty(), chars.peek().copied()) {
            (_, Some('d')) => {
                chars.next();
                let width = width.parse::<usize>().unwrap_or(0);
                out.push_str(&format!("{:0width$}", sequence, width = width));
            }
            (true, Some(spec)) if "YyMDHmST".contains(spec) => {
                chars.next();
                out.push_str(&expand_field(spec, ctx));
            }
            _ => {
                out.push('%');
                out.push_str(&width);
            }
        }
    }
    out
}

fn expand_field(spec: char, ctx: &TemplateContext<'_>) -> String {
    match spec {
        'Y' => ctx.time.format("%Y").to_string(),
        'y' => ctx.time.format("%y").to_string(),
        'M' => ctx.time.format("%m").to_string(),
        'D' => ctx.time.format("%d").to_string(),
        'H' => ctx.time.format("%H").to_string(),
        'm' => ctx.time.format("%M").to_string(),
        'S' => ctx.time.format("%S").to_string(),
        'T' => ctx
            .window_title
            .map(|title| title.replace(['/', '\\'], "_").trim().to_string())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Whether `template` contains `%d` or `%Nd`.
pub fn has_sequence(template: &str) -> bool {
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            while chars.peek().is_some_and(char::is_ascii_digit) {
                chars.next();
            }
            if chars.peek() == Some(&'d') {
                return true;
            }
        }
    }
    false
}

/// Strips a trailing `.format` from a template, case-insensitively.
fn strip_extension<'t>(template: &'t str, format: &str) -> &'t str {
    let suffix_len = format.len() + 1;
    if template.len() > suffix_len {
        let split = template.len() - suffix_len;
        if template.is_char_boundary(split) {
            let (stem, suffix) = template.split_at(split);
            if suffix.eq_ignore_ascii_case(&format!(".{format}")) {
                return stem;
            }
        }
    }
    template
}

/// Picks the first path under `directory` for `template` that `exists`
/// reports as free.
///
/// Templates with a sequence placeholder are expanded with 1, 2, ... until
/// free. Others get `-1`, `-2`, ... appended on collision.
pub fn unique_path(
    directory: &Path,
    template: &str,
    format: &str,
    ctx: &TemplateContext<'_>,
    exists: impl Fn(&Path) -> bool,
) -> PathBuf {
    let template = strip_extension(template, format);
    let build = |stem: String| {
        let stem = stem.trim_start_matches('/');
        let stem = if stem.is_empty() { FALLBACK_NAME } else { stem };
        directory.join(format!("{stem}.{format}"))
    };

    if has_sequence(template) {
        for sequence in 1..=MAX_SEQUENCE {
            let candidate = build(expand_template(template, ctx, sequence));
            if !exists(&candidate) {
                return candidate;
            }
        }
        log::warn!("No free sequence number for template '{}'", template);
        return build(expand_template(template, ctx, MAX_SEQUENCE));
    }

    let base = expand_template(template, ctx, 0);
    let candidate = build(base.clone());
    if !exists(&candidate) {
        return candidate;
    }
    (1..=MAX_SEQUENCE)
        .map(|n| build(format!("{base}-{n}")))
        .find(|candidate| !exists(candidate))
        .unwrap_or(candidate)
}
