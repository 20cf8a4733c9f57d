//! JSON-superset parsing for literals lifted out of inline `<script>` source.
//!
//! Strict JSON is tried first. If that fails, the text is rewritten into
//! strict JSON and parsed again: trailing commas dropped, single-quoted
//! strings re-quoted, bareword object keys quoted, comments removed,
//! JavaScript-only escapes and number forms (hex, `.5`, `5.`) rewritten and
//! `undefined`/`NaN`/`(-)Infinity` mapped to `null`.

use serde_json::Value;

pub fn parse(literal: &str) -> Result<Value, serde_json::Error> {
    match serde_json::from_str(literal) {
        Ok(v) => Ok(v),
        Err(_) => serde_json::from_str(&normalize(literal)),
    }
}

/// Rewrites a lenient literal into strict JSON text. Input that is not
/// valid in either dialect comes out still invalid, so the strict parser
/// reports it.
pub fn normalize(src: &str) -> String {
    let chars: Vec<char> = src.chars().collect();
    let mut out = String::with_capacity(src.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => i = copy_string(&chars, i, &mut out),
            '/' if matches!(chars.get(i + 1), Some('/') | Some('*')) => {
                i = skip_comment(&chars, i);
            }
            ',' => {
                if !matches!(next_significant(&chars, i + 1), Some('}') | Some(']')) {
                    out.push(',');
                }
                i += 1;
            }
            c if c.is_ascii_digit() => i = copy_number(&chars, i, &mut out),
            '.' if chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()) => {
                i = copy_number(&chars, i, &mut out);
            }
            c if is_ident_start(c) => {
                let start = i;
                while i < chars.len() && is_ident_part(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if next_significant(&chars, i) == Some(':') {
                    out.push('"');
                    out.push_str(&word);
                    out.push('"');
                } else {
                    match word.as_str() {
                        "NaN" | "Infinity" => {
                            // No JSON number for these; the sign goes too.
                            if out.ends_with(['-', '+']) {
                                out.pop();
                            }
                            out.push_str("null");
                        }
                        "undefined" => out.push_str("null"),
                        _ => out.push_str(&word),
                    }
                }
            }
            '+' if chars.get(i + 1).is_some_and(|d| d.is_ascii_digit() || *d == '.') => i += 1,
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Copies a single- or double-quoted string as a double-quoted JSON string.
fn copy_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    out.push('"');
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        if c == quote {
            out.push('"');
            return i + 1;
        }
        match c {
            '\\' => i = copy_escape(chars, i, out),
            '"' => {
                out.push_str("\\\"");
                i += 1;
            }
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
                i += 1;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    i
}

/// `chars[start]` is a backslash inside a string.
fn copy_escape(chars: &[char], start: usize, out: &mut String) -> usize {
    let Some(&next) = chars.get(start + 1) else {
        out.push('\\');
        return start + 1;
    };
    match next {
        // line continuation
        '\n' | '\u{2028}' | '\u{2029}' => start + 2,
        '\r' if chars.get(start + 2) == Some(&'\n') => start + 3,
        '\r' => start + 2,
        '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u' => {
            out.push('\\');
            out.push(next);
            start + 2
        }
        'v' => {
            out.push_str("\\u000b");
            start + 2
        }
        '0' if !chars.get(start + 2).is_some_and(|d| d.is_ascii_digit()) => {
            out.push_str("\\u0000");
            start + 2
        }
        'x' if chars.len() > start + 3
            && chars[start + 2].is_ascii_hexdigit()
            && chars[start + 3].is_ascii_hexdigit() =>
        {
            out.push_str("\\u00");
            out.push(chars[start + 2]);
            out.push(chars[start + 3]);
            start + 4
        }
        // any other escaped character stands for itself
        c => {
            match c {
                c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
                c => out.push(c),
            }
            start + 2
        }
    }
}

/// Decimal numbers get their missing leading or trailing zero, hex
/// numbers are converted to decimal.
fn copy_number(chars: &[char], start: usize, out: &mut String) -> usize {
    let mut i = start;
    if chars[i] == '0' && matches!(chars.get(i + 1), Some('x') | Some('X')) {
        let digits = i + 2;
        i = digits;
        while i < chars.len() && chars[i].is_ascii_hexdigit() {
            i += 1;
        }
        let hex: String = chars[digits..i].iter().collect();
        match u128::from_str_radix(&hex, 16) {
            Ok(n) => out.push_str(&n.to_string()),
            Err(_) => out.extend(&chars[start..i]),
        }
        return i;
    }

    let mut mantissa = String::new();
    while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
        mantissa.push(chars[i]);
        i += 1;
    }
    if mantissa.starts_with('.') {
        out.push('0');
    }
    out.push_str(&mantissa);
    if mantissa.ends_with('.') {
        out.push('0');
    }

    if matches!(chars.get(i), Some('e') | Some('E')) {
        let mut j = i + 1;
        if matches!(chars.get(j), Some('+') | Some('-')) {
            j += 1;
        }
        if chars.get(j).is_some_and(|d| d.is_ascii_digit()) {
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            out.extend(&chars[i..j]);
            i = j;
        }
    }
    i
}

fn skip_comment(chars: &[char], start: usize) -> usize {
    let mut i = start + 2;
    if chars[start + 1] == '/' {
        while i < chars.len() && chars[i] != '\n' {
            i += 1;
        }
        i
    } else {
        while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
            i += 1;
        }
        (i + 2).min(chars.len())
    }
}

fn next_significant(chars: &[char], mut i: usize) -> Option<char> {
    while i < chars.len() {
        match chars[i] {
            c if c.is_whitespace() => i += 1,
            '/' if matches!(chars.get(i + 1), Some('/') | Some('*')) => i = skip_comment(chars, i),
            c => return Some(c),
        }
    }
    None
}
