//! Properties File Parser
//!
//! Line-oriented `key=value` syntax:
//! - `#` and `!` start comment lines
//! - an odd number of trailing backslashes continues the logical line, and the
//!   leading whitespace of the continuation is dropped
//! - the key ends at the first unescaped `=`, `:` or whitespace
//! - `\t`, `\n`, `\r`, `\f` and `\uXXXX` escapes are decoded, any other
//!   escaped character stands for itself
//! - a later duplicate key overrides an earlier one

use super::Properties;
use crate::error::ParseError;
use std::path::Path;
use tracing::debug;

type ParseResult<T> = std::result::Result<T, ParseError>;

/// Parse properties text into a key/value map
pub fn parse_properties(content: &str) -> ParseResult<Properties> {
    let mut properties = Properties::new();
    let mut lines = natural_lines(content).enumerate();

    while let Some((index, raw)) = lines.next() {
        let line = strip_leading_whitespace(raw);
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let line_number = index + 1;
        let mut logical = String::with_capacity(line.len());
        let mut current = line;
        loop {
            if ends_with_continuation(current) {
                logical.push_str(&current[..current.len() - 1]);
                match lines.next() {
                    Some((_, next)) => current = strip_leading_whitespace(next),
                    None => break,
                }
            } else {
                logical.push_str(current);
                break;
            }
        }

        let (key, value) = split_key_value(&logical, line_number)?;
        properties.insert(key, value);
    }

    debug!("Parsed {} properties", properties.len());
    Ok(properties)
}

/// Read and parse a properties file
pub fn parse_file(path: &Path) -> ParseResult<Properties> {
    let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_properties(&content)
}

/// Split on `\n`, `\r\n` and lone `\r`
fn natural_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .split('\n')
        .flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0c')
}

fn strip_leading_whitespace(line: &str) -> &str {
    line.trim_start_matches(is_whitespace)
}

fn ends_with_continuation(line: &str) -> bool {
    let backslashes = line.chars().rev().take_while(|&c| c == '\\').count();
    backslashes % 2 == 1
}

fn split_key_value(logical: &str, line: usize) -> ParseResult<(String, String)> {
    let chars: Vec<char> = logical.chars().collect();
    let len = chars.len();
    let mut key_end = len;
    let mut value_start = len;
    let mut has_separator = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if !escaped && (c == '=' || c == ':') {
            key_end = i;
            value_start = i + 1;
            has_separator = true;
            break;
        }
        if !escaped && is_whitespace(c) {
            key_end = i;
            value_start = i + 1;
            break;
        }
        escaped = c == '\\' && !escaped;
    }

    while value_start < len {
        let c = chars[value_start];
        if !is_whitespace(c) {
            if !has_separator && (c == '=' || c == ':') {
                has_separator = true;
            } else {
                break;
            }
        }
        value_start += 1;
    }

    let key = unescape(&chars[..key_end], line)?;
    let value = unescape(&chars[value_start..], line)?;
    Ok((key, value))
}

fn unescape(chars: &[char], line: usize) -> ParseResult<String> {
    let mut out = String::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        i += 1;
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(&escaped) = chars.get(i) else {
            break;
        };
        i += 1;
        match escaped {
            't' => out.push('\t'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            'f' => out.push('\x0c'),
            'u' => {
                let unit = hex_unit(chars, i, line)?;
                i += 4;
                let low_follows = chars.get(i) == Some(&'\\') && chars.get(i + 1) == Some(&'u');
                if (0xD800..0xDC00).contains(&unit) && low_follows {
                    let low = hex_unit(chars, i + 2, line)?;
                    if (0xDC00..0xE000).contains(&low) {
                        i += 6;
                        let combined = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                        out.push(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER));
                        continue;
                    }
                }
                out.push(char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

fn hex_unit(chars: &[char], start: usize, line: usize) -> ParseResult<u32> {
    let digits = chars
        .get(start..start + 4)
        .ok_or(ParseError::MalformedEscape { line })?;
    digits.iter().try_fold(0u32, |acc, c| {
        c.to_digit(16)
            .map(|d| (acc << 4) | d)
            .ok_or(ParseError::MalformedEscape { line })
    })
}
