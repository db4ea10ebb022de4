//! Environment variable expansion for datasource strings.
//!
//! Supports `$VAR` and `${VAR}`. Unset variables expand to an empty string
//! and `$$` produces a literal `$`. A `$` not followed by a name or brace is
//! kept as-is, so passwords containing a lone `$` survive.

use std::borrow::Cow;

/// Expand environment variable references using the process environment.
pub fn expand_env(text: &str) -> Cow<'_, str> {
    expand_with(text, |name| std::env::var(name).ok())
}

/// Expand variable references using `lookup` to resolve names.
pub fn expand_with<F>(text: &str, lookup: F) -> Cow<'_, str>
where
    F: Fn(&str) -> Option<String>,
{
    if !text.contains('$') {
        return Cow::Borrowed(text);
    }

    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        match chars.peek() {
            Some('$') => {
                chars.next();
                result.push('$');
            }
            Some('{') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for ch in chars.by_ref() {
                    if ch == '}' {
                        closed = true;
                        break;
                    }
                    name.push(ch);
                }
                if closed {
                    result.push_str(&lookup(&name).unwrap_or_default());
                } else {
                    // Unterminated reference stays literal
                    result.push_str("${");
                    result.push_str(&name);
                }
            }
            Some(&next) if next == '_' || next.is_ascii_alphabetic() => {
                let mut name = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch == '_' || ch.is_ascii_alphanumeric() {
                        name.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                result.push_str(&lookup(&name).unwrap_or_default());
            }
            _ => result.push('$'),
        }
    }

    Cow::Owned(result)
}
