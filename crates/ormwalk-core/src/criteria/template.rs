//! `{name}` placeholder substitution for opaque SQL fragments.

use crate::error::{Error, Result};

/// Replace every `{name}` in `template` with `resolve(name)`.
///
/// `{{` and `}}` are literal braces. An unresolvable name fails with
/// [`Error::UnknownAlias`].
pub(crate) fn render<F>(template: &str, resolve: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                out.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let rest = &template[start + 1..];
                let end = rest
                    .find('}')
                    .ok_or_else(|| Error::UnknownAlias(rest.to_string()))?;
                let name = &rest[..end];
                let value = resolve(name).ok_or_else(|| Error::UnknownAlias(name.to_string()))?;
                out.push_str(&value);
                // skip the name and the closing brace
                for _ in 0..name.chars().count() + 1 {
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}
