//! Whitespace-only JSON re-indentation
//!
//! Produces the canonical two-space layout used for every item written to an
//! output file. Only insignificant whitespace changes: key order, number
//! spelling and string escapes are copied byte for byte. Empty objects and
//! arrays stay compact (`{}` / `[]`).

/// Indentation unit
pub const INDENT: &[u8] = b"  ";

/// Re-indent a single JSON value
///
/// The input is expected to be syntactically valid JSON (it comes out of the
/// list parser); structural problems that would corrupt the layout are still
/// reported instead of producing broken output.
pub fn reindent(src: &[u8]) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(src.len() + src.len() / 2);
    let mut depth: usize = 0;
    let mut need_indent = false;
    let mut in_string = false;
    let mut escaped = false;

    for &c in src {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == b'\\' {
                escaped = true;
            } else if c == b'"' {
                in_string = false;
            }
            continue;
        }

        if matches!(c, b' ' | b'\t' | b'\n' | b'\r') {
            continue;
        }

        // Delay the newline after an opening bracket until we know the
        // container is not empty.
        if need_indent && c != b']' && c != b'}' {
            need_indent = false;
            newline(&mut out, depth);
        }

        match c {
            b'"' => {
                in_string = true;
                out.push(c);
            }
            b'{' | b'[' => {
                out.push(c);
                depth += 1;
                need_indent = true;
            }
            b',' => {
                out.push(c);
                newline(&mut out, depth);
            }
            b':' => {
                out.extend_from_slice(b": ");
            }
            b'}' | b']' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| format!("unexpected '{}'", c as char))?;
                if need_indent {
                    need_indent = false;
                } else {
                    newline(&mut out, depth);
                }
                out.push(c);
            }
            _ => out.push(c),
        }
    }

    if in_string {
        return Err("unterminated string".to_string());
    }
    if depth != 0 {
        return Err("unbalanced brackets".to_string());
    }

    Ok(out)
}

fn newline(out: &mut Vec<u8>, depth: usize) {
    out.push(b'\n');
    for _ in 0..depth {
        out.extend_from_slice(INDENT);
    }
}
