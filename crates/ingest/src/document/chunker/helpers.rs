//! Splitting utilities used by the merge loop.

/// Length in characters (not bytes).
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split on `separator`, dropping empty pieces.
pub(crate) fn split_on_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    text.split(separator).filter(|p| !p.is_empty()).collect()
}

/// Break a piece longer than `max_chars` into pieces that fit, cutting at
/// the last whitespace inside the window when there is one and at a hard
/// character boundary otherwise. The whitespace at a cut is dropped.
pub(crate) fn split_oversized(piece: &str, max_chars: usize) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = piece;

    while char_len(rest) > max_chars {
        // Byte offset just past the first `max_chars` characters.
        let cut = rest
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let window = &rest[..cut];

        let split_at = if rest[cut..].starts_with(char::is_whitespace) {
            Some(cut)
        } else {
            window.rfind(char::is_whitespace).filter(|&i| i > 0)
        };

        match split_at {
            Some(i) => {
                let head = &rest[..i];
                if !head.trim().is_empty() {
                    out.push(head);
                }
                let ws_len = rest[i..].chars().next().map(char::len_utf8).unwrap_or(0);
                rest = &rest[i + ws_len..];
            }
            None => {
                out.push(window);
                rest = &rest[cut..];
            }
        }
    }

    if !rest.is_empty() {
        out.push(rest);
    }
    out
}
