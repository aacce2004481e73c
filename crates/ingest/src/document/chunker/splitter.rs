use std::collections::VecDeque;

use super::helpers::{char_len, split_on_separator, split_oversized};
use super::types::{Chunk, ChunkConfig};

/// Split `text` into ordered chunks of at most `chunk_size` characters.
///
/// Empty or whitespace-only input produces no chunks. Callers are expected
/// to have validated `config`; an overlap that is not smaller than the chunk
/// size degrades to "no overlap" rather than looping.
pub fn split_text(text: &str, config: &ChunkConfig) -> Vec<Chunk> {
    let size = config.chunk_size.max(1);
    let overlap = config.chunk_overlap.min(size - 1);
    let sep = config.separator.as_str();
    let sep_len = char_len(sep);

    let pieces: Vec<&str> = split_on_separator(text, sep)
        .into_iter()
        .flat_map(|p| split_oversized(p, size))
        .collect();

    let mut contents: Vec<String> = Vec::new();
    let mut current: VecDeque<&str> = VecDeque::new();
    // Character length of `current` joined by the separator.
    let mut total = 0usize;

    for piece in pieces {
        let len = char_len(piece);
        let joiner = if current.is_empty() { 0 } else { sep_len };

        if total + joiner + len > size && !current.is_empty() {
            push_joined(&mut contents, &current, sep);

            // Keep a tail no longer than the overlap that still leaves room
            // for the incoming piece.
            while total > overlap
                || (total > 0 && total + sep_len + len > size)
            {
                let Some(first) = current.pop_front() else {
                    break;
                };
                total -= char_len(first);
                if !current.is_empty() {
                    total -= sep_len;
                }
            }
        }

        let joiner = if current.is_empty() { 0 } else { sep_len };
        current.push_back(piece);
        total += joiner + len;
    }

    if !current.is_empty() {
        push_joined(&mut contents, &current, sep);
    }

    contents
        .into_iter()
        .enumerate()
        .map(|(index, content)| Chunk { index, content })
        .collect()
}

fn push_joined(out: &mut Vec<String>, pieces: &VecDeque<&str>, sep: &str) {
    let joined = pieces.iter().copied().collect::<Vec<_>>().join(sep);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}
