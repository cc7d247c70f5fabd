use regex::Regex;

/// Collapse runs of whitespace to single spaces and trim the ends.
pub fn normalize(text: &str) -> String {
    let whitespace = Regex::new(r"\s+").unwrap();
    whitespace.replace_all(text, " ").trim().to_string()
}

/// Split text into sentence-aware chunks for synthesis.
///
/// The normalized text is cut on sentence-ending punctuation and sentences
/// are packed greedily into chunks of at most `max_chars` characters. A
/// single sentence longer than `max_chars` becomes its own oversized chunk
/// rather than being truncated.
///
/// Every chunk after the first is prefixed with the trailing
/// `overlap_chars` characters of the previous chunk's body. The overlap is
/// context for the synthesizer's prosody only; the assembler never strips
/// it back out of the audio. Concatenating the chunk bodies (overlap
/// prefixes excluded) reproduces the normalized input exactly.
pub fn split(text: &str, max_chars: usize, overlap_chars: usize) -> Vec<String> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return Vec::new();
    }
    if normalized.chars().count() <= max_chars {
        return vec![normalized];
    }

    let bodies = pack_sentences(&normalized, max_chars);

    let mut chunks = Vec::with_capacity(bodies.len());
    for (i, body) in bodies.iter().enumerate() {
        if i == 0 || overlap_chars == 0 {
            chunks.push(body.clone());
        } else {
            let prefix = tail_chars(&bodies[i - 1], overlap_chars);
            chunks.push(format!("{}{}", prefix, body));
        }
    }
    chunks
}

/// Greedily pack sentences into bodies of at most `max_chars` characters.
/// Bodies are contiguous slices of the input, so their concatenation is the
/// input itself.
fn pack_sentences(text: &str, max_chars: usize) -> Vec<String> {
    let sentence_end = Regex::new(r"[.!?]+\s+").unwrap();

    let mut bodies: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;
    let mut last_end = 0usize;

    let mut push_sentence = |sentence: &str,
                             bodies: &mut Vec<String>,
                             current: &mut String,
                             current_chars: &mut usize| {
        let sentence_chars = sentence.chars().count();
        if !current.is_empty() && *current_chars + sentence_chars > max_chars {
            bodies.push(std::mem::take(current));
            *current_chars = 0;
        }
        current.push_str(sentence);
        *current_chars += sentence_chars;
    };

    for mat in sentence_end.find_iter(text) {
        let sentence = &text[last_end..mat.end()];
        push_sentence(sentence, &mut bodies, &mut current, &mut current_chars);
        last_end = mat.end();
    }

    if last_end < text.len() {
        push_sentence(
            &text[last_end..],
            &mut bodies,
            &mut current,
            &mut current_chars,
        );
    }

    if !current.is_empty() {
        bodies.push(current);
    }

    bodies
}

/// The trailing `n` characters of `s`, respecting char boundaries.
fn tail_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    let total = s.chars().count();
    if total <= n {
        return s;
    }
    let (idx, _) = s.char_indices().nth(total - n).unwrap();
    &s[idx..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = split("Hello world. How are you?", 1000, 100);
        assert_eq!(chunks, vec!["Hello world. How are you?".to_string()]);
    }

    #[test]
    fn test_normalizes_whitespace() {
        let chunks = split("Hello\n\n  world.   Fine. ", 1000, 100);
        assert_eq!(chunks, vec!["Hello world. Fine.".to_string()]);
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(split("   \n ", 1000, 100).is_empty());
    }

    #[test]
    fn test_chunks_respect_max_chars() {
        let text = "This is a sentence. ".repeat(50);
        let chunks = split(&text, 100, 0);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100, "chunk too long: {}", chunk);
        }
    }

    #[test]
    fn test_bodies_reconstruct_normalized_input() {
        let text = "One sentence here. Another one follows! A third? ".repeat(30);
        let normalized = normalize(&text);
        let overlap = 20;
        let chunks = split(&text, 120, overlap);
        assert!(chunks.len() > 1);

        // Strip the overlap prefix from every chunk after the first. The
        // prefix is the tail of the previous chunk's body, so bodies are
        // recovered front to back.
        let mut bodies: Vec<String> = vec![chunks[0].clone()];
        for chunk in &chunks[1..] {
            let prev = bodies.last().unwrap();
            let prefix = tail_chars(prev, overlap);
            assert!(chunk.starts_with(prefix));
            bodies.push(chunk[prefix.len()..].to_string());
        }

        assert_eq!(bodies.concat(), normalized);
    }

    #[test]
    fn test_overlap_prefix_present() {
        let text = "Alpha beta gamma delta. ".repeat(20);
        let chunks = split(&text, 60, 10);
        assert!(chunks.len() > 1);
        // Second chunk starts with the tail of the first body.
        let prefix = tail_chars(&chunks[0], 10);
        assert!(chunks[1].starts_with(prefix));
    }

    #[test]
    fn test_oversized_sentence_is_not_truncated() {
        let long_sentence = format!("{}.", "word ".repeat(50).trim());
        let text = format!("Short one. {} Tail.", long_sentence);
        let chunks = split(&text, 40, 0);
        assert!(chunks.iter().any(|c| c.chars().count() > 40));
        assert!(chunks.iter().any(|c| c.contains("word word")));
    }

    #[test]
    fn test_no_overlap_when_single_chunk() {
        let chunks = split("Just one small chunk.", 1000, 500);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "Just one small chunk.");
    }
}
