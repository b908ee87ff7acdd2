use std::ops::Range;

use super::section::Section;

/// Raw-text scanning over a full save document.
///
/// A save can run to hundreds of megabytes and most queries only ever
/// need one named block, so these scans locate blocks by brace counting
/// instead of tokenizing the whole document. Quoted regions are opaque
/// to the scan: a `{` or `}` inside a string does not count, and a
/// `\"` does not close the string.
///
/// Every function here answers "not found" for any failure: a missing
/// key, a key not followed by `{`, braces that never balance. None of
/// them can fail in a way the caller has to handle beyond [None].

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_ident_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'.' || c == b'-'
}

/// Find the `}` matching the `{` at `open`, quote-aware.
/// Returns the byte index of the closing brace.
fn matching_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut in_string = false;
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        let c = bytes[i];
        if c == b'"' && (i == 0 || bytes[i - 1] != b'\\') {
            in_string = !in_string;
            i += 1;
            continue;
        }
        if in_string {
            i += 1;
            continue;
        }
        match c {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// From just past a key, skip whitespace and require `=`. Returns the
/// position just past the `=`.
fn equals_after_key(bytes: &[u8], key_end: usize) -> Option<usize> {
    let mut k = key_end;
    while k < bytes.len() && bytes[k].is_ascii_whitespace() {
        k += 1;
    }
    if k < bytes.len() && bytes[k] == b'=' {
        Some(k + 1)
    } else {
        None
    }
}

/// Skip whitespace from `from` and return the position of a following
/// `{`, if any.
fn brace_after(bytes: &[u8], from: usize) -> Option<usize> {
    let mut k = from;
    while k < bytes.len() && bytes[k].is_ascii_whitespace() {
        k += 1;
    }
    if k < bytes.len() && bytes[k] == b'{' {
        Some(k)
    } else {
        None
    }
}

/// From just past a key, skip whitespace, require `=`, skip whitespace
/// again and return the position of the following `{`, if any.
fn block_open_after_key(bytes: &[u8], key_end: usize) -> Option<usize> {
    brace_after(bytes, equals_after_key(bytes, key_end)?)
}

/// Locate the first top level occurrence of `key` followed by `=` and
/// return the byte range covering the `{...}` assigned to it. The key
/// is accepted at start of line or mid line, but not as part of a
/// longer identifier. The first `key =` occurrence decides: if it does
/// not assign a block, there is no block, later occurrences are never
/// consulted.
pub fn find_top_level_block(text: &str, key: &str) -> Option<Range<usize>> {
    let bytes = text.as_bytes();
    let mut from = 0;
    while let Some(rel) = text[from..].find(key) {
        let at = from + rel;
        from = at + 1;
        if at > 0 && is_ident_continue(bytes[at - 1]) {
            continue;
        }
        let after = at + key.len();
        if after < bytes.len() && is_ident_continue(bytes[after]) {
            continue;
        }
        if let Some(eq) = equals_after_key(bytes, after) {
            let open = brace_after(bytes, eq)?;
            let close = matching_close(bytes, open)?;
            return Some(open..close + 1);
        }
    }
    None
}

/// The shared scan behind [find_child_block] and [list_child_tags].
/// Walks the direct children of the container's block: every
/// identifier at depth 1 followed by `=` and `{` is a candidate tag.
/// `visit` is given the tag and its `{...}` body range and may stop the
/// scan by returning false.
fn scan_children<F>(text: &str, container_key: &str, mut visit: F)
where
    F: FnMut(&str, Range<usize>) -> bool,
{
    let range = match find_top_level_block(text, container_key) {
        Some(r) => r,
        None => return,
    };
    let bytes = text.as_bytes();
    let mut i = range.start + 1; // inside the container's own `{`
    let mut in_string = false;
    while i < range.end {
        let c = bytes[i];
        if c == b'"' && bytes[i - 1] != b'\\' {
            in_string = !in_string;
            i += 1;
            continue;
        }
        if in_string {
            i += 1;
            continue;
        }
        if c == b'}' {
            // the container's own closing brace
            return;
        }
        if is_ident_start(c) {
            let start = i;
            let mut j = i;
            while j < bytes.len() && is_ident_continue(bytes[j]) {
                j += 1;
            }
            if let Some(open) = block_open_after_key(bytes, j) {
                if let Some(close) = matching_close(bytes, open) {
                    let tag = &text[start..j];
                    if !visit(tag, open..close + 1) {
                        return;
                    }
                    // skip past this child's block, it is opaque to us
                    i = close + 1;
                    continue;
                } else {
                    return;
                }
            }
            i = j;
            continue;
        }
        if c == b'{' {
            // a bare anonymous child, skip it whole
            match matching_close(bytes, i) {
                Some(close) => {
                    i = close + 1;
                    continue;
                }
                None => return,
            }
        }
        i += 1;
    }
}

/// Locate one named child block inside a top level container and
/// return it as a [Section] ready for parsing. Children before the
/// match are skipped over their balanced braces, so a `}` inside a
/// sibling's quoted string cannot truncate the result.
pub fn find_child_block<'a>(text: &'a str, container_key: &str, child_tag: &str) -> Option<Section<'a>> {
    let mut found = None;
    scan_children(text, container_key, |tag, body| {
        if tag == child_tag {
            found = Some(Section::new(tag.to_owned(), &text[body]));
            false
        } else {
            true
        }
    });
    found
}

/// Collect every child tag of a top level container, sorted
/// lexicographically. An absent container yields an empty list.
pub fn list_child_tags(text: &str, container_key: &str) -> Vec<String> {
    let mut tags = Vec::new();
    scan_children(text, container_key, |tag, _| {
        tags.push(tag.to_owned());
        true
    });
    tags.sort();
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAVE: &str = "
        player=\"FRA\"
        countries={
            FRA={
                stability=0.55
            }
            GER={
                stability=0.60
            }
            ITA={
                stability=0.40
            }
        }
        division_templates={
        }
    ";

    #[test]
    fn test_find_top_level_block() {
        let range = find_top_level_block(SAVE, "countries").unwrap();
        assert!(SAVE[range.clone()].starts_with('{'));
        assert!(SAVE[range.clone()].ends_with('}'));
        assert!(SAVE[range].contains("GER"));
        let templates = find_top_level_block(SAVE, "division_templates").unwrap();
        assert!(SAVE[templates].contains('{'));
    }

    #[test]
    fn test_missing_key() {
        assert!(find_top_level_block(SAVE, "states").is_none());
    }

    #[test]
    fn test_key_not_a_suffix() {
        // `division_templates` must not match a lookup for `templates`
        assert!(find_top_level_block(SAVE, "templates").is_none());
    }

    #[test]
    fn test_key_without_block() {
        // `player` is followed by a string, not a block
        assert!(find_top_level_block(SAVE, "player").is_none());
    }

    #[test]
    fn test_first_key_occurrence_decides() {
        // the first `countries=` assigns a scalar, so there is no
        // countries block; the later one is never consulted
        let text = "countries=5 countries={ FRA={ } }";
        assert!(find_top_level_block(text, "countries").is_none());
        // an occurrence without `=` at all is not a decision point
        let text = "countries countries={ FRA={ } }";
        assert!(find_top_level_block(text, "countries").is_some());
    }

    #[test]
    fn test_unbalanced_braces() {
        assert!(find_top_level_block("countries={ FRA={ }", "countries").is_none());
    }

    #[test]
    fn test_find_child_block() {
        let section = find_child_block(SAVE, "countries", "GER").unwrap();
        assert_eq!(section.get_name(), "GER");
        let obj = section.parse();
        assert_eq!(obj.get_real("stability"), Some(0.60));
    }

    #[test]
    fn test_child_not_found() {
        assert!(find_child_block(SAVE, "countries", "USA").is_none());
    }

    #[test]
    fn test_quote_safe_extraction() {
        // the `}` inside the quoted string must not truncate the block
        let text = "countries={ TAG={ name=\"a } b\" } }";
        let section = find_child_block(text, "countries", "TAG").unwrap();
        let obj = section.parse();
        assert_eq!(*obj.get_string("name").unwrap(), "a } b".to_owned());
    }

    #[test]
    fn test_sibling_quotes_do_not_leak() {
        let text = "countries={ AAA={ name=\"x } y\" } BBB={ stability=1 } }";
        let section = find_child_block(text, "countries", "BBB").unwrap();
        let obj = section.parse();
        assert_eq!(obj.get_real("stability"), Some(1.0));
    }

    #[test]
    fn test_list_child_tags_sorted() {
        let tags = list_child_tags(SAVE, "countries");
        assert_eq!(tags, vec!["FRA", "GER", "ITA"]);
    }

    #[test]
    fn test_list_child_tags_missing_container() {
        assert!(list_child_tags(SAVE, "states").is_empty());
    }

    #[test]
    fn test_scalar_children_are_not_tags() {
        let text = "countries={ count=3 FRA={ } }";
        let tags = list_child_tags(text, "countries");
        assert_eq!(tags, vec!["FRA"]);
    }

    #[test]
    fn test_mid_line_key() {
        let text = "foo=1 countries={ FRA={ } }";
        assert!(find_top_level_block(text, "countries").is_some());
    }

    #[test]
    fn test_spaced_equals() {
        let text = "countries = { FRA = { } }";
        assert_eq!(list_child_tags(text, "countries"), vec!["FRA"]);
    }
}
