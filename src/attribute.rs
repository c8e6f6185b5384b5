//! Parser for the GFF attribute column.
//!
//! The column is a `;`-separated list of `key=value` pairs, e.g.
//! `ID=AT1G01010; c=4; t=11`. Whitespace around pairs, keys and values is
//! ignored. Segments without `=` are not pairs and are skipped.

/// Iterator over the `key=value` pairs of an attribute string.
#[derive(Debug, Clone)]
pub struct AttributePairs<'a> {
    segments: std::str::Split<'a, char>,
}

impl<'a> Iterator for AttributePairs<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        for segment in self.segments.by_ref() {
            if let Some((key, value)) = segment.split_once('=') {
                let key = key.trim();
                if !key.is_empty() {
                    return Some((key, value.trim()));
                }
            }
        }
        None
    }
}

/// Iterate over the pairs of an attribute string in order of appearance.
pub fn pairs(attribute: &str) -> AttributePairs<'_> {
    AttributePairs {
        segments: attribute.split(';'),
    }
}

/// Value of the first pair whose key equals `key`.
pub fn get<'a>(attribute: &'a str, key: &str) -> Option<&'a str> {
    pairs(attribute).find(|(k, _)| *k == key).map(|(_, v)| v)
}

/// Integer value of `key`, if present and numeric.
pub fn get_u64(attribute: &str, key: &str) -> Option<u64> {
    get(attribute, key).and_then(|v| v.parse().ok())
}

/// Locus identifier carried by `attribute`.
///
/// Uses the value of `tag` when present, otherwise the text before the first
/// `;`. Returns None when neither yields a usable identifier.
pub fn locus_id<'a>(attribute: &'a str, tag: &str) -> Option<&'a str> {
    if let Some(value) = get(attribute, tag) {
        let value = value.trim_matches('"');
        if !value.is_empty() {
            return Some(value);
        }
    }
    let head = attribute.split(';').next().unwrap_or("").trim();
    if head.is_empty() || head == "." {
        None
    } else {
        Some(head)
    }
}

/// Fold a child feature id onto its parent: `GENE1.2` becomes `GENE1`.
pub fn strip_suffix_id(id: &str) -> &str {
    match id.rsplit_once('.') {
        Some((parent, _)) if !parent.is_empty() => parent,
        _ => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs() {
        let got: Vec<_> = pairs("c=4; t=11;seq=acgt").collect();
        assert_eq!(got, vec![("c", "4"), ("t", "11"), ("seq", "acgt")]);
    }

    #[test]
    fn test_pairs_skip_bare_segments() {
        let got: Vec<_> = pairs("AT1G01010; ; Note=x=y;=z").collect();
        assert_eq!(got, vec![("Note", "x=y")]);
    }

    #[test]
    fn test_get() {
        assert_eq!(get("ID=g1; Parent=p1", "Parent"), Some("p1"));
        assert_eq!(get("ID=g1; Parent=p1", "Name"), None);
        assert_eq!(get_u64("c=4; t=eleven", "c"), Some(4));
        assert_eq!(get_u64("c=4; t=eleven", "t"), None);
    }

    #[test]
    fn test_locus_id_by_tag() {
        assert_eq!(locus_id("ID=AT1G01010;Name=ARV1", "ID"), Some("AT1G01010"));
        assert_eq!(locus_id("Parent=\"GENE1.1\"", "Parent"), Some("GENE1.1"));
    }

    #[test]
    fn test_locus_id_fallback() {
        assert_eq!(locus_id("AT1G01010; note=x", "ID"), Some("AT1G01010"));
        assert_eq!(locus_id("", "ID"), None);
        assert_eq!(locus_id(".", "ID"), None);
    }

    #[test]
    fn test_strip_suffix_id() {
        assert_eq!(strip_suffix_id("GENE1.1"), "GENE1");
        assert_eq!(strip_suffix_id("AT1G01010.1.2"), "AT1G01010.1");
        assert_eq!(strip_suffix_id("GENE1"), "GENE1");
        assert_eq!(strip_suffix_id(".1"), ".1");
    }
}
