//! Allocation-free GFF line splitting.
//!
//! These helpers work on borrowed lines and never allocate; the owned
//! [`GffRecord`](crate::gff::GffRecord) is built from the returned slices.

use memchr::memchr_iter;

/// Number of tab-separated columns in a GFF line.
pub const GFF_FIELDS: usize = 9;

/// Fast u64 parsing - no allocation, no error formatting.
///
/// Returns None if the input is empty or contains non-digit characters.
#[inline(always)]
pub fn parse_u64_fast(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.checked_mul(10)?.checked_add(d as u64)?;
    }
    Some(n)
}

/// Split a line into exactly nine tab-separated fields.
///
/// Returns None when the line has fewer or more than nine columns.
#[inline]
pub fn split_gff_fields(line: &str) -> Option<[&str; GFF_FIELDS]> {
    let mut fields = [""; GFF_FIELDS];
    let mut begin = 0;
    let mut idx = 0;
    for tab in memchr_iter(b'\t', line.as_bytes()) {
        if idx == GFF_FIELDS - 1 {
            return None;
        }
        fields[idx] = &line[begin..tab];
        begin = tab + 1;
        idx += 1;
    }
    if idx != GFF_FIELDS - 1 {
        return None;
    }
    fields[idx] = &line[begin..];
    Some(fields)
}

/// Comment lines start with `#`.
#[inline(always)]
pub fn is_comment(line: &str) -> bool {
    line.as_bytes().first() == Some(&b'#')
}

/// Strip a trailing `\n` or `\r\n`.
#[inline(always)]
pub fn trim_line_end(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
