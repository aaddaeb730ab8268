/// Site term label rewrites, applied in order.
const TERM_REWRITES: [(&str, &str); 4] = [
    ("20", ""),
    ("Fall ", "FA"),
    ("Winter ", "WI"),
    ("Spring ", "SP"),
];

/// Maps a term label such as `"Fall 2024"` to its short code (`"FA24"`).
///
/// Labels in any other shape pass through with only surrounding whitespace
/// removed.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let mut term = raw.trim().to_owned();
    for (from, to) in TERM_REWRITES {
        term = term.replace(from, to);
    }
    term
}
