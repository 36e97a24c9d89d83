//! Identifier rules for script names.

/// True if `s` can name a script: non-empty, starts with an XID_Start
/// character or `_`, continues with XID_Continue characters (Unicode
/// identifier rules, so combining marks and connector punctuation count).
pub fn is_valid_script_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if is_identifier_start(first) => chars.all(is_identifier_part),
        _ => false,
    }
}

fn is_identifier_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

fn is_identifier_part(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}

/// Spaces become `_`; everything from the first `.` on is dropped.
pub fn normalize_candidate(candidate: &str) -> String {
    let replaced = candidate.replace(' ', "_");
    match replaced.split_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => replaced,
    }
}

/// Normalized candidate, if it is a valid script name.
pub fn accept_candidate(candidate: Option<&str>) -> Option<String> {
    let candidate = candidate.filter(|c| !c.is_empty())?;
    let name = normalize_candidate(candidate);
    if is_valid_script_name(&name) {
        Some(name)
    } else {
        None
    }
}
