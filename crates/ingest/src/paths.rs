use chrono::NaiveDate;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

pub const DEFAULT_UPLOAD_PREFIX: &str = "my-runs";
pub const DEFAULT_FILENAME: &str = "run.gpx";
pub const HASH_PREFIX_LEN: usize = 12;

const TRACK_EXTENSION: &str = "gpx";
const FALLBACK_BASE: &str = "run";

fn is_safe_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-')
}

/// Folds a user-supplied filename into `[A-Za-z0-9_.-]` with a `.gpx` extension.
///
/// Diacritics are dropped after NFKD decomposition, whitespace and other
/// characters become `_`, repeated `_` collapse, and the base name never starts
/// or ends with `_`. Any other extension is replaced.
pub fn sanitize_filename(name: &str) -> String {
    let name = name.trim();
    let name = if name.is_empty() { DEFAULT_FILENAME } else { name };

    let mut folded = String::with_capacity(name.len());
    for ch in name.nfkd().filter(|ch| !is_combining_mark(*ch)) {
        let ch = if is_safe_char(ch) { ch } else { '_' };
        if ch == '_' && folded.ends_with('_') {
            continue;
        }
        folded.push(ch);
    }

    let (base, extension) = match folded.rfind('.') {
        Some(dot) if dot > 0 => (&folded[..dot], &folded[dot + 1..]),
        _ => (folded.as_str(), ""),
    };
    let base = base.trim_matches('_');
    let base = if base.is_empty() { FALLBACK_BASE } else { base };
    let extension = if extension.eq_ignore_ascii_case(TRACK_EXTENSION) {
        extension
    } else {
        TRACK_EXTENSION
    };
    format!("{base}.{extension}")
}

pub fn short_hash(content_hash: &str) -> &str {
    content_hash
        .get(..HASH_PREFIX_LEN)
        .unwrap_or(content_hash)
}

/// Storage key for uploaded bytes.
///
/// A non-blank explicit path is used verbatim. Otherwise the key is
/// `{prefix}/{YYYY-MM-DD}_{hash[..12]}_{sanitized filename}`.
pub fn derive_storage_key(
    explicit_path: Option<&str>,
    filename: Option<&str>,
    content_hash: &str,
    date: NaiveDate,
    prefix: &str,
) -> String {
    if let Some(path) = explicit_path.filter(|path| !path.trim().is_empty()) {
        return path.to_string();
    }
    let name = sanitize_filename(filename.unwrap_or(DEFAULT_FILENAME));
    format!(
        "{}/{}_{}_{}",
        prefix.trim_end_matches('/'),
        date.format("%Y-%m-%d"),
        short_hash(content_hash),
        name
    )
}
