//! Filename parsing helpers shared by the planner.
//!
//! Extension rules follow the usual "last dot" convention:
//! - `photo.final.JPG` → stem `photo.final`, extension `.JPG`
//! - `.env` → stem `.env`, no extension (a leading dot alone is not one)
//! - `notes.` → stem `notes.`, no extension
//! - `..x` → stem `.`, extension `.x`

/// Split a filename into `(stem, extension)`. The extension keeps its dot.
pub fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) if dot > 0 && dot < name.len() - 1 => name.split_at(dot),
        _ => (name, ""),
    }
}

/// Whether a stem starts with an ASCII digit run (`001-beach`, `2024_trip`).
pub fn has_leading_digits(stem: &str) -> bool {
    stem.as_bytes().first().is_some_and(u8::is_ascii_digit)
}

/// Left-pad a counter with zeros to at least `width` digits.
pub fn zero_pad(value: u64, width: usize) -> String {
    format!("{value:0width$}")
}

/// Whether `name` addresses an entry directly inside a folder.
///
/// Rules are user input, so a generated name may hold a separator or be
/// `..`; joined onto the folder that would move the file elsewhere.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(SEPARATORS)
}

const SEPARATORS: [char; 3] = ['/', '\\', '\0'];

/// Replace path separators (and NUL) with `_`.
pub fn strip_separators(name: &str) -> String {
    name.replace(SEPARATORS, "_")
}

/// Ensure a configured extension starts with a dot. Empty stays empty.
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim();
    if ext.is_empty() || ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}
