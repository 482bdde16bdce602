//! Target filename derivation.
//!
//! Local files are named `NN) Title - ID.ext`. The id token is always
//! embedded, so two distinct items can never produce the same filename no
//! matter what sanitization does to their titles.

use crate::item::ItemId;

/// Characters that are illegal in filenames on at least one supported platform.
const ILLEGAL: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replace illegal filename characters with `-` and trim trailing
/// dots/spaces (which Windows strips silently on create).
pub fn sanitize_title(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| if ILLEGAL.contains(&c) { '-' } else { c })
        .collect();
    replaced.trim_end_matches([' ', '.']).to_string()
}

/// The canonical on-disk name for an item at a given collection position.
pub fn target_file_name(position: u32, title: &str, id: &ItemId, extension: &str) -> String {
    format!(
        "{:02}) {} - {}.{}",
        position,
        sanitize_title(title),
        id,
        extension
    )
}

/// Parse the leading `NN) ` ordinal of a file stem, if present.
pub fn parse_position_hint(stem: &str) -> Option<u32> {
    let (digits, _) = stem.split_once(')')?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
