//! Workbook-scoped name registries.
//!
//! Sheet names in `.xlsx` files are capped at 31 characters and must be unique
//! regardless of case. [`SheetNameRegistry`] hands out names that respect both
//! rules for the lifetime of one export run. [`TableNameRegistry`] does the
//! same for table (ListObject) names, which share a single workbook-wide
//! namespace.

use std::collections::HashSet;

/// Maximum number of characters allowed in a sheet name.
pub const MAX_SHEET_NAME_LEN: usize = 31;
/// Number of characters kept from a colliding name before the `_N` suffix.
pub const COLLISION_PREFIX_LEN: usize = 27;

/// Characters that may not appear in a sheet name.
const INVALID_SHEET_CHARS: [char; 8] = [':', '\\', '/', '?', '*', '[', ']', '\''];

/// Registry of sheet names already committed in the current workbook.
///
/// Lookups are case-insensitive; the assigned names keep the caller's casing.
#[derive(Debug, Default)]
pub struct SheetNameRegistry {
    used: HashSet<String>,
}

impl SheetNameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves a fixed name such as `Index` so that later assignments avoid it.
    pub fn claim(&mut self, name: &str) {
        self.used.insert(fold(name));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(&fold(name))
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.used.len()
    }

    /// Derives a unique name for `candidate` without registering it.
    ///
    /// The candidate is truncated to 31 characters. On collision the first 27
    /// characters are kept and `_1`, `_2`, ... appended until the result is
    /// free. Once the counter needs more than three digits the prefix shrinks
    /// so the result never exceeds 31 characters.
    pub fn derive(&self, candidate: &str) -> String {
        let base = truncate_chars(candidate, MAX_SHEET_NAME_LEN);
        if !self.contains(&base) {
            return base;
        }

        let mut counter: u64 = 1;
        loop {
            let suffix = format!("_{counter}");
            let prefix_len = COLLISION_PREFIX_LEN.min(MAX_SHEET_NAME_LEN - suffix.len());
            let candidate_name = format!("{}{suffix}", truncate_chars(&base, prefix_len));
            if !self.contains(&candidate_name) {
                return candidate_name;
            }
            counter += 1;
        }
    }

    /// Derives a unique name for `candidate` and registers it.
    pub fn assign(&mut self, candidate: &str) -> String {
        let name = self.derive(candidate);
        self.claim(&name);
        name
    }
}

/// Registry of workbook-wide table names.
#[derive(Debug, Default)]
pub struct TableNameRegistry {
    used: HashSet<String>,
}

impl TableNameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sanitises `raw` into a table identifier and appends `_1`, `_2`, ...
    /// until it is unused.
    pub fn assign(&mut self, raw: &str) -> String {
        let base = sanitize_table_name(raw);
        let mut candidate = base.clone();
        let mut counter = 1;
        while self.used.contains(&fold(&candidate)) {
            candidate = format!("{base}_{counter}");
            counter += 1;
        }
        self.used.insert(fold(&candidate));
        candidate
    }
}

/// Normalises a dataset name into a sheet title: upper-cased, forbidden
/// characters replaced with `_`, trimmed. Never returns an empty string.
pub fn sheet_title(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|ch| {
            if INVALID_SHEET_CHARS.contains(&ch) || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect();

    let cleaned = cleaned.trim().to_uppercase();
    if cleaned.is_empty() {
        "DATASET".to_string()
    } else {
        cleaned
    }
}

/// Produces a name Excel accepts for a table: letters, digits, `_` and `.`,
/// starting with a letter or underscore.
pub fn sanitize_table_name(raw: &str) -> String {
    let mut sanitized: String = raw
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' {
                ch
            } else {
                '_'
            }
        })
        .collect();

    match sanitized.chars().next() {
        None => sanitized = "Table".to_string(),
        Some(first) if !(first.is_ascii_alphabetic() || first == '_') => {
            sanitized.insert(0, '_');
        }
        Some(_) => {}
    }

    sanitized
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

fn fold(name: &str) -> String {
    name.to_uppercase()
}
