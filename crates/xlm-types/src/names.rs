//! Worksheet name sanitization and collision resolution.
//!
//! Worksheet names obey spreadsheet-application rules:
//! - Must be non-empty after trimming (falls back to [`DEFAULT_SHEET_NAME`])
//! - Must not contain `:`, `\`, `/`, `?`, `*`, `[` or `]` (each becomes `_`)
//! - Must be at most [`MAX_SHEET_NAME_LEN`] characters
//! - Must be unique within a workbook, compared case-insensitively
//!
//! Collisions are resolved by probing `_2`, `_3`, ... suffixes. The
//! unsuffixed name is the first variant, so there is never a `_1`.

use std::collections::HashSet;

use crate::error::{NameError, NameResult};

/// Maximum length of a worksheet name, in characters.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Label used when the desired name is empty or whitespace-only.
pub const DEFAULT_SHEET_NAME: &str = "Sheet";

/// Characters that are forbidden anywhere in a worksheet name.
pub const FORBIDDEN_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];

/// Default number of suffixed candidates probed before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10_000;

/// Make `desired` a legal worksheet name without regard to uniqueness.
///
/// # Examples
///
/// ```
/// use xlm_types::names::sanitize_sheet_name;
///
/// assert_eq!(sanitize_sheet_name("  Q1/Q2  "), "Q1_Q2");
/// assert_eq!(sanitize_sheet_name("   "), "Sheet");
/// ```
pub fn sanitize_sheet_name(desired: &str) -> String {
    let trimmed = desired.trim();
    let base = if trimmed.is_empty() {
        DEFAULT_SHEET_NAME
    } else {
        trimmed
    };
    let cleaned: String = base
        .chars()
        .map(|ch| if FORBIDDEN_CHARS.contains(&ch) { '_' } else { ch })
        .collect();
    truncate_chars(&cleaned, MAX_SHEET_NAME_LEN)
}

/// Resolve `desired` against `existing` with the default attempt limit.
pub fn resolve_sheet_name<I, S>(existing: I, desired: &str) -> NameResult<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    SheetNameResolver::default().resolve(existing, desired)
}

/// Produces worksheet names that are valid and unique within a workbook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SheetNameResolver {
    max_attempts: u32,
}

impl Default for SheetNameResolver {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl SheetNameResolver {
    /// Create a resolver that probes at most `max_attempts` suffixes.
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// The suffix attempt limit.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Return a sanitized name for `desired` that is not in `existing`.
    ///
    /// The result depends only on its inputs: resolving the same name against
    /// the same set twice yields the same answer.
    pub fn resolve<I, S>(&self, existing: I, desired: &str) -> NameResult<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let taken: HashSet<String> = existing
            .into_iter()
            .map(|name| fold_case(name.as_ref()))
            .collect();

        let base = sanitize_sheet_name(desired);
        if !taken.contains(&fold_case(&base)) {
            return Ok(base);
        }

        for n in 2..self.max_attempts.saturating_add(2) {
            let suffix = format!("_{n}");
            let room = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
            let candidate = format!("{}{suffix}", truncate_chars(&base, room));
            if !taken.contains(&fold_case(&candidate)) {
                return Ok(candidate);
            }
        }

        Err(NameError::NameSpaceExhausted {
            desired: desired.to_string(),
            attempts: self.max_attempts,
        })
    }
}

/// Whether two worksheet names would collide inside one workbook.
pub fn names_collide(a: &str, b: &str) -> bool {
    fold_case(a) == fold_case(b)
}

fn fold_case(name: &str) -> String {
    name.to_lowercase()
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn free_name_is_returned_unchanged() {
        let name = resolve_sheet_name(set(&["Sheet1"]), "Data").unwrap();
        assert_eq!(name, "Data");
    }

    #[test]
    fn first_collision_gets_suffix_two() {
        let name = resolve_sheet_name(set(&["Data"]), "Data").unwrap();
        assert_eq!(name, "Data_2");
    }

    #[test]
    fn probes_past_taken_suffixes() {
        let name = resolve_sheet_name(set(&["Data", "Data_2", "Data_3"]), "Data").unwrap();
        assert_eq!(name, "Data_4");
    }

    #[test]
    fn collision_is_case_insensitive() {
        let name = resolve_sheet_name(set(&["DATA"]), "data").unwrap();
        assert_eq!(name, "data_2");
    }

    #[test]
    fn exactly_max_length_is_kept() {
        let desired = "A".repeat(MAX_SHEET_NAME_LEN);
        let name = resolve_sheet_name(Vec::<String>::new(), &desired).unwrap();
        assert_eq!(name, desired);
    }

    #[test]
    fn exactly_max_length_collision_truncates_base_not_suffix() {
        let desired = "B".repeat(MAX_SHEET_NAME_LEN);
        let name = resolve_sheet_name(vec![desired.clone()], &desired).unwrap();
        assert_eq!(name, format!("{}_2", "B".repeat(29)));
        assert_eq!(name.chars().count(), MAX_SHEET_NAME_LEN);
    }

    #[test]
    fn long_name_collides_after_truncation() {
        let existing = "Quarterly revenue by region 20".to_string() + "2";
        assert_eq!(existing.chars().count(), 31);
        let desired = "Quarterly revenue by region 2024 (final)";
        let name = resolve_sheet_name(vec![existing.clone()], desired).unwrap();
        assert_ne!(name, existing);
        assert!(name.ends_with("_2"));
        assert!(name.chars().count() <= MAX_SHEET_NAME_LEN);
    }

    #[test]
    fn double_digit_suffix_shrinks_base_further() {
        let base = "C".repeat(MAX_SHEET_NAME_LEN);
        let mut existing = vec![base.clone()];
        for n in 2..10 {
            existing.push(format!("{}_{n}", "C".repeat(29)));
        }
        let name = resolve_sheet_name(existing, &base).unwrap();
        assert_eq!(name, format!("{}_10", "C".repeat(28)));
    }

    #[test]
    fn empty_name_falls_back_to_default() {
        assert_eq!(resolve_sheet_name(Vec::<String>::new(), "").unwrap(), "Sheet");
    }

    #[test]
    fn whitespace_only_name_falls_back_to_default() {
        assert_eq!(
            resolve_sheet_name(set(&["Sheet"]), " \t  ").unwrap(),
            "Sheet_2"
        );
    }

    #[test]
    fn every_forbidden_character_is_replaced() {
        let name = resolve_sheet_name(Vec::<String>::new(), ":\\/?*[]").unwrap();
        assert_eq!(name, "_______");
    }

    #[test]
    fn forbidden_characters_inside_text() {
        assert_eq!(sanitize_sheet_name("2024/03 [draft]"), "2024_03 _draft_");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let desired = "é".repeat(40);
        let name = sanitize_sheet_name(&desired);
        assert_eq!(name.chars().count(), MAX_SHEET_NAME_LEN);
    }

    #[test]
    fn exhaustion_is_reported() {
        let resolver = SheetNameResolver::with_max_attempts(3);
        let err = resolver
            .resolve(set(&["X", "X_2", "X_3", "X_4"]), "X")
            .unwrap_err();
        assert_eq!(
            err,
            NameError::NameSpaceExhausted {
                desired: "X".into(),
                attempts: 3
            }
        );
    }

    #[test]
    fn names_collide_ignores_case() {
        assert!(names_collide("Summary", "SUMMARY"));
        assert!(!names_collide("Summary", "Summary_2"));
    }

    fn plain_name() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_]{1,31}"
    }

    proptest! {
        #[test]
        fn prop_unchanged_without_collision(
            desired in plain_name(),
            others in proptest::collection::vec(plain_name(), 0..8),
        ) {
            prop_assume!(!others.iter().any(|o| names_collide(o, &desired)));
            let name = resolve_sheet_name(&others, &desired).unwrap();
            prop_assert_eq!(name, desired);
        }

        #[test]
        fn prop_collision_yields_fresh_suffixed_name(
            desired in "[A-Za-z0-9 :/?*]{0,45}",
            others in proptest::collection::vec(plain_name(), 0..8),
        ) {
            let mut existing = others;
            existing.push(sanitize_sheet_name(&desired));
            let name = resolve_sheet_name(&existing, &desired).unwrap();

            prop_assert!(!existing.iter().any(|e| names_collide(e, &name)));
            prop_assert!(name.chars().count() <= MAX_SHEET_NAME_LEN);
            let (_, suffix) = name.rsplit_once('_').unwrap();
            let n: u32 = suffix.parse().unwrap();
            prop_assert!(n >= 2);
        }

        #[test]
        fn prop_resolution_is_idempotent(
            desired in ".{0,40}",
            existing in proptest::collection::vec(".{0,35}", 0..8),
        ) {
            let first = resolve_sheet_name(&existing, &desired);
            let second = resolve_sheet_name(&existing, &desired);
            prop_assert_eq!(first, second);
        }
    }
}
