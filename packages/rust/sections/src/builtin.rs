//! Section sets bundled with the crate, addressable by name.

use termgroup_shared::{Result, SectionList, TermGroupError};

use crate::literal::decode_literal;

/// `(name, literal JSON)` for every bundled section set.
const BUILTINS: &[(&str, &str)] = &[("generic_bp", include_str!("../data/generic_bp.json"))];

/// Names of the bundled section sets.
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|(name, _)| *name)
}

/// Load a bundled section set by name.
pub fn builtin_sections(name: &str) -> Result<SectionList> {
    let (_, content) = BUILTINS
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .ok_or_else(|| {
            let known = builtin_names().collect::<Vec<_>>().join(", ");
            TermGroupError::configuration(format!(
                "unknown builtin sections {name:?} (available: {known})"
            ))
        })?;
    decode_literal(content, &format!("builtin:{name}"))
}
