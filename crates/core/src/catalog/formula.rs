//! Dependency formula parsing.
//!
//! Formulas arrive as text like `SUM(5,6,7,49)`. They are parsed exactly
//! once, when the catalog loads; evaluation never touches the text again.
//! The legacy Spanish spelling `SUMA(...)` is accepted for imported
//! catalogs.

use std::str::FromStr;

use tesoro_shared::types::ConceptId;

use super::concept::Dependency;
use super::error::FormulaError;

/// Parses a dependency formula into a typed descriptor.
///
/// # Errors
///
/// Returns [`FormulaError`] when the text is not a well-formed sum over at
/// least one concept ID.
pub fn parse_formula(input: &str) -> Result<Dependency, FormulaError> {
    let trimmed = input.trim();

    let open = trimmed
        .find('(')
        .ok_or_else(|| FormulaError::Malformed(input.to_string()))?;
    if !trimmed.ends_with(')') {
        return Err(FormulaError::Malformed(input.to_string()));
    }

    let name = trimmed[..open].trim();
    if !name.eq_ignore_ascii_case("SUM") && !name.eq_ignore_ascii_case("SUMA") {
        return Err(FormulaError::UnknownFunction(name.to_string()));
    }

    let args = &trimmed[open + 1..trimmed.len() - 1];
    if args.trim().is_empty() {
        return Err(FormulaError::EmptyArguments);
    }

    let ids = args
        .split(',')
        .map(|token| {
            ConceptId::from_str(token).map_err(|_| FormulaError::InvalidId(token.trim().to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Dependency::Sum(ids))
}
