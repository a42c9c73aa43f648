//! core::variants::naming
//!
//! Canonical variant names and parsing.
//!
//! # Design
//!
//! Every key serializes to a canonical display name: `Axis=Label` pairs in
//! declared axis order, joined by `, ` (e.g.
//! `Style=Outlined, Weight=400, Fill=Off, Grade=0, Size=24px`). Parsing is
//! the exact inverse for every valid name and returns `None` for anything
//! else - the target tree is not fully trusted between runs, so a child
//! whose name does not parse is treated as orphaned, never as a panic.
//!
//! # Parse strategies
//!
//! Parsing tries an explicit, ordered list of named strategies; the
//! fallback order is data, not control flow. The display-name form is tried
//! first, then the comparison-key form (`axis=token;...`), which older tree
//! content may carry.

use super::space::{VariantKey, VariantSpace};

/// A named parse strategy. Returns `Some` only when the input matches this
/// strategy's form exactly and covers every axis of the space.
#[derive(Clone, Copy)]
pub struct ParseStrategy {
    /// Strategy name, for diagnostics.
    pub name: &'static str,
    /// The parse function.
    pub parse: fn(&VariantSpace, &str) -> Option<VariantKey>,
}

impl std::fmt::Debug for ParseStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseStrategy")
            .field("name", &self.name)
            .finish()
    }
}

/// Ordered strategy table. Earlier entries win.
pub const PARSE_STRATEGIES: &[ParseStrategy] = &[
    ParseStrategy {
        name: "display-name",
        parse: parse_display_name,
    },
    ParseStrategy {
        name: "comparison-key",
        parse: parse_comparison_key,
    },
];

impl VariantSpace {
    /// Canonical display name for a key.
    ///
    /// Total for members of the space; pairs appear in declared axis order.
    /// Tokens without a matching axis value fall back to the raw token so
    /// the mapping stays total even for foreign keys (which `contains`
    /// would reject anyway).
    pub fn canonical_name(&self, key: &VariantKey) -> String {
        self.axes()
            .iter()
            .filter_map(|axis| {
                let token = key.get(&axis.name)?;
                let label = axis
                    .value_by_token(token)
                    .map(|v| v.label.as_str())
                    .unwrap_or(token);
                Some(format!("{}={}", axis.label, label))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Parse a child name back into a key.
    ///
    /// Tries each strategy in [`PARSE_STRATEGIES`] order; returns `None`
    /// (never panics) when no strategy matches.
    pub fn parse_name(&self, name: &str) -> Option<VariantKey> {
        PARSE_STRATEGIES
            .iter()
            .find_map(|strategy| (strategy.parse)(self, name))
    }
}

/// Strategy 1: the canonical display-name form.
fn parse_display_name(space: &VariantSpace, name: &str) -> Option<VariantKey> {
    let mut pairs = Vec::with_capacity(space.axes().len());
    for part in name.split(", ") {
        let (axis_label, value_label) = part.split_once('=')?;
        let axis = space.axis_by_label(axis_label)?;
        let value = axis.value_by_label(value_label)?;
        pairs.push((axis.name.clone(), value.token.clone()));
    }
    finish(space, pairs)
}

/// Strategy 2: the comparison-key form (`axis=token;...`).
fn parse_comparison_key(space: &VariantSpace, name: &str) -> Option<VariantKey> {
    let mut pairs = Vec::with_capacity(space.axes().len());
    for part in name.split(';') {
        let (axis_name, token) = part.split_once('=')?;
        let axis = space.axis(axis_name)?;
        let value = axis.value_by_token(token)?;
        pairs.push((axis.name.clone(), value.token.clone()));
    }
    finish(space, pairs)
}

fn finish(space: &VariantSpace, pairs: Vec<(String, String)>) -> Option<VariantKey> {
    if pairs.len() != space.axes().len() {
        return None;
    }
    let key = VariantKey::new(pairs).ok()?;
    space.contains(&key).then_some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space() -> VariantSpace {
        VariantSpace::standard()
    }

    #[test]
    fn canonical_name_uses_declared_axis_order_and_labels() {
        let space = space();
        let key = space.parse_name("fill=1;grade=n25;size=24;style=rounded;weight=700");
        let key = key.expect("comparison key should parse");
        assert_eq!(
            space.canonical_name(&key),
            "Style=Rounded, Weight=700, Fill=On, Grade=-25, Size=24px"
        );
    }

    #[test]
    fn every_variant_round_trips_through_its_name() {
        let space = space();
        for key in space.all_variants() {
            let name = space.canonical_name(&key);
            assert_eq!(space.parse_name(&name), Some(key.clone()), "name: {name}");
        }
    }

    #[test]
    fn comparison_key_form_parses_as_fallback() {
        let space = space();
        let key = space
            .parse_name("fill=0;grade=0;size=24;style=outlined;weight=400")
            .expect("should parse");
        assert_eq!(key.get("style"), Some("outlined"));
        assert_eq!(key.get("size"), Some("24"));
    }

    #[test]
    fn malformed_names_return_none() {
        let space = space();
        let malformed = [
            "",
            "garbage",
            "Style=Outlined",                                         // partial
            "Style=Outlined, Weight=400, Fill=Off, Grade=0",          // missing axis
            "Style=Neon, Weight=400, Fill=Off, Grade=0, Size=24px",   // unknown label
            "Style=Outlined, Style=Rounded, Fill=Off, Grade=0, Size=24px", // duplicate
            "style=outlined;style=rounded;fill=0;grade=0;size=24",
            "Style=Outlined; Weight=400",                             // wrong separator
            "=, =, =, =, =",
            "Frame 1",
            "Style=Outlined, Weight=400, Fill=Off, Grade=0, Size=24px, Extra=1",
        ];
        for name in malformed {
            assert_eq!(space.parse_name(name), None, "should reject: {name:?}");
        }
    }

    #[test]
    fn strategy_table_order_is_display_first() {
        assert_eq!(PARSE_STRATEGIES[0].name, "display-name");
        assert_eq!(PARSE_STRATEGIES[1].name, "comparison-key");
    }
}
