//! core::variants::default_pick
//!
//! Default-variant selection.
//!
//! # Design
//!
//! After reconciliation the entity's children are reordered with the
//! "default" variant first, because downstream consumers rely on positional
//! ordering. The subset of keys actually present may not include the
//! globally preferred combination (hand-edited trees, partial legacy
//! entities), so selection relaxes one axis at a time in importance order:
//! keep candidates matching the preferred value when any exist, otherwise
//! keep candidates matching the earliest axis value that is available.
//!
//! Selection is a pure function of the input subset and the preference
//! table; the table is overridable per call for testability.

use super::space::{VariantKey, VariantSpace};

/// Preference table: the globally preferred value per axis, plus the axis
/// relaxation order (primary style axis first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceTable {
    /// Preferred value token per axis.
    preferred: Vec<(String, String)>,
    /// Axis names in importance order.
    priority: Vec<String>,
}

impl PreferenceTable {
    /// Build a table from explicit pairs and an explicit priority order.
    ///
    /// Axes missing from `priority` are appended in `preferred` order, so
    /// every preferred axis participates in relaxation.
    pub fn new(preferred: Vec<(String, String)>, priority: Vec<String>) -> Self {
        let mut priority = priority;
        for (axis, _) in &preferred {
            if !priority.iter().any(|p| p == axis) {
                priority.push(axis.clone());
            }
        }
        Self { preferred, priority }
    }

    /// The stock preferences for a space: the first declared value of each
    /// axis, relaxed in declared axis order.
    pub fn for_space(space: &VariantSpace) -> Self {
        let preferred = space
            .axes()
            .iter()
            .map(|axis| (axis.name.clone(), axis.values[0].token.clone()))
            .collect();
        let priority = space.axes().iter().map(|a| a.name.clone()).collect();
        Self::new(preferred, priority)
    }

    /// Preferred token for an axis, if configured.
    pub fn preferred(&self, axis: &str) -> Option<&str> {
        self.preferred
            .iter()
            .find(|(name, _)| name == axis)
            .map(|(_, token)| token.as_str())
    }

    /// Axis names in relaxation order.
    pub fn priority(&self) -> &[String] {
        &self.priority
    }

    /// Whether a key matches every configured preference.
    pub fn matches_fully(&self, key: &VariantKey) -> bool {
        self.preferred
            .iter()
            .all(|(axis, token)| key.get(axis) == Some(token.as_str()))
    }
}

/// Pick the best available key from a subset.
///
/// Tries the globally preferred combination first; otherwise narrows the
/// candidate set one axis at a time in priority order. If the narrowing
/// ever empties the candidate set (keys missing an axis entirely), the
/// first key of the original subset is returned. `None` only for an empty
/// subset.
pub fn pick_default<'a>(
    space: &VariantSpace,
    subset: &'a [VariantKey],
    prefs: &PreferenceTable,
) -> Option<&'a VariantKey> {
    if subset.is_empty() {
        return None;
    }

    if let Some(exact) = subset.iter().find(|key| prefs.matches_fully(key)) {
        return Some(exact);
    }

    let mut candidates: Vec<&VariantKey> = subset.iter().collect();
    for axis_name in prefs.priority() {
        let Some(axis) = space.axis(axis_name) else {
            continue;
        };

        let chosen = choose_axis_value(&candidates, axis_name, prefs, axis);
        let Some(token) = chosen else {
            // No candidate carries this axis at all; relax it entirely.
            continue;
        };

        candidates.retain(|key| key.get(axis_name) == Some(token.as_str()));
        if candidates.is_empty() {
            return subset.first();
        }
    }

    candidates.first().copied().or_else(|| subset.first())
}

/// The value to lock an axis to: the preferred token when any candidate has
/// it, otherwise the earliest axis value present among candidates.
fn choose_axis_value(
    candidates: &[&VariantKey],
    axis_name: &str,
    prefs: &PreferenceTable,
    axis: &super::space::VariantAxis,
) -> Option<String> {
    if let Some(pref) = prefs.preferred(axis_name) {
        if candidates.iter().any(|key| key.get(axis_name) == Some(pref)) {
            return Some(pref.to_string());
        }
    }
    axis.values
        .iter()
        .map(|v| v.token.as_str())
        .find(|token| candidates.iter().any(|key| key.get(axis_name) == Some(token)))
        .map(str::to_string)
}
