//! core::variants::space
//!
//! Variant axes and the Cartesian product they span.
//!
//! # Design
//!
//! Axes are fixed at configuration time. Each axis value carries both a
//! canonical lowercase `token` (used in comparison keys, slugs, and source
//! URLs) and a human-facing `label` (used in canonical display names, with
//! units where applicable, e.g. `24px`). Separator characters are banned
//! from tokens and labels at construction time, which is what makes both
//! serializations injective.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from variant space construction and key assembly.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpaceError {
    #[error("variant space must have at least one axis")]
    NoAxes,

    #[error("axis '{0}' has no values")]
    EmptyAxis(String),

    #[error("duplicate axis name: {0}")]
    DuplicateAxis(String),

    #[error("invalid axis name '{name}': {reason}")]
    InvalidAxisName { name: String, reason: String },

    #[error("invalid value on axis '{axis}': {reason}")]
    InvalidValue { axis: String, reason: String },

    #[error("duplicate value on axis '{axis}': {value}")]
    DuplicateValue { axis: String, value: String },

    #[error("key has duplicate axis: {0}")]
    DuplicateKeyAxis(String),
}

/// One discrete value on an axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisValue {
    /// Canonical lowercase token (`outlined`, `n25`, `24`).
    pub token: String,
    /// Display label, capitalized and with units (`Outlined`, `-25`, `24px`).
    pub label: String,
}

impl AxisValue {
    /// Create a value with the same token and label.
    pub fn plain(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            label: token.clone(),
            token,
        }
    }

    /// Create a value with distinct token and label.
    pub fn new(token: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            label: label.into(),
        }
    }
}

/// A named, ordered, finite set of discrete values.
///
/// Value order matters: the default-variant selector falls back to the
/// earliest available value when the preferred one is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantAxis {
    /// Canonical lowercase axis name (`style`, `weight`).
    pub name: String,
    /// Display label (`Style`, `Weight`).
    pub label: String,
    /// Ordered value set.
    pub values: Vec<AxisValue>,
}

impl VariantAxis {
    /// Create a new axis.
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        values: Vec<AxisValue>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            values,
        }
    }

    /// Look up a value by token.
    pub fn value_by_token(&self, token: &str) -> Option<&AxisValue> {
        self.values.iter().find(|v| v.token == token)
    }

    /// Look up a value by display label.
    pub fn value_by_label(&self, label: &str) -> Option<&AxisValue> {
        self.values.iter().find(|v| v.label == label)
    }
}

/// One concrete combination of axis values.
///
/// Pairs are held sorted by axis name, so equality and hashing are
/// order-independent regardless of how the key was assembled.
///
/// # Example
///
/// ```
/// use glyphsync::core::variants::VariantKey;
///
/// let a = VariantKey::new(vec![
///     ("style".into(), "outlined".into()),
///     ("weight".into(), "400".into()),
/// ])
/// .unwrap();
/// let b = VariantKey::new(vec![
///     ("weight".into(), "400".into()),
///     ("style".into(), "outlined".into()),
/// ])
/// .unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.comparison_key(), "style=outlined;weight=400");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey {
    pairs: Vec<(String, String)>,
}

impl VariantKey {
    /// Assemble a key from (axis name, value token) pairs.
    ///
    /// # Errors
    ///
    /// Returns `SpaceError::DuplicateKeyAxis` if an axis appears twice.
    pub fn new(mut pairs: Vec<(String, String)>) -> Result<Self, SpaceError> {
        pairs.sort();
        for window in pairs.windows(2) {
            if window[0].0 == window[1].0 {
                return Err(SpaceError::DuplicateKeyAxis(window[0].0.clone()));
            }
        }
        Ok(Self { pairs })
    }

    /// Get the value token for an axis, if present.
    pub fn get(&self, axis: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(name, _)| name == axis)
            .map(|(_, token)| token.as_str())
    }

    /// The (axis, token) pairs, sorted by axis name.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Canonical comparison key: `axis=token` pairs joined by `;`,
    /// sorted by axis name. Lossless and order-independent.
    pub fn comparison_key(&self) -> String {
        self.pairs
            .iter()
            .map(|(axis, token)| format!("{axis}={token}"))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// URL/file-safe slug: `axis-token` pairs joined by `_`,
    /// sorted by axis name.
    pub fn slug(&self) -> String {
        self.pairs
            .iter()
            .map(|(axis, token)| format!("{axis}-{token}"))
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// The full variant space: the Cartesian product of the configured axes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSpace {
    axes: Vec<VariantAxis>,
}

/// Characters that would make names or keys ambiguous if they appeared
/// inside tokens or labels.
const TOKEN_SEPARATORS: [char; 4] = ['=', ';', '_', ' '];
const LABEL_SEPARATORS: [char; 2] = ['=', ','];

impl VariantSpace {
    /// Build and validate a variant space.
    ///
    /// # Errors
    ///
    /// Returns a `SpaceError` when axes are empty, duplicated, or contain
    /// values whose tokens/labels would break injective naming.
    pub fn new(axes: Vec<VariantAxis>) -> Result<Self, SpaceError> {
        if axes.is_empty() {
            return Err(SpaceError::NoAxes);
        }

        let mut seen_names = std::collections::HashSet::new();
        let mut seen_labels = std::collections::HashSet::new();
        for axis in &axes {
            if axis.name.is_empty()
                || !axis
                    .name
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            {
                return Err(SpaceError::InvalidAxisName {
                    name: axis.name.clone(),
                    reason: "axis names are lowercase ascii alphanumerics".into(),
                });
            }
            if !seen_names.insert(axis.name.clone()) {
                return Err(SpaceError::DuplicateAxis(axis.name.clone()));
            }
            if !seen_labels.insert(axis.label.clone()) {
                return Err(SpaceError::DuplicateAxis(axis.label.clone()));
            }
            if axis.values.is_empty() {
                return Err(SpaceError::EmptyAxis(axis.name.clone()));
            }

            let mut tokens = std::collections::HashSet::new();
            let mut labels = std::collections::HashSet::new();
            for value in &axis.values {
                Self::validate_value(axis, value)?;
                if !tokens.insert(value.token.clone()) {
                    return Err(SpaceError::DuplicateValue {
                        axis: axis.name.clone(),
                        value: value.token.clone(),
                    });
                }
                if !labels.insert(value.label.clone()) {
                    return Err(SpaceError::DuplicateValue {
                        axis: axis.name.clone(),
                        value: value.label.clone(),
                    });
                }
            }
        }

        Ok(Self { axes })
    }

    fn validate_value(axis: &VariantAxis, value: &AxisValue) -> Result<(), SpaceError> {
        if value.token.is_empty() || value.label.is_empty() {
            return Err(SpaceError::InvalidValue {
                axis: axis.name.clone(),
                reason: "tokens and labels cannot be empty".into(),
            });
        }
        if value.token.chars().any(|c| {
            TOKEN_SEPARATORS.contains(&c) || c.is_whitespace() || c.is_ascii_uppercase()
        }) {
            return Err(SpaceError::InvalidValue {
                axis: axis.name.clone(),
                reason: format!("token '{}' contains a reserved character", value.token),
            });
        }
        if value.label.chars().any(|c| LABEL_SEPARATORS.contains(&c)) {
            return Err(SpaceError::InvalidValue {
                axis: axis.name.clone(),
                reason: format!("label '{}' contains a reserved character", value.label),
            });
        }
        Ok(())
    }

    /// The axes in declared order.
    pub fn axes(&self) -> &[VariantAxis] {
        &self.axes
    }

    /// Look up an axis by canonical name.
    pub fn axis(&self, name: &str) -> Option<&VariantAxis> {
        self.axes.iter().find(|a| a.name == name)
    }

    /// Look up an axis by display label.
    pub fn axis_by_label(&self, label: &str) -> Option<&VariantAxis> {
        self.axes.iter().find(|a| a.label == label)
    }

    /// Total number of combinations: the product of axis sizes.
    pub fn size(&self) -> usize {
        self.axes.iter().map(|a| a.values.len()).product()
    }

    /// Whether a key is a member of this space (covers every axis exactly,
    /// with a valid token for each).
    pub fn contains(&self, key: &VariantKey) -> bool {
        key.pairs().len() == self.axes.len()
            && self.axes.iter().all(|axis| {
                key.get(&axis.name)
                    .is_some_and(|token| axis.value_by_token(token).is_some())
            })
    }

    /// Enumerate every combination, deterministically.
    ///
    /// Axes vary odometer-style with the last declared axis fastest; the
    /// same configuration always yields the same sequence across runs.
    pub fn all_variants(&self) -> Vec<VariantKey> {
        let mut out = Vec::with_capacity(self.size());
        let mut indices = vec![0usize; self.axes.len()];

        loop {
            let pairs = self
                .axes
                .iter()
                .zip(&indices)
                .map(|(axis, &i)| (axis.name.clone(), axis.values[i].token.clone()))
                .collect();
            // Duplicate axis names are impossible past construction.
            if let Ok(key) = VariantKey::new(pairs) {
                out.push(key);
            }

            // Advance the odometer.
            let mut pos = self.axes.len();
            loop {
                if pos == 0 {
                    return out;
                }
                pos -= 1;
                indices[pos] += 1;
                if indices[pos] < self.axes[pos].values.len() {
                    break;
                }
                indices[pos] = 0;
            }
        }
    }

    /// The stock five-axis icon space (3 styles x 7 weights x 2 fills x
    /// 3 grades x 4 optical sizes = 504 combinations).
    pub fn standard() -> Self {
        let axes = vec![
            VariantAxis::new(
                "style",
                "Style",
                vec![
                    AxisValue::new("outlined", "Outlined"),
                    AxisValue::new("rounded", "Rounded"),
                    AxisValue::new("sharp", "Sharp"),
                ],
            ),
            VariantAxis::new(
                "weight",
                "Weight",
                vec![
                    AxisValue::plain("100"),
                    AxisValue::plain("200"),
                    AxisValue::plain("300"),
                    AxisValue::plain("400"),
                    AxisValue::plain("500"),
                    AxisValue::plain("600"),
                    AxisValue::plain("700"),
                ],
            ),
            VariantAxis::new(
                "fill",
                "Fill",
                vec![AxisValue::new("0", "Off"), AxisValue::new("1", "On")],
            ),
            VariantAxis::new(
                "grade",
                "Grade",
                vec![
                    AxisValue::new("n25", "-25"),
                    AxisValue::plain("0"),
                    AxisValue::plain("200"),
                ],
            ),
            VariantAxis::new(
                "size",
                "Size",
                vec![
                    AxisValue::new("20", "20px"),
                    AxisValue::new("24", "24px"),
                    AxisValue::new("40", "40px"),
                    AxisValue::new("48", "48px"),
                ],
            ),
        ];
        // The stock axes are statically valid.
        Self::new(axes).unwrap_or_else(|_| unreachable!("stock axes validate"))
    }
}
