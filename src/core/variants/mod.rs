//! core::variants
//!
//! The variant space model: axes, keys, canonical naming, and
//! default-variant selection.
//!
//! # Architecture
//!
//! An icon expands into one concrete child per combination of axis values
//! (the Cartesian product of the configured [`VariantAxis`] set). This module
//! owns:
//!
//! - [`space`] - axis definitions, the product enumeration, and [`VariantKey`]
//! - [`naming`] - canonical display names, comparison keys, and parsing
//! - [`default_pick`] - importance-ordered default-variant selection
//!
//! # Invariants
//!
//! - The mapping `VariantKey -> canonical name` is total and injective
//! - `parse_name(canonical_name(k)) == Some(k)` for every key in the space
//! - `parse_name` never panics; malformed input yields `None`

pub mod default_pick;
pub mod naming;
pub mod space;

pub use default_pick::{pick_default, PreferenceTable};
pub use naming::ParseStrategy;
pub use space::{AxisValue, SpaceError, VariantAxis, VariantKey, VariantSpace};
