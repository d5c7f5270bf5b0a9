//! Cross-filter predicates shared between views.
//!
//! `Selection` holds the clicked country and the clicked crop legend entry
//! for one render pass. It is passed explicitly to every view builder, which
//! turns it into the initial value of the client-side selection params. The
//! methods here evaluate the same predicates in Rust.

use serde::Serialize;
use serde_json::{json, Value};

use crate::schema::{COUNTRY, ITEM};

/// Opacity of marks outside the active selection.
pub const UNSELECTED_OPACITY: f64 = 0.2;
pub const SELECTED_OPACITY: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Set by clicking a country bar.
    CountryClick,
    /// Set by clicking a crop legend entry.
    CropClick,
}

impl Predicate {
    pub const ALL: [Self; 2] = [Self::CountryClick, Self::CropClick];

    pub fn param_name(self) -> &'static str {
        match self {
            Self::CountryClick => "country_selection",
            Self::CropClick => "crop_selection",
        }
    }

    /// Data field the predicate compares.
    pub fn field(self) -> &'static str {
        match self {
            Self::CountryClick => COUNTRY,
            Self::CropClick => ITEM,
        }
    }

    /// Whether the selection is driven by legend clicks.
    pub fn legend_bound(self) -> bool {
        matches!(self, Self::CropClick)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Selection {
    pub country: Option<String>,
    pub crop: Option<String>,
}

impl Selection {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_crop(mut self, crop: impl Into<String>) -> Self {
        self.crop = Some(crop.into());
        self
    }

    pub fn value(&self, predicate: Predicate) -> Option<&str> {
        match predicate {
            Predicate::CountryClick => self.country.as_deref(),
            Predicate::CropClick => self.crop.as_deref(),
        }
    }

    /// An empty predicate selects everything.
    pub fn matches(&self, predicate: Predicate, value: &str) -> bool {
        self.value(predicate).is_none_or(|selected| selected == value)
    }

    /// Opacity of a mark for `value`, mirroring the views' opacity condition.
    pub fn opacity_for(&self, predicate: Predicate, value: &str, unselected: f64) -> f64 {
        if self.matches(predicate, value) {
            SELECTED_OPACITY
        } else {
            unselected
        }
    }

    /// Initial value for the Vega-Lite point selection, if any.
    pub(crate) fn param_value(&self, predicate: Predicate) -> Option<Value> {
        self.value(predicate)
            .map(|v| json!([{ (predicate.field()): v }]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_selection_matches_everything() {
        let s = Selection::none();
        assert!(s.matches(Predicate::CountryClick, "Kenya"));
        assert_eq!(s.opacity_for(Predicate::CropClick, "Maize", UNSELECTED_OPACITY), SELECTED_OPACITY);
        assert!(s.param_value(Predicate::CropClick).is_none());
    }

    #[test]
    fn test_selected_crop_dims_others() {
        let s = Selection::none().with_crop("Maize");
        assert_eq!(s.opacity_for(Predicate::CropClick, "Maize", UNSELECTED_OPACITY), 1.0);
        assert_eq!(s.opacity_for(Predicate::CropClick, "Wheat", 0.35), 0.35);
        // the country predicate is independent
        assert!(s.matches(Predicate::CountryClick, "Togo"));
        assert!(!s.matches(Predicate::CropClick, "Wheat"));
        assert_eq!(
            s.param_value(Predicate::CropClick),
            Some(json!([{ "item": "Maize" }]))
        );
    }
}
