/*!

The parameter registry: an ordered, write-once catalog of the tunable and
fixed quantities a model exposes. Each entry carries bounds, a default, a
numeric kind, and display metadata; the registry is consulted by the model
for defaults and by the presentation layer for building controls, and it
never participates in integration itself.

*/

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::SeirError;

/// The group assigned to parameters whose bounds pin them to a single value
/// and that were not given an explicit group. Presentation layers drop this
/// group when building controls.
pub const CONSTANT_GROUP: &str = "constant";

/// A single tunable or fixed quantity: immutable metadata describing one
/// knob of the model.
///
/// `min_value <= default_value <= max_value` holds for every `Param` a
/// registry hands out; a `Param` with `min_value == max_value` is a
/// constant and is excluded from the tunable set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    name: String,
    min_value: f64,
    max_value: f64,
    default_value: f64,
    desc: String,
    integer: bool,
    percentage: bool,
    group: Option<String>,
    show_name: bool,
}

impl Param {
    #[must_use]
    #[inline(always)]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    #[must_use]
    #[inline(always)]
    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    #[must_use]
    #[inline(always)]
    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    #[must_use]
    #[inline(always)]
    pub fn default_value(&self) -> f64 {
        self.default_value
    }

    #[must_use]
    #[inline(always)]
    pub fn desc(&self) -> &str {
        self.desc.as_str()
    }

    /// Whether the parameter takes whole-number values. Display metadata
    /// only: the current-value overlay stores every parameter as `f64`.
    #[must_use]
    #[inline(always)]
    pub fn is_integer(&self) -> bool {
        self.integer
    }

    /// Whether the parameter should be rendered as a percentage.
    #[must_use]
    #[inline(always)]
    pub fn is_percentage(&self) -> bool {
        self.percentage
    }

    /// Free-form grouping tag used only for control layout. Model math
    /// never branches on it.
    #[must_use]
    #[inline(always)]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Display hint: show the raw identifier alongside the description.
    #[must_use]
    #[inline(always)]
    pub fn show_name(&self) -> bool {
        self.show_name
    }

    /// A parameter is constant exactly when its bounds coincide. Constants
    /// are never accepted by `SeirModel::update`.
    #[must_use]
    #[inline]
    pub fn is_constant(&self) -> bool {
        self.min_value == self.max_value
    }
}

/// Builder for a parameter definition. Construction never fails; all
/// validation happens in [`ParamRegistry::define`].
///
/// An omitted maximum collapses to the minimum (a constant); an omitted
/// default becomes the midpoint of the bounds.
#[derive(Debug, Clone)]
pub struct ParamDef {
    name: String,
    min_value: f64,
    desc: String,
    max_value: Option<f64>,
    default_value: Option<f64>,
    integer: bool,
    percentage: bool,
    group: Option<String>,
    show_name: bool,
}

impl ParamDef {
    #[must_use]
    pub fn new(name: impl Into<String>, min_value: f64, desc: impl Into<String>) -> Self {
        ParamDef {
            name: name.into(),
            min_value,
            desc: desc.into(),
            max_value: None,
            default_value: None,
            integer: false,
            percentage: false,
            group: None,
            show_name: false,
        }
    }

    #[must_use]
    pub fn max_value(mut self, max_value: f64) -> Self {
        self.max_value = Some(max_value);
        self
    }

    #[must_use]
    pub fn default_value(mut self, default_value: f64) -> Self {
        self.default_value = Some(default_value);
        self
    }

    #[must_use]
    pub fn integer(mut self) -> Self {
        self.integer = true;
        self
    }

    #[must_use]
    pub fn percentage(mut self) -> Self {
        self.percentage = true;
        self
    }

    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn show_name(mut self) -> Self {
        self.show_name = true;
        self
    }
}

/// An ordered collection of [`Param`]s. Definition order is preserved and
/// stable, so presentation layers can lay controls out reproducibly and
/// match override vectors by position.
///
/// Registries are write-once per identifier: once defined, a parameter is
/// never mutated or replaced.
#[derive(Debug, Default, Clone)]
pub struct ParamRegistry {
    params: Vec<Param>,
    by_name: FxHashMap<String, usize>,
}

impl ParamRegistry {
    #[must_use]
    pub fn new() -> Self {
        ParamRegistry::default()
    }

    /// Validates and stores a parameter definition, returning a reference
    /// to the resolved [`Param`].
    ///
    /// # Errors
    ///
    /// [`SeirError::DuplicateParam`] if the name is already defined;
    /// [`SeirError::InvalidBounds`] if `min > max` (when a maximum was
    /// given) or an explicit default lies outside `[min, max]`.
    pub fn define(&mut self, def: ParamDef) -> Result<&Param, SeirError> {
        if self.by_name.contains_key(&def.name) {
            return Err(SeirError::DuplicateParam(def.name));
        }

        let max_value = def.max_value.unwrap_or(def.min_value);
        if def.min_value > max_value {
            return Err(SeirError::InvalidBounds(format!(
                "'{}': min {} exceeds max {}",
                def.name, def.min_value, max_value
            )));
        }

        let default_value = match def.default_value {
            Some(value) if value < def.min_value || value > max_value => {
                return Err(SeirError::InvalidBounds(format!(
                    "'{}': default {} outside [{}, {}]",
                    def.name, value, def.min_value, max_value
                )));
            }
            Some(value) => value,
            None => (def.min_value + max_value) / 2.0,
        };

        let group = match def.group {
            None if def.min_value == max_value => Some(CONSTANT_GROUP.to_string()),
            group => group,
        };

        self.by_name.insert(def.name.clone(), self.params.len());
        self.params.push(Param {
            name: def.name,
            min_value: def.min_value,
            max_value,
            default_value,
            desc: def.desc,
            integer: def.integer,
            percentage: def.percentage,
            group,
            show_name: def.show_name,
        });

        Ok(self.params.last().unwrap()) // Will never panic: just pushed
    }

    /// All parameters in definition order.
    #[must_use]
    pub fn all(&self) -> &[Param] {
        &self.params
    }

    /// The parameters excluding constants, in definition order. Each call
    /// produces a fresh iterator over the current definitions, so the
    /// sequence is finite and restartable.
    pub fn tunable(&self) -> impl Iterator<Item = &Param> {
        self.params.iter().filter(|param| !param.is_constant())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Param> {
        self.by_name.get(name).map(|&index| &self.params[index])
    }

    /// Whether `name` is defined and not a constant.
    #[must_use]
    pub fn is_tunable(&self, name: &str) -> bool {
        self.get(name).is_some_and(|param| !param.is_constant())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
