/*!

JSON scenario files: a declarative way to configure a model run. Every
field is optional; an empty object `{}` describes the reference
scenario. Parameter overrides go through [`SeirModel::update`], so a
misspelled or constant name fails the load instead of being silently
ignored.

```json
{
    "pop_size": 25000,
    "num_weeks": 52,
    "dynamic_distancing": true,
    "overrides": { "sd_reduction": 0.55, "max_R0": 2.5 }
}
```

*/

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::error::SeirError;
use crate::log::debug;
use crate::model::{
    DEFAULT_NUM_WEEKS, DEFAULT_POP_SIZE, DEFAULT_START_DAY, SeirModel,
};

/// A model configuration as read from a scenario file. Missing fields
/// fall back to the reference scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScenarioSpec {
    pub pop_size: u32,
    pub num_weeks: u32,
    /// Calendar day of week zero, in days since 1970-01-01.
    pub start_day: i64,
    pub static_distancing: bool,
    pub dynamic_distancing: bool,
    /// Parameter values to apply on top of the registry defaults.
    pub overrides: FxHashMap<String, f64>,
}

impl Default for ScenarioSpec {
    fn default() -> Self {
        ScenarioSpec {
            pop_size: DEFAULT_POP_SIZE,
            num_weeks: DEFAULT_NUM_WEEKS,
            start_day: DEFAULT_START_DAY,
            static_distancing: true,
            dynamic_distancing: false,
            overrides: FxHashMap::default(),
        }
    }
}

impl ScenarioSpec {
    /// Builds a ready-to-solve model from this specification.
    ///
    /// # Errors
    ///
    /// [`SeirError::InvalidBounds`] for a zero population;
    /// [`SeirError::UnknownParam`] when an override names something that
    /// is not a tunable parameter.
    pub fn build(&self) -> Result<SeirModel, SeirError> {
        let mut model = SeirModel::new(self.pop_size, self.num_weeks, self.start_day)?;
        model.set_static_distancing(self.static_distancing);
        model.set_dynamic_distancing(self.dynamic_distancing);
        for (name, value) in &self.overrides {
            model.update(name, *value)?;
        }
        Ok(model)
    }
}

/// Reads a JSON scenario file and builds the model it describes.
///
/// # Errors
///
/// [`SeirError::Io`] if the file cannot be read, [`SeirError::Json`] if
/// it does not parse as a scenario, plus everything
/// [`ScenarioSpec::build`] can return.
pub fn load_scenario(path: &Path) -> Result<SeirModel, SeirError> {
    let file = File::open(path)?;
    let spec: ScenarioSpec = serde_json::from_reader(BufReader::new(file))?;
    debug!("loaded scenario from {}: {spec:?}", path.display());
    spec.build()
}
