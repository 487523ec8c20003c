/*!

Computational core of a compartmental COVID-19 scenario explorer. An
eleven-compartment SEIR-style system with seasonal forcing is integrated
over a weekly horizon under configurable social-distancing policies; the
tunable quantities are described by a parameter registry so that a
presentation layer can build its controls from metadata instead of
hard-coding them.

The typical round trip:

```
use seir_core::SeirModel;

let mut model = SeirModel::default_covid_scenario();
model.update("sd_reduction", 0.55).unwrap();
let trajectories = model.solve().unwrap();
assert_eq!(trajectories.len(), 105);
println!(
    "{} weeks above critical-care capacity",
    trajectories.weeks_above_critical_capacity()
);
```

Scenarios can also be described declaratively in JSON and loaded with
[`scenario::load_scenario`].

*/

pub mod error;
pub mod log;
pub mod model;
pub mod ode;
pub mod params;
pub mod scenario;
pub mod trajectory;

pub use error::SeirError;
pub use model::SeirModel;
pub use ode::SolverOptions;
pub use params::{CONSTANT_GROUP, Param, ParamDef, ParamRegistry};
pub use scenario::{ScenarioSpec, load_scenario};
pub use trajectory::{
    COMPARTMENT_LABELS, CRITICAL_CARE_BEDS_PER_10K, NUM_COMPARTMENTS, Trajectories,
};
