/*!

A compartmental SEIR-style epidemic model with seasonal forcing and
social-distancing policies.

The population moves through eleven compartments. Exposure splits the
infectious into three tracks by eventual severity: mild cases (I_R)
recover at home into R_R; hospital-bound cases (I_H) pass through a ward
(H_H) into R_H; critical-bound cases (I_C) pass through a ward (H_C) and
a critical-care unit (C_C) into R_C.

Transmission is seasonally forced through a 52-week cosine on the basic
reproduction number. Two optional mitigation policies reduce contact:
a static one over a fixed week window, and a dynamic one that kicks in
whenever current infections exceed a threshold outside that window.
Either policy multiplies the transmission rate by `1 - sd_reduction`,
applied at most once per evaluation.

All parameters live in a [`ParamRegistry`] built at construction; their
current values sit in a separate mutable overlay, so a model value is a
complete scenario and cloning it forks an independent what-if copy.

*/

use rustc_hash::FxHashMap;

use crate::error::SeirError;
use crate::log::debug;
use crate::ode::{self, SolverOptions};
use crate::params::{ParamDef, ParamRegistry};
use crate::trajectory::{NUM_COMPARTMENTS, Trajectories};

/// Period of the seasonal transmission forcing, in weeks.
const FORCING_PERIOD_WEEKS: f64 = 52.0;

pub(crate) const DEFAULT_POP_SIZE: u32 = 10_000;
pub(crate) const DEFAULT_NUM_WEEKS: u32 = 2 * 52;
/// 2020-03-11 in days since 1970-01-01.
pub(crate) const DEFAULT_START_DAY: i64 = 18_332;

/// A fully configured epidemic scenario: population, horizon, policy
/// flags, parameter metadata, and current parameter values.
///
/// [`solve`](SeirModel::solve) is a pure function of this state, so
/// repeated calls without an intervening [`update`](SeirModel::update)
/// return identical trajectories.
#[derive(Debug, Clone)]
pub struct SeirModel {
    pop_size: u32,
    num_weeks: u32,
    start_day: i64,
    static_distancing: bool,
    dynamic_distancing: bool,
    registry: ParamRegistry,
    values: FxHashMap<String, f64>,
}

impl SeirModel {
    /// Builds a model over `pop_size` people for `num_weeks` weeks,
    /// with week zero falling on `start_day` (days since 1970-01-01).
    /// Static distancing starts enabled, dynamic disabled.
    ///
    /// # Errors
    ///
    /// [`SeirError::InvalidBounds`] if `pop_size` is zero.
    pub fn new(pop_size: u32, num_weeks: u32, start_day: i64) -> Result<Self, SeirError> {
        if pop_size == 0 {
            return Err(SeirError::InvalidBounds(
                "population size must be positive".to_string(),
            ));
        }

        let mut registry = ParamRegistry::new();
        registry.define(ParamDef::new(
            "p_R",
            0.956,
            "Proportion of exposed individuals who enter the infected recovery state I_R",
        ))?;
        registry.define(ParamDef::new(
            "p_H",
            0.0308,
            "Proportion of exposed individuals who enter the hospitalization state I_H \
             (excluding critical care)",
        ))?;
        registry.define(ParamDef::new(
            "p_C",
            0.0132,
            "Proportion of exposed individuals who enter the critical care state I_C",
        ))?;
        registry.define(ParamDef::new(
            "nu",
            7.0 / 4.6,
            "Rate at which exposed individuals become infected",
        ))?;
        registry.define(ParamDef::new(
            "gamma",
            7.0 / 5.0,
            "1/gamma is the duration in weeks a person is infected before they enter \
             hospitalization",
        ))?;
        registry.define(ParamDef::new(
            "delta_H",
            7.0 / 8.0,
            "1/delta_H is the duration in weeks hospitalization cases which do not receive \
             critical care",
        ))?;
        registry.define(ParamDef::new(
            "delta_C",
            7.0 / 6.0,
            "1/delta_C is the duration in weeks of hospitalization cases prior to receiving \
             critical care",
        ))?;
        registry.define(ParamDef::new(
            "xi_C",
            7.0 / 10.0,
            "1/xi_C is the duration in weeks of critical care",
        ))?;
        registry.define(
            ParamDef::new("max_R0", 2.0, "Maximum of the basic reproduction number")
                .max_value(2.5)
                .group("advanced")
                .show_name(),
        )?;
        registry.define(
            ParamDef::new("delta", 0.0, "Proportional decline in R0 in the summer")
                .max_value(0.3)
                .group("advanced")
                .show_name()
                .percentage(),
        )?;
        registry.define(ParamDef::new(
            "phi",
            -3.8,
            "Phase shift of the seasonal forcing",
        ))?;
        registry.define(
            ParamDef::new(
                "start_sd",
                0.0,
                "Start of social distancing (weeks after initial case)",
            )
            .max_value(20.0)
            .default_value(2.0)
            .integer()
            .group("static_social_distancing"),
        )?;
        registry.define(
            ParamDef::new("sd_duration", 0.0, "Duration of social distancing (weeks)")
                .max_value(40.0)
                .default_value(4.0)
                .integer()
                .group("static_social_distancing"),
        )?;
        registry.define(
            ParamDef::new("sd_reduction", 0.0, "Percentage to reduce weekly contact by")
                .max_value(1.0)
                .default_value(0.4)
                .percentage()
                .group("static_social_distancing"),
        )?;
        registry.define(
            ParamDef::new(
                "dynamic_sd_cutoff",
                20.0,
                "Number of cases per 10,000 required to trigger social distancing",
            )
            .max_value(100.0)
            .default_value(38.0)
            .integer()
            .group("dynamic_social_distancing"),
        )?;

        let values = registry
            .all()
            .iter()
            .map(|param| (param.name().to_string(), param.default_value()))
            .collect();

        Ok(SeirModel {
            pop_size,
            num_weeks,
            start_day,
            static_distancing: true,
            dynamic_distancing: false,
            registry,
            values,
        })
    }

    /// The reference COVID-19 scenario: 10,000 people over two years,
    /// starting 2020-03-11.
    #[must_use]
    pub fn default_covid_scenario() -> Self {
        // Will never panic: the built-in configuration is valid
        SeirModel::new(DEFAULT_POP_SIZE, DEFAULT_NUM_WEEKS, DEFAULT_START_DAY).unwrap()
    }

    #[must_use]
    #[inline(always)]
    pub fn pop_size(&self) -> u32 {
        self.pop_size
    }

    #[must_use]
    #[inline(always)]
    pub fn num_weeks(&self) -> u32 {
        self.num_weeks
    }

    #[must_use]
    #[inline(always)]
    pub fn start_day(&self) -> i64 {
        self.start_day
    }

    #[must_use]
    #[inline(always)]
    pub fn static_distancing(&self) -> bool {
        self.static_distancing
    }

    #[must_use]
    #[inline(always)]
    pub fn dynamic_distancing(&self) -> bool {
        self.dynamic_distancing
    }

    pub fn set_static_distancing(&mut self, enabled: bool) {
        self.static_distancing = enabled;
    }

    pub fn set_dynamic_distancing(&mut self, enabled: bool) {
        self.dynamic_distancing = enabled;
    }

    /// The parameter metadata this model was built with.
    #[must_use]
    pub fn params(&self) -> &ParamRegistry {
        &self.registry
    }

    /// Current value of a parameter, or `None` for an unknown name.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Overwrites the current value of a tunable parameter.
    ///
    /// Values outside the declared bounds are accepted and flow into the
    /// next solve; callers wanting enforcement compare against the
    /// [`Param`](crate::params::Param) bounds first.
    ///
    /// # Errors
    ///
    /// [`SeirError::UnknownParam`] if `name` is not defined or names a
    /// constant; the overlay is left unchanged.
    pub fn update(&mut self, name: &str, value: f64) -> Result<(), SeirError> {
        if !self.registry.is_tunable(name) {
            return Err(SeirError::UnknownParam(name.to_string()));
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Current value of a defined parameter. The overlay is seeded with
    /// every registry default at construction and `update` only touches
    /// existing names, so the lookup cannot miss.
    fn param(&self, name: &str) -> f64 {
        self.values[name]
    }

    /// Seasonally forced basic reproduction number at week `t`: a cosine
    /// oscillating between `max_R0` in winter and `(1 - delta) * max_R0`
    /// in summer, phase-shifted by `phi`.
    fn seasonal_r0(&self, t: f64) -> f64 {
        let max_r0 = self.param("max_R0");
        let summer_r0 = (1.0 - self.param("delta")) * max_r0;
        let amplitude = (max_r0 - summer_r0) / 2.0;
        let vertical_shift = (max_r0 + summer_r0) / 2.0;
        let angle = 2.0 * std::f64::consts::PI * (t + self.param("phi")) / FORCING_PERIOD_WEEKS;
        amplitude * angle.cos() + vertical_shift
    }

    /// Unmitigated transmission rate at week `t`.
    #[must_use]
    pub fn transmission_rate(&self, t: f64) -> f64 {
        self.param("gamma") * self.seasonal_r0(t)
    }

    /// Transmission rate at week `t` after any active social-distancing
    /// reduction.
    ///
    /// The static policy applies strictly inside the window
    /// `start_sd < t < start_sd + sd_duration`. The dynamic policy
    /// applies when `current_infected` exceeds `dynamic_sd_cutoff` and
    /// `t` lies strictly outside that window, whether or not the static
    /// policy is enabled. The reduction factor is shared and applied at
    /// most once.
    #[must_use]
    pub fn effective_rate(&self, t: f64, current_infected: f64) -> f64 {
        let rate = self.transmission_rate(t);
        let window_start = self.param("start_sd");
        let window_end = window_start + self.param("sd_duration");

        let mut reduced = self.static_distancing && window_start < t && t < window_end;
        if !reduced && self.dynamic_distancing {
            reduced = current_infected > self.param("dynamic_sd_cutoff")
                && (t < window_start || t > window_end);
        }

        if reduced {
            (1.0 - self.param("sd_reduction")) * rate
        } else {
            rate
        }
    }

    /// Compartment derivatives at `(t, y)`. Columns follow
    /// [`COMPARTMENT_LABELS`](crate::trajectory::COMPARTMENT_LABELS).
    fn rhs(&self, t: f64, y: &[f64; NUM_COMPARTMENTS]) -> [f64; NUM_COMPARTMENTS] {
        let [s, e, i_r, i_h, i_c, _r_r, h_h, h_c, _r_h, c_c, _r_c] = *y;
        let infected = i_r + i_h + i_c;
        let beta = self.effective_rate(t, infected);

        let nu = self.param("nu");
        let gamma = self.param("gamma");
        let delta_h = self.param("delta_H");
        let delta_c = self.param("delta_C");
        let xi_c = self.param("xi_C");

        let ds = -beta * infected * s / f64::from(self.pop_size);
        [
            ds,
            -ds - nu * e,
            nu * self.param("p_R") * e - gamma * i_r,
            nu * self.param("p_H") * e - gamma * i_h,
            nu * self.param("p_C") * e - gamma * i_c,
            gamma * i_r,
            gamma * i_h - delta_h * h_h,
            gamma * i_c - delta_c * h_c,
            delta_h * h_h,
            delta_c * h_c - xi_c * c_c,
            xi_c * c_c,
        ]
    }

    /// Integrates the system from week 0 to `num_weeks`, starting from
    /// one exposed individual in an otherwise susceptible population,
    /// and samples the state at every integer week.
    ///
    /// # Errors
    ///
    /// [`SeirError::Integration`] if the solver exhausts its step budget
    /// or the state leaves the realm of finite numbers; out-of-range
    /// parameter values pushed through [`update`](SeirModel::update) are
    /// the usual cause.
    pub fn solve(&self) -> Result<Trajectories, SeirError> {
        let mut y0 = [0.0_f64; NUM_COMPARTMENTS];
        y0[0] = f64::from(self.pop_size) - 1.0;
        y0[1] = 1.0;

        let weeks: Vec<f64> = (0..=self.num_weeks).map(f64::from).collect();
        debug!(
            "solving {} weeks for a population of {}",
            self.num_weeks, self.pop_size
        );
        let rows = ode::integrate(
            |t, y| self.rhs(t, y),
            0.0,
            y0,
            &weeks,
            &SolverOptions::default(),
        )?;

        Ok(Trajectories::from_rows(
            weeks,
            self.start_day,
            f64::from(self.pop_size),
            &rows,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Param;

    #[test]
    fn zero_population_is_rejected() {
        assert!(matches!(
            SeirModel::new(0, 10, 0),
            Err(SeirError::InvalidBounds(_))
        ));
    }

    #[test]
    fn fifteen_parameters_in_definition_order() {
        let model = SeirModel::default_covid_scenario();
        let names: Vec<&str> = model.params().all().iter().map(Param::name).collect();
        assert_eq!(
            names,
            [
                "p_R",
                "p_H",
                "p_C",
                "nu",
                "gamma",
                "delta_H",
                "delta_C",
                "xi_C",
                "max_R0",
                "delta",
                "phi",
                "start_sd",
                "sd_duration",
                "sd_reduction",
                "dynamic_sd_cutoff"
            ]
        );

        let tunable: Vec<&str> = model.params().tunable().map(Param::name).collect();
        assert_eq!(
            tunable,
            [
                "max_R0",
                "delta",
                "start_sd",
                "sd_duration",
                "sd_reduction",
                "dynamic_sd_cutoff"
            ]
        );
    }

    #[test]
    fn defaults_seed_the_overlay() {
        let model = SeirModel::default_covid_scenario();
        assert_eq!(model.value("max_R0"), Some(2.25));
        assert_eq!(model.value("gamma"), Some(7.0 / 5.0));
        assert_eq!(model.value("start_sd"), Some(2.0));
        assert_eq!(model.value("dynamic_sd_cutoff"), Some(38.0));
        assert_eq!(model.value("no_such_param"), None);
    }

    #[test]
    fn transmission_rate_is_periodic_over_a_year() {
        let model = SeirModel::default_covid_scenario();
        for t in [0.0, 3.7, 17.0, 51.0] {
            let diff = model.transmission_rate(t) - model.transmission_rate(t + 52.0);
            assert!(diff.abs() < 1e-9, "period broken at t = {t}: {diff}");
        }
    }

    #[test]
    fn transmission_rate_peaks_at_max_r0_times_gamma() {
        let model = SeirModel::default_covid_scenario();
        // The cosine peaks where t + phi is a multiple of 52.
        let peak = model.transmission_rate(3.8);
        assert!((peak - (7.0 / 5.0) * 2.25).abs() < 1e-9);
    }

    #[test]
    fn static_window_gates_the_reduction() {
        // Defaults: static on, start_sd = 2, sd_duration = 4, sd_reduction = 0.4.
        let model = SeirModel::default_covid_scenario();
        let inside = model.effective_rate(3.0, 0.0);
        assert!((inside - 0.6 * model.transmission_rate(3.0)).abs() < 1e-12);

        // Outside the window, and on its closed boundary, no reduction.
        assert_eq!(model.effective_rate(10.0, 0.0), model.transmission_rate(10.0));
        assert_eq!(model.effective_rate(2.0, 0.0), model.transmission_rate(2.0));
        assert_eq!(model.effective_rate(6.0, 0.0), model.transmission_rate(6.0));
    }

    #[test]
    fn dynamic_reduction_triggers_on_infection_load() {
        let mut model = SeirModel::default_covid_scenario();
        model.set_static_distancing(false);
        model.set_dynamic_distancing(true);

        // Above the cutoff of 38, outside the static window.
        let reduced = model.effective_rate(30.0, 50.0);
        assert!((reduced - 0.6 * model.transmission_rate(30.0)).abs() < 1e-12);

        // Below the cutoff nothing happens.
        assert_eq!(model.effective_rate(30.0, 10.0), model.transmission_rate(30.0));

        // Inside the static window the dynamic policy stands down even
        // though the static one is disabled.
        assert_eq!(model.effective_rate(3.0, 50.0), model.transmission_rate(3.0));
    }

    #[test]
    fn reduction_is_never_compounded() {
        let mut model = SeirModel::default_covid_scenario();
        model.set_dynamic_distancing(true);

        // Static window active and infection load above the cutoff: the
        // factor applies once, not twice.
        let rate = model.effective_rate(3.0, 50.0);
        assert!((rate - 0.6 * model.transmission_rate(3.0)).abs() < 1e-12);
    }

    #[test]
    fn update_rejects_unknown_names_and_constants() {
        let mut model = SeirModel::default_covid_scenario();

        let before = model.value("max_R0");
        assert!(matches!(
            model.update("R0_max", 5.0),
            Err(SeirError::UnknownParam(_))
        ));
        assert_eq!(model.value("max_R0"), before);

        assert!(matches!(
            model.update("gamma", 2.0),
            Err(SeirError::UnknownParam(_))
        ));
        assert_eq!(model.value("gamma"), Some(7.0 / 5.0));
    }

    #[test]
    fn update_feeds_the_rate_functions() {
        let mut model = SeirModel::default_covid_scenario();
        model.update("sd_reduction", 0.5).unwrap();
        let inside = model.effective_rate(3.0, 0.0);
        assert!((inside - 0.5 * model.transmission_rate(3.0)).abs() < 1e-12);
    }

    #[test]
    fn derivatives_conserve_the_population() {
        let model = SeirModel::default_covid_scenario();
        let y = [
            9000.0, 40.0, 30.0, 20.0, 10.0, 500.0, 100.0, 50.0, 200.0, 30.0, 20.0,
        ];
        let total: f64 = model.rhs(3.0, &y).iter().sum();
        assert!(total.abs() < 1e-9, "net flow {total}");
    }
}
