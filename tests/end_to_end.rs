//! Full solves of the reference scenario and randomized variants,
//! checking the structural guarantees of the trajectories.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use seir_core::{NUM_COMPARTMENTS, SeirModel, Trajectories};

/// Absolute slack, in persons, allowed on conservation and range checks.
/// The integrator does not floor compartments at zero, so tiny negative
/// transients are within contract.
const SLACK: f64 = 1.0;

fn compartment_sum(trajectories: &Trajectories, week: usize) -> f64 {
    [
        &trajectories.susceptible,
        &trajectories.exposed,
        &trajectories.infectious_mild,
        &trajectories.infectious_pre_hospital,
        &trajectories.infectious_pre_critical,
        &trajectories.recovered_mild,
        &trajectories.hospitalized,
        &trajectories.hospitalized_pre_critical,
        &trajectories.recovered_hospital,
        &trajectories.critical,
        &trajectories.recovered_critical,
    ]
    .iter()
    .map(|series| series[week])
    .sum()
}

fn assert_conserved(trajectories: &Trajectories, pop_size: f64) {
    for week in 0..trajectories.len() {
        let total = compartment_sum(trajectories, week);
        assert!(
            (total - pop_size).abs() < SLACK,
            "week {week}: population drifted to {total}"
        );
    }
}

#[test]
fn reference_scenario_produces_a_full_set_of_weekly_series() {
    let model = SeirModel::default_covid_scenario();
    let trajectories = model.solve().unwrap();

    assert_eq!(trajectories.len(), 105);
    assert_eq!(trajectories.weeks[0], 0.0);
    assert_eq!(trajectories.weeks[104], 104.0);

    let series: [&[f64]; NUM_COMPARTMENTS] = [
        &trajectories.susceptible,
        &trajectories.exposed,
        &trajectories.infectious_mild,
        &trajectories.infectious_pre_hospital,
        &trajectories.infectious_pre_critical,
        &trajectories.recovered_mild,
        &trajectories.hospitalized,
        &trajectories.hospitalized_pre_critical,
        &trajectories.recovered_hospital,
        &trajectories.critical,
        &trajectories.recovered_critical,
    ];
    for values in series {
        assert_eq!(values.len(), 105);
        for &value in values {
            assert!(value.is_finite());
            assert!(value > -SLACK && value < 10_000.0 + SLACK, "out of range: {value}");
        }
    }

    // One exposed individual seeds the outbreak.
    assert_eq!(trajectories.exposed[0], 1.0);
    assert_eq!(trajectories.susceptible[0], 9_999.0);
}

#[test]
fn population_is_conserved_every_week() {
    let trajectories = SeirModel::default_covid_scenario().solve().unwrap();
    assert_conserved(&trajectories, 10_000.0);
}

#[test]
fn recovered_compartments_never_shrink() {
    let trajectories = SeirModel::default_covid_scenario().solve().unwrap();
    for series in [
        &trajectories.recovered_mild,
        &trajectories.recovered_hospital,
        &trajectories.recovered_critical,
    ] {
        for window in series.windows(2) {
            assert!(
                window[1] >= window[0] - 1e-6,
                "recovered series decreased: {} -> {}",
                window[0],
                window[1]
            );
        }
    }
}

#[test]
fn solving_twice_gives_identical_trajectories() {
    let model = SeirModel::default_covid_scenario();
    let first = model.solve().unwrap();
    let second = model.solve().unwrap();
    assert_eq!(first, second);
}

#[test]
fn updated_parameters_change_the_outcome() {
    let mut model = SeirModel::default_covid_scenario();
    let baseline = model.solve().unwrap();

    model.update("sd_reduction", 0.9).unwrap();
    model.update("sd_duration", 30.0).unwrap();
    let mitigated = model.solve().unwrap();

    assert_ne!(baseline, mitigated);
    assert_conserved(&mitigated, 10_000.0);
}

#[test]
fn dynamic_policy_scenario_solves_cleanly() {
    let mut model = SeirModel::default_covid_scenario();
    model.set_static_distancing(false);
    model.set_dynamic_distancing(true);

    let trajectories = model.solve().unwrap();
    assert_eq!(trajectories.len(), 105);
    assert_conserved(&trajectories, 10_000.0);
}

#[test]
fn reference_outbreak_overwhelms_critical_care() {
    let trajectories = SeirModel::default_covid_scenario().solve().unwrap();
    // Capacity is 0.89 beds here, far below the epidemic peak.
    assert!((trajectories.critical_care_capacity() - 0.89).abs() < 1e-12);
    assert!(trajectories.weeks_above_critical_capacity() > 0);

    // A mean taken over above-capacity weeks sits above capacity itself.
    let average = trajectories.average_critical_overload().unwrap();
    assert!(average > trajectories.critical_care_capacity());
}

#[test]
fn calendar_days_span_the_horizon() {
    let trajectories = SeirModel::default_covid_scenario().solve().unwrap();
    let days = trajectories.days();
    assert_eq!(days[0], 18_332);
    assert_eq!(days[104], 18_332 + 7 * 104);
}

#[test]
fn random_in_bounds_parameters_solve_and_conserve() {
    let mut rng = StdRng::seed_from_u64(17);

    for round in 0..10 {
        let mut model = SeirModel::default_covid_scenario();
        model.set_dynamic_distancing(rng.random_bool(0.5));

        let draws: Vec<(String, f64)> = model
            .params()
            .tunable()
            .map(|param| {
                let value = rng.random_range(param.min_value()..=param.max_value());
                (param.name().to_string(), value)
            })
            .collect();
        for (name, value) in &draws {
            model.update(name, *value).unwrap();
        }

        let trajectories = model
            .solve()
            .unwrap_or_else(|error| panic!("round {round} failed with {draws:?}: {error}"));
        assert_conserved(&trajectories, 10_000.0);
    }
}
