/*!

Weekly trajectories produced by a model run: one series per compartment,
aligned with the sampled week numbers, plus the derived totals and
capacity readouts the presentation layer reports (currently infected,
critical-care load, weeks over capacity and the average load in them).

*/

use serde::Serialize;

/// Number of compartments in the state vector.
pub const NUM_COMPARTMENTS: usize = 11;

/// Column order of the state vector, used for row-oriented output. Must
/// match the field order of [`Trajectories`].
pub const COMPARTMENT_LABELS: [&str; NUM_COMPARTMENTS] = [
    "S", "E", "I_R", "I_H", "I_C", "R_R", "H_H", "H_C", "R_H", "C_C", "R_C",
];

/// Critical-care capacity, in beds per ten thousand people. U.S. figure
/// used as the reference line for the critical-load series.
pub const CRITICAL_CARE_BEDS_PER_10K: f64 = 0.89;

/// One compartment series per field, all of equal length and indexed by
/// `weeks`. Compartment values are real-valued person counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectories {
    /// Sampled week numbers, starting at zero.
    pub weeks: Vec<f64>,
    /// Calendar day of week zero, counted in days since 1970-01-01.
    pub start_day: i64,
    /// Population the run was scaled to.
    pub pop_size: f64,
    /// Susceptible.
    pub susceptible: Vec<f64>,
    /// Exposed, not yet infectious.
    pub exposed: Vec<f64>,
    /// Infectious, on the mild track.
    pub infectious_mild: Vec<f64>,
    /// Infectious, headed for a hospital ward.
    pub infectious_pre_hospital: Vec<f64>,
    /// Infectious, headed for critical care.
    pub infectious_pre_critical: Vec<f64>,
    /// Recovered from the mild track.
    pub recovered_mild: Vec<f64>,
    /// In a hospital ward, recovering there.
    pub hospitalized: Vec<f64>,
    /// In a hospital ward, deteriorating toward critical care.
    pub hospitalized_pre_critical: Vec<f64>,
    /// Recovered after a hospital stay.
    pub recovered_hospital: Vec<f64>,
    /// In critical care.
    pub critical: Vec<f64>,
    /// Recovered after critical care.
    pub recovered_critical: Vec<f64>,
}

impl Trajectories {
    /// Builds the per-compartment series from row-oriented solver output.
    /// Rows follow the [`COMPARTMENT_LABELS`] column order.
    pub(crate) fn from_rows(
        weeks: Vec<f64>,
        start_day: i64,
        pop_size: f64,
        rows: &[[f64; NUM_COMPARTMENTS]],
    ) -> Self {
        let mut series: [Vec<f64>; NUM_COMPARTMENTS] =
            std::array::from_fn(|_| Vec::with_capacity(rows.len()));
        for row in rows {
            for (column, values) in row.iter().zip(series.iter_mut()) {
                values.push(*column);
            }
        }
        let [s, e, i_r, i_h, i_c, r_r, h_h, h_c, r_h, c_c, r_c] = series;
        Trajectories {
            weeks,
            start_day,
            pop_size,
            susceptible: s,
            exposed: e,
            infectious_mild: i_r,
            infectious_pre_hospital: i_h,
            infectious_pre_critical: i_c,
            recovered_mild: r_r,
            hospitalized: h_h,
            hospitalized_pre_critical: h_c,
            recovered_hospital: r_h,
            critical: c_c,
            recovered_critical: r_c,
        }
    }

    /// Number of sampled weeks, including week zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    /// Calendar days corresponding to each sampled week.
    #[must_use]
    pub fn days(&self) -> Vec<i64> {
        self.weeks
            .iter()
            .map(|week| self.start_day + (week * 7.0).round() as i64)
            .collect()
    }

    /// Everyone currently infectious, regardless of eventual track.
    #[must_use]
    pub fn total_infected(&self) -> Vec<f64> {
        self.infectious_mild
            .iter()
            .zip(&self.infectious_pre_hospital)
            .zip(&self.infectious_pre_critical)
            .map(|((mild, hospital), critical)| mild + hospital + critical)
            .collect()
    }

    /// Current and incoming critical-care load: those in critical care
    /// plus those on the way there.
    #[must_use]
    pub fn total_critical(&self) -> Vec<f64> {
        self.infectious_pre_critical
            .iter()
            .zip(&self.hospitalized_pre_critical)
            .zip(&self.critical)
            .map(|((infectious, ward), unit)| infectious + ward + unit)
            .collect()
    }

    /// Critical-care beds available at this run's population.
    #[must_use]
    pub fn critical_care_capacity(&self) -> f64 {
        CRITICAL_CARE_BEDS_PER_10K * self.pop_size / 10_000.0
    }

    /// How many sampled weeks the critical-care load exceeds capacity.
    #[must_use]
    pub fn weeks_above_critical_capacity(&self) -> usize {
        let capacity = self.critical_care_capacity();
        self.total_critical()
            .iter()
            .filter(|&&load| load > capacity)
            .count()
    }

    /// Mean critical-care load across the sampled weeks where the load
    /// exceeds capacity, or `None` when capacity holds throughout. The
    /// bed-shortage readout next to the week count.
    #[must_use]
    pub fn average_critical_overload(&self) -> Option<f64> {
        let capacity = self.critical_care_capacity();
        let overloaded: Vec<f64> = self
            .total_critical()
            .into_iter()
            .filter(|&load| load > capacity)
            .collect();
        if overloaded.is_empty() {
            return None;
        }
        Some(overloaded.iter().sum::<f64>() / overloaded.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_rows(n: usize) -> Vec<[f64; NUM_COMPARTMENTS]> {
        (0..n)
            .map(|row| std::array::from_fn(|column| (row * NUM_COMPARTMENTS + column) as f64))
            .collect()
    }

    #[test]
    fn rows_are_distributed_into_columns() {
        let rows = counting_rows(3);
        let trajectories = Trajectories::from_rows(vec![0.0, 1.0, 2.0], 0, 100.0, &rows);

        assert_eq!(trajectories.len(), 3);
        assert_eq!(trajectories.susceptible, vec![0.0, 11.0, 22.0]);
        assert_eq!(trajectories.exposed, vec![1.0, 12.0, 23.0]);
        assert_eq!(trajectories.recovered_critical, vec![10.0, 21.0, 32.0]);
    }

    #[test]
    fn days_step_by_seven_from_the_start_day() {
        let trajectories =
            Trajectories::from_rows(vec![0.0, 1.0, 2.0], 18332, 100.0, &counting_rows(3));
        assert_eq!(trajectories.days(), vec![18332, 18339, 18346]);
    }

    #[test]
    fn derived_totals_sum_the_right_tracks() {
        let rows = [[0.0, 0.0, 1.0, 2.0, 3.0, 0.0, 0.0, 4.0, 0.0, 5.0, 0.0]];
        let trajectories = Trajectories::from_rows(vec![0.0], 0, 100.0, &rows);

        // I_R + I_H + I_C and I_C + H_C + C_C.
        assert_eq!(trajectories.total_infected(), vec![6.0]);
        assert_eq!(trajectories.total_critical(), vec![12.0]);
    }

    #[test]
    fn capacity_scales_with_population() {
        let trajectories = Trajectories::from_rows(vec![], 0, 10_000.0, &[]);
        assert!((trajectories.critical_care_capacity() - 0.89).abs() < 1e-12);
    }

    #[test]
    fn weeks_above_capacity_counts_strict_exceedance() {
        let mut trajectories = Trajectories::from_rows(vec![0.0, 1.0, 2.0], 0, 10_000.0, &[]);
        trajectories.infectious_pre_critical = vec![0.0, 0.0, 0.0];
        trajectories.hospitalized_pre_critical = vec![0.0, 0.0, 0.0];
        trajectories.critical = vec![0.5, 0.89, 1.2];

        // Capacity is 0.89 here; equality does not count as exceedance.
        assert_eq!(trajectories.weeks_above_critical_capacity(), 1);
    }

    #[test]
    fn average_overload_means_only_the_exceeding_weeks() {
        let mut trajectories =
            Trajectories::from_rows(vec![0.0, 1.0, 2.0, 3.0], 0, 10_000.0, &[]);
        trajectories.infectious_pre_critical = vec![0.0, 0.0, 0.0, 0.0];
        trajectories.hospitalized_pre_critical = vec![0.0, 0.0, 0.0, 0.0];
        trajectories.critical = vec![0.5, 0.89, 1.2, 2.0];

        // Only 1.2 and 2.0 exceed the 0.89 capacity; 0.89 itself does not.
        let average = trajectories.average_critical_overload().unwrap();
        assert!((average - 1.6).abs() < 1e-12);
    }

    #[test]
    fn average_overload_is_none_when_capacity_holds() {
        let mut trajectories = Trajectories::from_rows(vec![0.0, 1.0], 0, 10_000.0, &[]);
        trajectories.infectious_pre_critical = vec![0.0, 0.0];
        trajectories.hospitalized_pre_critical = vec![0.0, 0.0];
        trajectories.critical = vec![0.1, 0.89];

        assert_eq!(trajectories.average_critical_overload(), None);
    }
}
