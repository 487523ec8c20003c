/*!

An adaptive Dormand-Prince 5(4) integrator for small fixed-size systems.
The state is a `[f64; N]`, which keeps the stage arithmetic on the stack
and lets the compiler unroll it for the system sizes used here.

Step size is controlled by the embedded fourth-order error estimate under
a scaled RMS norm; steps are shortened to land exactly on each requested
sample time, so no interpolation is involved.

*/

use crate::error::SeirError;
use crate::log::{debug, trace};

// Butcher tableau for the Dormand-Prince 5(4) pair.
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// Fifth-order solution weights. B2 is zero and omitted.
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// Difference between the fifth- and fourth-order weights. E2 is zero.
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;

/// Tolerances and the step budget for one integration.
#[derive(Debug, Clone, Copy)]
pub struct SolverOptions {
    /// Relative tolerance on the per-step error estimate.
    pub rtol: f64,
    /// Absolute tolerance floor, guarding components near zero.
    pub atol: f64,
    /// Hard cap on attempted steps across the whole integration.
    pub max_steps: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            rtol: 1e-3,
            atol: 1e-6,
            max_steps: 100_000,
        }
    }
}

/// Integrates `dy/dt = rhs(t, y)` from `(t0, y0)`, returning one state per
/// entry of `sample_times`.
///
/// `sample_times` must be non-decreasing and start at or after `t0`. A
/// sample equal to the current time yields the current state, so passing
/// `t0` as the first sample returns `y0` unchanged.
///
/// # Errors
///
/// [`SeirError::Integration`] if the step size underflows, the step budget
/// is exhausted, or the solution leaves the realm of finite numbers.
pub fn integrate<const N: usize, F>(
    mut rhs: F,
    t0: f64,
    y0: [f64; N],
    sample_times: &[f64],
    options: &SolverOptions,
) -> Result<Vec<[f64; N]>, SeirError>
where
    F: FnMut(f64, &[f64; N]) -> [f64; N],
{
    let mut results = Vec::with_capacity(sample_times.len());
    let mut t = t0;
    let mut y = y0;
    let mut k1 = rhs(t, &y);
    let mut h = initial_step(&y, &k1, options);
    let mut steps = 0_usize;
    let mut rejected_last = false;

    for &target in sample_times {
        if target < t {
            return Err(SeirError::Integration(format!(
                "sample time {target} precedes current time {t}"
            )));
        }

        while t < target {
            if steps >= options.max_steps {
                return Err(SeirError::Integration(format!(
                    "exceeded {} steps before reaching t = {target}",
                    options.max_steps
                )));
            }
            steps += 1;

            let lands_on_target = t + h >= target;
            let h_step = if lands_on_target { target - t } else { h };
            if h_step <= f64::EPSILON * t.abs().max(1.0) {
                return Err(SeirError::Integration(format!(
                    "step size underflow at t = {t}"
                )));
            }

            let mut stage = [0.0_f64; N];

            for i in 0..N {
                stage[i] = y[i] + h_step * A21 * k1[i];
            }
            let k2 = rhs(t + C2 * h_step, &stage);

            for i in 0..N {
                stage[i] = y[i] + h_step * (A31 * k1[i] + A32 * k2[i]);
            }
            let k3 = rhs(t + C3 * h_step, &stage);

            for i in 0..N {
                stage[i] = y[i] + h_step * (A41 * k1[i] + A42 * k2[i] + A43 * k3[i]);
            }
            let k4 = rhs(t + C4 * h_step, &stage);

            for i in 0..N {
                stage[i] = y[i]
                    + h_step * (A51 * k1[i] + A52 * k2[i] + A53 * k3[i] + A54 * k4[i]);
            }
            let k5 = rhs(t + C5 * h_step, &stage);

            for i in 0..N {
                stage[i] = y[i]
                    + h_step
                        * (A61 * k1[i] + A62 * k2[i] + A63 * k3[i] + A64 * k4[i]
                            + A65 * k5[i]);
            }
            let k6 = rhs(t + h_step, &stage);

            let mut y_new = [0.0_f64; N];
            for i in 0..N {
                y_new[i] = y[i]
                    + h_step
                        * (B1 * k1[i] + B3 * k3[i] + B4 * k4[i] + B5 * k5[i] + B6 * k6[i]);
            }
            // First-same-as-last: k7 doubles as k1 of the next step.
            let k7 = rhs(t + h_step, &y_new);

            let mut error_sq = 0.0_f64;
            for i in 0..N {
                let err = h_step
                    * (E1 * k1[i] + E3 * k3[i] + E4 * k4[i] + E5 * k5[i] + E6 * k6[i]
                        + E7 * k7[i]);
                let scale = options.atol + options.rtol * y[i].abs().max(y_new[i].abs());
                error_sq += (err / scale) * (err / scale);
            }
            let norm = (error_sq / N as f64).sqrt();

            if norm <= 1.0 {
                t = if lands_on_target { target } else { t + h_step };
                y = y_new;
                k1 = k7;
                if y.iter().any(|component| !component.is_finite()) {
                    return Err(SeirError::Integration(format!(
                        "solution became non-finite at t = {t}"
                    )));
                }
                let mut factor = if norm == 0.0 {
                    MAX_FACTOR
                } else {
                    (SAFETY * norm.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
                };
                if rejected_last {
                    factor = factor.min(1.0);
                }
                h = h_step * factor;
                rejected_last = false;
            } else {
                // A non-finite norm shrinks at the floor rate like any
                // hopeless step; persistent blow-up ends in underflow.
                let factor = if norm.is_finite() {
                    (SAFETY * norm.powf(-0.2)).max(MIN_FACTOR)
                } else {
                    MIN_FACTOR
                };
                h = h_step * factor;
                rejected_last = true;
                trace!("step rejected at t = {t}: error norm {norm}, retrying with h = {h}");
            }
        }

        results.push(y);
    }

    debug!(
        "integration complete: {steps} steps for {} samples",
        results.len()
    );
    Ok(results)
}

/// First-step guess from the relative size of the state and its
/// derivative, capped so tiny derivatives cannot produce a wild step.
/// The controller refines it within a few steps either way.
fn initial_step<const N: usize>(y0: &[f64; N], f0: &[f64; N], options: &SolverOptions) -> f64 {
    let mut d0_sq = 0.0_f64;
    let mut d1_sq = 0.0_f64;
    for i in 0..N {
        let scale = options.atol + options.rtol * y0[i].abs();
        d0_sq += (y0[i] / scale) * (y0[i] / scale);
        d1_sq += (f0[i] / scale) * (f0[i] / scale);
    }
    let d0 = (d0_sq / N as f64).sqrt();
    let d1 = (d1_sq / N as f64).sqrt();
    if d0 < 1e-5 || d1 < 1e-5 {
        1e-6
    } else {
        0.01 * d0 / d1
    }
}
