use std::{collections::BTreeMap, sync::Arc};

use braid_automata::{CompositeTransition, Event, Mode};
use braid_core::{EvalError, Expr, Guard, Interval, Sense, Valuation, VectorField};

/// Relative tolerance when matching the gains of different state variables.
const GAIN_TOL: f64 = 1e-12;

/// Returns the events of a mode's outgoing transitions if none of them can
/// ever become enabled from `state` and at least one is urgent.
///
/// A guard is provably unreachable when one of its comparisons is false
/// everywhere on `state` and its residual `r` obeys an affine law
/// `r' = c r + k` under the mode's flow that keeps it on the false side.
pub(super) fn unreachable_guards<V>(mode: &Mode, state: &V) -> Result<Option<Vec<Event>>, EvalError>
where
    V: Valuation<Interval> + ?Sized,
{
    let transitions = mode.transitions();
    if !transitions.iter().any(CompositeTransition::is_urgent) {
        return Ok(None);
    }
    for transition in transitions {
        if !never_enabled(mode, &transition.guard, state)? {
            return Ok(None);
        }
    }
    Ok(Some(transitions.iter().map(|t| t.event.clone()).collect()))
}

#[allow(clippy::float_cmp)]
fn never_enabled<V>(mode: &Mode, guard: &Guard, state: &V) -> Result<bool, EvalError>
where
    V: Valuation<Interval> + ?Sized,
{
    for comparison in guard.comparisons() {
        let value: Interval = comparison.residual.eval(state)?;
        // Signed distance to the boundary, positive on the false side.
        let (distance, sign) = match comparison.sense {
            Sense::NonPositive => (value.lo(), 1.0),
            Sense::NonNegative => (-value.hi(), -1.0),
        };
        if distance <= 0.0 {
            continue;
        }

        let residual = mode.inline(&comparison.residual);
        let rate = mode.lie_derivative(&comparison.residual);
        let Some((gain, offset)) = affine_rate(mode, &residual, &rate) else {
            continue;
        };

        // With d = sign * r, the distance obeys d' = gain * d + sign * offset.
        let offset = sign * offset;
        let diverging = if gain == 0.0 {
            offset >= 0.0
        } else {
            let rest = -offset / gain;
            if gain > 0.0 { distance >= rest } else { rest >= 0.0 }
        };
        if diverging {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Writes `rate` as `gain * residual + offset` when both are affine in the
/// state and their slopes are proportional.
#[allow(clippy::float_cmp)]
fn affine_rate(mode: &Mode, residual: &Expr, rate: &Expr) -> Option<(f64, f64)> {
    let mut gain: Option<f64> = None;
    for variable in mode.space().variables() {
        let slope = constant(&residual.derivative(variable.name()))?;
        let rate_slope = constant(&rate.derivative(variable.name()))?;
        if slope == 0.0 {
            if rate_slope != 0.0 {
                return None;
            }
            continue;
        }
        let ratio = rate_slope / slope;
        match gain {
            None => gain = Some(ratio),
            Some(g) if (g - ratio).abs() <= GAIN_TOL * g.abs().max(ratio.abs()).max(1.0) => {}
            Some(_) => return None,
        }
    }
    let gain = gain.unwrap_or(0.0);

    let origin: BTreeMap<Arc<str>, f64> = mode
        .space()
        .variables()
        .iter()
        .map(|v| (v.key().clone(), 0.0))
        .collect();
    let at_rate: f64 = rate.eval(&origin).ok()?;
    let at_residual: f64 = residual.eval(&origin).ok()?;
    let offset = at_rate - gain * at_residual;
    offset.is_finite().then_some((gain, offset))
}

fn constant(expr: &Expr) -> Option<f64> {
    if !expr.is_constant() {
        return None;
    }
    expr.eval(&BTreeMap::<Arc<str>, f64>::new()).ok()
}
