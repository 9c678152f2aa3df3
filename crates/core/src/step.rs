use crate::Scalar;

/// A trait for types that can be stepped using their derivative.
///
/// Implementing this trait enables generic ODE solvers to work with the type by
/// stepping it via `derivative * delta`, where the derivative is with respect
/// to `Delta`.
pub trait StepIntegrable<Delta> {
    /// The derivative of the type with respect to `Delta`.
    type Derivative;

    /// Returns the value after stepping with a derivative and step size.
    #[must_use]
    fn step(&self, derivative: &Self::Derivative, delta: Delta) -> Self;
}

/// State vectors step coordinate-wise: `x + dx * delta`.
impl<T: Scalar> StepIntegrable<f64> for Vec<T> {
    type Derivative = Vec<T>;

    fn step(&self, derivative: &Vec<T>, delta: f64) -> Self {
        self.iter()
            .zip(derivative)
            .map(|(x, dx)| x.clone() + dx.clone() * T::constant(delta))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::Interval;

    #[test]
    fn step_point_vector() {
        let state = vec![1.0, 2.0, 3.0];
        let deriv = vec![0.1, 0.2, 0.3];

        let next = state.step(&deriv, 10.0);

        assert_eq!(next, vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn step_interval_vector() {
        let state = vec![Interval::new(0.0, 1.0).unwrap()];
        let deriv = vec![Interval::new(-1.0, 1.0).unwrap()];

        let next = state.step(&deriv, 0.5);

        assert_eq!(next, vec![Interval::new(-0.5, 1.5).unwrap()]);
    }
}
