use nalgebra::{DMatrix, DVector};

use crate::model::{Compartments, Matrix, Vector, NSTATES};

/// Closed-form propagation of the affine system `dS/dt = A·S + b`
///
/// The constant term is folded into an augmented matrix `[[A, b], [0, 0]]` acting on `[S, 1]`, so a
/// step of length `h` is a single product with `exp(h·M)`. The propagator is cached for the last
/// span, which makes evenly spaced grids cost one matrix exponential.
pub(crate) struct ExactStepper {
    generator: DMatrix<f64>,
    cached: Option<(f64, DMatrix<f64>)>,
}

impl ExactStepper {
    pub(crate) fn new(a: &Matrix, b: &Vector) -> Self {
        let mut generator = DMatrix::zeros(NSTATES + 1, NSTATES + 1);
        for i in 0..NSTATES {
            for j in 0..NSTATES {
                generator[(i, j)] = a[(i, j)];
            }
            generator[(i, NSTATES)] = b[i];
        }
        ExactStepper {
            generator,
            cached: None,
        }
    }

    fn propagator(&mut self, span: f64) -> &DMatrix<f64> {
        let stale = match &self.cached {
            Some((cached_span, _)) => cached_span.to_bits() != span.to_bits(),
            None => true,
        };
        if stale {
            tracing::trace!("Computing propagator for a span of {}", span);
            self.cached = None;
        }
        let generator = &self.generator;
        &self
            .cached
            .get_or_insert_with(|| (span, (generator * span).exp()))
            .1
    }

    pub(crate) fn advance(&mut self, x: Compartments, span: f64) -> Compartments {
        let mut augmented = DVector::zeros(NSTATES + 1);
        for (i, value) in x.as_slice().iter().enumerate() {
            augmented[i] = *value;
        }
        augmented[NSTATES] = 1.0;

        let y = self.propagator(span) * augmented;
        let mut state = [0.0; NSTATES];
        state.copy_from_slice(&y.as_slice()[..NSTATES]);
        Compartments::new(state)
    }
}
