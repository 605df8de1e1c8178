//! Calibration polynomials applied to decoded m/z values.

use serde::Serialize;

use super::header::CoefficientSet;

/// Number of primary calibration coefficients.
pub const CALIBRATION_TERMS: usize = 6;

/// Primary per-function calibration.
///
/// With a negative second coefficient the curve is a degree-4 polynomial in m/z;
/// otherwise it is the square of a polynomial in `sqrt(m/z)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Calibration {
    coefficients: [f64; CALIBRATION_TERMS],
}

impl Calibration {
    /// Coefficient set `[1, 0, 0, 0, 0, 0]`, which leaves m/z untouched.
    pub fn identity() -> Self {
        let mut coefficients = [0.0; CALIBRATION_TERMS];
        coefficients[0] = 1.0;
        Self { coefficients }
    }

    /// Build from a parsed line: zero-pad to six terms, force `c0 = 1` on an
    /// all-zero set, negate `c1` for `T0` lines.
    pub fn from_set(set: &CoefficientSet) -> Self {
        let mut coefficients = [0.0; CALIBRATION_TERMS];
        for (slot, &c) in coefficients.iter_mut().zip(set.coefficients.iter()) {
            *slot = c;
        }
        if coefficients.iter().all(|&c| c == 0.0) {
            coefficients[0] = 1.0;
        }
        if set.tag == Some(0) {
            coefficients[1] = -coefficients[1];
        }
        Self { coefficients }
    }

    /// Raw coefficients after normalisation.
    pub fn coefficients(&self) -> &[f64; CALIBRATION_TERMS] {
        &self.coefficients
    }

    /// True for the degenerate `[1, 0, 0, 0, 0, 0]` set.
    pub fn is_identity(&self) -> bool {
        self.coefficients[0] == 1.0 && self.coefficients[1..].iter().all(|&c| c == 0.0)
    }

    /// Calibrated m/z.
    pub fn apply(&self, mz: f64) -> f64 {
        if self.is_identity() {
            return mz;
        }
        let c = &self.coefficients;
        let m2 = mz * mz;
        if c[1] < 0.0 {
            c[0] - c[1] * mz + c[2] * m2 + c[3] * m2 * mz + c[4] * m2 * m2
        } else {
            let s = mz.sqrt();
            let v = c[0] + c[1] * s + c[2] * mz + c[3] * s * mz + c[4] * m2 + c[5] * m2 * s;
            v * v
        }
    }
}

/// Secondary correction layered on top of [`Calibration`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Modification {
    /// `T0`: plain polynomial in m/z.
    Polynomial(Vec<f64>),
    /// `T1`: squared polynomial in `sqrt(m/z)`.
    SquareRoot(Vec<f64>),
}

impl Modification {
    /// Build from a parsed `Cal Modification` line.
    ///
    /// Returns `None` for tags other than `T0`/`T1`, and for sets that leave m/z
    /// unchanged (`[0]`, or `[0, 1, 0, ...]`).
    pub fn from_set(set: &CoefficientSet) -> Option<Self> {
        let c = &set.coefficients;
        let no_op = match c.len() {
            0 => true,
            1 => c[0] == 0.0,
            _ => {
                c.iter().enumerate().all(|(i, &v)| i == 1 || v == 0.0)
                    && (c[1] == 1.0 || c[1] == 0.0)
            }
        };
        if no_op {
            return None;
        }
        match set.tag {
            Some(0) => Some(Modification::Polynomial(c.clone())),
            Some(1) => Some(Modification::SquareRoot(c.clone())),
            _ => None,
        }
    }

    /// Corrected m/z.
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Modification::Polynomial(c) => horner(c, x),
            Modification::SquareRoot(c) => {
                let v = horner(c, x.sqrt());
                v * v
            }
        }
    }
}

fn horner(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// Calibration in effect for one function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCalibration {
    /// Primary curve
    pub primary: Calibration,
    /// Optional modification applied to the primary result
    pub modification: Option<Modification>,
}

impl FunctionCalibration {
    /// Calibrate one decoded m/z value.
    pub fn apply(&self, mz: f64) -> f64 {
        let v = self.primary.apply(mz);
        match &self.modification {
            Some(m) => m.apply(v),
            None => v,
        }
    }

    /// Calibrate a slice of m/z values in place.
    pub fn apply_all(&self, mz: &mut [f64]) {
        for v in mz.iter_mut() {
            *v = self.apply(*v);
        }
    }
}
