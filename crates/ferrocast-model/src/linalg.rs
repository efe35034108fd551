//! Dense symmetric positive-definite solve.

use ndarray::{Array1, Array2};

use ferrocast_core::ModelError;

/// Solves `a · x = b` for symmetric positive-definite `a` via its Cholesky
/// factor `a = L · Lᵀ`.
///
/// # Errors
///
/// [`ModelError::Singular`] when a pivot is not strictly positive.
pub(crate) fn cholesky_solve(
    a: &Array2<f64>,
    b: &Array1<f64>,
) -> Result<Array1<f64>, ModelError> {
    let n = a.nrows();
    if a.ncols() != n || b.len() != n {
        return Err(ModelError::DegenerateInput(format!(
            "cannot solve a {}x{} system against {} values",
            a.nrows(),
            a.ncols(),
            b.len()
        )));
    }

    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut diagonal = a[[j, j]];
        for k in 0..j {
            diagonal -= l[[j, k]] * l[[j, k]];
        }
        if !(diagonal > 0.0 && diagonal.is_finite()) {
            return Err(ModelError::Singular { pivot: j });
        }
        let pivot = diagonal.sqrt();
        l[[j, j]] = pivot;

        for i in (j + 1)..n {
            let mut value = a[[i, j]];
            for k in 0..j {
                value -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = value / pivot;
        }
    }

    // L · z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut value = b[i];
        for k in 0..i {
            value -= l[[i, k]] * z[k];
        }
        z[i] = value / l[[i, i]];
    }

    // Lᵀ · x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut value = z[i];
        for k in (i + 1)..n {
            value -= l[[k, i]] * x[k];
        }
        x[i] = value / l[[i, i]];
    }

    Ok(x)
}
