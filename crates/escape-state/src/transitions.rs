//! Stress-interpolated state transition matrix
//! (`original_source/model/states/transitions.hpp`).

use escape_core::AgentRng;

use crate::error::{StateError, StateResult};

/// A row-stochastic `k x k` matrix of per-state transition weights.
///
/// Rows need not sum to 1 on construction — sampling normalizes, and an
/// all-zero row is treated as uniform over its `k` entries.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionMatrix {
    k: usize,
    cells: Vec<f32>,
}

impl TransitionMatrix {
    pub fn new(k: usize, cells: Vec<f32>) -> StateResult<Self> {
        if cells.len() != k * k {
            return Err(StateError::MatrixSizeMismatch { rows: cells.len() / k.max(1), cols: k, expected: k });
        }
        Ok(TransitionMatrix { k, cells })
    }

    /// Parse one `K x K` matrix from a JSON array of `K` row arrays, each
    /// of `K` numbers (`Prey.transitions.TM[i]`).
    pub fn from_json(j: &serde_json::Value) -> StateResult<Self> {
        let rows = j
            .as_array()
            .ok_or_else(|| StateError::Config("transition matrix must be a JSON array of rows".into()))?;
        let k = rows.len();
        let mut cells = Vec::with_capacity(k * k);
        for (r, row) in rows.iter().enumerate() {
            let row = row
                .as_array()
                .ok_or_else(|| StateError::Config(format!("transition matrix row {r} is not an array")))?;
            if row.len() != k {
                return Err(StateError::MatrixSizeMismatch { rows: k, cols: row.len(), expected: k });
            }
            for cell in row {
                cells.push(cell.as_f64().ok_or_else(|| StateError::Config("transition matrix cell is not a number".into()))? as f32);
            }
        }
        TransitionMatrix::new(k, cells)
    }

    pub fn identity(k: usize) -> Self {
        let mut cells = vec![0.0; k * k];
        for i in 0..k {
            cells[i * k + i] = 1.0;
        }
        TransitionMatrix { k, cells }
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn row(&self, state: usize) -> &[f32] {
        &self.cells[state * self.k..(state + 1) * self.k]
    }

    fn lerp(a: &TransitionMatrix, b: &TransitionMatrix, t: f32) -> TransitionMatrix {
        let cells = a.cells.iter().zip(&b.cells).map(|(x, y)| x + (y - x) * t).collect();
        TransitionMatrix { k: a.k, cells }
    }

    /// Sample the next state index from `row(state)`, with an all-zero row
    /// treated as uniform over all `k` states.
    pub fn sample(&self, state: usize, rng: &mut AgentRng) -> usize {
        let row = self.row(state);
        let total: f32 = row.iter().sum();
        if total <= 0.0 {
            return rng.gen_range(0..self.k);
        }
        let mut x = rng.gen_range(0.0..total);
        for (i, &w) in row.iter().enumerate() {
            if x < w {
                return i;
            }
            x -= w;
        }
        self.k - 1
    }
}

/// A transition model over a stress-like scalar `x`.
pub enum TransitionModel {
    Constant(TransitionMatrix),
    PiecewiseLinear { edges: Vec<f32>, matrices: Vec<TransitionMatrix> },
}

impl TransitionModel {
    pub fn constant(tm: TransitionMatrix) -> Self {
        TransitionModel::Constant(tm)
    }

    pub fn piecewise_linear(edges: Vec<f32>, matrices: Vec<TransitionMatrix>) -> StateResult<Self> {
        if edges.is_empty() {
            return Err(StateError::NoEdges);
        }
        if edges.len() != matrices.len() {
            return Err(StateError::EdgeMatrixMismatch { edges: edges.len(), matrices: matrices.len() });
        }
        for w in edges.windows(2) {
            if w[1] <= w[0] {
                return Err(StateError::Config("transition edges must be strictly ascending".into()));
            }
        }
        let k = matrices[0].k();
        if matrices.iter().any(|m| m.k() != k) {
            return Err(StateError::Config("all transition matrices in a piecewise model must share state count".into()));
        }
        Ok(TransitionModel::PiecewiseLinear { edges, matrices })
    }

    pub fn k(&self) -> usize {
        match self {
            TransitionModel::Constant(tm) => tm.k(),
            TransitionModel::PiecewiseLinear { matrices, .. } => matrices[0].k(),
        }
    }

    /// Parse a `Prey.transitions` / `Pred.transitions` config section:
    /// `{"name": "constant", "TM": [matrix]}` or `{"name":
    /// "piecewise_linear_interpolator", "edges": [...], "TM": [matrix, ...]}`.
    pub fn from_json(j: &serde_json::Value) -> StateResult<Self> {
        let name = j
            .get("name")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| StateError::Config("transitions section missing \"name\"".into()))?;
        let tm_arr = j
            .get("TM")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| StateError::Config("transitions section missing \"TM\"".into()))?;
        let matrices = tm_arr.iter().map(TransitionMatrix::from_json).collect::<StateResult<Vec<_>>>()?;

        match name {
            "constant" => {
                let tm = matrices
                    .into_iter()
                    .next()
                    .ok_or_else(|| StateError::Config("\"constant\" transitions needs one TM entry".into()))?;
                Ok(TransitionModel::Constant(tm))
            }
            "piecewise_linear_interpolator" => {
                let edges = j
                    .get("edges")
                    .and_then(serde_json::Value::as_array)
                    .ok_or_else(|| StateError::Config("piecewise_linear_interpolator needs \"edges\"".into()))?
                    .iter()
                    .map(|v| v.as_f64().map(|f| f as f32).ok_or_else(|| StateError::Config("edge is not a number".into())))
                    .collect::<StateResult<Vec<f32>>>()?;
                TransitionModel::piecewise_linear(edges, matrices)
            }
            other => Err(StateError::Config(format!("unknown transitions type \"{other}\""))),
        }
    }

    /// The matrix at stress level `x`: a literal reference for `Constant`,
    /// or an interpolated matrix for `PiecewiseLinear` (binary search for
    /// the bracketing edges, clamped at the ends).
    pub fn at(&self, x: f32) -> TransitionMatrix {
        match self {
            TransitionModel::Constant(tm) => tm.clone(),
            TransitionModel::PiecewiseLinear { edges, matrices } => {
                match edges.binary_search_by(|e| e.partial_cmp(&x).unwrap()) {
                    Ok(i) => matrices[i].clone(),
                    Err(0) => matrices[0].clone(),
                    Err(i) if i >= edges.len() => matrices[edges.len() - 1].clone(),
                    Err(i) => {
                        let (a, b) = (i - 1, i);
                        let t = (x - edges[a]) / (edges[b] - edges[a]);
                        TransitionMatrix::lerp(&matrices[a], &matrices[b], t)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_always_returns_same_matrix() {
        let tm = TransitionMatrix::identity(2);
        let model = TransitionModel::constant(tm.clone());
        assert_eq!(model.at(-5.0), tm);
        assert_eq!(model.at(5.0), tm);
    }

    #[test]
    fn piecewise_interpolates_between_edges() {
        let identity = TransitionMatrix::identity(2);
        let uniform = TransitionMatrix::new(2, vec![0.5, 0.5, 0.5, 0.5]).unwrap();
        let model = TransitionModel::piecewise_linear(vec![0.0, 1.0], vec![identity.clone(), uniform.clone()]).unwrap();

        assert_eq!(model.at(0.0), identity);
        assert_eq!(model.at(1.0), uniform);
        assert_eq!(model.at(-1.0), identity);
        assert_eq!(model.at(2.0), uniform);

        let mid = model.at(0.5);
        for (c, (i, u)) in mid.cells.iter().zip(identity.cells.iter().zip(uniform.cells.iter())) {
            assert!((c - 0.5 * i - 0.5 * u).abs() < 1e-6);
        }
    }

    #[test]
    fn piecewise_rejects_mismatched_lengths() {
        let tm = TransitionMatrix::identity(2);
        let err = TransitionModel::piecewise_linear(vec![0.0, 1.0], vec![tm]).unwrap_err();
        assert!(matches!(err, StateError::EdgeMatrixMismatch { .. }));
    }

    #[test]
    fn piecewise_rejects_non_ascending_edges() {
        let tm = TransitionMatrix::identity(2);
        let err = TransitionModel::piecewise_linear(vec![1.0, 0.0], vec![tm.clone(), tm]).unwrap_err();
        assert!(matches!(err, StateError::Config(_)));
    }

    #[test]
    fn all_zero_row_samples_uniformly_over_many_draws() {
        let tm = TransitionMatrix::new(3, vec![0.0; 9]).unwrap();
        let mut rng = escape_core::AgentRng::new(7, escape_core::AgentId(0));
        let mut counts = [0u32; 3];
        for _ in 0..3000 {
            counts[tm.sample(1, &mut rng)] += 1;
        }
        for c in counts {
            assert!(c > 700 && c < 1300, "counts not roughly uniform: {counts:?}");
        }
    }

    #[test]
    fn weighted_row_favors_heavier_entry() {
        let tm = TransitionMatrix::new(2, vec![0.0, 0.0, 1.0, 9.0]).unwrap();
        let mut rng = escape_core::AgentRng::new(11, escape_core::AgentId(2));
        let mut hits = 0u32;
        for _ in 0..2000 {
            if tm.sample(1, &mut rng) == 1 {
                hits += 1;
            }
        }
        assert!(hits > 1600, "expected state 1 to dominate sampling, got {hits}/2000");
    }

    #[test]
    fn from_json_parses_constant() {
        let j = serde_json::json!({"name": "constant", "TM": [[[0.0, 1.0], [1.0, 0.0]]]});
        let model = TransitionModel::from_json(&j).unwrap();
        assert_eq!(model.k(), 2);
        assert_eq!(model.at(0.0), TransitionMatrix::new(2, vec![0.0, 1.0, 1.0, 0.0]).unwrap());
    }

    #[test]
    fn from_json_parses_piecewise_linear() {
        let j = serde_json::json!({
            "name": "piecewise_linear_interpolator",
            "edges": [0.0, 1.0],
            "TM": [
                [[1.0, 0.0], [0.0, 1.0]],
                [[0.5, 0.5], [0.5, 0.5]]
            ]
        });
        let model = TransitionModel::from_json(&j).unwrap();
        let mid = model.at(0.5);
        for c in mid.row(0) {
            assert!((c - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn from_json_rejects_unknown_name() {
        let j = serde_json::json!({"name": "warp", "TM": [[[1.0]]]});
        assert!(TransitionModel::from_json(&j).is_err());
    }

    #[test]
    fn matrix_from_json_rejects_ragged_rows() {
        let j = serde_json::json!([[1.0, 0.0], [1.0]]);
        assert!(TransitionMatrix::from_json(&j).is_err());
    }
}
