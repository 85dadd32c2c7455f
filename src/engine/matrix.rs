//! Full-sample pairwise correlation and beta matrices.

use super::returns::pct_change;
use super::stats;
use super::{AlignedPanel, EngineError};
use crate::asset_key::AssetKey;
use serde::{Deserialize, Serialize};

/// Symmetric Pearson correlation matrix with unit diagonal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    /// Asset keys in the panel's (caller-supplied) order
    pub assets: Vec<AssetKey>,
    /// `matrix[i][j]` = correlation of asset i's and asset j's returns
    pub matrix: Vec<Vec<f64>>,
}

/// OLS beta matrix. Unit diagonal by convention; not symmetric, since
/// `beta[i][j]` regresses asset i's returns on asset j's (the reference in
/// the column).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetaMatrix {
    /// Asset keys in the panel's (caller-supplied) order
    pub assets: Vec<AssetKey>,
    /// `matrix[i][j]` = beta of asset i against reference asset j
    pub matrix: Vec<Vec<f64>>,
}

/// Computes full-sample correlation and beta matrices over an aligned panel.
///
/// Each asset's value row is first converted to `periods`-day percent
/// changes; the statistics then run over the entire aligned history. The
/// diagonal is 1.0 by convention for both matrices, not a computed value.
/// Asset ordering follows the panel and is never re-sorted.
///
/// # Errors
/// Returns `EngineError::DivisionByZero` annotated with the asset key when
/// any value row contains a zero base (propagated from the return
/// transform). Degenerate statistics (flat return series) do not error;
/// they yield 0.0 cells per the shared formula contract.
pub fn build_matrices(
    panel: &AlignedPanel,
    periods: usize,
) -> Result<(CorrelationMatrix, BetaMatrix), EngineError> {
    let mut returns: Vec<Vec<f64>> = Vec::with_capacity(panel.assets.len());
    for (asset, values) in panel.assets.iter().zip(panel.values.iter()) {
        let changes = pct_change(values, periods).map_err(|e| match e {
            EngineError::DivisionByZero { index, .. } => EngineError::DivisionByZero {
                asset: Some(asset.to_string()),
                index,
            },
            other => other,
        })?;
        returns.push(changes);
    }

    let n = panel.assets.len();
    let mut correlation = vec![vec![0.0; n]; n];
    let mut beta = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..n {
            if i == j {
                correlation[i][j] = 1.0;
                beta[i][j] = 1.0;
            } else if j < i {
                // Correlation is symmetric; mirror instead of recomputing
                correlation[i][j] = correlation[j][i];
                beta[i][j] = stats::beta(&returns[i], &returns[j]);
            } else {
                correlation[i][j] = stats::pearson(&returns[i], &returns[j]);
                beta[i][j] = stats::beta(&returns[i], &returns[j]);
            }
        }
    }

    Ok((
        CorrelationMatrix {
            assets: panel.assets.clone(),
            matrix: correlation,
        },
        BetaMatrix {
            assets: panel.assets.clone(),
            matrix: beta,
        },
    ))
}
