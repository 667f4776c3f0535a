//! Collapses HF feature-extraction output to a flat embedding vector.
//!
//! The feature-extraction pipeline returns, depending on model and request:
//!
//! - rank 1: an already-pooled sentence embedding
//! - rank 2: per-token embeddings
//! - rank 3: a batch of per-token embeddings
//!
//! Downstream code always wants rank 1.

/// Normalizes a feature-extraction JSON payload to a flat `Vec<f32>`.
///
/// - scalar → single-element vector
/// - rank 3 → first batch element, then as rank 2
/// - rank 2 → mean-pool across the token axis (output width = inner width)
/// - rank 1 → element-wise float coercion
///
/// Ragged rank-2 input (inner rows of unequal width) is rejected rather than
/// silently mis-indexed.
pub fn normalize_embedding(value: &serde_json::Value) -> Result<Vec<f32>, anyhow::Error> {
    let arr = match value {
        serde_json::Value::Array(a) => a,
        serde_json::Value::Number(n) => {
            let x = n.as_f64().unwrap_or(0.0) as f32;
            return Ok(vec![x]);
        }
        other => anyhow::bail!("Embedding payload is not numeric: {}", other),
    };

    if arr.is_empty() {
        return Ok(vec![]);
    }

    // rank 3 → take the first rank-2 slice
    let arr = match arr.first() {
        Some(serde_json::Value::Array(inner))
            if matches!(inner.first(), Some(serde_json::Value::Array(_))) =>
        {
            inner
        }
        _ => arr,
    };

    // rank 2 → mean-pool across tokens
    if let Some(serde_json::Value::Array(first_row)) = arr.first() {
        let dim = first_row.len();
        let tokens = arr.len();
        let mut sums = vec![0.0f64; dim];

        for row in arr {
            let row = row
                .as_array()
                .ok_or_else(|| anyhow::anyhow!("Mixed ranks in embedding payload"))?;
            if row.len() != dim {
                anyhow::bail!(
                    "Ragged embedding payload: expected row width {}, got {}",
                    dim,
                    row.len()
                );
            }
            for (d, cell) in row.iter().enumerate() {
                sums[d] += cell
                    .as_f64()
                    .ok_or_else(|| anyhow::anyhow!("Non-numeric embedding element"))?;
            }
        }

        return Ok(sums.into_iter().map(|s| (s / tokens as f64) as f32).collect());
    }

    // rank 1 → coerce to floats
    arr.iter()
        .map(|cell| {
            cell.as_f64()
                .map(|x| x as f32)
                .ok_or_else(|| anyhow::anyhow!("Non-numeric embedding element"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rank1_is_identity() {
        let v = json!([0.1, 0.2, 0.3]);
        let out = normalize_embedding(&v).unwrap();
        assert_eq!(out, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn rank2_mean_pools_per_dimension() {
        // 3 tokens x 2 dims
        let v = json!([[1.0, 10.0], [2.0, 20.0], [3.0, 30.0]]);
        let out = normalize_embedding(&v).unwrap();
        assert_eq!(out.len(), 2);
        assert!((out[0] - 2.0).abs() < 1e-6);
        assert!((out[1] - 20.0).abs() < 1e-6);
    }

    #[test]
    fn rank3_takes_first_slice() {
        let first = json!([[1.0, 10.0], [3.0, 30.0]]);
        let batched = json!([[[1.0, 10.0], [3.0, 30.0]], [[9.0, 9.0], [9.0, 9.0]]]);
        assert_eq!(
            normalize_embedding(&batched).unwrap(),
            normalize_embedding(&first).unwrap()
        );
    }

    #[test]
    fn scalar_becomes_single_element() {
        let out = normalize_embedding(&json!(0.5)).unwrap();
        assert_eq!(out, vec![0.5]);
    }

    #[test]
    fn empty_array_is_empty_vector() {
        let out = normalize_embedding(&json!([])).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let v = json!([[1.0, 2.0], [3.0]]);
        assert!(normalize_embedding(&v).is_err());
    }

    #[test]
    fn non_numeric_is_rejected() {
        assert!(normalize_embedding(&json!("oops")).is_err());
        assert!(normalize_embedding(&json!([["a", "b"]])).is_err());
    }
}
