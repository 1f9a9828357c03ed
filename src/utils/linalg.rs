//! Row-major matrix kernels
//!
//! All matrices are flat `[rows × cols]` slices. These are the only dense
//! products the model needs: `x·W`, `y·Wᵀ` and `Aᵀ·B` for gradients.

/// `out[m×n] = a[m×k] · b[k×n]`
pub fn matmul(a: &[f32], b: &[f32], out: &mut [f32], m: usize, k: usize, n: usize) {
    assert_eq!(a.len(), m * k, "matmul: lhs length mismatch");
    assert_eq!(b.len(), k * n, "matmul: rhs length mismatch");
    assert_eq!(out.len(), m * n, "matmul: output length mismatch");

    out.fill(0.0);
    for (a_row, out_row) in a.chunks_exact(k).zip(out.chunks_exact_mut(n)) {
        for (&a_val, b_row) in a_row.iter().zip(b.chunks_exact(n)) {
            if a_val == 0.0 {
                continue;
            }
            for (o, &b_val) in out_row.iter_mut().zip(b_row) {
                *o += a_val * b_val;
            }
        }
    }
}

/// `out[m×n] = a[m×k] · bᵀ` where `b` is stored as `[n×k]`.
///
/// Used for the tied decode pass, so the transpose is never materialized.
pub fn matmul_transpose_b(a: &[f32], b: &[f32], out: &mut [f32], m: usize, k: usize, n: usize) {
    assert_eq!(a.len(), m * k, "matmul_transpose_b: lhs length mismatch");
    assert_eq!(b.len(), n * k, "matmul_transpose_b: rhs length mismatch");
    assert_eq!(out.len(), m * n, "matmul_transpose_b: output length mismatch");

    for (a_row, out_row) in a.chunks_exact(k).zip(out.chunks_exact_mut(n)) {
        for (o, b_row) in out_row.iter_mut().zip(b.chunks_exact(k)) {
            *o = a_row.iter().zip(b_row).map(|(x, y)| x * y).sum();
        }
    }
}

/// `out[m×n] += aᵀ · b` where `a` is `[k×m]` and `b` is `[k×n]`.
pub fn matmul_transpose_a_acc(a: &[f32], b: &[f32], out: &mut [f32], k: usize, m: usize, n: usize) {
    assert_eq!(a.len(), k * m, "matmul_transpose_a_acc: lhs length mismatch");
    assert_eq!(b.len(), k * n, "matmul_transpose_a_acc: rhs length mismatch");
    assert_eq!(out.len(), m * n, "matmul_transpose_a_acc: output length mismatch");

    for (a_row, b_row) in a.chunks_exact(m).zip(b.chunks_exact(n)) {
        for (&a_val, out_row) in a_row.iter().zip(out.chunks_exact_mut(n)) {
            if a_val == 0.0 {
                continue;
            }
            for (o, &b_val) in out_row.iter_mut().zip(b_row) {
                *o += a_val * b_val;
            }
        }
    }
}

/// Add `bias` to every row of `data`.
pub fn add_row_bias(data: &mut [f32], bias: &[f32]) {
    if bias.is_empty() {
        return;
    }
    for row in data.chunks_exact_mut(bias.len()) {
        for (v, &b) in row.iter_mut().zip(bias) {
            *v += b;
        }
    }
}

/// Sum of each column of a `[rows × cols]` matrix.
pub fn column_sums(data: &[f32], cols: usize) -> Vec<f32> {
    let mut sums = vec![0.0f32; cols];
    if cols == 0 {
        return sums;
    }
    for row in data.chunks_exact(cols) {
        for (s, &v) in sums.iter_mut().zip(row) {
            *s += v;
        }
    }
    sums
}

/// Transpose of a `[rows × cols]` matrix, returned as `[cols × rows]`.
pub fn transpose(data: &[f32], rows: usize, cols: usize) -> Vec<f32> {
    assert_eq!(data.len(), rows * cols, "transpose: length mismatch");
    let mut out = vec![0.0f32; rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            out[c * rows + r] = data[r * cols + c];
        }
    }
    out
}
