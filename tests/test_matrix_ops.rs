// Tests for the row-major matrix helpers behind the forward and backward
// passes: plain and transposed products, bias broadcast and column sums.

use approx::assert_relative_eq;
use rust_stacked_autoencoders::utils::linalg::{
    add_row_bias, column_sums, matmul, matmul_transpose_a_acc, matmul_transpose_b, transpose,
};

#[test]
fn test_matmul_small() {
    // [2x3] * [3x2]
    let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let b = [7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
    let mut out = [0.0; 4];
    matmul(&a, &b, &mut out, 2, 3, 2);
    assert_eq!(out, [58.0, 64.0, 139.0, 154.0]);
}

#[test]
fn test_matmul_overwrites_output() {
    let mut out = [9.0; 1];
    matmul(&[2.0], &[3.0], &mut out, 1, 1, 1);
    assert_eq!(out, [6.0]);
}

#[test]
fn test_transpose_b_matches_explicit_transpose() {
    let a = [0.5, -1.0, 2.0, 1.5, 0.0, -0.5];
    // b stored as [n=4 x k=3]
    let b = [
        1.0, 0.0, 2.0, //
        -1.0, 3.0, 0.5, //
        0.25, 0.25, 0.25, //
        2.0, -2.0, 1.0,
    ];
    let mut via_transpose = [0.0; 8];
    matmul(&a, &transpose(&b, 4, 3), &mut via_transpose, 2, 3, 4);
    let mut direct = [0.0; 8];
    matmul_transpose_b(&a, &b, &mut direct, 2, 3, 4);
    for (x, y) in direct.iter().zip(&via_transpose) {
        assert_relative_eq!(*x, *y, epsilon = 1e-6);
    }
}

#[test]
fn test_transpose_a_accumulates() {
    // a is [k=2 x m=2], b is [k=2 x n=3]
    let a = [1.0, 2.0, 3.0, 4.0];
    let b = [1.0, 0.0, -1.0, 2.0, 1.0, 0.5];
    let mut out = [1.0; 6];
    matmul_transpose_a_acc(&a, &b, &mut out, 2, 2, 3);
    // aᵀ·b = [[7, 3, 0.5], [10, 4, 0.0]] plus the ones already there
    assert_eq!(out, [8.0, 4.0, 1.5, 11.0, 5.0, 1.0]);
}

#[test]
fn test_transpose_round_trip_shape() {
    let m = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let t = transpose(&m, 2, 3);
    assert_eq!(t, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    assert_eq!(transpose(&t, 3, 2), m.to_vec());
}

#[test]
fn test_add_row_bias_every_row() {
    let mut data = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
    add_row_bias(&mut data, &[10.0, 20.0]);
    assert_eq!(data, [10.0, 21.0, 12.0, 23.0, 14.0, 25.0]);
}

#[test]
fn test_column_sums() {
    let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    assert_eq!(column_sums(&data, 3), vec![5.0, 7.0, 9.0]);
    assert_eq!(column_sums(&data, 2), vec![9.0, 12.0]);
}
