use approx::{assert_abs_diff_eq, assert_relative_eq};
use num_complex::Complex64;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use strided_blas::{
    asum, axpy, copy, dot, gemm, gemv, iamax, omatcopy, rot, rotg, scal, syrk, trmv, trsv, Diag,
    Order, RotgStrategy, StridedMat, StridedMatMut, StridedVec, StridedVecMut, Transpose, Uplo,
};

fn random_vec(rng: &mut StdRng, n: usize) -> Vec<f64> {
    (0..n).map(|_| rng.sample(StandardNormal)).collect()
}

fn random_cvec(rng: &mut StdRng, n: usize) -> Vec<Complex64> {
    (0..n)
        .map(|_| Complex64::new(rng.sample(StandardNormal), rng.sample(StandardNormal)))
        .collect()
}

fn identity(n: usize) -> Vec<f64> {
    let mut out = vec![0.0; n * n];
    for i in 0..n {
        out[i * n + i] = 1.0;
    }
    out
}

#[test]
fn test_scal_round_trip() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..10 {
        let n = rng.gen_range(1..40);
        let orig = random_vec(&mut rng, 2 * n);
        let alpha: f64 = rng.gen_range(0.25..8.0);
        let mut x = orig.clone();
        let mut v = StridedVecMut::new(&mut x, 1, 2);
        scal(n, alpha, &mut v).unwrap();
        scal(n, 1.0 / alpha, &mut v).unwrap();
        for (a, b) in x.iter().zip(&orig) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12, max_relative = 1e-12);
        }
    }
}

#[test]
fn test_scal_round_trip_complex() {
    let mut rng = StdRng::seed_from_u64(7);
    let orig = random_cvec(&mut rng, 17);
    let alpha = Complex64::new(1.5, -0.75);
    let mut x = orig.clone();
    let mut v = StridedVecMut::new(&mut x, 0, 1);
    scal(17, alpha, &mut v).unwrap();
    scal(17, Complex64::new(1.0, 0.0) / alpha, &mut v).unwrap();
    for (a, b) in x.iter().zip(&orig) {
        assert_relative_eq!(a.re, b.re, epsilon = 1e-12);
        assert_relative_eq!(a.im, b.im, epsilon = 1e-12);
    }
}

#[test]
fn test_copy_then_subtract_is_zero() {
    let mut rng = StdRng::seed_from_u64(3);
    let n = 25;
    let x = random_vec(&mut rng, n);
    let mut y = vec![f64::NAN; 3 * n];
    let xv = StridedVec::new(&x, 0, 1);
    // reversed destination
    let mut yv = StridedVecMut::new(&mut y, 3 * (n - 1), -3);
    copy(n, &xv, &mut yv).unwrap();
    axpy(n, -1.0, &xv, &mut yv).unwrap();
    for i in 0..n {
        assert_eq!(yv.get(i), 0.0);
    }
}

#[test]
fn test_gemm_with_identity_is_identity() {
    let mut rng = StdRng::seed_from_u64(11);
    let (m, n) = (5, 4);
    let a = random_vec(&mut rng, m * n);
    let eye = identity(n);
    for order in [Order::RowMajor, Order::ColMajor] {
        let lda = if order == Order::RowMajor { n } else { m };
        let mut c = vec![0.0; m * n];
        gemm(
            order,
            Transpose::NoTrans,
            Transpose::NoTrans,
            m,
            n,
            n,
            1.0,
            &StridedMat::new(&a, 0, lda),
            &StridedMat::new(&eye, 0, n),
            0.0,
            &mut StridedMatMut::new(&mut c, 0, lda),
        )
        .unwrap();
        assert_eq!(c, a);
    }
}

#[test]
fn test_gemm_three_by_three_scaled() {
    let a: Vec<f64> = (1..=9).map(f64::from).collect();
    let eye = identity(3);
    let mut c = vec![0.0; 9];
    let run = |alpha: f64, c: &mut [f64]| {
        gemm(
            Order::RowMajor,
            Transpose::NoTrans,
            Transpose::NoTrans,
            3,
            3,
            3,
            alpha,
            &StridedMat::new(&a, 0, 3),
            &StridedMat::new(&eye, 0, 3),
            0.0,
            &mut StridedMatMut::new(c, 0, 3),
        )
        .unwrap();
    };
    run(1.0, &mut c);
    assert_eq!(c, a);
    run(10.0, &mut c);
    let scaled: Vec<f64> = a.iter().map(|v| v * 10.0).collect();
    assert_eq!(c, scaled);
}

#[test]
fn test_gemm_transpose_matches_explicit_copy() {
    let mut rng = StdRng::seed_from_u64(5);
    let (m, n, k) = (3, 4, 5);
    // A stored k × m so that op(A) = Aᴴ is m × k
    let a = random_cvec(&mut rng, k * m);
    let b = random_cvec(&mut rng, k * n);
    let one = Complex64::new(1.0, 0.0);
    let zero = Complex64::new(0.0, 0.0);

    let mut c1 = vec![zero; m * n];
    gemm(
        Order::RowMajor,
        Transpose::ConjTrans,
        Transpose::NoTrans,
        m,
        n,
        k,
        one,
        &StridedMat::new(&a, 0, m),
        &StridedMat::new(&b, 0, n),
        zero,
        &mut StridedMatMut::new(&mut c1, 0, n),
    )
    .unwrap();

    let mut ah = vec![zero; m * k];
    omatcopy(
        Order::RowMajor,
        Transpose::ConjTrans,
        k,
        m,
        one,
        &StridedMat::new(&a, 0, m),
        &mut StridedMatMut::new(&mut ah, 0, k),
    )
    .unwrap();
    let mut c2 = vec![zero; m * n];
    gemm(
        Order::RowMajor,
        Transpose::NoTrans,
        Transpose::NoTrans,
        m,
        n,
        k,
        one,
        &StridedMat::new(&ah, 0, k),
        &StridedMat::new(&b, 0, n),
        zero,
        &mut StridedMatMut::new(&mut c2, 0, n),
    )
    .unwrap();

    for (x, y) in c1.iter().zip(&c2) {
        assert_relative_eq!(x.re, y.re, epsilon = 1e-12);
        assert_relative_eq!(x.im, y.im, epsilon = 1e-12);
    }
}

#[test]
fn test_gemv_row_and_col_major_agree() {
    let a_row = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let a_col = [1.0, 4.0, 2.0, 5.0, 3.0, 6.0];
    let x = [100.0, 10.0, 1.0];
    for (order, a, lda) in [(Order::RowMajor, &a_row, 3), (Order::ColMajor, &a_col, 2)] {
        let mut y = [0.0; 2];
        gemv(
            order,
            Transpose::NoTrans,
            2,
            3,
            1.0,
            &StridedMat::new(a, 0, lda),
            &StridedVec::new(&x, 0, 1),
            0.0,
            &mut StridedVecMut::new(&mut y, 0, 1),
        )
        .unwrap();
        assert_eq!(y, [123.0, 456.0]);
    }
}

#[test]
fn test_rotg_annihilates_second_component() {
    let g = rotg(3.0f64, 4.0, RotgStrategy::default());
    assert_relative_eq!(g.c, 0.6, epsilon = 1e-15);
    assert_relative_eq!(g.s, 0.8, epsilon = 1e-15);
    assert_relative_eq!(g.r, 5.0, epsilon = 1e-15);

    let mut x = [3.0];
    let mut y = [4.0];
    rot(
        1,
        &mut StridedVecMut::new(&mut x, 0, 1),
        &mut StridedVecMut::new(&mut y, 0, 1),
        g.c,
        g.s,
    )
    .unwrap();
    assert_relative_eq!(x[0], 5.0, epsilon = 1e-14);
    assert_abs_diff_eq!(y[0], 0.0, epsilon = 1e-14);
}

#[test]
fn test_trsv_inverts_trmv() {
    let mut rng = StdRng::seed_from_u64(21);
    let n = 6;
    let mut a = random_vec(&mut rng, n * n);
    for i in 0..n {
        a[i * n + i] += n as f64;
    }
    let x0 = random_vec(&mut rng, n);
    for order in [Order::RowMajor, Order::ColMajor] {
        for uplo in [Uplo::Upper, Uplo::Lower] {
            for trans in [Transpose::NoTrans, Transpose::Trans] {
                for diag in [Diag::NonUnit, Diag::Unit] {
                    let am = StridedMat::new(&a, 0, n);
                    let mut x = x0.clone();
                    let mut xv = StridedVecMut::new(&mut x, 0, 1);
                    trmv(order, uplo, trans, diag, n, &am, &mut xv).unwrap();
                    trsv(order, uplo, trans, diag, n, &am, &mut xv).unwrap();
                    for (got, want) in x.iter().zip(&x0) {
                        assert_relative_eq!(*got, *want, epsilon = 1e-10);
                    }
                }
            }
        }
    }
}

#[test]
fn test_syrk_triangles_agree() {
    let mut rng = StdRng::seed_from_u64(8);
    let (n, k) = (4, 3);
    let a = random_vec(&mut rng, n * k);
    let run = |uplo: Uplo| {
        let mut c = vec![0.0; n * n];
        syrk(
            Order::RowMajor,
            uplo,
            Transpose::NoTrans,
            n,
            k,
            1.0,
            &StridedMat::new(&a, 0, k),
            0.0,
            &mut StridedMatMut::new(&mut c, 0, n),
        )
        .unwrap();
        c
    };
    let upper = run(Uplo::Upper);
    let lower = run(Uplo::Lower);
    for i in 0..n {
        for j in i..n {
            assert_relative_eq!(upper[i * n + j], lower[j * n + i], epsilon = 1e-14);
        }
        for j in 0..i {
            assert_eq!(upper[i * n + j], 0.0);
        }
    }
}

#[test]
fn test_asum_and_iamax() {
    let x = [-1.0, 2.0, -3.0, -4.0, 5.0, -6.0];
    let v = StridedVec::new(&x, 0, 1);
    assert_eq!(asum(6, &v).unwrap(), 21.0);
    assert_eq!(iamax(6, &v).unwrap(), Some(5));
}

#[test]
fn test_dot_negative_increment_reverses() {
    let mut rng = StdRng::seed_from_u64(13);
    let n = 9;
    let x = random_vec(&mut rng, n);
    let y = random_vec(&mut rng, n);
    let rev: Vec<f64> = y.iter().rev().copied().collect();
    let forward = dot(n, &StridedVec::new(&x, 0, 1), &StridedVec::new(&rev, 0, 1)).unwrap();
    let backward = dot(n, &StridedVec::new(&x, 0, 1), &StridedVec::new(&y, n - 1, -1)).unwrap();
    assert_eq!(forward, backward);
}
