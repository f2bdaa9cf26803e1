use approx::assert_abs_diff_eq;
use ndarray::azip;

pub const EPSILON: f64 = 1.0e-6;

pub fn assert_arr1_eq<Sa, Sb>(
    a: &ndarray::ArrayBase<Sa, ndarray::Ix1>,
    b: &ndarray::ArrayBase<Sb, ndarray::Ix1>,
) where
    Sa: ndarray::Data<Elem = f64>,
    Sb: ndarray::Data<Elem = f64>,
{
    assert_eq!(a.dim(), b.dim());

    azip!((a in a, b in b) assert_abs_diff_eq!(a, b, epsilon=EPSILON));
}

pub fn assert_arr2_eq<Sa, Sb>(
    a: &ndarray::ArrayBase<Sa, ndarray::Ix2>,
    b: &ndarray::ArrayBase<Sb, ndarray::Ix2>,
) where
    Sa: ndarray::Data<Elem = f64>,
    Sb: ndarray::Data<Elem = f64>,
{
    assert_eq!(a.dim(), b.dim());

    azip!((a in a.columns(), b in b.columns()) assert_arr1_eq(&a, &b));
}

/// compare a slice of values against a reference
pub fn assert_slice_eq(a: &[f64], b: &[f64]) {
    assert_eq!(a.len(), b.len(), "length mismatch: {:?} vs {:?}", a, b);

    for (a, b) in a.iter().zip(b.iter()) {
        assert_abs_diff_eq!(a, b, epsilon = EPSILON);
    }
}
