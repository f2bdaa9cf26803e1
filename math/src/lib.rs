mod error;
pub use error::Error;

pub mod filter;
pub mod rolling;
pub mod trajectory;
pub mod transform;

pub use rolling::RollingAverage;
pub use transform::BodyAngles;

use ndarray::array;

pub fn pymod<A>(n: A, m: A) -> A
where
    A: Copy + std::ops::Rem<Output = A> + std::ops::Add<Output = A>,
{
    ((n % m) + m) % m
}

pub fn normalize_angle<A>(mut x: A) -> A
where
    A: Copy
        + num_traits::cast::NumCast
        + num_traits::float::FloatConst
        + std::ops::Rem<Output = A>
        + std::ops::Add<Output = A>
        + std::cmp::PartialOrd
        + std::ops::Mul<A, Output = A>
        + std::ops::SubAssign,
{
    let pi = num_traits::float::FloatConst::PI();

    x = pymod(x, pi * A::from(2.0).unwrap());
    if x > pi {
        x -= pi * A::from(2.0).unwrap();
    }
    x
}

/// remove 2*pi jumps from a series of angles, unit: rad
pub fn unwrap_angles<S>(angles: &ndarray::ArrayBase<S, ndarray::Ix1>) -> ndarray::Array1<f64>
where
    S: ndarray::Data<Elem = f64>,
{
    let mut res = ndarray::Array1::zeros(angles.len());
    let mut prev: Option<(f64, f64)> = None;

    for (dst, &x) in res.iter_mut().zip(angles.iter()) {
        let unwrapped = match prev {
            Some((raw, unwrapped)) => unwrapped + normalize_angle(x - raw),
            None => x,
        };
        *dst = unwrapped;
        prev = Some((x, unwrapped));
    }

    res
}

pub fn rot2d<S, A>(v: &ndarray::ArrayBase<S, ndarray::Ix1>, angle: A) -> ndarray::Array1<A>
where
    S: ndarray::Data<Elem = A>,
    A: num_traits::float::Float,
{
    assert_eq!(v.dim(), (2));

    array![
        v[0] * angle.cos() - v[1] * angle.sin(),
        v[0] * angle.sin() + v[1] * angle.cos(),
    ]
}
