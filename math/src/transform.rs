//! 3-2-1 (yaw, pitch, roll) direction cosine transforms between the body
//! frame and the inertial (north, east, down) frame.
//!
//! The array variants run the scalar kernels element by element so both
//! call forms produce identical numbers.

use crate::Error;

/// body attitude, unit: rad
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BodyAngles {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,

    pub sin_roll: f64,
    pub cos_roll: f64,
    pub sin_pitch: f64,
    pub cos_pitch: f64,
    pub sin_yaw: f64,
    pub cos_yaw: f64,
}

impl BodyAngles {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self {
            roll,
            pitch,
            yaw,
            sin_roll: roll.sin(),
            cos_roll: roll.cos(),
            sin_pitch: pitch.sin(),
            cos_pitch: pitch.cos(),
            sin_yaw: yaw.sin(),
            cos_yaw: yaw.cos(),
        }
    }

    pub fn from_degrees(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self::new(roll.to_radians(), pitch.to_radians(), yaw.to_radians())
    }

    pub fn level() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// body -> inertial rotation matrix
    pub fn dcm(&self) -> nalgebra::Matrix3<f64> {
        let (sphi, cphi) = (self.sin_roll, self.cos_roll);
        let (sth, cth) = (self.sin_pitch, self.cos_pitch);
        let (spsi, cpsi) = (self.sin_yaw, self.cos_yaw);

        nalgebra::Matrix3::new(
            cth * cpsi,
            sphi * sth * cpsi - cphi * spsi,
            cphi * sth * cpsi + sphi * spsi,
            cth * spsi,
            sphi * sth * spsi + cphi * cpsi,
            cphi * sth * spsi - sphi * cpsi,
            -sth,
            sphi * cth,
            cphi * cth,
        )
    }
}

/// rotate an inertial vector into body axes
pub fn to_body(u: f64, v: f64, w: f64, angles: &BodyAngles) -> (f64, f64, f64) {
    let res = angles.dcm().transpose() * nalgebra::Vector3::new(u, v, w);
    (res[0], res[1], res[2])
}

/// rotate a body vector into inertial axes
pub fn to_inertial(u: f64, v: f64, w: f64, angles: &BodyAngles) -> (f64, f64, f64) {
    let res = angles.dcm() * nalgebra::Vector3::new(u, v, w);
    (res[0], res[1], res[2])
}

type Columns3 = (
    ndarray::Array1<f64>,
    ndarray::Array1<f64>,
    ndarray::Array1<f64>,
);

fn map_arr<S, F>(
    u: &ndarray::ArrayBase<S, ndarray::Ix1>,
    v: &ndarray::ArrayBase<S, ndarray::Ix1>,
    w: &ndarray::ArrayBase<S, ndarray::Ix1>,
    angles: &[BodyAngles],
    f: F,
) -> Result<Columns3, Error>
where
    S: ndarray::Data<Elem = f64>,
    F: Fn(f64, f64, f64, &BodyAngles) -> (f64, f64, f64),
{
    let n = angles.len();
    for len in [u.len(), v.len(), w.len()] {
        if len != n {
            return Err(Error::LengthMismatch {
                expected: n,
                got: len,
            });
        }
    }

    let mut a = ndarray::Array1::zeros(n);
    let mut b = ndarray::Array1::zeros(n);
    let mut c = ndarray::Array1::zeros(n);
    for (i, angles) in angles.iter().enumerate() {
        let (x, y, z) = f(u[i], v[i], w[i], angles);
        a[i] = x;
        b[i] = y;
        c[i] = z;
    }

    Ok((a, b, c))
}

/// whole-run form of [to_body]
pub fn to_body_arr<S>(
    u: &ndarray::ArrayBase<S, ndarray::Ix1>,
    v: &ndarray::ArrayBase<S, ndarray::Ix1>,
    w: &ndarray::ArrayBase<S, ndarray::Ix1>,
    angles: &[BodyAngles],
) -> Result<Columns3, Error>
where
    S: ndarray::Data<Elem = f64>,
{
    map_arr(u, v, w, angles, to_body)
}

/// whole-run form of [to_inertial]
pub fn to_inertial_arr<S>(
    u: &ndarray::ArrayBase<S, ndarray::Ix1>,
    v: &ndarray::ArrayBase<S, ndarray::Ix1>,
    w: &ndarray::ArrayBase<S, ndarray::Ix1>,
    angles: &[BodyAngles],
) -> Result<Columns3, Error>
where
    S: ndarray::Data<Elem = f64>,
{
    map_arr(u, v, w, angles, to_inertial)
}

/// Euler angle rates from body rates p, q, r. unit: rad/s
///
/// Singular at +-90 degrees pitch.
pub fn euler_rates(p: f64, q: f64, r: f64, angles: &BodyAngles) -> (f64, f64, f64) {
    let qr = q * angles.sin_roll + r * angles.cos_roll;

    (
        p + qr * angles.sin_pitch / angles.cos_pitch,
        q * angles.cos_roll - r * angles.sin_roll,
        qr / angles.cos_pitch,
    )
}

/// body rates p, q, r from Euler angle rates. unit: rad/s
pub fn body_rates(droll: f64, dpitch: f64, dyaw: f64, angles: &BodyAngles) -> (f64, f64, f64) {
    (
        droll - dyaw * angles.sin_pitch,
        dpitch * angles.cos_roll + dyaw * angles.sin_roll * angles.cos_pitch,
        -dpitch * angles.sin_roll + dyaw * angles.cos_roll * angles.cos_pitch,
    )
}
