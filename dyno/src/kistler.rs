//! multi-button Kistler balances
//!
//! Each button reports Fx, Fy, Fz in that channel order. The buttons sit
//! at `(±xdist, ±ydist)` in the gauge frame and the combined moments are
//! the r × F sums over the buttons.

use crate::plain::{Layout, PlainGauge};
use crate::{GaugeGeometry, GaugeKind};

fn sum_forces(eu: &ndarray::Array1<f64>, buttons: usize) -> [f64; 3] {
    let mut f = [0.0; 3];
    for b in 0..buttons {
        for (axis, sum) in f.iter_mut().enumerate() {
            *sum += eu[3 * b + axis];
        }
    }
    f
}

/// b1 (+x, 0), b2 (-x, +y), b3 (-x, -y)
#[derive(Clone, Copy, Debug)]
pub struct ThreeButton;

impl Layout for ThreeButton {
    const KIND: GaugeKind = GaugeKind::Kistler3;
    const CHANNELS: usize = 9;

    fn combine(eu: &ndarray::Array1<f64>, geometry: &GaugeGeometry) -> ndarray::Array1<f64> {
        let (x, y) = (geometry.xdist, geometry.ydist);
        let fx = |b: usize| eu[3 * b];
        let fy = |b: usize| eu[3 * b + 1];
        let fz = |b: usize| eu[3 * b + 2];
        let [sx, sy, sz] = sum_forces(eu, 3);

        ndarray::array![
            sx,
            sy,
            sz,
            y * (fz(1) - fz(2)),
            x * (-fz(0) + fz(1) + fz(2)),
            x * (fy(0) - fy(1) - fy(2)) + y * (-fx(1) + fx(2)),
        ]
    }
}

/// b1 (+x, +y), b2 (+x, -y), b3 (-x, -y), b4 (-x, +y)
#[derive(Clone, Copy, Debug)]
pub struct FourButton;

impl Layout for FourButton {
    const KIND: GaugeKind = GaugeKind::Kistler4;
    const CHANNELS: usize = 12;

    fn combine(eu: &ndarray::Array1<f64>, geometry: &GaugeGeometry) -> ndarray::Array1<f64> {
        let (x, y) = (geometry.xdist, geometry.ydist);
        let fx = |b: usize| eu[3 * b];
        let fy = |b: usize| eu[3 * b + 1];
        let fz = |b: usize| eu[3 * b + 2];
        let [sx, sy, sz] = sum_forces(eu, 4);

        ndarray::array![
            sx,
            sy,
            sz,
            y * (fz(0) - fz(1) - fz(2) + fz(3)),
            x * (-fz(0) - fz(1) + fz(2) + fz(3)),
            x * (fy(0) + fy(1) - fy(2) - fy(3)) + y * (-fx(0) + fx(1) + fx(2) - fx(3)),
        ]
    }
}

pub type Kistler3 = PlainGauge<ThreeButton>;
pub type Kistler4 = PlainGauge<FourButton>;
