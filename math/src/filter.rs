use crate::Error;

/// second order low-pass Butterworth section, direct form II transposed
#[derive(Clone, Debug, PartialEq)]
pub struct Butterworth {
    b: [f64; 3],
    a: [f64; 3],
}

impl Butterworth {
    /// `ratio` is the cutoff frequency divided by the sample rate
    pub fn lowpass(ratio: f64) -> Result<Self, Error> {
        if !(ratio > 0.0 && ratio < 0.5) {
            return Err(Error::InvalidArgument);
        }

        // bilinear transform with prewarping
        let k = (std::f64::consts::PI * ratio).tan();
        let sqrt2 = std::f64::consts::SQRT_2;
        let norm = 1.0 / (1.0 + sqrt2 * k + k * k);
        let b0 = k * k * norm;

        Ok(Self {
            b: [b0, 2.0 * b0, b0],
            a: [1.0, 2.0 * (k * k - 1.0) * norm, (1.0 - sqrt2 * k + k * k) * norm],
        })
    }

    pub fn b(&self) -> &[f64; 3] {
        &self.b
    }

    pub fn a(&self) -> &[f64; 3] {
        &self.a
    }

    /// filter state for a steady state response to a unit step
    pub fn zi(&self) -> [f64; 2] {
        [1.0 - self.b[0], self.b[2] - self.a[2]]
    }

    /// run the filter once over `x`, starting in steady state at `x[0]`
    pub fn apply<S>(&self, x: &ndarray::ArrayBase<S, ndarray::Ix1>) -> ndarray::Array1<f64>
    where
        S: ndarray::Data<Elem = f64>,
    {
        let mut y = ndarray::Array1::zeros(x.len());
        let x0 = match x.first() {
            Some(v) => *v,
            None => return y,
        };

        let zi = self.zi();
        let mut z = [zi[0] * x0, zi[1] * x0];
        for (yi, &xi) in y.iter_mut().zip(x.iter()) {
            let out = self.b[0] * xi + z[0];
            z[0] = self.b[1] * xi - self.a[1] * out + z[1];
            z[1] = self.b[2] * xi - self.a[2] * out;
            *yi = out;
        }

        y
    }
}

/// central difference derivative with one-sided ends
pub fn derivative<S>(
    x: &ndarray::ArrayBase<S, ndarray::Ix1>,
    dt: f64,
) -> Result<ndarray::Array1<f64>, Error>
where
    S: ndarray::Data<Elem = f64>,
{
    let n = x.len();
    if n < 2 {
        return Err(Error::EmptyInput);
    }
    if dt.is_nan() || dt <= 0.0 {
        return Err(Error::InvalidArgument);
    }

    let mut res = ndarray::Array1::zeros(n);
    res[0] = (x[1] - x[0]) / dt;
    res[n - 1] = (x[n - 1] - x[n - 2]) / dt;
    for i in 1..n - 1 {
        res[i] = (x[i + 1] - x[i - 1]) / (2.0 * dt);
    }

    Ok(res)
}

/// zero the first `n` samples
pub fn blank_start<S>(x: &mut ndarray::ArrayBase<S, ndarray::Ix1>, n: usize)
where
    S: ndarray::DataMut<Elem = f64>,
{
    for v in x.iter_mut().take(n) {
        *v = 0.0;
    }
}
