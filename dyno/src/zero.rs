/// running sums of the samples taken while the run is zeroing
#[derive(Clone, Debug)]
pub struct ZeroState {
    sum: ndarray::Array1<f64>,
    count: usize,
    average: Option<ndarray::Array1<f64>>,
}

impl ZeroState {
    pub fn new(len: usize) -> Self {
        Self {
            sum: ndarray::Array1::zeros(len),
            count: 0,
            average: None,
        }
    }

    pub fn accumulate<S>(&mut self, x: &ndarray::ArrayBase<S, ndarray::Ix1>)
    where
        S: ndarray::Data<Elem = f64>,
    {
        assert_eq!(x.len(), self.sum.len());

        self.sum += x;
        self.count += 1;
    }

    /// divide the sums by the sample count
    ///
    /// Sums are kept, so later samples extend the same average.
    pub fn finalize(&mut self) -> Option<&ndarray::Array1<f64>> {
        if self.count == 0 {
            return None;
        }

        self.average = Some(&self.sum / self.count as f64);
        self.average.as_ref()
    }

    /// the last finalized average
    pub fn average(&self) -> Option<&ndarray::Array1<f64>> {
        self.average.as_ref()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.sum.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sum.is_empty()
    }
}
