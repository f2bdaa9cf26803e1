/// fixed capacity circular buffer with a running sum
///
/// Once full, every append replaces the oldest value.
#[derive(Clone, Debug)]
pub struct RollingAverage {
    buf: Vec<f64>,
    capacity: usize,
    pos: usize,
    is_full: bool,
    sum: f64,
}

impl RollingAverage {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0);

        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            pos: 0,
            is_full: false,
            sum: 0.0,
        }
    }

    pub fn append(&mut self, x: f64) {
        if self.is_full {
            self.sum += x - self.buf[self.pos];
            self.buf[self.pos] = x;
        } else {
            self.sum += x;
            self.buf.push(x);
        }

        self.pos += 1;
        if self.pos == self.capacity {
            self.pos = 0;
            self.is_full = true;
        }
    }

    /// mean of the stored values, `None` while empty
    pub fn average(&self) -> Option<f64> {
        if self.buf.is_empty() {
            None
        } else {
            Some(self.sum / self.buf.len() as f64)
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.is_full
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
