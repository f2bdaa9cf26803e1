use crate::GaugeKind;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{kind}: {name} matrix must be 6x6, got {rows}x{cols}")]
    MatrixShape {
        kind: GaugeKind,
        name: &'static str,
        rows: usize,
        cols: usize,
    },
    #[error("{kind}: expected {expected} channels, got {got}")]
    WrongChannelCount {
        kind: GaugeKind,
        expected: usize,
        got: usize,
    },
}
