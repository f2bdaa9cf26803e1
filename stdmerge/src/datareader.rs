//! raw OBC logs
//!
//! One sample per line, channel values separated by whitespace or commas.
//! Empty lines and lines starting with `#` are skipped. Fields that don't
//! parse read as 0, as do channels missing at the end of a short line.

use crate::Error;

/// warn about this many bad fields individually, summarize the rest
const MAX_FIELD_WARNINGS: usize = 5;

/// one time step of raw instrument counts
#[derive(Clone, Debug, PartialEq)]
pub struct RawSample {
    /// position in the log, counting samples only
    pub index: usize,
    pub values: Vec<f64>,
    /// rounded value of the mode channel
    pub mode: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub samples: usize,
    /// fields that failed to parse
    pub bad_fields: usize,
    /// lines with fewer values than channels
    pub short_lines: usize,
    /// lines with more values than channels
    pub long_lines: usize,
}

impl ReadStats {
    pub fn substitutions(&self) -> usize {
        self.bad_fields + self.short_lines
    }
}

pub struct Context {
    nchannels: usize,
    mode_channel: usize,
    stats: ReadStats,
}

impl Context {
    pub fn new(nchannels: usize, mode_channel: usize) -> Self {
        Self {
            nchannels,
            mode_channel,
            stats: ReadStats::default(),
        }
    }

    pub fn stats(&self) -> &ReadStats {
        &self.stats
    }

    /// parse one log line, `None` for lines without a sample
    pub fn parse_line(&mut self, lineno: usize, line: &str) -> Option<RawSample> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let mut values = Vec::with_capacity(self.nchannels);
        let mut nfields = 0;
        for field in line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|f| !f.is_empty())
        {
            nfields += 1;
            if values.len() == self.nchannels {
                continue;
            }

            let value = match field.parse::<f64>() {
                Ok(v) if v.is_finite() => v,
                _ => {
                    self.stats.bad_fields += 1;
                    if self.stats.bad_fields <= MAX_FIELD_WARNINGS {
                        log::warn!(
                            "line {}: field {} {:?} is not a number, using 0",
                            lineno,
                            values.len(),
                            field
                        );
                    }
                    0.0
                }
            };
            values.push(value);
        }

        if values.len() < self.nchannels {
            self.stats.short_lines += 1;
            log::warn!(
                "line {}: {} of {} channels, padding with 0",
                lineno,
                values.len(),
                self.nchannels
            );
            values.resize(self.nchannels, 0.0);
        } else if nfields > self.nchannels {
            self.stats.long_lines += 1;
        }

        let sample = RawSample {
            index: self.stats.samples,
            mode: values.get(self.mode_channel).copied().unwrap_or(0.0).round() as i64,
            values,
        };
        self.stats.samples += 1;

        Some(sample)
    }

    /// Invalid UTF-8 is decoded lossily, so the affected field fails to parse
    /// and reads as 0 like any other bad field.
    pub fn read_samples<R>(&mut self, mut source: R) -> Result<Vec<RawSample>, std::io::Error>
    where
        R: std::io::BufRead,
    {
        let mut samples = Vec::new();
        let mut buf = Vec::new();
        let mut lineno = 0;

        loop {
            buf.clear();
            if source.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            lineno += 1;

            let line = String::from_utf8_lossy(&buf);
            if let Some(sample) = self.parse_line(lineno, &line) {
                samples.push(sample);
            }
        }

        if self.stats.bad_fields > MAX_FIELD_WARNINGS {
            log::warn!("{} unparsable fields in total", self.stats.bad_fields);
        }
        if self.stats.long_lines > 0 {
            log::warn!("{} lines had extra values, ignored", self.stats.long_lines);
        }

        Ok(samples)
    }
}

/// read a whole raw log
pub fn read_all_samples<P: AsRef<std::path::Path>>(
    path: P,
    nchannels: usize,
    mode_channel: usize,
) -> Result<(Vec<RawSample>, ReadStats), Error> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
    let reader = std::io::BufReader::new(file);

    let mut ctx = Context::new(nchannels, mode_channel);
    let samples = ctx.read_samples(reader).map_err(|e| Error::io(path, e))?;
    log::info!(
        "{}: {} samples, {} substituted fields",
        path.display(),
        samples.len(),
        ctx.stats().substitutions()
    );

    Ok((samples, ctx.stats.clone()))
}
