//! STD run records
//!
//! ```text
//! <title>
//! <approach speed> <run kind> <YYYY-MM-DD HH:MM:SS>
//! <nchan> <dt> <reference length>
//! <channel names>
//! <one row per sample>
//! ```
//!
//! Names and values use 15 column fields, values in `%15.6E` notation.

use crate::Error;
use std::io::Write as _;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FIELD_WIDTH: usize = 15;
/// first data line, 1-based
const FIRST_ROW_LINE: usize = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    pub title: String,
    /// full scale, unit: kn
    pub approach_speed: f64,
    pub run_kind: i64,
    pub timestamp: chrono::NaiveDateTime,
    pub nchan: usize,
    /// full scale sample period. unit: s
    pub dt: f64,
    /// full scale reference length. unit: ft
    pub ref_length: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunRecord {
    pub header: Header,
    pub names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

/// C style `%15.6E`
pub fn format_sci(value: f64) -> String {
    let s = format!("{:.6E}", value);
    let formatted = match s.split_once('E') {
        Some((mantissa, exp)) => match exp.parse::<i32>() {
            Ok(exp) => format!(
                "{}E{}{:02}",
                mantissa,
                if exp < 0 { '-' } else { '+' },
                exp.abs()
            ),
            Err(_) => s,
        },
        None => s,
    };

    format!("{:>width$}", formatted, width = FIELD_WIDTH)
}

fn format_error<S: Into<String>>(line: usize, reason: S) -> Error {
    Error::StdFormat {
        line,
        reason: reason.into(),
    }
}

fn parse_field<T: std::str::FromStr>(line: usize, what: &str, field: Option<&str>) -> Result<T, Error> {
    let field = field.ok_or_else(|| format_error(line, format!("missing {}", what)))?;
    field
        .parse()
        .map_err(|_| format_error(line, format!("invalid {} {:?}", what, field)))
}

impl RunRecord {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// all values of one column
    pub fn column_values(&self, index: usize) -> ndarray::Array1<f64> {
        self.rows.iter().map(|row| row[index]).collect()
    }

    /// replace the column called `name` or append it
    pub fn set_column(&mut self, name: &str, values: &ndarray::Array1<f64>) -> Result<(), Error> {
        if values.len() != self.rows.len() {
            return Err(math::Error::LengthMismatch {
                expected: self.rows.len(),
                got: values.len(),
            }
            .into());
        }

        match self.column(name) {
            Some(index) => {
                for (row, &v) in self.rows.iter_mut().zip(values.iter()) {
                    row[index] = v;
                }
            }
            None => {
                self.names.push(name.to_string());
                for (row, &v) in self.rows.iter_mut().zip(values.iter()) {
                    row.push(v);
                }
            }
        }
        self.header.nchan = self.names.len();

        Ok(())
    }

    fn validate(&self) -> Result<(), Error> {
        if self.header.title.contains(['\n', '\r']) {
            return Err(Error::config(format!(
                "title {:?} must be a single line",
                self.header.title
            )));
        }
        for name in &self.names {
            if name.is_empty() || name.chars().any(char::is_whitespace) {
                return Err(Error::config(format!(
                    "channel name {:?} must be non-empty without whitespace",
                    name
                )));
            }
        }
        if self.header.nchan != self.names.len() {
            return Err(format_error(
                3,
                format!("{} channels but {} names", self.header.nchan, self.names.len()),
            ));
        }
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != self.names.len() {
                return Err(format_error(
                    FIRST_ROW_LINE + i,
                    format!("{} values for {} channels", row.len(), self.names.len()),
                ));
            }
        }

        Ok(())
    }

    pub fn write_to<W: std::io::Write>(&self, w: &mut W) -> std::io::Result<()> {
        let h = &self.header;

        writeln!(w, "{}", h.title)?;
        writeln!(
            w,
            "{:10.3} {:5} {}",
            h.approach_speed,
            h.run_kind,
            h.timestamp.format(TIMESTAMP_FORMAT)
        )?;
        writeln!(
            w,
            "{:5} {} {}",
            h.nchan,
            format_sci(h.dt),
            format_sci(h.ref_length)
        )?;

        for name in &self.names {
            write!(w, " {:>width$}", name, width = FIELD_WIDTH - 1)?;
        }
        writeln!(w)?;

        for row in &self.rows {
            for &v in row {
                w.write_all(format_sci(v).as_bytes())?;
            }
            writeln!(w)?;
        }

        Ok(())
    }

    /// write the record, replacing `path` only once it is complete
    pub fn write<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Error> {
        self.validate()?;

        let path = path.as_ref();
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => std::path::Path::new("."),
        };

        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| Error::io(path, e))?;
        {
            let mut w = std::io::BufWriter::new(file.as_file_mut());
            self.write_to(&mut w).map_err(|e| Error::io(path, e))?;
            w.flush().map_err(|e| Error::io(path, e))?;
        }
        file.persist(path)?;

        log::info!(
            "{}: {} rows, {} channels",
            path.display(),
            self.rows.len(),
            self.names.len()
        );
        Ok(())
    }

    pub fn read_from<R: std::io::BufRead>(source: R) -> Result<Self, Error> {
        let mut lines = source.lines();
        let mut next = |lineno: usize| -> Result<String, Error> {
            match lines.next() {
                Some(line) => line.map_err(|e| format_error(lineno, e.to_string())),
                None => Err(format_error(lineno, "unexpected end of file")),
            }
        };

        let title = next(1)?.trim_end().to_string();

        let line = next(2)?;
        let mut fields = line.split_whitespace();
        let approach_speed = parse_field(2, "approach speed", fields.next())?;
        let run_kind = parse_field(2, "run kind", fields.next())?;
        let timestamp = match (fields.next(), fields.next()) {
            (Some(date), Some(time)) => chrono::NaiveDateTime::parse_from_str(
                &format!("{} {}", date, time),
                TIMESTAMP_FORMAT,
            )
            .map_err(|e| format_error(2, format!("invalid timestamp: {}", e)))?,
            _ => return Err(format_error(2, "missing timestamp")),
        };

        let line = next(3)?;
        let mut fields = line.split_whitespace();
        let nchan = parse_field(3, "channel count", fields.next())?;
        let dt = parse_field(3, "dt", fields.next())?;
        let ref_length = parse_field(3, "reference length", fields.next())?;

        let names: Vec<String> = next(4)?.split_whitespace().map(String::from).collect();
        if names.len() != nchan {
            return Err(format_error(
                4,
                format!("{} names for {} channels", names.len(), nchan),
            ));
        }

        let mut rows = Vec::new();
        for (i, line) in lines.enumerate() {
            let lineno = FIRST_ROW_LINE + i;
            let line = line.map_err(|e| format_error(lineno, e.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }

            let row = line
                .split_whitespace()
                .map(|f| parse_field(lineno, "value", Some(f)))
                .collect::<Result<Vec<f64>, Error>>()?;
            if row.len() != nchan {
                return Err(format_error(
                    lineno,
                    format!("{} values for {} channels", row.len(), nchan),
                ));
            }
            rows.push(row);
        }

        Ok(Self {
            header: Header {
                title,
                approach_speed,
                run_kind,
                timestamp,
                nchan,
                dt,
                ref_length,
            },
            names,
            rows,
        })
    }

    pub fn read<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io(path, e))?;
        Self::read_from(std::io::BufReader::new(file))
    }
}
