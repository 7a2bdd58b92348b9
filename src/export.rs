use crate::aggregate::COLUMN_COUNT;
use crate::types::AllSensors;
use crate::Result;
use std::io::Write;

/// Writes [`AllSensors`] snapshots as delimited text, one line per snapshot.
///
/// The header row is written lazily before the first snapshot, so an empty
/// log stays empty.
pub struct RowWriter<W: Write> {
    out: W,
    delimiter: char,
    write_header: bool,
    rows: u64,
}

impl<W: Write> RowWriter<W> {
    /// Comma-delimited writer with a header row.
    pub fn new(out: W) -> Self {
        Self::with_options(out, ',', true)
    }

    /// Writer configured from `LOOMO_CSV_DELIMITER` and `LOOMO_CSV_HEADER`.
    pub fn from_env(out: W) -> Self {
        Self::with_options(
            out,
            crate::config::csv_delimiter_from_env(),
            crate::config::csv_header_from_env(),
        )
    }

    pub fn with_options(out: W, delimiter: char, write_header: bool) -> Self {
        Self {
            out,
            delimiter,
            write_header,
            rows: 0,
        }
    }

    /// Skip the header row, e.g. when appending to an existing log.
    pub fn without_header(mut self) -> Self {
        self.write_header = false;
        self
    }

    /// Append one snapshot.
    pub fn write(&mut self, sensors: &AllSensors) -> Result<()> {
        if self.write_header {
            self.write_header = false;
            let header = AllSensors::header();
            self.write_line(header)?;
        }
        let row = sensors.to_row();
        self.write_line(&row)?;
        self.rows += 1;
        Ok(())
    }

    /// Snapshots written so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line<S: AsRef<str>>(&mut self, fields: &[S; COLUMN_COUNT]) -> Result<()> {
        let line = format_line(&fields[..], self.delimiter);
        self.out.write_all(line.as_bytes())?;
        self.out.write_all(b"\n")?;
        Ok(())
    }
}

/// Join fields with `delimiter`, quoting any field that needs it.
pub fn format_line<S: AsRef<str>>(fields: &[S], delimiter: char) -> String {
    let mut line = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push(delimiter);
        }
        let field = field.as_ref();
        if field.contains(delimiter) || field.contains('"') || field.contains('\n') {
            line.push('"');
            line.push_str(&field.replace('"', "\"\""));
            line.push('"');
        } else {
            line.push_str(field);
        }
    }
    line
}
