//! Buffered GFF output.
//!
//! Uses itoa for integer formatting and ryu for float formatting
//! to avoid allocation in the hot path.

use crate::gff::GffError;
use crate::scoring::{FieldValue, ScoreResult};
use std::io::{BufWriter, Write};

/// Output buffer size (2 MB).
pub const DEFAULT_OUTPUT_BUFFER: usize = 2 * 1024 * 1024;

/// Source column of every emitted record.
pub const OUTPUT_SOURCE: &str = "dzlab";

/// Writer for scored window records.
pub struct GffWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    ryu_buf: ryu::Buffer,
    lines: u64,
}

impl<W: Write> GffWriter<W> {
    /// Create a new GffWriter with the default buffer size.
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_OUTPUT_BUFFER, output)
    }

    /// Create a new GffWriter with specified buffer size.
    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
            ryu_buf: ryu::Buffer::new(),
            lines: 0,
        }
    }

    /// Write one window record. `result` None writes a placeholder row.
    pub fn write_window(
        &mut self,
        seqname: &str,
        feature: &str,
        start: u64,
        end: u64,
        locus: Option<&str>,
        result: Option<&ScoreResult>,
    ) -> Result<(), GffError> {
        self.write_str(seqname)?;
        self.write_tab()?;
        self.write_str(OUTPUT_SOURCE)?;
        self.write_tab()?;
        self.write_str(feature)?;
        self.write_tab()?;
        self.write_int(start)?;
        self.write_tab()?;
        self.write_int(end)?;
        self.write_tab()?;
        match result.and_then(|r| r.score) {
            Some(score) => self.write_float(score)?,
            None => self.write_str(".")?,
        }
        self.write_str("\t.\t.\t")?;
        self.write_attribute(locus, result)?;
        self.write_newline()?;
        self.lines += 1;
        Ok(())
    }

    /// `ID=<locus>` then result fields in key order, joined by `; `.
    fn write_attribute(
        &mut self,
        locus: Option<&str>,
        result: Option<&ScoreResult>,
    ) -> Result<(), GffError> {
        let mut first = true;
        if let Some(locus) = locus {
            self.write_str("ID=")?;
            self.write_str(locus)?;
            first = false;
        }
        if let Some(result) = result {
            for (key, value) in &result.fields {
                if !first {
                    self.write_str("; ")?;
                }
                first = false;
                self.write_str(key)?;
                self.write_str("=")?;
                self.write_value(value)?;
            }
        }
        if first {
            self.write_str(".")?;
        }
        Ok(())
    }

    fn write_value(&mut self, value: &FieldValue) -> Result<(), GffError> {
        match value {
            FieldValue::Int(n) => self.write_int(*n),
            FieldValue::Float(f) => self.write_float(*f),
            FieldValue::Text(s) => self.write_str(s),
        }
    }

    #[inline]
    pub fn write_str(&mut self, s: &str) -> Result<(), GffError> {
        self.writer.write_all(s.as_bytes()).map_err(GffError::Io)
    }

    #[inline]
    pub fn write_tab(&mut self) -> Result<(), GffError> {
        self.writer.write_all(b"\t").map_err(GffError::Io)
    }

    #[inline]
    pub fn write_newline(&mut self) -> Result<(), GffError> {
        self.writer.write_all(b"\n").map_err(GffError::Io)
    }

    /// Write an integer using itoa.
    #[inline]
    pub fn write_int<I: itoa::Integer>(&mut self, n: I) -> Result<(), GffError> {
        self.writer
            .write_all(self.itoa_buf.format(n).as_bytes())
            .map_err(GffError::Io)
    }

    /// Write a float using ryu. Non-finite values are written as `.`.
    #[inline]
    pub fn write_float(&mut self, f: f64) -> Result<(), GffError> {
        if !f.is_finite() {
            return self.write_str(".");
        }
        self.writer
            .write_all(self.ryu_buf.format_finite(f).as_bytes())
            .map_err(GffError::Io)
    }

    /// Lines written so far.
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Flush the output buffer.
    pub fn flush(&mut self) -> Result<(), GffError> {
        self.writer.flush().map_err(GffError::Io)
    }
}
