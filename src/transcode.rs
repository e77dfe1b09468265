//! Fixed-width to CSV transcoding.
//!
//! Slices each data line by the schema's 1-based inclusive offsets and
//! writes the values as CSV, alongside a `VARIABLE,LABEL` table. Lines
//! shorter than the record length are tolerated: fields past the end of
//! the line come out empty.

use crate::config::TranscodeOptions;
use crate::constants::LABEL_HEADER;
use crate::error::{ConvertError, Result};
use crate::models::{Row, Schema};
use std::io::{self, Write};
use tracing::debug;

/// Converts fixed-width lines to rows for one schema
#[derive(Debug, Clone)]
pub struct Transcoder {
    schema: Schema,
    options: TranscodeOptions,
}

impl Transcoder {
    /// Validate the schema offsets up front so no output is written for a bad schema
    pub fn new(schema: Schema, options: TranscodeOptions) -> Result<Self> {
        for field in schema.fields() {
            let reason = if field.start == 0 {
                Some("offsets are 1-based")
            } else if field.start > field.end {
                Some("start is after end")
            } else {
                None
            };

            if let Some(reason) = reason {
                return Err(ConvertError::InvalidSchema {
                    field: field.name.clone(),
                    start: field.start,
                    end: field.end,
                    reason: reason.to_string(),
                });
            }
        }

        debug!(
            "Transcoder ready: {} fields, record length {}",
            schema.len(),
            schema.record_length()
        );

        Ok(Self { schema, options })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn options(&self) -> TranscodeOptions {
        self.options
    }

    /// Extract every field of one line, in schema order
    pub fn slice_line(&self, line: &str, line_number: usize) -> Row {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);
        let ascii = line.is_ascii();

        let values = self
            .schema
            .fields()
            .iter()
            .map(|field| {
                let value = if ascii {
                    slice_bytes(line, field.start, field.end)
                } else {
                    slice_chars(line, field.start, field.end)
                };
                if self.options.trim_values {
                    value.trim().to_string()
                } else {
                    value.to_string()
                }
            })
            .collect();

        Row {
            line_number,
            values,
        }
    }

    /// Lazily transcode a line source; one item per input line
    pub fn rows<I>(&self, lines: I) -> Rows<'_, I::IntoIter>
    where
        I: IntoIterator<Item = io::Result<String>>,
    {
        Rows {
            transcoder: self,
            lines: lines.into_iter(),
            line_number: 0,
        }
    }

    /// Write all lines as CSV records, returning the number of data rows written
    pub fn write_csv<I, W>(&self, lines: I, writer: W) -> Result<usize>
    where
        I: IntoIterator<Item = io::Result<String>>,
        W: Write,
    {
        let mut csv = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        if self.options.include_header {
            csv.write_record(self.schema.names())?;
        }

        let mut written = 0;
        for row in self.rows(lines) {
            let row = row?;
            csv.write_record(&row.values)?;
            written += 1;
        }
        csv.flush()?;

        Ok(written)
    }

    /// `(name, label)` pairs in schema order; missing labels are empty
    pub fn label_table(&self) -> Vec<(&str, &str)> {
        self.schema
            .fields()
            .iter()
            .map(|field| (field.name.as_str(), field.label_or_empty()))
            .collect()
    }

    /// Write the label table as a two-column CSV with a `VARIABLE,LABEL` header
    pub fn write_labels<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        csv.write_record(LABEL_HEADER)?;
        for (name, label) in self.label_table() {
            csv.write_record([name, label])?;
        }
        csv.flush()?;

        Ok(())
    }
}

/// Iterator returned by [`Transcoder::rows`]
pub struct Rows<'t, I> {
    transcoder: &'t Transcoder,
    lines: I,
    line_number: usize,
}

impl<I> Iterator for Rows<'_, I>
where
    I: Iterator<Item = io::Result<String>>,
{
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        self.line_number += 1;

        Some(match line {
            Ok(line) => Ok(self.transcoder.slice_line(&line, self.line_number)),
            Err(source) => Err(ConvertError::DataRead {
                line: self.line_number,
                source,
            }),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.lines.size_hint()
    }
}

fn slice_bytes(line: &str, start: usize, end: usize) -> &str {
    if start > line.len() {
        return "";
    }
    &line[start - 1..end.min(line.len())]
}

fn slice_chars(line: &str, start: usize, end: usize) -> &str {
    let mut offsets = line
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(line.len()));

    let Some(begin) = offsets.nth(start - 1) else {
        return "";
    };
    if begin == line.len() {
        return "";
    }
    let finish = offsets.nth(end - start).unwrap_or(line.len());
    &line[begin..finish]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldDefinition;

    fn worked_example() -> Schema {
        Schema::from_fields(vec![
            FieldDefinition::new("COLUMN001", 1, 1).with_label("FIRST COLUMN"),
            FieldDefinition::new("COLUMN002", 2, 2).with_label("SECOND COLUMN"),
            FieldDefinition::new("COLUMN003", 3, 5).with_label("THIRD COLUMN"),
            FieldDefinition::new("COLUMN004", 6, 8).with_label("FOURTH COLUMN"),
        ])
        .unwrap()
    }

    fn lines(data: &[&str]) -> Vec<io::Result<String>> {
        data.iter().map(|l| Ok(l.to_string())).collect()
    }

    #[test]
    fn test_worked_example_row() {
        let transcoder = Transcoder::new(worked_example(), TranscodeOptions::default()).unwrap();
        let row = transcoder.slice_line("1ab c111", 1);
        assert_eq!(row.values, vec!["1", "a", "b c", "111"]);
    }

    #[test]
    fn test_short_line_yields_empty_fields() {
        let transcoder = Transcoder::new(worked_example(), TranscodeOptions::default()).unwrap();
        assert_eq!(
            transcoder.slice_line("1ab", 1).values,
            vec!["1", "a", "b", ""]
        );
        assert_eq!(transcoder.slice_line("", 2).values, vec!["", "", "", ""]);
    }

    #[test]
    fn test_carriage_return_removed() {
        let transcoder = Transcoder::new(worked_example(), TranscodeOptions::default()).unwrap();
        assert_eq!(
            transcoder.slice_line("1ab c11\r", 1).values,
            vec!["1", "a", "b c", "11"]
        );
    }

    #[test]
    fn test_non_ascii_counts_characters() {
        let transcoder = Transcoder::new(worked_example(), TranscodeOptions::default()).unwrap();
        assert_eq!(
            transcoder.slice_line("1éü ç22", 1).values,
            vec!["1", "é", "ü ç", "22"]
        );
    }

    #[test]
    fn test_raw_values_keep_padding() {
        let schema = Schema::from_fields(vec![FieldDefinition::new("A", 1, 4)]).unwrap();
        let raw = Transcoder::new(schema.clone(), TranscodeOptions::default()).unwrap();
        assert_eq!(raw.slice_line(" 7  ", 1).values, vec![" 7  "]);

        let trimmed = Transcoder::new(
            schema,
            TranscodeOptions {
                trim_values: true,
                ..TranscodeOptions::default()
            },
        )
        .unwrap();
        assert_eq!(trimmed.slice_line(" 7  ", 1).values, vec!["7"]);
    }

    #[test]
    fn test_invalid_offsets_rejected_before_processing() {
        let schema = Schema::from_fields(vec![
            FieldDefinition::new("OK", 1, 2),
            FieldDefinition::new("BAD", 9, 4),
        ])
        .unwrap();
        match Transcoder::new(schema, TranscodeOptions::default()) {
            Err(ConvertError::InvalidSchema {
                field, start, end, ..
            }) => {
                assert_eq!(field, "BAD");
                assert_eq!((start, end), (9, 4));
            }
            other => panic!("Expected InvalidSchema, got {:?}", other),
        }

        let zero = Schema::from_fields(vec![FieldDefinition::new("Z", 0, 1)]).unwrap();
        assert!(Transcoder::new(zero, TranscodeOptions::default()).is_err());
    }

    #[test]
    fn test_rows_number_lines_and_surface_read_errors() {
        let transcoder = Transcoder::new(worked_example(), TranscodeOptions::default()).unwrap();
        let input = vec![
            Ok("1ab c111".to_string()),
            Err(io::Error::new(io::ErrorKind::InvalidData, "bad bytes")),
        ];
        let mut rows = transcoder.rows(input);

        let first = rows.next().unwrap().unwrap();
        assert_eq!(first.line_number, 1);
        assert_eq!(first.get(2), Some("b c"));
        assert_eq!(first.get(4), None);
        match rows.next().unwrap() {
            Err(ConvertError::DataRead { line, .. }) => assert_eq!(line, 2),
            other => panic!("Expected DataRead, got {:?}", other),
        }
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_write_csv_with_header() {
        let transcoder = Transcoder::new(worked_example(), TranscodeOptions::default()).unwrap();
        let mut out = Vec::new();
        let written = transcoder
            .write_csv(lines(&["1ab c111", "2xy,z222"]), &mut out)
            .unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "COLUMN001,COLUMN002,COLUMN003,COLUMN004\n1,a,b c,111\n2,x,\"y,z\",222\n"
        );
    }

    #[test]
    fn test_write_csv_without_header() {
        let options = TranscodeOptions {
            include_header: false,
            ..TranscodeOptions::default()
        };
        let transcoder = Transcoder::new(worked_example(), options).unwrap();
        let mut out = Vec::new();
        transcoder.write_csv(lines(&["1ab\"c111"]), &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "1,a,\"b\"\"c\",111\n");
    }

    #[test]
    fn test_label_table_includes_unlabelled_fields() {
        let schema = Schema::from_fields(vec![
            FieldDefinition::new("A", 1, 1).with_label("ALPHA, FIRST"),
            FieldDefinition::new("B", 2, 2),
        ])
        .unwrap();
        let transcoder = Transcoder::new(schema, TranscodeOptions::default()).unwrap();
        assert_eq!(
            transcoder.label_table(),
            vec![("A", "ALPHA, FIRST"), ("B", "")]
        );

        let mut out = Vec::new();
        transcoder.write_labels(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "VARIABLE,LABEL\nA,\"ALPHA, FIRST\"\nB,\n"
        );
    }
}
