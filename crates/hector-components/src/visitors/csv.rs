use super::{OutputRecord, RecordSink};
use hector_core::errors::HectorResult;
use std::io::Write;

const HEADER: &str = "run_name,spinup,date,component,variable,value,units";

/// Writes records as comma-separated lines, preceded by a header line
/// unless built with [`CsvSink::without_header`].
#[derive(Debug)]
pub struct CsvSink<W: Write> {
    writer: W,
    needs_header: bool,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            needs_header: true,
        }
    }

    /// Skip the header, for appending to output that already has one.
    pub fn without_header(mut self) -> Self {
        self.needs_header = false;
        self
    }

    pub fn flush(&mut self) -> HectorResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Quote a field if it would otherwise break the line apart.
fn field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn push(&mut self, record: OutputRecord) -> HectorResult<()> {
        if self.needs_header {
            writeln!(self.writer, "{HEADER}")?;
            self.needs_header = false;
        }
        writeln!(
            self.writer,
            "{},{},{},{},{},{},{}",
            field(&record.run_name),
            u8::from(record.spinup),
            record.date,
            field(&record.component),
            field(&record.variable),
            record.value,
            field(&record.units),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(run_name: &str) -> OutputRecord {
        OutputRecord {
            run_name: run_name.to_string(),
            spinup: false,
            date: 1800.0,
            component: "CH4".to_string(),
            variable: "CH4".to_string(),
            value: 700.5,
            units: "ppbv CH4".to_string(),
        }
    }

    #[test]
    fn header_then_lines() {
        let mut sink = CsvSink::new(Vec::new());
        sink.push(record("default")).unwrap();
        sink.push(record("default")).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                HEADER,
                "default,0,1800,CH4,CH4,700.5,ppbv CH4",
                "default,0,1800,CH4,CH4,700.5,ppbv CH4",
            ]
        );
    }

    #[test]
    fn appending_skips_the_header() {
        let mut buffer = Vec::new();
        CsvSink::new(&mut buffer).push(record("first")).unwrap();
        let mut sink = CsvSink::new(&mut buffer).without_header();
        sink.push(record("second")).unwrap();
        sink.flush().unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec![
                HEADER,
                "first,0,1800,CH4,CH4,700.5,ppbv CH4",
                "second,0,1800,CH4,CH4,700.5,ppbv CH4",
            ]
        );
    }

    #[test]
    fn awkward_fields_are_quoted() {
        let mut sink = CsvSink::new(Vec::new());
        sink.push(record("a,\"b\"")).unwrap();
        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            text.lines().nth(1),
            Some("\"a,\"\"b\"\"\",0,1800,CH4,CH4,700.5,ppbv CH4")
        );
    }
}
