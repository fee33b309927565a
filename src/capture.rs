// Capture Module
// Pairs decoded curve samples with their preamble scaling.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::parse_tools::{
    decode_curve, decode_preamble, CurveEncoding, ParseError, Result, SampleWidth, Samples,
    WaveformMetadata, PREAMBLE_MIN_FIELDS,
};

/// One acquired waveform: raw samples plus the metadata needed to scale them.
#[derive(Clone, Debug, PartialEq)]
pub struct Capture {
    samples: Samples,
    metadata: WaveformMetadata,
}

impl Capture {
    pub fn new(samples: Samples, metadata: WaveformMetadata) -> Self {
        Capture { samples, metadata }
    }

    /// Build a capture from a raw `CURVE?` response and a raw `WFMOUTPRE?`
    /// response.
    pub fn from_responses(
        curve: &[u8],
        encoding: CurveEncoding,
        width: SampleWidth,
        preamble: &[u8],
    ) -> Result<Self> {
        let metadata = match decode_preamble(preamble)? {
            Some(metadata) => metadata,
            None => {
                log::warn!(
                    "preamble response ({} bytes) has fewer than {} fields",
                    preamble.len(),
                    PREAMBLE_MIN_FIELDS
                );
                return Err(ParseError::MissingPreamble);
            }
        };

        let samples = decode_curve(curve, encoding, width)?;
        log::debug!(
            "decoded {} {} samples from {} curve ({} bytes)",
            samples.len(),
            width,
            encoding,
            curve.len()
        );

        Ok(Capture::new(samples, metadata))
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    pub fn metadata(&self) -> &WaveformMetadata {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn raw_values(&self) -> Vec<i32> {
        self.samples.to_i32_vec()
    }

    /// Get time values for samples
    pub fn time_values(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.metadata.time_at(i)).collect()
    }

    /// Get sample values in volts
    pub fn voltages(&self) -> Vec<f64> {
        self.samples
            .to_i32_vec()
            .into_iter()
            .map(|raw| self.metadata.voltage_of(raw))
            .collect()
    }

    /// Total time spanned by the record.
    pub fn duration(&self) -> f64 {
        self.len() as f64 * self.metadata.t_incr
    }

    /// Write time and voltage columns to a CSV file
    pub fn write_csv<P: AsRef<Path>>(&self, output_file: P) -> Result<()> {
        let file = File::create(output_file.as_ref())?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "Time,Voltage")?;

        for (i, voltage) in self.voltages().into_iter().enumerate() {
            writeln!(writer, "{},{}", self.metadata.time_at(i), voltage)?;
        }

        writer.flush()?;
        log::debug!(
            "wrote {} rows to {}",
            self.len(),
            output_file.as_ref().display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::NamedTempFile;

    fn test_metadata() -> WaveformMetadata {
        WaveformMetadata::new(0.25, -0.5, 0.5, 1.0, 0.0)
    }

    #[test]
    fn test_scaled_values() {
        let capture = Capture::new(Samples::I8(vec![1, 3, -1]), test_metadata());

        assert_eq!(capture.len(), 3);
        assert_eq!(capture.raw_values(), vec![1, 3, -1]);
        assert_eq!(capture.voltages(), vec![0.0, 1.0, -1.0]);

        let times = capture.time_values();
        let expected = [-0.5, -0.25, 0.0];
        for (i, (&actual, &expected)) in times.iter().zip(expected.iter()).enumerate() {
            assert!(
                (actual - expected).abs() < 1e-12,
                "Time value {} mismatch: {} != {}",
                i,
                actual,
                expected
            );
        }
        assert_eq!(capture.duration(), 0.75);
    }

    #[test]
    fn test_from_responses() {
        let preamble = b"0;1;2;3;4;5;6;7;8;9;1e-9;0;x;y;2;0;0";
        let capture = Capture::from_responses(
            &[0x00, 0x01, 0xff, 0xff],
            CurveEncoding::Binary,
            SampleWidth::I16,
            preamble,
        )
        .unwrap();

        assert_eq!(capture.samples(), &Samples::I16(vec![1, -1]));
        assert_eq!(capture.voltages(), vec![2.0, -2.0]);
        assert_eq!(capture.metadata().t_incr, 1e-9);
    }

    #[test]
    fn test_from_responses_short_preamble() {
        let result = Capture::from_responses(b"1,2", CurveEncoding::Ascii, SampleWidth::I8, b"1;8");
        assert!(matches!(result, Err(ParseError::MissingPreamble)));
    }

    #[test]
    fn test_from_responses_bad_curve() {
        let preamble = b"0;1;2;3;4;5;6;7;8;9;1e-9;0;x;y;2;0;0";
        let result =
            Capture::from_responses(&[0x00], CurveEncoding::Binary, SampleWidth::I16, preamble);
        assert!(matches!(
            result,
            Err(ParseError::InvalidLength { len: 1, width: 2 })
        ));
    }

    #[test]
    fn test_write_csv() {
        let capture = Capture::new(Samples::I8(vec![1, 3]), test_metadata());
        let temp_file = NamedTempFile::new().unwrap();

        capture.write_csv(temp_file.path()).unwrap();

        let content = fs::read_to_string(temp_file.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Time,Voltage");
        assert_eq!(lines[1], "-0.5,0");
        assert_eq!(lines[2], "-0.25,1");
    }
}
