// Response parsing module
// Decoders for raw bytes returned by the scope's CURVE? and WFMOUTPRE? queries.

use std::fmt;
use std::io;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid buffer length: {len} bytes is not a multiple of the {width}-byte sample width")]
    InvalidLength { len: usize, width: usize },

    #[error("Invalid integer token at index {index}: {token:?}")]
    InvalidToken { index: usize, token: String },

    #[error("Invalid preamble field {name} (index {index}): {value:?}")]
    InvalidField {
        name: &'static str,
        index: usize,
        value: String,
    },

    #[error("Preamble has fewer than {} fields", PREAMBLE_MIN_FIELDS)]
    MissingPreamble,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// Minimum number of `;`-separated fields a preamble needs to carry scaling.
pub const PREAMBLE_MIN_FIELDS: usize = 17;

const T_INCR_FIELD: usize = 10;
const T_ZERO_FIELD: usize = 11;
const V_MULT_FIELD: usize = 14;
const V_OFF_FIELD: usize = 15;
const V_ZERO_FIELD: usize = 16;

/// Width and signedness of one curve sample, as negotiated with the
/// instrument through `DATA:WIDTH`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SampleWidth {
    I8,
    I16,
    I32,
}

impl SampleWidth {
    /// Size of one sample on the wire.
    pub fn bytes(self) -> usize {
        match self {
            SampleWidth::I8 => 1,
            SampleWidth::I16 => 2,
            SampleWidth::I32 => 4,
        }
    }

    pub fn bits(self) -> u32 {
        self.bytes() as u32 * 8
    }
}

impl fmt::Display for SampleWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i{}", self.bits())
    }
}

impl FromStr for SampleWidth {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "8" | "i8" | "1" => Ok(SampleWidth::I8),
            "16" | "i16" | "2" => Ok(SampleWidth::I16),
            "32" | "i32" | "4" => Ok(SampleWidth::I32),
            other => Err(ParseError::InvalidArgument(format!(
                "unsupported sample width '{}' (expected 8, 16 or 32)",
                other
            ))),
        }
    }
}

/// Encoding of a curve response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CurveEncoding {
    /// Big-endian signed integers (`RIBinary`)
    Binary,
    /// Comma-separated decimal integers
    Ascii,
}

impl fmt::Display for CurveEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveEncoding::Binary => write!(f, "binary"),
            CurveEncoding::Ascii => write!(f, "ascii"),
        }
    }
}

impl FromStr for CurveEncoding {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "ribinary" | "ri" => Ok(CurveEncoding::Binary),
            "ascii" | "asc" => Ok(CurveEncoding::Ascii),
            other => Err(ParseError::InvalidArgument(format!(
                "unsupported curve encoding '{}' (expected binary or ascii)",
                other
            ))),
        }
    }
}

/// A fixed-width signed sample type the decoders can produce.
pub trait Sample: Copy + fmt::Debug + PartialEq {
    const WIDTH: SampleWidth;

    /// Read one sample from exactly `WIDTH.bytes()` big-endian bytes.
    fn read_be(bytes: &[u8]) -> Result<Self>;

    /// Two's-complement truncation, same as an `as` cast.
    fn wrap_from(value: i64) -> Self;

    fn widen(self) -> i32;
}

macro_rules! impl_sample {
    ($ty:ty, $width:expr) => {
        impl Sample for $ty {
            const WIDTH: SampleWidth = $width;

            fn read_be(bytes: &[u8]) -> Result<Self> {
                bytes
                    .try_into()
                    .map(<$ty>::from_be_bytes)
                    .map_err(|_| ParseError::InvalidLength {
                        len: bytes.len(),
                        width: $width.bytes(),
                    })
            }

            fn wrap_from(value: i64) -> Self {
                value as $ty
            }

            fn widen(self) -> i32 {
                self as i32
            }
        }
    };
}

impl_sample!(i8, SampleWidth::I8);
impl_sample!(i16, SampleWidth::I16);
impl_sample!(i32, SampleWidth::I32);

/// Decoded curve data, tagged with the width it was decoded at.
#[derive(Clone, Debug, PartialEq)]
pub enum Samples {
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
}

impl Samples {
    pub fn width(&self) -> SampleWidth {
        match self {
            Samples::I8(_) => SampleWidth::I8,
            Samples::I16(_) => SampleWidth::I16,
            Samples::I32(_) => SampleWidth::I32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Samples::I8(v) => v.len(),
            Samples::I16(v) => v.len(),
            Samples::I32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Widen every sample to `i32`.
    pub fn to_i32_vec(&self) -> Vec<i32> {
        match self {
            Samples::I8(v) => v.iter().map(|&s| s.widen()).collect(),
            Samples::I16(v) => v.iter().map(|&s| s.widen()).collect(),
            Samples::I32(v) => v.clone(),
        }
    }
}

/// Scaling information taken from a `WFMOUTPRE?` response.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveformMetadata {
    /// Seconds per sample
    pub t_incr: f64,
    /// Time of the first sample
    pub t_zero: f64,
    /// Volts per digitizer unit
    pub v_mult: f64,
    /// Offset in digitizer units
    pub v_off: f64,
    /// Offset in volts
    pub v_zero: f64,
}

impl WaveformMetadata {
    pub const fn new(t_incr: f64, t_zero: f64, v_mult: f64, v_off: f64, v_zero: f64) -> Self {
        WaveformMetadata {
            t_incr,
            t_zero,
            v_mult,
            v_off,
            v_zero,
        }
    }

    /// Time of the sample at `index`.
    pub fn time_at(&self, index: usize) -> f64 {
        self.t_zero + index as f64 * self.t_incr
    }

    /// Convert a raw digitizer value to volts.
    pub fn voltage_of(&self, raw: i32) -> f64 {
        (raw as f64 - self.v_off) * self.v_mult + self.v_zero
    }
}

/// Decode an RIBinary buffer into samples of type `T`.
pub fn decode_binary_as<T: Sample>(data: &[u8]) -> Result<Vec<T>> {
    let width = T::WIDTH.bytes();
    if data.len() % width != 0 {
        return Err(ParseError::InvalidLength {
            len: data.len(),
            width,
        });
    }

    data.chunks_exact(width).map(T::read_be).collect()
}

/// Decode a comma-separated ASCII curve into samples of type `T`.
///
/// Values outside the range of `T` wrap. An empty buffer is an error.
pub fn decode_ascii_as<T: Sample>(data: &[u8]) -> Result<Vec<T>> {
    strip_terminator(data)
        .split(|&b| b == b',')
        .enumerate()
        .map(|(index, token)| parse_integer(index, token).map(T::wrap_from))
        .collect()
}

/// Decode an RIBinary buffer at the given width.
///
/// ```
/// use tekscope::{decode_binary, SampleWidth, Samples};
///
/// let samples = decode_binary(&[0x07, 0x05, 0xf8, 0xc1], SampleWidth::I16).unwrap();
/// assert_eq!(samples, Samples::I16(vec![1797, -1855]));
/// ```
pub fn decode_binary(data: &[u8], width: SampleWidth) -> Result<Samples> {
    Ok(match width {
        SampleWidth::I8 => Samples::I8(decode_binary_as(data)?),
        SampleWidth::I16 => Samples::I16(decode_binary_as(data)?),
        SampleWidth::I32 => Samples::I32(decode_binary_as(data)?),
    })
}

/// Decode an ASCII curve at the given width.
pub fn decode_ascii(data: &[u8], width: SampleWidth) -> Result<Samples> {
    Ok(match width {
        SampleWidth::I8 => Samples::I8(decode_ascii_as(data)?),
        SampleWidth::I16 => Samples::I16(decode_ascii_as(data)?),
        SampleWidth::I32 => Samples::I32(decode_ascii_as(data)?),
    })
}

/// Decode a curve response in either encoding.
pub fn decode_curve(data: &[u8], encoding: CurveEncoding, width: SampleWidth) -> Result<Samples> {
    match encoding {
        CurveEncoding::Binary => decode_binary(data, width),
        CurveEncoding::Ascii => decode_ascii(data, width),
    }
}

/// Parse a `WFMOUTPRE?` response.
///
/// Returns `Ok(None)` when the record has fewer than
/// [`PREAMBLE_MIN_FIELDS`] fields, which happens when the scope has no
/// waveform to describe yet.
pub fn decode_preamble(data: &[u8]) -> Result<Option<WaveformMetadata>> {
    let fields: Vec<&[u8]> = strip_terminator(data).split(|&b| b == b';').collect();
    if fields.len() < PREAMBLE_MIN_FIELDS {
        return Ok(None);
    }

    Ok(Some(WaveformMetadata {
        t_incr: parse_field(&fields, T_INCR_FIELD, "t_incr")?,
        t_zero: parse_field(&fields, T_ZERO_FIELD, "t_zero")?,
        v_mult: parse_field(&fields, V_MULT_FIELD, "v_mult")?,
        v_off: parse_field(&fields, V_OFF_FIELD, "v_off")?,
        v_zero: parse_field(&fields, V_ZERO_FIELD, "v_zero")?,
    }))
}

/// Drop one trailing `\n` or `\r\n`.
fn strip_terminator(data: &[u8]) -> &[u8] {
    match data.strip_suffix(b"\n") {
        Some(line) => line.strip_suffix(b"\r").unwrap_or(line),
        None => data,
    }
}

fn parse_integer(index: usize, token: &[u8]) -> Result<i64> {
    std::str::from_utf8(token)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| ParseError::InvalidToken {
            index,
            token: String::from_utf8_lossy(token).into_owned(),
        })
}

fn parse_field(fields: &[&[u8]], index: usize, name: &'static str) -> Result<f64> {
    let raw = fields[index];
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| ParseError::InvalidField {
            name,
            index,
            value: String::from_utf8_lossy(raw).into_owned(),
        })
}
