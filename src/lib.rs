// src/lib.rs
// tekscope Library - Public API

//! # tekscope
//!
//! Decoders for the raw responses of a Tektronix oscilloscope's query
//! interface.
//!
//! ## Features
//!
//! - Decode `RIBinary` curve data (big-endian 8/16/32-bit signed integers)
//! - Decode ASCII curve data (comma-separated integers)
//! - Parse the `WFMOUTPRE?` preamble into scaling metadata
//! - Scale samples to time and voltage, export to CSV
//!
//! The decoders are pure functions: they do no I/O and hold no state, so
//! they can be called from any thread.
//!
//! ## Example
//!
//! ```
//! use tekscope::{decode_ascii, decode_preamble, SampleWidth, Samples};
//!
//! let samples = decode_ascii(b"1,2", SampleWidth::I8)?;
//! assert_eq!(samples, Samples::I8(vec![1, 2]));
//!
//! // A preamble that is too short carries no metadata
//! assert!(decode_preamble(b"1;8;BINARY")?.is_none());
//! # Ok::<(), tekscope::ParseError>(())
//! ```

mod capture;
mod parse_tools;

pub use capture::Capture;
pub use parse_tools::{
    decode_ascii, decode_ascii_as, decode_binary, decode_binary_as, decode_curve, decode_preamble,
    CurveEncoding, ParseError, Result, Sample, SampleWidth, Samples, WaveformMetadata,
    PREAMBLE_MIN_FIELDS,
};
