// src/main.rs
// Command-line front end for decoding captured scope responses

use std::env;
use std::fs;
use std::process;
use tekscope::{decode_curve, decode_preamble, Capture, CurveEncoding, SampleWidth};

fn print_usage() {
    eprintln!("Usage: tekscope <command> [arguments]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  preamble <preamble_file>                                Show WFMOUTPRE? scaling");
    eprintln!("  decode <curve_file> <encoding> <width>                  Print raw sample values");
    eprintln!("  convert <curve_file> <encoding> <width> <preamble_file> <output>");
    eprintln!("                                                          Write time/voltage CSV");
    eprintln!("  info <curve_file> <encoding> <width> <preamble_file>    Summarize a capture");
    eprintln!();
    eprintln!("  <encoding> is binary or ascii, <width> is 8, 16 or 32");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  tekscope preamble wfmoutpre.txt");
    eprintln!("  tekscope decode curve.bin binary 16");
    eprintln!("  tekscope convert curve.txt ascii 8 wfmoutpre.txt output.csv");
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();

    match command {
        "preamble" => {
            let data = read_response(&args[2]);
            match decode_preamble(&data) {
                Ok(Some(metadata)) => {
                    println!("Waveform Preamble");
                    println!("=================");
                    println!("  t_incr: {:e} s", metadata.t_incr);
                    println!("  t_zero: {:e} s", metadata.t_zero);
                    println!("  v_mult: {:e} V", metadata.v_mult);
                    println!("  v_off:  {:e}", metadata.v_off);
                    println!("  v_zero: {:e} V", metadata.v_zero);
                }
                Ok(None) => {
                    eprintln!("Error: '{}' does not contain a complete preamble", args[2]);
                    process::exit(1);
                }
                Err(e) => {
                    eprintln!("Error parsing preamble '{}': {}", args[2], e);
                    process::exit(1);
                }
            }
        }

        "decode" => {
            require_args(&args, 5);
            let (encoding, width) = parse_format(&args[3], &args[4]);
            let data = read_response(&args[2]);

            match decode_curve(&data, encoding, width) {
                Ok(samples) => {
                    for value in samples.to_i32_vec() {
                        println!("{}", value);
                    }
                }
                Err(e) => {
                    eprintln!("Error decoding curve '{}': {}", args[2], e);
                    process::exit(1);
                }
            }
        }

        "convert" => {
            require_args(&args, 7);
            let capture = load_capture(&args);
            let output_file = &args[6];

            if let Err(e) = capture.write_csv(output_file) {
                eprintln!("Error writing CSV file '{}': {}", output_file, e);
                process::exit(1);
            }

            println!("Successfully converted {} to {}", args[2], output_file);
            println!("Total samples written: {}", capture.len());
        }

        "info" => {
            require_args(&args, 6);
            let capture = load_capture(&args);
            print_capture_info(&args[2], &capture);
        }

        _ => {
            eprintln!("Error: Unknown command '{}'", command);
            print_usage();
            process::exit(1);
        }
    }
}

fn require_args(args: &[String], count: usize) {
    if args.len() < count {
        eprintln!("Error: Missing arguments for '{}'", args[1]);
        print_usage();
        process::exit(1);
    }
}

fn read_response(path: &str) -> Vec<u8> {
    match fs::read(path) {
        Ok(data) => {
            log::debug!("read {} bytes from {}", data.len(), path);
            data
        }
        Err(e) => {
            eprintln!("Error reading '{}': {}", path, e);
            process::exit(1);
        }
    }
}

fn parse_format(encoding: &str, width: &str) -> (CurveEncoding, SampleWidth) {
    let encoding = encoding.parse::<CurveEncoding>().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });
    let width = width.parse::<SampleWidth>().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        process::exit(1);
    });
    (encoding, width)
}

fn load_capture(args: &[String]) -> Capture {
    let (encoding, width) = parse_format(&args[3], &args[4]);
    let curve = read_response(&args[2]);
    let preamble = read_response(&args[5]);

    match Capture::from_responses(&curve, encoding, width, &preamble) {
        Ok(capture) => capture,
        Err(e) => {
            eprintln!("Error loading capture '{}': {}", args[2], e);
            process::exit(1);
        }
    }
}

fn print_capture_info(curve_file: &str, capture: &Capture) {
    let metadata = capture.metadata();

    println!("Capture Information");
    println!("===================");
    println!();
    println!("Curve: {}", curve_file);
    println!("Sample width: {}", capture.samples().width());
    println!("Samples: {}", capture.len());
    println!();

    println!("Time Scaling:");
    println!(
        "  Sample interval: {:.3e} s ({:.3} MHz sample rate)",
        metadata.t_incr,
        1.0 / metadata.t_incr / 1e6
    );
    println!("  First sample: {:.6e} s", metadata.t_zero);
    println!("  Record duration: {:.6e} s", capture.duration());
    println!();

    println!("Voltage Scaling:");
    println!("  Multiplier: {:e} V/unit", metadata.v_mult);
    println!("  Offset: {} units", metadata.v_off);
    println!("  Zero: {} V", metadata.v_zero);

    let voltages = capture.voltages();
    if !voltages.is_empty() {
        let min_v = voltages.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let max_v = voltages.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let avg = voltages.iter().sum::<f64>() / voltages.len() as f64;

        println!("  Data range: {:.3} V to {:.3} V", min_v, max_v);
        println!("  Peak-to-peak: {:.3} V", max_v - min_v);
        println!("  Mean: {:.3} V", avg);
    }
}
