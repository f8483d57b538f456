//! POCKET+ Command Line Interface
//!
//! A unified command-line interface for CCSDS 124.0-B-1 compression and
//! decompression.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::doc_markdown)]

use std::fs::{self, File};
use std::io::{Read, Write};
use std::process;

use clap::{Parser, Subcommand};
use log::info;
use pocketplus::{compress, decompress};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// ASCII art banner for help output.
const BANNER: &str = r"
  ____   ___   ____ _  _______ _____     _
 |  _ \ / _ \ / ___| |/ / ____|_   _|  _| |_
 | |_) | | | | |   | ' /|  _|   | |   |_   _|
 |  __/| |_| | |___| . \| |___  | |     |_|
 |_|    \___/ \____|_|\_\_____| |_|

         by  T A N A G R A  S P A C E
";

const CITATION: &str = "D. Evans, G. Labreche, D. Marszk, S. Bammens, M. Hernandez-Cabronero,\n\
     V. Zelenevskiy, V. Shiradhonkar, M. Starcik, and M. Henkel. 2022.\n\
     \"Implementing the New CCSDS Housekeeping Data Compression Standard\n\
     124.0-B-1 (based on POCKET+) on OPS-SAT-1,\" Proceedings of the\n\
     Small Satellite Conference, Communications, SSC22-XII-03.\n\
     https://digitalcommons.usu.edu/smallsat/2022/all2022/133/";

#[derive(Parser)]
#[command(name = "pocketplus", version = VERSION, before_help = BANNER)]
#[command(about = "CCSDS 124.0-B-1 lossless housekeeping data compression")]
#[command(after_help = CITATION)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress a fixed-length-packet-aligned file.
    Compress {
        /// Input file to compress.
        input: String,
        /// Packet size in bytes (e.g. 90).
        packet_size: usize,
        /// New-mask period (e.g. 10, 20).
        pt: usize,
        /// Send-mask period (e.g. 20, 50).
        ft: usize,
        /// Uncompressed period (e.g. 50, 100).
        rt: usize,
        /// Robustness level 0-7 (e.g. 1, 2).
        robustness: u8,
    },
    /// Decompress a previously compressed file.
    Decompress {
        /// Compressed input file.
        input: String,
        /// Original packet size in bytes.
        packet_size: usize,
        /// Robustness level (must match compression).
        robustness: u8,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let _ = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{}] {}", record.level(), message));
        })
        .level(level)
        .chain(std::io::stderr())
        .apply();
}

/// Create output filename for decompression.
///
/// Removes .pkt extension if present, then appends .depkt.
fn make_decompress_filename(input: &str) -> String {
    if let Some(stripped) = input.strip_suffix(".pkt") {
        format!("{stripped}.depkt")
    } else if let Some(stripped) = input.strip_suffix(".PKT") {
        format!("{stripped}.depkt")
    } else {
        format!("{input}.depkt")
    }
}

/// Read a file into a byte vector.
fn read_file(path: &str) -> Result<Vec<u8>, String> {
    let mut file = File::open(path).map_err(|e| format!("Cannot open input file: {e}"))?;

    let metadata = fs::metadata(path).map_err(|e| format!("Cannot read file metadata: {e}"))?;

    let mut buffer = Vec::with_capacity(metadata.len() as usize);
    file.read_to_end(&mut buffer)
        .map_err(|e| format!("Failed to read input file: {e}"))?;

    if buffer.is_empty() {
        return Err("Input file is empty".to_string());
    }

    Ok(buffer)
}

/// Write a byte vector to a file.
fn write_file(path: &str, data: &[u8]) -> Result<(), String> {
    let mut file = File::create(path).map_err(|e| format!("Cannot create output file: {e}"))?;

    file.write_all(data)
        .map_err(|e| format!("Failed to write output file: {e}"))?;

    Ok(())
}

/// Compress a file.
fn do_compress(
    input_path: &str,
    packet_size: usize,
    pt_period: usize,
    ft_period: usize,
    rt_period: usize,
    robustness: u8,
) -> Result<(), String> {
    if packet_size == 0 || packet_size > 8192 {
        return Err("packet_size must be 1-8192 bytes".to_string());
    }

    let input_data = read_file(input_path)?;
    let input_size = input_data.len();

    if input_size % packet_size != 0 {
        return Err(format!(
            "Input size ({input_size}) not divisible by packet size ({packet_size})"
        ));
    }

    let output_path = format!("{input_path}.pkt");

    let packet_bits = packet_size * 8;
    let output_data = compress(
        &input_data,
        packet_bits,
        robustness as usize,
        pt_period,
        ft_period,
        rt_period,
    )
    .map_err(|e| format!("Compression failed: {e}"))?;

    let output_size = output_data.len();

    write_file(&output_path, &output_data)?;

    let num_packets = input_size / packet_size;
    let ratio = input_size as f64 / output_size as f64;
    println!("Input:       {input_path} ({input_size} bytes, {num_packets} packets)");
    println!("Output:      {output_path} ({output_size} bytes)");
    println!("Ratio:       {ratio:.2}x");
    println!("Parameters:  R={robustness}, pt={pt_period}, ft={ft_period}, rt={rt_period}");
    info!(
        "compressed {input_path} -> {output_path}: {input_size}B -> {output_size}B ({num_packets} packets, ratio {ratio:.2}x)"
    );

    Ok(())
}

/// Decompress a file.
fn do_decompress(input_path: &str, packet_size: usize, robustness: u8) -> Result<(), String> {
    if packet_size == 0 || packet_size > 8192 {
        return Err("packet_size must be 1-8192 bytes".to_string());
    }

    let input_data = read_file(input_path)?;
    let input_size = input_data.len();

    let output_path = make_decompress_filename(input_path);

    let packet_bits = packet_size * 8;
    let output_data = decompress(&input_data, packet_bits, robustness as usize)
        .map_err(|e| format!("Decompression failed: {e}"))?;

    let output_size = output_data.len();

    write_file(&output_path, &output_data)?;

    let num_packets = output_size / packet_size;
    let ratio = output_size as f64 / input_size as f64;
    println!("Input:       {input_path} ({input_size} bytes)");
    println!("Output:      {output_path} ({output_size} bytes, {num_packets} packets)");
    println!("Expansion:   {ratio:.2}x");
    println!("Parameters:  packet_size={packet_size}, R={robustness}");
    info!(
        "decompressed {input_path} -> {output_path}: {input_size}B -> {output_size}B ({num_packets} packets)"
    );

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Compress {
            input,
            packet_size,
            pt,
            ft,
            rt,
            robustness,
        } => do_compress(&input, packet_size, pt, ft, rt, robustness),
        Command::Decompress {
            input,
            packet_size,
            robustness,
        } => do_decompress(&input, packet_size, robustness),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
