//! Command-line tool for `.zimg` image dumps
//!
//! Imports ordinary image files as dumps, converts dumps between pixel
//! formats, prints their headers and exports them back to PNG.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use zedbar_image::{FourCC, Image, Result};

/// Inspect, create and convert raw ZBar image dumps
#[derive(Parser)]
#[command(name = "zimgtool")]
#[command(version)]
#[command(about = "Inspect, create and convert raw ZBar image dumps", long_about = None)]
struct Args {
    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print format, size and data length of dump files
    Info {
        /// Dump files to inspect
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Read an image file (PNG, JPEG) and write it as a dump
    Import {
        /// Image file to read
        input: PathBuf,

        /// Pixel format of the dump
        #[arg(short, long, default_value = "Y800")]
        format: FourCC,

        /// Base name of the dump (defaults to the input without extension)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Convert a dump to another pixel format and/or size
    Convert {
        /// Dump file to read
        input: PathBuf,

        /// Target pixel format
        #[arg(short, long)]
        format: FourCC,

        /// Target size as WIDTHxHEIGHT (pads or crops, never scales)
        #[arg(short, long, value_parser = parse_size)]
        size: Option<(u32, u32)>,

        /// Base name of the output dump
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Write a dump as a grayscale PNG
    Export {
        /// Dump file to read
        input: PathBuf,

        /// PNG file to write
        output: PathBuf,
    },
}

fn parse_size(s: &str) -> std::result::Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let w = w.parse().map_err(|e| format!("bad width {w:?}: {e}"))?;
    let h = h.parse().map_err(|e| format!("bad height {h:?}: {e}"))?;
    Ok((w, h))
}

/// `frame.Y800.zimg` -> `frame`
fn default_base(input: &Path) -> PathBuf {
    let mut base = input.with_extension("");
    if input.extension().is_some_and(|ext| ext == "zimg") {
        base = base.with_extension("");
    }
    base
}

fn info(files: &[PathBuf]) -> Result<()> {
    for file in files {
        let image = Image::load(file)?;
        let (width, height) = image.size()?;
        println!(
            "{}: {} {}x{} {} bytes",
            file.display(),
            image.format()?,
            width,
            height,
            image.data_len()?
        );
    }
    Ok(())
}

fn import(input: &Path, format: FourCC, out: Option<PathBuf>) -> Result<()> {
    let decoded = ::image::open(input).map_err(|e| {
        log::error!("cannot decode {}: {e}", input.display());
        zedbar_image::Error::Load {
            path: input.to_path_buf(),
        }
    })?;
    let gray = decoded.to_luma8();
    let (width, height) = gray.dimensions();

    let image = Image::from_gray(gray.as_raw(), width, height)?;
    let image = if format == FourCC::Y800 {
        image
    } else {
        image.convert(format)?
    };

    let path = image.dump(out.unwrap_or_else(|| input.with_extension("")))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

fn convert(
    input: &Path,
    format: FourCC,
    size: Option<(u32, u32)>,
    out: Option<PathBuf>,
) -> Result<()> {
    let image = Image::load(input)?;
    let converted = match size {
        Some((width, height)) => image.convert_resize(format, width, height)?,
        None => image.convert(format)?,
    };
    let path = converted.dump(out.unwrap_or_else(|| default_base(input)))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

fn export(input: &Path, output: &Path) -> Result<()> {
    let image = Image::load(input)?;
    let gray = image.convert(FourCC::Y800)?;
    let (width, height) = gray.size()?;
    let buffer = ::image::GrayImage::from_raw(width, height, gray.data()?).ok_or_else(|| {
        zedbar_image::Error::Invalid(format!("buffer does not match {width}x{height}"))
    })?;
    buffer.save(output).map_err(|e| zedbar_image::Error::Dump {
        path: output.to_path_buf(),
        source: std::io::Error::other(e),
    })?;
    log::info!("wrote {}", output.display());
    Ok(())
}

fn main() {
    let args = Args::parse();

    let level = if args.quiet {
        LevelFilter::Error
    } else {
        match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    if let Err(e) = simple_logger::SimpleLogger::new().with_level(level).init() {
        eprintln!("Failed to initialize logging: {e}");
    }

    let result = match args.command {
        Command::Info { files } => info(&files),
        Command::Import { input, format, out } => import(&input, format, out),
        Command::Convert {
            input,
            format,
            size,
            out,
        } => convert(&input, format, size, out),
        Command::Export { input, output } => export(&input, &output),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
