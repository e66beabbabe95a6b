use canvex::{detect_edges, log_error, log_info, CannyConfig, CanvexError, Image, Logger, PngDecoder, Writer};
use clap::Parser;
use glob::glob;
use log::LevelFilter;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[clap(name = "canvex")]
struct Cli {
    #[arg(required = true, help = "Input file or glob pattern")]
    path: String,

    #[arg(short = 'o', long = "output-dir", help = "Output directory for generated files")]
    output_dir: Option<String>,

    #[arg(long, help = "Print header information")]
    info: bool,

    #[arg(long, help = "Write the Canny edge map as PGM")]
    edges: bool,

    #[arg(long, help = "Decode and write the image back as PNG")]
    reencode: bool,

    #[arg(long, default_value_t = 5)]
    kernel_size: usize,

    #[arg(long, default_value_t = 1.0)]
    sigma: f64,

    #[arg(long, default_value_t = 0.03)]
    low_ratio: f64,

    #[arg(long, default_value_t = 0.12)]
    high_ratio: f64,

    #[arg(short, long, help = "Enable debug logging")]
    verbose: bool,
}

impl Cli {
    fn canny_config(&self) -> CannyConfig {
        CannyConfig {
            kernel_size: self.kernel_size,
            sigma: self.sigma,
            low_ratio: self.low_ratio,
            high_ratio: self.high_ratio,
            ..CannyConfig::default()
        }
    }
}

fn get_files(path: &str) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let absolute_pattern = if Path::new(path).is_relative() {
        base_dir.join(path).to_string_lossy().into_owned()
    } else {
        path.to_string()
    };

    for entry in glob(&absolute_pattern)? {
        match entry {
            Ok(path) => {
                if !path.is_file() {
                    continue;
                }

                files.push(path);
            }
            Err(e) => log_error!("{:?}", e),
        }
    }

    Ok(files)
}

fn get_output_path(file: &Path, output_dir: Option<&str>, suffix: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let file_stem = file
        .file_stem()
        .ok_or("Invalid file name")?
        .to_str()
        .ok_or("Invalid file stem")?;

    let dir = match output_dir {
        Some(dir) => {
            let dir = Path::new(dir);

            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }

            if dir.is_relative() {
                std::env::current_dir()?.join(dir)
            } else {
                dir.to_path_buf()
            }
        }
        None => file.parent().unwrap_or_else(|| Path::new(".")).to_path_buf(),
    };

    Ok(dir.join(format!("{}{}", file_stem, suffix)))
}

fn process_file(file: &Path, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    println!("File: {}", file.display());

    let mut image = PngDecoder::open(file)?.decode()?;

    if cli.info {
        println!("{}", image.print_info());
    }

    if !cli.edges && !cli.reencode {
        if !cli.info {
            let output_path = get_output_path(file, cli.output_dir.as_deref(), ".ppm")?;
            log_info!("Writing to: {}", output_path.display());
            Writer::write_ppm(&output_path, &image.pixel_buffer()?)?;
        }

        return Ok(());
    }

    let pixels = image.pixel_buffer()?;

    if cli.edges {
        let edges = detect_edges(&pixels, &cli.canny_config())?;
        let output_path = get_output_path(file, cli.output_dir.as_deref(), "_edges.pgm")?;

        log_info!("Writing to: {}", output_path.display());
        Writer::write_pgm(&output_path, &edges)?;
    }

    if cli.reencode {
        image.set_pixel_buffer(&pixels)?;
        let output_path = get_output_path(file, cli.output_dir.as_deref(), "_reencoded.png")?;

        log_info!("Writing to: {}", output_path.display());
        Writer::write_png(&output_path, &image)?;
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    Logger::init(level).map_err(|e| e.to_string())?;

    cli.canny_config().validate().map_err(CanvexError::Config)?;

    let files = get_files(&cli.path)?;

    if files.is_empty() {
        log_error!("No files found matching pattern: {}", cli.path);
        return Ok(());
    }

    for file in files {
        if let Err(err) = process_file(&file, &cli) {
            log_error!("Error processing file: {}", err);
            continue;
        }
    }

    Ok(())
}
