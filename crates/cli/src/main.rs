//! gridcalc CLI - raster algebra, focal and zonal statistics

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use gridcalc_algorithms::algebra::{apply, unary, BinaryOp, Operand, UnaryOp};
use gridcalc_algorithms::statistics::{
    fill_missing_with, focal, zonal, zonal_table, FocalParams, MissingPolicy,
    MultiStatisticReducer, Statistic, MAX_FILL_EXPONENT,
};
use gridcalc_algorithms::terrain::{
    aspect, hillshade, slope, AspectOutput, HillshadeParams, SlopeParams, SlopeUnits,
};
use gridcalc_core::align::{standardize_with, AffineResampler, ExtentMode, Resampling};
use gridcalc_core::crs;
use gridcalc_core::io::{read_grid, write_grid};
use gridcalc_core::mosaic::mosaic;
use gridcalc_core::raster::{ElementKind, Grid};
use gridcalc_core::stack::Stack;
use gridcalc_tiled::{Progress, TilingConfig};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "gridcalc")]
#[command(author, version, about = "Raster grid algebra and statistics", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a grid file
    Info {
        /// Input GeoTIFF
        input: PathBuf,
    },
    /// Moving window statistics
    Focal {
        /// Input GeoTIFF
        input: PathBuf,
        /// Output GeoTIFF; with several statistics, one file per statistic
        /// is written with the statistic name appended to the stem
        output: PathBuf,
        /// Statistics: mean, sum, count, std, var, min, max, median, range,
        /// percentile:P, quantile:Q, count-equal:V
        #[arg(short, long, value_delimiter = ',', default_value = "mean")]
        stat: Vec<Statistic>,
        /// Window radius in cells
        #[arg(short, long, default_value = "1")]
        buffer: usize,
        /// Circular instead of square window
        #[arg(short, long)]
        circular: bool,
        /// Missing cells in the window: ignore, propagate
        #[arg(short, long, default_value = "ignore")]
        policy: MissingPolicy,
        /// Memory bound: tile side = budget / buffer / grid count
        #[arg(long, default_value = "8000")]
        cell_budget: usize,
    },
    /// Apply an operator: `calc a.tif add b.tif -o out.tif`, `calc a.tif abs -o out.tif`
    Calc {
        /// Left operand: grid file or number
        left: String,
        /// Operator name or symbol (add, +, gt, >, sin, round:2, ...)
        op: String,
        /// Right operand for binary operators: grid file or number
        right: Option<String>,
        /// Output GeoTIFF
        #[arg(short, long)]
        output: PathBuf,
        /// Storage kind of the output file
        #[arg(short, long)]
        kind: Option<ElementKind>,
    },
    /// Merge grids; earlier inputs take priority where they have values
    Mosaic {
        /// Input GeoTIFFs, highest priority first
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        /// Output GeoTIFF
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Align grids onto a common cell size and extent
    Standardize {
        /// Input GeoTIFFs
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        /// Output directory; files keep their names
        #[arg(short, long)]
        out_dir: PathBuf,
        /// Common extent: intersect, union
        #[arg(short, long, default_value = "intersect")]
        mode: ExtentMode,
        /// Resampling when cell sizes differ: nearest, bilinear, cubic
        #[arg(short, long, default_value = "nearest")]
        resampling: Resampling,
    },
    /// Statistics per zone
    Zonal {
        /// Value GeoTIFF
        input: PathBuf,
        /// Zone GeoTIFF
        zones: PathBuf,
        /// Output GeoTIFF; omit to print a table
        output: Option<PathBuf>,
        /// Statistic computed per zone
        #[arg(short, long, default_value = "mean")]
        stat: Statistic,
        /// Missing cells in a zone: ignore, propagate
        #[arg(short, long, default_value = "ignore")]
        policy: MissingPolicy,
    },
    /// Fill missing cells from growing neighbourhoods
    Fill {
        /// Input GeoTIFF
        input: PathBuf,
        /// Output GeoTIFF
        output: PathBuf,
        /// Largest neighbourhood radius is 2^max_exponent cells
        #[arg(short, long, default_value = "6")]
        max_exponent: u32,
        /// Memory bound: tile side = budget / reach
        #[arg(long, default_value = "8000")]
        cell_budget: usize,
    },
    /// Terrain analysis of elevation grids
    Terrain {
        #[command(subcommand)]
        algorithm: TerrainCommands,
    },
    /// Print the value of every band at a point
    Sample {
        /// Input GeoTIFFs, one band each; they are aligned on their intersection
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,
        /// X coordinate in the grids' reference system
        #[arg(short, long, allow_hyphen_values = true)]
        x: f64,
        /// Y coordinate in the grids' reference system
        #[arg(short, long, allow_hyphen_values = true)]
        y: f64,
    },
}

// ─── Terrain subcommands ────────────────────────────────────────────────

#[derive(Subcommand)]
enum TerrainCommands {
    /// Calculate slope from DEM
    Slope {
        /// Input DEM file
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// Output units: degrees, percent, radians
        #[arg(short, long, default_value = "degrees")]
        units: SlopeUnits,
        /// Z-factor for unit conversion
        #[arg(short, long, default_value = "1.0")]
        z_factor: f64,
    },
    /// Calculate aspect from DEM
    Aspect {
        /// Input DEM file
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// Output format: degrees, radians, compass
        #[arg(short, long, default_value = "degrees")]
        format: AspectOutput,
    },
    /// Calculate hillshade from DEM
    Hillshade {
        /// Input DEM file
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// Sun azimuth in degrees (0=North, clockwise)
        #[arg(short, long, default_value = "315")]
        azimuth: f64,
        /// Sun altitude in degrees above horizon
        #[arg(short = 'l', long, default_value = "45")]
        altitude: f64,
        /// Z-factor for vertical exaggeration
        #[arg(short, long, default_value = "1.0")]
        z_factor: f64,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set up logging")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Progress bar over the tiles of a tiled run
struct TileBar {
    bar: Option<ProgressBar>,
}

impl TileBar {
    fn new() -> Self {
        Self { bar: None }
    }
}

impl Progress for TileBar {
    fn tile_done(&mut self, done: usize, total: usize) {
        let bar = self.bar.get_or_insert_with(|| {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{bar:40.cyan/blue} {pos}/{len} tiles ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            pb
        });
        bar.set_position(done as u64);
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

fn read_input(path: &Path) -> Result<Grid> {
    let pb = spinner("Reading grid...");
    let grid = read_grid(path).with_context(|| format!("Failed to read {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} x {} {}", grid.cols(), grid.rows(), grid.kind());
    Ok(grid)
}

fn write_output(grid: &Grid, path: &Path, kind: Option<ElementKind>) -> Result<()> {
    let pb = spinner("Writing output...");
    write_grid(grid, path, kind).with_context(|| format!("Failed to write {}", path.display()))?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

/// A number, or else a grid file
fn parse_operand(arg: &str) -> Result<Operand> {
    match arg.parse::<f64>() {
        Ok(value) => Ok(Operand::Scalar(value)),
        Err(_) => Ok(Operand::Grid(read_input(Path::new(arg))?)),
    }
}

/// `out.tif` + `percentile:90` -> `out_percentile-90.tif`
fn suffixed(path: &Path, statistic: &Statistic) -> PathBuf {
    let stem = path.file_stem().map_or_else(String::new, |s| s.to_string_lossy().into_owned());
    let tag: String = statistic
        .to_string()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '-' })
        .collect();
    let ext = path.extension().map_or_else(|| "tif".to_string(), |e| e.to_string_lossy().into_owned());
    path.with_file_name(format!("{}_{}.{}", stem, tag, ext))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let grid = read_input(&input)?;
            let extent = grid.extent();
            let stats = grid.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", grid.cols(), grid.rows(), grid.len());
            println!("Kind: {}", grid.kind());
            println!("Cell size: {}", grid.cell_size());
            println!(
                "Extent: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                extent.xmin, extent.ymin, extent.xmax, extent.ymax
            );
            println!("CRS: {}", crs::describe(grid.crs()));
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            if let Some(std_dev) = stats.std_dev {
                println!("  Std dev: {:.4}", std_dev);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / grid.len().max(1) as f64
            );
        }

        // ── Focal ────────────────────────────────────────────────────
        Commands::Focal {
            input,
            output,
            stat,
            buffer,
            circular,
            policy,
            cell_budget,
        } => {
            let grid = read_input(&input)?;
            let params = FocalParams {
                buffer,
                circular,
                policy,
                tiling: TilingConfig {
                    cell_budget,
                    ..Default::default()
                },
            };
            let start = Instant::now();
            let mut reducer = MultiStatisticReducer::new(stat.clone(), policy);
            let results = focal(&[grid], &mut reducer, &params, &mut TileBar::new())
                .context("Failed to compute focal statistics")?;
            let elapsed = start.elapsed();

            if results.len() == 1 {
                write_output(&results[0], &output, None)?;
                done(&format!("Focal {}", stat[0]), &output, elapsed);
            } else {
                for (statistic, result) in stat.iter().zip(&results) {
                    let path = suffixed(&output, statistic);
                    write_output(result, &path, None)?;
                    done(&format!("Focal {}", statistic), &path, elapsed);
                }
            }
        }

        // ── Calc ─────────────────────────────────────────────────────
        Commands::Calc {
            left,
            op,
            right,
            output,
            kind,
        } => {
            let left = parse_operand(&left)?;
            let start = Instant::now();
            let result = match right {
                Some(right) => {
                    let op: BinaryOp = op.parse().context("Unknown binary operator")?;
                    let right = parse_operand(&right)?;
                    apply(left, right, op).with_context(|| format!("Failed to apply {}", op))?
                }
                None => {
                    let op: UnaryOp = op.parse().context("Unknown unary operator")?;
                    let Some(grid) = left.as_grid() else {
                        bail!("Unary operators need a grid operand");
                    };
                    unary(grid, op).context("Failed to apply unary operator")?
                }
            };
            let elapsed = start.elapsed();
            write_output(&result, &output, kind)?;
            done("Result", &output, elapsed);
        }

        // ── Mosaic ───────────────────────────────────────────────────
        Commands::Mosaic { inputs, output } => {
            let grids = inputs
                .iter()
                .map(|p| read_input(p))
                .collect::<Result<Vec<_>>>()?;
            let start = Instant::now();
            let result = mosaic(&grids).context("Failed to mosaic grids")?;
            let elapsed = start.elapsed();
            write_output(&result, &output, None)?;
            done("Mosaic", &output, elapsed);
        }

        // ── Standardize ──────────────────────────────────────────────
        Commands::Standardize {
            inputs,
            out_dir,
            mode,
            resampling,
        } => {
            let grids = inputs
                .iter()
                .map(|p| read_input(p))
                .collect::<Result<Vec<_>>>()?;
            let start = Instant::now();
            let aligned = standardize_with(mode, &grids, resampling, &AffineResampler)
                .context("Failed to standardize grids")?;
            let elapsed = start.elapsed();

            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("Failed to create {}", out_dir.display()))?;
            for (input, grid) in inputs.iter().zip(&aligned) {
                let name = input
                    .file_name()
                    .with_context(|| format!("Input has no file name: {}", input.display()))?;
                let path = out_dir.join(name);
                write_output(grid, &path, None)?;
                done("Standardized grid", &path, elapsed);
            }
        }

        // ── Zonal ────────────────────────────────────────────────────
        Commands::Zonal {
            input,
            zones,
            output,
            stat,
            policy,
        } => {
            let grid = read_input(&input)?;
            let zones = read_input(&zones)?;
            let start = Instant::now();
            match output {
                Some(output) => {
                    let result = zonal(&grid, &zones, stat, policy)
                        .context("Failed to compute zonal statistics")?;
                    let elapsed = start.elapsed();
                    write_output(&result, &output, None)?;
                    done(&format!("Zonal {}", stat), &output, elapsed);
                }
                None => {
                    let table = zonal_table(&grid, &zones, stat, policy)
                        .context("Failed to compute zonal statistics")?;
                    println!("zone\t{}", stat);
                    for (zone, value) in table {
                        println!("{}\t{}", zone, value);
                    }
                }
            }
        }

        // ── Fill ─────────────────────────────────────────────────────
        Commands::Fill {
            input,
            output,
            max_exponent,
            cell_budget,
        } => {
            if max_exponent > MAX_FILL_EXPONENT {
                bail!("--max-exponent must be at most {}", MAX_FILL_EXPONENT);
            }
            let grid = read_input(&input)?;
            let tiling = TilingConfig {
                cell_budget,
                ..Default::default()
            };
            let start = Instant::now();
            let result = fill_missing_with(&grid, max_exponent, &tiling, &mut TileBar::new())
                .context("Failed to fill missing cells")?;
            let elapsed = start.elapsed();
            write_output(&result, &output, None)?;
            done("Filled grid", &output, elapsed);
        }

        // ── Terrain ──────────────────────────────────────────────────
        Commands::Terrain { algorithm } => match algorithm {
            TerrainCommands::Slope {
                input,
                output,
                units,
                z_factor,
            } => {
                let dem = read_input(&input)?;
                let start = Instant::now();
                let params = SlopeParams {
                    units,
                    z_factor,
                    ..Default::default()
                };
                let result = slope(&dem, &params).context("Failed to calculate slope")?;
                let elapsed = start.elapsed();
                write_output(&result, &output, None)?;
                done("Slope", &output, elapsed);
            }

            TerrainCommands::Aspect {
                input,
                output,
                format,
            } => {
                let dem = read_input(&input)?;
                let start = Instant::now();
                let result = aspect(&dem, format, &TilingConfig::default())
                    .context("Failed to calculate aspect")?;
                let elapsed = start.elapsed();
                write_output(&result, &output, None)?;
                done("Aspect", &output, elapsed);
            }

            TerrainCommands::Hillshade {
                input,
                output,
                azimuth,
                altitude,
                z_factor,
            } => {
                let dem = read_input(&input)?;
                let start = Instant::now();
                let params = HillshadeParams {
                    azimuth,
                    altitude,
                    z_factor,
                    ..Default::default()
                };
                let result = hillshade(&dem, &params).context("Failed to calculate hillshade")?;
                let elapsed = start.elapsed();
                write_output(&result, &output, None)?;
                done("Hillshade", &output, elapsed);
            }
        },

        // ── Sample ───────────────────────────────────────────────────
        Commands::Sample { inputs, x, y } => {
            let bands = inputs
                .iter()
                .map(|p| read_input(p))
                .collect::<Result<Vec<_>>>()?;
            let stack = Stack::new(bands).context("Failed to align bands")?;
            info!("Stack: {}", stack);
            for (input, value) in inputs.iter().zip(stack.values(x, y)) {
                println!("{}\t{}", input.display(), value);
            }
        }
    }

    Ok(())
}
