use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::Rng;

use kiriko_core::codec::encode;
use kiriko_core::model::{PuzzleBoard, Vec2};
use kiriko_core::persistence::ProgressPersistence;
use kiriko_core::piece_path::{piece_geometry, PADDING_RATIO, SAMPLES_PER_EDGE_DEFAULT};
use kiriko_core::seed::SeededRng;
use kiriko_core::session::PuzzleSession;
use kiriko_core::snapshot::{
    GameSettings, PuzzleDescriptor, ASPECT_RATIO_DEFAULT, GENERATOR_VERSION, PIECE_COUNT_DEFAULT,
};
use kiriko_core::topology::build_puzzle_topology;
use kiriko_raster::{load_rgba, rasterize_pieces, RasterOptions};

#[derive(Parser)]
#[command(name = "kiriko", version, about = "Generate, cut and replay jigsaw puzzles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a puzzle topology and print a summary.
    Topology {
        #[arg(long, default_value_t = PIECE_COUNT_DEFAULT)]
        pieces: u32,
        #[arg(long, default_value = ASPECT_RATIO_DEFAULT)]
        aspect: String,
        #[arg(long)]
        seed: Option<String>,
        /// Also dump the full topology as JSON on stdout.
        #[arg(long)]
        json: bool,
    },
    /// Cut a source image into piece bitmaps plus a descriptor.
    Cut {
        #[arg(long)]
        image: PathBuf,
        #[arg(long, default_value_t = PIECE_COUNT_DEFAULT)]
        pieces: u32,
        /// Override the grid aspect ratio; defaults to the image's.
        #[arg(long)]
        aspect: Option<String>,
        #[arg(long)]
        seed: Option<String>,
        #[arg(long, default_value = "pieces")]
        out: PathBuf,
    },
    /// Run a headless assembly from scatter to solved, exercising the
    /// snap engine and the progress writer.
    Solve {
        #[arg(long, default_value_t = 24)]
        pieces: u32,
        #[arg(long, default_value = ASPECT_RATIO_DEFAULT)]
        aspect: String,
        #[arg(long)]
        seed: Option<String>,
        /// Cell edge length in world units.
        #[arg(long, default_value_t = 120.0)]
        cell: f32,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Topology {
            pieces,
            aspect,
            seed,
            json,
        } => run_topology(pieces, &aspect, seed, json),
        Commands::Cut {
            image,
            pieces,
            aspect,
            seed,
            out,
        } => run_cut(&image, pieces, aspect, seed, &out),
        Commands::Solve {
            pieces,
            aspect,
            seed,
            cell,
        } => run_solve(pieces, &aspect, seed, cell),
    }
}

fn run_topology(pieces: u32, aspect: &str, seed: Option<String>, json: bool) -> Result<()> {
    let seed = resolve_seed(seed)?;
    let mut rng = SeededRng::new(seed);
    let topology = build_puzzle_topology(pieces, aspect, &mut rng);

    println!("seed: 0x{seed:08x}");
    println!(
        "grid: {}x{} ({} pieces, {} seams)",
        topology.rows,
        topology.cols,
        topology.rows * topology.cols,
        topology.seams.len()
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&topology)?);
    }
    Ok(())
}

fn run_cut(
    image_path: &PathBuf,
    pieces: u32,
    aspect: Option<String>,
    seed: Option<String>,
    out_dir: &PathBuf,
) -> Result<()> {
    let seed = resolve_seed(seed)?;
    let bytes =
        fs::read(image_path).with_context(|| format!("reading {}", image_path.display()))?;
    let source = load_rgba(&bytes)?;
    log::info!(
        "decoded {}x{} source image from {}",
        source.width(),
        source.height(),
        image_path.display()
    );
    let aspect_ratio =
        aspect.unwrap_or_else(|| format!("{}:{}", source.width(), source.height()));

    let mut rng = SeededRng::new(seed);
    let topology = build_puzzle_topology(pieces, &aspect_ratio, &mut rng);
    let rasters = rasterize_pieces(&source, &topology, &RasterOptions::default())?;

    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    for raster in &rasters {
        let path = out_dir.join(format!("piece_{:04}.png", raster.cell_index));
        raster
            .image
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    let cell = (source.width() as f32 / topology.cols as f32)
        .min(source.height() as f32 / topology.rows as f32);
    let descriptor = PuzzleDescriptor {
        puzzle_id: format!("puzzle-{seed:08x}"),
        seed,
        piece_count: topology.rows * topology.cols,
        generator_version: GENERATOR_VERSION.to_string(),
        aspect_ratio,
        board: PuzzleBoard {
            width: source.width() as f32,
            height: source.height() as f32,
            padding: cell * PADDING_RATIO,
        },
        rows: topology.rows,
        cols: topology.cols,
        seams: topology.seams.clone(),
    };
    let Some(binary) = encode(&descriptor) else {
        bail!("failed to serialize puzzle descriptor");
    };
    fs::write(out_dir.join("puzzle.bin"), binary)?;
    fs::write(
        out_dir.join("puzzle.json"),
        serde_json::to_vec_pretty(&descriptor)?,
    )?;

    println!(
        "cut {} pieces ({}x{}) into {}",
        rasters.len(),
        topology.rows,
        topology.cols,
        out_dir.display()
    );
    Ok(())
}

fn run_solve(pieces: u32, aspect_ratio: &str, seed: Option<String>, cell: f32) -> Result<()> {
    if !cell.is_finite() || cell <= 0.0 {
        bail!("cell size must be positive");
    }
    let seed = resolve_seed(seed)?;
    let mut rng = SeededRng::new(seed);
    let topology = build_puzzle_topology(pieces, aspect_ratio, &mut rng);

    // Padding comfortably exceeds the largest piece radius, so scripted
    // placements near the board edge never get clamped away.
    let board = PuzzleBoard {
        width: topology.cols as f32 * cell,
        height: topology.rows as f32 * cell,
        padding: cell * 1.5,
    };
    let geometry: Vec<_> = topology
        .cells
        .iter()
        .map(|c| {
            piece_geometry(
                c,
                &topology,
                cell,
                cell,
                cell * PADDING_RATIO,
                SAMPLES_PER_EDGE_DEFAULT,
            )
        })
        .collect();
    let settings = GameSettings::default();
    let tolerance = cell * settings.snapping_tolerance;
    let mut session = PuzzleSession::new(topology, board, settings, &geometry, seed);

    println!(
        "solving {} pieces (seed 0x{seed:08x}), {} clusters at start",
        session.pieces().len(),
        session.cluster_count()
    );

    let mut saves = 0usize;
    let mut snapshot = None;
    let clock = std::cell::Cell::new(0u64);
    let total = session.pieces().len() as u32;
    {
        let session_cell = std::cell::RefCell::new(&mut session);
        let saves_ref = &mut saves;
        let snapshot_ref = &mut snapshot;
        let mut persistence = ProgressPersistence::new(
            format!("puzzle-{seed:08x}"),
            clock.get(),
            || {
                let mut session = session_cell.borrow_mut();
                Some(session.progress_snapshot(clock.get()))
            },
            |record| {
                *saves_ref += 1;
                *snapshot_ref = Some(record.clone());
                Ok(())
            },
        );

        for id in 0..total {
            clock.set(clock.get() + 200);
            let (target, current) = {
                let session = session_cell.borrow();
                let piece = session.pieces()[id as usize];
                let cols = session.topology().cols;
                let offset = piece.anchor_offset;
                let target = Vec2::new(
                    ((id % cols) as f32 + 0.5) * cell - offset.x,
                    ((id / cols) as f32 + 0.5) * cell - offset.y,
                );
                (target, Vec2::new(piece.x, piece.y))
            };
            // Land just inside the snap tolerance instead of exactly on
            // target, so the snap scan is doing real work.
            let target = Vec2::new(target.x + tolerance * 0.4, target.y - tolerance * 0.3);
            let mut session = session_cell.borrow_mut();
            session.begin_drag(id);
            session.drag_by(Vec2::new(target.x - current.x, target.y - current.y));
            if let Some(snap) = session.end_drag() {
                println!(
                    "piece {} snapped to {} (error {:.2}px), {} clusters left",
                    snap.cell_index,
                    snap.neighbor_cell,
                    snap.translation_error,
                    session.cluster_count()
                );
            }
            drop(session);
            persistence.notify_change(clock.get());
            clock.set(clock.get() + 1000);
            persistence.tick(clock.get());
        }
        clock.set(clock.get() + 1000);
        persistence.flush(clock.get());
        persistence.dispose();
    }

    let solved = session.is_solved();
    println!(
        "finished: solved={} clusters={} saves={}",
        solved,
        session.cluster_count(),
        saves
    );
    if let Some(record) = snapshot {
        println!(
            "last save at {}ms, completed_at={:?}",
            record.last_saved_at, record.completed_at
        );
    }
    if !solved {
        bail!("assembly did not converge to a single cluster");
    }
    Ok(())
}

fn resolve_seed(seed: Option<String>) -> Result<u32> {
    match seed.as_deref() {
        Some(raw) => parse_seed_arg(raw),
        None => Ok(rand::rng().random::<u32>()),
    }
}

fn parse_seed_arg(raw: &str) -> Result<u32> {
    let trimmed = raw.trim();
    let value = if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X"))
    {
        u32::from_str_radix(hex, 16)?
    } else {
        trimmed.parse::<u32>()?
    };
    Ok(value)
}
