use clap::Parser;
use std::path::PathBuf;

use polytrace::{Engine, RunSettings, TargetImage};

#[derive(Parser, Debug)]
#[command(name = "polytrace")]
#[command(version, about = "Approximate an image with semi-transparent polygons")]
struct Args {
    /// Reference image
    input: PathBuf,

    /// JSON settings file (defaults are used when missing)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Override the number of generations
    #[arg(short, long)]
    generations: Option<u64>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Where to write the best render
    #[arg(short, long, default_value = "polytrace.png")]
    output: PathBuf,

    /// Log a progress line every N generations (0 to disable)
    #[arg(long, default_value_t = 50)]
    report_every: u64,
}

fn main() -> polytrace::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // name rayon workers once at startup so profiles read "rayon-0", "rayon-1", ...
    let _ = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("rayon-{i}"))
        .build_global();

    let args = Args::parse();

    let mut settings = match &args.settings {
        Some(path) => RunSettings::load(path),
        None => RunSettings::default(),
    };
    if let Some(generations) = args.generations {
        settings.generations = generations;
    }
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }

    let target = TargetImage::open(&args.input)?;
    let generations = settings.generations;
    let mut engine = Engine::new(target, settings)?;

    engine.run(generations, |report| {
        if args.report_every > 0 && report.generation % args.report_every == 0 {
            log::info!(
                "gen {:>6}: best {:.6} ({:.2} dB, {:.1} SAD/px), population mean {:.6}",
                report.generation,
                report.best_fitness,
                report.metrics.psnr,
                report.metrics.sad_per_px,
                report.stats.mean()
            );
        }
    })?;

    if let Some(canvas) = engine.render_best()? {
        canvas.save_png(&args.output)?;
        log::info!(
            "wrote {} (fitness {:.6})",
            args.output.display(),
            engine.best_fitness().unwrap_or_default()
        );
    }

    let evaluated = engine.evaluation_stats();
    log::info!(
        "{} evaluations, fitness range {:.6}..{:.6}",
        evaluated.count(),
        evaluated.min(),
        evaluated.max()
    );
    Ok(())
}
