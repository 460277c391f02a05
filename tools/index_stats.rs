use std::env;
use std::path::PathBuf;
use std::time::Instant;

use library::{BrowseType, Library};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut roots: Vec<PathBuf> = env::args().skip(1).map(PathBuf::from).collect();
    if roots.is_empty() {
        let value = env::var("MUSICLIB_ROOT_PATHS")
            .map_err(|_| "MUSICLIB_ROOT_PATHS not set and no path arguments")?;
        roots = value
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(PathBuf::from)
            .collect();
    }

    let started = Instant::now();
    let library = Library::build(&roots, &CancellationToken::new())?;
    let stats = library.stats();

    println!(
        "Indexed {} files in {} ms: {} artists, {} genres, {} years",
        stats.files,
        started.elapsed().as_millis(),
        stats.artists,
        stats.genres,
        stats.years
    );
    for browse_type in BrowseType::ALL {
        let index = library.index(browse_type);
        println!(
            "  {:<12} {:>6} roots {:>8} nodes {:>8} leaves",
            browse_type.as_str(),
            index.roots().len(),
            index.len(),
            index.leaf_count()
        );
    }

    Ok(())
}
