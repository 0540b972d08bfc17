use std::path::Path;

use anyhow::{bail, Result};
use console::style;

use tidytweet_core::{collect_to_file, ArchiveSource, ScrapeQuery};

pub fn run(archive: &Path, output: &Path, query: &ScrapeQuery) -> Result<()> {
    if !archive.is_file() {
        bail!("archive not found: {}", archive.display());
    }

    let source = ArchiveSource::new(archive);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let count = runtime.block_on(collect_to_file(&source, query, output))?;

    eprintln!(
        "{} Collected {} tweets -> {}",
        style("●").green(),
        count,
        output.display()
    );
    Ok(())
}
