use std::path::Path;

use anyhow::{bail, Context, Result};
use console::style;

use super::NormalizeArgs;

pub fn run(
    input: &Path,
    output: &Path,
    text_field: Option<&str>,
    skip_invalid: bool,
    options: &NormalizeArgs,
) -> Result<()> {
    if !input.is_file() {
        bail!("file not found: {}", input.display());
    }

    let mut config = options.config()?;
    if let Some(field) = text_field {
        config.text_field = Some(field.to_string());
    }
    config.skip_invalid |= skip_invalid;

    let preprocessor = config.build_preprocessor()?;
    let stats = preprocessor
        .preprocess_file(input, output)
        .with_context(|| format!("failed to preprocess {}", input.display()))?;

    eprintln!(
        "{} Preprocessed {} records -> {}",
        style("●").green(),
        stats.processed,
        output.display()
    );
    if stats.empty > 0 {
        eprintln!("  Empty after cleaning: {}", stats.empty);
    }
    if !stats.failed.is_empty() {
        eprintln!("  {} {} skipped", style("!").yellow(), stats.skipped());
        for failure in &stats.failed {
            eprintln!("    {}", failure.message);
        }
    }

    Ok(())
}
