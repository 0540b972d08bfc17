use std::io::{self, BufRead, Write};

use anyhow::Result;

use super::NormalizeArgs;

pub fn run(text: &[String], options: &NormalizeArgs) -> Result<()> {
    let preprocessor = options.config()?.build_preprocessor()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if text.is_empty() {
        for line in io::stdin().lock().lines() {
            writeln!(out, "{}", preprocessor.normalize_text(&line?))?;
        }
    } else {
        writeln!(out, "{}", preprocessor.normalize_text(&text.join(" ")))?;
    }

    Ok(())
}
