use anyhow::Result;
use console::style;

use tidytweet_core::text::fold;
use tidytweet_core::AccentMethod;

use super::StoplistArgs;

pub fn run(args: &StoplistArgs, check: &[String]) -> Result<()> {
    let config = args.config()?;
    config.validate()?;
    let stoplist = config.load_stoplist()?;

    if check.is_empty() {
        for word in stoplist.iter() {
            println!("{word}");
        }
        eprintln!("{} entries", stoplist.len());
        return Ok(());
    }

    for word in check {
        let folded = fold(word, AccentMethod::None);
        if stoplist.contains(&folded) {
            println!("{word}: {}", style("stop").red());
        } else {
            println!("{word}: {}", style("keep").green());
        }
    }

    Ok(())
}
