// Outcome summaries printed to stdout

use lambdeploy_core::{CreateOutcome, StageOutcome, UpdateOutcome};

pub(crate) fn created(outcome: &CreateOutcome) {
    println!("Created {}", outcome.function);
    println!("  ARN:     {}", outcome.arn);
    println!("  Version: {}", outcome.version);
    if let Some(stage) = &outcome.stage {
        println!("  Stage:   {} -> {}", stage, outcome.version);
    }
    println!("  History: {}", outcome.history_path.display());
}

pub(crate) fn updated(outcome: &UpdateOutcome) {
    println!("Updated {}", outcome.function);
    println!("  Version: {}", outcome.version);
    println!("  Archive: {}", outcome.archive);
    println!("  History: {}", outcome.history_path.display());
}

pub(crate) fn staged(outcome: &StageOutcome) {
    let verb = if outcome.created { "Created" } else { "Moved" };
    println!(
        "{} stage {} of {} -> version {}",
        verb, outcome.stage, outcome.function, outcome.version
    );
}
