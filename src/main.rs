use anyhow::Context;

fn main() -> anyhow::Result<()> {
    let report = habit_digest_lib::run().context("habit digest run failed")?;
    println!(
        "week of {}: {} tile(s), {} skipped, delivery {}, {} file(s) cleaned",
        report.week_start,
        report.tiles.len(),
        report.skipped.len(),
        report.delivery.final_stage().as_str(),
        report.cleanup.removed
    );
    Ok(())
}
