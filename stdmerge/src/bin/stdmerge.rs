use anyhow::Context as _;
use stdmerge::*;

fn arg<'a>(matches: &'a clap::ArgMatches, name: &str) -> anyhow::Result<&'a String> {
    matches
        .get_one::<String>(name)
        .with_context(|| format!("missing {}", name))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = clap::Command::new("stdmerge")
        .version("0.1")
        .about("merge a raw OBC log into an STD file")
        .arg(
            clap::Arg::new("CONFIG")
                .help("merge config")
                .required(true)
                .index(1),
        )
        .arg(
            clap::Arg::new("CAL")
                .help("calibration file")
                .required(true)
                .index(2),
        )
        .arg(
            clap::Arg::new("RAW")
                .help("raw OBC log")
                .required(true)
                .index(3),
        )
        .arg(
            clap::Arg::new("OUT")
                .help("STD file to write")
                .required(true)
                .index(4),
        )
        .arg(
            clap::Arg::new("check")
                .long("check")
                .action(clap::ArgAction::SetTrue)
                .help("run the consistency pass on the written file"),
        )
        .get_matches();

    let cfgname = arg(&matches, "CONFIG")?;
    let calname = arg(&matches, "CAL")?;
    let rawname = arg(&matches, "RAW")?;
    let outname = arg(&matches, "OUT")?;

    let cfg = config::load(cfgname).context("can't load config")?;
    let cal = CalibrationStore::load(calname).context("can't load calibration")?;

    let stats = merge_files(&cfg, &cal, rawname, outname).context("merge failed")?;
    log::info!(
        "{} rows, {} substituted fields, {} domain errors, {} skipped columns",
        stats.rows,
        stats.read.substitutions(),
        stats.domain.values().sum::<usize>(),
        stats.skipped.len()
    );

    if matches.get_flag("check") {
        let names = cfg.consistency.clone().unwrap_or_default();
        consistency::check_file(outname, &names).context("consistency pass failed")?;
    }

    Ok(())
}
