use anyhow::Context as _;
use stdmerge::*;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = clap::Command::new("stdcheck")
        .version("0.1")
        .about("append recomputed rates and velocities to an STD file")
        .arg(
            clap::Arg::new("STD")
                .help("STD file to check")
                .required(true)
                .index(1),
        )
        .arg(
            clap::Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("merge config with a [consistency] table"),
        )
        .get_matches();

    let stdname = matches
        .get_one::<String>("STD")
        .context("missing STD file")?;

    let names = match matches.get_one::<String>("config") {
        Some(cfgname) => config::load(cfgname)
            .context("can't load config")?
            .consistency
            .unwrap_or_default(),
        None => config::Consistency::default(),
    };
    log::debug!("{:#?}", names);

    consistency::check_file(stdname, &names)
        .with_context(|| format!("can't check {}", stdname))?;

    Ok(())
}
