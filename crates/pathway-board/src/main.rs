use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use pathway_board::simulator::{run_simulator, SimulatorConfig};
use pathway_board::{BoardConfig, ProgramBoard, SavedFilter, SavedOrder};
use pathway_store::{
    FlagStore, InMemoryCollectionStore, InMemoryFlagStore, JsonFileFlagStore, StaticProfile,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "pathway=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Command::new("pathway-board")
        .version(pathway_board::VERSION)
        .about("Saved/Target program board")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("simulate")
                .about("Run the seeded gesture simulator")
                .arg(
                    Arg::new("steps")
                        .long("steps")
                        .default_value("1000")
                        .value_parser(value_parser!(u64))
                        .help("Number of operations to simulate"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .default_value("42")
                        .value_parser(value_parser!(u64))
                        .help("Random seed for reproducibility"),
                )
                .arg(
                    Arg::new("records")
                        .long("records")
                        .default_value("12")
                        .value_parser(value_parser!(usize))
                        .help("Programs seeded into the store"),
                )
                .arg(
                    Arg::new("failure-rate")
                        .long("failure-rate")
                        .default_value("0.05")
                        .value_parser(value_parser!(f64))
                        .help("Chance per step that the store goes offline"),
                )
                .arg(
                    Arg::new("keep-going")
                        .long("keep-going")
                        .action(ArgAction::SetTrue)
                        .help("Collect every violation instead of stopping at the first"),
                ),
        )
        .subcommand(
            Command::new("show")
                .about("Render a board from a JSON fixture")
                .arg(
                    Arg::new("fixture")
                        .long("fixture")
                        .required(true)
                        .help("JSON array of program records"),
                )
                .arg(
                    Arg::new("query")
                        .long("query")
                        .help("Free-text narrowing of the saved collection"),
                )
                .arg(
                    Arg::new("order")
                        .long("order")
                        .value_parser([
                            "as_stored",
                            "deadline_ascending",
                            "progress_descending",
                            "name_ascending",
                        ])
                        .help("Saved collection order"),
                )
                .arg(
                    Arg::new("name")
                        .long("name")
                        .help("Display name for the header"),
                )
                .arg(
                    Arg::new("flags")
                        .long("flags")
                        .help("JSON file holding durable flags"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .help("Board configuration (TOML)"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Inspect board configuration")
                .arg(
                    Arg::new("print")
                        .long("print")
                        .action(ArgAction::SetTrue)
                        .help("Print the default configuration as TOML"),
                )
                .arg(
                    Arg::new("check")
                        .long("check")
                        .help("Validate a TOML configuration file"),
                ),
        );

    let matches = cli.get_matches();

    match matches.subcommand() {
        Some(("simulate", args)) => simulate(args).await,
        Some(("show", args)) => show(args).await,
        Some(("config", args)) => config(args),
        _ => Ok(()),
    }
}

async fn simulate(args: &ArgMatches) -> anyhow::Result<()> {
    let config = SimulatorConfig {
        seed: args.get_one::<u64>("seed").copied().unwrap_or(42),
        steps: args.get_one::<u64>("steps").copied().unwrap_or(1000),
        records: args.get_one::<usize>("records").copied().unwrap_or(12),
        failure_rate: args.get_one::<f64>("failure-rate").copied().unwrap_or(0.05),
        stop_on_first_violation: !args.get_flag("keep-going"),
    };

    if !(0.0..=1.0).contains(&config.failure_rate) {
        bail!("--failure-rate must be between 0 and 1");
    }

    println!("Running program board simulator...");
    println!("Steps: {}", config.steps);
    println!("Seed: {}", config.seed);
    println!("Records: {}", config.records);
    println!("Failure Rate: {}", config.failure_rate);
    println!();

    let report = run_simulator(config).await;
    println!("{}", report.generate_text());

    std::process::exit(if report.passed() { 0 } else { 1 });
}

async fn show(args: &ArgMatches) -> anyhow::Result<()> {
    let board_config = match args.get_one::<String>("config") {
        Some(path) => BoardConfig::load(path).with_context(|| format!("loading {path}"))?,
        None => BoardConfig::default(),
    };

    let fixture = args
        .get_one::<String>("fixture")
        .context("--fixture is required")?;
    let json = std::fs::read_to_string(fixture).with_context(|| format!("reading {fixture}"))?;
    let store = Arc::new(
        InMemoryCollectionStore::from_json(&json).with_context(|| format!("parsing {fixture}"))?,
    );

    let flags: Arc<dyn FlagStore> = match args.get_one::<String>("flags") {
        Some(path) => Arc::new(JsonFileFlagStore::new(path)),
        None => Arc::new(InMemoryFlagStore::new()),
    };

    let profile = match args.get_one::<String>("name") {
        Some(name) => StaticProfile::named(name.clone()),
        None => StaticProfile::anonymous(),
    };

    let (board, _signals) = ProgramBoard::new(board_config, store, flags);
    let board = board.with_profile(Arc::new(profile));
    board.load().await.context("loading board")?;

    let mut filter = SavedFilter::new();
    if let Some(query) = args.get_one::<String>("query") {
        filter = filter.with_query(query.clone());
    }
    if let Some(order) = args.get_one::<String>("order") {
        filter = filter.with_order(parse_order(order)?);
    }

    print!("{}", board.view(&filter).render_text());
    Ok(())
}

fn config(args: &ArgMatches) -> anyhow::Result<()> {
    if let Some(path) = args.get_one::<String>("check") {
        let config = BoardConfig::load(path).with_context(|| format!("loading {path}"))?;
        println!("{path}: ok");
        if args.get_flag("print") {
            print!("{}", config.to_toml_string()?);
        }
        return Ok(());
    }

    if args.get_flag("print") {
        print!("{}", BoardConfig::default().to_toml_string()?);
    }
    Ok(())
}

fn parse_order(s: &str) -> anyhow::Result<SavedOrder> {
    Ok(match s {
        "as_stored" => SavedOrder::AsStored,
        "deadline_ascending" => SavedOrder::DeadlineAscending,
        "progress_descending" => SavedOrder::ProgressDescending,
        "name_ascending" => SavedOrder::NameAscending,
        other => bail!("unknown order: {other}"),
    })
}
