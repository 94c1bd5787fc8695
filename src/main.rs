use std::{
    error::Error,
    io::{self, BufReader},
    path::PathBuf,
};

use clap::{command, Parser, Subcommand};
use roosty_reminder::{
    config::Config, menu, time_codec, Alarm, AlarmStore, Console, ConsoleNotifier, Convention,
    Monitor, Repeat, SharedStore, SystemClock,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// config file to use instead of the default one
    #[clap(long)]
    config: Option<PathBuf>,
    /// alarms file to use instead of the configured one
    #[clap(long)]
    alarms: Option<PathBuf>,
    /// seconds between alarm checks
    #[clap(long)]
    tick_secs: Option<u64>,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// write a default config file
    Init {
        #[clap(long, short)]
        force: bool,
    },
    /// add an alarm without opening the menu
    Add {
        time: String,
        message: String,
        /// once, daily or a number of minutes
        #[clap(long, short, default_value = "once")]
        repeat: String,
        /// 12 or 24, the configured format when omitted
        #[clap(long, short)]
        format: Option<String>,
    },
    /// print all alarms
    List,
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger, a file so it stays out of the prompts
    if let Err(e) = simple_file_logger::init_logger!("roosty_reminder") {
        eprintln!("couldn't initialize logger: {e:?}");
    }

    let args = Args::parse();
    let config_path = match args.config {
        Some(path) => path,
        None => Config::config_path()?,
    };
    let mut config = Config::load(&config_path);
    if let Some(tick_secs) = args.tick_secs {
        config.tick_interval_secs = tick_secs;
    }
    let alarms_path = match args.alarms {
        Some(path) => path,
        None => config.alarms_path()?,
    };

    match args.command {
        Some(Command::Init { force }) => {
            if force || !config_path.exists() {
                Config::new().save(&config_path)?;
                println!("wrote {}", config_path.display());
            } else {
                println!("{} already exists, use --force to overwrite", config_path.display());
            }
        }
        Some(Command::Add {
            time,
            message,
            repeat,
            format,
        }) => {
            let convention = format.map_or_else(|| config.convention(), |f| Convention::from_token(&f));
            let time = time_codec::parse(&time, convention)?;
            let repeat: Repeat = repeat.parse()?;
            let mut store = AlarmStore::load(&alarms_path);
            let index = store.add(Alarm::new(time, message, repeat));
            store.save(&alarms_path)?;
            println!("added alarm {index} at {}", time_codec::format(time, convention));
        }
        Some(Command::List) => {
            let store = AlarmStore::load(&alarms_path);
            print!("{}", menu::render_table(&store, config.convention()));
        }
        None => run_interactive(&config, alarms_path)?,
    }
    Ok(())
}

fn run_interactive(config: &Config, alarms_path: PathBuf) -> Result<(), Box<dyn Error>> {
    let store = SharedStore::new(AlarmStore::load(&alarms_path));
    if !store.is_empty() {
        println!("Alarms loaded from file.");
    }
    let (console, menu_input) = Console::spawn(BufReader::new(io::stdin()))?;
    let notifier = ConsoleNotifier::new(console, config.sound.clone(), config.volume);
    // dropped when the menu returns, the thread may still be stuck on a prompt
    // so it isn't joined
    let _monitor = Monitor::new(store.clone(), SystemClock, notifier)
        .with_handler(config.trigger_handler())
        .with_tick_interval(config.tick_interval())
        .spawn()?;

    menu::Menu::new(
        store,
        menu_input,
        io::stdout(),
        config.convention(),
        alarms_path,
    )
    .run()?;
    Ok(())
}
