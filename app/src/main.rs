use std::{io::stdout, path::PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use common::{
    config::{DEFAULT_PLOT_DIR, DEFAULT_VIEWER, Settings},
    generator::Generator,
    plot::Plot,
};
use eyre::Result;
use ma_aco::{InstanceSet, MaAcoList};
use metric_lines::MetricLines;
use sa_ga::SaGaSweep;
use tracing::error;
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod run;

/// Library crates whose log level follows `RUST_LOG` unless set with `--log`
const MODULES: &[&str] = &["common", "sa_ga", "ma_aco", "metric_lines"];

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long)]
    log: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print simulated annealing / genetic algorithm sweep commands
    Sweep {
        /// Instance directory
        #[arg(short, long, default_value = sa_ga::INSTANCE_DIR)]
        dir: String,
        /// Keep one instance out of every `stride` directory entries
        #[arg(long, default_value_t = sa_ga::STRIDE)]
        stride: usize,
        #[arg(long, default_value = sa_ga::EXECUTABLE)]
        executable: String,
    },
    /// Print memetic algorithm / ant colony commands for every instance
    List {
        #[arg(long, value_enum, default_value_t = SetArg::Max4)]
        set: SetArg,
        /// Instance directory, overrides --set
        #[arg(short, long)]
        dir: Option<String>,
        #[arg(long, default_value = ma_aco::EXECUTABLE)]
        executable: String,
    },
    /// Plot success ratio and execution time of a results table
    Plot {
        /// Tab separated results table
        #[arg(short, long, default_value = metric_lines::DEFAULT_TABLE)]
        file: PathBuf,
        /// Directory the charts are written to
        #[arg(short, long, default_value = DEFAULT_PLOT_DIR)]
        out: String,
        /// Do not open the charts once rendered
        #[arg(long, default_value_t = false)]
        no_show: bool,
        #[arg(long, default_value = DEFAULT_VIEWER)]
        viewer: String,
    },
    /// Run the generators and plots of a config file
    Run {
        #[arg(short, long, default_value = "config.yaml")]
        config_file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SetArg {
    Max3,
    Max4,
    Max5,
}

impl From<SetArg> for InstanceSet {
    fn from(value: SetArg) -> Self {
        match value {
            SetArg::Max3 => InstanceSet::Max3Sat,
            SetArg::Max4 => InstanceSet::Max4Sat,
            SetArg::Max5 => InstanceSet::Max5Sat,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "log.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new(format!("sat_sweep={log_level}"));

    for log in &args.log {
        env_filter = env_filter.add_directive(log.parse()?);
    }

    for module in MODULES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    // stdout carries the generated commands
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(layer().with_writer(non_blocking).with_ansi(false))
        .init();

    let result = match args.command {
        Commands::Sweep {
            dir,
            stride,
            executable,
        } => {
            let generator: Box<dyn Generator> = Box::new(SaGaSweep {
                executable,
                dir,
                stride,
                ..Default::default()
            });
            run::generate_all(&[generator], &mut stdout()).await
        }
        Commands::List {
            set,
            dir,
            executable,
        } => {
            let generator: Box<dyn Generator> = Box::new(MaAcoList {
                executable,
                set: set.into(),
                dir,
            });
            run::generate_all(&[generator], &mut stdout()).await
        }
        Commands::Plot {
            file,
            out,
            no_show,
            viewer,
        } => {
            let settings = Settings {
                show: Some(!no_show),
                viewer: Some(viewer),
                plot_dir: Some(out),
            };
            let plots: Vec<Box<dyn Plot>> = vec![Box::new(MetricLines {
                file,
                ..Default::default()
            })];
            run::plot_all(&plots, &settings).await.map(|_| ())
        }
        Commands::Run { config_file } => match run::load_config(&config_file).await {
            Ok(config) => run::run_config(&config, &mut stdout()).await,
            Err(err) => Err(err),
        },
    };

    if let Err(err) = &result {
        error!("{err:#?}");
    }
    result
}
