use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgMatches, Command};
use crossterm::{
    cursor::Show,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    fs,
    io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use todos::{
    config::Settings,
    preferences::FilePreferenceStore,
    ui::{run_app, App, TerminalRestore},
    Filter, HttpTaskService, TaskId, TaskListController,
};
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let id = || {
        Arg::new("id")
            .required(true)
            .value_parser(value_parser!(i64))
            .help("Task id")
    };
    Command::new("todos")
        .version(env!("CARGO_PKG_VERSION"))
        .about("To-do list client for a remote task service")
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .global(true)
                .help("Base URL of the task service (overrides config)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Path to a TOML config file"),
        )
        .subcommand(Command::new("tui").about("Open the interactive task list (default)"))
        .subcommand(
            Command::new("list").about("List tasks").arg(
                Arg::new("filter")
                    .long("filter")
                    .default_value("all")
                    .value_parser(|s: &str| s.parse::<Filter>())
                    .help("all, completed or pending"),
            ),
        )
        .subcommand(Command::new("show").about("Show one task").arg(id()))
        .subcommand(
            Command::new("add")
                .about("Add a new task")
                .arg(Arg::new("title").required(true).help("Task title")),
        )
        .subcommand(
            Command::new("toggle")
                .about("Flip a task between completed and pending")
                .arg(id()),
        )
        .subcommand(
            Command::new("edit")
                .about("Change a task's title")
                .arg(id())
                .arg(Arg::new("title").required(true).help("New title")),
        )
        .subcommand(Command::new("remove").about("Delete a task").arg(id()))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("todos=info"))
}

fn init_file_logging(path: &Path) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating log directory {}", dir.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let mut settings = Settings::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    if let Some(url) = matches.get_one::<String>("api-url") {
        settings.api_url = url.clone();
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;
    let service = Arc::new(HttpTaskService::new(&settings.api_url)?);

    match matches.subcommand() {
        None | Some(("tui", _)) => {
            init_file_logging(&settings.log_file)?;
            info!(api_url = %settings.api_url, "starting terminal client");
            run_tui(&runtime, service, &settings)
        }
        Some((name, sub_matches)) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(io::stderr)
                .init();
            runtime.block_on(run_command(name, sub_matches, service))
        }
    }
}

fn run_tui(
    runtime: &Runtime,
    service: Arc<HttpTaskService>,
    settings: &Settings,
) -> anyhow::Result<()> {
    let store = FilePreferenceStore::new(&settings.preferences_file);
    let mut app = App::new(TaskListController::new(service), Box::new(store));

    // Terminal setup; restored when `_restore` drops, including on setup errors.
    enable_raw_mode()?;
    let _restore = TerminalRestore::new(|| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
    });
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    run_app(&mut terminal, &mut app, runtime.handle()).context("terminal client failed")
}

async fn run_command(
    name: &str,
    sub_matches: &ArgMatches,
    service: Arc<HttpTaskService>,
) -> anyhow::Result<()> {
    let mut controller = TaskListController::new(service);
    controller.load().await;
    if let Some(err) = controller.last_error() {
        bail!("{err}");
    }

    let id = sub_matches.try_get_one::<i64>("id").ok().flatten().map(|id| TaskId(*id));
    let require_known = |controller: &TaskListController<HttpTaskService>, id: TaskId| {
        if controller.task(id).is_none() {
            bail!("no task with id {id}");
        }
        Ok(())
    };

    match (name, id) {
        ("list", _) => {
            if let Some(filter) = sub_matches.get_one::<Filter>("filter") {
                controller.set_filter(*filter);
            }
        }
        ("show", Some(id)) => {
            controller.refresh_task(id).await;
            require_known(&controller, id)?;
            controller.set_filter(Filter::All);
        }
        ("add", _) => {
            let title = sub_matches.get_one::<String>("title").map(String::as_str).unwrap_or("");
            if title.trim().is_empty() {
                bail!("task title must not be empty");
            }
            controller.add_task(title).await;
        }
        ("toggle", Some(id)) => {
            require_known(&controller, id)?;
            controller.toggle_complete(id).await;
        }
        ("edit", Some(id)) => {
            require_known(&controller, id)?;
            let current = controller.task(id).map(|t| t.title.clone()).unwrap_or_default();
            controller.start_editing(id, current);
            if let Some(title) = sub_matches.get_one::<String>("title") {
                controller.set_edit_draft(title.clone());
            }
            controller.save_edit(id).await;
        }
        ("remove", Some(id)) => {
            require_known(&controller, id)?;
            controller.remove_task(id).await;
        }
        _ => bail!("unknown command {name}; use --help for available commands"),
    }

    if let Some(err) = controller.last_error() {
        bail!("{err}");
    }

    let shown: Vec<_> = match (name, id) {
        ("show", Some(id)) => controller.task(id).into_iter().collect(),
        _ => controller.visible_tasks().collect(),
    };
    for task in shown {
        let check = if task.completed { "x" } else { " " };
        println!("- [{check}] #{} {}", task.id, task.title);
    }
    Ok(())
}
