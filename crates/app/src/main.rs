use std::fmt;
use std::path::{Path, PathBuf};

use quiz_core::model::{
    CHOICE_COUNT, DEFAULT_QUESTION_COUNT, DEFAULT_SECONDS_PER_QUESTION, PasswordOptions, QuestionBank,
    ResultSummary,
};
use services::{
    AnswerOutcome, AppServices, Clock, Direction, MapState, PasswordService, Phase, QuizController,
    QuizError, SessionProgress, WifiService,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { what: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { what } => write!(f, "missing {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [quiz] [--category <name>] [--count <n>] [--seconds <n>]");
    eprintln!("  cargo run -p app -- history [list|clear]");
    eprintln!("  cargo run -p app -- wifi list");
    eprintln!("  cargo run -p app -- wifi connect <ssid> <password>");
    eprintln!(
        "  cargo run -p app -- password [--length <n>] [--no-upper] [--no-lower] [--no-digits] [--symbols]"
    );
    eprintln!();
    eprintln!("Options for quiz and history:");
    eprintln!("  --db <sqlite_url>   default sqlite://quiz.sqlite3");
    eprintln!("  --bank <path.json>  default: built-in questions");
    eprintln!();
    eprintln!("Defaults for quiz:");
    eprintln!("  --count {DEFAULT_QUESTION_COUNT}");
    eprintln!("  --seconds {DEFAULT_SECONDS_PER_QUESTION}  (per question, 10..=300)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_BANK_PATH, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quiz,
    History,
    Wifi,
    Password,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "quiz" => Some(Self::Quiz),
            "history" => Some(Self::History),
            "wifi" => Some(Self::Wifi),
            "password" => Some(Self::Password),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct QuizArgs {
    category: Option<String>,
    count: usize,
    seconds: u32,
}

#[derive(Debug, Clone, Copy)]
enum HistoryAction {
    List,
    Clear,
}

#[derive(Debug)]
enum WifiAction {
    List,
    Connect { ssid: String, password: String },
}

#[derive(Debug)]
enum Action {
    Quiz(QuizArgs),
    History(HistoryAction),
    Wifi(WifiAction),
    Password(PasswordOptions),
}

struct Args {
    db_url: String,
    bank_path: Option<PathBuf>,
    action: Action,
}

impl Args {
    fn parse(cmd: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut bank_path = std::env::var_os("QUIZ_BANK_PATH").map(PathBuf::from);

        let mut quiz = QuizArgs {
            category: None,
            count: DEFAULT_QUESTION_COUNT,
            seconds: DEFAULT_SECONDS_PER_QUESTION,
        };
        let mut password = PasswordOptions::default();
        let mut length = None;
        let mut positional = Vec::new();

        while let Some(arg) = args.next() {
            match (cmd, arg.as_str()) {
                (_, "--db") => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                (_, "--bank") => bank_path = Some(PathBuf::from(require_value(args, "--bank")?)),
                (_, "--help" | "-h") => {
                    print_usage();
                    std::process::exit(0);
                }
                (Command::Quiz, "--category") => {
                    quiz.category = Some(require_value(args, "--category")?);
                }
                (Command::Quiz, "--count") => {
                    quiz.count = parse_number(require_value(args, "--count")?, "--count")?;
                }
                (Command::Quiz, "--seconds") => {
                    quiz.seconds = parse_number(require_value(args, "--seconds")?, "--seconds")?;
                }
                (Command::Password, "--length") => {
                    length = Some(parse_number(require_value(args, "--length")?, "--length")?);
                }
                (Command::Password, "--no-upper") => password.uppercase = false,
                (Command::Password, "--no-lower") => password.lowercase = false,
                (Command::Password, "--no-digits") => password.digits = false,
                (Command::Password, "--symbols") => password.symbols = true,
                (Command::History | Command::Wifi, value) if !value.starts_with("--") => {
                    positional.push(arg);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let action = match cmd {
            Command::Quiz => Action::Quiz(quiz),
            Command::History => Action::History(parse_history_action(positional)?),
            Command::Wifi => Action::Wifi(parse_wifi_action(positional)?),
            Command::Password => {
                if let Some(length) = length {
                    password = password.with_length(length).map_err(|_| {
                        ArgsError::InvalidNumber {
                            flag: "--length",
                            raw: length.to_string(),
                        }
                    })?;
                }
                Action::Password(password)
            }
        };

        Ok(Self {
            db_url,
            bank_path,
            action,
        })
    }
}

fn parse_history_action(positional: Vec<String>) -> Result<HistoryAction, ArgsError> {
    let mut iter = positional.into_iter();
    let action = match iter.next().as_deref() {
        None | Some("list") => HistoryAction::List,
        Some("clear") => HistoryAction::Clear,
        Some(other) => return Err(ArgsError::UnknownArg(other.to_string())),
    };
    match iter.next() {
        Some(extra) => Err(ArgsError::UnknownArg(extra)),
        None => Ok(action),
    }
}

fn parse_wifi_action(positional: Vec<String>) -> Result<WifiAction, ArgsError> {
    let mut iter = positional.into_iter();
    let action = match iter.next().as_deref() {
        Some("list") => WifiAction::List,
        Some("connect") => {
            let ssid = iter.next().ok_or(ArgsError::MissingArgument { what: "<ssid>" })?;
            let password = iter
                .next()
                .ok_or(ArgsError::MissingArgument { what: "<password>" })?;
            WifiAction::Connect { ssid, password }
        }
        Some(other) => return Err(ArgsError::UnknownArg(other.to_string())),
        None => {
            return Err(ArgsError::MissingArgument {
                what: "wifi action (list or connect)",
            });
        }
    };
    match iter.next() {
        Some(extra) => Err(ArgsError::UnknownArg(extra)),
        None => Ok(action),
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn open_services(
    db_url: &str,
    bank_path: Option<&Path>,
) -> Result<AppServices, Box<dyn std::error::Error>> {
    prepare_sqlite_file(db_url)?;
    let services = AppServices::new_sqlite(db_url, Clock::system(), bank_path).await?;
    Ok(services)
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

type InputLines = Lines<BufReader<Stdin>>;

enum Flow {
    Stay,
    Show,
    Finish,
    Quit,
}

fn print_quiz_help() {
    println!("  1-{CHOICE_COUNT}  answer    n/p  next/previous    g <n>  go to question");
    println!("  m    question map    f  finish    q  quit without scoring    h  help");
}

fn format_secs(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

async fn choose_category(
    bank: &QuestionBank,
    lines: &mut InputLines,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let names: Vec<&str> = bank.category_names().collect();
    println!("Categories:");
    for (i, category) in bank.categories().iter().enumerate() {
        println!("  {}) {} ({} questions)", i + 1, category.name(), category.pool_size());
    }
    loop {
        println!("Pick a category [1-{}]:", names.len());
        let Some(line) = lines.next_line().await? else {
            return Ok(None);
        };
        let line = line.trim();
        if let Some(name) = line
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| names.get(i))
        {
            return Ok(Some((*name).to_string()));
        }
        if let Some(name) = names.iter().find(|name| name.eq_ignore_ascii_case(line)) {
            return Ok(Some((*name).to_string()));
        }
        println!("No such category: {line}");
    }
}

async fn show_current(quiz: &QuizController) {
    let (Some(view), Some(progress)) = (quiz.current_question().await, quiz.progress().await) else {
        return;
    };
    println!();
    println!(
        "[{}] Question {}/{}  answered {}  time left {}",
        progress.category,
        view.index + 1,
        view.total,
        progress.answered,
        format_secs(progress.remaining_secs)
    );
    println!("{}", view.question.prompt());
    for (i, choice) in view.question.choices().iter().enumerate() {
        let marker = if view.selected == Some(i) { '*' } else { ' ' };
        println!(" {marker}{}) {choice}", i + 1);
    }
}

async fn show_map(quiz: &QuizController) {
    let cells: Vec<String> = quiz
        .question_map()
        .await
        .iter()
        .map(|item| {
            let mark = match item.state {
                MapState::Unanswered => '.',
                MapState::Correct => '+',
                MapState::Incorrect => 'x',
            };
            if item.is_current {
                format!("[{}{mark}]", item.index + 1)
            } else {
                format!(" {}{mark} ", item.index + 1)
            }
        })
        .collect();
    println!("{}", cells.join(""));
}

async fn handle_input(quiz: &QuizController, input: &str) -> Flow {
    let words: Vec<&str> = input.split_whitespace().collect();
    let result: Result<Flow, QuizError> = match words.as_slice() {
        [] => Ok(Flow::Stay),
        ["n" | "next"] => quiz.navigate(Direction::Next).await.map(|_| Flow::Show),
        ["p" | "prev"] => quiz.navigate(Direction::Prev).await.map(|_| Flow::Show),
        ["g" | "goto", raw] => match raw.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) {
            Some(index) => quiz.jump_to(index).await.map(|()| Flow::Show),
            None => {
                println!("usage: g <question number>");
                Ok(Flow::Stay)
            }
        },
        ["m" | "map"] => {
            show_map(quiz).await;
            Ok(Flow::Stay)
        }
        ["f" | "finish"] => Ok(Flow::Finish),
        ["q" | "quit"] => Ok(Flow::Quit),
        ["h" | "help" | "?"] => {
            print_quiz_help();
            Ok(Flow::Stay)
        }
        [raw] => match raw.parse::<usize>() {
            Ok(n) if (1..=CHOICE_COUNT).contains(&n) => quiz.answer(n - 1).await.map(|outcome| {
                if let AnswerOutcome::AlreadyAnswered { kept } = outcome {
                    println!("Already answered with {}.", kept + 1);
                }
                Flow::Show
            }),
            _ => {
                println!("unknown command: {input} (h for help)");
                Ok(Flow::Stay)
            }
        },
        _ => {
            println!("unknown command: {input} (h for help)");
            Ok(Flow::Stay)
        }
    };

    result.unwrap_or_else(|err| {
        println!("{err}");
        Flow::Stay
    })
}

fn print_summary(summary: &ResultSummary, progress: Option<&SessionProgress>) {
    println!();
    if let Some(progress) = progress {
        println!(
            "{} quiz started {}",
            progress.category,
            progress.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    println!(
        "Score: {}/{} ({}%)  time {}",
        summary.score(),
        summary.total(),
        summary.percent(),
        format_secs(summary.elapsed_secs())
    );
}

async fn run_quiz(
    services: &AppServices,
    args: QuizArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let quiz = services.quiz();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let category = match args.category {
        Some(category) => category,
        None => match choose_category(&services.bank(), &mut lines).await? {
            Some(category) => category,
            None => return Ok(()),
        },
    };

    let mut status = quiz.subscribe();
    let progress = quiz.start(&category, args.count, args.seconds).await?;
    status.borrow_and_update();
    println!(
        "{} questions from {}, {} on the clock.",
        progress.total,
        progress.category,
        format_secs(progress.budget_secs)
    );
    print_quiz_help();
    show_current(&quiz).await;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match handle_input(&quiz, line.trim()).await {
                    Flow::Stay => {}
                    Flow::Show => show_current(&quiz).await,
                    Flow::Finish => break,
                    Flow::Quit => return Ok(()),
                }
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                if status.borrow_and_update().phase == Phase::Finished {
                    println!();
                    println!("Time is up!");
                    break;
                }
            }
        }
    }

    let summary = quiz.finish().await?;
    print_summary(&summary, quiz.progress().await.as_ref());

    println!("Save this result? [y/N]");
    if let Some(line) = lines.next_line().await? {
        if line.trim().eq_ignore_ascii_case("y") {
            quiz.save_result().await?;
            println!("Saved. {} results in history.", quiz.history().await.len());
        }
    }
    quiz.restart().await?;
    Ok(())
}

//
// ─── OTHER COMMANDS ────────────────────────────────────────────────────────────
//

async fn run_history(
    services: &AppServices,
    action: HistoryAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let quiz = services.quiz();
    match action {
        HistoryAction::List => {
            let history = quiz.history().await;
            if history.is_empty() {
                println!("No saved results yet.");
            }
            for entry in history.entries() {
                println!(
                    "{}  {:<10} {:>2}/{:<2}  {}",
                    entry.at().format("%Y-%m-%d %H:%M UTC"),
                    entry.category(),
                    entry.score(),
                    entry.total(),
                    format_secs(entry.elapsed_secs())
                );
            }
        }
        HistoryAction::Clear => {
            quiz.clear_history().await?;
            println!("History cleared.");
        }
    }
    Ok(())
}

async fn run_wifi(action: WifiAction) {
    let wifi = WifiService::system();
    match action {
        WifiAction::List => {
            let networks = wifi.list_networks().await;
            if networks.is_empty() {
                println!("No networks found.");
            }
            for (i, ssid) in networks.iter().enumerate() {
                println!("{:>2}) {ssid}", i + 1);
            }
        }
        WifiAction::Connect { ssid, password } => {
            if wifi.connect(&ssid, &password).await {
                println!("Connected to {ssid}.");
            } else {
                println!("Could not connect to {ssid}.");
            }
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: start a quiz when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Quiz,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Quiz,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(cmd, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let Args {
        db_url,
        bank_path,
        action,
    } = parsed;
    log::debug!("db={db_url} bank={bank_path:?}");

    match action {
        Action::Quiz(quiz) => {
            let services = open_services(&db_url, bank_path.as_deref()).await?;
            run_quiz(&services, quiz).await
        }
        Action::History(action) => {
            let services = open_services(&db_url, bank_path.as_deref()).await?;
            run_history(&services, action).await
        }
        Action::Wifi(action) => {
            run_wifi(action).await;
            Ok(())
        }
        Action::Password(options) => {
            println!("{}", PasswordService::new().generate(&options));
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
