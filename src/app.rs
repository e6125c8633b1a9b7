use std::time::Duration;

use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::{ColoredString, Colorize};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::controller::{
    Controller, Endpoint, FormInput, HttpTransport, Outcome, SupersedePolicy, TransportOptions,
};
use crate::output::{self, OutputFormat};
use crate::render::{Label, RemarkTone, ReportPage, ReportSink, Status, SubjectTable};
use crate::sanitize::Markup;

fn print_banner() {
    println!(
        "{} {}",
        "examresult".bold().cyan(),
        concat!("v", env!("CARGO_PKG_VERSION")).white()
    );
    println!();
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

const HELP_SECTIONS: [&str; 5] = ["Query", "Service", "HTTP", "Output", "Input"];

fn flag_column(arg: &clap::Arg) -> String {
    let mut names: Vec<&str> = arg.get_long().into_iter().collect();
    names.extend(arg.get_visible_aliases().unwrap_or_default());
    let longs = names
        .iter()
        .map(|name| format!("--{name}"))
        .collect::<Vec<_>>()
        .join("/");
    let short = arg
        .get_short()
        .map(|c| format!("-{c}, "))
        .unwrap_or_else(|| "    ".to_string());
    let value = match arg.get_value_names().and_then(|names| names.first()) {
        Some(name) if arg.get_action().takes_values() => format!(" <{name}>"),
        _ => String::new(),
    };
    format!("{short}{longs}{value}")
}

fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let mut out = format!(
        "{} {}\n{}\n\nUsage: {} [OPTIONS]\n",
        cmd.get_name(),
        cmd.get_version().unwrap_or_default(),
        cmd.get_about().map(|about| about.to_string()).unwrap_or_default(),
        cmd.get_name()
    );

    for section in HELP_SECTIONS {
        let rows = cmd
            .get_arguments()
            .filter(|arg| !arg.is_hide_set() && arg.get_help_heading() == Some(section))
            .map(|arg| {
                let help = arg.get_help().map(|h| h.to_string()).unwrap_or_default();
                format!("  {:<36} {}\n", flag_column(arg), help.trim())
            })
            .collect::<String>();
        if !rows.is_empty() {
            out.push_str(&format!("\n{section}:\n{rows}"));
        }
    }

    out.push_str(&format!(
        "\n  {:<36} {}\n  {:<36} {}\n",
        "-h, --help", "Print help.", "-V, --version", "Print version."
    ));
    out.push_str("\nInteractive: <reg> [sem] submits, r refreshes, p prints, q quits.\n");
    out
}

fn tag(label: &str, is_error: bool) -> String {
    let label: ColoredString = if is_error {
        label.bold().red()
    } else {
        label.bold().green()
    };
    format!("{}{}{}", "[".bold().white(), label, "]".bold().white())
}

/// Terminal surface: keeps the report in a [`ReportPage`] and echoes status
/// changes as tagged lines above any running spinner.
pub struct TerminalSink {
    page: ReportPage,
    progress: MultiProgress,
    verbose: u8,
}

impl TerminalSink {
    pub fn new(progress: MultiProgress, verbose: u8) -> Self {
        Self {
            page: ReportPage::default(),
            progress,
            verbose,
        }
    }

    pub fn page(&self) -> &ReportPage {
        &self.page
    }

    fn emit(&self, line: String) {
        self.progress.suspend(|| println!("{line}"));
    }
}

impl ReportSink for TerminalSink {
    fn set_label(&mut self, label: Label, text: &str) {
        self.page.set_label(label, text);
    }

    fn set_remark_tone(&mut self, tone: RemarkTone) {
        self.page.set_remark_tone(tone);
    }

    fn clear_tables(&mut self) {
        self.page.clear_tables();
    }

    fn append_row(&mut self, table: SubjectTable, cells: [Markup; 7]) {
        self.page.append_row(table, cells);
    }

    fn set_grade_point(&mut self, slot: usize, text: &str) {
        self.page.set_grade_point(slot, text);
    }

    fn set_cumulative_grade_point(&mut self, text: &str) {
        self.page.set_cumulative_grade_point(text);
    }

    fn set_status(&mut self, status: Status) {
        let label = if status.is_error { "ERR" } else { "INF" };
        self.emit(format!("{} {}", tag(label, status.is_error), status));
        self.page.set_status(status);
    }

    fn set_visible(&mut self, visible: bool) {
        self.page.set_visible(visible);
    }

    fn trace(&mut self, line: &str) {
        if self.verbose > 0 {
            self.emit(format!(
                "{}{}{} {}",
                "[".bold().white(),
                "DBG".bold().blue(),
                "]".bold().white(),
                line
            ));
        }
    }
}

type App = Controller<HttpTransport, TerminalSink>;

#[derive(Clone, Debug)]
struct RunConfig {
    endpoint: Endpoint,
    registration: Option<String>,
    semester: Option<String>,
    year: Option<String>,
    exam_held: Option<String>,
    interactive: bool,
    timeout: Option<u64>,
    proxy: Option<String>,
    policy: SupersedePolicy,
    output: Option<String>,
    output_format: Option<OutputFormat>,
    verbose: u8,
    no_color: bool,
    color: bool,
}

impl RunConfig {
    fn form(&self, registration: &str, semester: Option<&str>) -> FormInput {
        FormInput {
            registration: registration.to_string(),
            semester: semester
                .map(str::to_string)
                .or_else(|| self.semester.clone()),
            year: self.year.clone(),
            exam_held: self.exam_held.clone(),
        }
    }

    fn report_format(&self) -> OutputFormat {
        self.output_format
            .or_else(|| {
                self.output
                    .as_deref()
                    .and_then(output::infer_format_from_path)
            })
            .unwrap_or(OutputFormat::Text)
    }
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let base_url = args.base_url.or(cfg.base_url);
    let local = args.local || cfg.local.unwrap_or(false);
    let endpoint = Endpoint::select(base_url.as_deref(), local)?;

    let timeout = args.timeout.or(cfg.timeout);
    if timeout == Some(0) {
        return Err("invalid timeout, expected positive integer".to_string());
    }

    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => Some(
            OutputFormat::parse(&raw)
                .ok_or_else(|| format!("invalid output format '{raw}', expected text, json, or html"))?,
        ),
        None => None,
    };
    let output = args
        .output
        .or(cfg.output)
        .filter(|p| !p.trim().is_empty())
        .map(|p| config::expand_tilde_string(&p));

    let discard_stale = args.discard_stale || cfg.discard_stale.unwrap_or(false);
    let policy = if discard_stale {
        SupersedePolicy::LatestRequestWins
    } else {
        SupersedePolicy::LastResponseWins
    };

    let interactive = args.interactive || args.reg.is_none();

    Ok(RunConfig {
        endpoint,
        registration: args.reg,
        semester: args.sem.or(cfg.semester),
        year: args.year.or(cfg.year),
        exam_held: args.exam_held.or(cfg.exam_held),
        interactive,
        timeout,
        proxy: args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty()),
        policy,
        output,
        output_format,
        verbose: args.verbose,
        no_color,
        color: args.color,
    })
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Submit {
        registration: String,
        semester: Option<String>,
    },
    Refresh,
    Print,
    Quit,
    Empty,
}

fn parse_command(line: &str) -> Command {
    let mut parts = line.split_whitespace();
    match parts.next() {
        None => Command::Empty,
        Some("q") | Some("quit") | Some("exit") => Command::Quit,
        Some("r") | Some("refresh") => Command::Refresh,
        Some("p") | Some("print") => Command::Print,
        Some(reg) => Command::Submit {
            registration: reg.to_string(),
            semester: parts.next().map(str::to_string),
        },
    }
}

fn new_spinner(progress: &MultiProgress, message: String) -> ProgressBar {
    let pb = progress.add(ProgressBar::new_spinner());
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

async fn submit_form(app: &App, form: FormInput) -> Outcome {
    app.submit(&form).await
}

async fn show_report(app: &App) {
    let summary = app
        .inspect(|sink| {
            let page = sink.page();
            page.visible.then(|| output::render_terminal(page))
        })
        .await;
    if let Some(summary) = summary {
        println!();
        println!("{summary}");
        println!();
    }
}

async fn write_report(app: &App, run: &RunConfig) -> Result<(), String> {
    let format = run.report_format();
    let rendered = app
        .inspect(|sink| output::render(sink.page(), format))
        .await?;

    match run.output.as_ref() {
        Some(path) => {
            let mut outfile = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)
                .await
                .map_err(|e| format!("failed to open output file: {e}"))?;
            outfile
                .write_all(&rendered)
                .await
                .map_err(|e| format!("failed to write output file: {e}"))?;
            format_kv_line("Saved", path);
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(&rendered)
                .await
                .map_err(|e| format!("failed to write report: {e}"))?;
            stdout
                .flush()
                .await
                .map_err(|e| format!("failed to write report: {e}"))?;
        }
    }
    Ok(())
}

async fn run_once(app: &App, run: &RunConfig, progress: &MultiProgress) -> Result<i32, String> {
    let registration = run.registration.clone().unwrap_or_default();
    let form = run.form(&registration, None);

    let spinner = new_spinner(progress, format!("fetching {}", registration.trim()));
    let outcome = app.submit(&form).await;
    spinner.finish_and_clear();

    if !outcome.is_shown() {
        return Ok(1);
    }
    show_report(app).await;
    if run.output.is_some() {
        write_report(app, run).await?;
    }
    Ok(0)
}

async fn run_interactive(
    app: &App,
    run: &RunConfig,
    progress: &MultiProgress,
) -> Result<i32, String> {
    println!(
        ":: {} ",
        "enter <registration no> [semester]; r = refresh, p = print, q = quit".white()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight = FuturesUnordered::new();
    let mut last_form: Option<FormInput> = None;
    let mut spinner: Option<ProgressBar> = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => return Err(format!("failed to read stdin: {e}")),
                };
                match parse_command(&line) {
                    Command::Quit => break,
                    Command::Empty => {}
                    Command::Print => write_report(app, run).await?,
                    Command::Refresh => match last_form.clone() {
                        Some(form) => in_flight.push(submit_form(app, form)),
                        None => format_kv_line("Refresh", "nothing submitted yet"),
                    },
                    Command::Submit { registration, semester } => {
                        let form = run.form(&registration, semester.as_deref());
                        last_form = Some(form.clone());
                        in_flight.push(submit_form(app, form));
                    }
                }
            }
            Some(outcome) = in_flight.next(), if !in_flight.is_empty() => {
                if outcome.is_shown() {
                    show_report(app).await;
                }
            }
        }

        match (in_flight.is_empty(), spinner.is_some()) {
            (false, false) => {
                spinner = Some(new_spinner(progress, "fetching...".to_string()));
            }
            (true, true) => {
                if let Some(pb) = spinner.take() {
                    pb.finish_and_clear();
                }
            }
            _ => {}
        }
    }

    while let Some(outcome) = in_flight.next().await {
        if outcome.is_shown() {
            show_report(app).await;
        }
    }
    if let Some(pb) = spinner.take() {
        pb.finish_and_clear();
    }
    Ok(0)
}

async fn run_async(run: RunConfig) -> Result<i32, String> {
    if run.color {
        colored::control::set_override(true);
    } else if run.no_color {
        colored::control::set_override(false);
    }
    print_banner();
    format_kv_line("Service", run.endpoint.url().as_str());
    if run.verbose > 0 {
        format_kv_line("Year", run.year.as_deref().unwrap_or(crate::controller::DEFAULT_YEAR));
        format_kv_line(
            "Exam Held",
            run.exam_held
                .as_deref()
                .unwrap_or(crate::controller::DEFAULT_EXAM_HELD),
        );
        if let Some(timeout) = run.timeout {
            format_kv_line("Timeout", &format!("{timeout}s"));
        }
    }
    println!();

    let transport = HttpTransport::new(&TransportOptions {
        proxy: run.proxy.clone(),
        timeout_seconds: run.timeout,
    })
    .map_err(|e| e.to_string())?;

    let progress = MultiProgress::new();
    let sink = TerminalSink::new(progress.clone(), run.verbose);
    let app = Controller::new(run.endpoint.clone(), transport, sink).with_policy(run.policy);

    if run.interactive {
        run_interactive(&app, &run, &progress).await
    } else {
        run_once(&app, &run, &progress).await
    }
}

/// Parses the command line, merges the config file and runs on a
/// current-thread runtime. Returns the process exit code.
pub fn run_cli() -> Result<i32, String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help());
                return Ok(0);
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(0);
            }
            _ => return Err(e.to_string()),
        },
    };

    let config_path = match args.config.as_deref() {
        Some(path) => Some(config::expand_tilde(path)),
        None => config::default_config_path(),
    };
    if args.init_config {
        let path = config_path.ok_or_else(|| "could not determine a config path".to_string())?;
        let created = config::write_template(&path)?;
        let state = if created { "written" } else { "already exists" };
        format_kv_line("Config", &format!("{} ({state})", path.display()));
        return Ok(0);
    }

    // only an explicitly named config file has to exist
    let cfg = match config_path {
        Some(path) => ConfigFile::load(&path, args.config.is_none())?,
        None => ConfigFile::default(),
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
