use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "examresult",
    version,
    about = "semester result lookup and report tool",
    long_about = "examresult fetches a semester result record for a registration number and renders it as a report.\n\nExamples:\n  examresult -r 22105110001 -s III\n  examresult -r 22105110001 -s III -o result.html\n  examresult --local --interactive\n\nTip: Use --config to persist the service URL and exam defaults."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "clr",
        visible_alias = "color",
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'r',
        long = "reg",
        visible_alias = "registration",
        value_name = "REG",
        help_heading = "Query",
        help = "Registration number to look up."
    )]
    pub reg: Option<String>,

    #[arg(
        short = 's',
        long = "sem",
        visible_alias = "semester",
        value_name = "SEM",
        help_heading = "Query",
        help = "Semester token (e.g. I, II, III)."
    )]
    pub sem: Option<String>,

    #[arg(
        short = 'y',
        long = "year",
        visible_alias = "exam-year",
        value_name = "YEAR",
        help_heading = "Query",
        help = "Examination year (defaults to 2024)."
    )]
    pub year: Option<String>,

    #[arg(
        short = 'e',
        long = "eh",
        visible_alias = "exam-held",
        value_name = "PERIOD",
        help_heading = "Query",
        help = "Examination period (defaults to July/2025)."
    )]
    pub exam_held: Option<String>,

    #[arg(
        short = 'i',
        long = "it",
        visible_alias = "interactive",
        help_heading = "Query",
        help = "Read queries from stdin (<reg> [sem], r = refresh, p = print, q = quit)."
    )]
    pub interactive: bool,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.examresult/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "init-config",
        help_heading = "Input",
        help = "Write a commented config template to the config path and exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'b',
        long = "bu",
        visible_alias = "base-url",
        value_name = "URL",
        help_heading = "Service",
        help = "Base URL of the result service (the /result path is appended)."
    )]
    pub base_url: Option<String>,

    #[arg(
        short = 'L',
        long = "local",
        help_heading = "Service",
        help = "Use the local development service at http://localhost:3000."
    )]
    pub local: bool,

    #[arg(
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds (default: none)."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'D',
        long = "ds",
        visible_alias = "discard-stale",
        help_heading = "HTTP",
        help = "Drop responses to older submissions once a newer one was made."
    )]
    pub discard_stale: bool,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the report to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Report format (text, json, html)."
    )]
    pub output_format: Option<String>,
}
