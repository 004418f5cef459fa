//! `grsd-cli`: inspect and validate monetary amounts from the command line.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use grsd_consensus::money::{is_money_range, sum_money, Amount, SUPPLY_CEILING, UNITS_PER_COIN};
use grsd_consensus::{format_amount, parse_amount};
use grsd_log as logging;
use grsd_log::{log_debug, log_warn};
use serde::Serialize;

const DEFAULT_CONF_FILE_NAME: &str = "grsd.conf";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Limits,
    MoneyRange(Amount),
    Parse(String),
    Format(Amount),
    Sum(Vec<Amount>),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub command: Command,
    pub json: bool,
    pub log: logging::LogConfig,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliAction {
    Run(Config),
    PrintHelp,
    PrintVersion,
}

#[derive(Serialize)]
struct LimitsReport {
    units_per_coin: Amount,
    supply_ceiling: Amount,
    supply_ceiling_coins: String,
}

#[derive(Serialize)]
struct RangeReport {
    value: Amount,
    in_range: bool,
}

#[derive(Serialize)]
struct AmountReport {
    units: Amount,
    coins: String,
}

#[derive(Serialize)]
struct SumReport {
    count: usize,
    units: Amount,
    coins: String,
}

pub fn run_entry() -> Result<(), String> {
    match parse_args_from(std::env::args().skip(1), None)? {
        CliAction::PrintHelp => {
            println!("{}", usage());
            Ok(())
        }
        CliAction::PrintVersion => {
            println!("grsd-cli {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliAction::Run(config) => {
            logging::init(config.log);
            log_debug!(
                "log level {} format {} json output {}",
                config.log.level,
                config.log.format,
                config.json
            );
            let stdout = io::stdout();
            let mut out = stdout.lock();
            execute(&config, &mut out)
        }
    }
}

/// Parses command line arguments, layering them over the config file.
///
/// `default_conf_dir` is where `grsd.conf` is looked up when `--conf` is not
/// given; `None` means the current directory.
pub fn parse_args_from<I>(raw_args: I, default_conf_dir: Option<&Path>) -> Result<CliAction, String>
where
    I: IntoIterator<Item = String>,
{
    let mut conf_path: Option<PathBuf> = None;
    let mut json: Option<bool> = None;
    let mut log_level: Option<logging::Level> = None;
    let mut log_format: Option<logging::Format> = None;
    let mut log_timestamps: Option<bool> = None;
    let mut positional: Vec<String> = Vec::new();

    let mut args = raw_args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliAction::PrintHelp),
            "-V" | "--version" => return Ok(CliAction::PrintVersion),
            "--json" => json = Some(true),
            "--conf" => {
                let value = args
                    .next()
                    .ok_or_else(|| format!("missing value for --conf\n{}", usage()))?;
                conf_path = Some(PathBuf::from(value));
            }
            "--log-level" | "--loglevel" => {
                let value = args
                    .next()
                    .ok_or_else(|| format!("missing value for --log-level\n{}", usage()))?;
                log_level = Some(
                    logging::Level::parse(&value)
                        .ok_or_else(|| format!("invalid log level '{value}'\n{}", usage()))?,
                );
            }
            "--log-format" | "--logformat" => {
                let value = args
                    .next()
                    .ok_or_else(|| format!("missing value for --log-format\n{}", usage()))?;
                log_format = Some(
                    logging::Format::parse(&value)
                        .ok_or_else(|| format!("invalid log format '{value}'\n{}", usage()))?,
                );
            }
            "--log-timestamps" | "--logtimestamps" => log_timestamps = Some(true),
            "--no-log-timestamps" | "--no-logtimestamps" => log_timestamps = Some(false),
            other if other.starts_with("--") => {
                return Err(format!("unknown option '{other}'\n{}", usage()));
            }
            _ => positional.push(arg),
        }
    }

    let conf = match &conf_path {
        Some(path) => Some(
            load_conf(path)?.ok_or_else(|| format!("config file {} not found", path.display()))?,
        ),
        None => {
            let dir = default_conf_dir
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            load_conf(&dir.join(DEFAULT_CONF_FILE_NAME))?
        }
    };
    let conf_label = conf_path
        .as_deref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| DEFAULT_CONF_FILE_NAME.to_string());

    let mut log = logging::LogConfig::default();
    if let Some(conf) = &conf {
        if let Some(raw) = conf_last(conf, "loglevel") {
            log.level = logging::Level::parse(raw)
                .ok_or_else(|| format!("invalid loglevel '{raw}' in {conf_label}"))?;
        }
        if let Some(raw) = conf_last(conf, "logformat") {
            log.format = logging::Format::parse(raw)
                .ok_or_else(|| format!("invalid logformat '{raw}' in {conf_label}"))?;
        }
        if let Some(raw) = conf_last(conf, "logtimestamps") {
            log.timestamps = parse_conf_bool(raw).ok_or_else(|| {
                format!("invalid logtimestamps value '{raw}' in {conf_label}")
            })?;
        }
    }
    let conf_json = match conf.as_ref().and_then(|conf| conf_last(conf, "json")) {
        Some(raw) => parse_conf_bool(raw)
            .ok_or_else(|| format!("invalid json value '{raw}' in {conf_label}"))?,
        None => false,
    };

    if let Some(level) = log_level {
        log.level = level;
    }
    if let Some(format) = log_format {
        log.format = format;
    }
    if let Some(timestamps) = log_timestamps {
        log.timestamps = timestamps;
    }

    match positional.first().map(String::as_str) {
        Some("help") => return Ok(CliAction::PrintHelp),
        Some("version") => return Ok(CliAction::PrintVersion),
        _ => {}
    }
    let command = parse_command(&positional)?;
    Ok(CliAction::Run(Config {
        command,
        json: json.unwrap_or(conf_json),
        log,
    }))
}

fn parse_command(positional: &[String]) -> Result<Command, String> {
    let Some((name, rest)) = positional.split_first() else {
        return Err(format!("missing command\n{}", usage()));
    };
    match name.as_str() {
        "limits" => {
            if !rest.is_empty() {
                return Err(format!("limits takes no arguments\n{}", usage()));
            }
            Ok(Command::Limits)
        }
        "moneyrange" => Ok(Command::MoneyRange(parse_units(single_arg(name, rest, "unit count")?)?)),
        "format" => Ok(Command::Format(parse_units(single_arg(name, rest, "unit count")?)?)),
        "parse" => Ok(Command::Parse(single_arg(name, rest, "coin amount")?.to_string())),
        "sum" => {
            let values = rest
                .iter()
                .map(|value| parse_units(value))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Command::Sum(values))
        }
        other => Err(format!("unknown command '{other}'\n{}", usage())),
    }
}

fn single_arg<'a>(name: &str, rest: &'a [String], what: &str) -> Result<&'a str, String> {
    match rest {
        [value] => Ok(value.as_str()),
        _ => Err(format!("{name} expects exactly one {what}\n{}", usage())),
    }
}

fn parse_units(value: &str) -> Result<Amount, String> {
    value
        .trim()
        .parse::<Amount>()
        .map_err(|_| format!("invalid unit count '{value}'"))
}

pub fn execute<W: Write>(config: &Config, out: &mut W) -> Result<(), String> {
    match &config.command {
        Command::Limits => {
            let report = LimitsReport {
                units_per_coin: UNITS_PER_COIN,
                supply_ceiling: SUPPLY_CEILING,
                supply_ceiling_coins: format_amount(SUPPLY_CEILING),
            };
            if config.json {
                write_json(out, &report)
            } else {
                write_lines(
                    out,
                    &[
                        format!("units_per_coin={}", report.units_per_coin),
                        format!("supply_ceiling={}", report.supply_ceiling),
                        format!("supply_ceiling_coins={}", report.supply_ceiling_coins),
                    ],
                )
            }
        }
        Command::MoneyRange(value) => {
            let in_range = is_money_range(*value);
            if !in_range {
                log_warn!("amount {value} is outside the money range");
            }
            if config.json {
                write_json(
                    out,
                    &RangeReport {
                        value: *value,
                        in_range,
                    },
                )
            } else {
                write_lines(out, &[in_range.to_string()])
            }
        }
        Command::Parse(text) => {
            let units = parse_amount(text).map_err(|err| format!("{err} '{text}'"))?;
            log_debug!("parsed '{text}' as {units} units");
            if config.json {
                write_json(
                    out,
                    &AmountReport {
                        units,
                        coins: format_amount(units),
                    },
                )
            } else {
                write_lines(out, &[units.to_string()])
            }
        }
        Command::Format(units) => {
            let coins = format_amount(*units);
            if config.json {
                write_json(
                    out,
                    &AmountReport {
                        units: *units,
                        coins,
                    },
                )
            } else {
                write_lines(out, &[coins])
            }
        }
        Command::Sum(values) => {
            let total = sum_money(values.iter().copied()).map_err(|err| {
                log_warn!("sum of {} values rejected: {err}", values.len());
                err.to_string()
            })?;
            if config.json {
                write_json(
                    out,
                    &SumReport {
                        count: values.len(),
                        units: total,
                        coins: format_amount(total),
                    },
                )
            } else {
                write_lines(out, &[total.to_string()])
            }
        }
    }
}

fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<(), String> {
    let line = serde_json::to_string(value).map_err(|err| err.to_string())?;
    writeln!(out, "{line}").map_err(|err| err.to_string())
}

fn write_lines<W: Write>(out: &mut W, lines: &[String]) -> Result<(), String> {
    for line in lines {
        writeln!(out, "{line}").map_err(|err| err.to_string())?;
    }
    Ok(())
}

fn load_conf(path: &Path) -> Result<Option<HashMap<String, Vec<String>>>, String> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(format!("failed to read {}: {err}", path.display())),
    };

    let mut out: HashMap<String, Vec<String>> = HashMap::new();
    for raw_line in contents.lines() {
        let line = raw_line
            .split(['#', ';'])
            .next()
            .unwrap_or_default()
            .trim();
        if line.is_empty() {
            continue;
        }
        let (key, value) = match line.split_once('=') {
            Some((key, value)) => (key.trim(), value.trim()),
            None => (line, "1"),
        };
        if key.is_empty() {
            continue;
        }
        out.entry(key.to_ascii_lowercase())
            .or_default()
            .push(value.to_string());
    }
    Ok(Some(out))
}

fn conf_last<'a>(conf: &'a HashMap<String, Vec<String>>, key: &str) -> Option<&'a str> {
    conf.get(key)
        .and_then(|values| values.last())
        .map(String::as_str)
}

fn parse_conf_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.is_empty() {
        return Some(true);
    }
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

pub fn usage() -> String {
    [
        "Usage:",
        "  grsd-cli [options] <command> [args]",
        "",
        "Commands:",
        "  help                Print this help and exit",
        "  version             Print version and exit",
        "  limits              Print the unit and supply ceiling constants",
        "  moneyrange <units>  Check whether a unit count is a valid amount",
        "  parse <coins>       Convert a decimal coin amount to units",
        "  format <units>      Convert a unit count to a decimal coin amount",
        "  sum <units>...      Sum unit counts, rejecting any total outside the money range",
        "",
        "Options:",
        "  --json                Print results as JSON",
        "  --conf <path>         Config file (default: ./grsd.conf if present)",
        "  --log-level <level>   error|warn|info|debug|trace (default: info)",
        "  --log-format <fmt>    text|json (default: text)",
        "  --log-timestamps      Prefix text log lines with a timestamp (default)",
        "  --no-log-timestamps   Omit log timestamps",
        "  -h, --help            Print this help and exit",
        "  -V, --version         Print version and exit",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|value| value.to_string()).collect()
    }

    fn empty_dir() -> tempfile::TempDir {
        tempfile::tempdir().expect("tempdir")
    }

    fn run_config(raw: &[&str], dir: &Path) -> Config {
        match parse_args_from(args(raw), Some(dir)).expect("parse args") {
            CliAction::Run(config) => config,
            other => panic!("unexpected action {other:?}"),
        }
    }

    fn output(config: &Config) -> Result<String, String> {
        let mut buf = Vec::new();
        execute(config, &mut buf)?;
        Ok(String::from_utf8(buf).expect("utf8"))
    }

    #[test]
    fn help_and_version() {
        let dir = empty_dir();
        assert_eq!(
            parse_args_from(args(&["--help"]), Some(dir.path())),
            Ok(CliAction::PrintHelp)
        );
        assert_eq!(
            parse_args_from(args(&["-V", "limits"]), Some(dir.path())),
            Ok(CliAction::PrintVersion)
        );
        assert_eq!(
            parse_args_from(args(&["help"]), Some(dir.path())),
            Ok(CliAction::PrintHelp)
        );
        assert_eq!(
            parse_args_from(args(&["version"]), Some(dir.path())),
            Ok(CliAction::PrintVersion)
        );
    }

    #[test]
    fn commands_parse() {
        let dir = empty_dir();
        assert_eq!(run_config(&["limits"], dir.path()).command, Command::Limits);
        assert_eq!(
            run_config(&["moneyrange", "-1"], dir.path()).command,
            Command::MoneyRange(-1)
        );
        assert_eq!(
            run_config(&["format", "-9223372036854775808"], dir.path()).command,
            Command::Format(Amount::MIN)
        );
        assert_eq!(
            run_config(&["sum", "1", "2", "3"], dir.path()).command,
            Command::Sum(vec![1, 2, 3])
        );
        assert_eq!(
            run_config(&["parse", "1.5"], dir.path()).command,
            Command::Parse("1.5".to_string())
        );
    }

    #[test]
    fn bad_arguments() {
        let dir = empty_dir();
        let cases: [&[&str]; 10] = [
            &[],
            &["nope"],
            &["moneyrange"],
            &["moneyrange", "1", "2"],
            &["moneyrange", "1.5"],
            &["moneyrange", "99999999999999999999"],
            &["limits", "extra"],
            &["--bogus", "limits"],
            &["--log-level"],
            &["--log-level", "loud", "limits"],
        ];
        for raw in cases {
            assert!(
                parse_args_from(args(raw), Some(dir.path())).is_err(),
                "args {raw:?}"
            );
        }
    }

    #[test]
    fn conf_file_applies_and_flags_override() {
        let dir = empty_dir();
        fs::write(
            dir.path().join(DEFAULT_CONF_FILE_NAME),
            "# settings\nloglevel=debug\nlogformat = json ; inline\nlogtimestamps=0\njson\n",
        )
        .expect("write conf");

        let config = run_config(&["limits"], dir.path());
        assert!(config.json);
        assert_eq!(config.log.level, logging::Level::Debug);
        assert_eq!(config.log.format, logging::Format::Json);
        assert!(!config.log.timestamps);

        let config = run_config(
            &["--log-level", "error", "--log-format", "text", "--log-timestamps", "limits"],
            dir.path(),
        );
        assert_eq!(config.log.level, logging::Level::Error);
        assert_eq!(config.log.format, logging::Format::Text);
        assert!(config.log.timestamps);
    }

    #[test]
    fn explicit_conf_path() {
        let dir = empty_dir();
        let path = dir.path().join("custom.conf");
        fs::write(&path, "loglevel=warn\nloglevel=trace\n").expect("write conf");
        let path_str = path.to_str().expect("utf8 path");
        let config = run_config(&["--conf", path_str, "limits"], dir.path());
        assert_eq!(config.log.level, logging::Level::Trace);
        assert!(!config.json);

        let missing = dir.path().join("missing.conf");
        let missing_str = missing.to_str().expect("utf8 path");
        assert!(parse_args_from(args(&["--conf", missing_str, "limits"]), Some(dir.path())).is_err());
    }

    #[test]
    fn invalid_conf_values() {
        let dir = empty_dir();
        fs::write(dir.path().join(DEFAULT_CONF_FILE_NAME), "logtimestamps=maybe\n")
            .expect("write conf");
        let err = parse_args_from(args(&["limits"]), Some(dir.path())).unwrap_err();
        assert!(err.contains("logtimestamps"), "{err}");
    }

    #[test]
    fn defaults_without_conf() {
        let dir = empty_dir();
        let config = run_config(&["limits"], dir.path());
        assert!(!config.json);
        assert_eq!(config.log, logging::LogConfig::default());
    }

    #[test]
    fn limits_output() {
        let dir = empty_dir();
        let text = output(&run_config(&["limits"], dir.path())).expect("limits");
        assert_eq!(
            text,
            "units_per_coin=100000000\nsupply_ceiling=10500000000000000\nsupply_ceiling_coins=105000000.00000000\n"
        );

        let json = output(&run_config(&["--json", "limits"], dir.path())).expect("limits");
        let value: serde_json::Value = serde_json::from_str(json.trim_end()).expect("json");
        assert_eq!(value["units_per_coin"], 100_000_000);
        assert_eq!(value["supply_ceiling"], 10_500_000_000_000_000i64);
        assert_eq!(value["supply_ceiling_coins"], "105000000.00000000");
    }

    #[test]
    fn moneyrange_output() {
        let dir = empty_dir();
        let check = |raw: &str| {
            output(&run_config(&["--log-level", "error", "moneyrange", raw], dir.path()))
                .expect("moneyrange")
        };
        assert_eq!(check("0"), "true\n");
        assert_eq!(check("10500000000000000"), "true\n");
        assert_eq!(check("10500000000000001"), "false\n");
        assert_eq!(check("-1"), "false\n");
        assert_eq!(check("9223372036854775807"), "false\n");

        let json = output(&run_config(&["--json", "moneyrange", "5"], dir.path())).expect("json");
        assert_eq!(json, "{\"value\":5,\"in_range\":true}\n");
    }

    #[test]
    fn parse_and_format_output() {
        let dir = empty_dir();
        assert_eq!(
            output(&run_config(&["parse", "1.5"], dir.path())),
            Ok("150000000\n".to_string())
        );
        assert!(output(&run_config(&["parse", "105000000.1"], dir.path())).is_err());
        assert_eq!(
            output(&run_config(&["format", "-1"], dir.path())),
            Ok("-0.00000001\n".to_string())
        );
        assert_eq!(
            output(&run_config(&["--json", "format", "100000000"], dir.path())),
            Ok("{\"units\":100000000,\"coins\":\"1.00000000\"}\n".to_string())
        );
    }

    #[test]
    fn sum_output() {
        let dir = empty_dir();
        assert_eq!(
            output(&run_config(&["sum"], dir.path())),
            Ok("0\n".to_string())
        );
        assert_eq!(
            output(&run_config(&["sum", "100000000", "50000000"], dir.path())),
            Ok("150000000\n".to_string())
        );
        assert_eq!(
            output(&run_config(
                &["--log-level", "error", "sum", "10500000000000000", "1"],
                dir.path()
            )),
            Err("value out of range".to_string())
        );
        assert_eq!(
            output(&run_config(&["--json", "sum", "1", "2"], dir.path())),
            Ok("{\"count\":2,\"units\":3,\"coins\":\"0.00000003\"}\n".to_string())
        );
    }
}
