use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

pub fn default_parallel() -> u16 {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(512) as u16
}

fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration must not be empty".to_string());
    }

    let lower = s.to_ascii_lowercase();
    let (num, scale_us) = if let Some(raw) = lower.strip_suffix("us") {
        (raw, 1u64)
    } else if let Some(raw) = lower.strip_suffix("ms") {
        (raw, 1_000u64)
    } else if let Some(raw) = lower.strip_suffix('s') {
        (raw, 1_000_000u64)
    } else if let Some(raw) = lower.strip_suffix('m') {
        (raw, 60 * 1_000_000u64)
    } else {
        // Bare numbers are milliseconds, the unit epoch ticks are configured in.
        (lower.as_str(), 1_000u64)
    };

    let num = num.trim();
    if num.is_empty() {
        return Err(format!("invalid duration: {input:?}"));
    }

    let value: u64 = num
        .parse()
        .map_err(|_| format!("invalid duration number: {input:?}"))?;

    value
        .checked_mul(scale_us)
        .map(Duration::from_micros)
        .ok_or_else(|| format!("duration too large: {input:?}"))
}

#[derive(Debug, Clone, Parser)]
#[command(name = "enginekeep", version, about = "Native engine epoch ticker and benchmark")]
pub struct Cli {
    /// Settings file (default: `$XDG_CONFIG_HOME/enginekeep/settings.json`).
    #[arg(long, env = "ENGINEKEEP_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Number of threads incrementing the epoch (only used with `--bench`).
    #[arg(
        short = 'p',
        long,
        env = "ENGINEKEEP_PARALLEL",
        default_value_t = default_parallel(),
        value_parser = clap::value_parser!(u16).range(1..=512)
    )]
    pub parallel: u16,

    /// Epoch increments per thread (only used with `--bench`).
    #[arg(short = 'n', long, env = "ENGINEKEEP_INCREMENTS", default_value_t = 1_000_000)]
    pub increments: u64,

    /// How long to tick before the deadline is reached (e.g. `250ms`, `2s`).
    #[arg(
        short = 't',
        long,
        env = "ENGINEKEEP_TIMEOUT",
        default_value = "1s",
        value_parser = parse_duration
    )]
    pub timeout: Duration,

    /// Epoch tick period, overriding the settings file (e.g. `10ms`).
    #[arg(long, env = "ENGINEKEEP_TICK", value_parser = parse_duration)]
    pub tick: Option<Duration>,

    /// Run the concurrent increment benchmark and exit.
    #[arg(long, default_value_t = false)]
    pub bench: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("2s"), Ok(Duration::from_secs(2)));
        assert_eq!(parse_duration("1m"), Ok(Duration::from_secs(60)));
        assert_eq!(parse_duration("500us"), Ok(Duration::from_micros(500)));
        assert_eq!(parse_duration(" 15 "), Ok(Duration::from_millis(15)));
        assert_eq!(parse_duration("3MS"), Ok(Duration::from_millis(3)));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("ms").is_err());
        assert!(parse_duration("ten").is_err());
        assert!(parse_duration("-1s").is_err());
        assert!(parse_duration(&format!("{}m", u64::MAX)).is_err());
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["enginekeep"]).unwrap();
        assert!(!cli.bench);
        assert_eq!(cli.timeout, Duration::from_secs(1));
        assert!(cli.tick.is_none());
        assert!(cli.parallel >= 1);
    }
}
