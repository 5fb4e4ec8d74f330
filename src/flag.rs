//! Clap backend: one command-line flag per configuration field.
//!
//! Compiled only when the `clap` Cargo feature is enabled (on by default).
//!
//! [`register`] adds the flags to a [`clap::Command`] you already have, so
//! your own arguments and subcommands live next to the generated ones.
//! After parsing, [`apply`] writes back only the values the user actually
//! typed; defaults shown in `--help` come from the struct and are never
//! re-applied.
//!
//! Booleans accept a bare flag (`--debug`) as well as `--debug=false`.

use std::ffi::OsString;

use clap::parser::ValueSource;
use clap::{Arg, ArgMatches, Command};

use crate::codec::time::Layout;
use crate::error::TagfigError;
use crate::node::{Kind, Node, Scalar};
use crate::path::{FLAG, short_alias};
use crate::tree::{BuildOptions, Walk, build};

fn value_name(kind: Kind) -> &'static str {
    match kind {
        Kind::Scalar(Scalar::String) => "STRING",
        Kind::Scalar(Scalar::Bool) => "BOOL",
        Kind::Scalar(Scalar::Signed) => "INT",
        Kind::Scalar(Scalar::Unsigned) => "UINT",
        Kind::Scalar(Scalar::Float) => "FLOAT",
        Kind::Scalar(Scalar::Duration) => "DURATION",
        Kind::Scalar(Scalar::Timestamp) => "TIME",
        Kind::Slice(_) => "LIST",
        Kind::Opaque | Kind::Struct => "VALUE",
    }
}

fn help_text(node: &Node<'_>) -> Option<String> {
    let help = node.tags().get("help").filter(|h| !h.is_empty());
    if !matches!(
        node.kind(),
        Kind::Scalar(Scalar::Timestamp) | Kind::Slice(Scalar::Timestamp)
    ) {
        return help.map(str::to_string);
    }
    let layout = Layout::resolve(node.tags().get("fmt"));
    let format = format!("(format: {})", layout.describe());
    Some(match help {
        Some(help) => format!("{help} {format}"),
        None => format,
    })
}

fn arg_for(node: &Node<'_>, name: String) -> Result<Arg, TagfigError> {
    let mut arg = Arg::new(name.clone())
        .long(name)
        .value_name(value_name(node.kind()));

    if let Some(c) = short_alias(node)? {
        arg = arg.short(c);
    }
    if let Some(help) = help_text(node) {
        arg = arg.help(help);
    }

    let current = node.get_str();
    if node.kind() == Kind::Scalar(Scalar::Bool) {
        arg = arg
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true");
    }
    if !current.is_empty() {
        arg = arg.default_value(current);
    }
    Ok(arg)
}

/// Add one flag per field to `cmd`.
pub fn register<C: Walk + ?Sized>(
    config: &mut C,
    mut cmd: Command,
    options: &BuildOptions,
) -> Result<Command, TagfigError> {
    let nodes = build(config, options)?;
    for resolved in nodes.resolve_leaves(&FLAG, None)? {
        let Some(node) = nodes.get(&resolved.path) else {
            continue;
        };
        cmd = cmd.arg(arg_for(node, resolved.key)?);
    }
    Ok(cmd)
}

/// Write every flag given on the command line into `config`. Returns the
/// number of fields set.
pub fn apply<C: Walk + ?Sized>(
    config: &mut C,
    matches: &ArgMatches,
    options: &BuildOptions,
) -> Result<usize, TagfigError> {
    let mut nodes = build(config, options)?;
    let mut applied = 0;

    for resolved in nodes.resolve_leaves(&FLAG, None)? {
        if matches.value_source(&resolved.key) != Some(ValueSource::CommandLine) {
            continue;
        }
        let Ok(Some(raw)) = matches.try_get_one::<String>(&resolved.key) else {
            continue;
        };
        let Some(node) = nodes.get_mut(&resolved.path) else {
            continue;
        };
        node.set_str(raw)
            .map_err(|e| e.at(format!("--{}", resolved.key)))?;
        log::debug!("flag: {} <- --{}", resolved.path, resolved.key);
        applied += 1;
    }

    Ok(applied)
}

/// Register the flags, parse `args` and apply the result.
///
/// Returns the matches so callers can read their own arguments too.
pub fn parse_from<C, I, T>(
    config: &mut C,
    cmd: Command,
    args: I,
    options: &BuildOptions,
) -> Result<ArgMatches, TagfigError>
where
    C: Walk + ?Sized,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cmd = register(config, cmd, options)?;
    let matches = cmd.try_get_matches_from(args)?;
    apply(config, &matches, options)?;
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::Walk;
    use crate::fixtures::test::TestConfig;

    fn parse(cfg: &mut TestConfig, args: &[&str]) -> Result<ArgMatches, TagfigError> {
        parse_from(cfg, Command::new("test"), args, &BuildOptions::default())
    }

    #[test]
    fn long_flags_are_kebab_case() {
        let mut cfg = TestConfig::default();
        parse(&mut cfg, &["test", "--database-pool-size", "20", "--host", "db"]).unwrap();
        assert_eq!(cfg.database.pool_size, 20);
        assert_eq!(cfg.host, "db");
    }

    #[test]
    fn short_alias_flag() {
        let mut cfg = TestConfig::default();
        parse(&mut cfg, &["test", "-p", "3000"]).unwrap();
        assert_eq!(cfg.port, 3000);
    }

    #[test]
    fn defaults_are_not_reapplied() {
        let mut cfg = TestConfig::default();
        let cmd = register(&mut cfg, Command::new("test"), &BuildOptions::default()).unwrap();
        let matches = cmd.try_get_matches_from(["test"]).unwrap();
        cfg.port = 1;
        let n = apply(&mut cfg, &matches, &BuildOptions::default()).unwrap();
        assert_eq!(n, 0);
        assert_eq!(cfg.port, 1);
    }

    #[test]
    fn bare_bool_flag_sets_true() {
        let mut cfg = TestConfig::default();
        parse(&mut cfg, &["test", "--debug"]).unwrap();
        assert!(cfg.debug);
    }

    #[test]
    fn bool_flag_with_explicit_value() {
        let mut cfg = TestConfig {
            debug: true,
            ..TestConfig::default()
        };
        parse(&mut cfg, &["test", "--debug=false"]).unwrap();
        assert!(!cfg.debug);
    }

    #[test]
    fn duration_and_list() {
        let mut cfg = TestConfig::default();
        parse(&mut cfg, &["test", "--timeout", "1m30s", "--tags", "[x;y]"]).unwrap();
        assert_eq!(cfg.timeout, Duration::from_secs(90));
        assert_eq!(cfg.tags, vec!["x", "y"]);
    }

    #[test]
    fn invalid_value_names_flag() {
        let mut cfg = TestConfig::default();
        let err = parse(&mut cfg, &["test", "--port", "http"]).unwrap_err();
        match err {
            TagfigError::Format { key, raw, .. } => {
                assert_eq!(key, "--port");
                assert_eq!(raw, "http");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_flag_is_a_clap_error() {
        let mut cfg = TestConfig::default();
        let err = parse(&mut cfg, &["test", "--nope"]).unwrap_err();
        assert!(matches!(err, TagfigError::Flag(_)));
    }

    #[test]
    fn help_and_defaults_in_usage() {
        let mut cfg = TestConfig::default();
        let mut cmd = register(&mut cfg, Command::new("test"), &BuildOptions::default()).unwrap();
        let help = cmd.render_help().to_string();
        assert!(help.contains("--database-url"));
        assert!(help.contains("The port number."));
        assert!(help.contains("[default: 8080]"));
    }

    #[test]
    fn timestamp_layout_in_help() {
        #[derive(Walk, Default)]
        struct Schedule {
            /// Start time.
            pub start: chrono::DateTime<chrono::Utc>,
            #[tagfig(fmt = "DateOnly")]
            pub holidays: Vec<chrono::DateTime<chrono::Utc>>,
        }
        let mut s = Schedule::default();
        let mut cmd = register(&mut s, Command::new("test"), &BuildOptions::default()).unwrap();
        let help = cmd.render_help().to_string();
        assert!(help.contains("Start time. (format: RFC3339)"));
        assert!(help.contains("(format: %Y-%m-%d)"));
    }

    #[test]
    fn multi_char_short_alias_fails_at_registration() {
        #[derive(Walk, Default)]
        struct Bad {
            #[tagfig(short = "vv")]
            pub verbose: bool,
        }
        let mut bad = Bad::default();
        let err = register(&mut bad, Command::new("test"), &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, TagfigError::InvalidShortAlias { .. }));
    }

    #[test]
    fn omitprefix_and_exclusion() {
        #[derive(Walk, Default)]
        struct Tls {
            pub cert: String,
        }
        #[derive(Walk, Default)]
        struct Server {
            #[tagfig(flag = "omitprefix")]
            pub tls: Tls,
            #[tagfig(flag = "-")]
            pub token: String,
        }
        let mut s = Server::default();
        let cmd = Command::new("test");
        parse_from(&mut s, cmd, ["test", "--cert", "a.pem"], &BuildOptions::default()).unwrap();
        assert_eq!(s.tls.cert, "a.pem");

        let mut s = Server::default();
        let err = parse_from(
            &mut s,
            Command::new("test"),
            ["test", "--token", "x"],
            &BuildOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TagfigError::Flag(_)));
    }

    #[test]
    fn caller_args_coexist() {
        let mut cfg = TestConfig::default();
        let cmd = Command::new("test").arg(
            Arg::new("verbose")
                .long("verbose")
                .action(clap::ArgAction::SetTrue),
        );
        let matches = parse_from(
            &mut cfg,
            cmd,
            ["test", "--verbose", "--port", "1"],
            &BuildOptions::default(),
        )
        .unwrap();
        assert_eq!(cfg.port, 1);
        assert!(matches.get_flag("verbose"));
    }
}
