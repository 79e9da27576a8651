// Tests for command-line parsing

use super::*;
use clap::CommandFactory;

fn parse(args: &[&str]) -> Texpand {
    Texpand::try_parse_from(std::iter::once("texpand").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_command_definition_is_valid() {
    Texpand::command().debug_assert();
}

#[test]
fn test_add_with_options() {
    let args = parse(&[
        "add", "-k", "#\\d+", "-r", "issue", "--regex", "--priority", "5", "-g", "work",
    ]);
    match args.commands {
        Commands::Add {
            keyword,
            replacement,
            regex,
            priority,
            group,
        } => {
            assert_eq!(keyword, "#\\d+");
            assert_eq!(replacement, "issue");
            assert!(regex);
            assert_eq!(priority, 5);
            assert_eq!(group.as_deref(), Some("work"));
        }
        _ => panic!("expected add"),
    }
}

#[test]
fn test_verbosity_counts() {
    assert_eq!(parse(&["status"]).verbose, 0);
    assert_eq!(parse(&["-vv", "run"]).verbose, 2);
    assert_eq!(parse(&["list", "-v"]).verbose, 1);
}

#[test]
fn test_config_multiple_edits() {
    let args = parse(&[
        "config",
        "--set",
        "trigger_delay_ms=150",
        "--set",
        "max_buffer_size=64",
    ]);
    match args.commands {
        Commands::Config { set } => assert_eq!(set.len(), 2),
        _ => panic!("expected config"),
    }
}

#[test]
fn test_subcommand_required() {
    assert!(Texpand::try_parse_from(["texpand"]).is_err());
}
