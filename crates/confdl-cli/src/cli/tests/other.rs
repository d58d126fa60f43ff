//! Tests for list, completions and man.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::CommandFactory;
use clap_complete::Shell;
use confdl_core::filter::FilterCriterion;

#[test]
fn cli_parse_list() {
    match parse(&[
        "confdl",
        "list",
        "--product",
        "Defender",
        "--product",
        "Sentinel",
    ]) {
        CliCommand::List {
            filter,
            catalog_url,
        } => {
            assert_eq!(
                filter.criterion().unwrap(),
                FilterCriterion::ByProduct(vec!["Defender".to_string(), "Sentinel".to_string()])
            );
            assert!(catalog_url.is_none());
        }
        _ => panic!("expected List"),
    }
}

#[test]
fn cli_parse_list_speaker_company() {
    match parse(&["confdl", "list", "--speaker-company", "Contoso"]) {
        CliCommand::List { filter, .. } => assert_eq!(
            filter.criterion().unwrap(),
            FilterCriterion::BySpeakerCompany(vec!["Contoso".to_string()])
        ),
        _ => panic!("expected List"),
    }
}

#[test]
fn cli_parse_pattern_with_comma_stays_one_value() {
    match parse(&["confdl", "download", "--speaker-company", "Contoso, Inc."]) {
        CliCommand::Download { filter, .. } => assert_eq!(
            filter.criterion().unwrap(),
            FilterCriterion::BySpeakerCompany(vec!["Contoso, Inc.".to_string()])
        ),
        _ => panic!("expected Download"),
    }
}

#[test]
fn cli_parse_counted_quantifier_is_not_split() {
    match parse(&["confdl", "list", "--topic", "a{2,4}i"]) {
        CliCommand::List { filter, .. } => assert_eq!(
            filter.criterion().unwrap(),
            FilterCriterion::ByTopic(vec!["a{2,4}i".to_string()])
        ),
        _ => panic!("expected List"),
    }
}

#[test]
fn cli_parse_completions() {
    match parse(&["confdl", "completions", "bash"]) {
        CliCommand::Completions { shell } => assert_eq!(shell, Shell::Bash),
        _ => panic!("expected Completions"),
    }
}

#[test]
fn cli_parse_man() {
    assert!(matches!(parse(&["confdl", "man"]), CliCommand::Man));
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}
