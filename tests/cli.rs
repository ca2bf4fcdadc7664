use assert_cmd::{assert::Assert, prelude::*};
use predicates::prelude::*;
use std::{
    env,
    path::Path,
    process::{Command, Output},
};

#[extend::ext]
impl Command {
    fn assert_stripped(&mut self) -> Assert {
        let output = self.unwrap();
        Assert::new(Output {
            stdout: strip_ansi_escapes::strip(output.stdout),
            stderr: strip_ansi_escapes::strip(output.stderr),
            ..output
        })
    }
}

fn cmp_or_override(file: &str) -> impl '_ + Predicate<[u8]> {
    predicate::function(move |content| {
        let path = Path::new("tests/cli").join(file);
        if matches!(env::var("PHENOCOMPLETE_TEST").as_deref(), Ok("overwrite")) {
            std::fs::write(path, content).unwrap();
            true
        } else {
            content == std::fs::read(path).unwrap_or_default()
        }
    })
}

fn test_cli(name: &str, args: &[&str]) {
    Command::cargo_bin("phenocomplete")
        .unwrap()
        .args(args)
        .assert_stripped()
        .success()
        .stdout(cmp_or_override(&format!("{}.stdout", name)))
        .stderr(cmp_or_override(&format!("{}.stderr", name)));
}

macro_rules! test_cli {
    ($name:expr, $($args:expr),* $(,)?) => {
        test_cli($name, &[$($args,)*]);
    };
}

#[test]
fn search_ranked() {
    test_cli!(
        "search_ranked",
        "search",
        "--input=tests/test-haystack.txt",
        "--rank",
        "--ignore-case",
        "type"
    );
}

#[test]
fn search_json() {
    test_cli!(
        "search_json",
        "search",
        "--input=tests/test-haystack.txt",
        "--format=json",
        "At"
    );
}

#[test]
fn search_all() {
    test_cli!("search_all", "search", "--input=tests/test-haystack.txt");
}

#[test]
fn search_builtin() {
    test_cli!("search_builtin", "search", "-I", "diab");
}

#[test]
fn distance() {
    test_cli!("distance", "distance", "kitten", "sitting");
}

#[test]
fn replay() {
    test_cli!("replay", "replay", "tests/test-replay.jsonc");
}

#[test]
fn replay_invalid_script() {
    let output = assert_cmd::Command::cargo_bin("phenocomplete")
        .unwrap()
        .args(["replay", "-"])
        .write_stdin(r#"{ "haystack": [], "events": [{ "type": "hover" }] }"#)
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(strip_ansi_escapes::strip(output.stderr)).unwrap();
    assert!(stderr.contains("unknown variant `hover`"), "{stderr}");
}
