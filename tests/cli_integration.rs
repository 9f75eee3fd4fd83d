use assert_cmd::Command;
use predicates::prelude::*;

fn cardfile() -> Command {
    Command::cargo_bin("cardfile").unwrap()
}

#[test]
fn missing_input_file_exits_with_an_error() {
    cardfile()
        .args(["--file", "/no/such/file.md"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn help_mentions_the_file_flag() {
    cardfile()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--file"));
}
