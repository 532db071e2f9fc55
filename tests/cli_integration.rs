//! Integration tests for the SecurePass CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`.  The
//! master password comes from `SECUREPASS_PASSWORD`, and a config file
//! with cheap Argon2 settings keeps each unlock fast.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const PASSWORD: &str = "Sup3rSecret!";

/// Helper: get a Command pointing at the securepass binary.
fn securepass() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("securepass").expect("binary should exist")
}

/// A temp dir with a fast config, and a command running inside it.
fn workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    tmp.child(".securepass.toml")
        .write_str("argon2_memory_kib = 8192\nargon2_iterations = 1\nargon2_parallelism = 1\n")
        .unwrap();
    tmp
}

fn run(tmp: &TempDir) -> Command {
    let mut cmd = securepass();
    cmd.current_dir(tmp.path())
        .env("SECUREPASS_PASSWORD", PASSWORD)
        .env_remove("SECUREPASS_VAULT")
        .env_remove("SECUREPASS_NEW_PASSWORD")
        .env_remove("SECUREPASS_TOTP");
    cmd
}

fn init(tmp: &TempDir) {
    run(tmp).arg("init").assert().success();
}

#[test]
fn help_flag_shows_usage() {
    securepass()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Encrypted local password vault"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("category"))
        .stdout(predicate::str::contains("passwd"))
        .stdout(predicate::str::contains("two-factor"));
}

#[test]
fn no_args_shows_help() {
    securepass()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn init_creates_vault_file() {
    let tmp = workspace();
    run(&tmp)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Vault created"));
    tmp.child("vault.spdb").assert(predicate::path::exists());
}

#[test]
fn init_twice_fails() {
    let tmp = workspace();
    init(&tmp);
    run(&tmp)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn init_rejects_short_password() {
    let tmp = workspace();
    run(&tmp)
        .env("SECUREPASS_PASSWORD", "short")
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 8"));
    tmp.child("vault.spdb").assert(predicate::path::missing());
}

#[test]
fn list_on_missing_vault_fails() {
    let tmp = workspace();
    run(&tmp)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Vault not found"));
}

#[test]
fn wrong_password_fails() {
    let tmp = workspace();
    init(&tmp);
    run(&tmp)
        .env("SECUREPASS_PASSWORD", "not-the-password")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Wrong master password"));
}

#[test]
fn add_list_show_reveal() {
    let tmp = workspace();
    init(&tmp);

    run(&tmp)
        .args(["add", "GitHub", "--username", "octo", "--password", "gh-s3cret!"])
        .args(["--url", "https://github.com", "--notes", "work account"])
        .assert()
        .success()
        .stdout(predicate::str::contains("added with id 1"));

    run(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("GitHub"))
        .stdout(predicate::str::contains("octo"))
        .stdout(predicate::str::contains("gh-s3cret!").not());

    run(&tmp)
        .args(["show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("gh-s3cret!").not());

    run(&tmp)
        .args(["show", "1", "--reveal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gh-s3cret!"))
        .stdout(predicate::str::contains("work account"));
}

#[test]
fn search_finds_by_username() {
    let tmp = workspace();
    init(&tmp);
    run(&tmp).args(["add", "Forum", "-u", "NeedleFan", "-p", "pw"]).assert().success();
    run(&tmp).args(["add", "Other", "-p", "pw"]).assert().success();

    run(&tmp)
        .args(["search", "needle"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Forum"))
        .stdout(predicate::str::contains("Other").not());
}

#[test]
fn edit_changes_only_given_fields() {
    let tmp = workspace();
    init(&tmp);
    run(&tmp)
        .args(["add", "Site", "-u", "me", "-p", "first-pw", "--notes", "keep me"])
        .assert()
        .success();

    run(&tmp).args(["edit", "1", "--password", "second-pw"]).assert().success();

    run(&tmp)
        .args(["show", "1", "--reveal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("second-pw"))
        .stdout(predicate::str::contains("keep me"))
        .stdout(predicate::str::contains("me"));
}

#[test]
fn delete_with_force() {
    let tmp = workspace();
    init(&tmp);
    run(&tmp).args(["add", "Temp", "-p", "pw"]).assert().success();
    run(&tmp).args(["delete", "1", "--force"]).assert().success();
    run(&tmp)
        .args(["show", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Entry 1 not found"));
}

#[test]
fn category_lifecycle() {
    let tmp = workspace();
    init(&tmp);

    run(&tmp)
        .args(["category", "add", "Banking", "--color", "#10b981"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Category 'Banking' added with id 5"));
    run(&tmp).args(["add", "Bank", "-p", "p@ss", "-c", "5"]).assert().success();

    run(&tmp)
        .args(["category", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Banking"))
        .stdout(predicate::str::contains("General"));

    run(&tmp)
        .args(["category", "delete", "5", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 entries are now uncategorized"));

    run(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Bank"));
}

#[test]
fn totp_prints_six_digits() {
    let tmp = workspace();
    init(&tmp);
    run(&tmp)
        .args(["add", "2FA", "-p", "pw", "--totp", "JBSWY3DPEHPK3PXP"])
        .assert()
        .success();

    run(&tmp)
        .args(["totp", "1"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?m)^\d{6}$").unwrap());
}

#[test]
fn add_accepts_totp_secret_with_trailing_bits() {
    let tmp = workspace();
    init(&tmp);
    run(&tmp)
        .args(["add", "Issuer", "-p", "pw", "--totp", "jbsw y3dp ehpk 3pxp jbsw y3dp eh"])
        .assert()
        .success();

    run(&tmp)
        .args(["totp", "1"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?m)^\d{6}$").unwrap());
}

#[test]
fn passwd_changes_master_password() {
    let tmp = workspace();
    init(&tmp);
    run(&tmp).args(["add", "Mail", "-p", "mail-pw"]).assert().success();

    run(&tmp)
        .env("SECUREPASS_NEW_PASSWORD", "N3wPassword!")
        .arg("passwd")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 entries re-encrypted"));

    run(&tmp).arg("list").assert().failure();
    run(&tmp)
        .env("SECUREPASS_PASSWORD", "N3wPassword!")
        .args(["show", "1", "--reveal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mail-pw"));
}

#[test]
fn generate_respects_length_and_classes() {
    let tmp = workspace();
    let out = securepass()
        .current_dir(tmp.path())
        .args(["generate", "--length", "24", "--no-special"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let pw = String::from_utf8(out).unwrap();
    let pw = pw.trim_end();
    assert_eq!(pw.len(), 24);
    assert!(pw.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn generate_rejects_bad_length() {
    securepass()
        .args(["generate", "--length", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 8 and 64"));
}

#[test]
fn completions_for_bash() {
    securepass()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("securepass"));
}

#[test]
fn explicit_vault_flag_overrides_default() {
    let tmp = workspace();
    let custom = tmp.child("custom.spdb");
    run(&tmp)
        .args(["init", "--vault"])
        .arg(custom.path())
        .assert()
        .success();
    custom.assert(predicate::path::exists());
    tmp.child("vault.spdb").assert(predicate::path::missing());
}
