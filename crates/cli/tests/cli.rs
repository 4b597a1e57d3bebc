use assert_cmd::Command;
use serde_json::Value;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("bookstore-cli").unwrap();
    cmd.env("BOOKSTORE_CONFIG_DIR", "/nonexistent/bookstore-config")
        .env("BOOKSTORE_ENV", "local")
        .env("BOOKSTORE_DATABASE__URL", "sqlite::memory:")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let output = cli().arg("--help").assert().success().get_output().stdout.clone();
    let help = String::from_utf8(output).unwrap();
    for subcommand in ["serve", "migrate", "config"] {
        assert!(help.contains(subcommand), "missing {subcommand} in help");
    }
}

#[test]
fn config_prints_resolved_settings() {
    let output = cli()
        .env("BOOKSTORE_SERVER__PORT", "9999")
        .arg("config")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let settings: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(settings["server"]["port"], 9999);
    assert_eq!(settings["server"]["host"], "localhost");
    assert_eq!(settings["database"]["url"], "sqlite::memory:");
    assert_eq!(settings["environment"], "local");
}

#[test]
fn migrate_applies_book_schema() {
    let output = cli().arg("migrate").assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output).unwrap();
    assert!(stdout.contains("applied 1 migration(s)"));
}

#[test]
fn unknown_environment_fails() {
    cli().env("BOOKSTORE_ENV", "qa").arg("config").assert().failure();
}
