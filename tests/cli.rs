use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("video-download-api").unwrap();
    cmd.env_remove("INSTAGRAM_COOKIES")
        .env_remove("HOST")
        .env_remove("PORT")
        .env_remove("YT_DLP_PATH");
    cmd
}

#[test]
fn test_help_lists_commands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_config_show_uses_file_and_environment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "server:\n  port: 9191\nextractor:\n  max_audio_size_mb: 24\n").unwrap();

    cli()
        .args(["config", "--show", "--config"])
        .arg(&path)
        .env("HOST", "127.0.0.1")
        .env("INSTAGRAM_COOKIES", "sessionid=topsecretsessionvalue12345")
        .assert()
        .success()
        .stdout(predicate::str::contains("Listen Address: 127.0.0.1:9191"))
        .stdout(predicate::str::contains("Max Audio Size: 24MB"))
        .stdout(predicate::str::contains("Cookies: bare session token"))
        .stdout(predicate::str::contains("topsecret").not());
}

#[test]
fn test_config_init_writes_defaults_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");

    cli()
        .args(["config", "--init", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Default configuration written to"));

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("port: 8080"));
    assert!(content.contains("audio_format: bestaudio/best"));

    cli()
        .args(["config", "--init", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Refusing to overwrite"));
}

#[test]
fn test_missing_config_file_fails() {
    cli()
        .args(["config", "--show", "--config", "/nonexistent/video-download-api.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_invalid_port_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "server:\n  cors: false\n").unwrap();

    cli()
        .args(["config", "--show", "--port", "0", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Server port must be non-zero"));
}

#[test]
fn test_config_init_keeps_existing_local_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "server:\n  port: 9292\n").unwrap();

    cli()
        .current_dir(dir.path())
        .args(["config", "--init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Refusing to overwrite"));

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "server:\n  port: 9292\n");
}
