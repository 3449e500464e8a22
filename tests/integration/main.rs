//! Integration tests for vaultkv

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// Command isolated from the caller's environment and config file
    fn vaultkv(config_dir: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("vaultkv");
        cmd.env("VAULTKV_CONFIG", config_dir.path().join("config.toml"))
            .env_remove("VAULT_ADDR")
            .env_remove("VAULT_TOKEN")
            .env_remove("VAULTKV_PASSWORD")
            .env_remove("GITHUB_TOKEN");
        cmd
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        vaultkv(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Version-agnostic client for Vault's key/value secrets engines",
            ));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        vaultkv(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("vaultkv"));
    }

    #[test]
    fn config_path_honours_env() {
        let temp = TempDir::new().unwrap();
        vaultkv(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                temp.path().join("config.toml").display().to_string(),
            ));
    }

    #[test]
    fn config_show_defaults() {
        let temp = TempDir::new().unwrap();
        vaultkv(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[vault]"))
            .stdout(predicate::str::contains("http://127.0.0.1:8200"));
    }

    #[test]
    fn config_set_then_show() {
        let temp = TempDir::new().unwrap();
        vaultkv(&temp)
            .args(["config", "set", "vault.address", "https://vault.example.com"])
            .assert()
            .success();

        vaultkv(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("https://vault.example.com"));
    }

    #[test]
    fn config_set_unknown_key_fails() {
        let temp = TempDir::new().unwrap();
        vaultkv(&temp)
            .args(["config", "set", "vm.name", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn get_without_token_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        vaultkv(&temp)
            .args(["get", "secret/foo"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No token configured"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn get_against_unreachable_server() {
        let temp = TempDir::new().unwrap();
        vaultkv(&temp)
            .args(["get", "secret/foo", "--address", "http://127.0.0.1:1"])
            .env("VAULT_TOKEN", "s.test")
            .assert()
            .failure()
            .stderr(predicate::str::contains("transport error"));
    }

    #[test]
    fn set_requires_fields() {
        let temp = TempDir::new().unwrap();
        vaultkv(&temp)
            .args(["set", "secret/foo"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("KEY=VALUE"));
    }

    #[test]
    fn destroy_requires_target() {
        let temp = TempDir::new().unwrap();
        vaultkv(&temp)
            .args(["destroy", "secret/foo"])
            .assert()
            .failure();
    }

    #[test]
    fn login_with_userpass_requires_username() {
        let temp = TempDir::new().unwrap();
        vaultkv(&temp)
            .args(["login", "userpass"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--username is required"));
    }

    #[test]
    fn completions_generate() {
        let temp = TempDir::new().unwrap();
        vaultkv(&temp)
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("vaultkv"));
    }
}
