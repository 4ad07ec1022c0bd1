//! Superficie del binario `capa`. Los flujos completos requieren DATABASE_URL.

use assert_cmd::Command;
use predicates::prelude::*;
use uuid::Uuid;

fn capa() -> Command {
    let mut cmd = Command::cargo_bin("capa").unwrap();
    cmd.env_remove("CAPA_ACTOR");
    cmd
}

#[test]
fn help_lists_every_subcommand() {
    let assert = capa().arg("--help").assert().success();
    let out = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    for sub in ["create", "respond", "approve", "return", "show", "history", "list", "queue", "audit"] {
        assert!(out.contains(sub), "missing {sub} in help:\n{out}");
    }
}

#[test]
fn help_documents_pool_size_variables() {
    capa().arg("--help")
          .assert()
          .success()
          .stdout(predicate::str::contains("DATABASE_MIN_CONNECTIONS").and(predicate::str::contains("DATABASE_MAX_CONNECTIONS")));
}

#[test]
fn malformed_arguments_exit_with_usage_code() {
    capa().args(["approve", "not-a-uuid"]).assert().code(2);
    capa().args(["respond", &Uuid::new_v4().to_string(), "--outcome", "maybe"]).assert().code(2);
}

#[test]
fn missing_database_url_is_a_usage_error() {
    capa().env_remove("DATABASE_URL")
          .args(["history", &Uuid::new_v4().to_string()])
          .assert()
          .code(2)
          .stderr(predicate::str::contains("DATABASE_URL"));
}

#[test]
fn full_cycle_against_postgres() {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL no definido: omitiendo test");
        return;
    };
    let deviation = Uuid::new_v4().to_string();
    let deadline = (chrono::Utc::now() + chrono::Duration::days(2)).to_rfc3339();
    let created = capa().env("DATABASE_URL", &url)
                        .args(["--actor", "U2", "--json", "create", "--deviation", &deviation, "--title",
                               "Fix guard", "--description", "Guard missing", "--responsible", "U1", "--nature",
                               "corrective", "--deadline", &deadline])
                        .assert()
                        .success();
    let json: serde_json::Value = serde_json::from_slice(&created.get_output().stdout).unwrap();
    let id = json["workflow"]["id"].as_str().unwrap().to_string();

    // el validador no puede responder
    capa().env("DATABASE_URL", &url)
          .args(["--actor", "U2", "respond", &id, "--outcome", "completed"])
          .assert()
          .code(4);
    // bloqueado sin notas
    capa().env("DATABASE_URL", &url)
          .args(["--actor", "U1", "respond", &id, "--outcome", "blocked"])
          .assert()
          .code(3);
    capa().env("DATABASE_URL", &url)
          .args(["--actor", "U1", "respond", &id, "--outcome", "completed", "--notes", "done"])
          .assert()
          .success()
          .stdout(predicate::str::contains("submitted_completed"));
    capa().env("DATABASE_URL", &url)
          .args(["--actor", "U2", "approve", &id])
          .assert()
          .success();
    capa().env("DATABASE_URL", &url)
          .args(["audit", &id])
          .assert()
          .success()
          .stdout(predicate::str::contains("consistent:   true"));
}
