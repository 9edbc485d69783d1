use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

fn batchren(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("batchren").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("BATCHREN_YES")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_replace_removes_keyword_and_suffixes_conflict() {
    let temp_dir = TempDir::new().unwrap();
    temp_dir
        .child("sakura_01.realcugan.png")
        .write_str("upscaled")
        .unwrap();
    temp_dir.child("sakura_01.png").write_str("original").unwrap();

    batchren(&temp_dir)
        .args([
            "-y",
            "replace",
            ".",
            "--old",
            ".realcugan",
            "--case-policy",
            "sensitive",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Renamed 1 file(s)"))
        .stdout(predicate::str::contains("sakura_01_1.png"))
        .stdout(predicate::str::contains("(wanted sakura_01.png)"));

    temp_dir.child("sakura_01_1.png").assert("upscaled");
    temp_dir.child("sakura_01.png").assert("original");
    temp_dir
        .child("sakura_01.realcugan.png")
        .assert(predicate::path::missing());
    temp_dir
        .child(".batchren/history.json")
        .assert(predicate::path::exists());
}

#[test]
fn test_replace_dry_run_changes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    temp_dir.child("a.realcugan.png").write_str("a").unwrap();

    batchren(&temp_dir)
        .args([
            "replace",
            ".",
            "--old",
            ".realcugan",
            "--dry-run",
            "--preview",
            "summary",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("[PLAN SUMMARY]"))
        .stdout(predicate::str::contains("a.realcugan.png -> a.png"))
        .stdout(predicate::str::contains("Dry run: 1 file(s) would be renamed"));

    temp_dir.child("a.realcugan.png").assert("a");
    temp_dir.child("a.png").assert(predicate::path::missing());
    temp_dir.child(".batchren").assert(predicate::path::missing());
}

#[test]
fn test_replace_without_yes_in_non_interactive_mode_fails() {
    let temp_dir = TempDir::new().unwrap();
    temp_dir.child("a.realcugan.png").write_str("a").unwrap();

    batchren(&temp_dir)
        .args(["replace", ".", "--old", ".realcugan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-interactive"));

    temp_dir.child("a.realcugan.png").assert("a");
}

#[test]
fn test_replace_illegal_target_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    temp_dir.child("a-b.txt").write_str("a").unwrap();

    batchren(&temp_dir)
        .args(["-y", "replace", ".", "--old", "-", "--new", "?"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("illegal character '?'"));

    temp_dir.child("a-b.txt").assert("a");
}

#[test]
fn test_replace_empty_old_is_invalid() {
    let temp_dir = TempDir::new().unwrap();

    batchren(&temp_dir)
        .args(["-y", "replace", ".", "--old", ""])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot be empty"));
}

#[test]
fn test_replace_keyword_limits_scope() {
    let temp_dir = TempDir::new().unwrap();
    temp_dir.child("x_old.txt").write_str("x").unwrap();
    temp_dir.child("y_old.log").write_str("y").unwrap();

    batchren(&temp_dir)
        .args([
            "-y", "replace", ".", "--old", "old", "--new", "new", "-k", ".txt",
        ])
        .assert()
        .success();

    temp_dir.child("x_new.txt").assert("x");
    temp_dir.child("y_old.log").assert("y");
}

#[test]
fn test_replace_keyword_matched_against_path() {
    let temp_dir = TempDir::new().unwrap();
    temp_dir.child("photos/IMG_1.png").write_str("1").unwrap();
    temp_dir.child("other/IMG_2.png").write_str("2").unwrap();

    batchren(&temp_dir)
        .args([
            "-y",
            "replace",
            ".",
            "-k",
            "photos",
            "--match-path",
            "--old",
            "IMG",
            "--new",
            "img",
            "--case-policy",
            "sensitive",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Renamed 1 file(s)"));

    temp_dir.child("photos/img_1.png").assert("1");
    temp_dir.child("other/IMG_2.png").assert("2");
}
