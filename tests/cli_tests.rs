use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

fn write_jar(path: &Path, entries: &[(&str, &str)]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    for (name, content) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

fn archive_members(path: &Path) -> Vec<String> {
    let archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

/// A workspace with `libs/` holding two jars and an empty `out/`.
fn workspace() -> TempDir {
    let temp = TempDir::new().unwrap();
    let libs = temp.path().join("libs");
    fs::create_dir_all(&libs).unwrap();
    fs::create_dir_all(temp.path().join("out")).unwrap();

    write_jar(
        &libs.join("core.jar"),
        &[
            ("com/acme/Core.java", "public class Core {}"),
            ("com/acme/Util.java", "public class Util {}"),
            ("assets/logo.png", "not really a png"),
        ],
    );
    write_jar(
        &libs.join("extra.jar"),
        &[
            ("com/acme/Extra.java", "public class Extra {}"),
            ("extra.properties", "key=value"),
        ],
    );

    temp
}

fn decompack(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("decompack").unwrap();
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_mentions_modes() {
    Command::cargo_bin("decompack")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--combine"))
        .stdout(predicate::str::contains("--mode"));
}

#[test]
fn test_individual_context_run() {
    let temp = workspace();

    decompack(temp.path())
        .args(["libs", "-o", "out", "--extractor", "unzip", "--output-format", "plain"])
        .assert()
        .success();

    let core_area = temp.path().join("out/_decompiled_core");
    let core_zip = core_area.join("context_core_1.zip");
    assert!(core_zip.exists());
    assert_eq!(archive_members(&core_zip), vec!["java_context_1.txt"]);

    let bundle = fs::read_to_string(core_area.join("java_context_1.txt")).unwrap();
    assert!(bundle.contains("public class Core {}"));
    assert!(bundle.contains("public class Util {}"));
    assert!(!bundle.contains("not really a png"));

    assert!(temp
        .path()
        .join("out/_decompiled_extra/context_extra_1.zip")
        .exists());
    assert!(core_area.join(".decompack/report.json").exists());
}

#[test]
fn test_combined_run_shares_bundles() {
    let temp = workspace();

    decompack(temp.path())
        .args(["libs", "-o", "out", "--extractor", "unzip", "--combine"])
        .assert()
        .success();

    let area = temp.path().join("out/_decompiled_combined_libs");
    assert!(area.join("combined_context_1.zip").exists());
    assert!(!temp.path().join("out/_decompiled_core").exists());

    let bundle = fs::read_to_string(area.join("java_context_1.txt")).unwrap();
    assert!(bundle.contains("SOURCE JAR: core.jar"));
    assert!(bundle.contains("SOURCE JAR: extra.jar"));
}

#[test]
fn test_direct_mode_keeps_relative_members() {
    let temp = workspace();

    decompack(temp.path())
        .args(["libs", "-o", "out", "--extractor", "unzip", "--mode", "direct", "-s", "2"])
        .assert()
        .success();

    let area = temp.path().join("out/_decompiled_core");
    let first = archive_members(&area.join("direct_core_1.zip"));
    let second = archive_members(&area.join("direct_core_2.zip"));

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 1);
    assert!(first
        .iter()
        .chain(second.iter())
        .any(|name| name == "com/acme/Core.java"));
}

#[test]
fn test_json_report_output() {
    let temp = workspace();

    decompack(temp.path())
        .args(["libs", "-o", "out", "--extractor", "unzip", "--output-format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"topology\": \"individual\""))
        .stdout(predicate::str::contains("\"status\": \"done\""));
}

#[test]
fn test_invalid_input_directory() {
    let temp = TempDir::new().unwrap();

    decompack(temp.path())
        .args(["missing", "--extractor", "unzip"])
        .assert()
        .code(3);
}

#[test]
fn test_empty_directory_is_not_an_error() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("libs")).unwrap();

    decompack(temp.path())
        .args(["libs", "--extractor", "unzip"])
        .assert()
        .success();
}

#[test]
fn test_corrupt_jar_reports_failure_and_continues() {
    let temp = workspace();
    fs::write(temp.path().join("libs/broken.jar"), b"definitely not a zip").unwrap();

    decompack(temp.path())
        .args(["libs", "-o", "out", "--extractor", "unzip"])
        .assert()
        .code(2);

    assert!(temp
        .path()
        .join("out/_decompiled_core/context_core_1.zip")
        .exists());
    assert!(temp
        .path()
        .join("out/_decompiled_extra/context_extra_1.zip")
        .exists());
    assert!(!temp
        .path()
        .join("out/_decompiled_broken/context_broken_1.zip")
        .exists());
}

#[test]
fn test_existing_output_area_requires_force() {
    let temp = workspace();
    fs::create_dir_all(temp.path().join("out/_decompiled_extra")).unwrap();

    decompack(temp.path())
        .args(["libs", "-o", "out", "--extractor", "unzip"])
        .assert()
        .code(8);
    assert!(!temp.path().join("out/_decompiled_core").exists());

    decompack(temp.path())
        .args(["libs", "-o", "out", "--extractor", "unzip", "--force"])
        .assert()
        .success();
    assert!(temp
        .path()
        .join("out/_decompiled_extra/context_extra_1.zip")
        .exists());
}

#[test]
fn test_missing_decompiler() {
    let temp = workspace();

    decompack(temp.path())
        .args(["libs", "-o", "out"])
        .env_remove("DECOMPACK_DECOMPILER")
        .assert()
        .code(4);
}

#[test]
fn test_dry_run_writes_nothing() {
    let temp = workspace();

    decompack(temp.path())
        .args(["libs", "-o", "out", "--extractor", "unzip", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("core.jar"))
        .stdout(predicate::str::contains("_decompiled_extra"));

    assert_eq!(fs::read_dir(temp.path().join("out")).unwrap().count(), 0);
}

#[test]
fn test_generate_config() {
    let temp = TempDir::new().unwrap();

    decompack(temp.path())
        .arg("--generate-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("decompack.toml"));

    let content = fs::read_to_string(temp.path().join("decompack.toml")).unwrap();
    assert!(content.contains("files_per_archive = 10"));
}

#[test]
fn test_rejects_zero_archive_size() {
    let temp = workspace();

    decompack(temp.path())
        .args(["libs", "-s", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 1"));
}
