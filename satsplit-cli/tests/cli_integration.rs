//! Integration tests for the satsplit CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to get the path to a test fixture
fn fixture_path(name: &str) -> String {
    format!("tests/fixtures/{}", name)
}

fn satsplit() -> Command {
    let mut cmd = Command::cargo_bin("satsplit").unwrap();
    cmd.env_remove("SATSPLIT_VOCAB");
    cmd
}

fn segment() -> Command {
    let mut cmd = satsplit();
    cmd.arg("segment")
        .arg("--vocab")
        .arg(fixture_path("vocab.json"))
        .arg("--pool-size")
        .arg("2");
    cmd
}

#[test]
fn test_segment_file_as_text() {
    segment()
        .arg("-i")
        .arg(fixture_path("sample.txt"))
        .assert()
        .success()
        .stdout("Hello world.\nHow are you?\nIt is fine!\n");
}

#[test]
fn test_segment_direct_text() {
    segment()
        .arg("--text")
        .arg("Hello world. How are you?")
        .assert()
        .success()
        .stdout("Hello world.\nHow are you?\n");
}

#[test]
fn test_segment_glob_pattern() {
    segment()
        .arg("-i")
        .arg("tests/fixtures/s*.txt")
        .arg("-q")
        .assert()
        .success()
        .stdout(predicate::str::contains("The cat sat on the mat.\nReally?\n"))
        .stdout(predicate::str::contains("It is fine!\n"));
}

#[test]
fn test_json_output() {
    segment()
        .arg("-i")
        .arg(fixture_path("sample.txt"))
        .arg("-f")
        .arg("json")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("["))
        .stdout(predicate::str::contains("\"text\""))
        .stdout(predicate::str::contains("\"offset\": 12"))
        .stdout(predicate::str::contains("How are you?"));
}

#[test]
fn test_markdown_output() {
    segment()
        .arg("-i")
        .arg(fixture_path("sample.txt"))
        .arg("-f")
        .arg("markdown")
        .assert()
        .success()
        .stdout(predicate::str::contains("## "))
        .stdout(predicate::str::contains("1. Hello world."))
        .stdout(predicate::str::contains("3. It is fine!"))
        .stdout(predicate::str::contains("*Total sentences: 3*"));
}

#[test]
fn test_output_file() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().join("sentences.txt");

    segment()
        .arg("-i")
        .arg(fixture_path("sample.txt"))
        .arg("-o")
        .arg(&output_path)
        .assert()
        .success()
        .stdout("");

    let content = fs::read_to_string(&output_path).unwrap();
    assert_eq!(content, "Hello world.\nHow are you?\nIt is fine!\n");
}

#[test]
fn test_high_threshold_keeps_text_whole() {
    segment()
        .arg("--text")
        .arg("Hello world. How are you?")
        .arg("--threshold")
        .arg("1.0")
        .assert()
        .success()
        .stdout("Hello world. How are you?\n");
}

#[test]
fn test_segment_requires_input() {
    segment()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing input"));
}

#[test]
fn test_nonexistent_file() {
    segment()
        .arg("-i")
        .arg("nonexistent-file.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No files found"));
}

#[test]
fn test_missing_vocabulary() {
    satsplit()
        .arg("segment")
        .arg("--vocab")
        .arg("missing-vocab.json")
        .arg("--text")
        .arg("Hello.")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load vocabulary"));
}

#[test]
fn test_vocabulary_from_environment() {
    satsplit()
        .env("SATSPLIT_VOCAB", fixture_path("vocab.json"))
        .arg("segment")
        .arg("--text")
        .arg("It is fine! How are you?")
        .assert()
        .success()
        .stdout("It is fine!\nHow are you?\n");
}

#[test]
fn test_complete() {
    satsplit()
        .arg("complete")
        .arg("--vocab")
        .arg(fixture_path("vocab.json"))
        .arg("How")
        .arg("are")
        .arg("you?")
        .assert()
        .success()
        .stdout(predicate::str::contains("Text: \"How are you?\""))
        .stdout(predicate::str::contains("Complete: true"))
        .stdout(predicate::str::contains("Confidence: 0.99"));

    satsplit()
        .arg("complete")
        .arg("--vocab")
        .arg(fixture_path("vocab.json"))
        .arg("How are")
        .assert()
        .success()
        .stdout(predicate::str::contains("Complete: false"));
}

#[test]
fn test_encode() {
    satsplit()
        .arg("encode")
        .arg("--vocab")
        .arg(fixture_path("vocab.json"))
        .arg("Hello world.")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"▁Hello\""))
        .stdout(predicate::str::contains("\"▁world\""))
        .stdout(predicate::str::contains("\".\""));

    satsplit()
        .arg("encode")
        .arg("--vocab")
        .arg(fixture_path("vocab.json"))
        .arg("--ids-only")
        .arg("Hello world.")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^\d+ \d+ \d+\n$").unwrap());
}

#[test]
fn test_evaluate_against_gold() {
    satsplit()
        .arg("evaluate")
        .arg("--vocab")
        .arg(fixture_path("vocab.json"))
        .arg("-i")
        .arg(fixture_path("gold.txt"))
        .assert()
        .success()
        .stdout(predicate::str::contains("True positives: 3"))
        .stdout(predicate::str::contains("Precision: 1.0000"))
        .stdout(predicate::str::contains("Recall: 1.0000"));
}

#[test]
fn test_evaluate_sweep() {
    satsplit()
        .arg("evaluate")
        .arg("--vocab")
        .arg(fixture_path("vocab.json"))
        .arg("-i")
        .arg(fixture_path("gold.txt"))
        .arg("--sweep")
        .arg("--top")
        .arg("3")
        .assert()
        .success()
        .stdout(predicate::str::contains("threshold"))
        .stdout(predicate::function(|out: &str| out.lines().count() == 4));
}

fn evaluate_sweep(min: &str, max: &str, step: &str) -> Command {
    let mut cmd = satsplit();
    cmd.arg("evaluate")
        .arg("--vocab")
        .arg(fixture_path("vocab.json"))
        .arg("-i")
        .arg(fixture_path("gold.txt"))
        .arg("--sweep")
        .arg("--sweep-min")
        .arg(min)
        .arg("--sweep-max")
        .arg(max)
        .arg("--sweep-step")
        .arg(step);
    cmd
}

#[test]
fn test_evaluate_empty_sweep_range() {
    evaluate_sweep("0.5", "0.1", "0.01")
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty sweep range"));
}

#[test]
fn test_evaluate_zero_sweep_step() {
    evaluate_sweep("0.01", "0.2", "0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("sweep step must be positive"));
}

#[test]
fn test_evaluate_sweep_step_too_fine() {
    evaluate_sweep("0.01", "0.2", "1e-12")
        .assert()
        .failure()
        .stderr(predicate::str::contains("limit is 10000"));
}

#[test]
fn test_evaluate_corpus_directory() {
    satsplit()
        .arg("evaluate")
        .arg("--vocab")
        .arg(fixture_path("vocab.json"))
        .arg("-i")
        .arg(fixture_path("corpus"))
        .assert()
        .success()
        .stdout(predicate::str::contains("True positives: 3"))
        .stdout(predicate::str::contains("False positives: 0"))
        .stdout(predicate::str::contains("Recall: 1.0000"));
}

#[test]
fn test_evaluate_glob_with_gold_format() {
    satsplit()
        .arg("evaluate")
        .arg("--vocab")
        .arg(fixture_path("vocab.json"))
        .arg("-i")
        .arg(fixture_path("corpus/*.json"))
        .arg("--gold-format")
        .arg("json")
        .assert()
        .success()
        .stdout(predicate::str::contains("True positives: 2"))
        .stdout(predicate::str::contains("False negatives: 0"));
}

#[test]
fn test_evaluate_transcript_without_source() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("untitled.txt");
    fs::write(&path, "# Title: Untitled\n\nHello world.\n").unwrap();

    satsplit()
        .arg("evaluate")
        .arg("--vocab")
        .arg(fixture_path("vocab.json"))
        .arg("-i")
        .arg(&path)
        .arg("--gold-format")
        .arg("transcript")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing Source"));
}

#[test]
fn test_generate_config_to_stdout() {
    satsplit()
        .arg("generate-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[segmenter]"))
        .stdout(predicate::str::contains("threshold"))
        .stdout(predicate::str::contains("[evaluation]"));
}

#[test]
fn test_generated_config_drives_segment() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("satsplit.toml");

    satsplit()
        .arg("generate-config")
        .arg("-o")
        .arg(&config_path)
        .assert()
        .success();

    let generated = fs::read_to_string(&config_path).unwrap();
    let edited = generated.replace("format = \"text\"", "format = \"markdown\"");
    assert_ne!(generated, edited);
    fs::write(&config_path, edited).unwrap();

    segment()
        .arg("-c")
        .arg(&config_path)
        .arg("--text")
        .arg("Hello world. How are you?")
        .assert()
        .success()
        .stdout(predicate::str::contains("2. How are you?"));
}

#[test]
fn test_invalid_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("bad.toml");
    fs::write(&config_path, "[segmenter]\nthreshold = 3.0\n").unwrap();

    segment()
        .arg("-c")
        .arg(&config_path)
        .arg("--text")
        .arg("Hello.")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_help() {
    satsplit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("segment"))
        .stdout(predicate::str::contains("evaluate"));
}
