//! Integration tests for the pdfx CLI

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use lopdf::{dictionary, Document, Object, Stream};
use predicates::prelude::*;
use tempfile::TempDir;

const RULES: &str = r#"{
  "fields": [
    { "name": "Invoice No", "pattern": "INV-\\d+", "required": true },
    { "name": "Email", "pattern": "\\S+@\\S+\\.\\w+" }
  ]
}"#;

/// Helper function to create a test CLI command
fn cli() -> Command {
    Command::cargo_bin("pdfx").unwrap()
}

/// Single-page text PDF using the Helvetica base font
fn write_pdf(path: &Path, text: &str) {
    let mut doc = Document::with_version("1.4");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let pages_id = doc.new_object_id();
    let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        },
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => 1,
            "Kids" => vec![page_id.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

/// Temp dir with a config file and three PDFs: matching, non-matching, corrupt
fn create_test_batch() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("config.json"), RULES).unwrap();

    let input = temp_dir.path().join("input");
    fs::create_dir_all(&input).unwrap();
    write_pdf(&input.join("a_invoice.pdf"), "Invoice INV-1001 billing@example.com");
    write_pdf(&input.join("b_letter.pdf"), "Dear customer");
    fs::write(input.join("c_corrupt.pdf"), b"%PDF-1.4 truncated").unwrap();

    temp_dir
}

#[test]
fn test_help_command() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("rules"));
}

#[test]
fn test_rules_init_refuses_to_overwrite() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("pdfx").join("config.json");
    let config = config.to_str().unwrap();

    cli()
        .args(["-c", config, "rules", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));

    cli()
        .args(["-c", config, "rules", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    cli()
        .args(["-c", config, "rules", "init", "--force"])
        .assert()
        .success();
}

#[test]
fn test_rules_add_check_remove() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.json");
    fs::write(&config_path, RULES).unwrap();
    let config = config_path.to_str().unwrap();

    cli()
        .args(["-c", config, "rules", "add", "--name", "Total", "--pattern", r"\d+\.\d{2}"])
        .assert()
        .success();

    cli()
        .args(["-c", config, "rules", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 rules are valid"))
        .stdout(predicate::str::contains("Total"));

    cli()
        .args(["-c", config, "rules", "remove", "Email"])
        .assert()
        .success();

    let saved = fs::read_to_string(&config_path).unwrap();
    assert!(saved.contains("Total"));
    assert!(!saved.contains("Email"));

    cli()
        .args(["-c", config, "rules", "remove", "Email"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No field named 'Email'"));
}

#[test]
fn test_rules_add_rejects_invalid_rules_without_saving() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.json");
    fs::write(&config_path, RULES).unwrap();
    let config = config_path.to_str().unwrap();

    cli()
        .args(["-c", config, "rules", "add", "--name", "Broken", "--pattern", "(unclosed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid pattern for field 'Broken'"));

    cli()
        .args(["-c", config, "rules", "add", "--name", "Invoice No", "--pattern", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));

    assert_eq!(fs::read_to_string(&config_path).unwrap(), RULES);
}

#[test]
fn test_rules_test_on_text_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.json");
    fs::write(&config_path, RULES).unwrap();
    let text_path = temp_dir.path().join("sample.txt");
    fs::write(&text_path, "Order INV-42 from someone@example.org\n").unwrap();

    cli()
        .args(["-c", config_path.to_str().unwrap(), "rules", "test"])
        .arg(&text_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Status: accepted"))
        .stdout(predicate::str::contains("INV-42"))
        .stdout(predicate::str::contains("someone@example.org"));
}

#[test]
fn test_malformed_config_is_fatal() {
    let temp_dir = create_test_batch();
    let config_path = temp_dir.path().join("config.json");
    fs::write(&config_path, r#"{"fields": [{"name": "A", "pattern": "a", "required": "yes"}]}"#)
        .unwrap();

    cli()
        .args(["-c", config_path.to_str().unwrap(), "batch"])
        .arg(temp_dir.path().join("input"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn test_batch_writes_accepted_rows_and_report() {
    let temp_dir = create_test_batch();
    let config = temp_dir.path().join("config.json");
    let output = temp_dir.path().join("out.csv");
    let report = temp_dir.path().join("report.json");

    cli()
        .args(["-c", config.to_str().unwrap(), "batch"])
        .arg(temp_dir.path().join("input"))
        .arg("-o")
        .arg(&output)
        .arg("--report")
        .arg(&report)
        .assert()
        .success()
        .stderr(predicate::str::contains("1 accepted, 2 rejected"))
        .stderr(predicate::str::contains("missing required field: Invoice No"));

    let csv = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "source,Invoice No,Email");
    assert!(lines[1].contains("a_invoice.pdf,INV-1001,billing@example.com"));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(report["total"], 3);
    assert_eq!(report["accepted"], 1);
    assert_eq!(report["rejected"], 2);
    assert_eq!(report["cancelled"], false);
    assert!(report["skipped_files"].as_array().unwrap().is_empty());

    let rejections = report["rejections"].as_array().unwrap();
    assert!(rejections[0]["source_id"].as_str().unwrap().ends_with("b_letter.pdf"));
    assert_eq!(rejections[0]["reason"]["kind"], "missing_required_field");
    assert_eq!(rejections[0]["reason"]["detail"], "Invoice No");
    assert!(rejections[1]["source_id"].as_str().unwrap().ends_with("c_corrupt.pdf"));
    assert_eq!(rejections[1]["reason"]["kind"], "extraction_failed");
}

#[test]
fn test_batch_parallel_json_matches_input_order() {
    let temp_dir = create_test_batch();
    let input = temp_dir.path().join("input");
    for i in 0..6 {
        write_pdf(&input.join(format!("d_{i}.pdf")), &format!("Ref INV-{i}"));
    }
    let config = temp_dir.path().join("config.json");

    let assert = cli()
        .args(["-c", config.to_str().unwrap(), "batch", "-f", "json", "-j", "4"])
        .arg(&input)
        .assert()
        .success();

    let rows: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    let numbers: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["Invoice No"].as_str().unwrap())
        .collect();
    assert_eq!(
        numbers,
        vec!["INV-1001", "INV-0", "INV-1", "INV-2", "INV-3", "INV-4", "INV-5"]
    );
}

#[test]
fn test_batch_saves_text() {
    let temp_dir = create_test_batch();
    let text_dir = temp_dir.path().join("text");

    cli()
        .args(["-c", temp_dir.path().join("config.json").to_str().unwrap(), "batch"])
        .arg(temp_dir.path().join("input"))
        .arg("--save-text")
        .arg(&text_dir)
        .assert()
        .success();

    let text = fs::read_to_string(text_dir.join("a_invoice_text.txt")).unwrap();
    assert!(text.starts_with("--- a_invoice - Page 1 ---"));
    assert!(text.contains("INV-1001"));
    assert!(!text_dir.join("c_corrupt_text.txt").exists());
}

#[test]
fn test_batch_without_pdfs_fails() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("config.json"), RULES).unwrap();
    fs::write(temp_dir.path().join("notes.txt"), "INV-1").unwrap();

    cli()
        .args(["-c", temp_dir.path().join("config.json").to_str().unwrap(), "batch"])
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No PDF files found"));
}

#[test]
fn test_process_reports_rejection_but_succeeds() {
    let temp_dir = create_test_batch();
    let config = temp_dir.path().join("config.json");

    cli()
        .args(["-c", config.to_str().unwrap(), "process"])
        .arg(temp_dir.path().join("input").join("b_letter.pdf"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"rejected\""))
        .stdout(predicate::str::contains("\"Invoice No\": null"))
        .stderr(predicate::str::contains("Rejected: missing required field: Invoice No"));

    cli()
        .args(["-c", config.to_str().unwrap(), "process", "-f", "csv"])
        .arg(temp_dir.path().join("input").join("a_invoice.pdf"))
        .assert()
        .success()
        .stdout(predicate::str::contains("source,Invoice No,Email"))
        .stdout(predicate::str::contains("INV-1001,billing@example.com"));
}

#[test]
fn test_process_ignores_field_values_in_file_name() {
    let temp_dir = create_test_batch();
    let config = temp_dir.path().join("config.json");
    let pdf = temp_dir.path().join("INV-55.pdf");
    write_pdf(&pdf, "Dear customer");
    let text_dir = temp_dir.path().join("text");

    cli()
        .args(["-c", config.to_str().unwrap(), "process"])
        .arg(&pdf)
        .arg("--save-text")
        .arg(&text_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Invoice No\": null"))
        .stderr(predicate::str::contains("Rejected: missing required field: Invoice No"));

    let text = fs::read_to_string(text_dir.join("INV-55_text.txt")).unwrap();
    assert!(text.starts_with("--- INV-55 - Page 1 ---"));
    assert!(text.contains("Dear customer"));
}
