use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn innoventory_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("innoventory"))
}

/// Run a command against a data directory and require success
fn run_ok(data_dir: &Path, args: &[&str]) -> String {
    let output = innoventory_cmd()
        .arg("-C")
        .arg(data_dir)
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "command {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

fn setup() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");
    run_ok(&data_dir, &["init"]);
    (temp_dir, data_dir)
}

/// Data dir with one type of work, one client and one vendor
fn setup_with_basics() -> (TempDir, PathBuf) {
    let (temp_dir, data_dir) = setup();
    run_ok(&data_dir, &["work-type", "add", "--name", "Patent Filing"]);
    run_ok(
        &data_dir,
        &[
            "client",
            "add",
            "--company",
            "Acme Labs",
            "--email",
            "ops@acme.test",
            "--phone",
            "+91 98765 43210",
            "--city",
            "Pune",
        ],
    );
    run_ok(
        &data_dir,
        &[
            "vendor",
            "add",
            "--company",
            "Lex & Co",
            "--email",
            "desk@lex.test",
            "--phone",
            "020-5550100",
            "--work",
            "patent filing",
        ],
    );
    (temp_dir, data_dir)
}

#[test]
fn test_help() {
    innoventory_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Records dashboard for vendors, clients and work orders",
        ));
}

#[test]
fn test_version() {
    innoventory_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("innoventory"));
}

#[test]
fn test_init_creates_data_dir() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("data");

    innoventory_cmd()
        .arg("-C")
        .arg(&data_dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized innoventory data"));

    assert!(data_dir.join("config.toml").exists());
    assert!(data_dir.join("uploads").is_dir());
    assert!(data_dir.join("exports").is_dir());
}

#[test]
fn test_init_fails_if_exists() {
    let (_temp_dir, data_dir) = setup();

    innoventory_cmd()
        .arg("-C")
        .arg(&data_dir)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_status_without_init_fails() {
    let temp_dir = TempDir::new().unwrap();

    innoventory_cmd()
        .arg("-C")
        .arg(temp_dir.path().join("missing"))
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_status_shows_next_order_number() {
    let (_temp_dir, data_dir) = setup_with_basics();

    let out = run_ok(&data_dir, &["status"]);
    assert!(out.contains("Vendors:          1"));
    assert!(out.contains("Clients:          1"));
    assert!(out.contains("Next order:       ORD-"));
    assert!(out.contains("-0001"));
}

#[test]
fn test_client_list_filters_and_sorts() {
    let (_temp_dir, data_dir) = setup_with_basics();
    run_ok(
        &data_dir,
        &[
            "client",
            "add",
            "--company",
            "Zenith Pharma",
            "--email",
            "legal@zenith.test",
            "--phone",
            "2225550199",
            "--city",
            "Mumbai",
        ],
    );

    let out = run_ok(&data_dir, &["client", "list", "--filter", "city=pune"]);
    assert!(out.contains("Acme Labs"));
    assert!(!out.contains("Zenith Pharma"));
    assert!(out.contains("Showing 1-1 of 1 (filtered from 2)"));

    let out = run_ok(&data_dir, &["client", "list", "--sort", "company", "--desc"]);
    let zenith = out.find("Zenith Pharma").unwrap();
    let acme = out.find("Acme Labs").unwrap();
    assert!(zenith < acme);

    let out = run_ok(&data_dir, &["client", "list", "--page", "2", "--page-size", "1"]);
    assert!(out.contains("Zenith Pharma"));
    assert!(out.contains("Showing 2-2 of 2 (page 2/2)"));
}

#[test]
fn test_list_unknown_column_fails() {
    let (_temp_dir, data_dir) = setup_with_basics();

    innoventory_cmd()
        .arg("-C")
        .arg(&data_dir)
        .args(["vendor", "list", "--sort", "rating"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown column 'rating'"));
}

#[test]
fn test_client_without_company_is_rejected() {
    let (_temp_dir, data_dir) = setup();

    innoventory_cmd()
        .arg("-C")
        .arg(&data_dir)
        .args([
            "client",
            "add",
            "--company",
            "  ",
            "--email",
            "a@b.test",
            "--phone",
            "9876543210",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("company_name"));

    let out = run_ok(&data_dir, &["client", "list"]);
    assert!(out.contains("No clients found."));
}

#[test]
fn test_duplicate_vendor_email_is_rejected() {
    let (_temp_dir, data_dir) = setup_with_basics();

    innoventory_cmd()
        .arg("-C")
        .arg(&data_dir)
        .args([
            "vendor",
            "add",
            "--company",
            "Other Firm",
            "--email",
            "DESK@lex.test",
            "--phone",
            "0205550111",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_order_add_and_list() {
    let (_temp_dir, data_dir) = setup_with_basics();

    let out = run_ok(
        &data_dir,
        &[
            "order",
            "add",
            "--client",
            "1",
            "--vendor",
            "1",
            "--work",
            "patent filing",
            "--date",
            "2026-03-01",
            "--client-amount",
            "15000",
            "--vendor-amount",
            "9000",
        ],
    );
    assert!(out.contains("Created ORD-"));
    assert!(out.contains("Margin: ₹6,000.00"));

    let out = run_ok(&data_dir, &["order", "list"]);
    assert!(out.contains("Acme Labs"));
    assert!(out.contains("Lex & Co"));
    assert!(out.contains("Patent Filing"));
    assert!(out.contains("15000.00"));
}

#[test]
fn test_order_for_unknown_work_type_fails() {
    let (_temp_dir, data_dir) = setup_with_basics();

    innoventory_cmd()
        .arg("-C")
        .arg(&data_dir)
        .args([
            "order",
            "add",
            "--client",
            "1",
            "--work",
            "Copyright",
            "--client-amount",
            "100",
        ])
        .assert()
        .failure();
}

#[test]
fn test_attach_twice_gets_numbered_name() {
    let (temp_dir, data_dir) = setup_with_basics();
    let file = temp_dir.path().join("contract.pdf");
    fs::write(&file, b"%PDF-1.4 test").unwrap();

    let first = run_ok(&data_dir, &["vendor", "attach", "1", file.to_str().unwrap()]);
    assert!(first.contains("as 'contract.pdf'"));
    let second = run_ok(&data_dir, &["vendor", "attach", "1", file.to_str().unwrap()]);
    assert!(second.contains("as 'contract (1).pdf'"));

    let stored = data_dir.join("uploads").join("vendors").join("1");
    assert!(stored.join("contract.pdf").exists());
    assert!(stored.join("contract (1).pdf").exists());

    run_ok(&data_dir, &["vendor", "detach", "1", "contract.pdf"]);
    assert!(!stored.join("contract.pdf").exists());

    let out = run_ok(&data_dir, &["vendor", "show", "1"]);
    assert!(out.contains("contract (1).pdf"));
}

#[test]
fn test_attach_rejects_disallowed_type() {
    let (temp_dir, data_dir) = setup_with_basics();
    let file = temp_dir.path().join("script.exe");
    fs::write(&file, b"MZ").unwrap();

    innoventory_cmd()
        .arg("-C")
        .arg(&data_dir)
        .args(["client", "attach", "1", file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not allowed"));
}

#[test]
fn test_soft_delete_restore_and_hard_delete() {
    let (_temp_dir, data_dir) = setup_with_basics();
    run_ok(
        &data_dir,
        &[
            "order",
            "add",
            "--client",
            "1",
            "--work",
            "Patent Filing",
            "--client-amount",
            "500",
        ],
    );

    // Referenced by an order, so a hard delete is refused
    innoventory_cmd()
        .arg("-C")
        .arg(&data_dir)
        .args(["client", "delete", "1", "--hard"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("referenced by order"));

    run_ok(&data_dir, &["client", "delete", "1"]);
    let out = run_ok(&data_dir, &["client", "list"]);
    assert!(out.contains("No clients found."));
    let out = run_ok(&data_dir, &["client", "list", "--include-deleted"]);
    assert!(out.contains("deleted"));

    innoventory_cmd()
        .arg("-C")
        .arg(&data_dir)
        .args(["client", "edit", "1", "--city", "Delhi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Restore it first"));

    run_ok(&data_dir, &["client", "restore", "1"]);
    let out = run_ok(&data_dir, &["client", "list"]);
    assert!(out.contains("Acme Labs"));

    run_ok(&data_dir, &["order", "delete", "1", "--hard"]);
    run_ok(&data_dir, &["client", "delete", "1", "--hard"]);
    let out = run_ok(&data_dir, &["client", "list", "--include-deleted"]);
    assert!(out.contains("No clients found."));
}

#[test]
fn test_work_type_rename_follows_vendors() {
    let (_temp_dir, data_dir) = setup_with_basics();
    run_ok(&data_dir, &["work-type", "edit", "1", "--name", "Patent Prosecution"]);

    let out = run_ok(&data_dir, &["vendor", "list", "--columns", "company,work"]);
    assert!(out.contains("Patent Prosecution"));
    assert!(!out.contains("EMAIL"));
}

#[test]
fn test_sub_admin_add_and_list() {
    let (_temp_dir, data_dir) = setup();
    run_ok(
        &data_dir,
        &[
            "sub-admin",
            "add",
            "--name",
            "Priya Shah",
            "--email",
            "priya@innoventory.test",
            "--username",
            "Priya.S",
            "--permission",
            "orders",
            "--permission",
            "clients",
        ],
    );

    let out = run_ok(&data_dir, &["sub-admin", "list"]);
    assert!(out.contains("priya.s"));
    assert!(out.contains("Priya Shah"));
}

#[test]
fn test_export_csv_and_json() {
    let (temp_dir, data_dir) = setup_with_basics();
    let csv_path = temp_dir.path().join("out").join("clients.csv");
    let json_path = temp_dir.path().join("clients.json");

    run_ok(
        &data_dir,
        &["export", "client", "--output", csv_path.to_str().unwrap()],
    );
    let csv = fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("ID,COMPANY,CONTACT,EMAIL,PHONE,CITY,STATUS"));
    assert!(csv.contains("Acme Labs"));

    run_ok(
        &data_dir,
        &[
            "export",
            "client",
            "--format",
            "json",
            "--columns",
            "id,company",
            "--output",
            json_path.to_str().unwrap(),
        ],
    );
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json[0]["id"], 1);
    assert_eq!(json[0]["company"], "Acme Labs");

    let out = run_ok(&data_dir, &["audit", "--entity", "client"]);
    assert!(out.contains("exported"));
}

#[test]
fn test_export_default_path_uses_exports_dir() {
    let (_temp_dir, data_dir) = setup_with_basics();
    run_ok(&data_dir, &["export", "vendor"]);

    let files: Vec<_> = fs::read_dir(data_dir.join("exports"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("vendors_"));
    assert!(files[0].ends_with(".csv"));
}

#[test]
fn test_dashboard_totals() {
    let (_temp_dir, data_dir) = setup_with_basics();
    run_ok(
        &data_dir,
        &[
            "order",
            "add",
            "--client",
            "1",
            "--vendor",
            "1",
            "--work",
            "Patent Filing",
            "--client-amount",
            "1234567.5",
            "--vendor-amount",
            "1000000",
        ],
    );

    let out = run_ok(&data_dir, &["dashboard"]);
    assert!(out.contains("Innoventory Dashboard"));
    assert!(out.contains("Billed to clients: ₹1,234,567.50"));
    assert!(out.contains("Margin:            ₹234,567.50"));
    assert!(out.contains("Recent orders:"));
}

#[test]
fn test_audit_lists_newest_first() {
    let (_temp_dir, data_dir) = setup_with_basics();

    let out = run_ok(&data_dir, &["audit", "--limit", "1"]);
    assert!(out.contains("Lex & Co"));
    assert!(!out.contains("Acme Labs"));
}

#[test]
fn test_empty_list_still_validates_query() {
    let (_temp_dir, data_dir) = setup();

    innoventory_cmd()
        .arg("-C")
        .arg(&data_dir)
        .args(["client", "list", "--sort", "bogus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown column 'bogus'"));

    innoventory_cmd()
        .arg("-C")
        .arg(&data_dir)
        .args(["vendor", "list", "--page", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid page request"));

    let out = run_ok(&data_dir, &["client", "list", "--sort", "company"]);
    assert!(out.contains("No clients found."));
}

#[test]
fn test_vendor_with_orders_cannot_be_hard_deleted() {
    let (_temp_dir, data_dir) = setup_with_basics();
    run_ok(
        &data_dir,
        &[
            "order",
            "add",
            "--client",
            "1",
            "--vendor",
            "1",
            "--work",
            "Patent Filing",
            "--client-amount",
            "500",
        ],
    );

    innoventory_cmd()
        .arg("-C")
        .arg(&data_dir)
        .args(["vendor", "delete", "1", "--hard"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot delete Vendor #1"))
        .stderr(predicate::str::contains("referenced by order"));

    let out = run_ok(&data_dir, &["vendor", "list"]);
    assert!(out.contains("Lex & Co"));
}

#[test]
fn test_work_type_in_use_cannot_be_hard_deleted() {
    let (_temp_dir, data_dir) = setup_with_basics();

    innoventory_cmd()
        .arg("-C")
        .arg(&data_dir)
        .args(["work-type", "delete", "1", "--hard"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("referenced by vendor #1"));

    run_ok(&data_dir, &["work-type", "add", "--name", "Copyright"]);
    run_ok(&data_dir, &["work-type", "delete", "2", "--hard"]);
    let out = run_ok(&data_dir, &["work-type", "list", "--include-deleted"]);
    assert!(out.contains("Patent Filing"));
    assert!(!out.contains("Copyright"));
}

#[test]
fn test_accented_client_names_clash_ignoring_case() {
    let (_temp_dir, data_dir) = setup();
    run_ok(
        &data_dir,
        &[
            "client",
            "add",
            "--company",
            "Élan Études",
            "--email",
            "contact@elan.test",
            "--phone",
            "9876543210",
        ],
    );

    innoventory_cmd()
        .arg("-C")
        .arg(&data_dir)
        .args([
            "client",
            "add",
            "--company",
            "élan études",
            "--email",
            "other@elan.test",
            "--phone",
            "9876543211",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_order_reference_by_number_or_id() {
    let (_temp_dir, data_dir) = setup_with_basics();
    let config_path = data_dir.join("config.toml");
    let config = fs::read_to_string(&config_path)
        .unwrap()
        .replace("ORD-{year}-{seq:04}", "{seq:03}");
    fs::write(&config_path, config).unwrap();

    for amount in ["100", "200"] {
        run_ok(
            &data_dir,
            &[
                "order",
                "add",
                "--client",
                "1",
                "--work",
                "Patent Filing",
                "--client-amount",
                amount,
            ],
        );
    }

    let out = run_ok(&data_dir, &["order", "show", "002"]);
    assert!(out.contains("Order 002"));
    let out = run_ok(&data_dir, &["order", "show", "1"]);
    assert!(out.contains("Order 001"));
}

#[test]
fn test_repeated_sort_flips_direction() {
    let (_temp_dir, data_dir) = setup_with_basics();
    run_ok(
        &data_dir,
        &[
            "client",
            "add",
            "--company",
            "Zenith Pharma",
            "--email",
            "legal@zenith.test",
            "--phone",
            "2225550199",
        ],
    );

    let out = run_ok(&data_dir, &["client", "list", "--sort", "company"]);
    assert!(out.find("Acme Labs").unwrap() < out.find("Zenith Pharma").unwrap());

    let out = run_ok(
        &data_dir,
        &["client", "list", "--sort", "company", "--sort", "company"],
    );
    assert!(out.find("Zenith Pharma").unwrap() < out.find("Acme Labs").unwrap());
}

#[test]
fn test_audit_limit_zero_is_not_empty_log() {
    let (_temp_dir, data_dir) = setup_with_basics();

    let out = run_ok(&data_dir, &["audit", "--limit", "0"]);
    assert!(!out.contains("No audit entries yet."));
    assert!(out.contains("Showing 0 of 3 entries"));
}

#[test]
fn test_attach_several_files_records_each() {
    let (temp_dir, data_dir) = setup_with_basics();
    let brief = temp_dir.path().join("brief.txt");
    let scan = temp_dir.path().join("scan.png");
    fs::write(&brief, b"brief").unwrap();
    fs::write(&scan, b"png").unwrap();

    run_ok(
        &data_dir,
        &[
            "client",
            "attach",
            "1",
            brief.to_str().unwrap(),
            scan.to_str().unwrap(),
        ],
    );

    let store = fs::read_to_string(data_dir.join("store.toml")).unwrap();
    assert!(store.contains("brief.txt"));
    assert!(store.contains("scan.png"));
    let stored = data_dir.join("uploads").join("clients").join("1");
    assert!(stored.join("brief.txt").exists());
    assert!(stored.join("scan.png").exists());
}
