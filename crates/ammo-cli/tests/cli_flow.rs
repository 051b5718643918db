use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ammo"))
}

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        std::fs::create_dir_all(dir.path().join("c")).expect("create config dir");
        std::fs::create_dir_all(dir.path().join("d")).expect("create data dir");
        Self { dir }
    }

    fn config_home(&self) -> PathBuf {
        self.dir.path().join("c")
    }

    fn ledger_path(&self) -> PathBuf {
        self.dir.path().join("d").join("ammo").join("ammo.db")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(bin());
        cmd.env("XDG_CONFIG_HOME", self.config_home())
            .env("XDG_DATA_HOME", self.dir.path().join("d"))
            .env("HOME", self.dir.path())
            .env_remove("AMMO_LEDGER_PATH")
            .env_remove("AMMO_CONFIG")
            .env_remove("AMMO_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command().args(args).output().expect("run ammo")
    }

    fn ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "ammo {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).expect("utf8 stdout")
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        serde_json::from_str(&self.ok(args)).expect("json output")
    }

    fn init(&self) {
        self.ok(&["init", "--timezone", "UTC"]);
        self.ok(&[
            "master",
            "add",
            "bullet_type",
            "bullet_type=9mm",
            "size=9",
            "category=handgun",
        ]);
    }
}

fn exit_code(output: &Output) -> i32 {
    output.status.code().expect("exit code")
}

fn inventory_total(inventory: &serde_json::Value, usage: &str, bullet_type: &str) -> i64 {
    inventory
        .as_array()
        .expect("inventory lines")
        .iter()
        .find(|line| line["use"] == usage && line["bullet_type"] == bullet_type)
        .and_then(|line| line["total"].as_i64())
        .unwrap_or(0)
}

#[test]
fn test_init_writes_ledger_and_config() {
    let sandbox = Sandbox::new();
    sandbox.ok(&["init", "--timezone", "Asia/Tokyo"]);

    assert!(sandbox.ledger_path().exists());
    let config = std::fs::read_to_string(sandbox.config_home().join("ammo").join("config.toml"))
        .expect("config written");
    assert!(config.contains("Asia/Tokyo"));
    assert!(config.contains("ammo.db"));

    let again = sandbox.run(&["init"]);
    assert!(!again.status.success());
}

#[test]
fn test_purchase_transfer_inventory_flow() {
    let sandbox = Sandbox::new();
    sandbox.init();

    sandbox.ok(&[
        "purchase", "9mm", "50", "--use", "training", "--place", "range-A", "--gun", "G1",
    ]);
    let ids = sandbox.json(&[
        "transfer", "9mm", "20", "--from", "training", "--to", "duty", "--json",
    ]);
    assert_eq!(ids.as_array().map(Vec::len), Some(2));

    let inventory = sandbox.json(&["inventory", "--json"]);
    assert_eq!(inventory_total(&inventory, "training", "9mm"), 30);
    assert_eq!(inventory_total(&inventory, "duty", "9mm"), 20);

    let rows = sandbox.json(&["list", "--json"]);
    let rows = rows.as_array().expect("rows");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["category"], "handgun");
    assert_eq!(rows[1]["quantity"], -20);
    assert_eq!(rows[1]["place"], "-");
    assert_eq!(rows[1]["note"], "transfer (out)");
    assert_eq!(rows[2]["rowIndex"], 2);

    let meta = sandbox.json(&["meta"]);
    assert_eq!(meta["inventory"]["training|9mm"], 30);
    assert_eq!(meta["bulletTypes"][0]["category"], "handgun");
}

#[test]
fn test_consume_is_negative() {
    let sandbox = Sandbox::new();
    sandbox.init();

    sandbox.ok(&["purchase", "9mm", "50", "--use", "training"]);
    sandbox.ok(&["consume", "9mm", "12", "--use", "training"]);

    let inventory = sandbox.json(&["inventory", "--json"]);
    assert_eq!(inventory_total(&inventory, "training", "9mm"), 38);
}

#[test]
fn test_edit_and_delete_by_position() {
    let sandbox = Sandbox::new();
    sandbox.init();
    sandbox.ok(&["purchase", "9mm", "50", "--use", "training", "--date", "2024-01-05"]);
    sandbox.ok(&["purchase", "9mm", "10", "--use", "duty", "--date", "2024-01-15"]);

    sandbox.ok(&["edit", "0", "--quantity", "40"]);
    let rows = sandbox.json(&["list", "--json"]);
    assert_eq!(rows[0]["quantity"], 40);
    assert_eq!(rows[0]["date"], "2024-01-05");
    assert_eq!(rows[0]["use"], "training");

    sandbox.ok(&["delete", "0"]);
    let rows = sandbox.json(&["list", "--json"]);
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
    assert_eq!(rows[0]["use"], "duty");
    assert_eq!(rows[0]["rowIndex"], 0);
}

#[test]
fn test_edit_by_id_and_clear_fields() {
    let sandbox = Sandbox::new();
    sandbox.init();
    sandbox.ok(&[
        "purchase", "9mm", "50", "--use", "training", "--gun", "G1", "--note", "range day",
    ]);
    sandbox.ok(&["purchase", "9mm", "10", "--use", "duty"]);

    let rows = sandbox.json(&["list", "--json"]);
    let id = rows[1]["id"].as_str().expect("id").to_string();
    sandbox.ok(&["edit", &id, "--quantity", "-4"]);

    sandbox.ok(&["edit", "0", "--note", "", "--gun", ""]);
    let rows = sandbox.json(&["list", "--json"]);
    assert_eq!(rows[1]["quantity"], -4);
    assert_eq!(rows[1]["use"], "duty");
    assert_eq!(rows[0]["note"], "");
    assert_eq!(rows[0]["gun"], "");
    assert_eq!(rows[0]["quantity"], 50);

    let unknown = sandbox.run(&["edit", "00000000-0000-0000-0000-000000000000", "--note", "x"]);
    assert_eq!(exit_code(&unknown), 3);
}

#[test]
fn test_invalid_and_missing_positions() {
    let sandbox = Sandbox::new();
    sandbox.init();
    sandbox.ok(&["purchase", "9mm", "5", "--use", "training"]);

    let negative = sandbox.run(&["delete", "-1"]);
    assert_eq!(exit_code(&negative), 4);

    let fractional = sandbox.run(&["edit", "0.5", "--quantity", "1"]);
    assert_eq!(exit_code(&fractional), 4);

    let past_end = sandbox.run(&["delete", "7"]);
    assert_eq!(exit_code(&past_end), 3);

    let rows = sandbox.json(&["list", "--json"]);
    assert_eq!(rows.as_array().map(Vec::len), Some(1));
}

#[test]
fn test_unknown_master_table_is_rejected() {
    let sandbox = Sandbox::new();
    sandbox.init();

    let output = sandbox.run(&["master", "add", "main", "use=x"]);
    assert_eq!(exit_code(&output), 4);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid table name"));
}

#[test]
fn test_list_date_filter() {
    let sandbox = Sandbox::new();
    sandbox.init();
    sandbox.ok(&["purchase", "9mm", "1", "--use", "training", "--date", "2024-01-05"]);
    sandbox.ok(&["purchase", "9mm", "2", "--use", "training", "--date", "2024-01-15"]);

    let rows = sandbox.json(&[
        "list", "--from", "2024-01-10", "--to", "2024-01-20", "--json",
    ]);
    let rows = rows.as_array().expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["date"], "2024-01-15");
    assert_eq!(rows[0]["rowIndex"], 1);
}

#[test]
fn test_register_json_from_stdin() {
    let sandbox = Sandbox::new();
    sandbox.init();

    let mut child = sandbox
        .command()
        .args(["register", "--json"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn ammo");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(br#"{"mode":"event","use":"hunting","category":"rifle","results":"one boar"}"#)
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait");
    assert!(output.status.success());

    let rows = sandbox.json(&["list", "--json"]);
    assert_eq!(rows[0]["category"], "rifle");
    assert_eq!(rows[0]["note"], "one boar");
    assert!(rows[0]["quantity"].is_null());
}

#[test]
fn test_import_then_export_csv() {
    let sandbox = Sandbox::new();
    sandbox.init();

    let csv_path = sandbox.dir.path().join("main.csv");
    std::fs::write(
        &csv_path,
        "date,use,bullet_type,quantity,place,gun,note\n2024-01-05,training,9mm,50,range-A,G1,\n",
    )
    .expect("write csv");
    sandbox.ok(&["import", csv_path.to_str().expect("utf8 path")]);

    let csv = sandbox.ok(&["export", "--format", "csv"]);
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("date,use,bullet_type,category,quantity,place,gun,note")
    );
    assert_eq!(
        lines.next(),
        Some("2024-01-05T00:00:00,training,9mm,handgun,50,range-A,G1,")
    );

    let bad = sandbox.run(&["export", "--format", "xml"]);
    assert_eq!(exit_code(&bad), 4);
}

#[test]
fn test_missing_ledger_is_not_found() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["list"]);
    assert_eq!(exit_code(&output), 3);

    let output = sandbox.run(&[
        "--ledger",
        sandbox.ledger_path().to_str().expect("utf8 path"),
        "list",
    ]);
    assert_eq!(exit_code(&output), 3);
    assert!(String::from_utf8_lossy(&output.stderr).contains("ammo init"));
}

#[test]
fn test_check_reports_ok() {
    let sandbox = Sandbox::new();
    sandbox.init();
    let out = sandbox.ok(&["check"]);
    assert!(out.contains("Integrity check: OK"));
}
