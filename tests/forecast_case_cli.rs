use std::path::PathBuf;
use std::process::Command;

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path
}

#[test]
fn case_file_prints_forecast_json() {
    let out = Command::new(env!("CARGO_BIN_EXE_forecast_case"))
        .arg(fixture("forecast_case.json"))
        .output()
        .unwrap();
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["home_form"]["team"], "Benfica");
    assert_eq!(json["away_form"]["team"], "Porto");
}

#[test]
fn missing_case_file_names_the_path() {
    let out = Command::new(env!("CARGO_BIN_EXE_forecast_case"))
        .arg(fixture("no_such_case.json"))
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("read forecast case"), "{stderr}");
    assert!(stderr.contains("no_such_case.json"), "{stderr}");
}

#[test]
fn malformed_case_file_names_the_path() {
    let path = std::env::temp_dir().join(format!("bad_case_{}.json", std::process::id()));
    std::fs::write(&path, "{ \"query\": ").unwrap();
    let out = Command::new(env!("CARGO_BIN_EXE_forecast_case"))
        .arg(&path)
        .output()
        .unwrap();
    std::fs::remove_file(&path).ok();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("parse forecast case"), "{stderr}");
}
