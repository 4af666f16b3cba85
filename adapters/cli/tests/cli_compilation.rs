use std::process::Command;

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "tilewave"])
        .status()
        .expect("failed to invoke cargo check for the tilewave binary");

    assert!(status.success(), "cargo check --bin tilewave should succeed");
}

#[test]
fn cli_help_lists_subcommands() {
    let output = Command::new(env!("CARGO_BIN_EXE_tilewave"))
        .arg("--help")
        .output()
        .expect("failed to invoke the tilewave binary");

    assert!(output.status.success());
    let help = String::from_utf8_lossy(&output.stdout);
    assert!(help.contains("solve"));
    assert!(help.contains("decode"));
}
