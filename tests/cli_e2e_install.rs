//! End-to-end tests for `monkey-patch install`, `uninstall` and `status`.
//!
//! These run the real commit script with `/bin/sh` against a fake host
//! installation in a temporary directory.

#![cfg(unix)]

#[allow(dead_code)]
mod common;
#[allow(unused_imports)]
use common::prelude::*;

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_install_patches_host() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .args(["install", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[OK] Patched"))
        .stdout(predicate::str::contains("[RESTART]"));

    assert_eq!(fixture.read_host_file(host::BACKUP_PATH), host::ENTRY_SCRIPT);
    assert!(fixture
        .read_host_file(host::ENTRY_SCRIPT_PATH)
        .contains("[MonkeyPatchBootstrapToken2]"));
    assert!(fixture
        .read_host_file(host::PATCHED_WORKBENCH_PATH)
        .contains("browser-entrypoint.js\"></script>"));
    assert!(fixture.storage().join("modules").join("main.js").is_file());

    fixture
        .command()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("State: patched"))
        .stdout(predicate::str::contains("Enabled: true"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_enable_alias_and_repeat_install() {
    let fixture = TestFixture::new();

    fixture.command().args(["enable", "--yes"]).assert().success();
    fixture
        .command()
        .args(["install", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already patched"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_uninstall_restores_host() {
    let fixture = TestFixture::new();
    fixture.command().args(["install", "--yes"]).assert().success();

    fixture
        .command()
        .arg("uninstall")
        .assert()
        .success()
        .stdout(predicate::str::contains("Restored the original startup files"));

    assert_eq!(fixture.read_host_file(host::ENTRY_SCRIPT_PATH), host::ENTRY_SCRIPT);
    assert!(!fixture.host_file(host::BACKUP_PATH).exists());
    assert!(!fixture.host_file(host::PATCHED_WORKBENCH_PATH).exists());

    fixture
        .command()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("State: unpatched"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_uninstall_when_unpatched_is_noop() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .arg("disable")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to do"));

    assert_eq!(fixture.read_host_file(host::ENTRY_SCRIPT_PATH), host::ENTRY_SCRIPT);
    assert!(!fixture.storage().exists());
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_status_reports_drift() {
    let fixture = TestFixture::new();
    fixture.command().args(["install", "--yes"]).assert().success();

    std::fs::write(fixture.host_file(host::PATCHED_WORKBENCH_PATH), "<html>").unwrap();

    fixture
        .command()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("State: drifted"))
        .stdout(predicate::str::contains("seems to have been overwritten"));

    fixture.command().args(["install", "--yes"]).assert().success();
    fixture
        .command()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("State: patched"));
}

#[test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
fn test_install_refuses_html_without_workbench_tag() {
    let fixture = TestFixture::new().with_file(
        &format!("app/{}", host::WORKBENCH_PATH),
        "<html>\n<body>\n\t<script src=\"./workbench.js\"></script>\n</body>\n</html>\n",
    );

    fixture
        .command()
        .args(["install", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no `<script src=\"workbench.js\"></script>` line"))
        .stdout(predicate::str::contains("Patched").not());

    assert_eq!(fixture.read_host_file(host::ENTRY_SCRIPT_PATH), host::ENTRY_SCRIPT);
    assert!(!fixture.host_file(host::BACKUP_PATH).exists());
    assert!(!fixture.host_file(host::PATCHED_WORKBENCH_PATH).exists());
}
