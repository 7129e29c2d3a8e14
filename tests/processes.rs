use std::io::Write;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

const BIN: &str = env!("CARGO_BIN_EXE_minscan");

fn fixture() -> String {
    format!("{}/tests/fixtures/almanac.txt", env!("CARGO_MANIFEST_DIR"))
}

fn search(extra: &[&str]) -> std::process::Output {
    Command::new(BIN)
        .args(["search", "--input", &fixture()])
        .args(extra)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Couldn't run minscan")
}

#[test]
fn test_search_with_worker_processes() {
    for extra in [
        &["--workers", "3"][..],
        &["--strategy", "per-interval", "--workers", "2"][..],
        &["--chunk-size", "5", "--workers", "4"][..],
    ] {
        let output = search(extra);
        assert!(output.status.success(), "{extra:?}: {output:?}");
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "46");
    }
}

#[test]
fn test_in_process_strategies() {
    for (extra, expected) in [
        (&["--strategy", "points"][..], "35"),
        (&["--strategy", "sequential"][..], "46"),
        (&["--backend", "thread", "--workers", "2"][..], "46"),
    ] {
        let output = search(extra);
        assert!(output.status.success(), "{extra:?}: {output:?}");
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), expected);
    }
}

#[test]
fn test_invalid_configuration_fails_fast() {
    for extra in [
        &["--workers", "0"][..],
        &["--chunk-size", "0"][..],
        &["--strategy", "per-interval", "--chunk-size", "5"][..],
    ] {
        let output = search(extra);
        assert!(!output.status.success(), "{extra:?}");
        assert!(output.stdout.is_empty());
        assert!(
            String::from_utf8_lossy(&output.stderr).contains("Invalid configuration"),
            "{extra:?}: {output:?}"
        );
    }
}

// An input whose single interval takes minutes to scan
fn huge_input(name: &str) -> String {
    let path = std::env::temp_dir().join(format!("minscan-{}-{name}.txt", std::process::id()));
    std::fs::write(&path, "seeds: 0 20000000000\n\nshift map:\n0 10 5\n").unwrap();
    path.to_str().unwrap().to_owned()
}

#[test]
fn test_interrupt_stops_in_process_scans() {
    for (name, extra) in [
        ("sequential", &["--strategy", "sequential"][..]),
        ("thread", &["--backend", "thread", "--workers", "2"][..]),
    ] {
        let input = huge_input(name);
        let child = Command::new(BIN)
            .args(["search", "--input", &input])
            .args(extra)
            .env("RUST_LOG", "warn")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Couldn't run minscan");
        std::thread::sleep(Duration::from_secs(2));

        let interrupted = Instant::now();
        let status = Command::new("kill")
            .args(["-INT", &child.id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());
        let output = child.wait_with_output().unwrap();
        let latency = interrupted.elapsed();
        std::fs::remove_file(&input).ok();

        assert!(!output.status.success(), "{name}: {output:?}");
        assert!(output.stdout.is_empty(), "{name}");
        assert!(latency < Duration::from_secs(10), "{name}: exited after {latency:?}");
    }
}

fn run_worker(request: &str) -> std::process::Output {
    let mut child = Command::new(BIN)
        .args(["worker", "--input", &fixture()])
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Couldn't spawn worker");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(request.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn test_worker_answers_one_request() {
    let output = run_worker("{\"unitId\":4,\"interval\":\"79-14\",\"start\":79,\"count\":14}\n");
    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "{\"unitId\":4,\"interval\":\"79-14\",\"min\":46}\n"
    );
}

#[test]
fn test_worker_reports_unreadable_input() {
    let output = Command::new(BIN)
        .args(["worker", "--input", "/nonexistent/almanac.txt"])
        .stdin(Stdio::null())
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Worker failed: Couldn't read input"),
        "{stderr}"
    );
}

#[test]
fn test_worker_rejects_malformed_request() {
    for request in ["", "{\"unitId\":4,\"start\":79}\n", "garbage\n"] {
        let output = run_worker(request);
        assert!(!output.status.success(), "{request:?}");
        assert!(output.stdout.is_empty());
        assert!(String::from_utf8_lossy(&output.stderr).contains("Malformed request"));
    }
}
