use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

/// Variables that would leak the developer's environment into a test run.
const ISOLATED_VARS: [&str; 8] = [
    "XSMON_BG_COLOR",
    "XSMON_CPU_COLOR",
    "XSMON_MEM_COLOR",
    "XSMON_ALERT_COLOR",
    "XSMON_CPU_ALERT",
    "XSMON_MEM_ALERT",
    "XSMON_INTERVAL_MS",
    "RUST_LOG",
];

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_xsmon") {
        return PathBuf::from(path);
    }

    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join("xsmon"));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve xsmon binary path for integration test"),
    }
}

pub fn run_cli_case(case_name: &str, args: &[&str]) -> CmdResult {
    run_cli_case_with_env(case_name, args, &[])
}

/// Run the binary with a private `XDG_CONFIG_HOME` and no display, plus `envs`.
pub fn run_cli_case_with_env(
    case_name: &str,
    args: &[&str],
    envs: &[(&str, &str)],
) -> CmdResult {
    let root = std::env::temp_dir().join("xsmon-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");
    let config_home = tempfile::tempdir().expect("create isolated config home");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let mut command = Command::new(&bin_path);
    command
        .args(args)
        .env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("DISPLAY")
        .env("RUST_BACKTRACE", "1");
    for var in ISOLATED_VARS {
        command.env_remove(var);
    }
    for (key, value) in envs {
        command.env(key, value);
    }
    let output = command.output().expect("execute xsmon command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    write_log(
        &log_path,
        case_name,
        &bin_path,
        args,
        &output.status,
        &stdout,
        &stderr,
    );

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

fn write_log(
    log_path: &Path,
    case_name: &str,
    bin_path: &Path,
    args: &[&str],
    status: &ExitStatus,
    stdout: &str,
    stderr: &str,
) {
    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={status}\n"));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(stderr);
    log_content.push('\n');
    fs::write(log_path, log_content).expect("write test log");
}
