use std::io::Write;
use std::process::{Command, Stdio};

const TOOL: &str = env!("CARGO_BIN_EXE_backbone-tool");

fn run_tool(args: &[&str], input: &str) -> (String, String, i32) {
    let mut child = Command::new(TOOL)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn backbone-tool");
    let mut stdin = child.stdin.take().expect("stdin handle");
    stdin.write_all(input.as_bytes()).expect("write stdin");
    drop(stdin);
    let output = child.wait_with_output().expect("wait for backbone-tool");
    (
        String::from_utf8(output.stdout).expect("stdout is UTF-8"),
        String::from_utf8(output.stderr).expect("stderr is UTF-8"),
        output.status.code().expect("exit code"),
    )
}

const SCENARIOS: &[(&str, &str, i32)] = &[
    ("p cnf 1 1\n1 0\n", "b 1\nb 0\ns SATISFIABLE\n", 10),
    ("p cnf 2 2\n1 0\n-2 0\n", "b 1\nb -2\nb 0\ns SATISFIABLE\n", 10),
    ("p cnf 2 1\n1 2 0\n", "b 0\ns SATISFIABLE\n", 10),
    ("p cnf 1 2\n1 0\n-1 0\n", "s UNSATISFIABLE\n", 20),
    ("p cnf 3 3\n1 2 0\n-1 -2 0\n3 0\n", "b 3\nb 0\ns SATISFIABLE\n", 10),
    ("p cnf 3 2\n1 2 3 0\n-1 -2 -3 0\n", "b 0\ns SATISFIABLE\n", 10),
];

#[test]
fn scenario_outputs_are_exact() {
    for &(input, expected, code) in SCENARIOS {
        let (stdout, stderr, status) = run_tool(&["-q"], input);
        assert_eq!(stdout, expected, "stdout for {:?} (stderr: {})", input, stderr);
        assert_eq!(status, code, "exit code for {:?}", input);
    }
}

#[test]
fn scenario_outputs_survive_every_option_combination() {
    let toggles = ["--plain", "--one-by-one", "--no-filter", "--no-fixed", "--no-flip"];
    for &(input, expected, code) in SCENARIOS {
        for mask in 0..(1u32 << toggles.len()) {
            let mut args = vec!["-q"];
            for (bit, &toggle) in toggles.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    args.push(toggle);
                }
            }
            let (stdout, _, status) = run_tool(&args, input);
            assert_eq!(stdout, expected, "stdout for {:?} under {:?}", input, args);
            assert_eq!(status, code, "exit code for {:?} under {:?}", input, args);
        }
    }
}

#[test]
fn check_mode_agrees() {
    for &(input, expected, code) in SCENARIOS {
        let (stdout, _, status) = run_tool(&["-q", "-c"], input);
        assert_eq!(stdout, expected, "checked stdout for {:?}", input);
        assert_eq!(status, code);
    }
}

#[test]
fn backbones_stream_in_ascending_order() {
    // An implication chain forces every variable to true.
    let mut input = String::from("p cnf 5 5\n1 0\n");
    for i in 1..5 {
        input.push_str(&format!("-{} {} 0\n", i, i + 1));
    }
    let (stdout, _, status) = run_tool(&["-q"], &input);
    assert_eq!(stdout, "b 1\nb 2\nb 3\nb 4\nb 5\nb 0\ns SATISFIABLE\n");
    assert_eq!(status, 10);
}

#[test]
fn under_declared_header_is_accepted() {
    // The second clause mentions variable 2 although the header declares
    // only one variable; the range grows and both backbones are reported.
    let (stdout, _, status) = run_tool(&["-q"], "p cnf 1 2\n1 0\n2 0\n");
    assert_eq!(stdout, "b 1\nb 2\nb 0\ns SATISFIABLE\n");
    assert_eq!(status, 10);
}

#[test]
fn no_print_suppresses_b_lines_only() {
    let (stdout, _, status) = run_tool(&["-q", "-n"], "p cnf 1 1\n1 0\n");
    assert_eq!(stdout, "s SATISFIABLE\n");
    assert_eq!(status, 10);
}

#[test]
fn default_verbosity_emits_comments_and_statistics() {
    let (stdout, _, status) = run_tool(&[], "p cnf 1 1\n1 0\n");
    assert_eq!(status, 10);
    assert!(stdout.contains("c found 1 variables"));
    assert!(stdout.contains("b 1\n"));
    assert!(stdout.contains("c --- [ backbone statistics ]"));
    assert!(stdout.contains("c --- [ backbone profiling ]"));
    assert!(stdout.contains("c found 1 backbones"));
    assert!(stdout.contains("100.00 % solving"));
    // Protocol framing: all b lines precede the status line.
    let status_pos = stdout.find("s SATISFIABLE").unwrap();
    let terminator_pos = stdout.find("b 0").unwrap();
    assert!(terminator_pos < status_pos);
}

#[test]
fn statistics_flag_forces_all_buckets() {
    let (stdout, _, _) = run_tool(&["-s"], "p cnf 1 1\n1 0\n");
    for bucket in ["first", "satmax", "unsat", "unsatmax", "flip", "check", "unknown"] {
        assert!(stdout.contains(&format!("% {}", bucket)), "missing bucket {}", bucket);
    }
}

#[test]
fn reads_from_file_argument() {
    let path = std::env::temp_dir().join("backbone-tool-scenario.cnf");
    std::fs::write(&path, "p cnf 2 2\n1 0\n-2 0\n").unwrap();
    let (stdout, _, status) = run_tool(&["-q", path.to_str().unwrap()], "");
    assert_eq!(stdout, "b 1\nb -2\nb 0\ns SATISFIABLE\n");
    assert_eq!(status, 10);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn missing_file_is_a_fatal_error() {
    let (_, stderr, status) = run_tool(&["/nonexistent/input.cnf"], "");
    assert_eq!(status, 1);
    assert!(stderr.contains("error"));
}

#[test]
fn parse_error_is_reported_verbatim() {
    let (_, stderr, status) = run_tool(&[], "p cnf 1 1\nnot-a-literal 0\n");
    assert_eq!(status, 1);
    assert!(stderr.contains("invalid literal"));
}

#[test]
fn unknown_option_exits_with_usage_error() {
    let (_, stderr, status) = run_tool(&["--bogus"], "");
    assert_eq!(status, 1);
    assert!(!stderr.is_empty());
}

#[test]
fn multiple_file_arguments_are_rejected() {
    let (_, _, status) = run_tool(&["one.cnf", "two.cnf"], "");
    assert_eq!(status, 1);
}

#[test]
fn help_and_version_exit_zero() {
    let (stdout, _, status) = run_tool(&["--help"], "");
    assert_eq!(status, 0);
    assert!(stdout.contains("Usage"));

    let (stdout, _, status) = run_tool(&["-V"], "");
    assert_eq!(status, 0);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}
