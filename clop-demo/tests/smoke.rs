use test_driver::{run, TestSession};

const DEMO: &str = env!("CARGO_BIN_EXE_clop-demo");
const INTERLEAVED: &str = env!("CARGO_BIN_EXE_clop-interleaved");

#[test]
fn demo_without_arguments() {
    let out = run(DEMO, &[], 0);
    assert_eq!(
        out.stdout,
        "\nNo logfile\nFlags:\nFlag a is not set\nFlag b is not set\nFlag c is not set\nInteger value = 0\n\n"
    );
    assert!(out.stderr.is_empty(), "stderr: {}", out.stderr);
}

#[test]
fn demo_options_then_arguments() {
    let out = run(DEMO, &["-ab", "--logfile=/tmp/x", "-i", "42", "one", "-c"], 0);
    let lines = out.stdout_lines();
    assert_eq!(lines[1], "Non-option argument 1 in argv[5]: \"one\"");
    assert_eq!(lines[2], "Non-option argument 2 in argv[6]: \"-c\"");
    assert!(lines.contains(&"Logfile: /tmp/x"));
    assert!(lines.contains(&"Flag a is set"));
    assert!(lines.contains(&"Flag b is set"));
    assert!(lines.contains(&"Flag c is not set"));
    assert!(lines.contains(&"Integer value = 42"));
}

#[test]
fn demo_negative_number_is_an_argument() {
    let out = run(DEMO, &["-a", "-5"], 0);
    assert!(out
        .stdout_lines()
        .contains(&"Non-option argument 1 in argv[2]: \"-5\""));
}

#[test]
fn demo_help_lists_options() {
    let out = run(DEMO, &["-a", "--help", "--bogus"], 0);
    assert!(out.stdout.starts_with("Usage: "));
    assert!(out.stdout.contains("[options] [arguments]\nOptions:\n  -h, --help\n"));
    assert!(out.stdout.contains("  -l, --logfile [=PARAM]\n"));
    assert!(out.stdout.contains("  -i, --integer PARAM\n"));
    assert!(out.stderr.is_empty(), "stderr: {}", out.stderr);
}

#[test]
fn demo_unknown_option_fails() {
    let out = run(DEMO, &["--bogus", "-z"], 1);
    let lines = out.stderr_lines();
    assert_eq!(lines.len(), 2, "stderr: {}", out.stderr);
    assert!(lines[0].ends_with(": unrecognized long option --bogus"));
    assert!(lines[1].ends_with(": unrecognized option -z"));
    assert!(out.stdout.is_empty());
}

#[test]
fn demo_missing_argument_fails() {
    let out = run(DEMO, &["-i"], 1);
    assert!(out
        .stderr
        .trim_end()
        .ends_with(": missing argument for option 'i'"));
}

#[test]
fn demo_bad_integer_names_the_option() {
    let out = run(DEMO, &["--integer", "abc"], 1);
    assert!(
        out.stderr
            .contains("argument 2: option \"-i, --integer PARAM\" expects a decimal number and not \"abc\""),
        "stderr: {}",
        out.stderr
    );
}

#[test]
fn interleaved_resumes_after_arguments() {
    let out = run(INTERLEAVED, &["first", "-b", "second", "-l", "-i", "7"], 0);
    let lines = out.stdout_lines();
    assert_eq!(lines[1], "Non-option argument in argv[1]: \"first\"");
    assert_eq!(lines[2], "Non-option argument in argv[3]: \"second\"");
    assert_eq!(lines[3], "Logfile: /var/log/myDefaultLogfile");
    assert!(lines.contains(&"Flag b is set"));
    assert!(lines.contains(&"Integer value = 7"));
}

#[test]
fn interleaved_logfile_with_detached_equals() {
    let out = run(INTERLEAVED, &["--logfile", "=", "/tmp/log", "arg"], 0);
    let lines = out.stdout_lines();
    assert_eq!(lines[1], "Non-option argument in argv[4]: \"arg\"");
    assert_eq!(lines[2], "Logfile: /tmp/log");
}

#[test]
fn interleaved_help_from_closure() {
    let out = run(INTERLEAVED, &["x", "-h"], 0);
    assert!(out.stdout.contains("Non-option argument in argv[1]: \"x\""));
    assert!(out.stdout.contains("Usage: "));
    assert!(out.stdout.contains("\tSet flag 'c'\n"));
}

#[test]
fn tracing_goes_to_stderr() {
    let out = TestSession::spawn(DEMO, &["-a"], &[("RUST_LOG", "clop=debug")])
        .unwrap()
        .wait_exit(0);
    assert!(out.stderr.contains("dispatching option"), "stderr: {}", out.stderr);
    assert!(!out.stdout.contains("dispatching option"));
}
