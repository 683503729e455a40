use pretty_assertions::assert_eq;

use super::*;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

#[test]
fn no_arguments_shows_help() {
    assert_eq!(parse_args(&[]), Ok(Command::Help));
}

#[test]
fn run_with_timeout() {
    assert_eq!(
        parse_args(&args(&["run", "main.sl", "--timeout", "2.5"])),
        Ok(Command::Run {
            path: "main.sl".to_string(),
            timeout: Some(Duration::from_millis(2500)),
        })
    );
    assert_eq!(
        parse_args(&args(&["run", "--timeout=1", "main.sl"])),
        Ok(Command::Run {
            path: "main.sl".to_string(),
            timeout: Some(Duration::from_secs(1)),
        })
    );
}

#[test]
fn inline_code() {
    assert_eq!(
        parse_args(&args(&["-e", "print(1)"])),
        Ok(Command::Eval {
            code: "print(1)".to_string(),
            timeout: None,
        })
    );
}

#[test]
fn argument_errors() {
    assert!(parse_args(&args(&["run"])).is_err());
    assert!(parse_args(&args(&["run", "a.sl", "b.sl"])).is_err());
    assert!(parse_args(&args(&["run", "a.sl", "--timeout"])).is_err());
    assert!(parse_args(&args(&["run", "a.sl", "--timeout", "-1"])).is_err());
    assert!(parse_args(&args(&["frobnicate"])).is_err());
}

#[test]
fn exit_statuses() {
    assert_eq!(run_source("x = 1", None), 0);
    assert_eq!(run_source("raise SystemExit(0)", None), 0);
    assert_eq!(run_source("raise SystemExit(4)", None), 4);
    assert_eq!(run_source("1 / 0", None), 1);
    assert_eq!(run_source("def (", None), 1);
    assert_eq!(
        run_source("while True:\n    pass\n", Some(Duration::from_millis(20))),
        1
    );
}

#[test]
fn missing_file_fails() {
    assert_eq!(run_file("/nonexistent/sling/script.sl", None), 1);
}
