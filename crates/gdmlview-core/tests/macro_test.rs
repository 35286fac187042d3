//! Macro execution through `/control/execute`.

use std::path::PathBuf;

use gdmlview_core::{
    ApplicationState, Command, CommandTarget, GdmlviewError, Messenger, Parameter, ParameterKind,
    Result, UiManager,
};

#[derive(Default)]
struct Recorder {
    lines: Vec<String>,
}

impl CommandTarget for Recorder {
    fn application_state(&self) -> ApplicationState {
        ApplicationState::PreInit
    }
}

struct EchoMessenger;

impl Messenger<Recorder> for EchoMessenger {
    fn commands(&self) -> Vec<Command> {
        vec![Command::new("/echo/say").parameter(Parameter::new("text", ParameterKind::String))]
    }

    fn set_new_value(&self, target: &mut Recorder, _command: &Command, args: &[String]) -> Result<()> {
        target.lines.push(args[0].clone());
        Ok(())
    }
}

fn write_macro(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("gdmlview-{}-{name}.mac", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

fn manager() -> UiManager<Recorder> {
    let mut manager = UiManager::new();
    manager.add_messenger(Box::new(EchoMessenger)).unwrap();
    manager
}

#[test]
fn test_macro_runs_every_line() {
    let path = write_macro("ok", "# greeting\n/echo/say hello\n\n/echo/say world\n");
    let manager = manager();
    let mut recorder = Recorder::default();

    manager
        .apply_command(&mut recorder, &format!("/control/execute {}", path.display()))
        .unwrap();
    assert_eq!(recorder.lines, vec!["hello", "world"]);
    std::fs::remove_file(path).ok();
}

#[test]
fn test_macro_stops_at_first_failure() {
    let path = write_macro("fail", "/echo/say one\n/echo/missing\n/echo/say two\n");
    let manager = manager();
    let mut recorder = Recorder::default();

    let err = manager.execute_macro(&mut recorder, &path).unwrap_err();
    match err {
        GdmlviewError::MacroFailed { line, source, .. } => {
            assert_eq!(line, 2);
            assert!(matches!(*source, GdmlviewError::CommandNotFound(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(recorder.lines, vec!["one"]);
    std::fs::remove_file(path).ok();
}

#[test]
fn test_recursive_macro_is_bounded() {
    let path = std::env::temp_dir().join(format!("gdmlview-{}-loop.mac", std::process::id()));
    std::fs::write(&path, format!("/control/execute {}\n", path.display())).unwrap();
    let manager = manager();
    let mut recorder = Recorder::default();

    let err = manager.execute_macro(&mut recorder, &path).unwrap_err();
    let mut cause: &GdmlviewError = &err;
    while let GdmlviewError::MacroFailed { source, .. } = cause {
        cause = &**source;
    }
    assert!(matches!(cause, GdmlviewError::MacroNesting(_)));
    std::fs::remove_file(path).ok();
}

#[test]
fn test_missing_macro_file() {
    let manager = manager();
    let mut recorder = Recorder::default();
    let err = manager
        .apply_command(&mut recorder, "/control/execute /definitely/not/here.mac")
        .unwrap_err();
    assert!(matches!(err, GdmlviewError::IoError(_)));
}
