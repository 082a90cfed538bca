use std::thread::JoinHandle;

use debug_abi::ControlCommand;
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc::Sender;
use tracing::warn;

use crate::view::Panel;

pub const HELP_TEXT: &str = concat!(
    "commands:\n",
    "  pause | resume | step (s) | draw (step-draw)\n",
    "  break <hex> (b)      add a PC breakpoint\n",
    "  delete <hex> (d)     remove a listed PC breakpoint\n",
    "  breaks               list PC breakpoints\n",
    "  peek <hex>           center the memory panel on an address\n",
    "  window <n>           number of bytes shown around the peeked address\n",
    "  show [panel]         print one panel or all of them\n",
    "                       panels: regs mem range last next breaks sprite area result\n",
    "  help | quit (q)\n"
);

/// Operands are forwarded as typed by the operator; the session validates
/// them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperatorCommand {
    Control(ControlCommand),
    AddBreakpoint(String),
    RemoveBreakpoint(String),
    Peek(String),
    Window(String),
    Show(Option<Panel>),
    Help,
    Quit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    Unknown(String),
    Usage(&'static str),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Unknown(command) => {
                write!(f, "unknown command '{command}', type 'help' for commands")
            }
            ParseError::Usage(usage) => write!(f, "usage: {usage}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Returns `Ok(None)` for blank lines.
pub fn parse_command(line: &str) -> Result<Option<OperatorCommand>, ParseError> {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Ok(None);
    };
    let arg = parts.next();
    let command = match cmd {
        "pause" => OperatorCommand::Control(ControlCommand::Pause),
        "resume" | "c" | "continue" => OperatorCommand::Control(ControlCommand::Resume),
        "s" | "step" => OperatorCommand::Control(ControlCommand::Step),
        "draw" | "step-draw" => OperatorCommand::Control(ControlCommand::StepDraw),
        "b" | "break" => {
            OperatorCommand::AddBreakpoint(required(arg, "break <hex address>")?)
        }
        "d" | "delete" | "clear" => {
            OperatorCommand::RemoveBreakpoint(required(arg, "delete <hex address>")?)
        }
        "breaks" => OperatorCommand::Show(Some(Panel::Breakpoints)),
        "peek" => OperatorCommand::Peek(required(arg, "peek <hex address>")?),
        "window" => OperatorCommand::Window(required(arg, "window <bytes>")?),
        "show" => match arg {
            None | Some("all") => OperatorCommand::Show(None),
            Some(name) => OperatorCommand::Show(Some(
                Panel::from_name(name).ok_or(ParseError::Usage("show [panel]"))?,
            )),
        },
        "help" | "h" | "?" => OperatorCommand::Help,
        "quit" | "q" | "exit" => OperatorCommand::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn required(arg: Option<&str>, usage: &'static str) -> Result<String, ParseError> {
    arg.map(str::to_string).ok_or(ParseError::Usage(usage))
}

/// Reads operator lines on a dedicated thread and forwards parsed commands.
/// Ctrl-C and Ctrl-D send [`OperatorCommand::Quit`].
pub fn spawn_console(commands: Sender<OperatorCommand>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(err) => {
                warn!("operator console unavailable: {err}");
                let _ = commands.blocking_send(OperatorCommand::Quit);
                return;
            }
        };
        loop {
            match editor.readline("(rip8) ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = editor.add_history_entry(line);
                    match parse_command(line) {
                        Ok(Some(OperatorCommand::Help)) => print!("{HELP_TEXT}"),
                        Ok(Some(command)) => {
                            let quit = command == OperatorCommand::Quit;
                            if commands.blocking_send(command).is_err() || quit {
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(err) => println!("{err}"),
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    let _ = commands.blocking_send(OperatorCommand::Quit);
                    break;
                }
                Err(err) => {
                    warn!("operator console failed: {err}");
                    let _ = commands.blocking_send(OperatorCommand::Quit);
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_commands_parse() {
        assert_eq!(
            parse_command("pause"),
            Ok(Some(OperatorCommand::Control(ControlCommand::Pause)))
        );
        assert_eq!(
            parse_command("  s "),
            Ok(Some(OperatorCommand::Control(ControlCommand::Step)))
        );
        assert_eq!(
            parse_command("draw"),
            Ok(Some(OperatorCommand::Control(ControlCommand::StepDraw)))
        );
    }

    #[test]
    fn operands_are_forwarded_verbatim() {
        assert_eq!(
            parse_command("break 0x200"),
            Ok(Some(OperatorCommand::AddBreakpoint("0x200".to_string())))
        );
        assert_eq!(
            parse_command("d zz"),
            Ok(Some(OperatorCommand::RemoveBreakpoint("zz".to_string())))
        );
        assert_eq!(
            parse_command("window 0"),
            Ok(Some(OperatorCommand::Window("0".to_string())))
        );
    }

    #[test]
    fn missing_operand_reports_usage() {
        assert_eq!(
            parse_command("peek"),
            Err(ParseError::Usage("peek <hex address>"))
        );
        let message = parse_command("break")
            .expect_err("operand is required")
            .to_string();
        assert_eq!(message, "usage: break <hex address>");
    }

    #[test]
    fn show_accepts_panel_names() {
        assert_eq!(parse_command("show"), Ok(Some(OperatorCommand::Show(None))));
        assert_eq!(
            parse_command("show regs"),
            Ok(Some(OperatorCommand::Show(Some(Panel::Registers))))
        );
        assert!(parse_command("show screen").is_err());
    }

    #[test]
    fn blank_and_unknown_lines() {
        assert_eq!(parse_command("   "), Ok(None));
        assert_eq!(
            parse_command("frobnicate"),
            Err(ParseError::Unknown("frobnicate".to_string()))
        );
    }
}
