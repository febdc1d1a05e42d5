use super::command_registry::{
    CommandSpec, MODE_COMMANDS, NO_ARG_COMMANDS, RAW_ARG_COMMANDS, SINGLE_PATH_COMMANDS,
};
use crate::request::GenerationMode;

/// One line of chat input, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Noop,
    Generate { prompt: String },
    SwitchMode(GenerationMode),
    SetRatio(String),
    SetDuration(String),
    Attach { path: String },
    Detach,
    Status,
    Help,
    Quit,
    Unknown { command: String, arg: String },
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn parse_single_path_arg(arg: &str) -> String {
    if arg.trim().is_empty() {
        return String::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect::<Vec<String>>()
            .join(" "),
        Err(_) => arg.trim().to_string(),
    }
}

pub fn parse_intent(text: &str) -> Intent {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return Intent::Noop;
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let arg = slash_tail[command_len..].trim();

            if let Some((_, mode)) = MODE_COMMANDS.iter().find(|(name, _)| *name == command) {
                return Intent::SwitchMode(*mode);
            }

            if let Some(action) = find_action(&command, RAW_ARG_COMMANDS) {
                return match action {
                    "set_ratio" => Intent::SetRatio(arg.to_string()),
                    "set_duration" => Intent::SetDuration(arg.to_string()),
                    _ => Intent::Generate {
                        prompt: arg.to_string(),
                    },
                };
            }

            if find_action(&command, SINGLE_PATH_COMMANDS).is_some() {
                return Intent::Attach {
                    path: parse_single_path_arg(arg),
                };
            }

            if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
                return match action {
                    "detach" => Intent::Detach,
                    "status" => Intent::Status,
                    "help" => Intent::Help,
                    _ => Intent::Quit,
                };
            }

            return Intent::Unknown {
                command,
                arg: arg.to_string(),
            };
        }
    }

    Intent::Generate {
        prompt: raw_trimmed.to_string(),
    }
}
