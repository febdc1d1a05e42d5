use crate::request::GenerationMode;

#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

/// Tab switches. The model names double as aliases for their mode.
pub(crate) const MODE_COMMANDS: &[(&str, GenerationMode)] = &[
    ("image", GenerationMode::Image),
    ("seedream", GenerationMode::Image),
    ("video", GenerationMode::Video),
    ("seedance", GenerationMode::Video),
];

pub(crate) const RAW_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "ratio",
        action: "set_ratio",
    },
    CommandSpec {
        command: "duration",
        action: "set_duration",
    },
    // Submits even with no text, so an attachment alone can be sent.
    CommandSpec {
        command: "go",
        action: "generate",
    },
    CommandSpec {
        command: "generate",
        action: "generate",
    },
];

pub(crate) const SINGLE_PATH_COMMANDS: &[CommandSpec] = &[CommandSpec {
    command: "attach",
    action: "attach",
}];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "detach",
        action: "detach",
    },
    CommandSpec {
        command: "status",
        action: "status",
    },
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
    },
    CommandSpec {
        command: "exit",
        action: "quit",
    },
];

pub const CHAT_HELP_COMMANDS: &[&str] = &[
    "/image",
    "/video",
    "/ratio",
    "/duration",
    "/go",
    "/attach",
    "/detach",
    "/status",
    "/help",
    "/quit",
];
