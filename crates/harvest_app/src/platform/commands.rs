//! Line commands typed at the prompt.

use thiserror::Error;

pub const HELP: &str = "\
Commands:
  meta <url>              set the story metadata URL
  chapter <url>           set the first chapter URL
  dir <path>              choose the output directory
  start [<meta> <chapter>] start harvesting (optionally setting both URLs)
  pause                   pause or resume the running harvest
  render                  write the harvested story to a PDF
  status                  show the current state
  help                    show this text
  quit                    exit
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    MetadataUrl(String),
    ChapterUrl(String),
    OutputDir(String),
    Start(Option<(String, String)>),
    TogglePause,
    Render,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("missing {0}")]
    MissingArgument(&'static str),
    #[error("usage: {0}")]
    Usage(&'static str),
}

pub fn parse_command(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_ascii_lowercase().as_str() {
        "" => Err(ParseError::Empty),
        "meta" | "metadata" => required(rest, "metadata URL").map(Command::MetadataUrl),
        "chapter" | "first" => required(rest, "chapter URL").map(Command::ChapterUrl),
        // Paths may contain spaces, so the whole remainder is the directory.
        "dir" | "browse" | "output" => required(rest, "directory").map(Command::OutputDir),
        "start" => {
            let args: Vec<&str> = rest.split_whitespace().collect();
            match args.as_slice() {
                [] => Ok(Command::Start(None)),
                [meta, chapter] => Ok(Command::Start(Some((
                    meta.to_string(),
                    chapter.to_string(),
                )))),
                _ => Err(ParseError::Usage("start [<metadata url> <chapter url>]")),
            }
        }
        "pause" | "resume" | "p" => Ok(Command::TogglePause),
        "render" | "pdf" => Ok(Command::Render),
        "status" | "s" => Ok(Command::Status),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        _ => Err(ParseError::Unknown(word.to_string())),
    }
}

fn required(rest: &str, what: &'static str) -> Result<String, ParseError> {
    if rest.is_empty() {
        Err(ParseError::MissingArgument(what))
    } else {
        Ok(rest.to_string())
    }
}
