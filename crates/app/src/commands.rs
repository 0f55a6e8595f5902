//! Line-oriented command parsing.

use std::fmt;

/// A command typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login,
    Logout,
    Refresh,
    Feed,
    Post { content: String, file_url: String },
    Like { post_id: u64 },
    Comment { post_id: u64, text: String },
    Status,
    Help,
    Quit,
}

/// Why a line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    Unknown(String),
    MissingArgument(&'static str),
    BadPostId(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty command"),
            Self::Unknown(cmd) => write!(f, "unknown command '{cmd}', try 'help'"),
            Self::MissingArgument(what) => write!(f, "missing {what}"),
            Self::BadPostId(raw) => write!(f, "'{raw}' is not a post id"),
        }
    }
}

pub const HELP: &str = "\
commands:
  login                      sign in with the identity provider
  logout                     sign out and discard the feed
  refresh                    reload the feed
  feed                       show the feed
  post [--file URL] TEXT     publish a post
  like ID                    like a post
  comment ID TEXT            comment on a post
  status                     show the session state
  quit                       exit";

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    input
        .split_once(char::is_whitespace)
        .map_or((input, ""), |(head, rest)| (head, rest.trim_start()))
}

fn parse_post_id(raw: &str) -> Result<u64, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::MissingArgument("post id"));
    }
    raw.parse().map_err(|_| ParseError::BadPostId(raw.to_string()))
}

/// Parses one input line.
///
/// Text arguments are passed through untouched; validation happens in the
/// engine so that the same rules apply to every front end.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let (name, rest) = split_word(line.trim());
    match name.to_ascii_lowercase().as_str() {
        "" => Err(ParseError::Empty),
        "login" => Ok(Command::Login),
        "logout" => Ok(Command::Logout),
        "refresh" => Ok(Command::Refresh),
        "feed" | "ls" => Ok(Command::Feed),
        "status" | "whoami" => Ok(Command::Status),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        "post" => {
            let (flag, after_flag) = split_word(rest);
            if flag == "--file" {
                let (file_url, content) = split_word(after_flag);
                if file_url.is_empty() {
                    return Err(ParseError::MissingArgument("file URL"));
                }
                Ok(Command::Post {
                    content: content.to_string(),
                    file_url: file_url.to_string(),
                })
            } else {
                Ok(Command::Post {
                    content: rest.to_string(),
                    file_url: String::new(),
                })
            }
        }
        "like" => {
            let (id, _) = split_word(rest);
            Ok(Command::Like {
                post_id: parse_post_id(id)?,
            })
        }
        "comment" => {
            let (id, text) = split_word(rest);
            Ok(Command::Comment {
                post_id: parse_post_id(id)?,
                text: text.to_string(),
            })
        }
        other => Err(ParseError::Unknown(other.to_string())),
    }
}
