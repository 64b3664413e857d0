//! Line protocol definitions
//!
//! Newline-delimited text in both directions. Server lines are a keyword
//! optionally followed by a payload; client lines are either a name
//! submission or chat content, possibly `>>`-addressed.

use std::fmt;

/// Separator between addressed targets and the message body
pub const MULTICAST_DELIMITER: &str = ">>";

/// Separator between names in an `ACTIVEUSERS` roster line
pub const ROSTER_SEPARATOR: char = ':';

/// Server → Client line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Request a display name
    SubmitName,
    /// The last submitted name is now registered
    NameAccepted,
    /// Chat line, rendered as `MESSAGE <from>: <body>`
    Message { from: String, body: String },
    /// Full roster in registration order
    ActiveUsers(Vec<String>),
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::SubmitName => f.write_str("SUBMITNAME"),
            ServerMessage::NameAccepted => f.write_str("NAMEACCEPTED"),
            ServerMessage::Message { from, body } => write!(f, "MESSAGE {}: {}", from, body),
            ServerMessage::ActiveUsers(names) => {
                f.write_str("ACTIVEUSERS")?;
                for (i, name) in names.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", ROSTER_SEPARATOR)?;
                    }
                    f.write_str(name)?;
                }
                Ok(())
            }
        }
    }
}

/// Client → Server content line, classified for routing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatLine<'a> {
    /// No delimiter: the whole line goes to everyone
    Broadcast(&'a str),
    /// `t1>>t2>>...>>body`: only the body goes to the listed targets
    Addressed { targets: Vec<&'a str>, body: &'a str },
}

impl<'a> ChatLine<'a> {
    /// Classify a raw input line
    ///
    /// The last `>>`-separated token is the body; everything before it is a
    /// target name. Empty tokens are kept, so `bob>>` addresses `bob` with an
    /// empty body.
    pub fn parse(line: &'a str) -> Self {
        if !line.contains(MULTICAST_DELIMITER) {
            return ChatLine::Broadcast(line);
        }

        let mut targets: Vec<&'a str> = line.split(MULTICAST_DELIMITER).collect();
        // split on a line containing the delimiter always yields at least two tokens
        let body = targets.pop().unwrap_or_default();
        ChatLine::Addressed { targets, body }
    }
}

/// Reasons a submitted display name is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameRejection {
    Empty,
    ContainsDelimiter,
    ContainsRosterSeparator,
}

impl fmt::Display for NameRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameRejection::Empty => f.write_str("empty name"),
            NameRejection::ContainsDelimiter => {
                write!(f, "name contains '{}'", MULTICAST_DELIMITER)
            }
            NameRejection::ContainsRosterSeparator => {
                write!(f, "name contains '{}'", ROSTER_SEPARATOR)
            }
        }
    }
}

/// Check that a name can be registered, addressed and listed in a roster
pub fn validate_name(name: &str) -> Result<(), NameRejection> {
    if name.is_empty() {
        Err(NameRejection::Empty)
    } else if name.contains(MULTICAST_DELIMITER) {
        Err(NameRejection::ContainsDelimiter)
    } else if name.contains(ROSTER_SEPARATOR) {
        Err(NameRejection::ContainsRosterSeparator)
    } else {
        Ok(())
    }
}
