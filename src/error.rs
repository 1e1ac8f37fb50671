use serenity::all::MessageId;

#[derive(Debug, thiserror::Error)]
pub enum CountdownError {
    #[error("countdown must end in the future")]
    NotInFuture,

    #[error("countdown {0} is already tracked")]
    AlreadyTracked(MessageId),

    #[error("countdown {0} is not tracked")]
    NotTracked(MessageId),

    #[error("no countdown at position {index} (have {len})")]
    InvalidPosition { index: usize, len: usize },

    #[error("failed to persist countdowns: {0}")]
    Persist(String),
}

/// Bad command input. `Display` is the text sent back to the channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Time must be HH:MM, e.g. `01:30`.")]
    BadTime,

    #[error("Date and time must be `YYYY-MM-DD HH:MM`.")]
    BadDate,

    #[error("That countdown would already be over.")]
    NotInFuture,

    #[error("Invalid index. Please provide a valid index.")]
    BadIndex,

    #[error("`{0}` is not a valid number.")]
    BadNumber(String),

    #[error("This command is not allowed in this channel.")]
    WrongChannel,

    #[error("Please attach one or more CSV files.")]
    MissingCsv,

    #[error("That doesn't look like a battle link.")]
    BadLink,

    #[error("{0}")]
    Forbidden(&'static str),
}

