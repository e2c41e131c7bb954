use std::{fmt, io};

/// Errors produced by name validation and the wire codec.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[non_exhaustive]
pub enum Error {
    /// The end of the datagram was reached while more data was expected.
    Eof,
    /// The provided output buffer was too small to fit the entire message.
    Truncated,
    /// A field was set to an invalid (reserved for future use or illegal) value.
    InvalidValue,
    /// An empty label was encountered where it is not allowed.
    InvalidEmptyLabel,
    /// A host name exceeded the fixed name slot size ([`MAX_LEN`]).
    ///
    /// [`MAX_LEN`]: crate::name::HostName::MAX_LEN
    NameTooLong,
}

impl Error {
    fn description(&self) -> &str {
        match self {
            Error::Eof => "unexpected end of data",
            Error::Truncated => "message truncated",
            Error::InvalidValue => "invalid value",
            Error::InvalidEmptyLabel => "invalid empty label",
            Error::NameTooLong => "host name too long",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl std::error::Error for Error {}

impl From<Error> for io::Error {
    fn from(e: Error) -> io::Error {
        match e {
            Error::Eof => io::ErrorKind::UnexpectedEof.into(),
            Error::Truncated => io::ErrorKind::OutOfMemory.into(),
            Error::InvalidValue => io::ErrorKind::InvalidData.into(),
            Error::InvalidEmptyLabel => io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid empty label in host name",
            ),
            Error::NameTooLong => io::Error::new(
                io::ErrorKind::InvalidInput,
                "host name exceeds the maximum name length",
            ),
        }
    }
}
