use thiserror::Error;

/// Maximum accepted argument length, in code points.
pub const MAX_ARG_LENGTH: usize = 1000;

// Shell metacharacters the job service must never see. The rejection list is
// ordered; offender reports follow this order, not input order.
const DISALLOWED_CHARS: [char; 9] = ['&', '|', ';', '$', '>', '<', '`', '\\', '!'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("argument is empty")]
    EmptyArgument,
    #[error("disallowed characters {0} in argument")]
    DisallowedCharacters(String),
    #[error("argument too long, max {0} characters")]
    ArgumentTooLong(usize),
    #[error("illegal protocol used in argument")]
    IllegalProtocol,
}

/// Validates user-supplied scan arguments before they may reach the service.
///
/// The remote side hands these arguments to a command-line tool, so this is a
/// security boundary: the first violated rule rejects the whole input, nothing
/// is ever stripped or rewritten.
pub fn validate_args(arg: &str) -> Result<(), ValidationError> {
    if arg.trim().is_empty() {
        return Err(ValidationError::EmptyArgument);
    }

    let offenders: Vec<char> = DISALLOWED_CHARS
        .iter()
        .copied()
        .filter(|c| arg.contains(*c))
        .collect();
    if !offenders.is_empty() {
        let list = offenders
            .iter()
            .map(|c| format!("'{c}'"))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(ValidationError::DisallowedCharacters(list));
    }

    if arg.chars().count() > MAX_ARG_LENGTH {
        return Err(ValidationError::ArgumentTooLong(MAX_ARG_LENGTH));
    }

    if arg.starts_with("file://") {
        return Err(ValidationError::IllegalProtocol);
    }

    Ok(())
}
