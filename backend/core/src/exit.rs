use serde::{Deserialize, Serialize};

/// How a bot process ended. Encoded into the process exit code so a
/// supervising launcher can decide whether to start it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitSignal {
    /// Clean shutdown; do not restart.
    CompleteClose,
    /// Crash or unexpected disconnect.
    AbnormalClose,
    /// Explicit restart request.
    Restart,
}

impl ExitSignal {
    /// First exit code of the range. Must stay below 256 minus the variant count.
    pub const BASE_EXIT_CODE: i32 = 80;

    const ALL: [ExitSignal; 3] = [Self::CompleteClose, Self::AbnormalClose, Self::Restart];

    pub fn to_exit_code(self) -> i32 {
        let offset = match self {
            Self::CompleteClose => 0,
            Self::AbnormalClose => 1,
            Self::Restart => 2,
        };
        Self::BASE_EXIT_CODE + offset
    }

    /// Decode an exit code. Codes outside the range yield `None`.
    pub fn from_exit_code(code: i32) -> Option<Self> {
        let offset = code.checked_sub(Self::BASE_EXIT_CODE)?;
        usize::try_from(offset)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }
}

impl std::fmt::Display for ExitSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::CompleteClose => "complete_close",
            Self::AbnormalClose => "abnormal_close",
            Self::Restart => "restart",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_contiguous() {
        assert_eq!(ExitSignal::CompleteClose.to_exit_code(), 80);
        assert_eq!(ExitSignal::AbnormalClose.to_exit_code(), 81);
        assert_eq!(ExitSignal::Restart.to_exit_code(), 82);
    }

    #[test]
    fn test_decode() {
        for signal in ExitSignal::ALL {
            assert_eq!(ExitSignal::from_exit_code(signal.to_exit_code()), Some(signal));
        }
        assert_eq!(ExitSignal::from_exit_code(0), None);
        assert_eq!(ExitSignal::from_exit_code(83), None);
        assert_eq!(ExitSignal::from_exit_code(-1), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitSignal::Restart.to_string(), "restart");
    }
}
