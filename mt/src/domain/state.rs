//! Action lifecycle states

/// State of an action in the registry
///
/// `Ready -> Executing -> {Complete, Failed}`. Terminal states never change.
/// The integer codes are part of the snapshot contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionState {
    Ready,
    Executing,
    Complete,
    Failed,
}

impl ActionState {
    /// Integer code reported in snapshots
    pub fn code(self) -> i32 {
        match self {
            Self::Ready => 1,
            Self::Executing => 2,
            Self::Complete => 5,
            Self::Failed => 6,
        }
    }

    /// Parse a snapshot code
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Ready),
            2 => Some(Self::Executing),
            5 => Some(Self::Complete),
            6 => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl std::fmt::Display for ActionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready => write!(f, "ready"),
            Self::Executing => write!(f, "executing"),
            Self::Complete => write!(f, "complete"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl serde::Serialize for ActionState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.code())
    }
}

impl<'de> serde::Deserialize<'de> for ActionState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let code = i32::deserialize(deserializer)?;
        Self::from_code(code).ok_or_else(|| serde::de::Error::custom(format!("unknown action state code: {}", code)))
    }
}
