use serde::{Deserialize, Serialize};

/// Requested change to a user's vote on a post: `1` casts, `0` retracts.
///
/// Anything else is rejected while the request body is being decoded, so the
/// vote handlers never see an out-of-range direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum VoteDirection {
    Retract,
    Cast,
}

impl TryFrom<i64> for VoteDirection {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Retract),
            1 => Ok(Self::Cast),
            _ => Err("dir must be 0 or 1".to_string()),
        }
    }
}

impl From<VoteDirection> for i64 {
    fn from(dir: VoteDirection) -> Self {
        match dir {
            VoteDirection::Retract => 0,
            VoteDirection::Cast => 1,
        }
    }
}
