//! Display status derived from conversation membership.

use party_events::{ConversationState, DisplayStatus, EntityId, PairKey};

/// `Chatting` when `id` takes part in any active pair, otherwise `Idle`.
///
/// Pending pairs do not count: nothing has been said yet.
pub fn display_status<'a, I>(id: &EntityId, pairs: I) -> DisplayStatus
where
    I: IntoIterator<Item = (&'a PairKey, ConversationState)>,
{
    let chatting = pairs
        .into_iter()
        .any(|(key, state)| state == ConversationState::Active && key.contains(id));
    if chatting {
        DisplayStatus::Chatting
    } else {
        DisplayStatus::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_follows_active_pairs() {
        let ab = PairKey::new("a".into(), "b".into());
        let cd = PairKey::new("c".into(), "d".into());
        let pairs = vec![
            (&ab, ConversationState::Active),
            (&cd, ConversationState::Pending),
        ];

        assert_eq!(display_status(&"a".into(), pairs.clone()), DisplayStatus::Chatting);
        assert_eq!(display_status(&"b".into(), pairs.clone()), DisplayStatus::Chatting);
        assert_eq!(display_status(&"c".into(), pairs.clone()), DisplayStatus::Idle);
        assert_eq!(display_status(&"e".into(), pairs), DisplayStatus::Idle);
    }
}
