//! Ordered, id-indexed message list.

use std::collections::HashMap;

use causerie_shared::{Message, MessageId, MessageStatus};

/// Messages of the displayed conversation.
///
/// `order` holds display order; `by_id` gives O(1) access for status
/// updates. Both always contain the same ids.
#[derive(Debug, Clone, Default)]
pub struct MessageList {
    order: Vec<MessageId>,
    by_id: HashMap<MessageId, Message>,
}

/// Outcome of a status change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    Applied,
    /// The message is gone (conversation switched or cleared).
    Missing,
    Rejected { from: MessageStatus },
}

impl MessageList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<Message>) -> Self {
        let mut list = Self::new();
        for message in messages {
            list.push(message);
        }
        list
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.by_id.get(id)
    }

    pub fn get_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.by_id.get_mut(id)
    }

    /// Append at the end. Returns false (and changes nothing) when a
    /// message with the same id is already present.
    pub fn push(&mut self, message: Message) -> bool {
        if self.by_id.contains_key(&message.id) {
            return false;
        }
        self.order.push(message.id.clone());
        self.by_id.insert(message.id.clone(), message);
        true
    }

    pub fn remove(&mut self, id: &MessageId) -> Option<Message> {
        let message = self.by_id.remove(id)?;
        self.order.retain(|m| m != id);
        Some(message)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&Message) -> bool) {
        let by_id = &mut self.by_id;
        self.order.retain(|id| {
            let kept = by_id.get(id).map_or(false, |m| keep(m));
            if !kept {
                by_id.remove(id);
            }
            kept
        });
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.by_id.clear();
    }

    /// Messages in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    pub fn to_vec(&self) -> Vec<Message> {
        self.iter().cloned().collect()
    }

    /// Apply a status change if the state machine allows it.
    pub fn set_status(&mut self, id: &MessageId, next: MessageStatus) -> StatusUpdate {
        match self.by_id.get_mut(id) {
            None => StatusUpdate::Missing,
            Some(m) if m.status.can_transition_to(next) => {
                m.status = next;
                StatusUpdate::Applied
            }
            Some(m) => StatusUpdate::Rejected { from: m.status },
        }
    }

    /// Id of the staged attachment, if any.
    pub fn preview_id(&self) -> Option<MessageId> {
        self.iter()
            .find(|m| m.status == MessageStatus::Preview)
            .map(|m| m.id.clone())
    }

    pub fn remove_previews(&mut self) -> usize {
        let before = self.len();
        self.retain(|m| m.status != MessageStatus::Preview);
        before - self.len()
    }

    pub fn strip_welcome(&mut self) {
        self.retain(|m| !m.is_welcome);
    }

    /// Whether anything worth saving is displayed.
    pub fn has_real_content(&self) -> bool {
        self.iter().any(Message::is_persistable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use causerie_shared::FileData;

    #[test]
    fn keeps_insertion_order_and_index() {
        let mut list = MessageList::new();
        let a = Message::user("a");
        let b = Message::bot("b", Vec::new());
        let a_id = a.id.clone();
        assert!(list.push(a.clone()));
        assert!(list.push(b));
        assert!(!list.push(a));

        let texts: Vec<_> = list.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b"]);
        assert!(list.contains(&a_id));

        list.remove(&a_id);
        assert_eq!(list.len(), 1);
        assert!(!list.contains(&a_id));
    }

    #[test]
    fn status_machine_is_enforced() {
        let mut list = MessageList::new();
        let msg = Message::user("a");
        let id = msg.id.clone();
        list.push(msg);

        assert_eq!(list.set_status(&id, MessageStatus::Delivered), StatusUpdate::Applied);
        assert_eq!(
            list.set_status(&id, MessageStatus::Error),
            StatusUpdate::Rejected {
                from: MessageStatus::Delivered
            }
        );
        assert_eq!(
            list.set_status(&MessageId::from("msg_x"), MessageStatus::Error),
            StatusUpdate::Missing
        );
    }

    #[test]
    fn welcome_and_preview_helpers() {
        let mut list = MessageList::new();
        list.push(Message::welcome(None));
        assert!(!list.has_real_content());

        let preview = Message::attachment_preview(FileData::from_bytes("a.txt", "text/plain", b"x"));
        let preview_id = preview.id.clone();
        list.push(preview);
        assert_eq!(list.preview_id(), Some(preview_id));
        assert!(!list.has_real_content());

        list.strip_welcome();
        assert_eq!(list.len(), 1);
        assert_eq!(list.remove_previews(), 1);
        assert!(list.is_empty());
    }
}
