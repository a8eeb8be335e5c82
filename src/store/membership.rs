use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;

use crate::models::{MemberInfo, ServerMessage};

/// Sending half of a connection's outbound queue
pub type Outbox = UnboundedSender<ServerMessage>;

#[derive(Debug, Clone)]
pub struct Member {
    pub display_name: String,
    pub user_id: String,
    pub outbox: Outbox,
}

/// Who receives an event
#[derive(Debug, Clone, Copy)]
pub enum Audience<'a> {
    All,
    AllExcept(&'a str),
    Only(&'a str),
}

/// Live members of one room, keyed by connection id.
#[derive(Debug, Default)]
pub struct Membership {
    entries: HashMap<String, Member>,
    // join order, for stable snapshots
    order: Vec<String>,
}

impl Membership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `connection_id`. Returns true when the
    /// connection was already a member.
    pub fn join(&mut self, connection_id: &str, member: Member) -> bool {
        let rejoined = self.entries.insert(connection_id.to_string(), member).is_some();
        if !rejoined {
            self.order.push(connection_id.to_string());
        }
        rejoined
    }

    pub fn leave(&mut self, connection_id: &str) -> Option<Member> {
        let member = self.entries.remove(connection_id)?;
        self.order.retain(|c| c != connection_id);
        Some(member)
    }

    pub fn snapshot(&self) -> Vec<MemberInfo> {
        self.order
            .iter()
            .filter_map(|id| {
                self.entries.get(id).map(|m| MemberInfo {
                    connection_id: id.clone(),
                    display_name: m.display_name.clone(),
                    user_id: m.user_id.clone(),
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queue `message` for every member in `audience`. Queues are per
    /// connection and FIFO, so calling this under the room lock keeps room
    /// emission order for every recipient.
    pub fn deliver(&self, audience: Audience<'_>, message: &ServerMessage) -> usize {
        let mut delivered = 0;
        for (id, member) in &self.entries {
            let wanted = match audience {
                Audience::All => true,
                Audience::AllExcept(skip) => id != skip,
                Audience::Only(target) => id == target,
            };
            // a closed outbox means the connection is going away; its
            // disconnect path removes the entry
            if wanted && member.outbox.send(message.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Reply;
    use tokio::sync::mpsc::unbounded_channel;

    fn member(name: &str) -> (Member, tokio::sync::mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = unbounded_channel();
        (
            Member {
                display_name: name.to_string(),
                user_id: name.to_string(),
                outbox: tx,
            },
            rx,
        )
    }

    #[test]
    fn rejoin_replaces_without_duplicating() {
        let mut members = Membership::new();
        let (first, _rx1) = member("ann");
        let (second, _rx2) = member("annie");
        assert!(!members.join("c1", first));
        assert!(members.join("c1", second));

        assert_eq!(members.len(), 1);
        assert_eq!(members.snapshot()[0].connection_id, "c1");
        assert_eq!(members.snapshot()[0].display_name, "annie");
    }

    #[test]
    fn leave_of_unknown_connection_is_none() {
        let mut members = Membership::new();
        assert!(members.leave("ghost").is_none());
    }

    #[test]
    fn audience_filters_recipients() {
        let mut members = Membership::new();
        let (a, mut rx_a) = member("a");
        let (b, mut rx_b) = member("b");
        members.join("a", a);
        members.join("b", b);

        let msg = ServerMessage::Reply(Reply::Pong { date: "now".to_string() });
        assert_eq!(members.deliver(Audience::AllExcept("a"), &msg), 1);
        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.try_recv().unwrap(), msg);

        assert_eq!(members.deliver(Audience::Only("a"), &msg), 1);
        assert_eq!(rx_a.try_recv().unwrap(), msg);

        assert_eq!(members.deliver(Audience::All, &msg), 2);
    }
}
