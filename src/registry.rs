use crate::conn::{ConnId, Connection};

/// Ordered collection of live connections.
///
/// Insertion order is service order: the data phase walks connections in
/// the order they were admitted. Removal happens only through
/// [`sweep_closed`](Registry::sweep_closed), the loop's cleanup phase, so
/// no iteration elsewhere in the same tick ever observes a connection
/// mid-destruction.
pub struct Registry {
    conns: Vec<Connection>,
    next_id: usize,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            conns: Vec::new(),
            // token 0 stays unused as a guard value
            next_id: 1,
        }
    }

    /// Allocates the next connection id. Ids are never reused, which keeps
    /// the no-two-live-connections-share-a-handle invariant checkable.
    pub(crate) fn next_id(&mut self) -> ConnId {
        let id = ConnId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn insert(&mut self, conn: Connection) {
        debug_assert!(
            self.get(conn.id()).is_none(),
            "duplicate connection id {:?}",
            conn.id()
        );
        self.conns.push(conn);
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }

    pub fn get(&self, id: ConnId) -> Option<&Connection> {
        self.conns.iter().find(|c| c.id() == id)
    }

    pub fn get_mut(&mut self, id: ConnId) -> Option<&mut Connection> {
        self.conns.iter_mut().find(|c| c.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.conns.iter()
    }

    /// Snapshot of all connection ids in insertion order. The data phase
    /// iterates this snapshot so hooks may close connections (or the
    /// accept phase may have appended one) without corrupting iteration.
    pub(crate) fn ids(&self) -> Vec<ConnId> {
        self.conns.iter().map(|c| c.id()).collect()
    }

    /// Removes every closed connection, handing each to `on_removed` right
    /// before it is dropped. Surviving connections keep their order.
    pub(crate) fn sweep_closed<F>(&mut self, mut on_removed: F)
    where
        F: FnMut(&mut Connection),
    {
        self.conns.retain_mut(|conn| {
            if conn.is_open() {
                true
            } else {
                on_removed(conn);
                false
            }
        });
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conn::tests::connected_pair;

    fn registered(registry: &mut Registry) -> (ConnId, std::net::TcpStream) {
        let id = registry.next_id();
        let (conn, peer) = connected_pair(id.as_usize());
        registry.insert(conn);
        (id, peer)
    }

    #[test]
    fn ids_are_unique_and_ordered() {
        let mut registry = Registry::new();
        let (a, _pa) = registered(&mut registry);
        let (b, _pb) = registered(&mut registry);
        let (c, _pc) = registered(&mut registry);

        assert_eq!(registry.ids(), vec![a, b, c]);
        let mut seen = std::collections::HashSet::new();
        assert!(registry.iter().all(|conn| seen.insert(conn.id())));
    }

    #[test]
    fn sweep_removes_only_closed_and_keeps_order() {
        let mut registry = Registry::new();
        let (a, _pa) = registered(&mut registry);
        let (b, _pb) = registered(&mut registry);
        let (c, _pc) = registered(&mut registry);

        registry.get_mut(b).unwrap().close();

        let mut removed = Vec::new();
        registry.sweep_closed(|conn| removed.push(conn.id()));

        assert_eq!(removed, vec![b]);
        assert_eq!(registry.ids(), vec![a, c]);
        assert!(registry.get(b).is_none());
    }

    #[test]
    fn sweep_on_all_open_is_a_noop() {
        let mut registry = Registry::new();
        let (_a, _pa) = registered(&mut registry);
        let (_b, _pb) = registered(&mut registry);

        let mut removed = 0;
        registry.sweep_closed(|_| removed += 1);
        assert_eq!(removed, 0);
        assert_eq!(registry.len(), 2);
    }
}
