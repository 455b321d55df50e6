/// Identifier of a result set within its connection
pub type ResultSetId = u64;

/// Handle that produced a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Statement(u64),
    PreparedStatement(u64),
}

#[derive(Debug)]
struct Tracked<C> {
    id: ResultSetId,
    owner: Owner,
    cell: C,
}

/// Open result sets of one connection, by owner
#[derive(Debug)]
pub struct ProtocolData<C> {
    result_sets: Vec<Tracked<C>>,
    next_id: ResultSetId,
}

impl<C: Clone> ProtocolData<C> {
    pub fn new() -> Self {
        Self {
            result_sets: Vec::new(),
            next_id: 1,
        }
    }

    pub fn next_id(&mut self) -> ResultSetId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn add(&mut self, id: ResultSetId, owner: Owner, cell: C) {
        self.result_sets.push(Tracked { id, owner, cell });
    }

    /// Stop tracking `id`; returns whether it was tracked
    pub fn remove(&mut self, id: ResultSetId) -> bool {
        let before = self.result_sets.len();
        self.result_sets.retain(|tracked| tracked.id != id);
        self.result_sets.len() != before
    }

    pub fn result_sets_of(&self, owner: Owner) -> Vec<(ResultSetId, C)> {
        self.result_sets
            .iter()
            .filter(|tracked| tracked.owner == owner)
            .map(|tracked| (tracked.id, tracked.cell.clone()))
            .collect()
    }

    pub fn all(&self) -> Vec<C> {
        self.result_sets
            .iter()
            .map(|tracked| tracked.cell.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.result_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.result_sets.is_empty()
    }

    pub fn clear(&mut self) {
        self.result_sets.clear();
    }
}

impl<C: Clone> Default for ProtocolData<C> {
    fn default() -> Self {
        Self::new()
    }
}
