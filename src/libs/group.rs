use crate::libs::error::PolishError;
use crate::libs::polish::Polish;

/// Default number of polishes the group buffer holds before it has to grow
pub const DEFAULT_CAPACITY: usize = 65536;

/// All polishes of one query, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    query_id: u32,
    records: Vec<Polish>,
}

impl Group {
    pub fn query_id(&self) -> u32 {
        self.query_id
    }

    pub fn records(&self) -> &[Polish] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Collects consecutive polishes sharing a query id.
///
/// The input must already be grouped by query id. Nothing is sorted here: a
/// query id that shows up in two separate runs yields two groups.
///
/// Two buffers take turns holding the open group. A closed group hands its
/// buffer back through [`GroupAccumulator::recycle`], so capacity only grows.
#[derive(Debug)]
pub struct GroupAccumulator {
    query_id: Option<u32>,
    records: Vec<Polish>,
    spare: Vec<Polish>,
}

impl Default for GroupAccumulator {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl GroupAccumulator {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            query_id: None,
            records: Vec::with_capacity(capacity),
            spare: Vec::new(),
        }
    }

    /// Capacity of the buffer holding the open group
    pub fn capacity(&self) -> usize {
        self.records.capacity()
    }

    /// Number of polishes in the open group
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add `polish` to the open group. When its query id differs from the open
    /// group's, that group is closed and returned, and `polish` starts a new one.
    pub fn observe(&mut self, polish: Polish) -> Result<Option<Group>, PolishError> {
        let closed = match self.query_id {
            Some(id) if id != polish.query_id && !self.records.is_empty() => {
                let records = std::mem::replace(&mut self.records, std::mem::take(&mut self.spare));
                Some(Group {
                    query_id: id,
                    records,
                })
            }
            _ => None,
        };

        self.grow()?;
        self.query_id = Some(polish.query_id);
        self.records.push(polish);

        Ok(closed)
    }

    /// Close and return the open group at end of input.
    pub fn flush(&mut self) -> Option<Group> {
        let id = self.query_id.take()?;
        if self.records.is_empty() {
            return None;
        }

        let records = std::mem::replace(&mut self.records, std::mem::take(&mut self.spare));
        Some(Group {
            query_id: id,
            records,
        })
    }

    /// Take back the buffer of a processed group. Its polishes are dropped; the
    /// larger of it and the current spare is kept for the next group.
    pub fn recycle(&mut self, group: Group) {
        let mut records = group.records;
        records.clear();
        if records.capacity() > self.spare.capacity() {
            self.spare = records;
        }
    }

    // Double the buffer when full
    fn grow(&mut self) -> Result<(), PolishError> {
        if self.records.len() < self.records.capacity() {
            return Ok(());
        }

        let additional = self.records.capacity().max(1);
        self.records
            .try_reserve_exact(additional)
            .map_err(|_| PolishError::OutOfMemory {
                requested: self.records.len() + additional,
            })
    }
}
