/// Index-stable storage for tasks.
///
/// Removed slots go on a free list and are reused by later inserts, so an index stays
/// valid until the item stored there is removed.
pub(crate) struct Slab<T> {
    items: Vec<Option<T>>,
    free: Vec<usize>,
    len: usize,
}

impl<T> Slab<T> {
    pub(crate) fn with_capacity(size: usize) -> Self {
        Self {
            items: Vec::with_capacity(size),
            free: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn insert(&mut self, item: T) -> usize {
        self.len += 1;

        if let Some(index) = self.free.pop() {
            self.items[index] = Some(item);
            return index;
        }

        self.items.push(Some(item));
        self.items.len() - 1
    }

    /// Index the next [`insert`](Self::insert) will use.
    pub(crate) fn vacant_key(&self) -> usize {
        self.free.last().copied().unwrap_or(self.items.len())
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<T> {
        let item = self.items.get_mut(index)?.take()?;

        self.free.push(index);
        self.len -= 1;

        Some(item)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)?.as_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Removes every item, handing them back to the caller.
    pub(crate) fn drain(&mut self) -> Vec<T> {
        self.free.clear();
        self.len = 0;

        self.items.drain(..).flatten().collect()
    }
}
