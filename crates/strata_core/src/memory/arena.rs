//! # Buffer Arena
//!
//! Slot allocator for boxed buffers with a free list.

/// A growable slot arena for boxed values.
///
/// Values are boxed so that a slot holding nothing costs one pointer.
/// Freed slots are recycled before the slot table grows.
///
/// # Thread Safety
///
/// The arena is NOT thread-safe. Each chunk owns its own arena; callers
/// share chunks behind a lock.
///
/// # Example
///
/// ```rust,ignore
/// let mut arena: BufferArena<[u8; 4096]> = BufferArena::new();
///
/// let handle = arena.allocate([0; 4096]);
/// arena.get_mut(handle).unwrap()[0] = 7;
///
/// // The buffer is dropped here
/// arena.free(handle);
/// ```
#[derive(Clone, Debug)]
pub struct BufferArena<T> {
    /// Slot table.
    slots: Vec<Option<Box<T>>>,
    /// Indices of empty slots.
    free_list: Vec<usize>,
    /// Number of occupied slots.
    live: usize,
}

/// Handle to a value in a [`BufferArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle {
    /// Index into the slot table.
    index: usize,
}

impl BufferHandle {
    /// Slot index of this handle.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

impl<T> BufferArena<T> {
    /// Creates an empty arena. Nothing is allocated until first use.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Creates an arena with room for `capacity` slots.
    ///
    /// Only the slot table is reserved; buffers are still allocated
    /// on demand.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of slots to reserve
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::with_capacity(capacity),
            live: 0,
        }
    }

    /// Returns the number of live values.
    #[inline]
    #[must_use]
    pub const fn live_count(&self) -> usize {
        self.live
    }

    /// Returns the number of slots (live or free).
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Stores a value and returns its handle.
    ///
    /// Reuses the most recently freed slot if there is one.
    ///
    /// # Arguments
    ///
    /// * `value` - The value to store
    pub fn allocate(&mut self, value: T) -> BufferHandle {
        self.allocate_boxed(Box::new(value))
    }

    /// Stores an already boxed value.
    ///
    /// Use this for large buffers so they are never built on the stack.
    ///
    /// # Arguments
    ///
    /// * `value` - The boxed value to store
    pub fn allocate_boxed(&mut self, value: Box<T>) -> BufferHandle {
        self.live += 1;
        if let Some(index) = self.free_list.pop() {
            self.slots[index] = Some(value);
            return BufferHandle { index };
        }
        self.slots.push(Some(value));
        BufferHandle {
            index: self.slots.len() - 1,
        }
    }

    /// Frees a value, returning it.
    ///
    /// # Returns
    ///
    /// The freed value, or None if the handle was stale.
    pub fn free(&mut self, handle: BufferHandle) -> Option<Box<T>> {
        let value = self.slots.get_mut(handle.index)?.take()?;
        self.free_list.push(handle.index);
        self.live -= 1;
        Some(value)
    }

    /// Gets a reference to a live value.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: BufferHandle) -> Option<&T> {
        self.slots.get(handle.index)?.as_deref()
    }

    /// Gets a mutable reference to a live value.
    #[inline]
    pub fn get_mut(&mut self, handle: BufferHandle) -> Option<&mut T> {
        self.slots.get_mut(handle.index)?.as_deref_mut()
    }

    /// Drops every value and forgets all slots.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.live = 0;
    }

    /// Iterates over all live values.
    pub fn iter(&self) -> impl Iterator<Item = (BufferHandle, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_deref().map(|v| (BufferHandle { index }, v)))
    }
}

impl<T> Default for BufferArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
