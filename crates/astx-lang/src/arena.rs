use std::{
    marker::PhantomData,
    ops::{Index, IndexMut},
};

/// A type-safe handle into an [`Arena`].
///
/// The phantom parameter ties a handle to the arena element type, so an
/// `ArenaId<Node>` cannot be used to index an arena of tokens.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArenaId<T> {
    id: u32,
    _phantom_data: PhantomData<T>,
}

impl<T> Copy for ArenaId<T> {}

impl<T> Clone for ArenaId<T> {
    #[inline(always)]
    fn clone(&self) -> ArenaId<T> {
        *self
    }
}

impl<T> ArenaId<T> {
    pub const fn new(id: u32) -> ArenaId<T> {
        Self {
            id,
            _phantom_data: PhantomData,
        }
    }

    /// The raw index backing this handle.
    pub const fn index(&self) -> usize {
        self.id as usize
    }
}

impl<T> From<u32> for ArenaId<T> {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

impl<T> From<usize> for ArenaId<T> {
    fn from(id: usize) -> Self {
        Self::new(id as u32)
    }
}

/// Append-only storage that hands out stable [`ArenaId`] handles.
///
/// Elements are never moved or freed while the arena is alive, which lets
/// tree rewrites swap child handles without invalidating iteration state.
#[derive(Debug, Clone, PartialEq)]
pub struct Arena<T> {
    items: Vec<T>,
}

// Not derived: an empty arena needs no `T: Default`.
impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Arena { items: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Arena {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Stores a value and returns its handle.
    pub fn alloc(&mut self, value: T) -> ArenaId<T> {
        let arena_id = self.items.len() as u32;
        self.items.push(value);
        ArenaId::new(arena_id)
    }

    pub fn get(&self, id: ArenaId<T>) -> Option<&T> {
        self.items.get(id.index())
    }

    pub fn get_mut(&mut self, id: ArenaId<T>) -> Option<&mut T> {
        self.items.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over `(handle, element)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (ArenaId<T>, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (ArenaId::new(i as u32), item))
    }
}

impl<T> Index<ArenaId<T>> for Arena<T> {
    type Output = T;

    fn index(&self, index: ArenaId<T>) -> &Self::Output {
        &self.items[index.index()]
    }
}

impl<T> IndexMut<ArenaId<T>> for Arena<T> {
    fn index_mut(&mut self, index: ArenaId<T>) -> &mut Self::Output {
        &mut self.items[index.index()]
    }
}
