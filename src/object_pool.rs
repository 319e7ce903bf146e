use std::vec::Vec;

/// Sentinel returned by [`ObjectPool::allocate`] callers that need an
/// explicit "no node here" value without wrapping every slot in `Option`.
pub(crate) fn key_none_value() -> u32 {
    u32::MAX
}

pub(crate) fn key_might_be_valid(key: u32) -> bool {
    key != key_none_value()
}

/// One item in a datapool with a used flag
#[derive(Clone)]
struct ReusableItem<T: Clone> {
    reserved: bool,
    item: T,
}

///####################################################################################
/// ObjectPool
///####################################################################################

/// Stores re-usable objects to eliminate allocation overhead when inserting
/// and removing octree nodes. Free slots are tracked with a single
/// first-available cursor rather than a full free-list, since octree
/// growth/shrink tends to free and reuse nodes close together in time.
#[derive(Default, Clone)]
pub(crate) struct ObjectPool<T: Clone> {
    buffer: Vec<ReusableItem<T>>,
    first_available: usize,
}

impl<T> ObjectPool<T>
where
    T: Default + Clone,
{
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        ObjectPool {
            buffer: Vec::with_capacity(capacity),
            ..Default::default()
        }
    }

    fn is_next_available(&self) -> bool {
        self.first_available + 1 < self.buffer.len() && !self.buffer[self.first_available + 1].reserved
    }

    fn check_first_available(&mut self) -> bool {
        if self.first_available < self.buffer.len() && !self.buffer[self.first_available].reserved {
            true
        } else if self.is_next_available() {
            self.first_available += 1;
            true
        } else {
            self.first_available = self.buffer.len();
            false
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.buffer.len()
    }

    pub(crate) fn push(&mut self, item: T) -> u32 {
        let key = self.allocate();
        *self.get_mut(key) = item;
        key
    }

    pub(crate) fn allocate(&mut self) -> u32 {
        let key = if self.check_first_available() {
            self.buffer[self.first_available].reserved = true;
            self.first_available
        } else {
            let x = self.buffer.len().max(10) as f32;
            // reserve less additional capacity the larger the buffer already is
            self.buffer.reserve(((100. * x.log10().powf(2.)) / x) as usize);
            self.buffer.push(ReusableItem {
                reserved: true,
                item: T::default(),
            });
            self.buffer.len() - 1
        };
        if self.is_next_available() {
            self.first_available += 1;
        }
        key as u32
    }

    pub(crate) fn free(&mut self, key: u32) -> bool {
        let key = key as usize;
        if self.key_is_valid(key as u32) {
            self.buffer[key].reserved = false;
            self.buffer[key].item = T::default();
            self.first_available = self.first_available.min(key);
            true
        } else {
            false
        }
    }

    pub(crate) fn get(&self, key: u32) -> &T {
        debug_assert!(self.key_is_valid(key));
        &self.buffer[key as usize].item
    }

    pub(crate) fn get_mut(&mut self, key: u32) -> &mut T {
        debug_assert!(self.key_is_valid(key));
        &mut self.buffer[key as usize].item
    }

    pub(crate) fn key_is_valid(&self, key: u32) -> bool {
        (key as usize) < self.buffer.len() && self.buffer[key as usize].reserved
    }
}

#[cfg(test)]
mod tests {
    use super::ObjectPool;

    #[test]
    fn push_get_mut_free() {
        let mut pool = ObjectPool::<f32>::with_capacity(3);
        let key = pool.push(5.);
        assert_eq!(*pool.get(key), 5.);

        *pool.get_mut(key) = 10.;
        assert_eq!(*pool.get(key), 10.);

        assert!(pool.free(key));
        assert!(!pool.key_is_valid(key));
    }

    #[test]
    fn freed_slot_is_reused() {
        let mut pool = ObjectPool::<f32>::with_capacity(3);
        let key_1 = pool.push(5.);
        pool.push(10.);
        pool.free(key_1);
        assert_eq!(pool.first_available, key_1 as usize);

        let key_3 = pool.push(15.);
        assert_eq!(key_3, key_1);
        assert_eq!(*pool.get(key_3), 15.);
    }
}
