use std::{
    ops::{Deref, DerefMut},
    sync::atomic::{AtomicPtr, Ordering},
};

pub(crate) trait NullCheck {
    fn is_null(&self) -> bool;
}

impl<T> NullCheck for *const T {
    fn is_null(&self) -> bool {
        (*self as *const T).is_null()
    }
}

impl<T> NullCheck for *mut T {
    fn is_null(&self) -> bool {
        (*self as *const T).is_null()
    }
}

impl<T> NullCheck for AtomicPtr<T> {
    fn is_null(&self) -> bool {
        self.load(Ordering::Relaxed).is_null()
    }
}

/// Owns a handle allocated by the SQLite library and releases it on drop.
#[derive(Debug)]
pub(crate) struct CBox<T: NullCheck> {
    pub(crate) ptr: T,
    dealloc: fn(T),
}

impl<T: NullCheck> CBox<T> {
    pub fn new(ptr: T, dealloc: fn(T)) -> Self {
        Self { ptr, dealloc }
    }
}

impl<T: NullCheck> Drop for CBox<T> {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe {
                (self.dealloc)(std::ptr::read(&self.ptr as *const T));
            }
        }
    }
}

impl<T: NullCheck> Deref for CBox<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.ptr
    }
}

impl<T: NullCheck> DerefMut for CBox<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.ptr
    }
}

// Handles are used by one task at a time, the session hands them to blocking threads.
unsafe impl<T: NullCheck> Send for CBox<T> {}
unsafe impl<T: NullCheck> Sync for CBox<T> {}

#[cfg(test)]
mod tests {
    use crate::cbox::CBox;
    use std::{
        ptr,
        sync::atomic::{AtomicUsize, Ordering},
    };

    static RELEASED: AtomicUsize = AtomicUsize::new(0);

    #[test]
    fn releases_only_valid_handles() {
        let v = 123;
        let ptr: *const i32 = &v;
        {
            let handle = CBox::new(ptr::null::<i32>(), |_| {
                RELEASED.fetch_add(1, Ordering::Relaxed);
            });
            assert!(handle.is_null());
        }
        assert_eq!(RELEASED.load(Ordering::Relaxed), 0);
        {
            let handle = CBox::new(ptr, |_| {
                RELEASED.fetch_add(1, Ordering::Relaxed);
            });
            assert_eq!(unsafe { **handle }, 123);
            assert_eq!(RELEASED.load(Ordering::Relaxed), 0);
        }
        assert_eq!(RELEASED.load(Ordering::Relaxed), 1);
    }
}
