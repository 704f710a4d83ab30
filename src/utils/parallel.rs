#[cfg(feature = "parallel")]
use rayon::prelude::*;

// Helper to switch between rayon and plain iterators based on size.
#[inline]
pub fn map_collect<T, U, F>(collection: &[T], f: F) -> Vec<U>
where T: Sync, U: Send, F: Fn(&T) -> U + Sync + Send {
    let out: Vec<U>;
    #[cfg(feature = "parallel")]
    {
        // Heuristic: Don't spin up Rayon for < 1000 items
        if collection.len() > 1000 {
            out = collection.par_iter().map(f).collect();
        } else {
            out = collection.iter().map(f).collect();
        }
    }
    #[cfg(not(feature = "parallel"))]
    {
        out = collection.iter().map(f).collect();
    }
    out
}

// Helper for mutable iteration
#[inline]
pub fn iterate_mut<T, F>(collection: &mut [T], f: F)
where T: Send, F: Fn(&mut T) + Sync + Send {
    #[cfg(feature = "parallel")]
    {
        if collection.len() > 1000 {
            collection.par_iter_mut().for_each(f);
        } else {
            collection.iter_mut().for_each(f);
        }
    }
    #[cfg(not(feature = "parallel"))]
    {
        collection.iter_mut().for_each(f);
    }
}
