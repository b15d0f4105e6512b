//! Scoped scratch-buffer region used by both cores for transient storage.
//!
//! Allocations are checked out for the duration of an algorithm phase and
//! released before the phase's `Marker` is rewound, giving LIFO reuse
//! without a raw byte arena: buffers are ordinary `Vec<T>`s drawn from a
//! small per-type free list, so the region stays within safe Rust while
//! keeping checkout/release O(1) amortized.

use crate::geom::{Mat33, Vec3};

/// A checkpoint captured at phase entry; `Region::rewind` verifies every
/// buffer checked out after the checkpoint has been returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Marker(usize);

#[derive(Default)]
pub struct Region {
    vec3_pool: Vec<Vec<Vec3>>,
    u32_pool: Vec<Vec<u32>>,
    mat33_pool: Vec<Vec<Mat33>>,
    outstanding: usize,
}

impl Region {
    pub fn new() -> Self {
        Region::default()
    }

    pub fn marker(&self) -> Marker {
        Marker(self.outstanding)
    }

    /// Rewinds to a prior checkpoint. Panics in debug builds if a buffer
    /// checked out after `marker` was never returned — that is a bug in
    /// the calling phase, not a recoverable runtime condition.
    pub fn rewind(&mut self, marker: Marker) {
        debug_assert_eq!(
            self.outstanding, marker.0,
            "scratch buffer checked out after marker was not returned before rewind"
        );
    }

    pub fn checkout_vec3(&mut self, capacity: usize) -> Vec<Vec3> {
        self.outstanding += 1;
        match self.vec3_pool.pop() {
            Some(mut v) => {
                v.reserve(capacity.saturating_sub(v.capacity()));
                v
            }
            None => Vec::with_capacity(capacity),
        }
    }

    pub fn release_vec3(&mut self, mut v: Vec<Vec3>) {
        v.clear();
        self.vec3_pool.push(v);
        self.outstanding -= 1;
    }

    pub fn checkout_u32(&mut self, capacity: usize) -> Vec<u32> {
        self.outstanding += 1;
        match self.u32_pool.pop() {
            Some(mut v) => {
                v.reserve(capacity.saturating_sub(v.capacity()));
                v
            }
            None => Vec::with_capacity(capacity),
        }
    }

    pub fn release_u32(&mut self, mut v: Vec<u32>) {
        v.clear();
        self.u32_pool.push(v);
        self.outstanding -= 1;
    }

    pub fn checkout_mat33(&mut self, capacity: usize) -> Vec<Mat33> {
        self.outstanding += 1;
        match self.mat33_pool.pop() {
            Some(mut v) => {
                v.reserve(capacity.saturating_sub(v.capacity()));
                v
            }
            None => Vec::with_capacity(capacity),
        }
    }

    pub fn release_mat33(&mut self, mut v: Vec<Mat33>) {
        v.clear();
        self.mat33_pool.push(v);
        self.outstanding -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_and_release_round_trips_capacity() {
        let mut region = Region::new();
        let marker = region.marker();
        let mut buf = region.checkout_vec3(16);
        assert!(buf.capacity() >= 16);
        buf.push(Vec3::zero());
        region.release_vec3(buf);
        region.rewind(marker);

        let buf2 = region.checkout_vec3(4);
        assert!(buf2.capacity() >= 16, "released buffer should be reused, not reallocated smaller");
        region.release_vec3(buf2);
    }

    #[test]
    #[should_panic]
    fn rewind_past_unreturned_buffer_panics_in_debug() {
        let mut region = Region::new();
        let marker = region.marker();
        let _buf = region.checkout_u32(4);
        region.rewind(marker);
    }

    #[test]
    fn nested_markers_compose() {
        let mut region = Region::new();
        let outer = region.marker();
        let a = region.checkout_vec3(4);
        let inner = region.marker();
        let b = region.checkout_vec3(4);
        region.release_vec3(b);
        region.rewind(inner);
        region.release_vec3(a);
        region.rewind(outer);
    }
}
