// Author: Lukas Bower
//! Global heap backing the smoltcp interface on bare-metal builds.

#![allow(unsafe_code)]

use portable_atomic::{AtomicBool, Ordering};

use linked_list_allocator::LockedHeap;

const HEAP_BYTES: usize = 128 * 1024;

static mut HEAP: [u8; HEAP_BYTES] = [0; HEAP_BYTES];
static HEAP_INITIALISED: AtomicBool = AtomicBool::new(false);

#[global_allocator]
static GLOBAL_ALLOCATOR: LockedHeap = LockedHeap::empty();

/// Install the allocator over the statically reserved heap region.
pub fn init() {
    if HEAP_INITIALISED
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
    {
        unsafe {
            let heap_ptr = core::ptr::addr_of_mut!(HEAP).cast::<u8>();
            GLOBAL_ALLOCATOR.lock().init(heap_ptr, HEAP_BYTES);
        }
    }
}
