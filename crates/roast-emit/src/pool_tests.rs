use crate::options::EmitOptions;
use crate::pool::EmitterPool;
use crate::test_utils::{class, field};

fn pool(capacity: usize) -> EmitterPool {
    EmitterPool::new(EmitOptions::new().pool_capacity(capacity))
}

#[test]
fn slots_are_allocated_on_demand() {
    let mut pool = pool(2);
    assert_eq!(pool.capacity(), 2);
    assert_eq!(pool.in_use(), 0);

    let a = pool.acquire();
    let b = pool.acquire();

    assert!(a.is_pooled());
    assert!(b.is_pooled());
    assert_eq!(pool.in_use(), 2);
}

#[test]
fn exhausted_pool_hands_out_unpooled_emitters() {
    let mut pool = pool(1);
    let held = pool.acquire();

    let extra = pool.acquire();
    assert!(!extra.is_pooled());

    pool.release(extra);
    assert_eq!(pool.in_use(), 1);
    pool.release(held);
    assert_eq!(pool.in_use(), 0);
}

#[test]
fn released_emitter_is_reused_clean() {
    let mut pool = pool(1);
    let mut first = pool.acquire();
    let mut ty = class("a/First");
    ty.fields.push(field(0, "f", "I"));
    let one = first.emit(&ty).unwrap();
    pool.release(first);

    let mut second = pool.acquire();
    assert!(second.is_pooled());
    let two = second.emit(&class("a/Second")).unwrap();
    let fresh = crate::test_utils::emit_with(&class("a/Second"), EmitOptions::new());

    assert_ne!(one.bytes, two.bytes);
    assert_eq!(two.bytes, fresh.bytes);
}

#[test]
fn release_from_another_pool_is_ignored() {
    let mut left = pool(1);
    let mut right = pool(1);
    let from_right = right.acquire();

    left.release(from_right);

    assert_eq!(left.in_use(), 0);
    assert_eq!(right.in_use(), 1);
    let again = left.acquire();
    assert!(again.is_pooled());
}

#[test]
fn zero_capacity_never_pools() {
    let mut pool = pool(0);
    let emitter = pool.acquire();

    assert!(!emitter.is_pooled());
    pool.release(emitter);
    assert_eq!(pool.in_use(), 0);
}

#[test]
fn pooled_emitters_share_options() {
    let options = EmitOptions::new().line_numbers(false);
    let mut pool = EmitterPool::new(options.clone());

    assert_eq!(pool.acquire().options(), &options);
}
