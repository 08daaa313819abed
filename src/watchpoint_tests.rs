use crate::error::{ExecError, WatchError};
use crate::memory::{GuestMemory, MEMORY_BASE, PhysicalMemory};
use crate::watchpoint::*;

fn memory() -> PhysicalMemory {
    PhysicalMemory::new(MEMORY_BASE, 64)
}

#[test]
fn test_fresh_pool_hands_out_ids_in_order() {
    let mut pool = WatchpointPool::new();
    assert!(pool.is_empty());
    assert_eq!(pool.free_ids(), (0..NR_WP).collect::<Vec<_>>());
    assert_eq!(pool.allocate(), Ok(0));
    assert_eq!(pool.allocate(), Ok(1));
    assert_eq!(pool.allocate(), Ok(2));
}

#[test]
fn test_active_list_is_most_recent_first() {
    let mut pool = WatchpointPool::new();
    for _ in 0..3 {
        pool.allocate().unwrap();
    }
    let ids: Vec<usize> = pool.list().map(|wp| wp.id).collect();
    assert_eq!(ids, vec![2, 1, 0]);
}

#[test]
fn test_exhaustion() {
    let mut pool = WatchpointPool::new();
    for i in 0..NR_WP {
        assert_eq!(pool.allocate(), Ok(i));
    }
    assert_eq!(pool.allocate(), Err(WatchError::PoolExhausted));
    assert!(pool.free_ids().is_empty());
    assert_eq!(pool.list().count(), NR_WP);
}

#[test]
fn test_released_id_is_reused_first() {
    let mut pool = WatchpointPool::new();
    for _ in 0..4 {
        pool.allocate().unwrap();
    }
    pool.release(1).unwrap();
    assert_eq!(pool.free_ids()[0], 1);
    assert_eq!(pool.list().map(|wp| wp.id).collect::<Vec<_>>(), vec![3, 2, 0]);
    assert_eq!(pool.allocate(), Ok(1));
    assert_eq!(pool.allocate(), Ok(4));
}

#[test]
fn test_release_inactive_is_not_found() {
    let mut pool = WatchpointPool::new();
    assert_eq!(pool.release(0), Err(WatchError::NotFound(0)));
    pool.allocate().unwrap();
    pool.release(0).unwrap();
    assert_eq!(pool.release(0), Err(WatchError::NotFound(0)));
    assert_eq!(pool.release(NR_WP + 5), Err(WatchError::NotFound(NR_WP + 5)));
}

#[test]
fn test_arm_requires_active_slot() {
    let mut pool = WatchpointPool::new();
    assert_eq!(pool.arm(3, MEMORY_BASE, 0, "x"), Err(WatchError::NotFound(3)));
    let id = pool.allocate().unwrap();
    pool.arm(id, MEMORY_BASE + 8, 7, "0x80000008").unwrap();
    let wp = pool.list().next().unwrap();
    assert_eq!((wp.addr, wp.value, wp.expr.as_str()), (MEMORY_BASE + 8, 7, "0x80000008"));
}

#[test]
fn test_check_reports_change_once() {
    let mut mem = memory();
    let mut pool = WatchpointPool::new();
    let id = pool.allocate().unwrap();
    pool.arm(id, MEMORY_BASE, 0, "").unwrap();

    assert_eq!(pool.check(&mem), Ok(None));
    mem.write(MEMORY_BASE, 4, 0x1234).unwrap();
    assert_eq!(pool.check(&mem), Ok(Some(Trigger { id, addr: MEMORY_BASE, old: 0, new: 0x34 })));
    assert_eq!(pool.check(&mem), Ok(None));
}

#[test]
fn test_check_compares_only_the_watched_byte() {
    let mut mem = memory();
    let mut pool = WatchpointPool::new();
    let id = pool.allocate().unwrap();
    pool.arm(id, MEMORY_BASE, 0, "").unwrap();

    mem.write(MEMORY_BASE + 1, 1, 0xff).unwrap();
    mem.write(MEMORY_BASE + 2, 2, 0xabcd).unwrap();
    assert_eq!(pool.check(&mem), Ok(None));

    mem.write(MEMORY_BASE, 1, 0x7f).unwrap();
    assert_eq!(pool.check(&mem), Ok(Some(Trigger { id, addr: MEMORY_BASE, old: 0, new: 0x7f })));
}

#[test]
fn test_check_stops_at_first_change() {
    let mut mem = memory();
    let mut pool = WatchpointPool::new();
    let a = pool.allocate().unwrap();
    pool.arm(a, MEMORY_BASE, 0, "").unwrap();
    let b = pool.allocate().unwrap();
    pool.arm(b, MEMORY_BASE + 4, 0, "").unwrap();

    mem.write(MEMORY_BASE, 4, 1).unwrap();
    mem.write(MEMORY_BASE + 4, 4, 2).unwrap();

    // newest watchpoint is checked first; the other stays pending
    assert_eq!(pool.check(&mem).unwrap().map(|t| t.id), Some(b));
    assert_eq!(pool.check(&mem).unwrap().map(|t| (t.id, t.new)), Some((a, 1)));
    assert_eq!(pool.check(&mem), Ok(None));
}

#[test]
fn test_check_unmapped_address_faults() {
    let mem = memory();
    let mut pool = WatchpointPool::new();
    let id = pool.allocate().unwrap();
    pool.arm(id, 0x1000, 0, "").unwrap();
    assert_eq!(pool.check(&mem), Err(ExecError::MemoryFault { addr: 0x1000, width: WATCH_WIDTH }));
}
